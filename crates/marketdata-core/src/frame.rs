//! Conversion of bar series into polars frames.
//!
//! Series arrive most-recent-first, the way the upstream source returns them.
//! Analysis code usually wants the opposite, so [`bars_to_frame`] produces a
//! frame sorted oldest-to-newest.

use chrono::NaiveDate;
use polars::prelude::*;

use crate::{
    error::{DataError, Result},
    types::HistoricalBar,
};

/// Converts a bar series into a DataFrame sorted by date, oldest first.
///
/// Columns: `date` (Date), `open`, `high`, `low`, `close` (f64), `volume` (u64).
///
/// # Errors
///
/// Returns [`DataError::Parse`] if polars rejects the columns.
pub fn bars_to_frame(bars: &[HistoricalBar]) -> Result<DataFrame> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();

    // Polars dates are days since the Unix epoch.
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch).num_days() as i32)
        .collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    let date_col = Column::new("date".into(), dates)
        .cast(&DataType::Date)
        .map_err(|e| DataError::Parse(e.to_string()))?;

    let df = DataFrame::new(vec![
        date_col,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::Parse(e.to_string()))?;

    df.lazy()
        .sort(["date"], Default::default())
        .collect()
        .map_err(|e| DataError::Parse(e.to_string()))
}
