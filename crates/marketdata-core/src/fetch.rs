//! Outcome type returned by domain accessors.
//!
//! Accessors never propagate failures to their callers. Instead they return a
//! [`Fetched`] that distinguishes data, an empty answer, and a failed fetch.
//! Callers that only care about data flatten it with [`Fetched::into_option`]
//! or [`Fetched::unwrap_or_default`]; callers that want to react to failures
//! use [`Fetched::into_result`].

use crate::error::{DataError, Result};

/// Outcome of a cached lookup.
#[derive(Debug)]
#[must_use]
pub enum Fetched<T> {
    /// Data was found, either in the cache or at the source.
    Data(T),
    /// The source answered but held no data for the request.
    Empty,
    /// The fetch failed.
    Failed(DataError),
}

impl<T> Fetched<T> {
    /// Lifts an optional value into a successful outcome.
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Self::Data)
    }

    /// Returns true if this outcome carries data.
    #[must_use]
    pub const fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    /// Returns true if the source held no data.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns true if the fetch failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the error if the fetch failed.
    #[must_use]
    pub const fn error(&self) -> Option<&DataError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the data, treating both an empty answer and a failure as `None`.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Data(data) => Some(data),
            Self::Empty | Self::Failed(_) => None,
        }
    }

    /// Converts into a result that surfaces failures.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`DataError`] if the fetch failed.
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            Self::Data(data) => Ok(Some(data)),
            Self::Empty => Ok(None),
            Self::Failed(e) => Err(e),
        }
    }

    /// Maps the carried data.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Data(data) => Fetched::Data(f(data)),
            Self::Empty => Fetched::Empty,
            Self::Failed(e) => Fetched::Failed(e),
        }
    }
}

impl<T: Default> Fetched<T> {
    /// Returns the data, or the default value (an empty collection) otherwise.
    #[must_use]
    pub fn unwrap_or_default(self) -> T {
        self.into_option().unwrap_or_default()
    }
}

impl<T> From<Result<Option<T>>> for Fetched<T> {
    fn from(result: Result<Option<T>>) -> Self {
        match result {
            Ok(value) => Self::from_option(value),
            Err(e) => Self::Failed(e),
        }
    }
}
