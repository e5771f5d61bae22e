// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types raised by the caching engine.

use std::fmt;

/// Broad category of an engine [`Error`].
///
/// Errors coming from the data source are never wrapped in this type; they are returned to the
/// caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A [`CacheStore`](crate::CacheStore) operation failed.
    Backend,
    /// The requested result container could not be built.
    Assembly,
    /// A gate or identity expression could not be evaluated.
    Evaluation,
    /// The operation references something the configuration does not provide.
    Configuration,
}

impl ErrorKind {
    /// Returns the lowercase name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Assembly => "assembly",
            Self::Evaluation => "evaluation",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by the caching engine.
///
/// Every error carries an [`ErrorKind`]; the underlying cause, if any, is available through
/// [`std::error::Error::source()`].
///
/// # Examples
///
/// ```
/// use bulkcache::{Error, ErrorKind};
///
/// let error = Error::assembly("expected 3 slots, got 2");
/// assert_eq!(error.kind(), ErrorKind::Assembly);
/// assert!(error.to_string().contains("expected 3 slots"));
/// ```
#[ohno::error]
#[display("cache {kind} error")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Creates a backend error from a store failure or any other cause.
    pub fn backend(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Backend, cause)
    }

    /// Creates an error for a result container that could not be built.
    ///
    /// Custom [`Container`](crate::Container) implementations return this from `with_slots`.
    pub fn assembly(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Assembly, cause)
    }

    /// Creates an error for a gate or identity expression that could not be evaluated.
    ///
    /// [`ExpressionEvaluator`](crate::ExpressionEvaluator) implementations return this for
    /// malformed expressions or bindings that do not fit them.
    pub fn evaluation(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Evaluation, cause)
    }

    /// Creates an error for an operation the configuration cannot serve.
    pub fn configuration(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Configuration, cause)
    }
}

impl From<bulkcache_store::Error> for Error {
    fn from(error: bulkcache_store::Error) -> Self {
        Self::backend(error)
    }
}

/// A specialized [`Result`] type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
