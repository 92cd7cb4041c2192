// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for module loading

use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// Broad classification of a load failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The identifier could not be turned into a location
    Resolution,
    /// The source text could not be retrieved
    Fetch,
    /// The module body raised while running
    Evaluation,
    /// Loader bookkeeping was violated
    Internal,
}

/// Errors surfaced by `load` / `require`
#[derive(Debug, Error)]
pub enum LoadError {
    /// Malformed identifier
    #[error("Cannot resolve module '{identifier}': {reason}")]
    Resolution {
        /// Identifier as written by the caller
        identifier: String,
        /// Reason for failure
        reason: String,
    },

    /// Source retrieval failed
    #[error("Could not fetch module '{location}': {source}")]
    Fetch {
        /// Canonical location that was requested
        location: String,
        /// Underlying fetch failure
        #[source]
        source: FetchError,
    },

    /// Module body raised during execution
    #[error("Error evaluating module '{location}': {source}")]
    Evaluation {
        /// Canonical location of the failing module
        location: String,
        /// Underlying evaluation failure
        #[source]
        source: EvalError,
    },

    /// The location failed earlier and stays failed
    #[error("Module '{location}' failed to load earlier: {reason}")]
    PreviouslyFailed {
        /// Canonical location of the failed module
        location: String,
        /// Kind of the original failure
        kind: ErrorKind,
        /// Message of the original failure
        reason: String,
    },

    /// A second record was offered for an occupied location
    #[error("Module record already exists for '{0}'")]
    DuplicateRecord(String),
}

impl LoadError {
    /// Create a resolution error
    pub fn resolution(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error. A replayed failure reports the kind it had originally.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::Resolution { .. } => ErrorKind::Resolution,
            LoadError::Fetch { .. } => ErrorKind::Fetch,
            LoadError::Evaluation { .. } => ErrorKind::Evaluation,
            LoadError::PreviouslyFailed { kind, .. } => *kind,
            LoadError::DuplicateRecord(_) => ErrorKind::Internal,
        }
    }

    /// Canonical location involved, when resolution got that far
    pub fn location(&self) -> Option<&str> {
        match self {
            LoadError::Fetch { location, .. }
            | LoadError::Evaluation { location, .. }
            | LoadError::PreviouslyFailed { location, .. }
            | LoadError::DuplicateRecord(location) => Some(location),
            LoadError::Resolution { .. } => None,
        }
    }
}

/// Errors raised by a [`Fetcher`](crate::fetch::Fetcher)
#[derive(Debug, Error)]
pub enum FetchError {
    /// Nothing exists at the location
    #[error("not found: {0}")]
    NotFound(String),

    /// Remote answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// Response status code
        status: u16,
    },

    /// The location would leave the fetcher's root
    #[error("location '{0}' escapes the module root")]
    OutsideRoot(String),

    /// Location could not be joined onto the base URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[cfg(feature = "http")]
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Errors raised by an [`Evaluator`](crate::eval::Evaluator)
#[derive(Debug, Error)]
pub enum EvalError {
    /// Statement could not be parsed
    #[error("SyntaxError (line {line}): {message}")]
    Syntax {
        /// 1-based line number
        line: usize,
        /// Parser message
        message: String,
    },

    /// Undefined name
    #[error("ReferenceError: {0}")]
    Reference(String),

    /// Wrong value type
    #[error("TypeError: {0}")]
    Type(String),

    /// Module code threw a value
    #[error("Uncaught {0}")]
    Thrown(String),

    /// A nested require failed
    #[error("{0}")]
    Require(#[from] Box<LoadError>),

    /// No body is registered for the module
    #[error("no native body registered for '{0}'")]
    Unregistered(String),
}

impl EvalError {
    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    /// Create a new ReferenceError
    pub fn reference_error(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }
}

impl From<LoadError> for EvalError {
    fn from(err: LoadError) -> Self {
        EvalError::Require(Box::new(err))
    }
}
