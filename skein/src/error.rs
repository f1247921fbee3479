//! Error types shared by every part of the runtime.
//!
//! A failure stored in a shared-state cell must be observable by every
//! reader of that cell, so [`Error`] is cheap to clone: payloads that are
//! not `Clone` themselves are kept behind an [`Arc`].

use std::any::Any;
use std::sync::Arc;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by futures, promises, tasks and pools.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A promise was fulfilled a second time.
    ///
    /// The value or error stored by the first fulfilment is kept.
    #[error("promise already satisfied")]
    PromiseAlreadySatisfied,

    /// The promise was dropped before it stored a value or an error.
    #[error("broken promise: the promise was dropped without being satisfied")]
    BrokenPromise,

    /// A task body, continuation or dataflow function panicked.
    #[error("task panicked: {0}")]
    Panicked(Arc<str>),

    /// An application error raised by user code.
    #[error(transparent)]
    Failed(Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// A timed wait elapsed before the awaited value became available.
    #[error("operation timed out")]
    Timeout,

    /// Every replay attempt produced a value the validator rejected.
    #[error("result rejected by validator after {attempts} attempts")]
    ValidationRejected {
        /// Number of attempts that were made.
        attempts: usize,
    },

    /// Work was posted to a pool the runtime does not own.
    #[error("no worker pool named `{0}`")]
    UnknownPool(String),

    /// Work was submitted after the runtime started shutting down.
    #[error("runtime is shutting down")]
    Shutdown,

    /// The runtime configuration could not be used.
    #[error("invalid runtime configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wraps an application error.
    pub fn failed<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Failed(Arc::new(error))
    }

    /// Builds an application error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Failed(Arc::new(Message(message.into())))
    }

    /// Converts a panic payload captured by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message: Arc<str> = if let Some(s) = payload.downcast_ref::<&'static str>() {
            Arc::from(*s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            Arc::from(s.as_str())
        } else {
            Arc::from("non-string panic payload")
        };

        Error::Panicked(message)
    }

    /// Returns `true` for contract violations, which are never worth retrying.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::PromiseAlreadySatisfied | Error::BrokenPromise | Error::UnknownPool(_)
        )
    }
}

/// Plain-text application error used by [`Error::msg`].
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
