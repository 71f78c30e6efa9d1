// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for stages and their accessors

use std::any::Any;
use std::borrow::Cow;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Shared failure cause. Propagated by reference, never re-wrapped.
pub type Cause = Arc<dyn Error + Send + Sync + 'static>;

/// Result of a stage that reached a terminal state
pub type Outcome<T> = Result<T, StageError>;

/// Plain message failure for callers without a dedicated error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Message(pub String);

/// Terminal failure of a stage
#[derive(Debug, Clone, Error)]
pub enum StageError {
    #[error("{0}")]
    Failed(Cause),
    #[error("stage was cancelled")]
    Cancelled,
    #[error("stage did not complete within {0:?}")]
    TimedOut(Duration),
    #[error("action panicked: {0}")]
    Panicked(String),
    /// Every input of an any-success race failed; carries one of those failures.
    #[error("no input stage succeeded: {0}")]
    NoneSucceeded(#[source] Box<StageError>),
    #[error("no stages provided")]
    NoStagesProvided,
}

impl StageError {
    /// Wrap an arbitrary error as a stage failure
    pub fn failed<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        StageError::Failed(Arc::new(error))
    }

    /// Failure carrying only a message
    pub fn msg(message: impl Into<String>) -> Self {
        Self::failed(Message(message.into()))
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        StageError::Panicked(message)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StageError::Cancelled)
    }

    /// The shared cause, if this is a plain failure
    pub fn cause(&self) -> Option<&Cause> {
        match self {
            StageError::Failed(cause) => Some(cause),
            _ => None,
        }
    }

    /// True when both errors refer to the same underlying failure.
    ///
    /// Plain failures compare by `Arc` identity; other variants compare structurally.
    pub fn same_failure(&self, other: &StageError) -> bool {
        match (self, other) {
            (StageError::Failed(a), StageError::Failed(b)) => Arc::ptr_eq(a, b),
            (StageError::Cancelled, StageError::Cancelled) => true,
            (StageError::NoStagesProvided, StageError::NoStagesProvided) => true,
            (StageError::TimedOut(a), StageError::TimedOut(b)) => a == b,
            (StageError::Panicked(a), StageError::Panicked(b)) => a == b,
            (StageError::NoneSucceeded(a), StageError::NoneSucceeded(b)) => a.same_failure(b),
            _ => false,
        }
    }
}

/// An operation that the stage's capabilities do not allow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Unsupported {
    pub operation: &'static str,
    pub message: Cow<'static, str>,
}

impl Unsupported {
    pub fn new(operation: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    /// Rejection raised by a `Stage` that was handed out as a minimal view
    pub(crate) fn minimal_stage(operation: &'static str) -> Self {
        Self::new(
            operation,
            format!("{operation} is not supported by a minimal completion stage"),
        )
    }
}

/// Errors from reading a stage's result
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// The stage completed exceptionally
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error("timed out after {0:?} waiting for stage")]
    Timeout(Duration),
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
    #[error(transparent)]
    Unsupported(#[from] Unsupported),
}

impl AccessError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, AccessError::Unsupported(_))
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, AccessError::IllegalState(_))
    }

    /// The stage failure behind this error, if any
    pub fn stage_error(&self) -> Option<&StageError> {
        match self {
            AccessError::Stage(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
