// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-blocking terminal-state extraction
//!
//! Two interchangeable strategies answer the same four questions about a
//! stage. [`Extraction::Native`] reads the cell directly.
//! [`Extraction::Derived`] only uses the done probe and a zero-timeout get,
//! then classifies the returned error. Both must give identical answers.

use crate::error::{AccessError, StageError};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable selecting the process-wide strategy
pub const EXTRACTION_ENV: &str = "CFFU_STATE_EXTRACTION";

const NOT_COMPLETED: &str = "task has not completed";
const COMPLETED_WITH_EXCEPTION: &str = "task completed with exception";
const COMPLETED_WITH_RESULT: &str = "task completed with a result";
const CANCELLED: &str = "task was cancelled";

/// Terminal state of a stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Running,
    Success,
    Failed,
    Cancelled,
}

/// The four extraction operations
pub(crate) trait StateExtractor {
    fn state<T: Clone + Send + 'static>(&self, stage: &Stage<T>) -> State;
    fn result_now<T: Clone + Send + 'static>(&self, stage: &Stage<T>) -> Result<T, AccessError>;
    fn exception_now<T: Clone + Send + 'static>(
        &self,
        stage: &Stage<T>,
    ) -> Result<StageError, AccessError>;
    fn success_now<T: Clone + Send + 'static>(&self, stage: &Stage<T>, value_if_not_success: T)
        -> T;
}

/// Reads the cell's terminal state directly
pub(crate) struct NativeExtractor;

impl StateExtractor for NativeExtractor {
    fn state<T: Clone + Send + 'static>(&self, stage: &Stage<T>) -> State {
        match stage.outcome_now() {
            None => State::Running,
            Some(Ok(_)) => State::Success,
            Some(Err(StageError::Cancelled)) => State::Cancelled,
            Some(Err(_)) => State::Failed,
        }
    }

    fn result_now<T: Clone + Send + 'static>(&self, stage: &Stage<T>) -> Result<T, AccessError> {
        match stage.outcome_now() {
            None => Err(AccessError::IllegalState(NOT_COMPLETED)),
            Some(Ok(value)) => Ok(value),
            Some(Err(StageError::Cancelled)) => Err(AccessError::IllegalState(CANCELLED)),
            Some(Err(_)) => Err(AccessError::IllegalState(COMPLETED_WITH_EXCEPTION)),
        }
    }

    fn exception_now<T: Clone + Send + 'static>(
        &self,
        stage: &Stage<T>,
    ) -> Result<StageError, AccessError> {
        match stage.outcome_now() {
            None => Err(AccessError::IllegalState(NOT_COMPLETED)),
            Some(Ok(_)) => Err(AccessError::IllegalState(COMPLETED_WITH_RESULT)),
            Some(Err(StageError::Cancelled)) => Err(AccessError::IllegalState(CANCELLED)),
            Some(Err(e)) => Ok(e),
        }
    }

    fn success_now<T: Clone + Send + 'static>(
        &self,
        stage: &Stage<T>,
        value_if_not_success: T,
    ) -> T {
        stage.peek_success().unwrap_or(value_if_not_success)
    }
}

/// Derives the answers from the done probe plus a zero-timeout get
pub(crate) struct DerivedExtractor;

impl DerivedExtractor {
    fn poll<T: Clone + Send + 'static>(stage: &Stage<T>) -> Option<Result<T, AccessError>> {
        if !stage.raw_is_done() {
            return None;
        }
        match stage.raw_get_timeout(Duration::ZERO) {
            Err(AccessError::Timeout(_)) => None,
            other => Some(other),
        }
    }
}

impl StateExtractor for DerivedExtractor {
    fn state<T: Clone + Send + 'static>(&self, stage: &Stage<T>) -> State {
        match Self::poll(stage) {
            None => State::Running,
            Some(Ok(_)) => State::Success,
            Some(Err(AccessError::Stage(StageError::Cancelled))) => State::Cancelled,
            Some(Err(_)) => State::Failed,
        }
    }

    fn result_now<T: Clone + Send + 'static>(&self, stage: &Stage<T>) -> Result<T, AccessError> {
        match Self::poll(stage) {
            None => Err(AccessError::IllegalState(NOT_COMPLETED)),
            Some(Ok(value)) => Ok(value),
            Some(Err(AccessError::Stage(StageError::Cancelled))) => {
                Err(AccessError::IllegalState(CANCELLED))
            }
            Some(Err(_)) => Err(AccessError::IllegalState(COMPLETED_WITH_EXCEPTION)),
        }
    }

    fn exception_now<T: Clone + Send + 'static>(
        &self,
        stage: &Stage<T>,
    ) -> Result<StageError, AccessError> {
        match Self::poll(stage) {
            None => Err(AccessError::IllegalState(NOT_COMPLETED)),
            Some(Ok(_)) => Err(AccessError::IllegalState(COMPLETED_WITH_RESULT)),
            Some(Err(AccessError::Stage(StageError::Cancelled))) => {
                Err(AccessError::IllegalState(CANCELLED))
            }
            Some(Err(AccessError::Stage(e))) => Ok(e),
            Some(Err(_)) => Err(AccessError::IllegalState(NOT_COMPLETED)),
        }
    }

    fn success_now<T: Clone + Send + 'static>(
        &self,
        stage: &Stage<T>,
        value_if_not_success: T,
    ) -> T {
        match Self::poll(stage) {
            Some(Ok(value)) => value,
            _ => value_if_not_success,
        }
    }
}

/// Which extraction strategy to use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extraction {
    #[default]
    Native,
    Derived,
}

impl Extraction {
    /// The process-wide strategy, chosen once from [`EXTRACTION_ENV`]
    pub fn selected() -> Extraction {
        static SELECTED: OnceLock<Extraction> = OnceLock::new();
        *SELECTED.get_or_init(|| {
            let selected = std::env::var(EXTRACTION_ENV)
                .ok()
                .and_then(|value| Extraction::parse(&value))
                .unwrap_or_default();
            tracing::debug!(strategy = ?selected, "state extraction selected");
            selected
        })
    }

    /// Parse a strategy name, case-insensitively
    pub fn parse(value: &str) -> Option<Extraction> {
        match value.trim().to_ascii_lowercase().as_str() {
            "native" => Some(Extraction::Native),
            "derived" => Some(Extraction::Derived),
            _ => None,
        }
    }

    pub(crate) fn state<T: Clone + Send + 'static>(self, stage: &Stage<T>) -> State {
        match self {
            Extraction::Native => NativeExtractor.state(stage),
            Extraction::Derived => DerivedExtractor.state(stage),
        }
    }

    pub(crate) fn result_now<T: Clone + Send + 'static>(
        self,
        stage: &Stage<T>,
    ) -> Result<T, AccessError> {
        match self {
            Extraction::Native => NativeExtractor.result_now(stage),
            Extraction::Derived => DerivedExtractor.result_now(stage),
        }
    }

    pub(crate) fn exception_now<T: Clone + Send + 'static>(
        self,
        stage: &Stage<T>,
    ) -> Result<StageError, AccessError> {
        match self {
            Extraction::Native => NativeExtractor.exception_now(stage),
            Extraction::Derived => DerivedExtractor.exception_now(stage),
        }
    }

    pub(crate) fn success_now<T: Clone + Send + 'static>(
        self,
        stage: &Stage<T>,
        value_if_not_success: T,
    ) -> T {
        match self {
            Extraction::Native => NativeExtractor.success_now(stage, value_if_not_success),
            Extraction::Derived => DerivedExtractor.success_now(stage, value_if_not_success),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
