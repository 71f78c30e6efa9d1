// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cffu-core: single-assignment completion stages and their combinators
//!
//! This crate provides:
//! - [`Stage`], a shareable write-once result with dependent transformations
//! - Restricted "minimal" views that reject reads and writes
//! - Completion policies over many stages (join-all, fail-fast, race, deadline)
//! - Non-blocking state extraction with two interchangeable strategies
//! - Executors, a delay scheduler, and multi-action helpers

mod cell;
pub mod delayer;
pub mod error;
pub mod executor;
pub mod future;
pub mod multi;
pub mod policy;
pub mod stage;
pub mod state;
pub mod tuple;

pub use delayer::{delayed_executor, DelayedExecutor, Delayer, TimerHandle};
pub use error::{AccessError, Cause, Message, Outcome, StageError, Unsupported};
pub use executor::{
    ambient_executor, Executor, InlineExecutor, ScreenedExecutor, SharedExecutor, Task,
    ThreadPerTaskExecutor,
};
pub use future::StageFuture;
pub use multi::{Mapper, Supplier};
pub use stage::Stage;
pub use state::{Extraction, State, EXTRACTION_ENV};
pub use tuple::StageTuple;
