// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cffu: factory-bound stages with an independent minimal-stage guard

mod cffu;
mod config;
mod factory;
mod tuple;

pub use crate::cffu::{Cffu, MINIMAL_STAGE_MESSAGE};
pub use config::{ConfigError, FactoryConfig};
pub use factory::{CffuFactory, CffuFactoryBuilder};
pub use tuple::CffuTuple;

pub use cffu_core::{
    AccessError, Extraction, Mapper, Outcome, SharedExecutor, Stage, StageError, State,
    Supplier, Unsupported,
};
