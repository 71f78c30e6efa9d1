//! Shared helpers for the behavioral specs

#![allow(dead_code)]

pub use cffu::{
    AccessError, Cffu, CffuFactory, Extraction, Outcome, SharedExecutor, Stage, StageError, State,
    Unsupported, MINIMAL_STAGE_MESSAGE,
};
pub use cffu_adapters::FakeExecutor;
pub use cffu_core::{policy, Executor, ThreadPerTaskExecutor};
pub use similar_asserts::assert_eq;
pub use std::sync::Arc;
pub use std::time::{Duration, Instant};

/// Generous upper bound for anything that should finish promptly
pub const WAIT: Duration = Duration::from_secs(5);

pub fn threads(name: &str) -> SharedExecutor {
    Arc::new(ThreadPerTaskExecutor::new(name))
}

/// Factory backed by real threads named `spec-pool`
pub fn factory() -> CffuFactory {
    CffuFactory::new(threads("spec-pool"))
}

/// A stage that succeeds with `value` after `millis`
pub fn slow<T: Clone + Send + 'static>(millis: u64, value: T) -> Stage<T> {
    Stage::supply_async_on(&threads("slow"), move || {
        std::thread::sleep(Duration::from_millis(millis));
        value
    })
}

/// A stage that fails with `message` after `millis`
pub fn slow_failure<T: Clone + Send + 'static>(millis: u64, message: &'static str) -> Stage<T> {
    let stage = Stage::new();
    let target = stage.clone();
    threads("slow-failure").execute(Box::new(move || {
        std::thread::sleep(Duration::from_millis(millis));
        let _ = target.complete_exceptionally(StageError::msg(message));
    }));
    stage
}

/// Name of the thread currently running
pub fn thread_name() -> Option<String> {
    std::thread::current().name().map(str::to_string)
}

/// Assert an error is the minimal-stage capability violation
pub fn assert_minimal_rejection(err: Unsupported) {
    assert_eq!(err.message.as_ref(), MINIMAL_STAGE_MESSAGE);
}
