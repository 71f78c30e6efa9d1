//! State extraction specs
//!
//! Verify that both extraction strategies agree with direct inspection.

use crate::prelude::*;
use crate::prelude::assert_eq;

const STRATEGIES: [Extraction; 2] = [Extraction::Native, Extraction::Derived];

#[test]
fn successful_stage_reads_value_and_rejects_exception() {
    for extraction in STRATEGIES {
        let stage = Stage::completed(42);

        assert_eq!(
            stage.result_now_with(extraction).unwrap(),
            stage.get().unwrap(),
            "{extraction:?}"
        );
        assert!(stage
            .exception_now_with(extraction)
            .unwrap_err()
            .is_illegal_state());
        assert_eq!(stage.success_now_with(extraction, 0).unwrap(), 42);
        assert_eq!(stage.state_with(extraction).unwrap(), State::Success);
    }
}

#[test]
fn failed_stage_reads_exception_and_rejects_value() {
    for extraction in STRATEGIES {
        let failure = StageError::msg("boom");
        let stage: Stage<i32> = Stage::failed(failure.clone());

        let exception = stage.exception_now_with(extraction).unwrap();
        assert!(exception.same_failure(&failure), "{extraction:?}");
        assert!(exception.same_failure(stage.get().unwrap_err().stage_error().unwrap()));
        assert!(stage.result_now_with(extraction).unwrap_err().is_illegal_state());
        assert_eq!(stage.success_now_with(extraction, 0).unwrap(), 0);
        assert_eq!(stage.state_with(extraction).unwrap(), State::Failed);
    }
}

#[test]
fn cancelled_and_pending_stages() {
    for extraction in STRATEGIES {
        let cancelled: Stage<i32> = Stage::new();
        cancelled.cancel().unwrap();
        assert_eq!(cancelled.state_with(extraction).unwrap(), State::Cancelled);
        assert!(cancelled.exception_now_with(extraction).unwrap_err().is_illegal_state());

        let pending: Stage<i32> = Stage::new();
        assert_eq!(pending.state_with(extraction).unwrap(), State::Running);
        assert_eq!(pending.success_now_with(extraction, 7).unwrap(), 7);
        assert!(pending.result_now_with(extraction).unwrap_err().is_illegal_state());
    }
}

#[test]
fn factory_strategy_drives_cffu_reads() {
    for extraction in STRATEGIES {
        let factory = CffuFactory::builder(threads("extraction"))
            .extraction(extraction)
            .build();
        let cf = factory.completed(3);

        assert_eq!(factory.extraction(), extraction);
        assert_eq!(cf.state().unwrap(), State::Success);
        assert_eq!(cf.cffu_state().unwrap(), State::Success);
        assert_eq!(cf.result_now().unwrap(), 3);
    }
}
