// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tuple-typed combinators for 2 to 5 stages of different value types
//!
//! Each input is erased to a `Stage<()>` and fed to the list-based policies;
//! the typed values are read back from the original stages once the erased
//! result completes.

use crate::executor::SharedExecutor;
use crate::policy;
use crate::stage::Stage;
use std::time::Duration;

/// A tuple of stages that can be combined into a stage of a tuple
pub trait StageTuple {
    /// Values of all inputs
    type Values: Clone + Send + 'static;
    /// Values of the inputs that succeeded in time
    type Partial: Clone + Send + 'static;

    /// Completes once every input completes; first failure in input order
    fn all_of(&self) -> Stage<Self::Values>;

    /// Fails as soon as any input fails
    fn all_fail_fast_of(&self) -> Stage<Self::Values>;

    /// Best-effort values at a deadline; `None` for inputs without a success
    fn most_success_of(
        &self,
        executor_when_timeout: &SharedExecutor,
        timeout: Duration,
    ) -> Stage<Self::Partial>;
}

macro_rules! impl_stage_tuple {
    ($($T:ident $s:ident),+) => {
        impl<$($T: Clone + Send + 'static),+> StageTuple for ($(Stage<$T>,)+) {
            type Values = ($($T,)+);
            type Partial = ($(Option<$T>,)+);

            fn all_of(&self) -> Stage<Self::Values> {
                let ($($s,)+) = self.clone();
                let erased = [$($s.then_apply(|_| ())),+];
                policy::all_of(&erased)
                    .then_try_apply(move |()| Ok(($($s.settled_outcome()?,)+)))
            }

            fn all_fail_fast_of(&self) -> Stage<Self::Values> {
                let ($($s,)+) = self.clone();
                let erased = [$($s.then_apply(|_| ())),+];
                policy::all_fail_fast_of(&erased)
                    .then_try_apply(move |()| Ok(($($s.settled_outcome()?,)+)))
            }

            fn most_success_of(
                &self,
                executor_when_timeout: &SharedExecutor,
                timeout: Duration,
            ) -> Stage<Self::Partial> {
                let ($($s,)+) = self.clone();
                // Success flags are captured by the extraction pass itself
                let succeeded = [$($s.then_apply(|_| true)),+];
                policy::most_success_results_of(executor_when_timeout, false, timeout, &succeeded)
                    .then_apply(move |flags| {
                        let mut flags = flags.into_iter();
                        ($(
                            if flags.next() == Some(true) {
                                $s.peek_success()
                            } else {
                                None
                            },
                        )+)
                    })
            }
        }
    };
}

impl_stage_tuple!(T1 s1, T2 s2);
impl_stage_tuple!(T1 s1, T2 s2, T3 s3);
impl_stage_tuple!(T1 s1, T2 s2, T3 s3, T4 s4);
impl_stage_tuple!(T1 s1, T2 s2, T3 s3, T4 s4, T5 s5);

#[cfg(test)]
#[path = "tuple_tests.rs"]
mod tests;
