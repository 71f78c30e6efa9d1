// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tuples of `Cffu`s, combined through [`CffuFactory`](crate::CffuFactory)

use crate::cffu::Cffu;
use cffu_core::{Stage, StageTuple};

/// A tuple of 2 to 5 `Cffu`s of possibly different value types
pub trait CffuTuple {
    /// The matching tuple of plain stages
    type Stages: StageTuple;

    fn to_stages(&self) -> Self::Stages;
}

macro_rules! impl_cffu_tuple {
    ($($T:ident $c:ident),+) => {
        impl<$($T: Clone + Send + 'static),+> CffuTuple for ($(Cffu<$T>,)+) {
            type Stages = ($(Stage<$T>,)+);

            fn to_stages(&self) -> Self::Stages {
                let ($($c,)+) = self;
                ($($c.stage().clone(),)+)
            }
        }
    };
}

impl_cffu_tuple!(T1 c1, T2 c2);
impl_cffu_tuple!(T1 c1, T2 c2, T3 c3);
impl_cffu_tuple!(T1 c1, T2 c2, T3 c3, T4 c4);
impl_cffu_tuple!(T1 c1, T2 c2, T3 c3, T4 c4, T5 c5);
