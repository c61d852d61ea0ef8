//! Property drivers that sweep a number system's encoding space.
//!
//! Both drivers run every case twice: once through the type under test and
//! once through a high-precision oracle, then compare the canonicalized
//! patterns. Failures carry the original operand bits so any case
//! reproduces from the report alone. Long sweeps partition the space and
//! honor a cooperative interrupt flag between partitions.

mod exhaustive;
mod randoms;
mod report;

pub use exhaustive::{
    verify_binary_exhaustive, verify_binary_partition, verify_conversion_exhaustive,
};
pub use randoms::verify_binary_randoms;
pub use report::{BinaryOp, Failure, Report};
