use std::sync::atomic::{AtomicBool, Ordering};

use itertools::Itertools;

use unum_number::{NumClass, NumberSystem};

use crate::report::{BinaryOp, Report};

/// Iterates every pair of `NBITS`-bit patterns through `op` on the type
/// and through the double oracle, asserting canonical equality.
///
/// Intended for `NBITS <= 20`; the oracle is exact when the type's values
/// and intermediate results fit a double, which every such configuration
/// does for add/sub/mul. The flag is polled once per left-operand row, so
/// an interrupt loses at most one row of work.
pub fn verify_binary_exhaustive<T: NumberSystem>(
    op: BinaryOp,
    interrupt: Option<&AtomicBool>,
) -> Report {
    debug_assert!(T::NBITS <= 24, "exhaustive sweep of a space this large");
    let mut report = Report::default();
    let patterns = 1u128 << T::NBITS;
    for a_bits in 0..patterns {
        if let Some(flag) = interrupt {
            if flag.load(Ordering::Relaxed) {
                report.interrupted = true;
                break;
            }
        }
        let a = T::from_bits(a_bits);
        for b_bits in 0..patterns {
            let b = T::from_bits(b_bits);
            let actual = op.apply(a, b);
            let expected = T::from_f64(oracle(op, a.to_f64(), b.to_f64()));
            report.record_case(op, &a, &b, &expected, &actual);
        }
        tracing::trace!(target: "unum_verify", "row {:#x} of {} done", a_bits, T::type_tag());
    }
    report
}

/// Round-trip sweep: for every non-NaN pattern `p`,
/// `encode(decode(p)) == p` through the double pathway.
pub fn verify_conversion_exhaustive<T: NumberSystem>(interrupt: Option<&AtomicBool>) -> Report {
    debug_assert!(T::NBITS <= 24, "exhaustive sweep of a space this large");
    let mut report = Report::default();
    let patterns = 1u128 << T::NBITS;
    let chunk = 1u128 << T::NBITS.saturating_sub(8).min(16);
    for (index, p) in (0..patterns).enumerate() {
        if index as u128 % chunk == 0 {
            if let Some(flag) = interrupt {
                if flag.load(Ordering::Relaxed) {
                    report.interrupted = true;
                    break;
                }
            }
        }
        let value = T::from_bits(p);
        if value.classify() == NumClass::Nan {
            continue;
        }
        let back = T::from_f64(value.to_f64());
        report.record_case(BinaryOp::Add, &value, &value, &value, &back);
    }
    report
}

/// Cross-product driver for callers that partition the space themselves,
/// e.g. to spread a sweep over threads: verifies `op` over the given
/// pattern ranges only, for a later [`Report::merge`].
pub fn verify_binary_partition<T: NumberSystem, I>(
    op: BinaryOp,
    lhs: impl IntoIterator<Item = u128>,
    rhs: I,
) -> Report
where
    I: IntoIterator<Item = u128>,
    I::IntoIter: Clone,
{
    let mut report = Report::default();
    for (a_bits, b_bits) in lhs.into_iter().cartesian_product(rhs) {
        let a = T::from_bits(a_bits);
        let b = T::from_bits(b_bits);
        let actual = op.apply(a, b);
        let expected = T::from_f64(oracle(op, a.to_f64(), b.to_f64()));
        report.record_case(op, &a, &b, &expected, &actual);
    }
    report
}

pub(crate) fn oracle(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
    }
}
