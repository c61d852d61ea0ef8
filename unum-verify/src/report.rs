use core::fmt;

use strum::Display;

use unum_number::{ArithmeticError, NumClass, NumberSystem};

/// Operation under verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn apply<T: NumberSystem>(&self, a: T, b: T) -> T {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }

    /// The checked wrapper of the operation, surfacing the error taxonomy
    /// instead of a sentinel.
    pub fn apply_checked<T: NumberSystem>(&self, a: T, b: T) -> Result<T, ArithmeticError> {
        match self {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => a.checked_div(b),
        }
    }
}

/// One mismatching case, recorded with the operand patterns for
/// reproduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub op: BinaryOp,
    pub a_bits: u128,
    pub b_bits: u128,
    pub expected_bits: u128,
    pub actual_bits: u128,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FAIL {}: a={:#x} b={:#x} expected={:#x} actual={:#x}",
            self.op, self.a_bits, self.b_bits, self.expected_bits, self.actual_bits
        )
    }
}

/// Outcome of a verification sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub cases: u64,
    pub failures: Vec<Failure>,
    pub interrupted: bool,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }

    pub fn fail_count(&self) -> usize {
        self.failures.len()
    }

    /// Folds a partition's report into this one.
    pub fn merge(&mut self, other: Report) {
        self.cases += other.cases;
        self.failures.extend(other.failures);
        self.interrupted |= other.interrupted;
    }

    pub(crate) fn record_case<T: NumberSystem>(
        &mut self,
        op: BinaryOp,
        a: &T,
        b: &T,
        expected: &T,
        actual: &T,
    ) {
        self.cases += 1;
        if !canonical_match(expected, actual) {
            let failure = Failure {
                op,
                a_bits: a.to_bits(),
                b_bits: b.to_bits(),
                expected_bits: expected.to_bits(),
                actual_bits: actual.to_bits(),
            };
            tracing::debug!(target: "unum_verify", "{} [{}]", failure, T::type_tag());
            self.failures.push(failure);
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            write!(f, "PASS: {} cases", self.cases)
        } else {
            write!(
                f,
                "{}: {} cases, {} failures",
                if self.interrupted { "INTERRUPTED" } else { "FAIL" },
                self.cases,
                self.fail_count()
            )
        }
    }
}

/// Pattern equality up to the canonical NaN: every NaN/NaR representation
/// matches every other.
pub(crate) fn canonical_match<T: NumberSystem>(a: &T, b: &T) -> bool {
    if a.classify() == NumClass::Nan && b.classify() == NumClass::Nan {
        return true;
    }
    a.to_bits() == b.to_bits() || a == b
}
