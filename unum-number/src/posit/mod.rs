use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use unum_blocks::BlockTriple;

use crate::error::{ArithmeticError, ParseNumberError};
use crate::specific::{NumClass, NumCmp, SpecificValue};
use crate::traits::NumberSystem;

mod codec;

#[cfg(feature = "random")]
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

// The checked variants only differ in the operator they forward to after
// the NaR screen.
macro_rules! posit_checked_ops {
    ($($fn:ident => $op:tt),*) => {
        paste::paste! {
            $(
                fn [<checked_ $fn>](self, rhs: Self) -> Result<Self, ArithmeticError> {
                    if self.is_nar() || rhs.is_nar() {
                        return Err(ArithmeticError::NarPropagation);
                    }
                    Ok(self $op rhs)
                }
            )*
        }
    };
}

/// Tapered-precision real number with a variable-length unary regime field.
///
/// The pattern is stored LSB-aligned in one machine word with bits at and
/// above `NBITS` always zero. Exactly two encodings are special: all-zeros
/// is zero and the sign bit alone is NaR. Arithmetic saturates at
/// maxpos/minpos and propagates NaR; it never overflows to an infinity and
/// never underflows a nonzero value to zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Posit<const NBITS: usize, const ES: usize> {
    bits: u64,
}

/// The standard fast configurations, exposed as an alias table so callers
/// never branch on width. The word-based kernel is the fast path for every
/// configuration, so the aliases share one implementation.
pub type Posit8 = Posit<8, 2>;
pub type Posit16 = Posit<16, 1>;
pub type Posit32 = Posit<32, 2>;

impl<const NBITS: usize, const ES: usize> Posit<NBITS, ES> {
    const LAYOUT_OK: () = assert!(
        NBITS >= 2 && NBITS <= 64 && ES <= 8 && (ES == 0 || ES + 3 <= NBITS),
        "unsupported posit configuration"
    );

    const MASK: u64 = if NBITS == 64 {
        u64::MAX
    } else {
        (1u64 << NBITS) - 1
    };
    const SIGN_MASK: u64 = 1u64 << (NBITS - 1);

    /// Reconstructs a posit from its raw pattern; bits at and above `NBITS`
    /// are dropped.
    pub fn from_raw_bits(bits: u64) -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::LAYOUT_OK;
        Self {
            bits: bits & Self::MASK,
        }
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn zero() -> Self {
        Self::from_raw_bits(0)
    }

    pub fn one() -> Self {
        Self::from_raw_bits(Self::SIGN_MASK >> 1)
    }

    /// Not-a-Real: the single exception value.
    pub fn nar() -> Self {
        Self::from_raw_bits(Self::SIGN_MASK)
    }

    pub fn minpos() -> Self {
        Self::from_raw_bits(1)
    }

    pub fn maxpos() -> Self {
        Self::from_raw_bits(Self::MASK >> 1)
    }

    pub fn minneg() -> Self {
        -Self::minpos()
    }

    pub fn maxneg() -> Self {
        -Self::maxpos()
    }

    pub fn is_zero(&self) -> bool {
        self.bits == 0
    }

    pub fn is_nar(&self) -> bool {
        self.bits == Self::SIGN_MASK
    }

    pub fn is_negative(&self) -> bool {
        !self.is_nar() && self.bits & Self::SIGN_MASK != 0
    }

    fn triple(&self) -> BlockTriple {
        if self.is_nar() {
            BlockTriple::nan()
        } else if self.is_zero() {
            BlockTriple::zero(false)
        } else {
            codec::decode(NBITS as u32, ES as u32, self.bits)
        }
    }

    fn from_triple(t: BlockTriple) -> Self {
        if t.is_nan() || t.is_inf() {
            return Self::nar();
        }
        if t.is_zero() {
            return Self::zero();
        }
        Self::from_raw_bits(codec::encode(
            NBITS as u32,
            ES as u32,
            t.sign(),
            t.scale(),
            t.significant(),
            t.fbits(),
            false,
        ))
    }

    pub(crate) fn encode_rounded(
        sign: bool,
        scale: i32,
        sig: u128,
        fbits: u32,
        sticky: bool,
    ) -> Self {
        Self::from_raw_bits(codec::encode(
            NBITS as u32,
            ES as u32,
            sign,
            scale,
            sig,
            fbits,
            sticky,
        ))
    }

    pub(crate) fn decoded(&self) -> BlockTriple {
        self.triple()
    }

    /// Square root; NaR for negative input and NaR.
    pub fn sqrt(&self) -> Self {
        if self.is_nar() || self.is_negative() {
            return Self::nar();
        }
        if self.is_zero() {
            return Self::zero();
        }
        Self::from_triple(self.triple().sqrt())
    }

}

impl<const NBITS: usize, const ES: usize> Add for Posit<NBITS, ES> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.is_nar() || rhs.is_nar() {
            return Self::nar();
        }
        Self::from_triple(self.triple().add(&rhs.triple()))
    }
}

impl<const NBITS: usize, const ES: usize> Sub for Posit<NBITS, ES> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        if self.is_nar() || rhs.is_nar() {
            return Self::nar();
        }
        Self::from_triple(self.triple().sub(&rhs.triple()))
    }
}

impl<const NBITS: usize, const ES: usize> Mul for Posit<NBITS, ES> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self.is_nar() || rhs.is_nar() {
            return Self::nar();
        }
        Self::from_triple(self.triple().mul(&rhs.triple()))
    }
}

impl<const NBITS: usize, const ES: usize> Div for Posit<NBITS, ES> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        if self.is_nar() || rhs.is_nar() {
            return Self::nar();
        }
        // x/0 and 0/0 both come back from the triple as inf/nan -> NaR
        Self::from_triple(self.triple().div(&rhs.triple()))
    }
}

impl<const NBITS: usize, const ES: usize> Neg for Posit<NBITS, ES> {
    type Output = Self;

    fn neg(self) -> Self {
        // exact: two's complement of the pattern, NaR and zero map to
        // themselves
        Self::from_raw_bits(self.bits.wrapping_neg())
    }
}

macro_rules! assign_ops {
    ($($assign:ident :: $fn:ident => $op:tt),*) => {
        $(
            impl<const NBITS: usize, const ES: usize> $assign for Posit<NBITS, ES> {
                fn $fn(&mut self, rhs: Self) {
                    *self = *self $op rhs;
                }
            }
        )*
    };
}

assign_ops!(AddAssign::add_assign => +, SubAssign::sub_assign => -, MulAssign::mul_assign => *, DivAssign::div_assign => /);

impl<const NBITS: usize, const ES: usize> Ord for Posit<NBITS, ES> {
    fn cmp(&self, other: &Self) -> Ordering {
        // the pattern read as a signed word orders the projective reals
        // with NaR as the minimum
        let a = (self.bits << (64 - NBITS)) as i64;
        let b = (other.bits << (64 - NBITS)) as i64;
        a.cmp(&b)
    }
}

impl<const NBITS: usize, const ES: usize> PartialOrd for Posit<NBITS, ES> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const NBITS: usize, const ES: usize> NumberSystem for Posit<NBITS, ES> {
    const NBITS: usize = NBITS;

    fn from_f64(x: f64) -> Self {
        if x.is_nan() || x.is_infinite() {
            return Self::nar();
        }
        Self::from_triple(BlockTriple::from_f64(x))
    }

    fn to_f64(&self) -> f64 {
        self.triple().to_f64()
    }

    fn classify(&self) -> NumClass {
        if self.is_nar() {
            NumClass::Nan
        } else if self.is_zero() {
            NumClass::Zero
        } else {
            NumClass::Normal
        }
    }

    posit_checked_ops!(add => +, sub => -, mul => *);

    fn checked_div(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if self.is_nar() || rhs.is_nar() {
            return Err(ArithmeticError::NarPropagation);
        }
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(self / rhs)
    }

    fn compare(&self, other: &Self) -> NumCmp {
        // posits are totally ordered; NaR sorts below every real
        self.cmp(other).into()
    }

    fn from_bits(bits: u128) -> Self {
        Self::from_raw_bits(bits as u64)
    }

    fn to_bits(&self) -> u128 {
        self.bits as u128
    }

    fn type_tag() -> String {
        format!("posit<{},{}>", NBITS, ES)
    }

    fn specific_value(code: SpecificValue) -> Self {
        match code {
            SpecificValue::Zero => Self::zero(),
            SpecificValue::Minpos => Self::minpos(),
            SpecificValue::Maxpos | SpecificValue::Infpos => Self::maxpos(),
            SpecificValue::Minneg => Self::minneg(),
            SpecificValue::Maxneg | SpecificValue::Infneg => Self::maxneg(),
            SpecificValue::Qnan | SpecificValue::Snan | SpecificValue::Nar => Self::nar(),
        }
    }
}

impl<const NBITS: usize, const ES: usize> fmt::Display for Posit<NBITS, ES> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nar() {
            write!(f, "nar")
        } else {
            write!(f, "{}", self.to_f64())
        }
    }
}

impl<const NBITS: usize, const ES: usize> fmt::LowerHex for Posit<NBITS, ES> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.bits, f)
    }
}

impl<const NBITS: usize, const ES: usize> FromStr for Posit<NBITS, ES> {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseNumberError::Empty);
        }
        if s.eq_ignore_ascii_case("nar") {
            return Ok(Self::nar());
        }
        s.parse::<f64>()
            .map(Self::from_f64)
            .map_err(|_| ParseNumberError::Malformed)
    }
}

#[cfg(feature = "random")]
impl<const NBITS: usize, const ES: usize> Distribution<Posit<NBITS, ES>> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Posit<NBITS, ES> {
        Posit::from_raw_bits(rng.gen())
    }
}
