use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::error::ArithmeticError;
use crate::specific::{NumClass, NumCmp, SpecificValue};
use crate::traits::NumberSystem;

#[cfg(feature = "random")]
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

const SIGN_MASK: u16 = 0x8000;
const EXP_MASK: u16 = 0x7f80;
const FRAC_MASK: u16 = 0x007f;
const QNAN: u16 = 0x7fc0;
const SNAN: u16 = 0x7fa0;
const INF: u16 = 0x7f80;
const MAXPOS: u16 = 0x7f7f;
const MINPOS: u16 = 0x0001;

/// Brain float: the top half of an IEEE-754 single.
///
/// Conversion to and from `f32` is a byte copy of the high half; arithmetic
/// is performed in `f32` and rounded back to nearest-even. Subnormals,
/// infinities and NaN follow the single-precision conventions.
#[derive(Debug, Default, Clone, Copy)]
#[repr(transparent)]
pub struct Bfloat16 {
    bits: u16,
}

impl Bfloat16 {
    pub fn from_raw_bits(bits: u16) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }

    /// Truncating conversion: the high half of the single's pattern.
    pub fn from_f32_truncate(x: f32) -> Self {
        Self {
            bits: (x.to_bits() >> 16) as u16,
        }
    }

    /// Rounding conversion, ties to even on bit 16 of the single.
    pub fn from_f32(x: f32) -> Self {
        let b = x.to_bits();
        if x.is_nan() {
            // keep the payload top, force quiet
            return Self {
                bits: ((b >> 16) as u16) | 0x0040,
            };
        }
        let lsb = (b >> 16) & 1;
        Self {
            bits: (b.wrapping_add(0x7fff + lsb) >> 16) as u16,
        }
    }

    pub fn to_f32(&self) -> f32 {
        f32::from_bits((self.bits as u32) << 16)
    }

    pub fn zero() -> Self {
        Self { bits: 0 }
    }

    pub fn one() -> Self {
        Self { bits: 0x3f80 }
    }

    pub fn is_zero(&self) -> bool {
        self.bits & !SIGN_MASK == 0
    }

    pub fn is_inf(&self) -> bool {
        self.bits & !SIGN_MASK == INF
    }

    pub fn is_nan(&self) -> bool {
        self.bits & EXP_MASK == EXP_MASK && self.bits & FRAC_MASK != 0
    }

    pub fn is_subnormal(&self) -> bool {
        self.bits & EXP_MASK == 0 && self.bits & FRAC_MASK != 0
    }

    pub fn is_negative(&self) -> bool {
        self.bits & SIGN_MASK != 0
    }

    pub fn sqrt(&self) -> Self {
        Self::from_f32(self.to_f32().sqrt())
    }
}

macro_rules! binary_op {
    ($op:ident, $fn:ident, $native:tt) => {
        impl $op for Bfloat16 {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self {
                Self::from_f32(self.to_f32() $native rhs.to_f32())
            }
        }
    };
}

binary_op!(Add, add, +);
binary_op!(Sub, sub, -);
binary_op!(Mul, mul, *);
binary_op!(Div, div, /);

impl Neg for Bfloat16 {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            bits: self.bits ^ SIGN_MASK,
        }
    }
}

macro_rules! assign_ops {
    ($($assign:ident :: $fn:ident => $op:tt),*) => {
        $(
            impl $assign for Bfloat16 {
                fn $fn(&mut self, rhs: Self) {
                    *self = *self $op rhs;
                }
            }
        )*
    };
}

assign_ops!(AddAssign::add_assign => +, SubAssign::sub_assign => -, MulAssign::mul_assign => *, DivAssign::div_assign => /);

impl PartialEq for Bfloat16 {
    fn eq(&self, other: &Self) -> bool {
        self.to_f32() == other.to_f32()
    }
}

impl PartialOrd for Bfloat16 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.to_f32().partial_cmp(&other.to_f32())
    }
}

impl NumberSystem for Bfloat16 {
    const NBITS: usize = 16;

    fn from_f64(x: f64) -> Self {
        Self::from_f32(x as f32)
    }

    fn to_f64(&self) -> f64 {
        self.to_f32() as f64
    }

    fn classify(&self) -> NumClass {
        if self.is_nan() {
            NumClass::Nan
        } else if self.is_inf() {
            NumClass::Infinite
        } else if self.is_zero() {
            NumClass::Zero
        } else if self.is_subnormal() {
            NumClass::Subnormal
        } else {
            NumClass::Normal
        }
    }

    fn compare(&self, other: &Self) -> NumCmp {
        match self.partial_cmp(other) {
            Some(ord) => ord.into(),
            None => NumCmp::Unordered,
        }
    }

    fn checked_add(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if self.is_nan() || rhs.is_nan() {
            return Err(ArithmeticError::NanPropagation);
        }
        Ok(self + rhs)
    }

    fn checked_sub(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if self.is_nan() || rhs.is_nan() {
            return Err(ArithmeticError::NanPropagation);
        }
        Ok(self - rhs)
    }

    fn checked_mul(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if self.is_nan() || rhs.is_nan() {
            return Err(ArithmeticError::NanPropagation);
        }
        Ok(self * rhs)
    }

    fn checked_div(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if self.is_nan() || rhs.is_nan() {
            return Err(ArithmeticError::NanPropagation);
        }
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(self / rhs)
    }

    fn from_bits(bits: u128) -> Self {
        Self::from_raw_bits(bits as u16)
    }

    fn to_bits(&self) -> u128 {
        self.bits as u128
    }

    fn type_tag() -> String {
        "bfloat16".to_string()
    }

    fn specific_value(code: SpecificValue) -> Self {
        let bits = match code {
            SpecificValue::Zero => 0,
            SpecificValue::Minpos => MINPOS,
            SpecificValue::Maxpos => MAXPOS,
            SpecificValue::Minneg => SIGN_MASK | MINPOS,
            SpecificValue::Maxneg => SIGN_MASK | MAXPOS,
            SpecificValue::Infpos => INF,
            SpecificValue::Infneg => SIGN_MASK | INF,
            SpecificValue::Qnan | SpecificValue::Nar => QNAN,
            SpecificValue::Snan => SNAN,
        };
        Self { bits }
    }
}

impl fmt::Display for Bfloat16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl fmt::LowerHex for Bfloat16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.bits, f)
    }
}

#[cfg(feature = "random")]
impl Distribution<Bfloat16> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Bfloat16 {
        Bfloat16::from_raw_bits(rng.gen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_eq_size!(Bfloat16, u16);

    #[test]
    fn conversion_is_the_high_half_of_f32() {
        assert_eq!(Bfloat16::from_f32_truncate(1.0).bits(), 0x3f80);
        assert_eq!(Bfloat16::one().to_f32(), 1.0);
        assert_eq!(Bfloat16::from_f32_truncate(-2.0).bits(), 0xc000);
    }

    #[test]
    fn rounding_conversion_ties_to_even() {
        // 1 + 2^-8 sits exactly between 1.0 and the next bfloat; even wins
        let tie = f32::from_bits(0x3f80_8000);
        assert_eq!(Bfloat16::from_f32(tie).bits(), 0x3f80);
        // anything above the tie rounds up
        let above = f32::from_bits(0x3f80_8001);
        assert_eq!(Bfloat16::from_f32(above).bits(), 0x3f81);
    }

    #[test]
    fn rounding_can_carry_to_infinity() {
        assert!(Bfloat16::from_f32(f32::MAX).is_inf());
    }

    #[test]
    fn arithmetic_rounds_once_in_f32() {
        let a = Bfloat16::from_f32(1.0);
        let b = Bfloat16::from_f32(2.0);
        assert_eq!((a + b).to_f32(), 3.0);
        assert_eq!((b * b).to_f32(), 4.0);
        assert_eq!((a / b).to_f32(), 0.5);
        assert!((a / Bfloat16::zero()).is_inf());
        assert!((Bfloat16::zero() / Bfloat16::zero()).is_nan());
    }

    #[test]
    fn nan_propagates() {
        let nan = Bfloat16::specific_value(SpecificValue::Qnan);
        assert!((nan + Bfloat16::one()).is_nan());
        assert_ne!(nan, nan);
        assert_eq!(
            Bfloat16::one().checked_add(nan),
            Err(ArithmeticError::NanPropagation)
        );
    }

    #[test]
    fn maxpos_is_the_largest_finite() {
        let max = Bfloat16::specific_value(SpecificValue::Maxpos);
        assert_eq!(max.to_f32(), 3.3895314e38);
        assert!(!max.is_inf());
    }
}
