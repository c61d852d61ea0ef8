use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use crate::error::{ArithmeticError, ParseNumberError};
use crate::expansion::{quick_two_sum, two_prod_fma, two_sum};
use crate::specific::{NumClass, NumCmp, SpecificValue};
use crate::traits::NumberSystem;

/// Double-double: an unevaluated sum of two doubles `(hi, lo)` with
/// `|lo| <= ulp(hi) / 2`, giving roughly 106 significand bits.
///
/// Every operation runs the error-free transformations of the expansion
/// module and renormalizes, so the pair invariant holds after each public
/// operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DoubleDouble {
    hi: f64,
    lo: f64,
}

impl DoubleDouble {
    /// Significand bits of the pair.
    pub const FBITS: u32 = 106;

    /// Renormalizing constructor.
    pub fn new(hi: f64, lo: f64) -> Self {
        let (hi, lo) = quick_two_sum(hi, lo);
        Self { hi, lo }
    }

    /// Adopts a pair as-is; the caller vouches for the invariant.
    pub fn from_pair(hi: f64, lo: f64) -> Self {
        Self { hi, lo }
    }

    /// The components, most significant first.
    pub fn components(&self) -> (f64, f64) {
        (self.hi, self.lo)
    }

    pub fn high(&self) -> f64 {
        self.hi
    }

    pub fn low(&self) -> f64 {
        self.lo
    }

    pub fn zero() -> Self {
        Self { hi: 0.0, lo: 0.0 }
    }

    pub fn one() -> Self {
        Self { hi: 1.0, lo: 0.0 }
    }

    pub fn is_zero(&self) -> bool {
        self.hi == 0.0
    }

    pub fn is_nan(&self) -> bool {
        self.hi.is_nan() || self.lo.is_nan()
    }

    pub fn is_inf(&self) -> bool {
        self.hi.is_infinite()
    }

    pub fn is_negative(&self) -> bool {
        self.hi < 0.0 || (self.hi == 0.0 && self.hi.is_sign_negative())
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() {
            -*self
        } else {
            *self
        }
    }

}

impl Add for DoubleDouble {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let (s1, s2) = two_sum(self.hi, rhs.hi);
        let (t1, t2) = two_sum(self.lo, rhs.lo);
        let (s1, s2) = quick_two_sum(s1, s2 + t1);
        let (hi, lo) = quick_two_sum(s1, s2 + t2);
        Self { hi, lo }
    }
}

impl Sub for DoubleDouble {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Mul for DoubleDouble {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let (p1, p2) = two_prod_fma(self.hi, rhs.hi);
        let p2 = p2 + self.hi * rhs.lo + self.lo * rhs.hi;
        let (hi, lo) = quick_two_sum(p1, p2);
        Self { hi, lo }
    }
}

impl Div for DoubleDouble {
    type Output = Self;

    /// Long division in double-double: three quotient terms capture the
    /// full pair precision.
    fn div(self, rhs: Self) -> Self {
        if rhs.is_zero() {
            let hi = self.hi / rhs.hi;
            return Self { hi, lo: 0.0 };
        }
        let q1 = self.hi / rhs.hi;
        let r = self - rhs * Self::from_pair(q1, 0.0);
        let q2 = r.hi / rhs.hi;
        let r = r - rhs * Self::from_pair(q2, 0.0);
        let q3 = r.hi / rhs.hi;
        let (s, e) = quick_two_sum(q1, q2);
        Self::new(s, e + q3)
    }
}

impl Neg for DoubleDouble {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            hi: -self.hi,
            lo: -self.lo,
        }
    }
}

macro_rules! assign_ops {
    ($($assign:ident :: $fn:ident => $op:tt),*) => {
        $(
            impl $assign for DoubleDouble {
                fn $fn(&mut self, rhs: Self) {
                    *self = *self $op rhs;
                }
            }
        )*
    };
}

assign_ops!(AddAssign::add_assign => +, SubAssign::sub_assign => -, MulAssign::mul_assign => *, DivAssign::div_assign => /);

impl PartialEq for DoubleDouble {
    fn eq(&self, other: &Self) -> bool {
        if self.is_nan() || other.is_nan() {
            return false;
        }
        self.hi == other.hi && self.lo == other.lo
    }
}

impl PartialOrd for DoubleDouble {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.is_nan() || other.is_nan() {
            return None;
        }
        // normalized pairs compare lexicographically
        match self.hi.partial_cmp(&other.hi)? {
            Ordering::Equal => self.lo.partial_cmp(&other.lo),
            ord => Some(ord),
        }
    }
}

impl NumberSystem for DoubleDouble {
    const NBITS: usize = 128;

    fn from_f64(x: f64) -> Self {
        Self { hi: x, lo: 0.0 }
    }

    fn to_f64(&self) -> f64 {
        self.hi + self.lo
    }

    fn classify(&self) -> NumClass {
        if self.is_nan() {
            NumClass::Nan
        } else if self.is_inf() {
            NumClass::Infinite
        } else if self.is_zero() {
            NumClass::Zero
        } else if self.hi.is_subnormal() {
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
        Self {
            hi: f64::from_bits((bits >> 64) as u64),
            lo: f64::from_bits(bits as u64),
        }
    }

    fn to_bits(&self) -> u128 {
        ((self.hi.to_bits() as u128) << 64) | self.lo.to_bits() as u128
    }

    fn type_tag() -> String {
        "dd_cascade".to_string()
    }

    fn specific_value(code: SpecificValue) -> Self {
        match code {
            SpecificValue::Zero => Self::zero(),
            SpecificValue::Minpos => Self::from_f64(f64::from_bits(1)),
            SpecificValue::Maxpos => Self::from_pair(f64::MAX, f64::MAX * 2f64.powi(-54)),
            SpecificValue::Minneg => Self::from_f64(-f64::from_bits(1)),
            SpecificValue::Maxneg => Self::from_pair(-f64::MAX, -f64::MAX * 2f64.powi(-54)),
            SpecificValue::Infpos => Self::from_f64(f64::INFINITY),
            SpecificValue::Infneg => Self::from_f64(f64::NEG_INFINITY),
            SpecificValue::Qnan | SpecificValue::Snan | SpecificValue::Nar => {
                Self::from_f64(f64::NAN)
            }
        }
    }
}

impl fmt::Display for DoubleDouble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl FromStr for DoubleDouble {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseNumberError::Empty);
        }
        s.parse::<f64>()
            .map(Self::from_f64)
            .map_err(|_| ParseNumberError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_catastrophic_subtraction() {
        // (1e20 + 1) - 1e20 is exactly 1 in double-double
        let big = DoubleDouble::from_f64(1e20);
        let sum = big + DoubleDouble::one();
        assert_eq!(sum.low(), 1.0);
        let diff = sum - big;
        assert_eq!(diff, DoubleDouble::one());
        assert_eq!(diff.to_f64(), 1.0);
    }

    #[test]
    fn components_stay_normalized() {
        let x = DoubleDouble::from_f64(0.1) + DoubleDouble::from_f64(0.2);
        let (hi, lo) = x.components();
        assert!(lo.abs() <= hi.abs() * f64::EPSILON);
        // the pair carries the residual the double sum lost
        assert_ne!(lo, 0.0);
    }

    #[test]
    fn multiplication_captures_the_error_term() {
        let a = DoubleDouble::from_f64(1.0 + f64::EPSILON);
        let p = a * a;
        assert_eq!(p.high(), 1.0 + 2.0 * f64::EPSILON);
        assert_eq!(p.low(), f64::EPSILON * f64::EPSILON);
    }

    #[test]
    fn division_recovers_exact_ratios() {
        let six = DoubleDouble::from_f64(6.0);
        let three = DoubleDouble::from_f64(3.0);
        assert_eq!(six / three, DoubleDouble::from_f64(2.0));

        // 1/3 in double-double is better than 1/3 in double
        let third = DoubleDouble::one() / three;
        let back = third * three;
        assert_eq!(back.to_f64(), 1.0);
    }

    #[test]
    fn specials_propagate() {
        let nan = DoubleDouble::specific_value(SpecificValue::Qnan);
        assert!((nan + DoubleDouble::one()).is_nan());
        assert_ne!(nan, nan);
        assert!((DoubleDouble::one() / DoubleDouble::zero()).is_inf());
        assert_eq!(
            DoubleDouble::one().checked_div(DoubleDouble::zero()),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn maxpos_respects_the_pair_invariant() {
        let max = DoubleDouble::specific_value(SpecificValue::Maxpos);
        let (hi, lo) = max.components();
        assert_eq!(hi, f64::MAX);
        assert!(lo > 0.0 && lo.is_finite());
        // renormalization would not move anything
        let renorm = DoubleDouble::new(hi, lo);
        assert_eq!(renorm.components(), (hi, lo));
    }

    #[test]
    fn bit_pattern_round_trip() {
        let x = DoubleDouble::from_f64(0.1) + DoubleDouble::from_f64(0.7);
        let y = DoubleDouble::from_bits(x.to_bits());
        assert_eq!(x, y);
    }
}
