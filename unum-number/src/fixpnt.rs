use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use unum_blocks::{native, round_at, Limb, RoundingMode};

use crate::error::{ArithmeticError, ParseNumberError};
use crate::specific::{NumClass, NumCmp, SpecificValue};
use crate::traits::NumberSystem;

#[cfg(feature = "random")]
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

/// Overflow policy marker of a [`Fixpnt`].
pub trait FixpntArithmetic: Copy + Default + 'static {
    const SATURATING: bool;
    const NAME: &'static str;
}

/// Out-of-range results clamp to the extreme representable values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Saturating;

impl FixpntArithmetic for Saturating {
    const SATURATING: bool = true;
    const NAME: &'static str = "saturating";
}

/// Out-of-range results wrap modularly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modular;

impl FixpntArithmetic for Modular {
    const SATURATING: bool = false;
    const NAME: &'static str = "modular";
}

/// Two's-complement fixed-point: `NBITS` total bits of which `RBITS` are
/// fractional, so the pattern divided by `2^RBITS` is the value.
///
/// Addition and subtraction are plain pattern arithmetic; multiplication
/// widens to the double width and shifts back with round-to-nearest-even;
/// division pre-shifts the dividend. The arithmetic marker selects clamping
/// or wrap-around on overflow.
#[derive(Clone, Copy, Hash)]
pub struct Fixpnt<
    const NBITS: usize,
    const RBITS: usize,
    A: FixpntArithmetic = Saturating,
    BT: Limb = u64,
> {
    bits: u64,
    _marker: PhantomData<(A, BT)>,
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> PartialEq
    for Fixpnt<NBITS, RBITS, A, BT>
{
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> Eq
    for Fixpnt<NBITS, RBITS, A, BT>
{
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> Default
    for Fixpnt<NBITS, RBITS, A, BT>
{
    fn default() -> Self {
        Self::from_raw_bits(0)
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb>
    Fixpnt<NBITS, RBITS, A, BT>
{
    const LAYOUT_OK: () = assert!(
        NBITS >= 2 && NBITS <= 64 && RBITS < NBITS,
        "unsupported fixpnt configuration"
    );

    const MASK: u64 = if NBITS == 64 {
        u64::MAX
    } else {
        (1u64 << NBITS) - 1
    };

    const MAX_SV: i128 = (1i128 << (NBITS - 1)) - 1;
    const MIN_SV: i128 = -(1i128 << (NBITS - 1));

    pub fn from_raw_bits(bits: u64) -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::LAYOUT_OK;
        Self {
            bits: bits & Self::MASK,
            _marker: PhantomData,
        }
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Raw limb view of the pattern, least significant limb first.
    pub fn limb(&self, index: usize) -> BT {
        let shift = index as u32 * BT::BITS;
        if shift >= 64 {
            BT::ZERO
        } else {
            BT::from_word(self.bits >> shift)
        }
    }

    /// Pattern as a sign-extended machine integer (value times `2^RBITS`).
    fn signed_value(&self) -> i64 {
        ((self.bits << (64 - NBITS)) as i64) >> (64 - NBITS)
    }

    /// Applies the overflow policy to a widened signed pattern.
    fn from_signed_value(v: i128) -> Self {
        if A::SATURATING {
            if v > Self::MAX_SV {
                return Self::from_raw_bits(Self::MAX_SV as u64);
            }
            if v < Self::MIN_SV {
                return Self::from_raw_bits(Self::MIN_SV as u64);
            }
        }
        Self::from_raw_bits(v as u64)
    }

    pub fn zero() -> Self {
        Self::from_raw_bits(0)
    }

    pub fn one() -> Self {
        Self::from_signed_value(1i128 << RBITS)
    }

    pub fn is_zero(&self) -> bool {
        self.bits == 0
    }

    pub fn is_negative(&self) -> bool {
        self.signed_value() < 0
    }

    pub fn maxpos() -> Self {
        Self::from_raw_bits(Self::MAX_SV as u64)
    }

    pub fn minneg() -> Self {
        Self::from_raw_bits(Self::MIN_SV as u64)
    }

    pub fn minpos() -> Self {
        Self::from_raw_bits(1)
    }

    /// Widened product as a signed pattern, rounded back to the fraction
    /// scale.
    fn mul_signed(self, rhs: Self) -> i128 {
        let product = self.signed_value() as i128 * rhs.signed_value() as i128;
        let negative = product < 0;
        let (rounded, _) = round_at(
            product.unsigned_abs(),
            RBITS as u32,
            RoundingMode::NearestEven,
            false,
        );
        if negative {
            -(rounded as i128)
        } else {
            rounded as i128
        }
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> Add
    for Fixpnt<NBITS, RBITS, A, BT>
{
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_signed_value(self.signed_value() as i128 + rhs.signed_value() as i128)
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> Sub
    for Fixpnt<NBITS, RBITS, A, BT>
{
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_signed_value(self.signed_value() as i128 - rhs.signed_value() as i128)
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> Mul
    for Fixpnt<NBITS, RBITS, A, BT>
{
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_signed_value(self.mul_signed(rhs))
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> Div
    for Fixpnt<NBITS, RBITS, A, BT>
{
    type Output = Self;

    /// Division by zero saturates to the signed extreme (zero dividend
    /// yields zero); use [`Fixpnt::checked_div`] for the error.
    fn div(self, rhs: Self) -> Self {
        if rhs.is_zero() {
            return if self.is_zero() {
                Self::zero()
            } else if self.is_negative() {
                Self::minneg()
            } else {
                Self::maxpos()
            };
        }
        let dividend = (self.signed_value() as i128) << RBITS;
        let divisor = rhs.signed_value() as i128;
        let negative = (dividend < 0) != (divisor < 0);
        let (n, d) = (dividend.unsigned_abs(), divisor.unsigned_abs());
        let mut q = n / d;
        let r = n % d;
        // round the quotient to nearest, ties to even
        if 2 * r > d || (2 * r == d && q & 1 == 1) {
            q += 1;
        }
        let signed = if negative { -(q as i128) } else { q as i128 };
        Self::from_signed_value(signed)
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> Neg
    for Fixpnt<NBITS, RBITS, A, BT>
{
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_signed_value(-(self.signed_value() as i128))
    }
}

macro_rules! assign_ops {
    ($($assign:ident :: $fn:ident => $op:tt),*) => {
        $(
            impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> $assign
                for Fixpnt<NBITS, RBITS, A, BT>
            {
                fn $fn(&mut self, rhs: Self) {
                    *self = *self $op rhs;
                }
            }
        )*
    };
}

assign_ops!(AddAssign::add_assign => +, SubAssign::sub_assign => -, MulAssign::mul_assign => *, DivAssign::div_assign => /);

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> Ord
    for Fixpnt<NBITS, RBITS, A, BT>
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.signed_value().cmp(&other.signed_value())
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> PartialOrd
    for Fixpnt<NBITS, RBITS, A, BT>
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> NumberSystem
    for Fixpnt<NBITS, RBITS, A, BT>
{
    const NBITS: usize = NBITS;

    fn from_f64(x: f64) -> Self {
        if x.is_nan() {
            return Self::zero();
        }
        if x.is_infinite() {
            return if x > 0.0 { Self::maxpos() } else { Self::minneg() };
        }
        let (negative, scale, sig) = match native::f64_parts(x) {
            None => return Self::zero(),
            Some(parts) => parts,
        };
        if scale >= (NBITS - RBITS) as i32 {
            // magnitude beyond the integer range
            return Self::from_signed_value(if negative {
                Self::MIN_SV - 1
            } else {
                Self::MAX_SV + 1
            });
        }
        let shift = scale - 52 + RBITS as i32;
        let magnitude = if shift >= 0 {
            (sig as u128) << shift
        } else if -shift > 127 {
            0
        } else {
            round_at(sig as u128, (-shift) as u32, RoundingMode::NearestEven, false).0
        };
        let signed = if negative {
            -(magnitude as i128)
        } else {
            magnitude as i128
        };
        Self::from_signed_value(signed)
    }

    fn to_f64(&self) -> f64 {
        let sv = self.signed_value();
        if sv == 0 {
            return 0.0;
        }
        let magnitude = sv.unsigned_abs();
        let lead = 63 - magnitude.leading_zeros();
        native::f64_from_parts(
            sv < 0,
            lead as i32 - RBITS as i32,
            magnitude as u128,
            false,
        )
    }

    fn classify(&self) -> NumClass {
        if self.is_zero() {
            NumClass::Zero
        } else {
            NumClass::Normal
        }
    }

    fn compare(&self, other: &Self) -> NumCmp {
        self.cmp(other).into()
    }

    fn checked_add(self, rhs: Self) -> Result<Self, ArithmeticError> {
        let sum = self.signed_value() as i128 + rhs.signed_value() as i128;
        if A::SATURATING && (sum > Self::MAX_SV || sum < Self::MIN_SV) {
            return Err(ArithmeticError::Overflow);
        }
        Ok(self + rhs)
    }

    fn checked_sub(self, rhs: Self) -> Result<Self, ArithmeticError> {
        let diff = self.signed_value() as i128 - rhs.signed_value() as i128;
        if A::SATURATING && (diff > Self::MAX_SV || diff < Self::MIN_SV) {
            return Err(ArithmeticError::Overflow);
        }
        Ok(self - rhs)
    }

    fn checked_mul(self, rhs: Self) -> Result<Self, ArithmeticError> {
        let product = self.mul_signed(rhs);
        if A::SATURATING && (product > Self::MAX_SV || product < Self::MIN_SV) {
            return Err(ArithmeticError::Overflow);
        }
        Ok(Self::from_signed_value(product))
    }

    fn checked_div(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(self / rhs)
    }

    fn from_bits(bits: u128) -> Self {
        Self::from_raw_bits(bits as u64)
    }

    fn to_bits(&self) -> u128 {
        self.bits as u128
    }

    fn type_tag() -> String {
        format!("fixpnt<{},{},{},{}>", NBITS, RBITS, A::NAME, BT::NAME)
    }

    fn specific_value(code: SpecificValue) -> Self {
        match code {
            SpecificValue::Zero | SpecificValue::Qnan | SpecificValue::Snan | SpecificValue::Nar => {
                Self::zero()
            }
            SpecificValue::Minpos => Self::minpos(),
            SpecificValue::Maxpos | SpecificValue::Infpos => Self::maxpos(),
            SpecificValue::Minneg => -Self::minpos(),
            SpecificValue::Maxneg | SpecificValue::Infneg => Self::minneg(),
        }
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> fmt::Display
    for Fixpnt<NBITS, RBITS, A, BT>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> fmt::Debug
    for Fixpnt<NBITS, RBITS, A, BT>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#x})", Self::type_tag(), self.bits)
    }
}

impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb> FromStr
    for Fixpnt<NBITS, RBITS, A, BT>
{
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

#[cfg(feature = "random")]
impl<const NBITS: usize, const RBITS: usize, A: FixpntArithmetic, BT: Limb>
    Distribution<Fixpnt<NBITS, RBITS, A, BT>> for Standard
{
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Fixpnt<NBITS, RBITS, A, BT> {
        Fixpnt::from_raw_bits(rng.gen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Q16_8 = Fixpnt<16, 8, Saturating, u16>;
    type Q16_8M = Fixpnt<16, 8, Modular, u16>;
    type Q32_16 = Fixpnt<32, 16, Saturating, u32>;

    #[test]
    fn dyadic_values_are_exact() {
        for x in [0.0, 1.0, -1.0, 0.5, 0.25, 1.75, -2.125] {
            assert_eq!(Q16_8::from_f64(x).to_f64(), x, "value {x}");
        }
    }

    #[test]
    fn conversion_rounds_to_nearest_even() {
        // 1/512 is exactly half an ulp of Q16.8: ties to even -> 0
        assert_eq!(Q16_8::from_f64(1.0 / 512.0).bits(), 0);
        // three halves of an ulp rounds up to 2 ulp
        assert_eq!(Q16_8::from_f64(3.0 / 512.0).bits(), 2);
    }

    #[test]
    fn addition_and_subtraction_are_pattern_arithmetic() {
        let a = Q16_8::from_f64(1.5);
        let b = Q16_8::from_f64(0.25);
        assert_eq!((a + b).to_f64(), 1.75);
        assert_eq!((a - b).to_f64(), 1.25);
        assert_eq!((b - a).to_f64(), -1.25);
    }

    #[test]
    fn multiplication_rounds_the_widened_product() {
        let a = Q16_8::from_f64(1.5);
        let b = Q16_8::from_f64(2.5);
        assert_eq!((a * b).to_f64(), 3.75);
        // 0.00390625^2 = 2^-16 rounds to nearest even at 2^-8 scale -> 0
        let ulp = Q16_8::minpos();
        assert!((ulp * ulp).is_zero());
    }

    #[test]
    fn division_preshifts_the_dividend() {
        let a = Q16_8::from_f64(1.0);
        let b = Q16_8::from_f64(3.0);
        // 256/3 = 85.33 -> 85 ulps
        assert_eq!((a / b).bits(), 85);
        let c = Q32_16::from_f64(10.0);
        let d = Q32_16::from_f64(4.0);
        assert_eq!((c / d).to_f64(), 2.5);
    }

    #[test]
    fn saturating_clamps_and_modular_wraps() {
        let max = Q16_8::maxpos();
        assert_eq!(max + max, max);
        assert_eq!(Q16_8::from_f64(1e9), max);
        assert_eq!(Q16_8::from_f64(-1e9), Q16_8::minneg());

        let max_m = Q16_8M::maxpos();
        assert_eq!((max_m + Q16_8M::minpos()).bits(), 0x8000);
    }

    #[test]
    fn division_by_zero_saturates() {
        let one = Q16_8::from_f64(1.0);
        assert_eq!(one / Q16_8::zero(), Q16_8::maxpos());
        assert_eq!(-one / Q16_8::zero(), Q16_8::minneg());
        assert_eq!(
            one.checked_div(Q16_8::zero()),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn ordering_is_by_signed_value() {
        let neg = Q16_8::from_f64(-1.0);
        let pos = Q16_8::from_f64(0.5);
        assert!(neg < pos);
        assert_eq!(neg.compare(&pos), NumCmp::Less);
    }
}
