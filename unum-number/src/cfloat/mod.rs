use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use unum_blocks::{round_at, BlockTriple, Limb, RoundingMode};

use crate::error::{ArithmeticError, ParseNumberError};
use crate::specific::{NumClass, NumCmp, SpecificValue};
use crate::traits::{compare_triples, NumberSystem};

mod flavor;

pub use flavor::{CfloatFlavor, Ieee, IeeeSaturating, NoSubnormals};

#[cfg(feature = "random")]
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

/// Classic IEEE-754-shaped float: sign, `ES` exponent bits, and
/// `NBITS - ES - 1` fraction bits, with the flavor controlling the
/// subnormal, supernormal and saturation behavior.
///
/// The pattern is stored LSB-aligned in one machine word; the limb
/// parameter `BT` selects the granularity of the raw word view exposed by
/// [`Cfloat::limb`].
#[derive(Clone, Copy)]
pub struct Cfloat<const NBITS: usize, const ES: usize, BT: Limb = u32, F: CfloatFlavor = Ieee> {
    bits: u64,
    _marker: PhantomData<(BT, F)>,
}

impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> Default
    for Cfloat<NBITS, ES, BT, F>
{
    fn default() -> Self {
        Self::from_raw_bits(0)
    }
}

impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> Cfloat<NBITS, ES, BT, F> {
    const LAYOUT_OK: () = assert!(
        NBITS <= 64 && ES >= 1 && ES <= 20 && NBITS >= ES + 2,
        "unsupported cfloat configuration"
    );

    const MASK: u64 = if NBITS == 64 {
        u64::MAX
    } else {
        (1u64 << NBITS) - 1
    };
    const SIGN_MASK: u64 = 1u64 << (NBITS - 1);
    /// Fraction field width.
    pub const FBITS: usize = NBITS - 1 - ES;
    const FRAC_MASK: u64 = (1u64 << Self::FBITS) - 1;
    const EXP_MAX: u64 = (1u64 << ES) - 1;
    const BIAS: i32 = (1i32 << (ES - 1)) - 1;
    const MIN_NORMAL_SCALE: i32 = 1 - Self::BIAS;
    const MAX_SCALE: i32 = if F::HAS_SUPERNORMALS {
        Self::EXP_MAX as i32 - 1 - Self::BIAS
    } else {
        Self::EXP_MAX as i32 - Self::BIAS
    };

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

    fn sign_of(bits: u64) -> bool {
        bits & Self::SIGN_MASK != 0
    }

    fn exponent_field(&self) -> u64 {
        (self.bits >> Self::FBITS) & Self::EXP_MAX
    }

    fn fraction_field(&self) -> u64 {
        self.bits & Self::FRAC_MASK
    }

    pub fn zero() -> Self {
        Self::from_raw_bits(0)
    }

    pub fn one() -> Self {
        Self::from_raw_bits((Self::BIAS as u64) << Self::FBITS)
    }

    pub fn infinity(negative: bool) -> Self {
        if F::HAS_SUPERNORMALS {
            Self::assemble(negative, Self::EXP_MAX, 0)
        } else {
            Self::maxpos_signed(negative)
        }
    }

    pub fn qnan() -> Self {
        if F::HAS_SUPERNORMALS {
            Self::assemble(false, Self::EXP_MAX, 1u64 << (Self::FBITS - 1))
        } else {
            Self::maxpos_signed(false)
        }
    }

    pub fn snan() -> Self {
        if F::HAS_SUPERNORMALS {
            Self::assemble(false, Self::EXP_MAX, 1)
        } else {
            Self::maxpos_signed(false)
        }
    }

    fn maxpos_signed(negative: bool) -> Self {
        let exponent = if F::HAS_SUPERNORMALS {
            Self::EXP_MAX - 1
        } else {
            Self::EXP_MAX
        };
        Self::assemble(negative, exponent, Self::FRAC_MASK)
    }

    fn minpos_signed(negative: bool) -> Self {
        if F::HAS_SUBNORMALS {
            Self::assemble(negative, 0, 1)
        } else {
            Self::assemble(negative, 1, 0)
        }
    }

    fn assemble(negative: bool, exponent: u64, fraction: u64) -> Self {
        Self::from_raw_bits(
            ((negative as u64) << (NBITS - 1)) | (exponent << Self::FBITS) | fraction,
        )
    }

    pub fn is_zero(&self) -> bool {
        let body = self.bits & !Self::SIGN_MASK;
        if F::HAS_SUBNORMALS {
            body == 0
        } else {
            // without subnormals the whole zero-exponent band is a zero
            // domain
            body >> Self::FBITS == 0
        }
    }

    pub fn is_inf(&self) -> bool {
        F::HAS_SUPERNORMALS
            && self.exponent_field() == Self::EXP_MAX
            && self.fraction_field() == 0
    }

    pub fn is_nan(&self) -> bool {
        F::HAS_SUPERNORMALS
            && self.exponent_field() == Self::EXP_MAX
            && self.fraction_field() != 0
    }

    pub fn is_subnormal(&self) -> bool {
        F::HAS_SUBNORMALS && self.exponent_field() == 0 && self.fraction_field() != 0
    }

    pub fn is_negative(&self) -> bool {
        Self::sign_of(self.bits)
    }

    fn triple(&self) -> BlockTriple {
        let sign = self.is_negative();
        if self.is_nan() {
            return BlockTriple::nan();
        }
        if self.is_inf() {
            return BlockTriple::inf(sign);
        }
        if self.is_zero() {
            return BlockTriple::zero(sign);
        }
        let exponent = self.exponent_field();
        let fraction = self.fraction_field();
        if exponent == 0 {
            // subnormal: normalize to a hidden leading one
            let lead = 63 - fraction.leading_zeros();
            let scale = Self::MIN_NORMAL_SCALE + lead as i32 - Self::FBITS as i32;
            return BlockTriple::from_parts(sign, scale, fraction as u128, lead);
        }
        BlockTriple::from_parts(
            sign,
            exponent as i32 - Self::BIAS,
            (1u128 << Self::FBITS) | fraction as u128,
            Self::FBITS as u32,
        )
    }

    fn overflowed(negative: bool) -> Self {
        if F::IS_SATURATING || !F::HAS_SUPERNORMALS {
            Self::maxpos_signed(negative)
        } else {
            Self::infinity(negative)
        }
    }

    fn from_triple(t: BlockTriple) -> Self {
        if t.is_nan() {
            return Self::qnan();
        }
        if t.is_inf() {
            return if F::HAS_SUPERNORMALS {
                Self::infinity(t.sign())
            } else {
                Self::maxpos_signed(t.sign())
            };
        }
        if t.is_zero() {
            return Self::assemble(t.sign(), 0, 0);
        }

        if t.scale() < Self::MIN_NORMAL_SCALE {
            if !F::HAS_SUBNORMALS {
                return Self::assemble(t.sign(), 0, 0);
            }
            // round directly into the subnormal fraction so the value is
            // rounded exactly once
            let cut = t.fbits() as i32 - Self::FBITS as i32
                + (Self::MIN_NORMAL_SCALE - t.scale());
            let fraction = if cut <= 0 {
                t.significant() << (-cut) as u32
            } else if cut > 127 {
                0
            } else {
                round_at(t.significant(), cut as u32, RoundingMode::NearestEven, false).0
            };
            if fraction >> Self::FBITS == 1 {
                // carried into the smallest normal
                return Self::assemble(t.sign(), 1, 0);
            }
            return Self::assemble(t.sign(), 0, fraction as u64);
        }

        let (sig, scale, _) = t.round(Self::FBITS as u32, RoundingMode::NearestEven);
        if scale > Self::MAX_SCALE {
            return Self::overflowed(t.sign());
        }
        let exponent = (scale + Self::BIAS) as u64;
        Self::assemble(t.sign(), exponent, sig as u64 & Self::FRAC_MASK)
    }

    /// Square root through the digit-recurrence path; NaN for negative
    /// input.
    pub fn sqrt(&self) -> Self {
        Self::from_triple(self.triple().sqrt())
    }
}

macro_rules! binary_op {
    ($op:ident, $fn:ident, $triple_fn:ident) => {
        impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> $op
            for Cfloat<NBITS, ES, BT, F>
        {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self {
                Self::from_triple(self.triple().$triple_fn(&rhs.triple()))
            }
        }
    };
}

binary_op!(Add, add, add);
binary_op!(Sub, sub, sub);
binary_op!(Mul, mul, mul);
binary_op!(Div, div, div);

impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> Neg
    for Cfloat<NBITS, ES, BT, F>
{
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_raw_bits(self.bits ^ Self::SIGN_MASK)
    }
}

macro_rules! assign_ops {
    ($($assign:ident :: $fn:ident => $op:tt),*) => {
        $(
            impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> $assign
                for Cfloat<NBITS, ES, BT, F>
            {
                fn $fn(&mut self, rhs: Self) {
                    *self = *self $op rhs;
                }
            }
        )*
    };
}

assign_ops!(AddAssign::add_assign => +, SubAssign::sub_assign => -, MulAssign::mul_assign => *, DivAssign::div_assign => /);

impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> PartialEq
    for Cfloat<NBITS, ES, BT, F>
{
    fn eq(&self, other: &Self) -> bool {
        if self.is_nan() || other.is_nan() {
            return false;
        }
        if self.is_zero() && other.is_zero() {
            return true;
        }
        self.bits == other.bits
    }
}

impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> PartialOrd
    for Cfloat<NBITS, ES, BT, F>
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        compare_triples(&self.triple(), &other.triple())
    }
}

impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> NumberSystem
    for Cfloat<NBITS, ES, BT, F>
{
    const NBITS: usize = NBITS;

    fn from_f64(x: f64) -> Self {
        Self::from_triple(BlockTriple::from_f64(x))
    }

    fn to_f64(&self) -> f64 {
        self.triple().to_f64()
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
        Self::from_raw_bits(bits as u64)
    }

    fn to_bits(&self) -> u128 {
        self.bits as u128
    }

    fn type_tag() -> String {
        format!(
            "cfloat<{},{},{},{},{},{}>",
            NBITS,
            ES,
            BT::NAME,
            F::HAS_SUBNORMALS as u8,
            F::HAS_SUPERNORMALS as u8,
            F::IS_SATURATING as u8
        )
    }

    fn specific_value(code: SpecificValue) -> Self {
        match code {
            SpecificValue::Zero => Self::zero(),
            SpecificValue::Minpos => Self::minpos_signed(false),
            SpecificValue::Maxpos => Self::maxpos_signed(false),
            SpecificValue::Minneg => Self::minpos_signed(true),
            SpecificValue::Maxneg => Self::maxpos_signed(true),
            SpecificValue::Infpos => Self::infinity(false),
            SpecificValue::Infneg => Self::infinity(true),
            SpecificValue::Qnan => Self::qnan(),
            SpecificValue::Snan => Self::snan(),
            SpecificValue::Nar => Self::qnan(),
        }
    }
}

impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> fmt::Display
    for Cfloat<NBITS, ES, BT, F>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> fmt::Debug
    for Cfloat<NBITS, ES, BT, F>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#x})", Self::type_tag(), self.bits)
    }
}

impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> fmt::LowerHex
    for Cfloat<NBITS, ES, BT, F>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.bits, f)
    }
}

impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor> FromStr
    for Cfloat<NBITS, ES, BT, F>
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
impl<const NBITS: usize, const ES: usize, BT: Limb, F: CfloatFlavor>
    Distribution<Cfloat<NBITS, ES, BT, F>> for Standard
{
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Cfloat<NBITS, ES, BT, F> {
        Cfloat::from_raw_bits(rng.gen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type F32 = Cfloat<32, 8, u32, Ieee>;
    type F16 = Cfloat<16, 5, u16, Ieee>;
    type F32Sat = Cfloat<32, 8, u32, IeeeSaturating>;
    type F32Ftz = Cfloat<32, 8, u32, NoSubnormals>;

    fn native(x: f32) -> u64 {
        x.to_bits() as u64
    }

    #[test]
    fn matches_native_f32_bit_patterns() {
        for x in [0.0f32, 1.0, -1.0, 0.5, 0.1, 3.14159265, 1e-40, 3.4e38, -2.5e-30] {
            assert_eq!(
                F32::from_f64(x as f64).bits(),
                native(x),
                "value {x}"
            );
        }
    }

    #[test]
    fn round_trips_native_f32_patterns() {
        for bits in [0u32, 0x3f80_0000, 0x0000_0001, 0x007f_ffff, 0x7f7f_ffff, 0x8000_0001] {
            let c = F32::from_raw_bits(bits as u64);
            assert_eq!((c.to_f64() as f32).to_bits(), bits);
        }
    }

    #[test]
    fn arithmetic_matches_native_f32() {
        let cases = [
            (0.1f32, 0.2f32),
            (1.0, 3.0),
            (1e30, 1e30),
            (1.5, -1.5),
            (1e-40, 1e-40),
            (7.25, 0.125),
        ];
        for (a, b) in cases {
            let (ca, cb) = (F32::from_f64(a as f64), F32::from_f64(b as f64));
            assert_eq!((ca + cb).bits(), native(a + b), "{a} + {b}");
            assert_eq!((ca - cb).bits(), native(a - b), "{a} - {b}");
            assert_eq!((ca * cb).bits(), native(a * b), "{a} * {b}");
            assert_eq!((ca / cb).bits(), native(a / b), "{a} / {b}");
        }
    }

    #[test]
    fn subnormal_results_match_native_f32() {
        let a = f32::from_bits(0x0080_0000); // smallest normal
        let b = 0.5f32;
        let (ca, cb) = (F32::from_f64(a as f64), F32::from_f64(b as f64));
        assert_eq!((ca * cb).bits(), native(a * b));
        assert!((ca * cb).is_subnormal());
    }

    #[test]
    fn overflow_policy_per_flavor() {
        let big = 3.0e38f64;
        let sum_ieee = F32::from_f64(big) + F32::from_f64(big);
        assert!(sum_ieee.is_inf());

        let sum_sat = F32Sat::from_f64(big) + F32Sat::from_f64(big);
        assert_eq!(sum_sat, F32Sat::specific_value(SpecificValue::Maxpos));
    }

    #[test]
    fn flush_to_zero_flavor_drops_subnormals() {
        let tiny = 1e-40f64; // subnormal in f32
        assert!(F32Ftz::from_f64(tiny).is_zero());
        assert!(!F32::from_f64(tiny).is_zero());
    }

    #[test]
    fn nan_propagates_and_compares_unordered() {
        let nan = F32::qnan();
        let one = F32::one();
        assert!((nan + one).is_nan());
        assert_ne!(nan, nan);
        assert_eq!(one.compare(&nan), NumCmp::Unordered);
        assert_eq!(
            one.checked_add(nan),
            Err(ArithmeticError::NanPropagation)
        );
    }

    #[test]
    fn signed_zeros_compare_equal() {
        let pz = F32::zero();
        let nz = -F32::zero();
        assert_eq!(pz, nz);
        assert_eq!(pz.compare(&nz), NumCmp::Equal);
    }

    #[test]
    fn division_by_zero_gives_signed_infinity() {
        let one = F32::one();
        assert!((one / F32::zero()).is_inf());
        assert!(((-one) / F32::zero()).is_negative());
        assert!((F32::zero() / F32::zero()).is_nan());
        assert_eq!(
            one.checked_div(F32::zero()),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn half_precision_decode() {
        // 1.0 in binary16
        let one = F16::from_raw_bits(0x3c00);
        assert_eq!(one.to_f64(), 1.0);
        assert_eq!(F16::from_f64(1.0).bits(), 0x3c00);
        // 65504 is the binary16 maxpos
        assert_eq!(F16::specific_value(SpecificValue::Maxpos).to_f64(), 65504.0);
    }

    #[test]
    fn limb_views_expose_the_pattern() {
        let c = F32::from_raw_bits(0x3f80_0000);
        assert_eq!(c.limb(0).to_word(), 0x3f80_0000);
        let h = F16::from_raw_bits(0x3c00);
        assert_eq!(h.limb(0).to_word(), 0x3c00);
    }
}
