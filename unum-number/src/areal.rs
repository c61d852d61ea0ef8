use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use unum_blocks::{round_at, BlockTriple, Limb, RoundingMode};

use crate::error::ArithmeticError;
use crate::specific::{NumClass, NumCmp, SpecificValue};
use crate::traits::{compare_triples, NumberSystem};

#[cfg(feature = "random")]
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

/// Faithful real: a cfloat-shaped value whose fraction carries the
/// uncertainty bit in its least significant position.
///
/// With the ubit clear the encoding is the exact value; with the ubit set
/// it is the open interval between this value and its successor on the same
/// sign side. Conversions and arithmetic truncate the magnitude and raise
/// the ubit whenever bits were discarded or an operand was already an
/// interval, so an exact result is always marked exact.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Areal<const NBITS: usize, const ES: usize, BT: Limb = u32> {
    bits: u64,
    _marker: PhantomData<BT>,
}

impl<const NBITS: usize, const ES: usize, BT: Limb> Default for Areal<NBITS, ES, BT> {
    fn default() -> Self {
        Self::from_raw_bits(0)
    }
}

impl<const NBITS: usize, const ES: usize, BT: Limb> Areal<NBITS, ES, BT> {
    const LAYOUT_OK: () = assert!(
        NBITS <= 64 && ES >= 1 && ES <= 20 && NBITS >= ES + 3,
        "unsupported areal configuration"
    );

    const MASK: u64 = if NBITS == 64 {
        u64::MAX
    } else {
        (1u64 << NBITS) - 1
    };
    const SIGN_MASK: u64 = 1u64 << (NBITS - 1);
    /// Fraction field width, uncertainty bit included.
    const FIELD_BITS: usize = NBITS - 1 - ES;
    /// Value fraction width: the field above the ubit.
    pub const VBITS: usize = Self::FIELD_BITS - 1;
    const VFRAC_MASK: u64 = (1u64 << Self::VBITS) - 1;
    const EXP_MAX: u64 = (1u64 << ES) - 1;
    const BIAS: i32 = (1i32 << (ES - 1)) - 1;
    const MIN_NORMAL_SCALE: i32 = 1 - Self::BIAS;
    const MAX_SCALE: i32 = Self::EXP_MAX as i32 - 1 - Self::BIAS;

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

    /// The uncertainty bit: set when the encoding is an open interval
    /// rather than an exact point.
    pub fn ubit(&self) -> bool {
        self.bits & 1 == 1
    }

    fn exponent_field(&self) -> u64 {
        (self.bits >> Self::FIELD_BITS) & Self::EXP_MAX
    }

    fn vfraction(&self) -> u64 {
        (self.bits >> 1) & Self::VFRAC_MASK
    }

    fn assemble(negative: bool, exponent: u64, vfraction: u64, ubit: bool) -> Self {
        Self::from_raw_bits(
            ((negative as u64) << (NBITS - 1))
                | (exponent << Self::FIELD_BITS)
                | (vfraction << 1)
                | ubit as u64,
        )
    }

    pub fn zero() -> Self {
        Self::from_raw_bits(0)
    }

    pub fn one() -> Self {
        Self::assemble(false, Self::BIAS as u64, 0, false)
    }

    pub fn infinity(negative: bool) -> Self {
        Self::assemble(negative, Self::EXP_MAX, 0, false)
    }

    pub fn qnan() -> Self {
        Self::assemble(false, Self::EXP_MAX, 1u64 << (Self::VBITS - 1), false)
    }

    pub fn snan() -> Self {
        Self::assemble(false, Self::EXP_MAX, 1, false)
    }

    fn maxpos_signed(negative: bool) -> Self {
        Self::assemble(negative, Self::EXP_MAX - 1, Self::VFRAC_MASK, false)
    }

    fn minpos_signed(negative: bool) -> Self {
        Self::assemble(negative, 0, 1, false)
    }

    pub fn is_negative(&self) -> bool {
        self.bits & Self::SIGN_MASK != 0
    }

    pub fn is_zero(&self) -> bool {
        self.bits & !Self::SIGN_MASK == 0
    }

    pub fn is_inf(&self) -> bool {
        self.exponent_field() == Self::EXP_MAX && self.vfraction() == 0 && !self.ubit()
    }

    pub fn is_nan(&self) -> bool {
        self.exponent_field() == Self::EXP_MAX && (self.vfraction() != 0 || self.ubit())
    }

    pub fn is_subnormal(&self) -> bool {
        self.exponent_field() == 0 && self.vfraction() != 0
    }

    /// Exact endpoint of the encoding, the ubit set aside.
    fn triple(&self) -> BlockTriple {
        let sign = self.is_negative();
        if self.is_nan() {
            return BlockTriple::nan();
        }
        if self.is_inf() {
            return BlockTriple::inf(sign);
        }
        let exponent = self.exponent_field();
        let fraction = self.vfraction();
        if exponent == 0 {
            if fraction == 0 {
                return BlockTriple::zero(sign);
            }
            let lead = 63 - fraction.leading_zeros();
            let scale = Self::MIN_NORMAL_SCALE + lead as i32 - Self::VBITS as i32;
            return BlockTriple::from_parts(sign, scale, fraction as u128, lead);
        }
        BlockTriple::from_parts(
            sign,
            exponent as i32 - Self::BIAS,
            (1u128 << Self::VBITS) | fraction as u128,
            Self::VBITS as u32,
        )
    }

    /// Truncates a triple into the encoding; any discarded bit, or a carry
    /// of uncertainty from the operands, raises the ubit.
    fn from_triple(t: BlockTriple, operand_ubit: bool) -> Self {
        if t.is_nan() {
            return Self::qnan();
        }
        if t.is_inf() {
            return Self::infinity(t.sign());
        }
        if t.is_zero() {
            return Self::assemble(t.sign(), 0, 0, operand_ubit);
        }

        if t.scale() > Self::MAX_SCALE {
            // truncation lands on the (maxpos, inf) interval
            return Self::assemble(t.sign(), Self::EXP_MAX - 1, Self::VFRAC_MASK, true);
        }
        if t.scale() < Self::MIN_NORMAL_SCALE {
            let cut =
                t.fbits() as i32 - Self::VBITS as i32 + (Self::MIN_NORMAL_SCALE - t.scale());
            let (fraction, inexact) = if cut <= 0 {
                (t.significant() << (-cut) as u32, false)
            } else if cut > 127 {
                (0, true)
            } else {
                round_at(t.significant(), cut as u32, RoundingMode::TowardZero, false)
            };
            return Self::assemble(
                t.sign(),
                0,
                fraction as u64,
                inexact || operand_ubit,
            );
        }

        let (sig, scale, inexact) = t.round(Self::VBITS as u32, RoundingMode::TowardZero);
        let exponent = (scale + Self::BIAS) as u64;
        Self::assemble(
            t.sign(),
            exponent,
            sig as u64 & Self::VFRAC_MASK,
            inexact || operand_ubit,
        )
    }

}

macro_rules! binary_op {
    ($op:ident, $fn:ident, $triple_fn:ident) => {
        impl<const NBITS: usize, const ES: usize, BT: Limb> $op for Areal<NBITS, ES, BT> {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self {
                let carry = self.ubit() || rhs.ubit();
                Self::from_triple(self.triple().$triple_fn(&rhs.triple()), carry)
            }
        }
    };
}

binary_op!(Add, add, add);
binary_op!(Sub, sub, sub);
binary_op!(Mul, mul, mul);
binary_op!(Div, div, div);

impl<const NBITS: usize, const ES: usize, BT: Limb> Neg for Areal<NBITS, ES, BT> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_raw_bits(self.bits ^ Self::SIGN_MASK)
    }
}

macro_rules! assign_ops {
    ($($assign:ident :: $fn:ident => $op:tt),*) => {
        $(
            impl<const NBITS: usize, const ES: usize, BT: Limb> $assign for Areal<NBITS, ES, BT> {
                fn $fn(&mut self, rhs: Self) {
                    *self = *self $op rhs;
                }
            }
        )*
    };
}

assign_ops!(AddAssign::add_assign => +, SubAssign::sub_assign => -, MulAssign::mul_assign => *, DivAssign::div_assign => /);

impl<const NBITS: usize, const ES: usize, BT: Limb> PartialOrd for Areal<NBITS, ES, BT> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        compare_triples(&self.triple(), &other.triple())
    }
}

impl<const NBITS: usize, const ES: usize, BT: Limb> NumberSystem for Areal<NBITS, ES, BT> {
    const NBITS: usize = NBITS;

    fn from_f64(x: f64) -> Self {
        Self::from_triple(BlockTriple::from_f64(x), false)
    }

    /// The exact endpoint; an interval reads as its closed lower bound in
    /// magnitude.
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
        format!("areal<{},{},{}>", NBITS, ES, BT::NAME)
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
            SpecificValue::Qnan | SpecificValue::Nar => Self::qnan(),
            SpecificValue::Snan => Self::snan(),
        }
    }
}

impl<const NBITS: usize, const ES: usize, BT: Limb> fmt::Display for Areal<NBITS, ES, BT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())?;
        if self.ubit() {
            // open interval marker
            write!(f, "+")?;
        }
        Ok(())
    }
}

impl<const NBITS: usize, const ES: usize, BT: Limb> fmt::Debug for Areal<NBITS, ES, BT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#x})", Self::type_tag(), self.bits)
    }
}

#[cfg(feature = "random")]
impl<const NBITS: usize, const ES: usize, BT: Limb> Distribution<Areal<NBITS, ES, BT>>
    for Standard
{
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Areal<NBITS, ES, BT> {
        Areal::from_raw_bits(rng.gen())
    }
}
