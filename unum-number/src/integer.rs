use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{
    Add, AddAssign, BitAnd, BitOr, BitXor, Div, DivAssign, Mul, MulAssign, Neg, Not, Rem, Shl,
    ShlAssign, Shr, ShrAssign, Sub, SubAssign,
};
use core::str::FromStr;

use unum_blocks::{native, BlockBinary, Limb};

use crate::error::{ArithmeticError, ParseNumberError};
use crate::specific::{NumClass, NumCmp, SpecificValue};
use crate::traits::NumberSystem;

#[cfg(feature = "random")]
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

/// Number-domain marker of an [`Integer`].
pub trait IntegerKind: Copy + Default + 'static {
    /// Two's-complement interpretation of the top bit.
    const SIGNED: bool;
    /// Subtraction clamps at zero instead of wrapping.
    const CLAMP_AT_ZERO: bool;
    const NAME: &'static str;
}

/// Two's-complement signed integers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signed;

impl IntegerKind for Signed {
    const SIGNED: bool = true;
    const CLAMP_AT_ZERO: bool = false;
    const NAME: &'static str = "int";
}

/// Unsigned integers with modular wrap-around.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Whole;

impl IntegerKind for Whole {
    const SIGNED: bool = false;
    const CLAMP_AT_ZERO: bool = false;
    const NAME: &'static str = "whole";
}

/// Non-negative integers: subtraction below zero clamps to zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Natural;

impl IntegerKind for Natural {
    const SIGNED: bool = false;
    const CLAMP_AT_ZERO: bool = true;
    const NAME: &'static str = "natural";
}

/// Fixed-width integer over limb block storage.
///
/// `NBITS` is the encoded width, `LIMBS` the number of `BT` limbs backing
/// it (`LIMBS * BT::BITS >= NBITS`, compile-time checked). Arithmetic is
/// modular in `NBITS` bits; division is restoring and truncates toward
/// zero; shifts of `NBITS` or more zero the value.
#[derive(Clone, Copy, Hash)]
pub struct Integer<const NBITS: usize, const LIMBS: usize, BT: Limb = u64, K: IntegerKind = Signed>
{
    blocks: BlockBinary<BT, LIMBS>,
    _marker: PhantomData<K>,
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> PartialEq
    for Integer<NBITS, LIMBS, BT, K>
{
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Eq
    for Integer<NBITS, LIMBS, BT, K>
{
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Default
    for Integer<NBITS, LIMBS, BT, K>
{
    fn default() -> Self {
        Self::zero()
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind>
    Integer<NBITS, LIMBS, BT, K>
{
    const LAYOUT_OK: () = assert!(
        NBITS >= 2 && LIMBS as u32 * BT::BITS >= NBITS as u32,
        "limb storage narrower than the encoded width"
    );

    fn wrap(mut blocks: BlockBinary<BT, LIMBS>) -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::LAYOUT_OK;
        blocks.mask_to(NBITS as u32);
        Self {
            blocks,
            _marker: PhantomData,
        }
    }

    pub fn zero() -> Self {
        Self::wrap(BlockBinary::zero())
    }

    pub fn one() -> Self {
        Self::wrap(BlockBinary::from_word(1))
    }

    pub fn from_u64(value: u64) -> Self {
        Self::wrap(BlockBinary::from_word(value))
    }

    pub fn from_i64(value: i64) -> Self {
        if value < 0 {
            -Self::from_u64(value.unsigned_abs())
        } else {
            Self::from_u64(value as u64)
        }
    }

    /// Largest representable value of the kind.
    pub fn max_value() -> Self {
        let mut blocks = BlockBinary::ones();
        blocks.mask_to(NBITS as u32);
        if K::SIGNED {
            blocks.set_bit(NBITS as u32 - 1, false);
        }
        Self::wrap(blocks)
    }

    /// Smallest representable value of the kind.
    pub fn min_value() -> Self {
        if K::SIGNED {
            let mut blocks = BlockBinary::zero();
            blocks.set_bit(NBITS as u32 - 1, true);
            Self::wrap(blocks)
        } else {
            Self::zero()
        }
    }

    pub fn is_zero(&self) -> bool {
        self.blocks.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        K::SIGNED && self.blocks.bit(NBITS as u32 - 1)
    }

    pub fn blocks(&self) -> &BlockBinary<BT, LIMBS> {
        &self.blocks
    }

    fn magnitude(&self) -> BlockBinary<BT, LIMBS> {
        if self.is_negative() {
            let mut neg = self.blocks.wrapping_neg();
            neg.mask_to(NBITS as u32);
            neg
        } else {
            self.blocks
        }
    }

    pub fn abs(&self) -> Self {
        Self::wrap(self.magnitude())
    }

    /// Quotient and remainder, both truncated toward zero; the remainder
    /// carries the dividend's sign.
    pub fn div_rem(&self, rhs: &Self) -> (Self, Self) {
        if rhs.is_zero() {
            return (Self::zero(), *self);
        }
        let (q, r) = self.magnitude().div_rem(&rhs.magnitude());
        let mut quotient = Self::wrap(q);
        let mut remainder = Self::wrap(r);
        if self.is_negative() != rhs.is_negative() {
            quotient = -quotient;
        }
        if self.is_negative() {
            remainder = -remainder;
        }
        (quotient, remainder)
    }

    pub fn checked_rem(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(self.div_rem(&rhs).1)
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Add
    for Integer<NBITS, LIMBS, BT, K>
{
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::wrap(self.blocks.wrapping_add(&rhs.blocks))
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Sub
    for Integer<NBITS, LIMBS, BT, K>
{
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        if K::CLAMP_AT_ZERO && rhs > self {
            return Self::zero();
        }
        Self::wrap(self.blocks.wrapping_sub(&rhs.blocks))
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Mul
    for Integer<NBITS, LIMBS, BT, K>
{
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::wrap(self.blocks.wrapping_mul(&rhs.blocks))
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Div
    for Integer<NBITS, LIMBS, BT, K>
{
    type Output = Self;

    /// Division by zero resolves to the zero sentinel; use
    /// [`Integer::checked_div`] for the error.
    fn div(self, rhs: Self) -> Self {
        self.div_rem(&rhs).0
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Rem
    for Integer<NBITS, LIMBS, BT, K>
{
    type Output = Self;

    fn rem(self, rhs: Self) -> Self {
        self.div_rem(&rhs).1
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Neg
    for Integer<NBITS, LIMBS, BT, K>
{
    type Output = Self;

    fn neg(self) -> Self {
        if K::CLAMP_AT_ZERO {
            return Self::zero();
        }
        Self::wrap(self.blocks.wrapping_neg())
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Shl<usize>
    for Integer<NBITS, LIMBS, BT, K>
{
    type Output = Self;

    fn shl(self, shift: usize) -> Self {
        if shift >= NBITS {
            return Self::zero();
        }
        let mut blocks = self.blocks;
        blocks.shift_left(shift as u32);
        Self::wrap(blocks)
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Shr<usize>
    for Integer<NBITS, LIMBS, BT, K>
{
    type Output = Self;

    fn shr(self, shift: usize) -> Self {
        if shift >= NBITS {
            return Self::zero();
        }
        let mut blocks = self.blocks;
        if K::SIGNED {
            blocks.shift_right_arithmetic(shift as u32, NBITS as u32);
        } else {
            blocks.shift_right(shift as u32);
        }
        Self::wrap(blocks)
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> ShlAssign<usize>
    for Integer<NBITS, LIMBS, BT, K>
{
    fn shl_assign(&mut self, shift: usize) {
        *self = *self << shift;
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> ShrAssign<usize>
    for Integer<NBITS, LIMBS, BT, K>
{
    fn shr_assign(&mut self, shift: usize) {
        *self = *self >> shift;
    }
}

macro_rules! bitwise_op {
    ($op:ident, $fn:ident) => {
        impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> $op
            for Integer<NBITS, LIMBS, BT, K>
        {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self {
                Self::wrap(self.blocks.$fn(rhs.blocks))
            }
        }
    };
}

bitwise_op!(BitAnd, bitand);
bitwise_op!(BitOr, bitor);
bitwise_op!(BitXor, bitxor);

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Not
    for Integer<NBITS, LIMBS, BT, K>
{
    type Output = Self;

    fn not(self) -> Self {
        Self::wrap(!self.blocks)
    }
}

macro_rules! assign_ops {
    ($($assign:ident :: $fn:ident => $op:tt),*) => {
        $(
            impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> $assign
                for Integer<NBITS, LIMBS, BT, K>
            {
                fn $fn(&mut self, rhs: Self) {
                    *self = *self $op rhs;
                }
            }
        )*
    };
}

assign_ops!(AddAssign::add_assign => +, SubAssign::sub_assign => -, MulAssign::mul_assign => *, DivAssign::div_assign => /);

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> Ord
    for Integer<NBITS, LIMBS, BT, K>
{
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_negative(), other.is_negative()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            // equal signs: two's complement compares like the unsigned
            // pattern
            _ => self.blocks.cmp(&other.blocks),
        }
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> PartialOrd
    for Integer<NBITS, LIMBS, BT, K>
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> NumberSystem
    for Integer<NBITS, LIMBS, BT, K>
{
    const NBITS: usize = NBITS;

    /// Truncates toward zero; NaN converts to zero, out-of-range values
    /// saturate at the kind's extremes.
    fn from_f64(x: f64) -> Self {
        if x.is_nan() {
            return Self::zero();
        }
        if x.is_infinite() {
            return if x > 0.0 { Self::max_value() } else { Self::min_value() };
        }
        let (negative, scale, sig) = match native::f64_parts(x) {
            None => return Self::zero(),
            Some(parts) => parts,
        };
        if negative && !K::SIGNED {
            return Self::zero();
        }
        if scale < 0 {
            return Self::zero();
        }
        let headroom = if K::SIGNED { NBITS as i32 - 1 } else { NBITS as i32 };
        if scale >= headroom {
            return if negative { Self::min_value() } else { Self::max_value() };
        }
        let mut blocks = BlockBinary::from_u128(sig as u128);
        if scale >= 52 {
            blocks.shift_left(scale as u32 - 52);
        } else {
            blocks.shift_right(52 - scale as u32);
        }
        let value = Self::wrap(blocks);
        if negative {
            -value
        } else {
            value
        }
    }

    fn to_f64(&self) -> f64 {
        let magnitude = self.magnitude();
        let top = match magnitude.msb() {
            None => return 0.0,
            Some(top) => top,
        };
        let width = (top + 1).min(64);
        let window = magnitude.extract_u128(top + 1 - width, width);
        let sticky = magnitude.any_below(top + 1 - width);
        native::f64_from_parts(self.is_negative(), top as i32, window, sticky)
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

    // add/sub/mul wrap modularly, which is the documented result, not a
    // failure
    fn checked_add(self, rhs: Self) -> Result<Self, ArithmeticError> {
        Ok(self + rhs)
    }

    fn checked_sub(self, rhs: Self) -> Result<Self, ArithmeticError> {
        Ok(self - rhs)
    }

    fn checked_mul(self, rhs: Self) -> Result<Self, ArithmeticError> {
        Ok(self * rhs)
    }

    fn checked_div(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(self.div_rem(&rhs).0)
    }

    fn from_bits(bits: u128) -> Self {
        Self::wrap(BlockBinary::from_u128(bits))
    }

    fn to_bits(&self) -> u128 {
        self.blocks.to_u128()
    }

    fn type_tag() -> String {
        format!("integer<{},{},{}>", NBITS, BT::NAME, K::NAME)
    }

    fn specific_value(code: SpecificValue) -> Self {
        match code {
            SpecificValue::Zero | SpecificValue::Qnan | SpecificValue::Snan | SpecificValue::Nar => {
                Self::zero()
            }
            SpecificValue::Minpos => Self::one(),
            SpecificValue::Maxpos | SpecificValue::Infpos => Self::max_value(),
            SpecificValue::Minneg => {
                if K::SIGNED {
                    -Self::one()
                } else {
                    Self::zero()
                }
            }
            SpecificValue::Maxneg | SpecificValue::Infneg => Self::min_value(),
        }
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> fmt::Display
    for Integer<NBITS, LIMBS, BT, K>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut digits = Vec::new();
        let mut magnitude = self.magnitude();
        let ten = BlockBinary::from_word(10);
        while !magnitude.is_zero() {
            let (q, r) = magnitude.div_rem(&ten);
            digits.push(b'0' + r.to_word() as u8);
            magnitude = q;
        }
        if self.is_negative() {
            write!(f, "-")?;
        }
        for d in digits.iter().rev() {
            write!(f, "{}", *d as char)?;
        }
        Ok(())
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> fmt::Debug
    for Integer<NBITS, LIMBS, BT, K>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", Self::type_tag(), self)
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> fmt::LowerHex
    for Integer<NBITS, LIMBS, BT, K>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.blocks, f)
    }
}

impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind> FromStr
    for Integer<NBITS, LIMBS, BT, K>
{
    type Err = ParseNumberError;

    /// Decimal parse; the accumulated value wraps modularly at `NBITS`
    /// like every other integer operation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseNumberError::Empty);
        }
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if body.is_empty() {
            return Err(ParseNumberError::Malformed);
        }
        let ten = Self::from_u64(10);
        let mut acc = Self::zero();
        for c in body.chars() {
            let digit = c.to_digit(10).ok_or(ParseNumberError::InvalidDigit(c))?;
            acc = acc * ten + Self::from_u64(digit as u64);
        }
        if negative {
            if !K::SIGNED {
                return Err(ParseNumberError::Malformed);
            }
            acc = -acc;
        }
        Ok(acc)
    }
}

#[cfg(feature = "random")]
impl<const NBITS: usize, const LIMBS: usize, BT: Limb, K: IntegerKind>
    Distribution<Integer<NBITS, LIMBS, BT, K>> for Standard
{
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Integer<NBITS, LIMBS, BT, K> {
        let mut blocks = BlockBinary::zero();
        for i in 0..LIMBS {
            blocks.set_limb(i, BT::from_word(rng.gen()));
        }
        Integer::wrap(blocks)
    }
}
