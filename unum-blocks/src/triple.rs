use core::fmt;

use crate::native;
use crate::round::{round_at, RoundingMode};

/// Operation a [`BlockTriple`] was produced for. The tag fixes the radix
/// point discipline: representation keeps the source fraction width, the
/// arithmetic tags widen to the kernel's working precision.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripleOp {
    #[default]
    Representation,
    Add,
    Mul,
    Div,
    Sqrt,
}

/// Working fraction width of the add, divide and square-root paths.
///
/// Any encoding handled by the scalar systems carries at most 62 fraction
/// bits, so 66 bits guarantee that an alignment or remainder sticky folded
/// into the last working bit sits strictly below the guard bit of every
/// destination rounding.
const WORK_FBITS: u32 = 66;

/// Largest fraction width a source encoding may present.
const MAX_SRC_FBITS: u32 = 62;

/// Normalized arithmetic intermediate: sign, unbiased scale of the leading
/// significand bit, and a significand with the hidden one at position
/// `fbits`, so the represented value is `sig * 2^(scale - fbits)`.
///
/// Every number system normalizes into this form, performs the operation at
/// a width sufficient for the exact (or faithfully sticky-marked) result,
/// and converts back with a single rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTriple {
    sign: bool,
    scale: i32,
    sig: u128,
    fbits: u32,
    op: TripleOp,
    is_zero: bool,
    is_inf: bool,
    is_nan: bool,
}

impl BlockTriple {
    /// Signed zero.
    pub fn zero(sign: bool) -> Self {
        Self {
            sign,
            scale: 0,
            sig: 0,
            fbits: 0,
            op: TripleOp::Representation,
            is_zero: true,
            is_inf: false,
            is_nan: false,
        }
    }

    /// Signed infinity.
    pub fn inf(sign: bool) -> Self {
        Self {
            is_inf: true,
            is_zero: false,
            ..Self::zero(sign)
        }
    }

    /// Not-a-number / not-a-real.
    pub fn nan() -> Self {
        Self {
            is_nan: true,
            is_zero: false,
            ..Self::zero(false)
        }
    }

    /// Builds a finite nonzero triple. The significand must be normalized:
    /// exactly one leading bit at position `fbits`.
    pub fn from_parts(sign: bool, scale: i32, sig: u128, fbits: u32) -> Self {
        debug_assert!(sig >> fbits == 1, "significand not normalized");
        Self {
            sign,
            scale,
            sig,
            fbits,
            op: TripleOp::Representation,
            is_zero: false,
            is_inf: false,
            is_nan: false,
        }
    }

    /// Decomposes a native double.
    pub fn from_f64(x: f64) -> Self {
        if x.is_nan() {
            return Self::nan();
        }
        if x.is_infinite() {
            return Self::inf(x.is_sign_negative());
        }
        match native::f64_parts(x) {
            None => Self::zero(x.is_sign_negative()),
            Some((negative, scale, sig)) => {
                Self::from_parts(negative, scale, sig as u128, native::F64_FBITS)
            }
        }
    }

    /// Rounds to a native double.
    pub fn to_f64(&self) -> f64 {
        if self.is_nan {
            return f64::NAN;
        }
        if self.is_inf {
            return if self.sign { f64::NEG_INFINITY } else { f64::INFINITY };
        }
        if self.is_zero {
            return if self.sign { -0.0 } else { 0.0 };
        }
        native::f64_from_parts(self.sign, self.scale, self.sig, false)
    }

    pub fn sign(&self) -> bool {
        self.sign
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Significand with the hidden bit at position [`BlockTriple::fbits`].
    pub fn significant(&self) -> u128 {
        self.sig
    }

    pub fn fbits(&self) -> u32 {
        self.fbits
    }

    pub fn op(&self) -> TripleOp {
        self.op
    }

    pub fn is_zero(&self) -> bool {
        self.is_zero
    }

    pub fn is_inf(&self) -> bool {
        self.is_inf
    }

    pub fn is_nan(&self) -> bool {
        self.is_nan
    }

    pub fn negate(mut self) -> Self {
        if !self.is_nan {
            self.sign = !self.sign;
        }
        self
    }

    /// Addition at the working radix: the smaller-scale operand is right
    /// shifted and the discarded bits accumulate into a sticky folded below
    /// every destination guard position.
    pub fn add(&self, rhs: &Self) -> Self {
        if self.is_nan || rhs.is_nan {
            return Self::nan();
        }
        if self.is_inf || rhs.is_inf {
            if self.is_inf && rhs.is_inf && self.sign != rhs.sign {
                return Self::nan();
            }
            let sign = if self.is_inf { self.sign } else { rhs.sign };
            return Self::inf(sign);
        }
        if self.is_zero && rhs.is_zero {
            return Self::zero(self.sign && rhs.sign);
        }
        if self.is_zero {
            let mut out = *rhs;
            out.op = TripleOp::Add;
            return out;
        }
        if rhs.is_zero {
            let mut out = *self;
            out.op = TripleOp::Add;
            return out;
        }

        debug_assert!(self.fbits <= MAX_SRC_FBITS + 4 && rhs.fbits <= MAX_SRC_FBITS + 4);
        let widen = |t: &Self| t.sig << (WORK_FBITS - t.fbits.min(WORK_FBITS));
        let (big, small) = if (self.scale, self.sig << (WORK_FBITS - self.fbits.min(WORK_FBITS)))
            >= (rhs.scale, rhs.sig << (WORK_FBITS - rhs.fbits.min(WORK_FBITS)))
        {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let xsig = widen(big);
        let mut ysig = widen(small);
        let shift = (big.scale - small.scale) as u32;
        if shift >= WORK_FBITS + 2 {
            ysig = if ysig != 0 { 1 } else { 0 };
        } else if shift > 0 {
            // bit 0 of the aligned operand is reserved as the sticky; a real
            // significand bit landing there is folded in with the lost bits
            let lost = ysig & ((1u128 << shift) - 1) != 0;
            ysig >>= shift;
            let sticky = lost || ysig & 1 == 1;
            ysig = (ysig & !1) | sticky as u128;
        }

        let (sum, sign) = if big.sign == small.sign {
            (xsig + ysig, big.sign)
        } else if xsig == ysig {
            return Self::zero(false);
        } else {
            (xsig - ysig, big.sign)
        };
        let lead = 127 - sum.leading_zeros();
        Self {
            sign,
            scale: big.scale + lead as i32 - WORK_FBITS as i32,
            sig: sum,
            fbits: lead,
            op: TripleOp::Add,
            is_zero: false,
            is_inf: false,
            is_nan: false,
        }
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.negate())
    }

    /// Multiplication: the significand product is exact, no sticky.
    pub fn mul(&self, rhs: &Self) -> Self {
        if self.is_nan || rhs.is_nan {
            return Self::nan();
        }
        let sign = self.sign != rhs.sign;
        if self.is_inf || rhs.is_inf {
            if self.is_zero || rhs.is_zero {
                return Self::nan();
            }
            return Self::inf(sign);
        }
        if self.is_zero || rhs.is_zero {
            return Self::zero(sign);
        }
        debug_assert!(self.fbits + rhs.fbits + 2 <= 127);
        let product = self.sig * rhs.sig;
        let lead = 127 - product.leading_zeros();
        Self {
            sign,
            scale: self.scale + rhs.scale + lead as i32 - (self.fbits + rhs.fbits) as i32,
            sig: product,
            fbits: lead,
            op: TripleOp::Mul,
            is_zero: false,
            is_inf: false,
            is_nan: false,
        }
    }

    /// Division by restoring long division of the significands; a nonzero
    /// remainder folds into the sticky bit.
    pub fn div(&self, rhs: &Self) -> Self {
        if self.is_nan || rhs.is_nan {
            return Self::nan();
        }
        let sign = self.sign != rhs.sign;
        if self.is_inf {
            if rhs.is_inf {
                return Self::nan();
            }
            return Self::inf(sign);
        }
        if rhs.is_inf {
            return Self::zero(sign);
        }
        if rhs.is_zero {
            if self.is_zero {
                return Self::nan();
            }
            return Self::inf(sign);
        }
        if self.is_zero {
            return Self::zero(sign);
        }

        // develop quotient bits down to the working precision regardless of
        // the operand fraction widths
        let k = (WORK_FBITS as i32 + rhs.fbits as i32 - self.fbits as i32).max(1) as u32;
        let total = self.fbits + 1 + k;
        let mut rem: u128 = 0;
        let mut quotient: u128 = 0;
        for i in (0..total).rev() {
            rem <<= 1;
            if i >= k {
                rem |= (self.sig >> (i - k)) & 1;
            }
            quotient <<= 1;
            if rem >= rhs.sig {
                rem -= rhs.sig;
                quotient |= 1;
            }
        }
        if rem != 0 {
            quotient |= 1;
        }
        let lead = 127 - quotient.leading_zeros();
        Self {
            sign,
            scale: self.scale - rhs.scale - self.fbits as i32 + rhs.fbits as i32 - k as i32
                + lead as i32,
            sig: quotient,
            fbits: lead,
            op: TripleOp::Div,
            is_zero: false,
            is_inf: false,
            is_nan: false,
        }
    }

    /// Square root by the digit recurrence, two radicand bits per result
    /// bit; a nonzero remainder folds into the sticky bit.
    pub fn sqrt(&self) -> Self {
        if self.is_nan {
            return Self::nan();
        }
        if self.is_zero {
            return Self::zero(self.sign);
        }
        if self.sign {
            return Self::nan();
        }
        if self.is_inf {
            return Self::inf(false);
        }

        let mut sig = self.sig;
        let mut fbits = self.fbits;
        let mut exp = self.scale - self.fbits as i32;
        if exp % 2 != 0 {
            sig <<= 1;
            fbits += 1;
            exp -= 1;
        }
        let total = fbits + 1;
        let width = (total + 1) & !1;
        let result_bits = WORK_FBITS + 1;
        let mut rem: u128 = 0;
        let mut root: u128 = 0;
        for step in 0..result_bits {
            let pair = if 2 * step < width {
                let top = width - 2 * step;
                let hi = if top >= 1 && top - 1 < total {
                    (sig >> (top - 1)) & 1
                } else {
                    0
                };
                let lo = if top >= 2 && top - 2 < total {
                    (sig >> (top - 2)) & 1
                } else {
                    0
                };
                (hi << 1) | lo
            } else {
                0
            };
            rem = (rem << 2) | pair;
            let trial = (root << 2) | 1;
            root <<= 1;
            if rem >= trial {
                rem -= trial;
                root |= 1;
            }
        }
        if rem != 0 {
            root |= 1;
        }
        let lead = 127 - root.leading_zeros();
        Self {
            sign: false,
            scale: exp / 2 + (width / 2) as i32 - result_bits as i32 + lead as i32,
            sig: root,
            fbits: lead,
            op: TripleOp::Sqrt,
            is_zero: false,
            is_inf: false,
            is_nan: false,
        }
    }

    /// Cuts the significand down to `dest_fbits` fraction bits.
    ///
    /// Returns the rounded significand with its hidden bit at `dest_fbits`,
    /// the adjusted scale, and the inexact flag. A rounding carry is folded
    /// into the scale.
    pub fn round(&self, dest_fbits: u32, mode: RoundingMode) -> (u128, i32, bool) {
        debug_assert!(!self.is_zero && !self.is_inf && !self.is_nan);
        let mut scale = self.scale;
        if self.fbits > dest_fbits {
            let cut = self.fbits - dest_fbits;
            let (mut sig, inexact) = round_at(self.sig, cut, mode, false);
            if sig >> dest_fbits > 1 {
                sig >>= 1;
                scale += 1;
            }
            (sig, scale, inexact)
        } else {
            (self.sig << (dest_fbits - self.fbits), scale, false)
        }
    }
}

impl fmt::Display for BlockTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nan {
            return write!(f, "nan");
        }
        if self.is_inf {
            return write!(f, "{}inf", if self.sign { "-" } else { "+" });
        }
        write!(
            f,
            "({}, 2^{}, {:#x}/2^{})",
            if self.sign { "-" } else { "+" },
            self.scale,
            self.sig,
            self.fbits
        )
    }
}
