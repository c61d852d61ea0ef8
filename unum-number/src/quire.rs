use core::fmt;

use unum_blocks::BlockBinary;

use crate::posit::Posit;

/// Wide two's-complement fixed-point accumulator sized so the product of
/// any two `Posit<NBITS, ES>` values lands exactly, with `CAPACITY` extra
/// carry bits for the accumulation count.
///
/// The radix point sits `2 * (NBITS-2) * 2^ES` bits above the accumulator's
/// least significant bit, the exact weight of `minpos * minpos`. Sums stay
/// exact until [`Quire::to_posit`] rounds once. A NaR operand poisons the
/// accumulator until [`Quire::clear`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Quire<const NBITS: usize, const ES: usize, const CAPACITY: usize = 30> {
    acc: BlockBinary<u64, 32>,
    nar: bool,
}

impl<const NBITS: usize, const ES: usize, const CAPACITY: usize> Default
    for Quire<NBITS, ES, CAPACITY>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const NBITS: usize, const ES: usize, const CAPACITY: usize> Quire<NBITS, ES, CAPACITY> {
    /// Bits below the radix point: the scale of `minpos * minpos`.
    const FRAC_BITS: u32 = ((NBITS - 2) as u32) << (ES + 1);

    const LAYOUT_OK: () = assert!(
        2 * ((NBITS - 2) << (ES + 1)) + CAPACITY + 1 <= 2048,
        "quire exceeds its 2048-bit storage"
    );

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::LAYOUT_OK;
        Self {
            acc: BlockBinary::zero(),
            nar: false,
        }
    }

    pub fn clear(&mut self) {
        self.acc = BlockBinary::zero();
        self.nar = false;
    }

    pub fn is_zero(&self) -> bool {
        !self.nar && self.acc.is_zero()
    }

    pub fn is_nar(&self) -> bool {
        self.nar
    }

    fn accumulate_product(&mut self, a: &Posit<NBITS, ES>, b: &Posit<NBITS, ES>, subtract: bool) {
        if a.is_nar() || b.is_nar() {
            self.nar = true;
            return;
        }
        if self.nar || a.is_zero() || b.is_zero() {
            return;
        }
        let ta = a.decoded();
        let tb = b.decoded();
        let sig = ta.significant() * tb.significant();
        let fbits = (ta.fbits() + tb.fbits()) as i32;
        let scale = ta.scale() + tb.scale();
        let offset = (Self::FRAC_BITS as i32 + scale - fbits) as u32;
        if (ta.sign() != tb.sign()) != subtract {
            self.acc.sub_shifted_u128(sig, offset);
        } else {
            self.acc.add_shifted_u128(sig, offset);
        }
    }

    fn accumulate_value(&mut self, p: &Posit<NBITS, ES>, subtract: bool) {
        if p.is_nar() {
            self.nar = true;
            return;
        }
        if self.nar || p.is_zero() {
            return;
        }
        let t = p.decoded();
        let offset = (Self::FRAC_BITS as i32 + t.scale() - t.fbits() as i32) as u32;
        if t.sign() != subtract {
            self.acc.sub_shifted_u128(t.significant(), offset);
        } else {
            self.acc.add_shifted_u128(t.significant(), offset);
        }
    }

    /// The external accumulate hook: `quire += a * b` exactly, or `-=`
    /// when `subtract` is set.
    pub fn accumulate(&mut self, a: &Posit<NBITS, ES>, b: &Posit<NBITS, ES>, subtract: bool) {
        self.accumulate_product(a, b, subtract);
    }

    /// `quire += a * b`, exactly.
    pub fn add_product(&mut self, a: &Posit<NBITS, ES>, b: &Posit<NBITS, ES>) {
        self.accumulate_product(a, b, false);
    }

    /// `quire -= a * b`, exactly.
    pub fn sub_product(&mut self, a: &Posit<NBITS, ES>, b: &Posit<NBITS, ES>) {
        self.accumulate_product(a, b, true);
    }

    /// `quire += p`, exactly.
    pub fn add_value(&mut self, p: &Posit<NBITS, ES>) {
        self.accumulate_value(p, false);
    }

    /// `quire -= p`, exactly.
    pub fn sub_value(&mut self, p: &Posit<NBITS, ES>) {
        self.accumulate_value(p, true);
    }

    /// Rounds the accumulator back to a posit: the single rounding of a
    /// fused operation. Saturates at maxpos/minpos like every posit
    /// conversion.
    pub fn to_posit(&self) -> Posit<NBITS, ES> {
        if self.nar {
            return Posit::nar();
        }
        if self.acc.is_zero() {
            return Posit::zero();
        }
        let negative = self.acc.bit(BlockBinary::<u64, 32>::BITS - 1);
        let magnitude = if negative {
            self.acc.wrapping_neg()
        } else {
            self.acc
        };
        let top = magnitude.msb().expect("nonzero accumulator has a top bit");
        let scale = top as i32 - Self::FRAC_BITS as i32;
        let width = (top + 1).min(64);
        let sig = magnitude.extract_u128(top + 1 - width, width);
        let sticky = magnitude.any_below(top + 1 - width);
        Posit::encode_rounded(negative, scale, sig, width - 1, sticky)
    }
}

impl<const NBITS: usize, const ES: usize, const CAPACITY: usize> fmt::Debug
    for Quire<NBITS, ES, CAPACITY>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nar {
            return write!(f, "quire<{},{},{}>(nar)", NBITS, ES, CAPACITY);
        }
        write!(f, "quire<{},{},{}>({:#x})", NBITS, ES, CAPACITY, self.acc)
    }
}

/// Fused dot product: one rounding regardless of the operand count. Ragged
/// inputs pair up to the shorter length.
pub fn fdp<const NBITS: usize, const ES: usize>(
    x: &[Posit<NBITS, ES>],
    y: &[Posit<NBITS, ES>],
) -> Posit<NBITS, ES> {
    let mut quire = Quire::<NBITS, ES>::new();
    for (a, b) in x.iter().zip(y.iter()) {
        quire.add_product(a, b);
    }
    quire.to_posit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specific::SpecificValue;
    use crate::traits::NumberSystem;
    use crate::Posit32;

    #[test]
    fn catastrophic_cancellation_is_fused_away() {
        let x = [
            Posit32::from_f64(1e20),
            Posit32::from_f64(1.0),
            Posit32::from_f64(-1e20),
        ];
        let y = [
            Posit32::from_f64(1.0),
            Posit32::from_f64(1.0),
            Posit32::from_f64(1.0),
        ];
        assert_eq!(fdp(&x, &y).to_f64(), 1.0);
    }

    #[test]
    fn exact_products_accumulate_exactly() {
        let mut q = Quire::<32, 2>::new();
        let x = Posit32::from_f64(1.5);
        q.accumulate(&x, &x, false);
        q.add_value(&Posit32::one());
        assert_eq!(q.to_posit().to_f64(), 3.25);

        q.sub_value(&Posit32::one());
        q.accumulate(&x, &x, true);
        assert!(q.is_zero());
        assert!(q.to_posit().is_zero());
    }

    #[test]
    fn negative_totals_round_back_with_sign() {
        let mut q = Quire::<32, 2>::new();
        q.sub_value(&Posit32::from_f64(2.5));
        assert_eq!(q.to_posit().to_f64(), -2.5);
    }

    #[test]
    fn minpos_squared_saturates_on_round_back() {
        let minpos = Posit32::minpos();
        let mut q = Quire::<32, 2>::new();
        q.add_product(&minpos, &minpos);
        // the quire holds the exact product; the posit rounding saturates
        assert!(!q.is_zero());
        assert_eq!(q.to_posit(), minpos);
    }

    #[test]
    fn nar_poisons_the_accumulator() {
        let mut q = Quire::<32, 2>::new();
        q.add_value(&Posit32::specific_value(SpecificValue::Nar));
        q.add_value(&Posit32::one());
        assert!(q.to_posit().is_nar());
        q.clear();
        assert!(q.to_posit().is_zero());
    }

    #[test]
    fn long_sums_round_once() {
        // 0.1 is inexact in posit<32,2>; summing its quire image 10 times
        // and rounding once differs from accumulating rounding error
        let tenth = Posit32::from_f64(0.1);
        let xs = [tenth; 10];
        let ones = [Posit32::one(); 10];
        let fused = fdp(&xs, &ones);
        let mut q = Quire::<32, 2>::new();
        for x in &xs {
            q.add_value(x);
        }
        assert_eq!(q.to_posit(), fused);
    }
}
