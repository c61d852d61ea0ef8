//! Algebraic properties checked over sampled encoding spaces.

use quickcheck_macros::quickcheck;

use unum_number::{
    expansion, Cfloat, DoubleDouble, Fixpnt, Ieee, NumberSystem, Posit, Saturating,
};

type Posit16 = Posit<16, 1>;
type F16 = Cfloat<16, 5, u16, Ieee>;
type Q32 = Fixpnt<32, 16, Saturating, u32>;

#[quickcheck]
fn posit_round_trips_through_the_pattern(bits: u16) -> bool {
    let p = Posit16::from_bits(bits as u128);
    if p.is_nar() {
        return true;
    }
    Posit16::from_f64(p.to_f64()).to_bits() == p.to_bits()
}

#[quickcheck]
fn posit_addition_is_commutative(a: u16, b: u16) -> bool {
    let (x, y) = (Posit16::from_bits(a as u128), Posit16::from_bits(b as u128));
    (x + y).to_bits() == (y + x).to_bits()
}

#[quickcheck]
fn posit_multiplication_is_commutative(a: u16, b: u16) -> bool {
    let (x, y) = (Posit16::from_bits(a as u128), Posit16::from_bits(b as u128));
    (x * y).to_bits() == (y * x).to_bits()
}

#[quickcheck]
fn posit_identities_hold(a: u16) -> bool {
    let x = Posit16::from_bits(a as u128);
    if x.is_nar() {
        return true;
    }
    (x + Posit16::zero()).to_bits() == x.to_bits()
        && (x * Posit16::one()).to_bits() == x.to_bits()
        && (x - x).is_zero()
}

#[quickcheck]
fn posit_negation_is_exact(a: u16) -> bool {
    let x = Posit16::from_bits(a as u128);
    (-(-x)).to_bits() == x.to_bits()
}

#[quickcheck]
fn posit_order_agrees_with_the_reals(a: u16, b: u16) -> bool {
    let (x, y) = (Posit16::from_bits(a as u128), Posit16::from_bits(b as u128));
    if x.is_nar() || y.is_nar() {
        return true;
    }
    (x < y) == (x.to_f64() < y.to_f64())
}

#[quickcheck]
fn cfloat_round_trips_through_the_pattern(bits: u16) -> bool {
    let c = F16::from_bits(bits as u128);
    if c.is_nan() {
        return true;
    }
    let back = F16::from_f64(c.to_f64());
    back.to_bits() == c.to_bits() || (c.is_zero() && back.is_zero())
}

#[quickcheck]
fn cfloat_addition_is_commutative(a: u16, b: u16) -> bool {
    let (x, y) = (F16::from_bits(a as u128), F16::from_bits(b as u128));
    let (xy, yx) = (x + y, y + x);
    xy.to_bits() == yx.to_bits() || (xy.is_nan() && yx.is_nan())
}

#[quickcheck]
fn cfloat_multiplication_by_one_is_identity(a: u16) -> bool {
    let x = F16::from_bits(a as u128);
    if x.is_nan() {
        return true;
    }
    (x * F16::one()).to_bits() == x.to_bits()
}

#[quickcheck]
fn fixpnt_addition_is_commutative(a: u32, b: u32) -> bool {
    let (x, y) = (Q32::from_bits(a as u128), Q32::from_bits(b as u128));
    (x + y).to_bits() == (y + x).to_bits()
}

#[quickcheck]
fn fixpnt_round_trips_through_f64(a: u32) -> bool {
    // 32-bit patterns with 16 fraction bits are exactly representable in
    // a double
    let x = Q32::from_bits(a as u128);
    Q32::from_f64(x.to_f64()).to_bits() == x.to_bits()
}

#[quickcheck]
fn two_sum_is_error_free(a: f64, b: f64) -> bool {
    if !a.is_finite() || !b.is_finite() {
        return true;
    }
    let (s, e) = expansion::two_sum(a, b);
    if !s.is_finite() {
        return true;
    }
    // the head is the rounded sum and the tail is below its ulp
    s == a + b && (e == 0.0 || e.abs() <= s.abs() * f64::EPSILON)
}

#[quickcheck]
fn two_prod_is_error_free(a: f64, b: f64) -> bool {
    if !a.is_finite() || !b.is_finite() {
        return true;
    }
    let (p, e) = expansion::two_prod_fma(a, b);
    if !p.is_finite() || p.abs() < f64::MIN_POSITIVE {
        // overflow and deep underflow void the transformation's premise
        return true;
    }
    p == a * b && (e == 0.0 || e.abs() <= p.abs() * f64::EPSILON)
}

#[quickcheck]
fn dd_add_then_sub_is_identity_on_doubles(a: f64, b: f64) -> bool {
    if !a.is_finite() || !b.is_finite() {
        return true;
    }
    let x = DoubleDouble::from_f64(a);
    let y = DoubleDouble::from_f64(b);
    let round_about = (x + y) - y;
    if !round_about.to_f64().is_finite() {
        return true;
    }
    // double-double has enough headroom to recover the original exactly
    round_about.to_f64() == a
}
