//! End-to-end scenarios spanning several number systems.

use unum_number::{
    expansion, fdp, Areal, Bfloat16, Cfloat, DoubleDouble, Ieee, Integer, NumberSystem, Posit,
    Posit32, Signed, SpecificValue,
};

#[test]
fn posit8_unit_pattern() {
    type Posit8 = Posit<8, 2>;
    let p = Posit8::from_bits(0x40);
    assert_eq!(p.to_f64(), 1.0);
    assert_eq!(Posit8::from_f64(1.0).to_bits(), 0x40);
}

#[test]
fn posit32_fused_dot_product_guards_cancellation() {
    let x = [
        Posit32::from_f64(1e20),
        Posit32::from_f64(1.0),
        Posit32::from_f64(-1e20),
    ];
    let y = [Posit32::one(), Posit32::one(), Posit32::one()];
    let fused = fdp(&x, &y);
    assert_eq!(fused.to_f64(), 1.0);

    // the unfused sum loses the 1 entirely
    let unfused = x[0] * y[0] + x[1] * y[1] + x[2] * y[2];
    assert_eq!(unfused.to_f64(), 0.0);
}

#[test]
fn cfloat32_matches_native_single_rounding() {
    type F32 = Cfloat<32, 8, u32, Ieee>;
    let a = F32::from_f64(0.1f32 as f64);
    let b = F32::from_f64(0.2f32 as f64);
    assert_eq!((a + b).to_bits(), (0.1f32 + 0.2f32).to_bits() as u128);
}

#[test]
fn double_double_subtracts_without_catastrophe() {
    let sum = DoubleDouble::from_f64(1e20) + DoubleDouble::from_f64(1.0);
    let diff = sum - DoubleDouble::from_f64(1e20);
    assert_eq!(diff.to_f64(), 1.0);

    // the same exactness holds at the expansion level
    let (s, e) = expansion::two_sum(1e20, 1.0);
    assert_eq!(s + e, 1e20); // rounded head
    assert_eq!(e, 1.0); // exact tail
}

#[test]
fn areal16_tracks_exactness_with_the_ubit() {
    type A16 = Areal<16, 5, u16>;
    assert!(A16::from_f64(core::f64::consts::PI).ubit());
    assert!(!A16::from_f64(0.5).ubit());
}

#[test]
fn integer1024_survives_mul_then_div() {
    type I1024 = Integer<1024, 32, u32, Signed>;
    let one = I1024::one();
    let n = I1024::from_u64(1_234_567_890);
    let product = one * n;
    let quotient = product / one;
    assert_eq!(quotient, n);
    assert_eq!(quotient.to_string(), "1234567890");

    // headroom check: shift far beyond 64 bits and come back
    let shifted = (n << 900) >> 900;
    assert_eq!(shifted, n);
}

#[test]
fn specific_values_exist_for_every_system() {
    fn probe<T: NumberSystem>() {
        for code in [
            SpecificValue::Zero,
            SpecificValue::Minpos,
            SpecificValue::Maxpos,
            SpecificValue::Minneg,
            SpecificValue::Maxneg,
            SpecificValue::Infpos,
            SpecificValue::Infneg,
            SpecificValue::Qnan,
            SpecificValue::Snan,
            SpecificValue::Nar,
        ] {
            let _ = T::specific_value(code);
        }
        assert!(!T::type_tag().is_empty());

        let minpos = T::specific_value(SpecificValue::Minpos);
        assert!(NumberSystem::neg(&minpos) == -minpos);
        assert!(NumberSystem::neg(&NumberSystem::neg(&minpos)) == minpos);
    }
    probe::<Posit32>();
    probe::<Cfloat<32, 8, u32, Ieee>>();
    probe::<Areal<16, 5, u16>>();
    probe::<Bfloat16>();
    probe::<Integer<128, 2, u64, Signed>>();
    probe::<unum_number::Fixpnt<32, 16, unum_number::Saturating, u32>>();
    probe::<unum_number::Dfloat<7, 2>>();
    probe::<DoubleDouble>();
}

#[test]
fn minpos_and_maxpos_are_ordered_extremes() {
    fn probe<T: NumberSystem + PartialOrd>() {
        let minpos = T::specific_value(SpecificValue::Minpos);
        let maxpos = T::specific_value(SpecificValue::Maxpos);
        let zero = T::specific_value(SpecificValue::Zero);
        assert!(zero < minpos, "{}", T::type_tag());
        assert!(minpos <= maxpos, "{}", T::type_tag());
    }
    probe::<Posit32>();
    probe::<Cfloat<32, 8, u32, Ieee>>();
    probe::<Bfloat16>();
    probe::<DoubleDouble>();
}
