use criterion::{black_box, criterion_group, criterion_main, Criterion};

use unum_number::{fdp, Cfloat, DoubleDouble, Ieee, NumberSystem, Posit32, Quire};

fn posit_arithmetic(c: &mut Criterion) {
    let a = Posit32::from_f64(3.14159265);
    let b = Posit32::from_f64(-2.71828183);
    c.bench_function("posit32 add", |bench| {
        bench.iter(|| black_box(black_box(a) + black_box(b)))
    });
    c.bench_function("posit32 mul", |bench| {
        bench.iter(|| black_box(black_box(a) * black_box(b)))
    });
    c.bench_function("posit32 div", |bench| {
        bench.iter(|| black_box(black_box(a) / black_box(b)))
    });
}

fn cfloat_arithmetic(c: &mut Criterion) {
    type F32 = Cfloat<32, 8, u32, Ieee>;
    let a = F32::from_f64(3.14159265);
    let b = F32::from_f64(-2.71828183);
    c.bench_function("cfloat32 add", |bench| {
        bench.iter(|| black_box(black_box(a) + black_box(b)))
    });
    c.bench_function("cfloat32 mul", |bench| {
        bench.iter(|| black_box(black_box(a) * black_box(b)))
    });
}

fn quire_accumulation(c: &mut Criterion) {
    let xs: Vec<Posit32> = (0..64).map(|i| Posit32::from_f64(i as f64 * 0.25)).collect();
    let ys: Vec<Posit32> = (0..64).map(|i| Posit32::from_f64(1.0 / (i + 1) as f64)).collect();
    c.bench_function("posit32 fdp 64", |bench| {
        bench.iter(|| black_box(fdp(black_box(&xs), black_box(&ys))))
    });
    c.bench_function("quire accumulate", |bench| {
        bench.iter(|| {
            let mut quire = Quire::<32, 2>::new();
            for (x, y) in xs.iter().zip(ys.iter()) {
                quire.add_product(x, y);
            }
            black_box(quire.to_posit())
        })
    });
}

fn dd_arithmetic(c: &mut Criterion) {
    let a = DoubleDouble::from_f64(3.14159265) + DoubleDouble::from_f64(1e-20);
    let b = DoubleDouble::from_f64(-2.71828183);
    c.bench_function("dd add", |bench| {
        bench.iter(|| black_box(black_box(a) + black_box(b)))
    });
    c.bench_function("dd mul", |bench| {
        bench.iter(|| black_box(black_box(a) * black_box(b)))
    });
}

criterion_group!(
    benches,
    posit_arithmetic,
    cfloat_arithmetic,
    quire_accumulation,
    dd_arithmetic
);
criterion_main!(benches);
