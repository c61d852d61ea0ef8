//! Error-free floating-point transformations and expansion arithmetic.
//!
//! An expansion is an ordered sequence of doubles, most significant first,
//! whose exact sum is the represented value. The transforms here never lose
//! a bit: the sum of the outputs equals the sum of the inputs exactly. They
//! are the backbone of the double-double number system and of any caller
//! needing component-wise high precision.

/// Exact addition: returns `(s, e)` with `s + e == a + b` and `s` the
/// rounded sum.
pub fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let e = (a - (s - bb)) + (b - bb);
    (s, e)
}

/// Exact addition for pre-ordered operands (`|a| >= |b|`), one rounding
/// error term cheaper than [`two_sum`].
pub fn quick_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let e = b - (s - a);
    (s, e)
}

/// Exact multiplication through the fused multiply-add: returns `(p, e)`
/// with `p + e == a * b`.
pub fn two_prod_fma(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    let e = a.mul_add(b, -p);
    (p, e)
}

fn nonzero_ascending(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.into_iter().filter(|x| *x != 0.0).collect();
    v.sort_by(|a, b| {
        a.abs()
            .partial_cmp(&b.abs())
            .unwrap_or(core::cmp::Ordering::Equal)
    });
    v
}

/// One exact accumulation sweep over ascending-magnitude components.
/// Returns the partials most significant first.
fn sweep(ascending: &[f64]) -> Vec<f64> {
    let mut partials = Vec::with_capacity(ascending.len());
    let mut q = 0.0;
    for &x in ascending {
        let (s, e) = two_sum(q, x);
        if e != 0.0 {
            partials.push(e);
        }
        q = s;
    }
    if q != 0.0 || partials.is_empty() {
        partials.push(q);
    }
    partials.reverse();
    partials
}

/// Merges two expansions into one, preserving the exact sum; linear in the
/// total component count.
pub fn linear_expansion_sum(e: &[f64], f: &[f64]) -> Vec<f64> {
    let merged = nonzero_ascending(e.iter().chain(f).copied());
    if merged.is_empty() {
        return vec![0.0];
    }
    sweep(&merged)
}

/// Re-sorts and merges components so each successive one is at least an ulp
/// smaller than its predecessor; the sum is unchanged exactly.
pub fn renormalize(e: &[f64]) -> Vec<f64> {
    let first = nonzero_ascending(e.iter().copied());
    if first.is_empty() {
        return vec![0.0];
    }
    // two sweeps: the first orders the partials, the second leaves them
    // non-overlapping
    let once = sweep(&first);
    let mut ascending = once;
    ascending.reverse();
    sweep(&ascending)
}

/// Full cross product of two expansions: up to `2 * |e| * |f|` error-free
/// components, renormalized.
pub fn multiply_cascades(e: &[f64], f: &[f64]) -> Vec<f64> {
    let mut terms = Vec::with_capacity(2 * e.len() * f.len());
    for &x in e {
        for &y in f {
            let (p, err) = two_prod_fma(x, y);
            terms.push(p);
            terms.push(err);
        }
    }
    renormalize(&terms)
}

/// Renormalizes and keeps the `k` leading components; everything below is
/// discarded, so this is the one lossy operation of the module.
pub fn compress_to_k(e: &[f64], k: usize) -> Vec<f64> {
    let mut h = renormalize(e);
    h.truncate(k.max(1));
    h
}

/// Reciprocal by Newton iteration seeded from the leading component; each
/// step doubles the correct bits.
pub fn reciprocal(f: &[f64]) -> Vec<f64> {
    let leading = f.first().copied().unwrap_or(0.0);
    let keep = f.len().max(2) + 1;
    let mut r = vec![1.0 / leading];
    for _ in 0..4 {
        let fr = multiply_cascades(f, &r);
        let neg_fr: Vec<f64> = fr.iter().map(|x| -x).collect();
        let residual = linear_expansion_sum(&[2.0], &neg_fr);
        r = compress_to_k(&multiply_cascades(&r, &residual), keep);
    }
    r
}

/// `e / f` as `e * reciprocal(f)` with one post-renormalize.
pub fn quotient(e: &[f64], f: &[f64]) -> Vec<f64> {
    renormalize(&multiply_cascades(e, &reciprocal(f)))
}

/// Exact sum of an expansion's components through a final sweep.
pub fn value(e: &[f64]) -> f64 {
    renormalize(e)[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_sum_is_exact() {
        // 1e16 + 1 is not representable; the error term carries the 1
        let (s, e) = two_sum(1e16, 1.0);
        assert_eq!(s, 1e16);
        assert_eq!(e, 1.0);

        let (s, e) = two_sum(0.1, 0.2);
        assert_eq!(s, 0.1 + 0.2);
        assert_eq!(s + e, 0.30000000000000004);
    }

    #[test]
    fn two_prod_is_exact() {
        let a = 1.0 + f64::EPSILON;
        let (p, e) = two_prod_fma(a, a);
        // (1+u)^2 = 1 + 2u + u^2; the square of epsilon is the error term
        assert_eq!(p, 1.0 + 2.0 * f64::EPSILON);
        assert_eq!(e, f64::EPSILON * f64::EPSILON);
    }

    #[test]
    fn linear_sum_preserves_the_exact_total() {
        let e = [1e16, 1.0];
        let f = [3.0, 1e-16];
        let sum = linear_expansion_sum(&e, &f);
        // exact total: 1e16 + 4 + 1e-16; the 4 is absorbed exactly and the
        // sub-ulp residue survives as its own component
        assert_eq!(sum[0], 1e16 + 4.0);
        assert_eq!(*sum.last().unwrap(), 1e-16);
    }

    #[test]
    fn renormalize_orders_and_separates_components() {
        let parts = renormalize(&[1.0, 1e16, -0.5, 1e-20]);
        assert_eq!(parts[0], 1e16);
        for w in parts.windows(2) {
            assert!(w[0].abs() > w[1].abs());
        }
        // exact sum survives
        assert_eq!(parts[0] + parts[1], 1e16 + 0.5);
    }

    #[test]
    fn multiply_cascades_is_error_free() {
        let e = [1e8, 1.0];
        let f = [1e8, -1.0];
        // (1e8 + 1)(1e8 - 1) = 1e16 - 1
        let p = multiply_cascades(&e, &f);
        assert_eq!(value(&p), 1e16 - 1.0);
    }

    #[test]
    fn reciprocal_converges_to_full_precision() {
        let r = reciprocal(&[2.0]);
        assert_eq!(r[0], 0.5);
        let r3 = reciprocal(&[3.0]);
        assert_eq!(r3[0], 1.0 / 3.0);
        // the tail carries the residual beyond double precision
        assert!(r3.len() > 1 && r3[1].abs() < f64::EPSILON);
    }

    #[test]
    fn quotient_is_faithful_on_exact_cases() {
        let q = quotient(&[1.0], &[4.0]);
        assert_eq!(value(&q), 0.25);
        // 5e15 + 1 fits one double exactly, so the quotient collapses
        let q = quotient(&[1e16, 2.0], &[2.0]);
        assert_eq!(value(&q), 5e15 + 1.0);
    }

    #[test]
    fn cancellation_scenario_is_exact() {
        // (1e20 + 1) - 1e20 through expansions is exactly 1
        let sum = linear_expansion_sum(&[1e20], &[1.0]);
        let diff = linear_expansion_sum(&sum, &[-1e20]);
        assert_eq!(value(&diff), 1.0);
    }
}
