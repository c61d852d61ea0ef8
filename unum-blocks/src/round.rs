/// Rounding rule applied when a significand is cut down to a destination
/// width.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    /// Round to nearest, ties to the even significand. The default of every
    /// number system.
    #[default]
    NearestEven,
    /// Round to nearest, ties away from zero.
    NearestAway,
    /// Truncate toward zero, used by the integer and fixed-point converts.
    TowardZero,
}

/// The shared guard/round/sticky increment decision.
///
/// `lsb` is the least significant kept bit, `guard` the first discarded bit,
/// `round` the second, `sticky` the OR of everything below.
pub fn round_increment(mode: RoundingMode, lsb: bool, guard: bool, round: bool, sticky: bool) -> bool {
    match mode {
        RoundingMode::NearestEven => guard && (round || sticky || lsb),
        RoundingMode::NearestAway => guard,
        RoundingMode::TowardZero => false,
    }
}

/// Cuts `cut` low bits off `sig`, rounding the kept part.
///
/// Returns the rounded significand and whether any discarded bit was set
/// (the inexact flag). The caller folds an externally accumulated sticky
/// into `sticky_in` and handles a possible carry out of the kept width.
pub fn round_at(sig: u128, cut: u32, mode: RoundingMode, sticky_in: bool) -> (u128, bool) {
    if cut == 0 {
        // nothing discarded from the significand itself; a sticky from an
        // earlier alignment still marks the result inexact
        return (sig, sticky_in);
    }
    if cut > 127 {
        // everything is discarded; the value contributes only stickiness
        let inexact = sig != 0 || sticky_in;
        return (0, inexact);
    }
    let kept = sig >> cut;
    let guard = (sig >> (cut - 1)) & 1 == 1;
    let (round, below) = if cut >= 2 {
        (
            (sig >> (cut - 2)) & 1 == 1,
            sig & ((1u128 << (cut - 2)) - 1) != 0,
        )
    } else {
        (false, false)
    };
    let sticky = round || below || sticky_in;
    let inexact = guard || sticky;
    let lsb = kept & 1 == 1;
    if round_increment(mode, lsb, guard, round, sticky) {
        (kept + 1, inexact)
    } else {
        (kept, inexact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_even_breaks_ties_to_even() {
        // 0b1011_1000 cut by 4: guard set, no sticky, lsb 1 -> round up
        let (v, inexact) = round_at(0b1011_1000, 4, RoundingMode::NearestEven, false);
        assert_eq!(v, 0b1100);
        assert!(inexact);

        // 0b1010_1000 cut by 4: guard set, no sticky, lsb 0 -> stay
        let (v, _) = round_at(0b1010_1000, 4, RoundingMode::NearestEven, false);
        assert_eq!(v, 0b1010);

        // same tie with an external sticky is no longer a tie
        let (v, _) = round_at(0b1010_1000, 4, RoundingMode::NearestEven, true);
        assert_eq!(v, 0b1011);
    }

    #[test]
    fn truncation_never_increments() {
        let (v, inexact) = round_at(0b1111_1111, 4, RoundingMode::TowardZero, false);
        assert_eq!(v, 0b1111);
        assert!(inexact);
    }

    #[test]
    fn full_cut_collapses_to_sticky() {
        let (v, inexact) = round_at(3, 128, RoundingMode::NearestEven, false);
        assert_eq!(v, 0);
        assert!(inexact);
    }

    #[test]
    fn exact_cut_is_exact() {
        let (v, inexact) = round_at(0b1010_0000, 4, RoundingMode::NearestEven, false);
        assert_eq!(v, 0b1010);
        assert!(!inexact);
    }
}
