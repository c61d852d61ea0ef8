/// Encoding flavor of a classic float: whether the all-zeros exponent
/// encodes subnormals, whether the all-ones exponent encodes the
/// infinities and NaN, and whether out-of-range results clamp to maxpos
/// instead of overflowing to infinity.
///
/// The set of flavors is closed on purpose; each one is a zero-sized marker
/// carrying the three booleans as associated constants.
pub trait CfloatFlavor: Copy + Default + 'static {
    const HAS_SUBNORMALS: bool;
    const HAS_SUPERNORMALS: bool;
    const IS_SATURATING: bool;
    const NAME: &'static str;
}

/// The IEEE-754 shape: subnormals, infinities and NaN, overflow to inf.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ieee;

impl CfloatFlavor for Ieee {
    const HAS_SUBNORMALS: bool = true;
    const HAS_SUPERNORMALS: bool = true;
    const IS_SATURATING: bool = false;
    const NAME: &'static str = "ieee";
}

/// IEEE shape with out-of-range conversions clamped to the extreme finite
/// values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IeeeSaturating;

impl CfloatFlavor for IeeeSaturating {
    const HAS_SUBNORMALS: bool = true;
    const HAS_SUPERNORMALS: bool = true;
    const IS_SATURATING: bool = true;
    const NAME: &'static str = "saturating";
}

/// Flush-to-zero shape: the all-zeros exponent is a zero domain, small
/// results flush to ±0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoSubnormals;

impl CfloatFlavor for NoSubnormals {
    const HAS_SUBNORMALS: bool = false;
    const HAS_SUPERNORMALS: bool = true;
    const IS_SATURATING: bool = false;
    const NAME: &'static str = "nosubnormals";
}
