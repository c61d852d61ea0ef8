use strum::{Display, EnumIter, EnumString};

/// Enumerated construction codes accepted by every number system.
///
/// Systems without a concept for a code map it to the closest value they
/// have: posit maps the infinities to the extreme finite values and every
/// NaN code to NaR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum SpecificValue {
    Zero,
    Minpos,
    Maxpos,
    Minneg,
    Maxneg,
    Infpos,
    Infneg,
    Qnan,
    Snan,
    Nar,
}

/// Classification of an encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NumClass {
    Zero,
    Subnormal,
    Normal,
    Infinite,
    /// NaN for the float-shaped systems, NaR for posit.
    Nan,
}

/// Four-valued comparison outcome; `Unordered` when a NaN/NaR operand makes
/// the relation undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumCmp {
    Less,
    Equal,
    Greater,
    Unordered,
}

impl From<core::cmp::Ordering> for NumCmp {
    fn from(ord: core::cmp::Ordering) -> Self {
        match ord {
            core::cmp::Ordering::Less => NumCmp::Less,
            core::cmp::Ordering::Equal => NumCmp::Equal,
            core::cmp::Ordering::Greater => NumCmp::Greater,
        }
    }
}
