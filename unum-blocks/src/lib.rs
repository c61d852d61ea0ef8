//! Block storage and arithmetic intermediates shared by every number system
//! in the Universal Numbers kernel.
//!
//! The layering is leaves-first: [`Limb`] abstracts the storage word,
//! [`BlockBinary`] is a fixed-size vector of limbs with explicit carry and
//! borrow propagation, [`BlockDigit`] is its sign-magnitude radix sibling,
//! and [`BlockTriple`] is the normalized (sign, scale, significand)
//! intermediate every arithmetic operation funnels through before a single
//! rounding back into the destination encoding.

#![cfg_attr(not(feature = "std"), no_std)]

mod blockbinary;
mod blockdigit;
mod limb;
pub mod native;
mod round;
mod triple;

pub use blockbinary::BlockBinary;
pub use blockdigit::BlockDigit;
pub use limb::Limb;
pub use round::{round_at, round_increment, RoundingMode};
pub use triple::{BlockTriple, TripleOp};
