//! Collaborator-facing serialization of number-system collections.
//!
//! The datafile is a line-oriented text format: a magic header, then
//! records of `(typeId, parameters, comment, aggregation, element data,
//! name)`, terminated by a record with typeId 0. Elements serialize either
//! as decimal (human-readable, through the double pathway) or as hex
//! patterns (bit-exact).

pub mod datafile;

pub use datafile::{
    type_id_for_tag, Aggregation, DatafileError, DatafileReader, DatafileWriter, Encoding, Record,
};
