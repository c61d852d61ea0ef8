use std::io::{self, BufRead, Write};

use unum_number::NumberSystem;

/// Datafile magic number, first line of every file.
pub const MAGIC: u32 = 0xAAA0;

/// Stable arithmetic type identifiers.
pub const TYPE_ID_TERMINATOR: u32 = 0x0000;
pub const TYPE_ID_NATIVE_INT8: u32 = 0x0010;
pub const TYPE_ID_NATIVE_INT16: u32 = 0x0011;
pub const TYPE_ID_NATIVE_INT32: u32 = 0x0012;
pub const TYPE_ID_NATIVE_INT64: u32 = 0x0013;
pub const TYPE_ID_NATIVE_FP8: u32 = 0x0020;
pub const TYPE_ID_NATIVE_FP16: u32 = 0x0021;
pub const TYPE_ID_NATIVE_FP32: u32 = 0x0022;
pub const TYPE_ID_NATIVE_FP64: u32 = 0x0023;
pub const TYPE_ID_INTEGER: u32 = 0x0101;
pub const TYPE_ID_FIXPNT: u32 = 0x0201;
pub const TYPE_ID_AREAL: u32 = 0x0301;
pub const TYPE_ID_BFLOAT: u32 = 0x0302;
pub const TYPE_ID_CFLOAT: u32 = 0x0303;
pub const TYPE_ID_POSIT: u32 = 0x0401;
pub const TYPE_ID_LNS: u32 = 0x0501;
pub const TYPE_ID_DBNS: u32 = 0x0601;

/// Maps a type tag (e.g. `posit<32,2>`) to its stable identifier.
pub fn type_id_for_tag(tag: &str) -> u32 {
    let family = tag.split('<').next().unwrap_or(tag);
    match family {
        "integer" => TYPE_ID_INTEGER,
        "fixpnt" => TYPE_ID_FIXPNT,
        "areal" => TYPE_ID_AREAL,
        "bfloat16" => TYPE_ID_BFLOAT,
        "cfloat" => TYPE_ID_CFLOAT,
        "posit" => TYPE_ID_POSIT,
        "lns" => TYPE_ID_LNS,
        "dbns" => TYPE_ID_DBNS,
        _ => 0xFFFF,
    }
}

/// Shape of a serialized collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Scalar = 0,
    Vector = 1,
    Matrix = 2,
    Tensor = 3,
}

impl Aggregation {
    fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Scalar),
            1 => Some(Self::Vector),
            2 => Some(Self::Matrix),
            3 => Some(Self::Tensor),
            _ => None,
        }
    }
}

/// Element rendering: decimal is readable, hex is bit-exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Decimal,
    Hex,
}

#[derive(Debug, thiserror::Error)]
pub enum DatafileError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("bad magic number {found:#x}")]
    BadMagic { found: u32 },
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error("malformed datafile line: {0}")]
    Malformed(String),
    #[error("type mismatch: file has {found:#06x}, expected {expected:#06x}")]
    TypeMismatch { expected: u32, found: u32 },
}

/// One deserialized collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub type_id: u32,
    pub parameters: Vec<u32>,
    pub comment: String,
    pub aggregation: Aggregation,
    pub name: String,
    pub values: Vec<T>,
}

/// Writes collections to a datafile stream.
pub struct DatafileWriter<W: Write> {
    out: W,
}

impl<W: Write> DatafileWriter<W> {
    /// Opens the stream and emits the magic header.
    pub fn new(mut out: W) -> Result<Self, DatafileError> {
        writeln!(out, "{}", MAGIC)?;
        Ok(Self { out })
    }

    /// Serializes one collection of values.
    pub fn write_collection<T: NumberSystem>(
        &mut self,
        parameters: &[u32],
        comment: &str,
        aggregation: Aggregation,
        name: &str,
        values: &[T],
        encoding: Encoding,
    ) -> Result<(), DatafileError> {
        let type_id = type_id_for_tag(&T::type_tag());
        write!(self.out, "{} {}", type_id, parameters.len())?;
        for p in parameters {
            write!(self.out, " {}", p)?;
        }
        writeln!(self.out)?;
        writeln!(self.out, "{}", comment)?;
        writeln!(
            self.out,
            "{} {} {}",
            aggregation as u32,
            values.len(),
            match encoding {
                Encoding::Decimal => "dec",
                Encoding::Hex => "hex",
            }
        )?;
        for v in values {
            match encoding {
                Encoding::Decimal => writeln!(self.out, "{}", v.to_f64())?,
                Encoding::Hex => {
                    // the pattern interface carries at most 128 bits
                    let nibbles = T::NBITS.div_ceil(4).clamp(1, 32);
                    let full = hex::encode(v.to_bits().to_be_bytes());
                    writeln!(self.out, "{}", &full[full.len() - nibbles..])?
                }
            }
        }
        writeln!(self.out, "{}", name)?;
        Ok(())
    }

    /// Emits the terminator record and flushes.
    pub fn finish(mut self) -> Result<W, DatafileError> {
        writeln!(self.out, "{}", TYPE_ID_TERMINATOR)?;
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Reads collections back from a datafile stream.
pub struct DatafileReader<R: BufRead> {
    lines: io::Lines<R>,
}

impl<R: BufRead> DatafileReader<R> {
    /// Opens the stream and checks the magic header.
    pub fn new(input: R) -> Result<Self, DatafileError> {
        let mut lines = input.lines();
        let magic: u32 = parse_single(next_line(&mut lines)?)?;
        if magic != MAGIC {
            return Err(DatafileError::BadMagic { found: magic });
        }
        Ok(Self { lines })
    }

    /// Reads the next collection; `None` at the terminator record.
    pub fn read_collection<T: NumberSystem>(
        &mut self,
    ) -> Result<Option<Record<T>>, DatafileError> {
        let header = next_line(&mut self.lines)?;
        let mut fields = header.split_whitespace();
        let type_id: u32 = parse_field(fields.next(), &header)?;
        if type_id == TYPE_ID_TERMINATOR {
            return Ok(None);
        }
        let expected = type_id_for_tag(&T::type_tag());
        if type_id != expected {
            return Err(DatafileError::TypeMismatch {
                expected,
                found: type_id,
            });
        }
        let nr_parameters: usize = parse_field(fields.next(), &header)?;
        let mut parameters = Vec::with_capacity(nr_parameters);
        for _ in 0..nr_parameters {
            parameters.push(parse_field(fields.next(), &header)?);
        }

        let comment = next_line(&mut self.lines)?;

        let shape = next_line(&mut self.lines)?;
        let mut fields = shape.split_whitespace();
        let aggregation = Aggregation::from_u32(parse_field(fields.next(), &shape)?)
            .ok_or_else(|| DatafileError::Malformed(shape.clone()))?;
        let nr_elements: usize = parse_field(fields.next(), &shape)?;
        let encoding = match fields.next() {
            Some("dec") => Encoding::Decimal,
            Some("hex") => Encoding::Hex,
            _ => return Err(DatafileError::Malformed(shape.clone())),
        };

        let mut values = Vec::with_capacity(nr_elements);
        for _ in 0..nr_elements {
            let line = next_line(&mut self.lines)?;
            let value = match encoding {
                Encoding::Decimal => {
                    let x: f64 = line
                        .trim()
                        .parse()
                        .map_err(|_| DatafileError::Malformed(line.clone()))?;
                    T::from_f64(x)
                }
                Encoding::Hex => {
                    let trimmed = line.trim();
                    let padded = if trimmed.len() % 2 == 1 {
                        format!("0{}", trimmed)
                    } else {
                        trimmed.to_string()
                    };
                    let bytes = hex::decode(&padded)
                        .map_err(|_| DatafileError::Malformed(line.clone()))?;
                    let mut bits = 0u128;
                    for b in bytes {
                        bits = (bits << 8) | b as u128;
                    }
                    T::from_bits(bits)
                }
            };
            values.push(value);
        }

        let name = next_line(&mut self.lines)?;
        Ok(Some(Record {
            type_id,
            parameters,
            comment,
            aggregation,
            name,
            values,
        }))
    }
}

fn next_line<R: BufRead>(lines: &mut io::Lines<R>) -> Result<String, DatafileError> {
    match lines.next() {
        None => Err(DatafileError::UnexpectedEof),
        Some(line) => Ok(line?),
    }
}

fn parse_single<T: std::str::FromStr>(line: String) -> Result<T, DatafileError> {
    line.trim()
        .parse()
        .map_err(|_| DatafileError::Malformed(line))
}

fn parse_field<T: std::str::FromStr>(
    field: Option<&str>,
    line: &str,
) -> Result<T, DatafileError> {
    field
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| DatafileError::Malformed(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use unum_number::{Posit32, SpecificValue};

    fn sample() -> Vec<Posit32> {
        vec![
            Posit32::from_f64(1.0),
            Posit32::from_f64(-0.5),
            Posit32::from_f64(3.25),
            Posit32::specific_value(SpecificValue::Maxpos),
        ]
    }

    #[test]
    fn hex_round_trip_is_bit_exact() {
        let mut writer = DatafileWriter::new(Vec::new()).unwrap();
        writer
            .write_collection(
                &[32, 2],
                "regression vector",
                Aggregation::Vector,
                "weights",
                &sample(),
                Encoding::Hex,
            )
            .unwrap();
        let buffer = writer.finish().unwrap();

        let mut reader = DatafileReader::new(buffer.as_slice()).unwrap();
        let record: Record<Posit32> = reader.read_collection().unwrap().unwrap();
        assert_eq!(record.type_id, TYPE_ID_POSIT);
        assert_eq!(record.parameters, vec![32, 2]);
        assert_eq!(record.aggregation, Aggregation::Vector);
        assert_eq!(record.name, "weights");
        assert_eq!(record.values, sample());
        assert!(reader.read_collection::<Posit32>().unwrap().is_none());
    }

    #[test]
    fn decimal_round_trip_preserves_representable_values() {
        let mut writer = DatafileWriter::new(Vec::new()).unwrap();
        writer
            .write_collection(
                &[32, 2],
                "",
                Aggregation::Scalar,
                "x",
                &[Posit32::from_f64(1.5)],
                Encoding::Decimal,
            )
            .unwrap();
        let buffer = writer.finish().unwrap();
        let mut reader = DatafileReader::new(buffer.as_slice()).unwrap();
        let record: Record<Posit32> = reader.read_collection().unwrap().unwrap();
        assert_eq!(record.values[0], Posit32::from_f64(1.5));
    }

    #[test]
    fn magic_is_checked() {
        let bogus = b"1234\n0\n";
        assert!(matches!(
            DatafileReader::new(&bogus[..]),
            Err(DatafileError::BadMagic { found: 1234 })
        ));
    }

    #[test]
    fn type_mismatch_is_reported() {
        let mut writer = DatafileWriter::new(Vec::new()).unwrap();
        writer
            .write_collection(
                &[],
                "",
                Aggregation::Scalar,
                "x",
                &[Posit32::from_f64(1.0)],
                Encoding::Hex,
            )
            .unwrap();
        let buffer = writer.finish().unwrap();
        let mut reader = DatafileReader::new(buffer.as_slice()).unwrap();
        let result = reader.read_collection::<unum_number::Bfloat16>();
        assert!(matches!(
            result,
            Err(DatafileError::TypeMismatch {
                expected: TYPE_ID_BFLOAT,
                found: TYPE_ID_POSIT
            })
        ));
    }

    #[test]
    fn tag_mapping_matches_the_stable_table() {
        assert_eq!(type_id_for_tag("posit<8,2>"), 0x0401);
        assert_eq!(type_id_for_tag("cfloat<32,8,u32,1,1,0>"), 0x0303);
        assert_eq!(type_id_for_tag("areal<16,5,u16>"), 0x0301);
        assert_eq!(type_id_for_tag("bfloat16"), 0x0302);
        assert_eq!(type_id_for_tag("integer<128,u32,int>"), 0x0101);
        assert_eq!(type_id_for_tag("fixpnt<16,8,saturating,u64>"), 0x0201);
        assert_eq!(type_id_for_tag("mystery"), 0xFFFF);
    }
}
