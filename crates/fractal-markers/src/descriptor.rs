//! Binary marker-set descriptor reader.
//!
//! Layout, all little endian:
//!
//! ```text
//! i32 units, i32 marker_count, i32 root_id
//! per marker:
//!   i32 id, i32 bit_count, f32 x 12 (four xyz corners),
//!   u8 x bit_count, i32 sub_count, i32 x sub_count
//! ```
//!
//! This module only checks the byte-level structure. Cross-marker checks
//! (duplicate ids, sub-marker references) happen when the set is built.

use crate::{ConfigError, Units};
use nalgebra::Point3;

/// One marker record as stored in the descriptor.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MarkerRecord {
    pub id: i32,
    /// Bit grid side.
    pub n: usize,
    pub corners: [Point3<f32>; 4],
    pub bits: Vec<u8>,
    pub sub_marker_ids: Vec<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Descriptor {
    pub units: Units,
    pub root_id: i32,
    pub markers: Vec<MarkerRecord>,
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], ConfigError> {
        let end = self.pos.checked_add(len).filter(|&e| e <= self.buf.len());
        let Some(end) = end else {
            return Err(ConfigError::Truncated {
                field,
                offset: self.pos,
            });
        };
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn i32(&mut self, field: &'static str) -> Result<i32, ConfigError> {
        let b = self.take(4, field)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self, field: &'static str) -> Result<f32, ConfigError> {
        let b = self.take(4, field)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn count(&mut self, field: &'static str) -> Result<usize, ConfigError> {
        let value = self.i32(field)?;
        usize::try_from(value).map_err(|_| ConfigError::NegativeCount { field, value })
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

pub(crate) fn parse_descriptor(bytes: &[u8]) -> Result<Descriptor, ConfigError> {
    let mut r = Reader::new(bytes);

    let units_code = r.i32("units")?;
    let units = Units::from_code(units_code).ok_or(ConfigError::InvalidUnits(units_code))?;
    let count = r.count("marker_count")?;
    let root_id = r.i32("root_id")?;

    let mut markers = Vec::new();
    for _ in 0..count {
        markers.push(read_marker(&mut r)?);
    }

    match r.remaining() {
        0 => Ok(Descriptor {
            units,
            root_id,
            markers,
        }),
        n => Err(ConfigError::TrailingBytes(n)),
    }
}

fn read_marker(r: &mut Reader<'_>) -> Result<MarkerRecord, ConfigError> {
    let id = r.i32("id")?;
    let bit_count = r.i32("bit_count")?;
    let n = grid_side(bit_count).ok_or(ConfigError::NonSquareBits {
        id,
        bits: bit_count,
    })?;

    let mut corners = [Point3::origin(); 4];
    for c in &mut corners {
        let x = r.f32("corners")?;
        let y = r.f32("corners")?;
        let z = r.f32("corners")?;
        *c = Point3::new(x, y, z);
    }

    let bits = r.take(n * n, "bits")?.to_vec();
    if let Some(&value) = bits.iter().find(|&&b| b > 1) {
        return Err(ConfigError::InvalidBit { id, value });
    }

    let sub_count = r.count("sub_count")?;
    let mut sub_marker_ids = Vec::with_capacity(sub_count.min(r.remaining() / 4));
    for _ in 0..sub_count {
        sub_marker_ids.push(r.i32("sub_marker_id")?);
    }

    Ok(MarkerRecord {
        id,
        n,
        corners,
        bits,
        sub_marker_ids,
    })
}

/// Side of a non-empty square grid with `bit_count` cells.
fn grid_side(bit_count: i32) -> Option<usize> {
    if bit_count <= 0 {
        return None;
    }
    let n = (bit_count as f64).sqrt().round() as i64;
    (n * n == bit_count as i64).then_some(n as usize)
}
