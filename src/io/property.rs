//! Property payload codec.
//!
//! Scalars are packed at their fixed little-endian width, byte and text blobs
//! get a 4-byte length prefix, and arrays get a 12-byte header (count,
//! encoding, payload length) followed by either the raw elements or their
//! zlib-compressed form.

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use std::io::{Cursor, Read, Write};

use crate::io::utils::*;
use crate::io::{Error, Result, ARRAY_COMPRESSION_LEVEL, ARRAY_COMPRESSION_THRESHOLD};
use crate::structs::{Property, PropertyKind, PropertyValue};

/// Array payload stored as-is.
pub const ENCODING_RAW: u32 = 0;
/// Array payload stored zlib-compressed.
pub const ENCODING_ZLIB: u32 = 1;

pub(crate) fn encode(value: &PropertyValue) -> Result<Property> {
    Ok(match value {
        PropertyValue::Bool(v) => encode_bool(*v),
        PropertyValue::Int16(v) => encode_int16(*v),
        PropertyValue::Int32(v) => encode_int32(*v),
        PropertyValue::Int64(v) => encode_int64(*v),
        PropertyValue::Float32(v) => encode_float32(*v),
        PropertyValue::Float64(v) => encode_float64(*v),
        PropertyValue::Bytes(v) => encode_blob(PropertyKind::Bytes, v)?,
        PropertyValue::String(v) => encode_blob(PropertyKind::String, v)?,
        PropertyValue::Int32Array(v) => encode_int32_array(v)?,
        PropertyValue::Int64Array(v) => encode_int64_array(v)?,
        PropertyValue::Float32Array(v) => encode_float32_array(v)?,
        PropertyValue::Float64Array(v) => encode_float64_array(v)?,
        PropertyValue::BoolArray(v) => encode_bool_array(v)?,
        PropertyValue::ByteArray(v) => encode_byte_array(v)?,
    })
}

pub(crate) fn encode_bool(data: bool) -> Property {
    Property::from_parts(PropertyKind::Bool, vec![data as u8])
}

pub(crate) fn encode_int16(data: i16) -> Property {
    Property::from_parts(PropertyKind::Int16, data.to_le_bytes().to_vec())
}

pub(crate) fn encode_int32(data: i32) -> Property {
    Property::from_parts(PropertyKind::Int32, data.to_le_bytes().to_vec())
}

pub(crate) fn encode_int64(data: i64) -> Property {
    Property::from_parts(PropertyKind::Int64, data.to_le_bytes().to_vec())
}

pub(crate) fn encode_float32(data: f32) -> Property {
    Property::from_parts(PropertyKind::Float32, data.to_le_bytes().to_vec())
}

pub(crate) fn encode_float64(data: f64) -> Property {
    Property::from_parts(PropertyKind::Float64, data.to_le_bytes().to_vec())
}

pub(crate) fn encode_blob(kind: PropertyKind, data: &[u8]) -> Result<Property> {
    let mut payload = Vec::with_capacity(4 + data.len());
    payload.write_blob(data)?;
    Ok(Property::from_parts(kind, payload))
}

pub(crate) fn encode_int32_array(data: &[i32]) -> Result<Property> {
    let mut raw = Vec::with_capacity(data.len() * 4);
    raw.write_array_i32::<LE>(data)?;
    encode_array(PropertyKind::Int32Array, data.len(), raw)
}

pub(crate) fn encode_int64_array(data: &[i64]) -> Result<Property> {
    let mut raw = Vec::with_capacity(data.len() * 8);
    raw.write_array_i64::<LE>(data)?;
    encode_array(PropertyKind::Int64Array, data.len(), raw)
}

pub(crate) fn encode_float32_array(data: &[f32]) -> Result<Property> {
    let mut raw = Vec::with_capacity(data.len() * 4);
    raw.write_array_f32::<LE>(data)?;
    encode_array(PropertyKind::Float32Array, data.len(), raw)
}

pub(crate) fn encode_float64_array(data: &[f64]) -> Result<Property> {
    let mut raw = Vec::with_capacity(data.len() * 8);
    raw.write_array_f64::<LE>(data)?;
    encode_array(PropertyKind::Float64Array, data.len(), raw)
}

pub(crate) fn encode_bool_array(data: &[bool]) -> Result<Property> {
    let mut raw = Vec::with_capacity(data.len());
    raw.write_array_bool(data)?;
    encode_array(PropertyKind::BoolArray, data.len(), raw)
}

pub(crate) fn encode_byte_array(data: &[u8]) -> Result<Property> {
    encode_array(PropertyKind::ByteArray, data.len(), data.to_vec())
}

/// Wraps already little-endian element bytes into an array payload.
fn encode_array(kind: PropertyKind, count: usize, raw: Vec<u8>) -> Result<Property> {
    let (encoding, data) = if raw.len() <= ARRAY_COMPRESSION_THRESHOLD {
        (ENCODING_RAW, raw)
    } else {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(ARRAY_COMPRESSION_LEVEL));
        encoder.write_all(&raw)?;
        (ENCODING_ZLIB, encoder.finish()?)
    };

    let mut payload = Vec::with_capacity(12 + data.len());
    payload.write_u32::<LE>(checked_len(count)?)?;
    payload.write_u32::<LE>(encoding)?;
    payload.write_blob(&data)?;
    Ok(Property::from_parts(kind, payload))
}

pub(crate) fn decode(kind: PropertyKind, payload: &[u8]) -> Result<PropertyValue> {
    let mut r = Cursor::new(payload);

    let value = match kind {
        PropertyKind::Bool => PropertyValue::Bool(r.read_u8()? != 0),
        PropertyKind::Int16 => PropertyValue::Int16(r.read_i16::<LE>()?),
        PropertyKind::Int32 => PropertyValue::Int32(r.read_i32::<LE>()?),
        PropertyKind::Int64 => PropertyValue::Int64(r.read_i64::<LE>()?),
        PropertyKind::Float32 => PropertyValue::Float32(r.read_f32::<LE>()?),
        PropertyKind::Float64 => PropertyValue::Float64(r.read_f64::<LE>()?),
        PropertyKind::Bytes => PropertyValue::Bytes(read_blob(&mut r)?),
        PropertyKind::String => PropertyValue::String(read_blob(&mut r)?),
        PropertyKind::Int32Array => {
            let (count, raw) = read_array_payload(&mut r, kind)?;
            PropertyValue::Int32Array(Cursor::new(raw).read_array(count, |r| r.read_i32::<LE>())?)
        }
        PropertyKind::Int64Array => {
            let (count, raw) = read_array_payload(&mut r, kind)?;
            PropertyValue::Int64Array(Cursor::new(raw).read_array(count, |r| r.read_i64::<LE>())?)
        }
        PropertyKind::Float32Array => {
            let (count, raw) = read_array_payload(&mut r, kind)?;
            PropertyValue::Float32Array(Cursor::new(raw).read_array(count, |r| r.read_f32::<LE>())?)
        }
        PropertyKind::Float64Array => {
            let (count, raw) = read_array_payload(&mut r, kind)?;
            PropertyValue::Float64Array(Cursor::new(raw).read_array(count, |r| r.read_f64::<LE>())?)
        }
        PropertyKind::BoolArray => {
            let (_, raw) = read_array_payload(&mut r, kind)?;
            PropertyValue::BoolArray(raw.into_iter().map(|b| b != 0).collect())
        }
        PropertyKind::ByteArray => {
            let (_, raw) = read_array_payload(&mut r, kind)?;
            PropertyValue::ByteArray(raw)
        }
    };

    if r.position() != payload.len() as u64 {
        return Err(Error::Corrupt(format!(
            "{:?} payload has {} trailing bytes",
            kind,
            payload.len() as u64 - r.position()
        )));
    }
    Ok(value)
}

fn read_blob(r: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
    let len = r.read_u32::<LE>()? as usize;
    let remaining = r.get_ref().len() as u64 - r.position();
    if len as u64 > remaining {
        return Err(Error::Corrupt(format!("blob of {len} bytes overruns payload")));
    }
    r.read_bytes(len)
}

/// Reads an array header and returns the element count with the raw
/// (decompressed) element bytes.
fn read_array_payload(r: &mut Cursor<&[u8]>, kind: PropertyKind) -> Result<(usize, Vec<u8>)> {
    let count = r.read_u32::<LE>()? as usize;
    let encoding = r.read_u32::<LE>()?;
    let data = read_blob(r)?;

    let width = kind.array_element_width().unwrap_or(1);
    let expected = count
        .checked_mul(width)
        .ok_or_else(|| Error::Corrupt(format!("{:?} count {} overflows", kind, count)))?;

    let raw = match encoding {
        ENCODING_RAW => data,
        ENCODING_ZLIB => {
            // One byte past the declared size is enough to detect a mismatch.
            let mut raw = Vec::with_capacity(expected.min(data.len() * 4));
            ZlibDecoder::new(&data[..])
                .take(expected as u64 + 1)
                .read_to_end(&mut raw)
                .map_err(|e| Error::Corrupt(format!("zlib array payload: {e}")))?;
            raw
        }
        other => return Err(Error::Corrupt(format!("unknown array encoding {other}"))),
    };

    if raw.len() != expected {
        return Err(Error::Corrupt(format!(
            "{:?} declares {} elements but holds {}{} bytes",
            kind,
            count,
            if raw.len() > expected { "more than " } else { "" },
            raw.len().min(expected)
        )));
    }
    Ok((count, raw))
}

/// Reads the encoding flag of an encoded array property.
pub fn array_encoding(property: &Property) -> Option<u32> {
    if !property.kind().is_array() {
        return None;
    }
    property
        .payload()
        .get(4..8)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}
