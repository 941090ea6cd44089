use byteorder::{ReadBytesExt, LE};
use std::io::Cursor;
use tracing::debug;

use crate::{
    io::{utils::*, Error, Result, MAGIC, MAGIC_MARKER},
    structs::{Element, Property, PropertyKind},
};

/// Deepest record nesting the reader accepts.
pub const MAX_DEPTH: usize = 256;

/// A decoded file: format version plus the synthetic root holding the
/// top-level records as children.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub version: u32,
    pub root: Element,
}

impl Document {
    /// Decodes a complete FBX binary file held in memory.
    ///
    /// Whatever follows the top-level terminator is footer data and is not
    /// interpreted.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut r = Cursor::new(data);

        if r.read_bytes(MAGIC.len()).map_err(|_| Error::InvalidMagic)? != MAGIC[..] {
            return Err(Error::InvalidMagic);
        }
        if r.read_bytes(MAGIC_MARKER.len()).map_err(|_| Error::InvalidMagic)? != MAGIC_MARKER {
            return Err(Error::InvalidMagic);
        }
        let version = r.read_u32::<LE>()?;
        debug!(version, len = data.len(), "reading document");

        let mut root = Element::root();
        while let Some(element) = read_record(&mut r, 0)? {
            root.add_child(element);
        }

        if r.read_u32::<LE>()? != 0 {
            return Err(Error::Corrupt(format!(
                "missing top-level terminator at {}",
                r.position() - 4
            )));
        }

        Ok(Document { version, root })
    }
}

fn remaining(r: &Cursor<&[u8]>) -> u64 {
    r.get_ref().len() as u64 - r.position()
}

/// Reads one record, or `None` when a sentinel block is found instead.
fn read_record(r: &mut Cursor<&[u8]>, depth: usize) -> Result<Option<Element>> {
    let start = r.position();
    if depth >= MAX_DEPTH {
        return Err(Error::Corrupt(format!(
            "record at {start} is nested deeper than {MAX_DEPTH}"
        )));
    }
    let end_offset = u64::from(r.read_u32::<LE>()?);
    let property_count = r.read_u32::<LE>()?;
    let props_length = u64::from(r.read_u32::<LE>()?);
    let id_len = r.read_u8()? as usize;

    if end_offset == 0 && property_count == 0 && props_length == 0 && id_len == 0 {
        return Ok(None);
    }
    if end_offset <= start || end_offset > r.get_ref().len() as u64 {
        return Err(Error::Corrupt(format!(
            "record at {start} ends at {end_offset}, outside the file"
        )));
    }

    let mut element = Element::new(r.read_bytes(id_len)?)?;

    let props_start = r.position();
    for _ in 0..property_count {
        let kind = PropertyKind::from_tag(r.read_u8()?)?;
        let payload = read_payload(r, kind)?;
        element.push_property(Property::from_parts(kind, payload));
    }
    if r.position() - props_start != props_length {
        return Err(Error::Corrupt(format!(
            "record at {start} declares {props_length} property bytes, found {}",
            r.position() - props_start
        )));
    }

    while r.position() < end_offset {
        match read_record(r, depth + 1)? {
            Some(child) => {
                element.add_child(child);
            }
            None => break,
        }
    }

    if r.position() != end_offset {
        return Err(Error::Corrupt(format!(
            "record at {start} should end at {end_offset}, ended at {}",
            r.position()
        )));
    }
    Ok(Some(element))
}

/// Reads a property payload, length prefixes and array headers included.
fn read_payload(r: &mut Cursor<&[u8]>, kind: PropertyKind) -> Result<Vec<u8>> {
    let len = if let Some(width) = kind.scalar_width() {
        width
    } else {
        let start = r.position();
        let header = if kind.is_array() { 12 } else { 4 };
        r.set_position(start + header - 4);
        let data_len = r.read_u32::<LE>()? as usize;
        r.set_position(start);
        header as usize + data_len
    };

    if len as u64 > remaining(r) {
        return Err(Error::Corrupt(format!(
            "{:?} payload of {len} bytes overruns the file",
            kind
        )));
    }
    r.read_bytes(len)
}
