//! Tree-to-tree conversion.
//!
//! Rebuilds a fresh element tree from an existing one by decoding every
//! property to its value and re-adding it through the typed adders. Used to
//! re-encode decoded files, which exercises the full encoder on real data.

use crate::io::{Document, Result};
use crate::structs::{Element, PropertyValue};

/// Rebuilds `source` and all of its descendants.
pub fn reencode(source: &Element) -> Result<Element> {
    let mut out = Element::new(source.id())?;
    copy_properties(source, &mut out)?;
    for child in source.children() {
        out.add_child(reencode(child)?);
    }
    Ok(out)
}

/// Rebuilds the tree of a decoded document, keeping its version.
pub fn reencode_document(document: &Document) -> Result<Document> {
    Ok(Document {
        version: document.version,
        root: reencode(&document.root)?,
    })
}

fn copy_properties(source: &Element, out: &mut Element) -> Result<()> {
    for property in source.properties() {
        match property.value()? {
            PropertyValue::Bool(v) => {
                out.add_bool(v);
            }
            PropertyValue::Int16(v) => {
                out.add_int16(v);
            }
            PropertyValue::Int32(v) => {
                out.add_int32(v);
            }
            PropertyValue::Int64(v) => {
                out.add_int64(v);
            }
            PropertyValue::Float32(v) => {
                out.add_float32(v);
            }
            PropertyValue::Float64(v) => {
                out.add_float64(v);
            }
            PropertyValue::Bytes(v) => {
                out.add_bytes(&v)?;
            }
            PropertyValue::String(v) => {
                out.add_string(&v)?;
            }
            PropertyValue::Int32Array(v) => {
                out.add_int32_array(&v)?;
            }
            PropertyValue::Int64Array(v) => {
                out.add_int64_array(&v)?;
            }
            PropertyValue::Float32Array(v) => {
                out.add_float32_array(&v)?;
            }
            PropertyValue::Float64Array(v) => {
                out.add_float64_array(&v)?;
            }
            PropertyValue::BoolArray(v) => {
                out.add_bool_array(&v)?;
            }
            PropertyValue::ByteArray(v) => {
                out.add_byte_array(&v)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::PropertyKind;

    #[test]
    fn reencode_preserves_every_kind() {
        let mut root = Element::root();
        let all = root.add_child(Element::new("All").unwrap());
        all.add_bool(true)
            .add_int16(-5)
            .add_int32(42)
            .add_int64(-(1i64 << 40))
            .add_float32(0.25)
            .add_float64(1e-9);
        all.add_bytes(&[0, 1, 2]).unwrap();
        all.add_string(b"Scene\x00\x01Model").unwrap();
        all.add_int32_array(&[1, 2, 3]).unwrap();
        all.add_int64_array(&(0..100).collect::<Vec<i64>>()).unwrap();
        all.add_float32_array(&[0.5; 10]).unwrap();
        all.add_float64_array(&[2.5; 40]).unwrap();
        all.add_bool_array(&[true, false, true]).unwrap();
        all.add_byte_array(&[7; 200]).unwrap();

        let copy = reencode(&root).unwrap();
        assert_eq!(copy, root);

        let kinds: Vec<PropertyKind> = copy.children()[0]
            .properties()
            .iter()
            .map(|p| p.kind())
            .collect();
        assert_eq!(kinds, PropertyKind::ALL);
    }

    #[test]
    fn reencode_keeps_child_order() {
        let mut root = Element::root();
        for name in ["Header", "Definitions", "Objects", "Connections"] {
            root.add_child(Element::new(name).unwrap());
        }
        let copy = reencode(&root).unwrap();
        let names: Vec<&[u8]> = copy.children().iter().map(|c| c.id()).collect();
        assert_eq!(names, [&b"Header"[..], b"Definitions", b"Objects", b"Connections"]);
    }
}
