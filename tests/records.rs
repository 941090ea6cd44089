use fbxbin::io::{array_encoding, size, Error, WriteFbx, BODY_OFFSET, ENCODING_RAW, ENCODING_ZLIB, SENTINEL};
use fbxbin::structs::{Element, PropertyKind, PropertyValue};

fn write(root: &Element) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_fbx(root, 7400).unwrap();
    data
}

#[test]
fn int32_record_bytes() {
    let mut root = Element::root();
    root.add_child(Element::new("Test").unwrap()).add_int32(42);

    let data = write(&root);
    let record = &data[BODY_OFFSET as usize..];

    assert_eq!(&record[0..4], &(BODY_OFFSET as u32 + 22).to_le_bytes());
    assert_eq!(&record[4..8], &1u32.to_le_bytes());
    assert_eq!(&record[8..12], &5u32.to_le_bytes());
    assert_eq!(&record[12..17], b"\x04Test");
    assert_eq!(&record[17..22], &[b'I', 0x2A, 0x00, 0x00, 0x00]);
    // What follows is the top-level closing sentinel and the terminator.
    assert_eq!(&record[22..], &[0u8; 17]);
}

#[test]
fn bare_siblings_record_bytes() {
    let mut root = Element::root();
    root.add_child(Element::new("First").unwrap());
    root.add_child(Element::new("Second").unwrap());

    let data = write(&root);
    let body = &data[BODY_OFFSET as usize..];

    let first_end = BODY_OFFSET as u32 + 18 + 13;
    assert_eq!(&body[0..4], &first_end.to_le_bytes());
    assert_eq!(&body[12..18], b"\x05First");
    assert_eq!(&body[18..31], &SENTINEL);

    let second_end = first_end + 19;
    assert_eq!(&body[31..35], &second_end.to_le_bytes());
    assert_eq!(&body[43..50], b"\x06Second");
    assert_eq!(body.len(), 50 + 13 + 4);
}

#[test]
fn parent_gets_exactly_one_trailing_sentinel() {
    let mut parent = Element::new("Parent").unwrap();
    parent.add_child(Element::new("Only").unwrap()).add_int16(1);

    // Parent 19 + child 20 + sentinel 13, whether or not the parent is last.
    assert_eq!(size(&parent, 0, true).unwrap(), 52);
    assert_eq!(size(&parent, 0, false).unwrap(), 52);

    let mut root = Element::root();
    root.add_child(parent);
    let data = write(&root);
    let body = &data[BODY_OFFSET as usize..];
    assert_eq!(&body[36..39], &[b'Y', 1, 0]);
    assert_eq!(&body[39..52], &SENTINEL);
    assert_eq!(&body[52..65], &SENTINEL);
    assert_eq!(body.len(), 65 + 4);
}

#[test]
fn array_threshold_boundary() {
    let mut element = Element::new("Arrays").unwrap();
    element.add_byte_array(&[1; 128]).unwrap();
    element.add_byte_array(&[1; 129]).unwrap();
    element.add_float64_array(&[0.0; 16]).unwrap();
    element.add_float64_array(&[0.0; 17]).unwrap();
    element.add_bool_array(&[]).unwrap();

    let encodings: Vec<Option<u32>> = element.properties().iter().map(array_encoding).collect();
    assert_eq!(
        encodings,
        [
            Some(ENCODING_RAW),
            Some(ENCODING_ZLIB),
            Some(ENCODING_RAW),
            Some(ENCODING_ZLIB),
            Some(ENCODING_RAW)
        ]
    );
    assert_eq!(
        element.properties()[3].value().unwrap(),
        PropertyValue::Float64Array(vec![0.0; 17])
    );
}

#[test]
fn identifier_limits() {
    let longest = Element::new(vec![b'x'; 255]).unwrap();
    let mut root = Element::root();
    root.add_child(longest);
    let data = write(&root);
    assert_eq!(data[BODY_OFFSET as usize + 12], 255);

    let err = Element::new(vec![b'x'; 256]).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn mismatched_value_is_rejected_when_authoring() {
    let mut element = Element::new("Count").unwrap();
    let err = element
        .add_typed(PropertyKind::Int64, PropertyValue::Float32(1.0))
        .unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(err, Error::KindMismatch { .. }));
}
