use fbxbin::io::{Layout, ReadFbx, WriteFbx, BODY_OFFSET};
use fbxbin::structs::{Element, PropertyValue};
use proptest::collection::vec;
use proptest::prelude::*;

fn arb_scalar() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        any::<bool>().prop_map(PropertyValue::Bool),
        any::<i16>().prop_map(PropertyValue::Int16),
        any::<i32>().prop_map(PropertyValue::Int32),
        any::<i64>().prop_map(PropertyValue::Int64),
        (-1.0e6f32..1.0e6).prop_map(PropertyValue::Float32),
        (-1.0e12f64..1.0e12).prop_map(PropertyValue::Float64),
        vec(any::<u8>(), 0..40).prop_map(PropertyValue::Bytes),
        "[a-zA-Z ]{0,20}".prop_map(|s| PropertyValue::String(s.into_bytes())),
    ]
}

fn arb_array() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        vec(any::<i32>(), 0..80).prop_map(PropertyValue::Int32Array),
        vec(any::<i64>(), 0..40).prop_map(PropertyValue::Int64Array),
        vec(-1.0e3f32..1.0e3, 0..80).prop_map(PropertyValue::Float32Array),
        vec(-1.0e3f64..1.0e3, 0..40).prop_map(PropertyValue::Float64Array),
        vec(any::<bool>(), 0..200).prop_map(PropertyValue::BoolArray),
        vec(any::<u8>(), 0..300).prop_map(PropertyValue::ByteArray),
    ]
}

fn arb_value() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![arb_scalar(), arb_array()]
}

fn arb_leaf() -> impl Strategy<Value = Element> {
    ("[A-Za-z]{1,12}", vec(arb_value(), 0..4)).prop_map(|(id, values)| {
        let mut element = Element::new(id).unwrap();
        for value in values {
            element.add_value(value).unwrap();
        }
        element
    })
}

fn arb_element() -> impl Strategy<Value = Element> {
    arb_leaf().prop_recursive(4, 48, 6, |inner| {
        (arb_leaf(), vec(inner, 0..6)).prop_map(|(mut element, children)| {
            for child in children {
                element.add_child(child);
            }
            element
        })
    })
}

fn arb_root() -> impl Strategy<Value = Element> {
    vec(arb_element(), 0..6).prop_map(|children| {
        let mut root = Element::root();
        for child in children {
            root.add_child(child);
        }
        root
    })
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(data[at..at + 4].try_into().unwrap())
}

/// Compares two trees by decoded values rather than payload bytes.
fn assert_isomorphic(a: &Element, b: &Element) {
    assert_eq!(a.id(), b.id());
    assert_eq!(a.properties().len(), b.properties().len());
    for (pa, pb) in a.properties().iter().zip(b.properties()) {
        assert_eq!(pa.kind(), pb.kind());
        assert_eq!(pa.value().unwrap(), pb.value().unwrap());
    }
    assert_eq!(a.children().len(), b.children().len());
    for (ca, cb) in a.children().iter().zip(b.children()) {
        assert_isomorphic(ca, cb);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn end_offsets_match_written_positions(root in arb_root()) {
        let layout = Layout::for_root(&root, BODY_OFFSET).unwrap();

        let mut data = Vec::new();
        let written = data.write_fbx(&root, 7400).unwrap();
        prop_assert_eq!(written, layout.end_offset() + 4);
        prop_assert_eq!(written, data.len() as u64);

        for l in layout.elements() {
            let start = l.start_offset as usize;
            prop_assert!(u64::from(l.end_offset) > l.start_offset);
            prop_assert_eq!(read_u32(&data, start), l.end_offset);
            prop_assert_eq!(read_u32(&data, start + 8), l.props_length);
        }
    }

    #[test]
    fn encode_then_decode_is_isomorphic(root in arb_root()) {
        let mut data = Vec::new();
        data.write_fbx(&root, 7400).unwrap();

        let document = (&data[..]).read_fbx().unwrap();
        prop_assert_eq!(document.version, 7400);
        prop_assert_eq!(&document.root, &root);
        assert_isomorphic(&document.root, &root);
    }

    #[test]
    fn sizing_twice_gives_the_same_layout(root in arb_root()) {
        let first: Vec<_> = Layout::for_root(&root, BODY_OFFSET).unwrap().elements().copied().collect();
        let second: Vec<_> = Layout::for_root(&root, BODY_OFFSET).unwrap().elements().copied().collect();
        prop_assert_eq!(first, second);
    }
}
