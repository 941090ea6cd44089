use crate::io::{property, Error, Result, MAX_IDENTIFIER_LENGTH};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
/// Kind of a property together with its single-byte wire tag.
pub enum PropertyKind {
    Bool = b'C',
    Int16 = b'Y',
    Int32 = b'I',
    Int64 = b'L',
    Float32 = b'F',
    Float64 = b'D',
    Bytes = b'R',
    String = b'S',
    Int32Array = b'i',
    Int64Array = b'l',
    Float32Array = b'f',
    Float64Array = b'd',
    BoolArray = b'b',
    ByteArray = b'c',
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 14] = [
        PropertyKind::Bool,
        PropertyKind::Int16,
        PropertyKind::Int32,
        PropertyKind::Int64,
        PropertyKind::Float32,
        PropertyKind::Float64,
        PropertyKind::Bytes,
        PropertyKind::String,
        PropertyKind::Int32Array,
        PropertyKind::Int64Array,
        PropertyKind::Float32Array,
        PropertyKind::Float64Array,
        PropertyKind::BoolArray,
        PropertyKind::ByteArray,
    ];

    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Looks up the kind for a wire tag.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedType`] for any byte outside the tag table.
    pub fn from_tag(tag: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or(Error::UnsupportedType { tag })
    }

    /// Byte width of a scalar payload, `None` for length-prefixed kinds.
    pub const fn scalar_width(self) -> Option<usize> {
        match self {
            PropertyKind::Bool => Some(1),
            PropertyKind::Int16 => Some(2),
            PropertyKind::Int32 | PropertyKind::Float32 => Some(4),
            PropertyKind::Int64 | PropertyKind::Float64 => Some(8),
            _ => None,
        }
    }

    /// Byte width of one array element, `None` for non-array kinds.
    pub const fn array_element_width(self) -> Option<usize> {
        match self {
            PropertyKind::BoolArray | PropertyKind::ByteArray => Some(1),
            PropertyKind::Int32Array | PropertyKind::Float32Array => Some(4),
            PropertyKind::Int64Array | PropertyKind::Float64Array => Some(8),
            _ => None,
        }
    }

    pub const fn is_array(self) -> bool {
        self.array_element_width().is_some()
    }
}

#[derive(Clone, Debug, PartialEq)]
/// A decoded property value.
///
/// The set of kinds is closed: every conversion over property values is an
/// exhaustive `match`, so a new kind shows up as a compile error rather than
/// a runtime fallback.
pub enum PropertyValue {
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bytes(Vec<u8>),
    /// Raw text bytes. Text encoding is the caller's business.
    String(Vec<u8>),
    Int32Array(Vec<i32>),
    Int64Array(Vec<i64>),
    Float32Array(Vec<f32>),
    Float64Array(Vec<f64>),
    BoolArray(Vec<bool>),
    ByteArray(Vec<u8>),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Int16(_) => PropertyKind::Int16,
            PropertyValue::Int32(_) => PropertyKind::Int32,
            PropertyValue::Int64(_) => PropertyKind::Int64,
            PropertyValue::Float32(_) => PropertyKind::Float32,
            PropertyValue::Float64(_) => PropertyKind::Float64,
            PropertyValue::Bytes(_) => PropertyKind::Bytes,
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Int32Array(_) => PropertyKind::Int32Array,
            PropertyValue::Int64Array(_) => PropertyKind::Int64Array,
            PropertyValue::Float32Array(_) => PropertyKind::Float32Array,
            PropertyValue::Float64Array(_) => PropertyKind::Float64Array,
            PropertyValue::BoolArray(_) => PropertyKind::BoolArray,
            PropertyValue::ByteArray(_) => PropertyKind::ByteArray,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A property in its final wire form: kind tag plus encoded payload.
///
/// The payload is produced when the property is added to an [`Element`], so
/// the writer only ever copies bytes.
pub struct Property {
    kind: PropertyKind,
    payload: Vec<u8>,
}

impl Property {
    pub(crate) fn from_parts(kind: PropertyKind, payload: Vec<u8>) -> Self {
        Property { kind, payload }
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Encoded payload, without the tag byte.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Bytes this property occupies in a record: tag byte plus payload.
    pub fn encoded_len(&self) -> usize {
        1 + self.payload.len()
    }

    /// Decodes the payload back into a value.
    pub fn value(&self) -> Result<PropertyValue> {
        property::decode(self.kind, &self.payload)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// A node of the element tree.
///
/// An element owns an identifier of at most 255 bytes, its properties in
/// insertion order and its children in insertion order. Offsets are not
/// stored here; they are computed per encode into a
/// [`Layout`](crate::io::Layout) side table.
pub struct Element {
    id: Vec<u8>,
    properties: Vec<Property>,
    children: Vec<Element>,
}

impl Element {
    /// Creates an element with the given identifier.
    ///
    /// # Errors
    /// Returns [`Error::IdentifierTooLong`] when the identifier does not fit
    /// a single length byte.
    pub fn new(id: impl Into<Vec<u8>>) -> Result<Self> {
        let id = id.into();
        if id.len() > MAX_IDENTIFIER_LENGTH {
            return Err(Error::IdentifierTooLong { len: id.len() });
        }
        Ok(Element {
            id,
            properties: Vec::new(),
            children: Vec::new(),
        })
    }

    /// The synthetic root. Only its children are ever serialized.
    pub fn root() -> Self {
        Element::default()
    }

    pub fn id(&self) -> &[u8] {
        &self.id
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// True when the element carries neither properties nor children.
    pub fn is_bare(&self) -> bool {
        self.properties.is_empty() && self.children.is_empty()
    }

    /// Appends a child and returns a reference to it.
    pub fn add_child(&mut self, child: Element) -> &mut Element {
        let index = self.children.len();
        self.children.push(child);
        &mut self.children[index]
    }

    /// Encodes `value` and appends it as a property.
    ///
    /// # Errors
    /// Returns [`Error::PayloadTooLarge`] when a length or count does not fit
    /// its 32-bit wire field.
    pub fn add_value(&mut self, value: PropertyValue) -> Result<&mut Self> {
        let property = property::encode(&value)?;
        self.properties.push(property);
        Ok(self)
    }

    /// Like [`Element::add_value`], but first checks the value against a
    /// kind the caller got from elsewhere (e.g. a tag read from a stream).
    pub fn add_typed(&mut self, kind: PropertyKind, value: PropertyValue) -> Result<&mut Self> {
        if value.kind() != kind {
            return Err(Error::KindMismatch {
                expected: kind,
                found: value.kind(),
            });
        }
        self.add_value(value)
    }

    pub(crate) fn push_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn add_bool(&mut self, data: bool) -> &mut Self {
        self.properties.push(property::encode_bool(data));
        self
    }

    pub fn add_int16(&mut self, data: i16) -> &mut Self {
        self.properties.push(property::encode_int16(data));
        self
    }

    pub fn add_int32(&mut self, data: i32) -> &mut Self {
        self.properties.push(property::encode_int32(data));
        self
    }

    pub fn add_int64(&mut self, data: i64) -> &mut Self {
        self.properties.push(property::encode_int64(data));
        self
    }

    pub fn add_float32(&mut self, data: f32) -> &mut Self {
        self.properties.push(property::encode_float32(data));
        self
    }

    pub fn add_float64(&mut self, data: f64) -> &mut Self {
        self.properties.push(property::encode_float64(data));
        self
    }

    pub fn add_bytes(&mut self, data: &[u8]) -> Result<&mut Self> {
        self.properties.push(property::encode_blob(PropertyKind::Bytes, data)?);
        Ok(self)
    }

    /// Appends a string property from raw bytes.
    pub fn add_string(&mut self, data: &[u8]) -> Result<&mut Self> {
        self.properties.push(property::encode_blob(PropertyKind::String, data)?);
        Ok(self)
    }

    /// Appends a string property from host text, stored as its UTF-8 bytes.
    pub fn add_string_unicode(&mut self, data: &str) -> Result<&mut Self> {
        self.add_string(data.as_bytes())
    }

    pub fn add_int32_array(&mut self, data: &[i32]) -> Result<&mut Self> {
        self.properties.push(property::encode_int32_array(data)?);
        Ok(self)
    }

    pub fn add_int64_array(&mut self, data: &[i64]) -> Result<&mut Self> {
        self.properties.push(property::encode_int64_array(data)?);
        Ok(self)
    }

    pub fn add_float32_array(&mut self, data: &[f32]) -> Result<&mut Self> {
        self.properties.push(property::encode_float32_array(data)?);
        Ok(self)
    }

    pub fn add_float64_array(&mut self, data: &[f64]) -> Result<&mut Self> {
        self.properties.push(property::encode_float64_array(data)?);
        Ok(self)
    }

    pub fn add_bool_array(&mut self, data: &[bool]) -> Result<&mut Self> {
        self.properties.push(property::encode_bool_array(data)?);
        Ok(self)
    }

    pub fn add_byte_array(&mut self, data: &[u8]) -> Result<&mut Self> {
        self.properties.push(property::encode_byte_array(data)?);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_boundary() {
        assert!(Element::new(vec![b'a'; 255]).is_ok());
        assert!(matches!(
            Element::new(vec![b'a'; 256]),
            Err(Error::IdentifierTooLong { len: 256 })
        ));
    }

    #[test]
    fn tag_table_is_closed() {
        for kind in PropertyKind::ALL {
            assert_eq!(PropertyKind::from_tag(kind.tag()).unwrap(), kind);
        }
        assert!(matches!(
            PropertyKind::from_tag(b'Z'),
            Err(Error::UnsupportedType { tag: b'Z' })
        ));
    }

    #[test]
    fn add_typed_rejects_mismatched_kind() {
        let mut element = Element::new("Version").unwrap();
        let err = element
            .add_typed(PropertyKind::Int32, PropertyValue::Float64(1.5))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::KindMismatch {
                expected: PropertyKind::Int32,
                found: PropertyKind::Float64
            }
        ));
        assert!(element.properties().is_empty());

        element
            .add_typed(PropertyKind::Int32, PropertyValue::Int32(7400))
            .unwrap();
        assert_eq!(element.properties()[0].value().unwrap(), PropertyValue::Int32(7400));
    }

    #[test]
    fn payload_is_final_when_added() {
        let mut element = Element::new("Test").unwrap();
        element.add_int32(42).add_bool(true);
        element.add_string_unicode("Model").unwrap();

        let props = element.properties();
        assert_eq!(props[0].kind(), PropertyKind::Int32);
        assert_eq!(props[0].payload(), &[0x2A, 0, 0, 0]);
        assert_eq!(props[1].payload(), &[1]);
        assert_eq!(props[2].payload(), b"\x05\0\0\0Model");
        assert_eq!(props[2].encoded_len(), 10);
    }

    #[test]
    fn add_child_returns_the_child() {
        let mut root = Element::root();
        root.add_child(Element::new("Objects").unwrap())
            .add_child(Element::new("Model").unwrap())
            .add_int64(1);
        assert_eq!(root.children()[0].children()[0].id(), b"Model");
        assert!(!root.children()[0].is_bare());

        root.add_child(Element::new("Connections").unwrap()).add_int32(7);
        assert_eq!(root.children()[1].id(), b"Connections");
        assert_eq!(root.children()[1].properties().len(), 1);
        assert_eq!(root.children()[0].properties().len(), 0);
    }
}
