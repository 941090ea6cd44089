use std::{
    io::{Read, Write},
    path::Path,
};

pub(crate) mod property;
mod read;
mod types;
mod utils;
mod write;

use thiserror::Error;
use crate::structs::{Element, PropertyKind};

pub use property::{array_encoding, ENCODING_RAW, ENCODING_ZLIB};
pub use read::{Document, MAX_DEPTH};
pub use types::{size, ElementLayout, Layout};
pub use utils::{PositionWriter, ReadUtils, WriteUtils};
pub use write::{write_document, write_file, EmptyFooter, Footer, ReferenceFooter, WriteOptions};

pub type Result<T> = std::result::Result<T, Error>;

/// File signature, including its terminating NUL.
pub const MAGIC: &[u8; 21] = b"Kaydara FBX Binary  \0";
/// Two bytes that always follow the signature.
pub const MAGIC_MARKER: [u8; 2] = [0x1A, 0x00];
/// Offset of the first element record.
pub const BODY_OFFSET: u64 = 21 + 2 + 4;

/// End offset, property count and property length.
pub const RECORD_HEADER_LENGTH: usize = 12;
pub const SENTINEL_LENGTH: usize = 13;
pub const SENTINEL: [u8; SENTINEL_LENGTH] = [0; SENTINEL_LENGTH];
pub const MAX_IDENTIFIER_LENGTH: usize = u8::MAX as usize;

/// Arrays whose raw bytes exceed this are zlib-compressed.
pub const ARRAY_COMPRESSION_THRESHOLD: usize = 128;
pub const ARRAY_COMPRESSION_LEVEL: u32 = 1;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Identifier is {len} bytes long, at most 255 are allowed.")]
    IdentifierTooLong {
        len: usize
    },
    #[error("Expected a {expected:?} value, got {found:?}.")]
    KindMismatch {
        expected: PropertyKind,
        found: PropertyKind
    },
    #[error("Length {len} does not fit its wire field.")]
    PayloadTooLarge {
        len: usize
    },
    #[error("An element with properties or children has an empty identifier.")]
    EmptyIdentifier,
    #[error("The root element must have an empty identifier and no properties.")]
    InvalidRoot,
    #[error("Offset {offset} does not fit a 32-bit record field.")]
    OffsetOverflow {
        offset: u64
    },
    #[error("Element has no computed layout.")]
    MissingLayout,
    #[error("Element {id:?} ended at {actual}, layout expected {expected}.")]
    PositionMismatch {
        id: String,
        expected: u64,
        actual: u64
    },
    #[error("Property type tag {tag:#04x} is not supported.")]
    UnsupportedType {
        tag: u8
    },
    #[error("Missing FBX binary signature.")]
    InvalidMagic,
    #[error("Corrupt data: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors raised while authoring or planning a tree, before any
    /// byte is written.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::IdentifierTooLong { .. }
                | Error::KindMismatch { .. }
                | Error::PayloadTooLarge { .. }
                | Error::EmptyIdentifier
                | Error::InvalidRoot
                | Error::OffsetOverflow { .. }
        )
    }

    /// True when the writer's output drifted from the precomputed layout.
    pub fn is_consistency(&self) -> bool {
        matches!(self, Error::PositionMismatch { .. } | Error::MissingLayout)
    }
}

/// Trait for writing an element tree as an FBX binary stream.
///
/// The children of `root` are written as the top-level records; `root`
/// itself must have an empty identifier and no properties.
///
/// # Example
/// ```rust
/// use fbxbin::structs::Element;
/// use fbxbin::io::WriteFbx;
///
/// let mut root = Element::root();
/// root.add_child(Element::new("FileId").unwrap())
///     .add_bytes(&[0; 16])
///     .unwrap();
///
/// let mut buffer = Vec::new();
/// buffer.write_fbx(&root, 7400).unwrap();
/// ```
///
/// # Partial Writes
/// A consistency failure stops writing immediately, but bytes already
/// emitted stay in the stream. Use [`write_file`] for all-or-nothing output.
pub trait WriteFbx: Write {
    /// Writes the tree with the default options and returns the number of
    /// bytes written.
    fn write_fbx(&mut self, root: &Element, version: u32) -> Result<u64> {
        write_document(self, root, version, &WriteOptions::default())
    }

    fn write_fbx_with(&mut self, root: &Element, version: u32, options: &WriteOptions) -> Result<u64> {
        write_document(self, root, version, options)
    }
}

impl<W: Write + ?Sized> WriteFbx for W {}

/// Trait for reading an FBX binary stream back into an element tree.
///
/// # Example
/// ```rust
/// use fbxbin::structs::Element;
/// use fbxbin::io::{ReadFbx, WriteFbx};
///
/// let mut root = Element::root();
/// root.add_child(Element::new("Creator").unwrap())
///     .add_string_unicode("fbxbin")
///     .unwrap();
///
/// let mut buffer = Vec::new();
/// buffer.write_fbx(&root, 7400).unwrap();
///
/// let document = (&buffer[..]).read_fbx().unwrap();
/// assert_eq!(document.version, 7400);
/// assert_eq!(document.root, root);
/// ```
pub trait ReadFbx: Read {
    /// Reads the whole stream and decodes it.
    ///
    /// # Errors
    /// Returns an error for a missing signature, an unknown property tag or
    /// records whose offsets do not add up.
    fn read_fbx(&mut self) -> Result<Document> {
        let mut data = Vec::new();
        self.read_to_end(&mut data)?;
        Document::from_bytes(&data)
    }
}

impl<R: Read + ?Sized> ReadFbx for R {}

/// Reads and decodes an FBX binary file.
pub fn read_file(path: impl AsRef<Path>) -> Result<Document> {
    let data = std::fs::read(path)?;
    Document::from_bytes(&data)
}
