//! # FBX Binary Element-Tree Library
//!
//! This library provides an **element tree model and an encoder/decoder** for the
//! binary FBX container used for 3D scene interchange.
//!
//! ## Disclaimer
//!
//! - This library is **not affiliated with Autodesk**.
//! - The record layout was **reverse-engineered by the community**; the footer that
//!   follows the top-level records is not fully understood and is pluggable
//!   (see [`io::Footer`]).
//! - Only the 32-bit record layout (versions below 7500) is written.
//!
//! ## Purpose
//!
//! - [`structs::Element`] is a **plain tree node**: identifier, properties, children.
//! - Properties are encoded to their wire form **as soon as they are added**.
//! - All actual I/O goes through the [`io::WriteFbx`] and [`io::ReadFbx`] traits, or
//!   [`io::write_file`] for atomic file output.
//!
//! ## Example
//! ```rust
//! use fbxbin::structs::Element;
//! use fbxbin::io::{ReadFbx, WriteFbx};
//!
//! // Build a tree
//! let mut root = Element::root();
//! let header = root.add_child(Element::new("FBXHeaderExtension").unwrap());
//! header.add_child(Element::new("FBXVersion").unwrap()).add_int32(7400);
//!
//! // Serialize it
//! let mut buffer = vec![];
//! buffer.write_fbx(&root, 7400).unwrap();
//!
//! // Deserialize it
//! let loaded = (&buffer[..]).read_fbx().unwrap();
//! assert_eq!(loaded.root, root);
//! ```

pub mod convert;
pub mod io;
pub mod structs;
