use byteorder::{WriteBytesExt, LE};
use std::{
    fmt,
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};
use tracing::{debug, trace};

use crate::{
    io::{types::*, utils::*, Error, Result, BODY_OFFSET, MAGIC, MAGIC_MARKER, SENTINEL},
    structs::Element,
};

/// Writes whatever follows the top-level terminator.
///
/// The footer layout is a separate sub-protocol from the element records and
/// is not derived from them, so it is plugged in by the caller.
pub trait Footer {
    fn write_footer(&self, w: &mut dyn Write, version: u32) -> std::io::Result<()>;
}

/// Writes nothing after the terminator.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyFooter;

impl Footer for EmptyFooter {
    fn write_footer(&self, _w: &mut dyn Write, _version: u32) -> std::io::Result<()> {
        Ok(())
    }
}

/// The placeholder footer bytes of the original Python exporter.
///
/// Only the version field and the closing magic are known to be right; the
/// rest is padding and a token that real files compute differently. Use it
/// only when byte parity with that exporter matters.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceFooter;

const REFERENCE_FOOTER_TOKEN: [u8; 16] = [
    0xFA, 0xBC, 0xAB, 0x0E, 0xD7, 0xC1, 0xDD, 0x66, 0xB1, 0x77, 0xFA, 0x83, 0x1F, 0xFC, 0x28, 0x7B,
];
const REFERENCE_FOOTER_MAGIC: [u8; 4] = [0xF8, 0x5A, 0x8C, 0x6A];

impl Footer for ReferenceFooter {
    fn write_footer(&self, w: &mut dyn Write, version: u32) -> std::io::Result<()> {
        w.write_all(&[0; 32])?;
        w.write_all(&REFERENCE_FOOTER_TOKEN)?;
        w.write_all(&[0; 13])?;
        w.write_u32::<LE>(version)?;
        w.write_all(&[0; 120])?;
        w.write_all(&REFERENCE_FOOTER_MAGIC)
    }
}

/// Options for writing a document.
#[derive(Clone)]
pub struct WriteOptions {
    pub footer: Arc<dyn Footer + Send + Sync>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            footer: Arc::new(EmptyFooter),
        }
    }
}

impl fmt::Debug for WriteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteOptions").finish_non_exhaustive()
    }
}

/// Writes a complete document: signature, version, the records of `root`'s
/// children, the terminator and the footer.
///
/// Returns the number of bytes written. Record offsets are absolute, so `w`
/// is expected to be positioned at the start of the file.
pub fn write_document<W: Write + ?Sized>(
    w: &mut W,
    root: &Element,
    version: u32,
    options: &WriteOptions,
) -> Result<u64> {
    let layout = Layout::for_root(root, BODY_OFFSET)?;
    debug!(
        records = layout.elements().count(),
        bytes = layout.len(),
        "planned body"
    );

    let mut w = PositionWriter::new(w);
    w.write_all(MAGIC)?;
    w.write_all(&MAGIC_MARKER)?;
    w.write_u32::<LE>(version)?;
    debug!(version, "wrote header");

    write_body(&mut w, &layout)?;

    w.write_u32::<LE>(0)?;
    options.footer.write_footer(&mut w, version)?;
    w.flush()?;

    debug!(bytes = w.position(), "wrote document");
    Ok(w.position())
}

/// Emits the records of a measured layout.
///
/// Every element is checked against its precomputed end offset as soon as
/// its region is complete; the first mismatch stops writing.
fn write_body<W: Write>(w: &mut PositionWriter<W>, layout: &Layout) -> Result<()> {
    for step in layout.steps() {
        match *step {
            Step::Open(element) => {
                let element_layout = layout.get(element).ok_or(Error::MissingLayout)?;
                write_record_head(w, element, element_layout)?;
            }
            Step::Sentinel => w.write_all(&SENTINEL)?,
            Step::Close(element) => {
                let expected = layout.get(element).ok_or(Error::MissingLayout)?.end_offset;
                if w.position() != u64::from(expected) {
                    return Err(Error::PositionMismatch {
                        id: String::from_utf8_lossy(element.id()).into_owned(),
                        expected: expected.into(),
                        actual: w.position(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn write_record_head<W: Write>(w: &mut PositionWriter<W>, element: &Element, element_layout: &ElementLayout) -> Result<()> {
    w.write_u32::<LE>(element_layout.end_offset)?;
    w.write_u32::<LE>(checked_len(element.properties().len())?)?;
    w.write_u32::<LE>(element_layout.props_length)?;
    trace!(
        id = %String::from_utf8_lossy(element.id()),
        end = element_layout.end_offset,
        props = element.properties().len(),
        props_length = element_layout.props_length,
        "writing element"
    );

    w.write_u8(checked_len(element.id().len())?)?;
    w.write_all(element.id())?;

    for property in element.properties() {
        w.write_u8(property.kind().tag())?;
        w.write_all(property.payload())?;
    }
    Ok(())
}

/// Writes a document to `path` atomically.
///
/// The document goes to a temporary sibling file first and is renamed into
/// place once complete; on any error, the rename included, the temporary file
/// is removed and `path` is left untouched.
///
/// The temporary file is opened exclusively. If `<path>.fbx.tmp` already
/// exists the call fails with [`Error::Io`] and leaves that file alone.
pub fn write_file(path: impl AsRef<Path>, root: &Element, version: u32, options: &WriteOptions) -> Result<u64> {
    let path = path.as_ref();
    let temp_path = path.with_extension("fbx.tmp");

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    // A leftover temp file from another writer is not ours to replace.
    let file = OpenOptions::new().write(true).create_new(true).open(&temp_path)?;

    let result = write_temp(file, root, version, options).and_then(|bytes| {
        fs::rename(&temp_path, path)?;
        Ok(bytes)
    });
    match result {
        Ok(bytes) => {
            debug!(path = %path.display(), bytes, "wrote file");
            Ok(bytes)
        }
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

fn write_temp(file: File, root: &Element, version: u32, options: &WriteOptions) -> Result<u64> {
    let mut w = BufWriter::new(file);
    let bytes = write_document(&mut w, root, version, options)?;
    let file = w.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(bytes)
}
