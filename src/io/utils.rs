use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use num_traits::{FromPrimitive, PrimInt, Unsigned};
use std::io::{self, Read, Write};

use crate::io::{Error, Result};

/// Narrows a length or count into its wire integer type.
pub(crate) fn checked_len<N: PrimInt + Unsigned + FromPrimitive>(len: usize) -> Result<N> {
    N::from_usize(len).ok_or(Error::PayloadTooLarge { len })
}

macro_rules! impl_write_array {
    ($func_name:ident, $elem_type:ty, $write_fn:ident) => {
        fn $func_name<E: byteorder::ByteOrder>(
            &mut self,
            array: &[$elem_type],
        ) -> io::Result<()> {
            for &v in array {
                self.$write_fn::<E>(v)?;
            }
            Ok(())
        }
    };
}

pub trait WriteUtils: Write {
    /// Writes a 4-byte little-endian length followed by the bytes.
    fn write_blob(&mut self, data: &[u8]) -> Result<()> {
        self.write_u32::<LE>(checked_len(data.len())?)?;
        self.write_all(data)?;
        Ok(())
    }

    fn write_array_bool(&mut self, array: &[bool]) -> io::Result<()> {
        for &v in array {
            self.write_u8(v as u8)?;
        }
        Ok(())
    }

    impl_write_array!(write_array_i32, i32, write_i32);
    impl_write_array!(write_array_i64, i64, write_i64);
    impl_write_array!(write_array_f32, f32, write_f32);
    impl_write_array!(write_array_f64, f64, write_f64);
}

impl<W: Write + ?Sized> WriteUtils for W {}

pub trait ReadUtils: Read {
    fn read_array<T>(&mut self, len: usize, f: impl Fn(&mut Self) -> io::Result<T>) -> Result<Vec<T>> {
        let mut v: Vec<T> = Vec::with_capacity(len);
        for _ in 0..len {
            v.push(f(self)?);
        }
        Ok(v)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<R: Read + ?Sized> ReadUtils for R {}

/// Write adapter that tracks how many bytes went through it.
///
/// The writer checks every element's end offset against this position, so
/// it works on any sink, not only seekable files.
pub struct PositionWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> PositionWriter<W> {
    pub fn new(inner: W) -> Self {
        PositionWriter { inner, position: 0 }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for PositionWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
