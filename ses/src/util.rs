// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Helper functions

use core::fmt;

/// Reads from a borrowed input buffer, bounds checked
///
/// Read methods return `None` when too few bytes remain. Nothing is
/// consumed in that case.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    s: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    /// Constructs a new `SliceReader`
    pub fn new(s: &'a [u8]) -> Self {
        Self { s, pos: 0 }
    }

    /// Returns the current offset from the start of the buffer
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes left to read
    pub fn remaining(&self) -> usize {
        self.s.len() - self.pos
    }

    /// Returns `true` when no bytes remain
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Takes the next `n` bytes
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let t = self.s.get(self.pos..end)?;
        self.pos = end;
        Some(t)
    }

    /// Takes the next `N` bytes as an array
    pub fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let t = self.s.get(self.pos..)?.get(..N)?;
        let a = t.try_into().ok()?;
        self.pos += N;
        Some(a)
    }

    /// Skips `n` bytes
    pub fn skip(&mut self, n: usize) -> Option<()> {
        self.take(n).map(|_| ())
    }

    /// Reads a `u8`
    pub fn read_u8(&mut self) -> Option<u8> {
        self.take_array::<1>().map(|b| b[0])
    }

    /// Reads a `u32`, big-endian
    pub fn read_be32(&mut self) -> Option<u32> {
        self.take_array().map(u32::from_be_bytes)
    }
}

/// Writes into a borrowed mutable output buffer
///
/// Push methods return `Some(usize)` length on success, `None` on failure.
pub struct SliceWriter<'a> {
    s: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    /// Constructs a new `SliceWriter`
    pub fn new(s: &'a mut [u8]) -> Self {
        Self { s, pos: 0 }
    }

    /// Returns the number of bytes written
    pub fn written(&self) -> usize {
        debug_assert!(self.pos <= self.s.len());
        self.pos
    }

    /// Pushes the provided slice into the output buffer
    #[must_use]
    pub fn push(&mut self, s: &[u8]) -> Option<usize> {
        let out = self.s.get_mut(self.pos..)?.get_mut(..s.len())?;
        out.copy_from_slice(s);
        self.pos += s.len();
        Some(s.len())
    }

    /// Pushes a `u8` into the output buffer
    ///
    /// Returns the length written or `None` on insufficient space.
    #[inline]
    #[must_use]
    pub fn push_u8(&mut self, v: u8) -> Option<usize> {
        self.push(&[v])
    }

    /// Pushes a `u16` into the output buffer, big-endian
    ///
    /// Returns the length written or `None` on insufficient space.
    #[inline]
    #[must_use]
    pub fn push_be16(&mut self, v: u16) -> Option<usize> {
        self.push(&v.to_be_bytes())
    }
}

/// Helper for converting `Option::None` to `SesError::NoSpace`
///
/// `SliceWriter` returns `None` on failure. This trait converts
/// that failure to a `SesError::NoSpace` for brevity.
pub trait NoneNoSpace<S> {
    /// Returns `SesError::NoSpace` on failure
    fn space(self) -> crate::Result<S>;
}

impl<S> NoneNoSpace<S> for Option<S> {
    fn space(self) -> crate::Result<S> {
        self.ok_or(crate::SesError::NoSpace)
    }
}

/// Helper for converting `Option::None` to `SesError::Truncated`
///
/// The `SliceReader` counterpart of [`NoneNoSpace`].
pub trait NoneTruncated<S> {
    /// Returns `SesError::Truncated` on failure
    fn truncated(self) -> crate::Result<S>;
}

impl<S> NoneTruncated<S> for Option<S> {
    fn truncated(self) -> crate::Result<S> {
        self.ok_or(crate::SesError::Truncated)
    }
}

/// Formats hex plus printable ascii on a single line, for logging
pub struct HexFmt<'a>(pub &'a [u8]);

impl fmt::Debug for HexFmt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x?}  ", self.0)?;
        for c in self.0 {
            if c.is_ascii() && !c.is_ascii_control() {
                write!(f, "{}", char::from(*c))?;
            } else {
                write!(f, ".")?;
            }
        }
        Ok(())
    }
}

/// Formats a hex dump, 16 bytes per line with offsets and ascii
///
/// ```text
///  00     01 02 03 04 05 06 07 08  09 0a 0b 0c 0d 0e 0f 10    ................
/// ```
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chunk) in self.0.chunks(16).enumerate() {
            write!(f, " {:02x}    ", i * 16)?;
            for k in 0..16 {
                if k == 8 {
                    f.write_str(" ")?;
                }
                match chunk.get(k) {
                    Some(b) => write!(f, " {b:02x}")?,
                    None => f.write_str("   ")?,
                }
            }
            f.write_str("    ")?;
            for c in chunk {
                if c.is_ascii() && !c.is_ascii_control() {
                    write!(f, "{}", char::from(*c))?;
                } else {
                    f.write_str(".")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Formats bare hex bytes, 16 per line
///
/// The output can be read back as a hex literal.
pub struct HexLiteral<'a>(pub &'a [u8]);

impl fmt::Display for HexLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.0.chunks(16) {
            let mut first = true;
            for b in chunk {
                if !first {
                    f.write_str(" ")?;
                }
                first = false;
                write!(f, "{b:02x}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
