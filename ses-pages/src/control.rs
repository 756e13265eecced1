// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Outgoing control pages.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use ses::util::{NoneNoSpace, SliceWriter};
use ses::{PageHeader, Result, SesError};

/// Pages that can be sent to the enclosure
#[allow(missing_docs)]
#[derive(FromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum ControlPage {
    EnclosureControl = 0x02,
    StringOut = 0x04,
    ThresholdOut = 0x05,
    /// Obsolete
    ArrayControl = 0x06,
    SubenclosureStringOut = 0x0c,
}

impl ControlPage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::EnclosureControl => "Enclosure control",
            Self::StringOut => "String Out",
            Self::ThresholdOut => "Threshold Out",
            Self::ArrayControl => "Array control",
            Self::SubenclosureStringOut => "Subenclosure String Out",
        }
    }
}

impl TryFrom<u8> for ControlPage {
    type Error = SesError;

    fn try_from(v: u8) -> Result<Self> {
        Self::from_u8(v).ok_or(SesError::UnsupportedControlPage(v))
    }
}

/// A control page ready to encode
#[derive(Debug, Clone)]
pub struct ControlRequest<'a> {
    pub page: ControlPage,
    pub byte1: u8,
    payload: &'a [u8],
}

impl<'a> ControlRequest<'a> {
    /// Checks the page code is a control page and the payload fits the
    /// 16-bit page length.
    pub fn new(page_code: u8, byte1: u8, payload: &'a [u8]) -> Result<Self> {
        let page = ControlPage::try_from(page_code)?;
        if payload.len() > usize::from(u16::MAX) {
            return Err(SesError::PayloadTooLong(payload.len()));
        }
        Ok(Self {
            page,
            byte1,
            payload,
        })
    }

    pub fn payload(&self) -> &[u8] {
        self.payload
    }

    fn header(&self) -> PageHeader {
        PageHeader {
            page_code: self.page as u8,
            byte1: self.byte1,
            // checked in new()
            length: self.payload.len() as u16,
        }
    }

    /// Total encoded length
    pub fn len(&self) -> usize {
        self.header().total_len()
    }

    /// Encodes into `buf`, returning the length written.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let hdr = self.header();
        let mut w = SliceWriter::new(buf);
        w.push_u8(hdr.page_code).space()?;
        w.push_u8(hdr.byte1).space()?;
        w.push_be16(hdr.length).space()?;
        w.push(self.payload).space()?;
        Ok(w.written())
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut v = vec![0u8; self.len()];
        let l = self.encode_into(&mut v)?;
        debug_assert_eq!(l, v.len());
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ses::RawPage;

    #[test]
    fn round_trip() {
        let payload = [0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x02, 0x20];
        for code in [0x02, 0x04, 0x05, 0x06, 0x0c] {
            let r = ControlRequest::new(code, 0x01, &payload).unwrap();
            let b = r.encode().unwrap();
            assert_eq!(b.len(), 12);
            let p = RawPage::parse(&b).unwrap();
            assert_eq!(p.page_code(), code);
            assert_eq!(p.byte1(), 0x01);
            assert_eq!(p.payload(), payload);
            assert!(!p.is_clamped());
        }
    }

    #[test]
    fn rejected() {
        for code in [0x00, 0x01, 0x03, 0x07, 0x0d, 0xff] {
            assert!(matches!(
                ControlRequest::new(code, 0, &[]),
                Err(SesError::UnsupportedControlPage(c)) if c == code
            ));
        }
        let big = vec![0u8; 0x10000];
        assert!(matches!(
            ControlRequest::new(0x02, 0, &big),
            Err(SesError::PayloadTooLong(0x10000))
        ));
    }

    #[test]
    fn no_space() {
        let r = ControlRequest::new(0x04, 0, b"hello").unwrap();
        let mut buf = [0u8; 6];
        assert!(matches!(r.encode_into(&mut buf), Err(SesError::NoSpace)));
        // Not even room for the header
        let mut buf = [0u8; 3];
        assert!(matches!(r.encode_into(&mut buf), Err(SesError::NoSpace)));
        let mut buf = [0u8; 16];
        assert_eq!(r.encode_into(&mut buf).unwrap(), 9);
        assert_eq!(&buf[..9], b"\x04\x00\x00\x05hello");
    }
}
