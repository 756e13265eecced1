// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * SES diagnostic page common types and traits.
 *
 * Copyright (c) 2025 Code Construct
 */

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # SCSI Enclosure Services (SES) diagnostic pages
//!
//! This crate provides the common framing, error and transport types for
//! exchanging SES diagnostic pages with an enclosure services process.
//!
//! Transport implementations implement [`DiagTransport`], which carries the
//! SEND DIAGNOSTIC and RECEIVE DIAGNOSTIC RESULTS exchanges. Building the
//! command descriptor block and interpreting sense data is left to the
//! transport; this crate only sees complete pages.

#[allow(unused)]
use log::{debug, error, info, trace, warn};

use deku::{DekuContainerRead, DekuRead, DekuWrite};
use num_derive::FromPrimitive;
use thiserror::Error;

pub mod util;

use util::{HexFmt, NoneTruncated, SliceReader};

/// Default allocation length for a received page.
///
/// Enclosures may return larger pages, those are clamped to the buffer.
pub const DEFAULT_MAX_RESPONSE: usize = 4096;

/// Diagnostic page codes
#[allow(missing_docs)]
#[derive(
    FromPrimitive, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy,
)]
#[repr(u8)]
pub enum PageCode {
    SupportedPages = 0x00,
    Configuration = 0x01,
    EnclosureStatus = 0x02,
    HelpText = 0x03,
    String = 0x04,
    Threshold = 0x05,
    ArrayStatus = 0x06,
    ElementDescriptor = 0x07,
    ShortEnclosureStatus = 0x08,
    EnclosureBusy = 0x09,
    DeviceElementStatus = 0x0a,
    SubenclosureHelpText = 0x0b,
    SubenclosureString = 0x0c,
    SupportedSesPages = 0x0d,
    SasProtocolSpecific = 0x3f,
    TranslateAddress = 0x40,
    DeviceStatus = 0x41,
}

/// A transport failure
///
/// The options here capture typical transport failures. Errors that are
/// platform-specific are reported through `Other` and `Io`; the page codec
/// never looks inside them.
#[derive(Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// Failure in transmit path, typically transport-specific
    TxFailure,
    /// Failure in receive path, typically transport-specific
    RxFailure,
    /// Timed out waiting for the enclosure
    TimedOut,
    /// Bad argument
    BadArgument,
    /// Provided buffer is too small
    NoSpace,
    /// Operation is unsupported
    Unsupported,
    /// Other error type
    Other,
    /// IO error from the transport binding
    Io(std::io::Error),
}

impl std::error::Error for TransportError {}

impl core::fmt::Display for TransportError {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Io(i) => write!(fmt, "SES transport IO error: {}", i),
            _ => write!(fmt, "SES transport error: {:?}", self),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Transport result type
pub type TransportResult<T> = core::result::Result<T, TransportError>;

/// A channel to an enclosure services process.
///
/// This is the only collaborator the page codec needs: one operation to
/// send a complete outgoing page, one to fetch a page by code.
pub trait DiagTransport {
    /// Send a diagnostic page to the enclosure, blocking.
    ///
    /// The slice of buffers is sent as a single page (as if concatenated),
    /// which lets callers send a header and payload without copying.
    fn send_vectored(&mut self, bufs: &[&[u8]]) -> TransportResult<()>;

    /// Send a diagnostic page to the enclosure, blocking.
    ///
    /// Transport implementations will typically use the trait provided
    /// method that calls [`send_vectored`](Self::send_vectored).
    fn send(&mut self, page: &[u8]) -> TransportResult<()> {
        self.send_vectored(&[page])
    }

    /// Fetch a diagnostic page, blocking.
    ///
    /// `page_code` selects the page, the length of `buf` is the allocation
    /// length. Returns the filled part of `buf`. The enclosure may return a
    /// different page than the one requested; that is not a transport
    /// failure.
    fn recv<'f>(
        &mut self,
        page_code: u8,
        buf: &'f mut [u8],
    ) -> TransportResult<&'f mut [u8]>;
}

impl<T: DiagTransport + ?Sized> DiagTransport for &mut T {
    fn send_vectored(&mut self, bufs: &[&[u8]]) -> TransportResult<()> {
        (**self).send_vectored(bufs)
    }

    fn recv<'f>(
        &mut self,
        page_code: u8,
        buf: &'f mut [u8],
    ) -> TransportResult<&'f mut [u8]> {
        (**self).recv(page_code, buf)
    }
}

/// Diagnostic page codec error
#[derive(Error, Debug)]
pub enum SesError {
    /// The page is shorter than a structure it declares
    #[error("response too short")]
    Truncated,
    /// The page was produced for a different enclosure configuration
    #[error(
        "state of enclosure changed (generation code 0x{expected:x}, \
         page has 0x{found:x}), please try again"
    )]
    Stale {
        /// Generation code of the element map
        expected: u32,
        /// Generation code found in the page
        found: u32,
    },
    /// Element type code outside the known range
    #[error("unknown element type 0x{0:02x}")]
    UnknownType(u8),
    /// Page code that can't be sent as a control page
    #[error("setting control page 0x{0:02x} is not supported")]
    UnsupportedControlPage(u8),
    /// Configuration declares more element types than allowed
    #[error("too many element types ({count}, limit {max})")]
    TooManyElements {
        /// Number of element types declared
        count: usize,
        /// Configured limit
        max: usize,
    },
    /// The enclosure returned a different page than requested
    #[error(
        "invalid response, wanted page code 0x{wanted:02x} but got \
         0x{got:02x}"
    )]
    PageMismatch {
        /// Requested page code
        wanted: u8,
        /// Returned page code
        got: u8,
    },
    /// The enclosure returned the Enclosure Busy page
    #[error("enclosure busy, try again later")]
    EnclosureBusy {
        /// Vendor specific bits of the busy page
        vendor: u8,
    },
    /// The enclosure returned the Short Enclosure Status page
    #[error("enclosure only supports short enclosure status: 0x{0:02x}")]
    ShortStatusOnly(u8),
    /// An element-keyed page was decoded without an element map
    #[error("page 0x{0:02x} needs an element map to decode")]
    NoElementMap(u8),
    /// Payload does not fit the 16-bit page length
    #[error("control page payload too long ({0} bytes)")]
    PayloadTooLong(usize),
    /// Output buffer too small
    #[error("output buffer too small")]
    NoSpace,
    /// Fixed layout could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] deku::DekuError),
    /// Transport failure, passed through
    #[error("transport failure")]
    Transport(#[from] TransportError),
}

impl SesError {
    /// Returns `true` when repeating the whole request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Stale { .. } | Self::EnclosureBusy { .. })
    }
}

/// SES codec result type
pub type Result<T> = std::result::Result<T, SesError>;

/// Common header of every diagnostic page.
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
#[deku(endian = "big")]
pub struct PageHeader {
    /// Page code
    pub page_code: u8,
    /// Page specific byte 1
    pub byte1: u8,
    /// Length of the page following the header
    pub length: u16,
}

impl PageHeader {
    /// Encoded length
    pub const LEN: usize = 4;

    /// Decode the header at the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let hdr = bytes.get(..Self::LEN).truncated()?;
        let (_, h) = Self::from_bytes((hdr, 0))?;
        Ok(h)
    }

    /// Length of the page including this header.
    pub fn total_len(&self) -> usize {
        Self::LEN + usize::from(self.length)
    }
}

/// A received diagnostic page, header included.
///
/// The page never extends past its declared length, nor past the bytes
/// that were actually received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    header: PageHeader,
    bytes: Vec<u8>,
}

impl RawPage {
    /// Frame a page from received bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = PageHeader::decode(data)?;
        let declared = header.total_len();
        let len = if declared > data.len() {
            warn!(
                "response shorter than declared page length [{} but need {}]",
                data.len(),
                declared
            );
            data.len()
        } else {
            declared
        };
        Ok(Self {
            header,
            bytes: data[..len].to_vec(),
        })
    }

    /// Page header
    pub fn header(&self) -> &PageHeader {
        &self.header
    }

    /// Page code
    pub fn page_code(&self) -> u8 {
        self.header.page_code
    }

    /// Page specific byte 1
    pub fn byte1(&self) -> u8 {
        self.header.byte1
    }

    /// The whole page, header included
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The page following the 4-byte header
    pub fn payload(&self) -> &[u8] {
        &self.bytes[PageHeader::LEN..]
    }

    /// Returns `true` if fewer bytes were received than the header declares.
    pub fn is_clamped(&self) -> bool {
        self.bytes.len() < self.header.total_len()
    }

    /// Generation code, the big-endian `u32` at offset 4.
    ///
    /// Present in the Configuration page and every element-keyed page.
    pub fn generation(&self) -> Result<u32> {
        let mut r = SliceReader::new(&self.bytes);
        r.skip(PageHeader::LEN).truncated()?;
        r.read_be32().truncated()
    }
}

/// Fetch a diagnostic page.
///
/// `max_len` is the allocation length offered to the transport. A returned
/// page with a different page code is reported as an error, with the
/// Enclosure Busy and Short Enclosure Status pages told apart.
pub fn receive_page(
    comm: &mut impl DiagTransport,
    page_code: u8,
    max_len: usize,
) -> Result<RawPage> {
    let mut rx = vec![0u8; max_len];
    let data = comm.recv(page_code, &mut rx)?;
    trace!("rx page 0x{page_code:02x} {:?}", HexFmt(data));

    let page = RawPage::parse(data)?;
    let got = page.page_code();
    if got == page_code {
        return Ok(page);
    }

    if got == PageCode::EnclosureBusy as u8 && page.byte1() & 0x01 != 0 {
        Err(SesError::EnclosureBusy {
            vendor: page.byte1() >> 1,
        })
    } else if got == PageCode::ShortEnclosureStatus as u8 {
        Err(SesError::ShortStatusOnly(page.byte1()))
    } else {
        Err(SesError::PageMismatch {
            wanted: page_code,
            got,
        })
    }
}

/// Send a complete outgoing page.
pub fn send_page(comm: &mut impl DiagTransport, page: &[u8]) -> Result<()> {
    trace!("tx page {:?}", HexFmt(page));
    comm.send(page)?;
    Ok(())
}
