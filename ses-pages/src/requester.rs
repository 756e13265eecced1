// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Fetching and decoding pages through a [`DiagTransport`].

#[allow(unused)]
use log::{debug, error, info, trace, warn};

use ses::{
    receive_page, send_page, DiagTransport, PageCode, RawPage, Result,
    SesError, DEFAULT_MAX_RESPONSE,
};

use num_traits::FromPrimitive;

use crate::config::{Configuration, ElementMap};
use crate::control::ControlRequest;
use crate::descriptor::{
    decode_element_descriptors, decode_subenclosure_page, DescriptorPage,
    SubenclosurePage,
};
use crate::device::{decode_device_elements, DeviceElementPage};
use crate::status::{decode_status, StatusPage};
use crate::supported::decode_supported;
use crate::threshold::{decode_threshold, ThresholdPage};

/// Request limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Allocation length requested from the transport
    pub max_response_len: usize,
    /// Most element types accepted from a Configuration page
    pub max_element_types: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_response_len: DEFAULT_MAX_RESPONSE,
            max_element_types: 512,
        }
    }
}

/// A decoded page
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    SupportedPages(Vec<u8>),
    Configuration(Configuration),
    EnclosureStatus(StatusPage),
    /// Primary subenclosure help text
    HelpText(Vec<u8>),
    /// Primary subenclosure string in
    StringIn(Vec<u8>),
    Threshold(ThresholdPage),
    ElementDescriptor(DescriptorPage),
    ShortEnclosureStatus(u8),
    EnclosureBusy {
        busy: bool,
        vendor: u8,
    },
    DeviceElementStatus(DeviceElementPage),
    SubenclosureHelpText(SubenclosurePage),
    SubenclosureString(SubenclosurePage),
    SupportedSesPages(Vec<u8>),
    /// No decoder for this page code
    Undecoded,
}

/// A fetched page, as received and decoded
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub raw: RawPage,
    /// The element map the page was decoded against, for element-keyed
    /// pages
    pub map: Option<ElementMap>,
    pub page: Page,
}

/// Returns `true` for pages that can only be decoded against an element
/// map.
pub fn is_element_keyed(page_code: u8) -> bool {
    matches!(
        PageCode::from_u8(page_code),
        Some(
            PageCode::EnclosureStatus
                | PageCode::Threshold
                | PageCode::ElementDescriptor
                | PageCode::DeviceElementStatus
        )
    )
}

/// Fetches the Configuration page and parses its element map.
pub fn fetch_element_map(
    comm: &mut impl DiagTransport,
    limits: &Limits,
) -> Result<ElementMap> {
    let page = receive_page(
        comm,
        PageCode::Configuration as u8,
        limits.max_response_len,
    )?;
    let map = ElementMap::parse(&page, limits.max_element_types)?;
    debug!(
        "element map: {} types, generation 0x{:x}",
        map.headers().len(),
        map.generation()
    );
    Ok(map)
}

/// Fetches a page without decoding it.
pub fn fetch_raw(
    comm: &mut impl DiagTransport,
    page_code: u8,
    limits: &Limits,
) -> Result<RawPage> {
    debug!("fetch page 0x{page_code:02x}");
    receive_page(comm, page_code, limits.max_response_len)
}

/// Decodes an already fetched page.
///
/// `map` is required for element-keyed pages, it must come from a
/// Configuration page fetched before `raw`.
pub fn decode_page(
    raw: &RawPage,
    map: Option<&ElementMap>,
    limits: &Limits,
) -> Result<Page> {
    let Some(code) = PageCode::from_u8(raw.page_code()) else {
        return Ok(Page::Undecoded);
    };

    let need_map = || map.ok_or(SesError::NoElementMap(raw.page_code()));

    Ok(match code {
        PageCode::SupportedPages => {
            Page::SupportedPages(decode_supported(raw))
        }
        PageCode::Configuration => Page::Configuration(Configuration::parse(
            raw,
            limits.max_element_types,
        )?),
        PageCode::EnclosureStatus => {
            Page::EnclosureStatus(decode_status(raw, need_map()?)?)
        }
        PageCode::HelpText => Page::HelpText(raw.payload().to_vec()),
        PageCode::String => Page::StringIn(raw.payload().to_vec()),
        PageCode::Threshold => {
            Page::Threshold(decode_threshold(raw, need_map()?)?)
        }
        PageCode::ElementDescriptor => Page::ElementDescriptor(
            decode_element_descriptors(raw, need_map()?)?,
        ),
        PageCode::ShortEnclosureStatus => {
            Page::ShortEnclosureStatus(raw.byte1())
        }
        PageCode::EnclosureBusy => Page::EnclosureBusy {
            busy: raw.byte1() & 0x01 != 0,
            vendor: raw.byte1() >> 1,
        },
        PageCode::DeviceElementStatus => Page::DeviceElementStatus(
            decode_device_elements(raw, need_map()?)?,
        ),
        PageCode::SubenclosureHelpText => {
            Page::SubenclosureHelpText(decode_subenclosure_page(raw)?)
        }
        PageCode::SubenclosureString => {
            Page::SubenclosureString(decode_subenclosure_page(raw)?)
        }
        PageCode::SupportedSesPages => {
            Page::SupportedSesPages(decode_supported(raw))
        }
        PageCode::ArrayStatus
        | PageCode::SasProtocolSpecific
        | PageCode::TranslateAddress
        | PageCode::DeviceStatus => Page::Undecoded,
    })
}

/// Fetches and decodes a page.
///
/// For element-keyed pages a fresh Configuration page is fetched first.
/// The target page is only decoded if its generation code matches,
/// otherwise [`SesError::Stale`] is returned and the caller may retry.
pub fn fetch_page(
    comm: &mut impl DiagTransport,
    page_code: u8,
    limits: &Limits,
) -> Result<Fetched> {
    let map = if is_element_keyed(page_code) {
        Some(fetch_element_map(comm, limits)?)
    } else {
        None
    };

    let raw = fetch_raw(comm, page_code, limits)?;
    if let Some(map) = &map {
        map.check_generation(&raw)?;
    }

    let page = decode_page(&raw, map.as_ref(), limits)?;
    Ok(Fetched { raw, map, page })
}

/// Sends a control page.
pub fn send_control(
    comm: &mut impl DiagTransport,
    req: &ControlRequest,
) -> Result<()> {
    debug!(
        "send {} page, length {}",
        req.page.name(),
        req.payload().len()
    );
    let page = req.encode()?;
    send_page(comm, &page)
}
