// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Walking element-keyed pages against an element map.

#[allow(unused)]
use log::{debug, error, info, trace, warn};

use ses::util::{NoneTruncated, SliceReader};
use ses::{RawPage, Result};

use crate::config::{ElementMap, ElementTypeHeader};

/// Offset of the first record in an element-keyed page
pub const RECORDS_OFFSET: usize = 8;

/// A fixed 4-byte element record, with its decoded value
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub raw: [u8; 4],
    pub value: T,
}

/// The records for one element-type header: one overall record then one
/// per possible element.
///
/// `elements` may be shorter than `header.possible_elements` when the page
/// was truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRecords<T> {
    pub header: ElementTypeHeader,
    pub overall: T,
    pub elements: Vec<T>,
}

/// A decoded element-keyed page
#[derive(Debug, Clone, PartialEq)]
pub struct ElementPage<T> {
    /// Page header byte 1
    pub byte1: u8,
    pub generation: u32,
    pub groups: Vec<TypeRecords<T>>,
    /// The page ended before every record was read. `groups` holds the
    /// records read up to that point.
    pub truncated: bool,
}

impl<T> ElementPage<T> {
    /// Iterates every record along with its header
    pub fn iter(&self) -> impl Iterator<Item = (&ElementTypeHeader, &T)> {
        self.groups.iter().flat_map(|g| {
            core::iter::once(&g.overall)
                .chain(g.elements.iter())
                .map(move |r| (&g.header, r))
        })
    }
}

/// Walks the records of an element-keyed page.
///
/// `read` decodes a single record from the reader, returning `None` if the
/// page is too short for it. The generation code is checked first, nothing
/// is decoded on a mismatch.
pub(crate) fn walk<T, F>(
    page: &RawPage,
    map: &ElementMap,
    mut read: F,
) -> Result<ElementPage<T>>
where
    F: FnMut(&ElementTypeHeader, &mut SliceReader) -> Result<Option<T>>,
{
    map.check_generation(page)?;

    let mut r = SliceReader::new(page.as_bytes());
    r.skip(RECORDS_OFFSET).truncated()?;

    let mut groups = Vec::with_capacity(map.headers().len());
    let mut truncated = false;
    for h in map.headers() {
        let Some(overall) = read(h, &mut r)? else {
            truncated = true;
            break;
        };
        let mut group = TypeRecords {
            header: *h,
            overall,
            elements: Vec::with_capacity(usize::from(h.possible_elements)),
        };
        for _ in 0..h.possible_elements {
            match read(h, &mut r)? {
                Some(e) => group.elements.push(e),
                None => {
                    truncated = true;
                    break;
                }
            }
        }
        groups.push(group);
        if truncated {
            break;
        }
    }

    if truncated {
        warn!(
            "page 0x{:02x} too short for its element map",
            page.page_code()
        );
    } else if !r.is_empty() {
        debug!(
            "page 0x{:02x} has {} bytes past its element map",
            page.page_code(),
            r.remaining()
        );
    }

    Ok(ElementPage {
        byte1: page.byte1(),
        generation: map.generation(),
        groups,
        truncated,
    })
}

/// Walks fixed 4-byte records, decoding each with `decode`.
pub(crate) fn walk_fixed<T, F>(
    page: &RawPage,
    map: &ElementMap,
    mut decode: F,
) -> Result<ElementPage<Record<T>>>
where
    F: FnMut(&ElementTypeHeader, [u8; 4]) -> Result<T>,
{
    walk(page, map, |h, r| {
        let Some(raw) = r.take_array::<4>() else {
            return Ok(None);
        };
        Ok(Some(Record {
            raw,
            value: decode(h, raw)?,
        }))
    })
}
