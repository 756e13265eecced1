// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Variable length text pages: Element Descriptor (0x07), Subenclosure
//! Help Text (0x0b) and Subenclosure String In (0x0c).

#[allow(unused)]
use log::{debug, error, info, trace, warn};

use deku::{DekuContainerRead, DekuRead, DekuWrite};

use ses::util::{NoneTruncated, SliceReader};
use ses::{RawPage, Result};

use crate::config::ElementMap;
use crate::records::{walk, ElementPage};

/// Element descriptor record header
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
#[deku(endian = "big")]
pub struct DescriptorHeader {
    #[deku(pad_bytes_before = "2")]
    pub length: u16,
}

impl DescriptorHeader {
    pub const LEN: usize = 4;
}

/// A decoded Element Descriptor page. Each record is the descriptor text.
pub type DescriptorPage = ElementPage<Vec<u8>>;

/// Reads one length-prefixed record. `Ok(None)` if the page ends first.
fn read_descriptor(r: &mut SliceReader) -> Result<Option<Vec<u8>>> {
    let mut peek = r.clone();
    let Some(hdr) = peek.take(DescriptorHeader::LEN) else {
        return Ok(None);
    };
    let (_, hdr) = DescriptorHeader::from_bytes((hdr, 0))?;
    let Some(text) = peek.take(usize::from(hdr.length)) else {
        return Ok(None);
    };
    *r = peek;
    Ok(Some(text.to_vec()))
}

/// Decodes an Element Descriptor page against an element map.
pub fn decode_element_descriptors(
    page: &RawPage,
    map: &ElementMap,
) -> Result<DescriptorPage> {
    walk(page, map, |_, r| read_descriptor(r))
}

/// Subenclosure text record header
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
#[deku(endian = "big")]
pub struct SubenclosureRecordHeader {
    #[deku(pad_bytes_before = "1")]
    pub subenclosure_id: u8,
    pub length: u16,
}

impl SubenclosureRecordHeader {
    pub const LEN: usize = 4;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SubenclosureText {
    pub subenclosure_id: u8,
    pub data: Vec<u8>,
}

/// A decoded Subenclosure Help Text or Subenclosure String In page
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SubenclosurePage {
    /// Number of subenclosures, primary included
    pub num_subenclosures: usize,
    pub generation: u32,
    pub records: Vec<SubenclosureText>,
    /// The page ended before every subenclosure record was read
    pub truncated: bool,
}

/// Decodes a Subenclosure Help Text or Subenclosure String In page.
///
/// Neither page depends on the element map.
pub fn decode_subenclosure_page(page: &RawPage) -> Result<SubenclosurePage> {
    let num_subenclosures = usize::from(page.byte1()) + 1;
    let generation = page.generation()?;

    let mut r = SliceReader::new(page.as_bytes());
    r.skip(8).truncated()?;

    let mut records = Vec::with_capacity(num_subenclosures);
    let mut truncated = false;
    for _ in 0..num_subenclosures {
        let Some(hdr) = r.take(SubenclosureRecordHeader::LEN) else {
            truncated = true;
            break;
        };
        let (_, hdr) = SubenclosureRecordHeader::from_bytes((hdr, 0))?;
        let Some(data) = r.take(usize::from(hdr.length)) else {
            truncated = true;
            break;
        };
        records.push(SubenclosureText {
            subenclosure_id: hdr.subenclosure_id,
            data: data.to_vec(),
        });
    }

    if truncated {
        warn!(
            "page 0x{:02x} too short for {num_subenclosures} subenclosures",
            page.page_code()
        );
    }

    Ok(SubenclosurePage {
        num_subenclosures,
        generation,
        records,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElementTypeHeader;
    use crate::records::RECORDS_OFFSET;
    use proptest::prelude::*;
    use ses::SesError;

    fn map() -> ElementMap {
        ElementMap::new(
            vec![ElementTypeHeader {
                type_code: 0x03,
                possible_elements: 2,
                subenclosure_id: 0,
            }],
            9,
        )
    }

    fn with_len(mut p: Vec<u8>) -> RawPage {
        let l = (p.len() - 4) as u16;
        p[2..4].copy_from_slice(&l.to_be_bytes());
        RawPage::parse(&p).unwrap()
    }

    #[test]
    fn element_descriptors() {
        let mut p = vec![0x07, 0, 0, 0, 0, 0, 0, 9];
        p.extend_from_slice(&[0, 0, 0, 4]);
        p.extend_from_slice(b"Fans");
        p.extend_from_slice(&[0, 0, 0, 0]);
        p.extend_from_slice(&[0xff, 0xff, 0, 5]);
        p.extend_from_slice(b"Fan 2");
        let p = with_len(p);

        let d = decode_element_descriptors(&p, &map()).unwrap();
        assert!(!d.truncated);
        let g = &d.groups[0];
        assert_eq!(g.overall, b"Fans");
        assert_eq!(g.elements, [b"".to_vec(), b"Fan 2".to_vec()]);
    }

    #[test]
    fn element_descriptors_short() {
        let mut p = vec![0x07, 0, 0, 0, 0, 0, 0, 9];
        p.extend_from_slice(&[0, 0, 0, 4]);
        p.extend_from_slice(b"Fans");
        p.extend_from_slice(&[0, 0, 0, 10]);
        p.extend_from_slice(b"Fan");
        let p = with_len(p);

        let d = decode_element_descriptors(&p, &map()).unwrap();
        assert!(d.truncated);
        assert_eq!(d.groups[0].overall, b"Fans");
        assert!(d.groups[0].elements.is_empty());
    }

    #[test]
    fn subenclosure_help() {
        let mut p = vec![0x0b, 1, 0, 0, 0, 0, 0x01, 0x00];
        p.extend_from_slice(&[0, 0, 0, 4]);
        p.extend_from_slice(b"help");
        p.extend_from_slice(&[0, 2, 0, 0]);
        let p = with_len(p);

        let s = decode_subenclosure_page(&p).unwrap();
        assert_eq!(s.num_subenclosures, 2);
        assert_eq!(s.generation, 0x100);
        assert!(!s.truncated);
        assert_eq!(
            s.records,
            [
                SubenclosureText {
                    subenclosure_id: 0,
                    data: b"help".to_vec()
                },
                SubenclosureText {
                    subenclosure_id: 2,
                    data: vec![]
                },
            ]
        );

        let mut p = p.as_bytes().to_vec();
        p.truncate(p.len() - 1);
        let s = decode_subenclosure_page(&RawPage::parse(&p).unwrap()).unwrap();
        assert!(s.truncated);
        assert_eq!(s.records.len(), 1);
    }

    proptest! {
        #[test]
        fn short_page_is_partial(
            // Overall text then element texts, per header
            headers in prop::collection::vec(
                (
                    0u8..0x20,
                    prop::collection::vec(
                        prop::collection::vec(any::<u8>(), 0..6),
                        1..4,
                    ),
                ),
                0..5,
            ),
            keep in any::<prop::sample::Index>()
        ) {
            let map = ElementMap::new(
                headers
                    .iter()
                    .map(|(type_code, texts)| ElementTypeHeader {
                        type_code: *type_code,
                        possible_elements: (texts.len() - 1) as u8,
                        subenclosure_id: 0,
                    })
                    .collect(),
                9,
            );
            let mut p = vec![0x07, 0, 0, 0, 0, 0, 0, 9];
            for text in headers.iter().flat_map(|(_, t)| t) {
                p.extend_from_slice(&[0, 0, 0, text.len() as u8]);
                p.extend_from_slice(text);
            }
            let p = with_len(p);

            let keep = keep.index(p.as_bytes().len());
            let r = RawPage::parse(&p.as_bytes()[..keep])
                .and_then(|p| decode_element_descriptors(&p, &map));
            match r {
                Ok(d) => {
                    prop_assert!(keep >= RECORDS_OFFSET);
                    prop_assert!(d.truncated);
                }
                Err(e) => {
                    prop_assert!(keep < RECORDS_OFFSET);
                    prop_assert!(matches!(e, SesError::Truncated), "{:?}", e);
                }
            }
        }
    }
}
