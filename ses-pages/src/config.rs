// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Configuration diagnostic page (0x01) and the element map.

#[allow(unused)]
use log::{debug, error, info, trace, warn};

use deku::{DekuContainerRead, DekuRead, DekuWrite};

use ses::util::{NoneTruncated, SliceReader};
use ses::{RawPage, Result, SesError};

use crate::catalog::{element_type_desc, ElementType};

/// Subenclosure descriptor fixed header
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone)]
#[deku(endian = "big")]
pub struct SubenclosureHeader {
    #[deku(pad_bits_before = "1", bits = 3)]
    pub relative_process_id: u8,
    #[deku(pad_bits_before = "1", bits = 3)]
    pub num_processes: u8,
    pub subenclosure_id: u8,
    pub num_element_types: u8,
    /// Length of the descriptor following this header
    pub length: u8,
}

impl SubenclosureHeader {
    pub const LEN: usize = 4;

    /// Smallest descriptor, header included, that carries an identity
    pub const MIN_DESCRIPTOR_LEN: usize = 40;

    /// Total descriptor length including the header
    pub fn descriptor_len(&self) -> usize {
        Self::LEN + usize::from(self.length)
    }
}

/// Subenclosure identity, descriptor bytes 4 to 40
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone)]
#[deku(endian = "big")]
pub struct SubenclosureIdentity {
    pub logical_id: [u8; 8],
    pub vendor: [u8; 8],
    pub product: [u8; 16],
    pub revision: [u8; 4],
}

impl SubenclosureIdentity {
    pub const LEN: usize = 36;
}

/// A subenclosure descriptor
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SubenclosureDescriptor {
    pub header: SubenclosureHeader,
    /// `None` if the descriptor is too short to hold an identity
    pub identity: Option<SubenclosureIdentity>,
    pub vendor_data: Vec<u8>,
}

/// Type descriptor header
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
#[deku(endian = "big")]
pub struct TypeDescriptorHeader {
    pub element_type: u8,
    pub possible_elements: u8,
    pub subenclosure_id: u8,
    pub text_len: u8,
}

impl TypeDescriptorHeader {
    pub const LEN: usize = 4;
}

/// A type descriptor with its optional text
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TypeDescriptor {
    pub header: TypeDescriptorHeader,
    pub text: Vec<u8>,
}

/// One entry of the element map
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ElementTypeHeader {
    pub type_code: u8,
    pub possible_elements: u8,
    pub subenclosure_id: u8,
}

impl ElementTypeHeader {
    pub fn element_type(&self) -> Result<ElementType> {
        ElementType::try_from(self.type_code)
    }

    /// Element type description, `None` for unknown types
    pub fn desc(&self) -> Option<&'static str> {
        element_type_desc(self.type_code)
    }
}

impl From<&TypeDescriptorHeader> for ElementTypeHeader {
    fn from(t: &TypeDescriptorHeader) -> Self {
        Self {
            type_code: t.element_type,
            possible_elements: t.possible_elements,
            subenclosure_id: t.subenclosure_id,
        }
    }
}

/// The element map: element-type headers in Configuration page order, and
/// the generation code they were taken at.
///
/// Element-keyed pages are only decoded against a map with a matching
/// generation code.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ElementMap {
    headers: Vec<ElementTypeHeader>,
    generation: u32,
}

impl ElementMap {
    pub fn new(headers: Vec<ElementTypeHeader>, generation: u32) -> Self {
        Self {
            headers,
            generation,
        }
    }

    /// Parses the element map from a Configuration page.
    ///
    /// Type descriptor text is not read.
    pub fn parse(page: &RawPage, max_types: usize) -> Result<Self> {
        let walk = ConfigWalk::parse(page, max_types)?;
        Ok(Self {
            headers: walk.types.iter().map(ElementTypeHeader::from).collect(),
            generation: walk.generation,
        })
    }

    pub fn headers(&self) -> &[ElementTypeHeader] {
        &self.headers
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Checks that `page` was produced at this map's generation.
    pub fn check_generation(&self, page: &RawPage) -> Result<()> {
        let found = page.generation()?;
        if found != self.generation {
            debug!(
                "generation mismatch, map 0x{:x} page 0x{found:x}",
                self.generation
            );
            return Err(SesError::Stale {
                expected: self.generation,
                found,
            });
        }
        Ok(())
    }
}

/// A decoded Configuration page
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Configuration {
    /// Number of subenclosures, primary included
    pub num_subenclosures: usize,
    pub generation: u32,
    pub subenclosures: Vec<SubenclosureDescriptor>,
    pub types: Vec<TypeDescriptor>,
}

impl Configuration {
    /// Parses a Configuration page, including type descriptor text.
    pub fn parse(page: &RawPage, max_types: usize) -> Result<Self> {
        let walk = ConfigWalk::parse(page, max_types)?;

        // Text blocks follow the type descriptors in the same order
        let mut r = SliceReader::new(page.as_bytes());
        r.skip(walk.text_offset).truncated()?;
        let types = walk
            .types
            .into_iter()
            .map(|header| {
                let text = r.take(usize::from(header.text_len)).truncated()?;
                Ok(TypeDescriptor {
                    header,
                    text: text.to_vec(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            num_subenclosures: walk.num_subenclosures,
            generation: walk.generation,
            subenclosures: walk.subenclosures,
            types,
        })
    }

    pub fn element_map(&self) -> ElementMap {
        ElementMap {
            headers: self
                .types
                .iter()
                .map(|t| ElementTypeHeader::from(&t.header))
                .collect(),
            generation: self.generation,
        }
    }
}

struct ConfigWalk {
    num_subenclosures: usize,
    generation: u32,
    subenclosures: Vec<SubenclosureDescriptor>,
    types: Vec<TypeDescriptorHeader>,
    text_offset: usize,
}

impl ConfigWalk {
    fn parse(page: &RawPage, max_types: usize) -> Result<Self> {
        let num_subenclosures = usize::from(page.byte1()) + 1;
        let generation = page.generation()?;

        let mut r = SliceReader::new(page.as_bytes());
        r.skip(8).truncated()?;

        let mut subenclosures = Vec::with_capacity(num_subenclosures);
        let mut sum_types = 0usize;
        for _ in 0..num_subenclosures {
            let hdr = r.take(SubenclosureHeader::LEN).truncated()?;
            let (_, header) = SubenclosureHeader::from_bytes((hdr, 0))?;
            sum_types += usize::from(header.num_element_types);

            let body = r.take(usize::from(header.length)).truncated()?;
            if header.descriptor_len() < SubenclosureHeader::MIN_DESCRIPTOR_LEN
            {
                warn!(
                    "short subenclosure descriptor len={}, id {}",
                    header.descriptor_len(),
                    header.subenclosure_id
                );
                subenclosures.push(SubenclosureDescriptor {
                    header,
                    identity: None,
                    vendor_data: Vec::new(),
                });
                continue;
            }

            let (id, vendor_data) = body.split_at(SubenclosureIdentity::LEN);
            let (_, identity) = SubenclosureIdentity::from_bytes((id, 0))?;
            subenclosures.push(SubenclosureDescriptor {
                header,
                identity: Some(identity),
                vendor_data: vendor_data.to_vec(),
            });
        }

        if sum_types > max_types {
            return Err(SesError::TooManyElements {
                count: sum_types,
                max: max_types,
            });
        }

        let mut types = Vec::with_capacity(sum_types);
        for _ in 0..sum_types {
            let t = r.take(TypeDescriptorHeader::LEN).truncated()?;
            let (_, t) = TypeDescriptorHeader::from_bytes((t, 0))?;
            types.push(t);
        }

        debug!(
            "configuration: {num_subenclosures} subenclosures, {sum_types} \
             element types, generation 0x{generation:x}"
        );

        Ok(Self {
            num_subenclosures,
            generation,
            subenclosures,
            types,
            text_offset: r.pos(),
        })
    }
}
