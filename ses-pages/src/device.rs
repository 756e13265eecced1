// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Device Element Status page (0x0a).
//!
//! Only Device and Array device elements carry transport descriptors, one
//! per possible element, with no overall descriptor.

#[allow(unused)]
use log::{debug, error, info, trace, warn};

use deku::{DekuRead, DekuWrite};
use num_traits::FromPrimitive;

use ses::util::{NoneTruncated, SliceReader};
use ses::{RawPage, Result};

use crate::catalog::{
    sas_protocols, ElementType, SasDeviceType, SasProtocols, TransportProtocol,
};
use crate::config::{ElementMap, ElementTypeHeader};
use crate::records::RECORDS_OFFSET;
use crate::status::read;

/// Transport descriptor header
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct TransportHeader {
    #[deku(pad_bits_before = "4", bits = 4)]
    pub protocol: u8,
    /// Length of the descriptor following this header
    pub length: u8,
}

impl TransportHeader {
    pub const LEN: usize = 2;
}

/// Fibre Channel port record
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct FcPort {
    pub loop_position: u8,
    #[deku(pad_bytes_before = "3")]
    pub hard_address: u8,
    pub n_port_id: [u8; 3],
    pub n_port_name: [u8; 8],
}

impl FcPort {
    pub const LEN: usize = 16;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FcDescriptor {
    /// Port count as reported
    pub num_ports: u8,
    pub node_name: [u8; 8],
    pub ports: Vec<FcPort>,
}

/// SAS phy record as sent
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
#[deku(endian = "big")]
pub struct SasPhyRecord {
    #[deku(pad_bits_before = "33", bits = 3, pad_bits_after = "4")]
    pub device_type: u8,
    #[deku(pad_bytes_before = "1")]
    pub initiator: u8,
    pub target: u8,
    pub attached_sas_address: u64,
    pub sas_address: u64,
    #[deku(pad_bytes_after = "3")]
    pub phy_id: u8,
}

impl SasPhyRecord {
    pub const LEN: usize = 28;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SasPhy {
    pub device_type: u8,
    pub initiator: SasProtocols,
    pub target: SasProtocols,
    pub attached_sas_address: u64,
    pub sas_address: u64,
    pub phy_id: u8,
}

impl SasPhy {
    pub fn device_type(&self) -> Option<SasDeviceType> {
        SasDeviceType::from_u8(self.device_type)
    }
}

impl From<SasPhyRecord> for SasPhy {
    fn from(r: SasPhyRecord) -> Self {
        Self {
            device_type: r.device_type,
            initiator: sas_protocols(r.initiator),
            target: sas_protocols(r.target),
            attached_sas_address: r.attached_sas_address,
            sas_address: r.sas_address,
            phy_id: r.phy_id,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SasDescriptor {
    /// Phy count as reported
    pub num_phys: u8,
    pub not_all_phys: bool,
    pub phys: Vec<SasPhy>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TransportDescriptor {
    FibreChannel(FcDescriptor),
    Sas(SasDescriptor),
    /// Protocols without a decoder. `data` starts at descriptor byte 4.
    Other { protocol: u8, data: Vec<u8> },
}

impl TransportDescriptor {
    /// Decodes a whole descriptor, header included.
    ///
    /// Returns `false` alongside if the descriptor is too short for the
    /// ports or phys it declares; those that fit are returned.
    fn decode(desc: &[u8]) -> Result<(Self, bool)> {
        let hdr: TransportHeader = read(desc.get(..2).truncated()?)?;
        let mut r = SliceReader::new(desc);
        r.skip(TransportHeader::LEN).truncated()?;

        match TransportProtocol::from_u8(hdr.protocol) {
            Some(TransportProtocol::FibreChannel) => {
                let Some(num_ports) = r.read_u8() else {
                    return Ok((Self::other(&hdr, desc), false));
                };
                let node = r.skip(1).and_then(|_| r.take_array::<8>());
                let Some(node_name) = node else {
                    return Ok((Self::other(&hdr, desc), false));
                };
                let mut ports = Vec::with_capacity(usize::from(num_ports));
                let mut complete = true;
                for _ in 0..num_ports {
                    let Some(p) = r.take(FcPort::LEN) else {
                        complete = false;
                        break;
                    };
                    ports.push(read(p)?);
                }
                let d = FcDescriptor {
                    num_ports,
                    node_name,
                    ports,
                };
                Ok((Self::FibreChannel(d), complete))
            }
            Some(TransportProtocol::Sas) => {
                let (Some(num_phys), Some(flags)) = (r.read_u8(), r.read_u8())
                else {
                    return Ok((Self::other(&hdr, desc), false));
                };
                let mut phys = Vec::with_capacity(usize::from(num_phys));
                let mut complete = true;
                for _ in 0..num_phys {
                    let Some(p) = r.take(SasPhyRecord::LEN) else {
                        complete = false;
                        break;
                    };
                    let p: SasPhyRecord = read(p)?;
                    phys.push(p.into());
                }
                let d = SasDescriptor {
                    num_phys,
                    not_all_phys: flags & 0x01 != 0,
                    phys,
                };
                Ok((Self::Sas(d), complete))
            }
            _ => Ok((Self::other(&hdr, desc), true)),
        }
    }

    fn other(hdr: &TransportHeader, desc: &[u8]) -> Self {
        Self::Other {
            protocol: hdr.protocol,
            data: desc.get(4..).unwrap_or_default().to_vec(),
        }
    }
}

/// Transport descriptors for one Device or Array device header
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DeviceGroup {
    pub header: ElementTypeHeader,
    pub descriptors: Vec<TransportDescriptor>,
}

/// A decoded Device Element Status page
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DeviceElementPage {
    pub generation: u32,
    pub groups: Vec<DeviceGroup>,
    /// The page ended before every descriptor was read
    pub truncated: bool,
}

fn has_transport(h: &ElementTypeHeader) -> bool {
    matches!(
        h.element_type(),
        Ok(ElementType::Device | ElementType::ArrayDevice)
    )
}

/// Decodes a Device Element Status page against an element map.
///
/// Headers for other element types take no space in the page.
pub fn decode_device_elements(
    page: &RawPage,
    map: &ElementMap,
) -> Result<DeviceElementPage> {
    map.check_generation(page)?;

    let mut r = SliceReader::new(page.as_bytes());
    r.skip(RECORDS_OFFSET).truncated()?;

    let mut groups = Vec::new();
    let mut truncated = false;
    'headers: for h in map.headers().iter().filter(|h| has_transport(h)) {
        let mut group = DeviceGroup {
            header: *h,
            descriptors: Vec::with_capacity(usize::from(h.possible_elements)),
        };
        for _ in 0..h.possible_elements {
            let mut peek = r.clone();
            let Some([_, len]) = peek.take_array::<2>() else {
                truncated = true;
                groups.push(group);
                break 'headers;
            };
            let Some(desc) = r.take(TransportHeader::LEN + usize::from(len))
            else {
                truncated = true;
                groups.push(group);
                break 'headers;
            };
            let (d, complete) = TransportDescriptor::decode(desc)?;
            group.descriptors.push(d);
            // Short records inside a descriptor don't affect the next one
            if !complete {
                truncated = true;
            }
        }
        groups.push(group);
    }

    if truncated {
        warn!("device element status page too short for its element map");
    }

    Ok(DeviceElementPage {
        generation: map.generation(),
        groups,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SasProtocol;
    use enumset::EnumSet;
    use proptest::prelude::*;
    use ses::SesError;

    fn header(type_code: u8, possible_elements: u8) -> ElementTypeHeader {
        ElementTypeHeader {
            type_code,
            possible_elements,
            subenclosure_id: 0,
        }
    }

    fn sas_phy(device_type: u8, init: u8, tgt: u8, id: u8) -> Vec<u8> {
        let mut p = vec![0u8; 28];
        p[4] = device_type << 4;
        p[6] = init;
        p[7] = tgt;
        p[8..16].copy_from_slice(&0x5000_c500_1234_5678u64.to_be_bytes());
        p[16..24].copy_from_slice(&0x5000_c500_0000_0001u64.to_be_bytes());
        p[24] = id;
        p
    }

    fn with_len(mut p: Vec<u8>) -> RawPage {
        let l = (p.len() - 4) as u16;
        p[2..4].copy_from_slice(&l.to_be_bytes());
        RawPage::parse(&p).unwrap()
    }

    #[test]
    fn sas() {
        let mut d = vec![0x06, 0, 2, 0x01];
        d.extend(sas_phy(1, 0x08, 0x00, 4));
        d.extend(sas_phy(2, 0x00, 0x0e, 5));
        d[1] = (d.len() - 2) as u8;

        let (t, complete) = TransportDescriptor::decode(&d).unwrap();
        assert!(complete);
        let TransportDescriptor::Sas(s) = t else {
            panic!("{t:?}");
        };
        assert_eq!(s.num_phys, 2);
        assert!(s.not_all_phys);
        assert_eq!(s.phys[0].device_type(), Some(SasDeviceType::EndDevice));
        assert_eq!(s.phys[0].initiator, EnumSet::only(SasProtocol::Ssp));
        assert!(s.phys[0].target.is_empty());
        assert_eq!(s.phys[0].attached_sas_address, 0x5000_c500_1234_5678);
        assert_eq!(s.phys[0].sas_address, 0x5000_c500_0000_0001);
        assert_eq!(s.phys[0].phy_id, 4);
        assert_eq!(
            s.phys[1].device_type(),
            Some(SasDeviceType::EdgeExpander)
        );
        assert_eq!(s.phys[1].target.len(), 3);
        assert_eq!(s.phys[1].phy_id, 5);
    }

    #[test]
    fn fibre_channel() {
        let mut d = vec![0x00, 0, 1, 0];
        d.extend_from_slice(&[0x20, 0, 0, 0x11, 0x22, 0x33, 0x44, 0x55]);
        d.extend_from_slice(&[7, 0, 0, 0, 0xef, 0x01, 0x02, 0x03]);
        d.extend_from_slice(&[0x21, 0, 0, 0, 0, 0, 0, 0x99]);
        d[1] = (d.len() - 2) as u8;

        let (t, complete) = TransportDescriptor::decode(&d).unwrap();
        assert!(complete);
        let TransportDescriptor::FibreChannel(f) = t else {
            panic!("{t:?}");
        };
        assert_eq!(f.node_name, [0x20, 0, 0, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(
            f.ports,
            [FcPort {
                loop_position: 7,
                hard_address: 0xef,
                n_port_id: [1, 2, 3],
                n_port_name: [0x21, 0, 0, 0, 0, 0, 0, 0x99],
            }]
        );
    }

    #[test]
    fn other_protocol() {
        let d = [0x05, 4, 0, 0, 0xaa, 0xbb];
        let (t, complete) = TransportDescriptor::decode(&d).unwrap();
        assert!(complete);
        assert_eq!(
            t,
            TransportDescriptor::Other {
                protocol: 5,
                data: vec![0xaa, 0xbb]
            }
        );
    }

    #[test]
    fn page_walk() {
        // Cooling headers take no space
        let map = ElementMap::new(
            vec![header(0x03, 4), header(0x01, 2), header(0x17, 1)],
            1,
        );
        let mut p = vec![0x0a, 0, 0, 0, 0, 0, 0, 1];
        p.extend_from_slice(&[0x05, 2, 0, 0]);
        p.extend_from_slice(&[0x06, 2, 0, 0]);
        p.extend_from_slice(&[0x0f, 3, 0, 0, 0x42]);
        let p = with_len(p);

        let d = decode_device_elements(&p, &map).unwrap();
        assert!(!d.truncated);
        assert_eq!(d.groups.len(), 2);
        assert_eq!(d.groups[0].header.type_code, 0x01);
        assert_eq!(d.groups[0].descriptors.len(), 2);
        assert_eq!(
            d.groups[0].descriptors[1],
            TransportDescriptor::Sas(SasDescriptor {
                num_phys: 0,
                not_all_phys: false,
                phys: vec![],
            })
        );
        assert_eq!(
            d.groups[1].descriptors[0],
            TransportDescriptor::Other {
                protocol: 0x0f,
                data: vec![0x42]
            }
        );
    }

    #[test]
    fn page_walk_short() {
        let map = ElementMap::new(vec![header(0x01, 2)], 1);
        let mut p = vec![0x0a, 0, 0, 0, 0, 0, 0, 1];
        p.extend_from_slice(&[0x05, 2, 0, 0]);
        p.extend_from_slice(&[0x05, 8, 0, 0]);
        let p = with_len(p);

        let d = decode_device_elements(&p, &map).unwrap();
        assert!(d.truncated);
        assert_eq!(d.groups[0].descriptors.len(), 1);

        // SAS descriptor claiming a phy it doesn't hold
        let mut p = vec![0x0a, 0, 0, 0, 0, 0, 0, 1];
        p.extend_from_slice(&[0x06, 2, 1, 0]);
        let p = with_len(p);
        let d = decode_device_elements(&p, &map).unwrap();
        assert!(d.truncated);
        let TransportDescriptor::Sas(s) = &d.groups[0].descriptors[0] else {
            panic!();
        };
        assert_eq!(s.num_phys, 1);
        assert!(s.phys.is_empty());

        // A following descriptor is still decoded
        let mut p = vec![0x0a, 0, 0, 0, 0, 0, 0, 1];
        p.extend_from_slice(&[0x06, 2, 1, 0]);
        p.extend_from_slice(&[0x0f, 4, 0, 0, 0xaa, 0xbb]);
        let p = with_len(p);
        let d = decode_device_elements(&p, &map).unwrap();
        assert!(d.truncated);
        assert_eq!(d.groups.len(), 1);
        assert_eq!(d.groups[0].descriptors.len(), 2);
        assert_eq!(
            d.groups[0].descriptors[1],
            TransportDescriptor::Other {
                protocol: 0x0f,
                data: vec![0xaa, 0xbb]
            }
        );
    }

    proptest! {
        #[test]
        fn short_page_is_partial(
            // Device, Cooling and Array device headers, with a protocol
            // and body for each descriptor
            headers in prop::collection::vec(
                (
                    prop::sample::select(vec![0x01u8, 0x03, 0x17]),
                    prop::collection::vec(
                        (
                            prop::sample::select(vec![0x0u8, 0x6, 0xf]),
                            prop::collection::vec(any::<u8>(), 0..40),
                        ),
                        0..3,
                    ),
                ),
                0..4,
            ),
            keep in any::<prop::sample::Index>()
        ) {
            let map = ElementMap::new(
                headers
                    .iter()
                    .map(|(t, d)| header(*t, d.len() as u8))
                    .collect(),
                1,
            );
            let mut p = vec![0x0a, 0, 0, 0, 0, 0, 0, 1];
            for (t, descs) in &headers {
                if *t == 0x03 {
                    continue;
                }
                for (protocol, body) in descs {
                    p.extend_from_slice(&[*protocol, body.len() as u8]);
                    p.extend_from_slice(body);
                }
            }
            let p = with_len(p);

            let keep = keep.index(p.as_bytes().len());
            let r = RawPage::parse(&p.as_bytes()[..keep])
                .and_then(|p| decode_device_elements(&p, &map));
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
