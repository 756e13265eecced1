// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

#[allow(unused)]
use log::{debug, error, info, trace, warn};

use std::collections::HashMap;

use proptest::prelude::*;

use ses::{DiagTransport, RawPage, SesError, TransportError, TransportResult};
use ses_pages::device::TransportDescriptor;
use ses_pages::report::{write_report, ReportOptions};
use ses_pages::requester::{
    fetch_element_map, fetch_page, send_control, Limits, Page,
};
use ses_pages::status::StatusDetail;
use ses_pages::{Configuration, ControlRequest, ElementTypeHeader};

fn start_log() {
    let _ = env_logger::Builder::new()
        .filter(None, log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

/// An enclosure serving canned pages
#[derive(Default)]
struct MockEnclosure {
    pages: HashMap<u8, Vec<u8>>,
    requests: Vec<u8>,
    sent: Vec<Vec<u8>>,
}

impl MockEnclosure {
    fn with(pages: &[Vec<u8>]) -> Self {
        let mut m = Self::default();
        for p in pages {
            m.pages.insert(p[0], p.clone());
        }
        m
    }
}

impl DiagTransport for MockEnclosure {
    fn send_vectored(&mut self, bufs: &[&[u8]]) -> TransportResult<()> {
        self.sent.push(bufs.concat());
        Ok(())
    }

    fn recv<'f>(
        &mut self,
        page_code: u8,
        buf: &'f mut [u8],
    ) -> TransportResult<&'f mut [u8]> {
        self.requests.push(page_code);
        let p = self.pages.get(&page_code).ok_or(TransportError::RxFailure)?;
        let l = p.len().min(buf.len());
        buf[..l].copy_from_slice(&p[..l]);
        Ok(&mut buf[..l])
    }
}

/// A page with its length filled in
fn page(code: u8, byte1: u8, body: &[u8]) -> Vec<u8> {
    let mut p = vec![code, byte1];
    p.extend_from_slice(&(body.len() as u16).to_be_bytes());
    p.extend_from_slice(body);
    p
}

/// Configuration page with a single primary subenclosure
fn config_page(generation: u32, types: &[(u8, u8, &str)]) -> Vec<u8> {
    let mut b = generation.to_be_bytes().to_vec();
    b.extend_from_slice(&[0x11, 0x00, types.len() as u8, 36]);
    b.extend_from_slice(&[0x50, 0, 0x0c, 0xca, 0, 0, 0, 1]);
    b.extend_from_slice(b"ACME    ");
    b.extend_from_slice(b"JBOD-24         ");
    b.extend_from_slice(b"0102");
    for (t, n, text) in types {
        b.extend_from_slice(&[*t, *n, 0, text.len() as u8]);
    }
    for (_, _, text) in types {
        b.extend_from_slice(text.as_bytes());
    }
    page(0x01, 0, &b)
}

/// Device (3 possible) and power supply (1 possible)
fn scenario_config(generation: u32) -> Vec<u8> {
    config_page(generation, &[(0x01, 3, "Drive bays"), (0x02, 1, "")])
}

fn element_page(code: u8, byte1: u8, generation: u32, body: &[u8]) -> Vec<u8> {
    let mut b = generation.to_be_bytes().to_vec();
    b.extend_from_slice(body);
    page(code, byte1, &b)
}

fn status_page(generation: u32) -> Vec<u8> {
    let records: [[u8; 4]; 6] = [
        [0x00, 0, 0, 0],
        [0x01, 0x05, 0xa0, 0x12],
        [0x01, 0x06, 0x00, 0x00],
        [0x05, 0x07, 0x00, 0x00],
        [0x01, 0, 0, 0],
        [0x42, 0x80, 0x00, 0x20],
    ];
    element_page(0x02, 0x04, generation, records.as_flattened())
}

#[test]
fn configuration_element_map() {
    start_log();
    let mut m = MockEnclosure::with(&[scenario_config(0x1234)]);
    let map = fetch_element_map(&mut m, &Limits::default()).unwrap();
    let h = |type_code, possible_elements| ElementTypeHeader {
        type_code,
        possible_elements,
        subenclosure_id: 0,
    };
    assert_eq!(map.headers(), [h(0x01, 3), h(0x02, 1)]);
    assert_eq!(map.generation(), 0x1234);

    let f = fetch_page(&mut m, 0x01, &Limits::default()).unwrap();
    let Page::Configuration(c) = &f.page else {
        panic!("{:?}", f.page);
    };
    assert_eq!(c.num_subenclosures, 1);
    assert_eq!(c.types[0].text, b"Drive bays");
    assert_eq!(c.element_map(), map);
    let id = c.subenclosures[0].identity.as_ref().unwrap();
    assert_eq!(&id.vendor, b"ACME    ");

    let mut s = String::new();
    write_report(&mut s, &f, &ReportOptions::default()).unwrap();
    assert!(s.contains("  generation code: 0x1234\n"));
    let vendor = format!(
        "      vendor: {:8}  product: {:16}  rev: 0102\n",
        "ACME", "JBOD-24"
    );
    assert!(s.contains(&vendor));
    assert!(s.contains("    Element type: Device, subenclosure id: 0\n"));
    assert!(s.contains("      Description: Drive bays\n"));
}

#[test]
fn enclosure_status() {
    start_log();
    let mut m = MockEnclosure::with(&[scenario_config(7), status_page(7)]);
    let f = fetch_page(&mut m, 0x02, &Limits::default()).unwrap();
    assert_eq!(m.requests, [0x01, 0x02], "configuration fetched first");

    let Page::EnclosureStatus(s) = &f.page else {
        panic!("{:?}", f.page);
    };
    assert!(!s.truncated);
    assert!(s.flags().unwrap().non_critical);
    assert_eq!(s.groups.len(), 2);
    assert_eq!(s.groups[0].elements.len(), 3);

    let StatusDetail::Device(d) = s.groups[0].elements[0].value.detail else {
        panic!();
    };
    assert_eq!(d.slot_address, 5);
    assert!(d.flags.app_client_bypassed_a);

    let mut r = String::new();
    let opts = ReportOptions {
        filter: true,
        inner_hex: false,
    };
    write_report(&mut r, &f, &opts).unwrap();
    assert!(r.starts_with(
        "Enclosure status diagnostic page:\n  \
         INVOP=0, INFO=0, NON-CRIT=1, CRIT=0, UNRECOV=0\n  \
         generation code: 0x7\n"
    ));
    assert!(r.contains("      Element 3 status:\n       \
                        Predicted failure=0, swap=0, status: Not installed\n"));
    assert!(!r.contains("<<<response too short>>>"));

    let mut r = String::new();
    let opts = ReportOptions {
        filter: false,
        inner_hex: true,
    };
    write_report(&mut r, &f, &opts).unwrap();
    assert!(r.contains("    Overall status(hex): 00 00 00 00\n"));
    assert!(r.contains("      Element 1 status(hex): 42 80 00 20\n"));
}

#[test]
fn generation_mismatch() {
    start_log();
    for code in [0x02, 0x05, 0x07, 0x0a] {
        let target = element_page(code, 0, 8, &[0; 24]);
        let mut m = MockEnclosure::with(&[scenario_config(7), target]);
        let e = fetch_page(&mut m, code, &Limits::default()).unwrap_err();
        assert!(
            matches!(e, SesError::Stale { expected: 7, found: 8 }),
            "{e:?}"
        );
        assert!(e.is_retryable());
        assert_eq!(m.requests, [0x01, code]);
    }
}

#[test]
fn topology_independent() {
    start_log();
    let supported = page(0x00, 0, &[0x00, 0x01, 0x02, 0x00]);
    let help = page(0x03, 0, b"Call support");
    let mut m = MockEnclosure::with(&[supported, help]);

    let f = fetch_page(&mut m, 0x00, &Limits::default()).unwrap();
    assert_eq!(f.page, Page::SupportedPages(vec![0, 1, 2]));
    assert!(f.map.is_none());

    let f = fetch_page(&mut m, 0x03, &Limits::default()).unwrap();
    assert_eq!(f.page, Page::HelpText(b"Call support".to_vec()));
    assert_eq!(m.requests, [0x00, 0x03]);

    let mut r = String::new();
    write_report(&mut r, &f, &ReportOptions::default()).unwrap();
    assert_eq!(
        r,
        "Help text diagnostic page (for primary subenclosure):\n  \
         Call support\n"
    );
}

#[test]
fn page_mismatch() {
    start_log();
    let mut m = MockEnclosure::default();
    m.pages.insert(0x04, page(0x09, 0x03, &[]));
    m.pages.insert(0x03, page(0x08, 0x12, &[]));
    m.pages.insert(0x0b, page(0x0c, 0, &[0, 0, 0, 0]));

    let l = Limits::default();
    let e = fetch_page(&mut m, 0x04, &l).unwrap_err();
    assert!(matches!(e, SesError::EnclosureBusy { vendor: 1 }), "{e:?}");
    assert!(e.is_retryable());
    let e = fetch_page(&mut m, 0x03, &l).unwrap_err();
    assert!(matches!(e, SesError::ShortStatusOnly(0x12)), "{e:?}");
    let e = fetch_page(&mut m, 0x0b, &l).unwrap_err();
    assert!(
        matches!(e, SesError::PageMismatch { wanted: 0x0b, got: 0x0c }),
        "{e:?}"
    );
    assert!(!e.is_retryable());
}

#[test]
fn transport_failure() {
    start_log();
    let mut m = MockEnclosure::with(&[scenario_config(1)]);
    let e = fetch_page(&mut m, 0x02, &Limits::default()).unwrap_err();
    assert!(
        matches!(e, SesError::Transport(TransportError::RxFailure)),
        "{e:?}"
    );
}

#[test]
fn too_many_element_types() {
    start_log();
    let mut m = MockEnclosure::with(&[scenario_config(1), status_page(1)]);
    let l = Limits {
        max_element_types: 1,
        ..Default::default()
    };
    let e = fetch_page(&mut m, 0x02, &l).unwrap_err();
    assert!(
        matches!(e, SesError::TooManyElements { count: 2, max: 1 }),
        "{e:?}"
    );
    assert_eq!(m.requests, [0x01], "target page not fetched");
}

#[test]
fn clamped_allocation() {
    start_log();
    let mut m = MockEnclosure::with(&[scenario_config(3), status_page(3)]);
    // Room for the header, generation and two records
    let l = Limits {
        max_response_len: 16,
        ..Default::default()
    };
    let e = fetch_page(&mut m, 0x02, &l).unwrap_err();
    // The configuration page can't be read whole either
    assert!(matches!(e, SesError::Truncated), "{e:?}");

    let map = fetch_element_map(&mut m, &Limits::default()).unwrap();
    let raw = ses_pages::requester::fetch_raw(&mut m, 0x02, &l).unwrap();
    assert!(raw.is_clamped());
    let s = ses_pages::status::decode_status(&raw, &map).unwrap();
    assert!(s.truncated);
    assert_eq!(s.iter().count(), 2);
}

#[test]
fn threshold_and_descriptors() {
    start_log();
    let config = config_page(2, &[(0x04, 1, ""), (0x0b, 1, "")]);
    let threshold = element_page(
        0x05,
        0x10,
        2,
        &[0, 0, 0, 0, 70, 60, 0, 0, 0, 0, 0, 0, 0, 0, 10, 5],
    );
    let mut desc = Vec::new();
    for t in ["Temps", "Inlet", "", "UPS"] {
        desc.extend_from_slice(&[0, 0, 0, t.len() as u8]);
        desc.extend_from_slice(t.as_bytes());
    }
    let descriptors = element_page(0x07, 0, 2, &desc);
    let mut m = MockEnclosure::with(&[config, threshold, descriptors]);

    let f = fetch_page(&mut m, 0x05, &Limits::default()).unwrap();
    let Page::Threshold(t) = &f.page else {
        panic!("{:?}", f.page);
    };
    assert!(t.invop());
    let mut r = String::new();
    write_report(&mut r, &f, &ReportOptions::default()).unwrap();
    assert!(r.contains(
        "      Element 1 threshold: high critical=50, high warning=40\n"
    ));
    assert!(r.contains(
        "      Element 1 threshold: low warning=10, low critical=5 \
         (in minutes)\n"
    ));

    let f = fetch_page(&mut m, 0x07, &Limits::default()).unwrap();
    let Page::ElementDescriptor(d) = &f.page else {
        panic!("{:?}", f.page);
    };
    assert_eq!(d.groups[1].overall, b"");
    let mut r = String::new();
    write_report(&mut r, &f, &ReportOptions::default()).unwrap();
    assert!(r.contains("    Overall descriptor: Temps\n"));
    assert!(r.contains("      Element 1 descriptor: Inlet\n"));
    assert!(r.contains("    Overall descriptor: <empty>\n"));
    assert_eq!(m.requests, [0x01, 0x05, 0x01, 0x07]);
}

#[test]
fn device_elements() {
    start_log();
    let mut body = Vec::new();
    // SAS, one phy
    body.extend_from_slice(&[0x06, 30, 1, 0]);
    let mut phy = [0u8; 28];
    phy[4] = 0x10;
    phy[6] = 0x08;
    phy[7] = 0x02;
    phy[8..16].copy_from_slice(&0x5000c50000000001u64.to_be_bytes());
    phy[16..24].copy_from_slice(&0x500605b000000002u64.to_be_bytes());
    phy[24] = 7;
    body.extend_from_slice(&phy);
    // Protocols without a decoder
    body.extend_from_slice(&[0x0f, 4, 0, 0, 0xaa, 0xbb]);
    body.extend_from_slice(&[0x01, 2, 0, 0]);

    let dev = element_page(0x0a, 0, 9, &body);
    let mut m = MockEnclosure::with(&[scenario_config(9), dev]);
    let f = fetch_page(&mut m, 0x0a, &Limits::default()).unwrap();
    let Page::DeviceElementStatus(d) = &f.page else {
        panic!("{:?}", f.page);
    };
    assert!(!d.truncated);
    // Power supply header contributes nothing
    assert_eq!(d.groups.len(), 1);
    let descs = &d.groups[0].descriptors;
    assert_eq!(descs.len(), 3);
    let TransportDescriptor::Sas(sas) = &descs[0] else {
        panic!("{:?}", descs[0]);
    };
    assert_eq!(sas.phys[0].phy_id, 7);
    assert_eq!(sas.phys[0].attached_sas_address, 0x5000c50000000001);
    assert_eq!(
        descs[1],
        TransportDescriptor::Other {
            protocol: 0x0f,
            data: vec![0xaa, 0xbb]
        }
    );

    let mut r = String::new();
    write_report(&mut r, &f, &ReportOptions::default()).unwrap();
    assert!(r.contains("  Element type: Device, subenclosure id: 0\n"));
    // A single phy is labelled with the phy count plus one
    assert!(r.contains("    [2] device type: end device\n"));
    assert!(r.contains("      initiator port for: SSP  \n"));
    assert!(r.contains("      target port for:   SMP\n"));
    assert!(r.contains("      phy identifier: 0x7\n"));
    assert!(r.contains(
        "   [2] Transport protocol: No specific protocol not decoded, \
         in hex:\n"
    ));
    assert!(r.contains(
        "   [3] Transport protocol: Parallel SCSI (SPI-5) not decoded"
    ));
}

#[test]
fn control_round_trip() {
    start_log();
    let mut m = MockEnclosure::default();
    let payload = [0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x20];
    for code in [0x02, 0x04, 0x05, 0x06, 0x0c] {
        let req = ControlRequest::new(code, 0x01, &payload).unwrap();
        send_control(&mut m, &req).unwrap();
    }
    assert_eq!(m.sent.len(), 5);
    for (s, code) in m.sent.iter().zip([0x02, 0x04, 0x05, 0x06, 0x0c]) {
        let p = RawPage::parse(s).unwrap();
        assert_eq!(p.page_code(), code);
        assert_eq!(p.byte1(), 0x01);
        assert_eq!(p.payload(), payload);
    }

    for code in [0x00, 0x01, 0x03, 0x07, 0x08, 0x0a] {
        let e = ControlRequest::new(code, 0, &payload).unwrap_err();
        assert!(matches!(e, SesError::UnsupportedControlPage(c) if c == code));
    }
    assert_eq!(m.sent.len(), 5, "nothing sent for rejected pages");
}

#[test]
fn status_truncation() {
    start_log();
    let map = fetch_element_map(
        &mut MockEnclosure::with(&[scenario_config(7)]),
        &Limits::default(),
    )
    .unwrap();
    let full = status_page(7);
    for len in 0..full.len() {
        let r = RawPage::parse(&full[..len])
            .and_then(|p| ses_pages::status::decode_status(&p, &map));
        match r {
            Ok(s) => {
                assert!(len >= 8);
                assert!(s.truncated);
                assert_eq!(s.iter().count(), (len - 8) / 4);
            }
            Err(e) => {
                assert!(len < 8, "{len}");
                assert!(matches!(e, SesError::Truncated), "{e:?}");
            }
        }
    }
}

fn types_strategy() -> impl Strategy<Value = Vec<(u8, u8, String)>> {
    proptest::collection::vec((0u8..0x20, any::<u8>(), "[a-z ]{0,12}"), 0..8)
}

proptest! {
    #[test]
    fn configuration_parse_idempotent(types in types_strategy()) {
        let t: Vec<(u8, u8, &str)> =
            types.iter().map(|(t, n, s)| (*t, *n, s.as_str())).collect();
        let p = RawPage::parse(&config_page(0xfeed, &t)).unwrap();
        let a = Configuration::parse(&p, 512).unwrap();
        let b = Configuration::parse(&p, 512).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.element_map().generation(), 0xfeed);
        let headers: Vec<(u8, u8)> = a
            .element_map()
            .headers()
            .iter()
            .map(|h| (h.type_code, h.possible_elements))
            .collect();
        let expect: Vec<(u8, u8)> =
            t.iter().map(|(t, n, _)| (*t, *n)).collect();
        prop_assert_eq!(headers, expect);
    }

    #[test]
    fn configuration_truncated(types in types_strategy(), cut in 1usize..200) {
        let t: Vec<(u8, u8, &str)> =
            types.iter().map(|(t, n, s)| (*t, *n, s.as_str())).collect();
        let full = config_page(1, &t);
        let cut = cut.min(full.len());
        let r = RawPage::parse(&full[..full.len() - cut])
            .and_then(|p| Configuration::parse(&p, 512));
        prop_assert!(matches!(r, Err(SesError::Truncated)), "{:?}", r);
    }
}
