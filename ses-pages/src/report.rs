// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Text rendering of decoded pages.
//!
//! Three renderings are available for a fetched page: the decoded report
//! ([`write_report`]), a hex dump of the whole page ([`write_hex`]), and
//! the payload as a hex literal ([`write_raw`]) that can be fed back as
//! control page data.

use core::fmt::{self, Write};
use std::borrow::Cow;

use ses::util::{HexDump, HexLiteral};
use ses::RawPage;

use crate::catalog::{
    element_status_desc, page_code_desc, sas_device_type_desc,
    transport_protocol_desc, SasProtocol, SasProtocols, ELEMENT_TYPES,
    PAGE_CODES,
};
use crate::config::{Configuration, ElementTypeHeader};
use crate::descriptor::{DescriptorPage, SubenclosurePage};
use crate::device::{DeviceElementPage, TransportDescriptor};
use crate::records::Record;
use crate::requester::{Fetched, Page};
use crate::status::{
    BatteryStatus, DeviceFlags, ElementStatus, StatusDetail, StatusPage,
};
use crate::threshold::{Threshold, ThresholdPage};

/// Report rendering options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Omit status lines where every flag is clear
    pub filter: bool,
    /// Print status and threshold records as hex rather than decoding
    pub inner_hex: bool,
}

const TOO_SHORT: &str = "    <<<response too short>>>";

fn b(v: bool) -> u8 {
    u8::from(v)
}

/// Text up to the first NUL, as printed
fn text(t: &[u8]) -> Cow<'_, str> {
    let end = t.iter().position(|&c| c == 0).unwrap_or(t.len());
    String::from_utf8_lossy(&t[..end])
}

fn text_or_empty(t: &[u8]) -> Cow<'_, str> {
    if t.is_empty() {
        Cow::Borrowed("<empty>")
    } else {
        text(t)
    }
}

fn hex_concat(w: &mut impl Write, bytes: &[u8]) -> fmt::Result {
    for c in bytes {
        write!(w, "{c:02x}")?;
    }
    Ok(())
}

struct TypeName<'a>(&'a ElementTypeHeader);

impl fmt::Display for TypeName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.desc() {
            Some(d) => f.write_str(d),
            None => write!(f, "[0x{:x}]", self.0.type_code),
        }
    }
}

fn type_heading(
    w: &mut impl Write,
    pad: &str,
    h: &ElementTypeHeader,
) -> fmt::Result {
    writeln!(
        w,
        "{pad}Element type: {}, subenclosure id: {}",
        TypeName(h),
        h.subenclosure_id
    )
}

/// Writes the decoded report for a fetched page.
pub fn write_report(
    w: &mut impl Write,
    fetched: &Fetched,
    opts: &ReportOptions,
) -> fmt::Result {
    let raw = &fetched.raw;
    match &fetched.page {
        Page::SupportedPages(codes) => {
            write_supported(w, "Supported diagnostic pages", codes)
        }
        Page::Configuration(c) => write_configuration(w, c),
        Page::EnclosureStatus(s) => write_status_page(w, s, opts),
        Page::HelpText(t) => {
            writeln!(
                w,
                "Help text diagnostic page (for primary subenclosure):"
            )?;
            if t.is_empty() {
                writeln!(w, "  <empty>")
            } else {
                writeln!(w, "  {}", text(t))
            }
        }
        Page::StringIn(s) => {
            writeln!(
                w,
                "String In diagnostic page (for primary subenclosure):"
            )?;
            if s.is_empty() {
                writeln!(w, "  <empty>")
            } else {
                write!(w, "{}", HexDump(s))
            }
        }
        Page::Threshold(t) => write_threshold_page(w, t, opts),
        Page::ElementDescriptor(d) => write_descriptor_page(w, d),
        Page::ShortEnclosureStatus(s) => writeln!(
            w,
            "Short enclosure status diagnostic page, status=0x{s:x}"
        ),
        Page::EnclosureBusy { busy, vendor } => writeln!(
            w,
            "Enclosure busy diagnostic page, busy={} \
             [vendor specific=0x{vendor:x}]",
            b(*busy)
        ),
        Page::DeviceElementStatus(d) => write_device_page(w, d),
        Page::SubenclosureHelpText(s) => write_subenclosure_page(
            w,
            "Subenclosure help text diagnostic page",
            s,
            false,
        ),
        Page::SubenclosureString(s) => write_subenclosure_page(
            w,
            "Subenclosure string in diagnostic page",
            s,
            true,
        ),
        Page::SupportedSesPages(codes) => {
            write_supported(w, "Supported SES diagnostic pages", codes)
        }
        Page::Undecoded => {
            writeln!(
                w,
                "Cannot decode response from diagnostic page: {}",
                page_code_desc(raw.page_code()).unwrap_or("<unknown>")
            )?;
            write!(w, "{}", HexDump(raw.as_bytes()))
        }
    }
}

/// Writes a titled hex dump of the whole page, header included.
pub fn write_hex(w: &mut impl Write, raw: &RawPage) -> fmt::Result {
    match page_code_desc(raw.page_code()) {
        Some(d) => writeln!(w, "Response in hex from diagnostic page: {d}")?,
        None => writeln!(
            w,
            "Response in hex from unknown diagnostic page [0x{:x}]",
            raw.page_code()
        )?,
    }
    write!(w, "{}", HexDump(raw.as_bytes()))
}

/// Writes the page payload, without the header, as a hex literal.
pub fn write_raw(w: &mut impl Write, raw: &RawPage) -> fmt::Result {
    write!(w, "{}", HexLiteral(raw.payload()))
}

/// Lists the known page codes and element types.
pub fn write_catalogs(w: &mut impl Write) -> fmt::Result {
    writeln!(w, "Known diagnostic pages (followed by page code):")?;
    for p in PAGE_CODES {
        writeln!(w, "    {}  [0x{:x}]", p.desc, p.code)?;
    }
    writeln!(w)?;
    writeln!(
        w,
        "Known SES element type names (followed by element type code):"
    )?;
    for e in ELEMENT_TYPES {
        writeln!(w, "    {}  [0x{:x}]", e.desc, e.code)?;
    }
    Ok(())
}

fn write_supported(
    w: &mut impl Write,
    title: &str,
    codes: &[u8],
) -> fmt::Result {
    writeln!(w, "{title}:")?;
    for &c in codes {
        writeln!(
            w,
            "  {} [0x{c:x}]",
            page_code_desc(c).unwrap_or("<unknown>")
        )?;
    }
    Ok(())
}

fn write_configuration(w: &mut impl Write, c: &Configuration) -> fmt::Result {
    writeln!(w, "Configuration diagnostic page:")?;
    writeln!(
        w,
        "  number of subenclosures (other than primary): {}",
        c.num_subenclosures - 1
    )?;
    writeln!(w, "  generation code: 0x{:x}", c.generation)?;
    for s in &c.subenclosures {
        let h = &s.header;
        writeln!(w, "    Subenclosure identifier: {}", h.subenclosure_id)?;
        writeln!(
            w,
            "      relative e.s. process id: {}, number of e.s. processes: {}",
            h.relative_process_id, h.num_processes
        )?;
        writeln!(
            w,
            "      number of element types supported: {}",
            h.num_element_types
        )?;
        let Some(id) = &s.identity else {
            writeln!(w, "      enc descriptor len={} ??", h.descriptor_len())?;
            continue;
        };
        write!(w, "      logical id (hex): ")?;
        for x in id.logical_id {
            write!(w, "{x:02x} ")?;
        }
        writeln!(w)?;
        writeln!(
            w,
            "      vendor: {}  product: {}  rev: {}",
            text(&id.vendor),
            text(&id.product),
            text(&id.revision)
        )?;
        if !s.vendor_data.is_empty() {
            writeln!(w, "      vendor-specific data:")?;
            write!(w, "{}", HexDump(&s.vendor_data))?;
        }
    }
    writeln!(w)?;
    for t in &c.types {
        let h = ElementTypeHeader::from(&t.header);
        type_heading(w, "    ", &h)?;
        writeln!(
            w,
            "      possible number of elements: {}",
            h.possible_elements
        )?;
        if !t.text.is_empty() {
            writeln!(w, "      Description: {}", text(&t.text))?;
        }
    }
    Ok(())
}

fn write_status_page(
    w: &mut impl Write,
    s: &StatusPage,
    opts: &ReportOptions,
) -> fmt::Result {
    writeln!(w, "Enclosure status diagnostic page:")?;
    let f = s.flags().map_err(|_| fmt::Error)?;
    writeln!(
        w,
        "  INVOP={}, INFO={}, NON-CRIT={}, CRIT={}, UNRECOV={}",
        b(f.invop),
        b(f.info),
        b(f.non_critical),
        b(f.critical),
        b(f.unrecoverable)
    )?;
    writeln!(w, "  generation code: 0x{:x}", s.generation)?;
    for g in &s.groups {
        type_heading(w, "    ", &g.header)?;
        let r = &g.overall;
        if opts.inner_hex {
            writeln!(w, "    Overall status(hex): {}", RecordHex(&r.raw))?;
        } else {
            writeln!(w, "    Overall status:")?;
            write_status(w, "     ", r, opts.filter)?;
        }
        for (j, r) in g.elements.iter().enumerate() {
            if opts.inner_hex {
                writeln!(
                    w,
                    "      Element {} status(hex): {}",
                    j + 1,
                    RecordHex(&r.raw)
                )?;
            } else {
                writeln!(w, "      Element {} status:", j + 1)?;
                write_status(w, "       ", r, opts.filter)?;
            }
        }
    }
    if s.truncated {
        writeln!(w, "{TOO_SHORT}")?;
    }
    Ok(())
}

struct RecordHex<'a>(&'a [u8; 4]);

impl fmt::Display for RecordHex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a:02x} {b:02x} {c:02x} {d:02x}")
    }
}

fn write_device_flags(
    w: &mut impl Write,
    pad: &str,
    d: &DeviceFlags,
    filter: bool,
) -> fmt::Result {
    if !filter || d.app_client_bypassed_a || d.do_not_remove || d.enc_bypassed_a
    {
        writeln!(
            w,
            "{pad}App client bypassed A={}, Do not remove={}, \
             Enc bypassed A={}",
            b(d.app_client_bypassed_a),
            b(d.do_not_remove),
            b(d.enc_bypassed_a)
        )?;
    }
    // Ident is printed here but doesn't count for the filter
    if !filter || d.enc_bypassed_b || d.ready_to_insert || d.rmv {
        writeln!(
            w,
            "{pad}Enc bypassed B={}, Ready to insert={}, RMV={}, Ident={}",
            b(d.enc_bypassed_b),
            b(d.ready_to_insert),
            b(d.rmv),
            b(d.ident)
        )?;
    }
    if !filter
        || d.report
        || d.app_client_bypassed_b
        || d.fault_sensed
        || d.fault_requested
    {
        writeln!(
            w,
            "{pad}Report={}, App client bypassed B={}, Fault sensed={}, \
             Fault requested={}",
            b(d.report),
            b(d.app_client_bypassed_b),
            b(d.fault_sensed),
            b(d.fault_requested)
        )?;
    }
    if !filter
        || d.device_off
        || d.bypassed_a
        || d.bypassed_b
        || d.device_bypassed_a
    {
        writeln!(
            w,
            "{pad}Device off={}, Bypassed A={}, Bypassed B={}, \
             Device bypassed A={}",
            b(d.device_off),
            b(d.bypassed_a),
            b(d.bypassed_b),
            b(d.device_bypassed_a)
        )?;
    }
    if !filter || d.device_bypassed_b {
        writeln!(w, "{pad}Device bypassed B={}", b(d.device_bypassed_b))?;
    }
    Ok(())
}

/// Writes one decoded status record.
///
/// With `filter` set, lines where every flag is clear are omitted.
pub fn write_status(
    w: &mut impl Write,
    pad: &str,
    rec: &Record<ElementStatus>,
    filter: bool,
) -> fmt::Result {
    let c = &rec.value.common;
    writeln!(
        w,
        "{pad}Predicted failure={}, swap={}, status: {}",
        b(c.predicted_failure),
        b(c.swap),
        element_status_desc(c.status)
    )?;

    match &rec.value.detail {
        StatusDetail::Unspecified(_) => {
            writeln!(w, "{pad}status in hex: {}", RecordHex(&rec.raw))?;
        }
        StatusDetail::Device(d) => {
            writeln!(w, "{pad}Slot address: {}", d.slot_address)?;
            write_device_flags(w, pad, &d.flags, filter)?;
        }
        StatusDetail::PowerSupply(p) => {
            if !filter
                || p.ident
                || p.dc_overvoltage
                || p.dc_undervoltage
                || p.dc_overcurrent
            {
                writeln!(
                    w,
                    "{pad}Ident={}, DC overvoltage={}, DC undervoltage={}, \
                     DC overcurrent={}",
                    b(p.ident),
                    b(p.dc_overvoltage),
                    b(p.dc_undervoltage),
                    b(p.dc_overcurrent)
                )?;
            }
            if !filter || p.fail || p.requested_on || p.off || p.overtemp_fail
            {
                writeln!(
                    w,
                    "{pad}Fail={}, Requested on={}, Off={}, \
                     Overtemperature fail={}",
                    b(p.fail),
                    b(p.requested_on),
                    b(p.off),
                    b(p.overtemp_fail)
                )?;
            }
            if !filter || p.temp_warn || p.ac_fail || p.dc_fail {
                writeln!(
                    w,
                    "{pad}Temperature warn={}, AC fail={}, DC fail={}",
                    b(p.temp_warn),
                    b(p.ac_fail),
                    b(p.dc_fail)
                )?;
            }
        }
        StatusDetail::Cooling(f) => {
            if !filter || f.ident || f.fail || f.requested_on || f.off {
                writeln!(
                    w,
                    "{pad}Ident={}, Fail={}, Requested on={}, Off={}",
                    b(f.ident),
                    b(f.fail),
                    b(f.requested_on),
                    b(f.off)
                )?;
            }
            // all eight speed codes are defined
            let speed = f.speed().map(|s| s.desc()).unwrap_or_default();
            writeln!(w, "{pad}Actual speed={} rpm, Fan {speed}", f.rpm())?;
        }
        StatusDetail::Temperature(t) => {
            if !filter
                || t.ident
                || t.ot_failure
                || t.ot_warning
                || t.ut_failure
                || t.ut_warning
            {
                writeln!(
                    w,
                    "{pad}Ident={}, OT Failure={}, OT warning={}, \
                     UT failure={}, UT warning={}",
                    b(t.ident),
                    b(t.ot_failure),
                    b(t.ot_warning),
                    b(t.ut_failure),
                    b(t.ut_warning)
                )?;
            }
            match t.celsius() {
                Some(c) => writeln!(w, "{pad}Temperature={c} C")?,
                None => writeln!(w, "{pad}Temperature: <reserved>")?,
            }
        }
        StatusDetail::DoorLock(d) => {
            if !filter || d.ident || d.unlock {
                writeln!(
                    w,
                    "{pad}Ident={}, Unlock={}",
                    b(d.ident),
                    b(d.unlock)
                )?;
            }
        }
        StatusDetail::AudibleAlarm(a) => {
            if !filter || a.ident || a.request_mute || a.muted || a.remind {
                writeln!(
                    w,
                    "{pad}Ident={}, Request mute={}, Mute={}, Remind={}",
                    b(a.ident),
                    b(a.request_mute),
                    b(a.muted),
                    b(a.remind)
                )?;
            }
            if !filter
                || a.info
                || a.non_critical
                || a.critical
                || a.unrecoverable
            {
                writeln!(
                    w,
                    "{pad}Tone indicator: Info={}, Non-crit={}, Crit={}, \
                     Unrecov={}",
                    b(a.info),
                    b(a.non_critical),
                    b(a.critical),
                    b(a.unrecoverable)
                )?;
            }
        }
        StatusDetail::EscElectronics(e) | StatusDetail::SccElectronics(e) => {
            if !filter || e.ident || e.report {
                writeln!(
                    w,
                    "{pad}Ident={}, Report={}",
                    b(e.ident),
                    b(e.report)
                )?;
            }
        }
        StatusDetail::NonvolatileCache(n) => {
            writeln!(
                w,
                "{pad}Ident={}, Size multiplier={}, \
                 Non volatile cache size=0x{:x}",
                b(n.ident),
                n.size_multiplier,
                n.size
            )?;
            let unit = n.unit().map(|u| u.desc()).unwrap_or_default();
            writeln!(
                w,
                "{pad}Hence non volatile cache size: {} {unit}",
                n.size
            )?;
        }
        StatusDetail::InvalidOperation(i) => {
            let desc = i.kind().map(|k| k.desc()).unwrap_or_default();
            writeln!(w, "{pad}Invop type={}   {desc}", i.kind)?;
            match i.kind {
                0 => writeln!(
                    w,
                    "{pad}Page not supported={}",
                    b(i.page_not_supported())
                )?,
                1 => writeln!(
                    w,
                    "{pad}Byte offset={}, bit number={}",
                    i.byte_offset,
                    i.bit_number()
                )?,
                _ => {
                    let [_, b1, b2, b3] = rec.raw;
                    writeln!(
                        w,
                        "{pad}last 3 bytes (hex): {b1:02x} {b2:02x} {b3:02x}"
                    )?
                }
            }
        }
        StatusDetail::Ups(u) => {
            match u.battery_status() {
                BatteryStatus::DischargedOrUnknown => writeln!(
                    w,
                    "{pad}Battery status: discharged or unknown"
                )?,
                BatteryStatus::AtLeast255 => writeln!(
                    w,
                    "{pad}Battery status: 255 or more minutes remaining"
                )?,
                BatteryStatus::Minutes(m) => writeln!(
                    w,
                    "{pad}Battery status: {m} minutes remaining"
                )?,
            }
            if !filter
                || u.ac_low
                || u.ac_high
                || u.ac_qual
                || u.ac_fail
                || u.dc_fail
            {
                writeln!(
                    w,
                    "{pad}AC low={}, AC high={}, AC qual={}, AC fail={}, \
                     DC fail={}",
                    b(u.ac_low),
                    b(u.ac_high),
                    b(u.ac_qual),
                    b(u.ac_fail),
                    b(u.dc_fail)
                )?;
            }
            if !filter
                || u.ups_fail
                || u.warning
                || u.intf_fail
                || u.ident
                || u.batt_fail
                || u.bpf
            {
                writeln!(
                    w,
                    "{pad}UPS fail={}, Warn={}, Intf fail={}, Ident={}, \
                     Batt fail={},BPF={}",
                    b(u.ups_fail),
                    b(u.warning),
                    b(u.intf_fail),
                    b(u.ident),
                    b(u.batt_fail),
                    b(u.bpf)
                )?;
            }
        }
        StatusDetail::Display(i) | StatusDetail::KeyPad(i) => {
            if !filter || i.ident {
                writeln!(w, "{pad}Ident={}", b(i.ident))?;
            }
        }
        StatusDetail::Enclosure(e) => {
            if !filter
                || e.ident
                || e.failure_indication
                || e.warning_indication
            {
                writeln!(
                    w,
                    "{pad}Ident={}, Failure indication={}, \
                     Warning indication={}",
                    b(e.ident),
                    b(e.failure_indication),
                    b(e.warning_indication)
                )?;
            }
            if !filter || e.failure_requested || e.warning_requested {
                writeln!(
                    w,
                    "{pad}Failure requested={}, Warning requested={}",
                    b(e.failure_requested),
                    b(e.warning_requested)
                )?;
            }
        }
        StatusDetail::ScsiPort(p) => {
            if !filter
                || p.ident
                || p.report
                || p.disabled
                || p.loss_of_link
                || p.xmit_fail
            {
                writeln!(
                    w,
                    "{pad}Ident={}, Report={}, disabled={}, loss of link={}, \
                     Xmit fail={}",
                    b(p.ident),
                    b(p.report),
                    b(p.disabled),
                    b(p.loss_of_link),
                    b(p.xmit_fail)
                )?;
            }
        }
        StatusDetail::Language(l) => {
            writeln!(
                w,
                "{pad}Ident={}, Language code: {}",
                b(l.ident),
                text(&l.language)
            )?;
        }
        StatusDetail::CommunicationPort(c) => {
            if !filter || c.ident || c.disabled {
                writeln!(
                    w,
                    "{pad}Ident={}, Disabled={}",
                    b(c.ident),
                    b(c.disabled)
                )?;
            }
        }
        StatusDetail::Voltage(v) => {
            if !filter
                || v.ident
                || v.warn_over
                || v.warn_under
                || v.crit_over
                || v.crit_under
            {
                writeln!(
                    w,
                    "{pad}Ident={}, Warn Over={}, Warn Under={}, \
                     Crit Over={}, Crit Under={}",
                    b(v.ident),
                    b(v.warn_over),
                    b(v.warn_under),
                    b(v.crit_over),
                    b(v.crit_under)
                )?;
            }
            writeln!(w, "{pad}Voltage: {:.2} volts", v.volts())?;
        }
        StatusDetail::Current(c) => {
            if !filter || c.ident || c.warn_over || c.crit_over {
                writeln!(
                    w,
                    "{pad}Ident={}, Warn Over={}, Crit Over={}",
                    b(c.ident),
                    b(c.warn_over),
                    b(c.crit_over)
                )?;
            }
            writeln!(w, "{pad}Current: {:.2} amps", c.amps())?;
        }
        StatusDetail::ScsiTargetPort(p)
        | StatusDetail::ScsiInitiatorPort(p) => {
            if !filter || p.ident || p.report || p.enabled {
                writeln!(
                    w,
                    "{pad}Ident={}, Report={}, Enabled={}",
                    b(p.ident),
                    b(p.report),
                    b(p.enabled)
                )?;
            }
        }
        StatusDetail::SimpleSubenclosure(s) => {
            writeln!(
                w,
                "{pad}Ident={}, Short enclosure status: 0x{:x}",
                b(s.ident),
                s.short_status
            )?;
        }
        StatusDetail::ArrayDevice(a) => {
            if !filter
                || a.ok
                || a.reserved_device
                || a.hot_spare
                || a.cons_check
            {
                writeln!(
                    w,
                    "{pad}OK={}, Reserved device={}, Hot spare={}, \
                     Cons check={}",
                    b(a.ok),
                    b(a.reserved_device),
                    b(a.hot_spare),
                    b(a.cons_check)
                )?;
            }
            if !filter
                || a.in_crit_array
                || a.in_failed_array
                || a.rebuild_remap
                || a.rebuild_remap_abort
            {
                writeln!(
                    w,
                    "{pad}In crit array={}, In failed array={}, \
                     Rebuild/remap={}, R/R abort={}",
                    b(a.in_crit_array),
                    b(a.in_failed_array),
                    b(a.rebuild_remap),
                    b(a.rebuild_remap_abort)
                )?;
            }
            let d = &a.flags;
            if !filter
                || d.app_client_bypassed_a
                || d.do_not_remove
                || d.enc_bypassed_a
                || d.enc_bypassed_b
            {
                writeln!(
                    w,
                    "{pad}App client bypass A={}, Don't remove={}, \
                     Enc bypass A={}, Enc bypass B={}",
                    b(d.app_client_bypassed_a),
                    b(d.do_not_remove),
                    b(d.enc_bypassed_a),
                    b(d.enc_bypassed_b)
                )?;
            }
            if !filter || d.ready_to_insert || d.rmv || d.ident || d.report {
                writeln!(
                    w,
                    "{pad}Ready to insert={}, RMV={}, Ident={}, Report={}",
                    b(d.ready_to_insert),
                    b(d.rmv),
                    b(d.ident),
                    b(d.report)
                )?;
            }
            if !filter
                || d.app_client_bypassed_b
                || d.fault_sensed
                || d.fault_requested
                || d.device_off
            {
                writeln!(
                    w,
                    "{pad}App client bypass B={}, Fault sensed={}, \
                     Fault reqstd={}, Device off={}",
                    b(d.app_client_bypassed_b),
                    b(d.fault_sensed),
                    b(d.fault_requested),
                    b(d.device_off)
                )?;
            }
            if !filter
                || d.bypassed_a
                || d.bypassed_b
                || d.device_bypassed_a
                || d.device_bypassed_b
            {
                writeln!(
                    w,
                    "{pad}Bypassed A={}, Bypassed B={}, Dev bypassed A={}, \
                     Dev bypassed B={}",
                    b(d.bypassed_a),
                    b(d.bypassed_b),
                    b(d.device_bypassed_a),
                    b(d.device_bypassed_b)
                )?;
            }
        }
        StatusDetail::Unknown(_) => {
            writeln!(
                w,
                "{pad}Unknown element type, status in hex: {}",
                RecordHex(&rec.raw)
            )?;
        }
    }
    Ok(())
}

/// `None` as `<res>`
struct OrRes(Option<i16>);

impl fmt::Display for OrRes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("<res>"),
        }
    }
}

/// `None` as `<vendor>`
struct OrVendor(Option<u8>);

impl fmt::Display for OrVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("<vendor>"),
        }
    }
}

/// Writes one threshold record. `index` is `None` for the overall record.
pub fn write_threshold(
    w: &mut impl Write,
    pad: &str,
    rec: &Record<Threshold>,
    index: Option<usize>,
    inner_hex: bool,
) -> fmt::Result {
    let label = match index {
        None => "Overall threshold".to_string(),
        Some(j) => format!("Element {} threshold", j + 1),
    };
    if inner_hex {
        return writeln!(w, "{pad}{label} (in hex): {}", RecordHex(&rec.raw));
    }

    match &rec.value {
        Threshold::Temperature(t) => {
            writeln!(
                w,
                "{pad}{label}: high critical={}, high warning={}",
                OrRes(t.high_critical),
                OrRes(t.high_warning)
            )?;
            writeln!(
                w,
                "{pad}  low warning={}, low critical={} \
                 (in degrees Celsius)",
                OrRes(t.low_warning),
                OrRes(t.low_critical)
            )?;
        }
        Threshold::Ups(u) => {
            writeln!(
                w,
                "{pad}{label}: low warning={}, low critical={} (in minutes)",
                OrVendor(u.low_warning),
                OrVendor(u.low_critical)
            )?;
        }
        Threshold::Voltage(v) => {
            writeln!(
                w,
                "{pad}{label}: high critical={:.1} %, high warning={:.1} %",
                v.high_critical(),
                v.high_warning()
            )?;
            writeln!(
                w,
                "{pad}  low warning={:.1} %, low critical={:.1} % \
                 (from nominal voltage)",
                v.low_warning(),
                v.low_critical()
            )?;
        }
        Threshold::Current(c) => {
            writeln!(
                w,
                "{pad}{label}: high critical={:.1} %, high warning={:.1} %",
                c.high_critical(),
                c.high_warning()
            )?;
            writeln!(w, "{pad}  (above nominal current)")?;
        }
        Threshold::Undefined => (),
    }
    Ok(())
}

fn write_threshold_page(
    w: &mut impl Write,
    t: &ThresholdPage,
    opts: &ReportOptions,
) -> fmt::Result {
    writeln!(w, "Threshold In diagnostic page:")?;
    writeln!(w, "  INVOP={}", b(t.invop()))?;
    writeln!(w, "  generation code: 0x{:x}", t.generation)?;
    for g in &t.groups {
        type_heading(w, "    ", &g.header)?;
        write_threshold(w, "    ", &g.overall, None, opts.inner_hex)?;
        for (j, r) in g.elements.iter().enumerate() {
            write_threshold(w, "      ", r, Some(j), opts.inner_hex)?;
        }
    }
    if t.truncated {
        writeln!(w, "{TOO_SHORT}")?;
    }
    Ok(())
}

fn write_descriptor_page(
    w: &mut impl Write,
    d: &DescriptorPage,
) -> fmt::Result {
    writeln!(w, "Element descriptor In diagnostic page:")?;
    writeln!(w, "  generation code: 0x{:x}", d.generation)?;
    for g in &d.groups {
        type_heading(w, "    ", &g.header)?;
        writeln!(w, "    Overall descriptor: {}", text_or_empty(&g.overall))?;
        for (j, e) in g.elements.iter().enumerate() {
            writeln!(
                w,
                "      Element {} descriptor: {}",
                j + 1,
                text_or_empty(e)
            )?;
        }
    }
    if d.truncated {
        writeln!(w, "{TOO_SHORT}")?;
    }
    Ok(())
}

struct Roles(SasProtocols);

impl fmt::Display for Roles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = |p, s| if self.0.contains(p) { s } else { "" };
        write!(
            f,
            "{} {} {}",
            r(SasProtocol::Ssp, "SSP"),
            r(SasProtocol::Stp, "STP"),
            r(SasProtocol::Smp, "SMP")
        )
    }
}

fn write_transport(
    w: &mut impl Write,
    d: &TransportDescriptor,
    index: usize,
) -> fmt::Result {
    let n = index + 1;
    match d {
        TransportDescriptor::FibreChannel(fc) => {
            writeln!(
                w,
                "   [{n}] Transport protocol: FCP, number of ports: {}",
                fc.num_ports
            )?;
            write!(w, "    node_name: ")?;
            hex_concat(w, &fc.node_name)?;
            writeln!(w)?;
            for (j, p) in fc.ports.iter().enumerate() {
                writeln!(
                    w,
                    "    [{}] port loop position: {}, \
                     port requested hard address: {}",
                    j + 1,
                    p.loop_position,
                    p.hard_address
                )?;
                write!(w, "      n_port identifier: ")?;
                hex_concat(w, &p.n_port_id)?;
                write!(w, "\n      n_port name: ")?;
                hex_concat(w, &p.n_port_name)?;
                writeln!(w)?;
            }
        }
        TransportDescriptor::Sas(sas) => {
            writeln!(
                w,
                "   [{n}] Transport protocol: SAS, number of phys: {}",
                sas.num_phys
            )?;
            writeln!(w, "    not all phys: {}", b(sas.not_all_phys))?;
            // Every phy is labelled with the phy count plus one
            let label = usize::from(sas.num_phys) + 1;
            for p in &sas.phys {
                writeln!(
                    w,
                    "    [{label}] device type: {}",
                    sas_device_type_desc(p.device_type)
                )?;
                writeln!(
                    w,
                    "      initiator port for: {}",
                    Roles(p.initiator)
                )?;
                writeln!(w, "      target port for: {}", Roles(p.target))?;
                writeln!(
                    w,
                    "      attached SAS address: {:016x}",
                    p.attached_sas_address
                )?;
                writeln!(w, "      SAS address: {:016x}", p.sas_address)?;
                writeln!(w, "      phy identifier: 0x{:x}", p.phy_id)?;
            }
        }
        TransportDescriptor::Other { protocol, data } => {
            writeln!(
                w,
                "   [{n}] Transport protocol: {} not decoded, in hex:",
                transport_protocol_desc(*protocol)
            )?;
            write!(w, "{}", HexDump(data))?;
        }
    }
    Ok(())
}

fn write_device_page(
    w: &mut impl Write,
    d: &DeviceElementPage,
) -> fmt::Result {
    writeln!(w, "Device element status diagnostic page:")?;
    writeln!(w, "  generation code: 0x{:x}", d.generation)?;
    for g in &d.groups {
        type_heading(w, "  ", &g.header)?;
        for (j, desc) in g.descriptors.iter().enumerate() {
            write_transport(w, desc, j)?;
        }
    }
    if d.truncated {
        writeln!(w, "{TOO_SHORT}")?;
    }
    Ok(())
}

fn write_subenclosure_page(
    w: &mut impl Write,
    title: &str,
    s: &SubenclosurePage,
    as_hex: bool,
) -> fmt::Result {
    writeln!(w, "{title}:")?;
    writeln!(
        w,
        "  number of subenclosures (other than primary): {}",
        s.num_subenclosures - 1
    )?;
    writeln!(w, "  generation code: 0x{:x}", s.generation)?;
    for r in &s.records {
        writeln!(w, "   subenclosure identifier: {}", r.subenclosure_id)?;
        if r.data.is_empty() {
            writeln!(w, "    <empty>")?;
        } else if as_hex {
            write!(w, "{}", HexDump(&r.data))?;
        } else {
            writeln!(w, "    {}", text(&r.data))?;
        }
    }
    if s.truncated {
        writeln!(w, "{TOO_SHORT}")?;
    }
    Ok(())
}
