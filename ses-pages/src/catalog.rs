// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Code to description tables, and the enumerations built on them.
//!
//! Tables are kept sorted ascending by code, [`lookup`] relies on that.

use enumset::{EnumSet, EnumSetType};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use ses::SesError;

/// A code and its description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeDesc {
    pub code: u8,
    pub desc: &'static str,
}

const fn cd(code: u8, desc: &'static str) -> CodeDesc {
    CodeDesc { code, desc }
}

/// Known diagnostic pages
pub static PAGE_CODES: &[CodeDesc] = &[
    cd(0x00, "Supported diagnostic pages"),
    cd(0x01, "Configuration (SES)"),
    cd(0x02, "Enclosure status/control (SES)"),
    cd(0x03, "Help text (SES)"),
    cd(0x04, "String In/Out (SES)"),
    cd(0x05, "Threshold In/Out (SES)"),
    cd(0x06, "Array Status/Control (SES, obsolete)"),
    cd(0x07, "Element descriptor (SES)"),
    cd(0x08, "Short enclosure status (SES)"),
    cd(0x09, "Enclosure busy (SES-2)"),
    cd(0x0a, "Device element status (SES-2)"),
    cd(0x0b, "Subenclosure help text (SES-2)"),
    cd(0x0c, "Subenclosure string In/Out (SES-2)"),
    cd(0x0d, "Supported SES diagnostic pages (SES-2)"),
    cd(0x3f, "Protocol specific SAS (SAS-1)"),
    cd(0x40, "Translate address (SBC)"),
    cd(0x41, "Device status (SBC)"),
];

/// Known element types
pub static ELEMENT_TYPES: &[CodeDesc] = &[
    cd(0x00, "Unspecified"),
    cd(0x01, "Device"),
    cd(0x02, "Power supply"),
    cd(0x03, "Cooling"),
    cd(0x04, "Temperature sense"),
    cd(0x05, "Door lock"),
    cd(0x06, "Audible alarm"),
    cd(0x07, "Enclosure service controller electronics"),
    cd(0x08, "SCC controller electronics"),
    cd(0x09, "Nonvolatile cache"),
    cd(0x0a, "Invalid operation reason"),
    cd(0x0b, "Uninterruptible power supply"),
    cd(0x0c, "Display"),
    cd(0x0d, "Key pad entry"),
    cd(0x0e, "Enclosure"),
    cd(0x0f, "SCSI port/transceiver"),
    cd(0x10, "Language"),
    cd(0x11, "Communication port"),
    cd(0x12, "Voltage sensor"),
    cd(0x13, "Current sensor"),
    cd(0x14, "SCSI target port"),
    cd(0x15, "SCSI initiator port"),
    cd(0x16, "Simple subenclosure"),
    cd(0x17, "Array device"),
];

/// Finds the description for `code` in an ascending table.
///
/// Returns `None` as soon as the table passes where `code` would be.
pub fn lookup(table: &[CodeDesc], code: u8) -> Option<&'static str> {
    for e in table {
        if e.code == code {
            return Some(e.desc);
        } else if code < e.code {
            return None;
        }
    }
    None
}

/// Description of a diagnostic page code
pub fn page_code_desc(code: u8) -> Option<&'static str> {
    lookup(PAGE_CODES, code)
}

/// Description of an element type code
pub fn element_type_desc(code: u8) -> Option<&'static str> {
    lookup(ELEMENT_TYPES, code)
}

/// SES element types
#[allow(missing_docs)]
#[derive(
    FromPrimitive, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy,
)]
#[repr(u8)]
pub enum ElementType {
    Unspecified = 0x00,
    Device = 0x01,
    PowerSupply = 0x02,
    Cooling = 0x03,
    TemperatureSensor = 0x04,
    DoorLock = 0x05,
    AudibleAlarm = 0x06,
    EscElectronics = 0x07,
    SccElectronics = 0x08,
    NonvolatileCache = 0x09,
    InvalidOperationReason = 0x0a,
    Ups = 0x0b,
    Display = 0x0c,
    KeyPad = 0x0d,
    Enclosure = 0x0e,
    ScsiPortTransceiver = 0x0f,
    Language = 0x10,
    CommunicationPort = 0x11,
    VoltageSensor = 0x12,
    CurrentSensor = 0x13,
    ScsiTargetPort = 0x14,
    ScsiInitiatorPort = 0x15,
    SimpleSubenclosure = 0x16,
    ArrayDevice = 0x17,
}

impl ElementType {
    pub fn desc(&self) -> &'static str {
        element_type_desc(*self as u8).unwrap_or("<unknown>")
    }
}

impl TryFrom<u8> for ElementType {
    type Error = SesError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::from_u8(v).ok_or(SesError::UnknownType(v))
    }
}

/// Element status code, low nibble of the common status byte
#[allow(missing_docs)]
#[derive(FromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum ElementStatusCode {
    Unsupported = 0,
    Ok,
    Critical,
    NonCritical,
    Unrecoverable,
    NotInstalled,
    Unknown,
    NotAvailable,
}

impl ElementStatusCode {
    pub fn desc(&self) -> &'static str {
        match self {
            Self::Unsupported => "Unsupported",
            Self::Ok => "OK",
            Self::Critical => "Critical",
            Self::NonCritical => "Non-critical",
            Self::Unrecoverable => "Unrecoverable",
            Self::NotInstalled => "Not installed",
            Self::Unknown => "Unknown",
            Self::NotAvailable => "Not available",
        }
    }
}

/// Description of a 4-bit element status code, reserved codes included
pub fn element_status_desc(code: u8) -> String {
    match ElementStatusCode::from_u8(code) {
        Some(s) => s.desc().to_string(),
        None => format!("reserved [{code}]"),
    }
}

/// Cooling element actual speed code
#[allow(missing_docs)]
#[derive(FromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum CoolingSpeed {
    Stopped = 0,
    Lowest,
    SecondLowest,
    ThirdLowest,
    Intermediate,
    ThirdHighest,
    SecondHighest,
    Highest,
}

impl CoolingSpeed {
    pub fn desc(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Lowest => "at lowest speed",
            Self::SecondLowest => "at second lowest speed",
            Self::ThirdLowest => "at third lowest speed",
            Self::Intermediate => "at intermediate speed",
            Self::ThirdHighest => "at third highest speed",
            Self::SecondHighest => "at second highest speed",
            Self::Highest => "at highest speed",
        }
    }
}

/// Nonvolatile cache size multiplier
#[allow(missing_docs)]
#[derive(FromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum NvCacheUnit {
    Bytes = 0,
    KiB,
    MiB,
    GiB,
}

impl NvCacheUnit {
    pub fn desc(&self) -> &'static str {
        match self {
            Self::Bytes => "Bytes",
            Self::KiB => "KiB",
            Self::MiB => "MiB",
            Self::GiB => "GiB",
        }
    }
}

/// Invalid operation reason type, top two bits of status byte 1
#[allow(missing_docs)]
#[derive(FromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum InvalidOpKind {
    PageCodeError = 0,
    PageFormatError,
    Reserved,
    VendorSpecific,
}

impl InvalidOpKind {
    pub fn desc(&self) -> &'static str {
        match self {
            Self::PageCodeError => "SEND DIAGNOSTIC page code error",
            Self::PageFormatError => "SEND DIAGNOSTIC page format error",
            Self::Reserved => "Reserved",
            Self::VendorSpecific => "Vendor specific error",
        }
    }
}

/// Transport protocol identifiers
static TRANSPORT_PROTOCOLS: [&str; 16] = [
    "Fibre Channel (FCP-2)",
    "Parallel SCSI (SPI-5)",
    "SSA (SSA-S3P)",
    "IEEE 1394 (SBP-3)",
    "Remote Direct Memory Access (RDMA)",
    "Internet SCSI (iSCSI)",
    "Serial Attached SCSI (SAS)",
    "Automation/Drive Interface Transport Protocol (ADT)",
    "ATA Packet Interface (ATA/ATAPI-7)",
    "0x9",
    "0xa",
    "0xb",
    "0xc",
    "0xd",
    "0xe",
    "No specific protocol",
];

/// Transport protocol identifier, low nibble
#[allow(missing_docs)]
#[derive(FromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum TransportProtocol {
    FibreChannel = 0x0,
    ParallelScsi = 0x1,
    Ssa = 0x2,
    Ieee1394 = 0x3,
    Rdma = 0x4,
    Iscsi = 0x5,
    Sas = 0x6,
    Adt = 0x7,
    Ata = 0x8,
    NoSpecific = 0xf,
}

/// Description of a transport protocol identifier. Only the low nibble is
/// used.
pub fn transport_protocol_desc(id: u8) -> &'static str {
    TRANSPORT_PROTOCOLS[usize::from(id & 0x0f)]
}

/// SAS attached device type
#[allow(missing_docs)]
#[derive(FromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum SasDeviceType {
    NoDevice = 0,
    EndDevice,
    EdgeExpander,
    FanoutExpander,
}

/// Description of a 3-bit SAS device type
pub fn sas_device_type_desc(code: u8) -> String {
    match SasDeviceType::from_u8(code) {
        Some(SasDeviceType::NoDevice) => "no device attached".into(),
        Some(SasDeviceType::EndDevice) => "end device".into(),
        Some(SasDeviceType::EdgeExpander) => "edge expander device".into(),
        Some(SasDeviceType::FanoutExpander) => "fanout expander device".into(),
        None => format!("reserved [{code}]"),
    }
}

/// SAS port roles, as the bit position in the initiator and target bytes
#[derive(EnumSetType, Debug)]
pub enum SasProtocol {
    Smp = 1,
    Stp = 2,
    Ssp = 3,
}

pub type SasProtocols = EnumSet<SasProtocol>;

/// Decodes an initiator or target port byte. Other bits are ignored.
pub fn sas_protocols(b: u8) -> SasProtocols {
    EnumSet::<SasProtocol>::from_u8(b & EnumSet::<SasProtocol>::all().as_u8())
}
