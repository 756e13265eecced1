// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Enclosure Status page (0x02) element records.
//!
//! Every record starts with the common status byte, the remaining three
//! bytes are laid out per element type.

#[allow(unused)]
use log::{debug, error, info, trace, warn};

use deku::{DekuContainerRead, DekuRead, DekuWrite};
use num_traits::FromPrimitive;

use ses::{RawPage, Result};

use crate::catalog::{
    CoolingSpeed, ElementStatusCode, ElementType, InvalidOpKind, NvCacheUnit,
};
use crate::config::ElementMap;
use crate::records::{walk_fixed, ElementPage, Record};

pub(crate) fn read<'a, T: DekuContainerRead<'a>>(b: &'a [u8]) -> Result<T> {
    let (_, v) = T::from_bytes((b, 0))?;
    Ok(v)
}

/// Enclosure Status page header flags, page byte 1
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy, Default)]
pub struct StatusFlags {
    #[deku(pad_bits_before = "3", bits = 1)]
    pub invop: bool,
    #[deku(bits = 1)]
    pub info: bool,
    #[deku(bits = 1)]
    pub non_critical: bool,
    #[deku(bits = 1)]
    pub critical: bool,
    #[deku(bits = 1)]
    pub unrecoverable: bool,
}

impl StatusFlags {
    pub fn from_byte(b: u8) -> Result<Self> {
        read(&[b])
    }
}

/// Common status byte, byte 0 of every status record
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy, Default)]
pub struct CommonStatus {
    #[deku(pad_bits_before = "1", bits = 1)]
    pub predicted_failure: bool,
    #[deku(bits = 1)]
    pub disabled: bool,
    #[deku(bits = 1)]
    pub swap: bool,
    #[deku(bits = 4)]
    pub status: u8,
}

impl CommonStatus {
    /// `None` for reserved status codes
    pub fn status_code(&self) -> Option<ElementStatusCode> {
        ElementStatusCode::from_u8(self.status)
    }
}

/// Device slot flags, shared by Device and Array device elements
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy, Default)]
pub struct DeviceFlags {
    #[deku(bits = 1)]
    pub app_client_bypassed_a: bool,
    #[deku(bits = 1)]
    pub do_not_remove: bool,
    #[deku(bits = 1)]
    pub enc_bypassed_a: bool,
    #[deku(bits = 1)]
    pub enc_bypassed_b: bool,
    #[deku(bits = 1)]
    pub ready_to_insert: bool,
    #[deku(bits = 1)]
    pub rmv: bool,
    #[deku(bits = 1)]
    pub ident: bool,
    #[deku(bits = 1)]
    pub report: bool,

    #[deku(bits = 1)]
    pub app_client_bypassed_b: bool,
    #[deku(bits = 1)]
    pub fault_sensed: bool,
    #[deku(bits = 1)]
    pub fault_requested: bool,
    #[deku(bits = 1)]
    pub device_off: bool,
    #[deku(bits = 1)]
    pub bypassed_a: bool,
    #[deku(bits = 1)]
    pub bypassed_b: bool,
    #[deku(bits = 1)]
    pub device_bypassed_a: bool,
    #[deku(bits = 1)]
    pub device_bypassed_b: bool,
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct DeviceStatus {
    pub slot_address: u8,
    pub flags: DeviceFlags,
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct ArrayDeviceStatus {
    #[deku(bits = 1)]
    pub ok: bool,
    #[deku(bits = 1)]
    pub reserved_device: bool,
    #[deku(bits = 1)]
    pub hot_spare: bool,
    #[deku(bits = 1)]
    pub cons_check: bool,
    #[deku(bits = 1)]
    pub in_crit_array: bool,
    #[deku(bits = 1)]
    pub in_failed_array: bool,
    #[deku(bits = 1)]
    pub rebuild_remap: bool,
    #[deku(bits = 1)]
    pub rebuild_remap_abort: bool,
    pub flags: DeviceFlags,
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct PowerSupplyStatus {
    #[deku(bits = 1, pad_bits_after = "7")]
    pub ident: bool,

    #[deku(pad_bits_before = "4", bits = 1)]
    pub dc_overvoltage: bool,
    #[deku(bits = 1)]
    pub dc_undervoltage: bool,
    #[deku(bits = 1, pad_bits_after = "1")]
    pub dc_overcurrent: bool,

    #[deku(pad_bits_before = "1", bits = 1)]
    pub fail: bool,
    #[deku(bits = 1)]
    pub requested_on: bool,
    #[deku(bits = 1)]
    pub off: bool,
    #[deku(bits = 1)]
    pub overtemp_fail: bool,
    #[deku(bits = 1)]
    pub temp_warn: bool,
    #[deku(bits = 1)]
    pub ac_fail: bool,
    #[deku(bits = 1)]
    pub dc_fail: bool,
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
#[deku(endian = "big")]
pub struct CoolingStatus {
    #[deku(bits = 1, pad_bits_after = "5")]
    pub ident: bool,
    /// Fan speed in units of 10 rpm
    #[deku(bits = 10)]
    pub actual_speed: u16,

    #[deku(pad_bits_before = "1", bits = 1)]
    pub fail: bool,
    #[deku(bits = 1)]
    pub requested_on: bool,
    #[deku(bits = 1, pad_bits_after = "1")]
    pub off: bool,
    #[deku(bits = 3)]
    pub speed_code: u8,
}

impl CoolingStatus {
    pub fn rpm(&self) -> u32 {
        u32::from(self.actual_speed) * 10
    }

    pub fn speed(&self) -> Option<CoolingSpeed> {
        CoolingSpeed::from_u8(self.speed_code)
    }
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct TemperatureStatus {
    #[deku(bits = 1, pad_bits_after = "7")]
    pub ident: bool,
    /// Temperature plus 20 degrees Celsius, 0 is reserved
    pub temperature: u8,
    #[deku(pad_bits_before = "4", bits = 1)]
    pub ot_failure: bool,
    #[deku(bits = 1)]
    pub ot_warning: bool,
    #[deku(bits = 1)]
    pub ut_failure: bool,
    #[deku(bits = 1)]
    pub ut_warning: bool,
}

impl TemperatureStatus {
    /// Degrees Celsius, `None` when reserved
    pub fn celsius(&self) -> Option<i16> {
        offset_celsius(self.temperature)
    }
}

/// Temperatures are sent with a 20 degree offset, 0 is reserved.
pub fn offset_celsius(raw: u8) -> Option<i16> {
    (raw != 0).then(|| i16::from(raw) - 20)
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct DoorLockStatus {
    #[deku(bits = 1, pad_bits_after = "7")]
    pub ident: bool,
    #[deku(pad_bits_before = "15", bits = 1)]
    pub unlock: bool,
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct AudibleAlarmStatus {
    #[deku(bits = 1, pad_bits_after = "15")]
    pub ident: bool,
    #[deku(bits = 1)]
    pub request_mute: bool,
    #[deku(bits = 1, pad_bits_after = "1")]
    pub muted: bool,
    #[deku(bits = 1)]
    pub remind: bool,
    #[deku(bits = 1)]
    pub info: bool,
    #[deku(bits = 1)]
    pub non_critical: bool,
    #[deku(bits = 1)]
    pub critical: bool,
    #[deku(bits = 1)]
    pub unrecoverable: bool,
}

/// Enclosure services controller and SCC controller electronics
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct ElectronicsStatus {
    #[deku(bits = 1, pad_bits_after = "14")]
    pub ident: bool,
    #[deku(bits = 1, pad_bits_after = "8")]
    pub report: bool,
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
#[deku(endian = "big")]
pub struct NvCacheStatus {
    #[deku(bits = 1, pad_bits_after = "5")]
    pub ident: bool,
    #[deku(bits = 2)]
    pub size_multiplier: u8,
    pub size: u16,
}

impl NvCacheStatus {
    pub fn unit(&self) -> Option<NvCacheUnit> {
        NvCacheUnit::from_u8(self.size_multiplier)
    }
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
#[deku(endian = "big")]
pub struct InvalidOpStatus {
    #[deku(bits = 2)]
    pub kind: u8,
    #[deku(bits = 6)]
    pub flags: u8,
    /// Byte offset of a page format error
    pub byte_offset: u16,
}

impl InvalidOpStatus {
    pub fn kind(&self) -> Option<InvalidOpKind> {
        InvalidOpKind::from_u8(self.kind)
    }

    /// For page code errors
    pub fn page_not_supported(&self) -> bool {
        self.flags & 0x01 != 0
    }

    /// For page format errors
    pub fn bit_number(&self) -> u8 {
        self.flags & 0x07
    }
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct UpsStatus {
    /// Minutes of battery remaining
    pub battery: u8,

    #[deku(bits = 1)]
    pub ac_low: bool,
    #[deku(bits = 1)]
    pub ac_high: bool,
    #[deku(bits = 1)]
    pub ac_qual: bool,
    #[deku(bits = 1)]
    pub ac_fail: bool,
    #[deku(bits = 1)]
    pub dc_fail: bool,
    #[deku(bits = 1)]
    pub ups_fail: bool,
    #[deku(bits = 1)]
    pub warning: bool,
    #[deku(bits = 1)]
    pub intf_fail: bool,

    #[deku(bits = 1, pad_bits_after = "5")]
    pub ident: bool,
    #[deku(bits = 1)]
    pub batt_fail: bool,
    #[deku(bits = 1)]
    pub bpf: bool,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BatteryStatus {
    DischargedOrUnknown,
    Minutes(u8),
    AtLeast255,
}

impl UpsStatus {
    pub fn battery_status(&self) -> BatteryStatus {
        match self.battery {
            0 => BatteryStatus::DischargedOrUnknown,
            255 => BatteryStatus::AtLeast255,
            m => BatteryStatus::Minutes(m),
        }
    }
}

/// Display and key pad entry elements
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct IdentStatus {
    #[deku(bits = 1, pad_bits_after = "23")]
    pub ident: bool,
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct EnclosureElementStatus {
    #[deku(bits = 1, pad_bits_after = "7")]
    pub ident: bool,
    #[deku(pad_bits_before = "6", bits = 1)]
    pub failure_indication: bool,
    #[deku(bits = 1)]
    pub warning_indication: bool,
    #[deku(pad_bits_before = "6", bits = 1)]
    pub failure_requested: bool,
    #[deku(bits = 1)]
    pub warning_requested: bool,
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct ScsiPortStatus {
    #[deku(bits = 1, pad_bits_after = "7")]
    pub ident: bool,
    #[deku(pad_bits_before = "7", bits = 1)]
    pub report: bool,
    #[deku(pad_bits_before = "3", bits = 1, pad_bits_after = "2")]
    pub disabled: bool,
    #[deku(bits = 1)]
    pub loss_of_link: bool,
    #[deku(bits = 1)]
    pub xmit_fail: bool,
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct LanguageStatus {
    #[deku(bits = 1, pad_bits_after = "7")]
    pub ident: bool,
    pub language: [u8; 2],
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct CommPortStatus {
    #[deku(bits = 1, pad_bits_after = "7")]
    pub ident: bool,
    #[deku(pad_bits_before = "15", bits = 1)]
    pub disabled: bool,
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
#[deku(endian = "big")]
pub struct VoltageStatus {
    #[deku(bits = 1, pad_bits_after = "3")]
    pub ident: bool,
    #[deku(bits = 1)]
    pub warn_over: bool,
    #[deku(bits = 1)]
    pub warn_under: bool,
    #[deku(bits = 1)]
    pub crit_over: bool,
    #[deku(bits = 1)]
    pub crit_under: bool,
    /// Units of 10 mV
    pub voltage: i16,
}

impl VoltageStatus {
    pub fn volts(&self) -> f64 {
        f64::from(self.voltage) / 100.0
    }
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
#[deku(endian = "big")]
pub struct CurrentStatus {
    #[deku(bits = 1, pad_bits_after = "3")]
    pub ident: bool,
    #[deku(bits = 1, pad_bits_after = "1")]
    pub warn_over: bool,
    #[deku(bits = 1, pad_bits_after = "1")]
    pub crit_over: bool,
    /// Units of 10 mA
    pub current: i16,
}

impl CurrentStatus {
    pub fn amps(&self) -> f64 {
        f64::from(self.current) / 100.0
    }
}

/// SCSI target port and SCSI initiator port elements
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct PortEnableStatus {
    #[deku(bits = 1, pad_bits_after = "7")]
    pub ident: bool,
    #[deku(pad_bits_before = "7", bits = 1)]
    pub report: bool,
    #[deku(pad_bits_before = "7", bits = 1)]
    pub enabled: bool,
}

#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct SimpleSubenclosureStatus {
    #[deku(bits = 1, pad_bits_after = "7")]
    pub ident: bool,
    #[deku(pad_bytes_before = "1")]
    pub short_status: u8,
}

/// The type specific part of a status record, bytes 1 to 3
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StatusDetail {
    Unspecified([u8; 3]),
    Device(DeviceStatus),
    PowerSupply(PowerSupplyStatus),
    Cooling(CoolingStatus),
    Temperature(TemperatureStatus),
    DoorLock(DoorLockStatus),
    AudibleAlarm(AudibleAlarmStatus),
    EscElectronics(ElectronicsStatus),
    SccElectronics(ElectronicsStatus),
    NonvolatileCache(NvCacheStatus),
    InvalidOperation(InvalidOpStatus),
    Ups(UpsStatus),
    Display(IdentStatus),
    KeyPad(IdentStatus),
    Enclosure(EnclosureElementStatus),
    ScsiPort(ScsiPortStatus),
    Language(LanguageStatus),
    CommunicationPort(CommPortStatus),
    Voltage(VoltageStatus),
    Current(CurrentStatus),
    ScsiTargetPort(PortEnableStatus),
    ScsiInitiatorPort(PortEnableStatus),
    SimpleSubenclosure(SimpleSubenclosureStatus),
    ArrayDevice(ArrayDeviceStatus),
    /// Element type outside the known range
    Unknown([u8; 3]),
}

impl StatusDetail {
    pub fn decode(type_code: u8, b: [u8; 3]) -> Result<Self> {
        let Ok(t) = ElementType::try_from(type_code) else {
            return Ok(Self::Unknown(b));
        };
        let b = &b[..];
        Ok(match t {
            ElementType::Unspecified => Self::Unspecified([b[0], b[1], b[2]]),
            ElementType::Device => Self::Device(read(b)?),
            ElementType::PowerSupply => Self::PowerSupply(read(b)?),
            ElementType::Cooling => Self::Cooling(read(b)?),
            ElementType::TemperatureSensor => Self::Temperature(read(b)?),
            ElementType::DoorLock => Self::DoorLock(read(b)?),
            ElementType::AudibleAlarm => Self::AudibleAlarm(read(b)?),
            ElementType::EscElectronics => Self::EscElectronics(read(b)?),
            ElementType::SccElectronics => Self::SccElectronics(read(b)?),
            ElementType::NonvolatileCache => Self::NonvolatileCache(read(b)?),
            ElementType::InvalidOperationReason => {
                Self::InvalidOperation(read(b)?)
            }
            ElementType::Ups => Self::Ups(read(b)?),
            ElementType::Display => Self::Display(read(b)?),
            ElementType::KeyPad => Self::KeyPad(read(b)?),
            ElementType::Enclosure => Self::Enclosure(read(b)?),
            ElementType::ScsiPortTransceiver => Self::ScsiPort(read(b)?),
            ElementType::Language => Self::Language(read(b)?),
            ElementType::CommunicationPort => {
                Self::CommunicationPort(read(b)?)
            }
            ElementType::VoltageSensor => Self::Voltage(read(b)?),
            ElementType::CurrentSensor => Self::Current(read(b)?),
            ElementType::ScsiTargetPort => Self::ScsiTargetPort(read(b)?),
            ElementType::ScsiInitiatorPort => {
                Self::ScsiInitiatorPort(read(b)?)
            }
            ElementType::SimpleSubenclosure => {
                Self::SimpleSubenclosure(read(b)?)
            }
            ElementType::ArrayDevice => Self::ArrayDevice(read(b)?),
        })
    }
}

/// A decoded status record
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ElementStatus {
    pub common: CommonStatus,
    pub detail: StatusDetail,
}

impl ElementStatus {
    pub fn decode(type_code: u8, raw: [u8; 4]) -> Result<Self> {
        let [b0, b1, b2, b3] = raw;
        Ok(Self {
            common: read(&[b0])?,
            detail: StatusDetail::decode(type_code, [b1, b2, b3])?,
        })
    }
}

/// A decoded Enclosure Status page
pub type StatusPage = ElementPage<Record<ElementStatus>>;

impl StatusPage {
    pub fn flags(&self) -> Result<StatusFlags> {
        StatusFlags::from_byte(self.byte1)
    }
}

/// Decodes an Enclosure Status page against an element map.
pub fn decode_status(page: &RawPage, map: &ElementMap) -> Result<StatusPage> {
    walk_fixed(page, map, |h, raw| ElementStatus::decode(h.type_code, raw))
}
