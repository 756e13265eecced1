// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Threshold In page (0x05).
//!
//! Only temperature, UPS, voltage and current elements define thresholds.

use deku::{DekuRead, DekuWrite};

use ses::{RawPage, Result};

use crate::catalog::ElementType;
use crate::config::ElementMap;
use crate::records::{walk_fixed, ElementPage, Record};
use crate::status::{offset_celsius, read};

/// A threshold record
#[derive(Debug, DekuRead, DekuWrite, PartialEq, Eq, Clone, Copy)]
pub struct ThresholdFields {
    pub high_critical: u8,
    pub high_warning: u8,
    pub low_warning: u8,
    pub low_critical: u8,
}

/// Temperature thresholds, degrees Celsius. `None` is reserved.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct TemperatureThreshold {
    pub high_critical: Option<i16>,
    pub high_warning: Option<i16>,
    pub low_warning: Option<i16>,
    pub low_critical: Option<i16>,
}

/// UPS thresholds, minutes of battery. `None` is vendor specific.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct UpsThreshold {
    pub low_warning: Option<u8>,
    pub low_critical: Option<u8>,
}

/// Thresholds in 0.5% steps from nominal.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PercentThreshold(pub ThresholdFields);

impl PercentThreshold {
    fn pct(v: u8) -> f32 {
        f32::from(v) * 0.5
    }

    pub fn high_critical(&self) -> f32 {
        Self::pct(self.0.high_critical)
    }

    pub fn high_warning(&self) -> f32 {
        Self::pct(self.0.high_warning)
    }

    pub fn low_warning(&self) -> f32 {
        Self::pct(self.0.low_warning)
    }

    pub fn low_critical(&self) -> f32 {
        Self::pct(self.0.low_critical)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Threshold {
    Temperature(TemperatureThreshold),
    Ups(UpsThreshold),
    Voltage(PercentThreshold),
    /// Only the high thresholds are defined, above nominal current
    Current(PercentThreshold),
    /// Element type without thresholds
    Undefined,
}

impl Threshold {
    pub fn decode(type_code: u8, raw: [u8; 4]) -> Result<Self> {
        let f: ThresholdFields = read(&raw)?;
        let nz = |v: u8| (v != 0).then_some(v);
        Ok(match ElementType::try_from(type_code) {
            Ok(ElementType::TemperatureSensor) => {
                Self::Temperature(TemperatureThreshold {
                    high_critical: offset_celsius(f.high_critical),
                    high_warning: offset_celsius(f.high_warning),
                    low_warning: offset_celsius(f.low_warning),
                    low_critical: offset_celsius(f.low_critical),
                })
            }
            Ok(ElementType::Ups) => Self::Ups(UpsThreshold {
                low_warning: nz(f.low_warning),
                low_critical: nz(f.low_critical),
            }),
            Ok(ElementType::VoltageSensor) => {
                Self::Voltage(PercentThreshold(f))
            }
            Ok(ElementType::CurrentSensor) => {
                Self::Current(PercentThreshold(f))
            }
            _ => Self::Undefined,
        })
    }
}

/// A decoded Threshold In page
pub type ThresholdPage = ElementPage<Record<Threshold>>;

impl ThresholdPage {
    /// Invalid operation requested, bit 4 of page byte 1
    pub fn invop(&self) -> bool {
        self.byte1 & 0x10 != 0
    }
}

/// Decodes a Threshold In page against an element map.
pub fn decode_threshold(
    page: &RawPage,
    map: &ElementMap,
) -> Result<ThresholdPage> {
    walk_fixed(page, map, |h, raw| Threshold::decode(h.type_code, raw))
}
