// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * SES diagnostic page decoding and control.
 *
 * Copyright (c) 2025 Code Construct
 */

#![forbid(unsafe_code)]

//! Decoders for SES diagnostic pages.
//!
//! Element-keyed pages (Enclosure Status, Threshold In, Element Descriptor,
//! Device Element Status) only make sense against the element map taken
//! from the Configuration page. [`requester::fetch_page`] fetches both and
//! checks the generation codes agree before decoding.

pub mod catalog;
pub mod config;
pub mod control;
pub mod descriptor;
pub mod device;
pub mod records;
pub mod report;
pub mod requester;
pub mod status;
pub mod supported;
pub mod threshold;

pub use catalog::ElementType;
pub use config::{Configuration, ElementMap, ElementTypeHeader};
pub use control::{ControlPage, ControlRequest};
pub use records::{ElementPage, Record, TypeRecords};
pub use report::ReportOptions;
pub use requester::{Fetched, Limits, Page};
