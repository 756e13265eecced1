// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! Supported Diagnostic Pages (0x00) and Supported SES Diagnostic Pages
//! (0x0d).

use ses::RawPage;

/// Page codes listed in a supported pages page.
///
/// The list is expected in ascending order. The walk stops at the first
/// code lower than its predecessor, treating the rest as padding. A list
/// that isn't ascending is cut short there.
pub fn decode_supported(page: &RawPage) -> Vec<u8> {
    let mut codes = Vec::with_capacity(page.payload().len());
    let mut prev = 0u8;
    for &code in page.payload() {
        if code < prev {
            break;
        }
        codes.push(code);
        prev = code;
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_padding() {
        let p = RawPage::parse(&[0x00, 0, 0, 4, 0x00, 0x01, 0x02, 0x00])
            .unwrap();
        assert_eq!(decode_supported(&p), [0, 1, 2]);
    }

    #[test]
    fn full_list() {
        let p = RawPage::parse(&[0x0d, 0, 0, 5, 0x00, 0x01, 0x02, 0x07, 0x0a])
            .unwrap();
        assert_eq!(decode_supported(&p), [0x00, 0x01, 0x02, 0x07, 0x0a]);
        // Repeated codes are kept
        let p = RawPage::parse(&[0x00, 0, 0, 3, 0x01, 0x01, 0x02]).unwrap();
        assert_eq!(decode_supported(&p), [1, 1, 2]);
        let p = RawPage::parse(&[0x00, 0, 0, 0]).unwrap();
        assert!(decode_supported(&p).is_empty());
    }
}
