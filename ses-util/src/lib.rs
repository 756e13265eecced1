// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * SES utility support: capture directories and hex input.
 *
 * Copyright (c) 2025 Code Construct
 */

//! Support code for the `ses-util` binary.
//!
//! [`CaptureDir`] is a [`DiagTransport`] backed by a directory of captured
//! pages, so enclosure responses can be decoded offline. Received pages are
//! read from `page-XX.bin`, sent control pages are written to
//! `control-XX.bin`, where `XX` is the page code in lower case hex.

#[allow(unused)]
use log::{debug, error, info, trace, warn};

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};

use ses::{DiagTransport, TransportError, TransportResult};

/// A directory of captured pages
#[derive(Debug)]
pub struct CaptureDir {
    dir: PathBuf,
}

impl CaptureDir {
    /// Use an existing directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Path of the captured page `page_code`
    pub fn page_path(&self, page_code: u8) -> PathBuf {
        self.dir.join(format!("page-{page_code:02x}.bin"))
    }

    /// Path a control page `page_code` is written to
    pub fn control_path(&self, page_code: u8) -> PathBuf {
        self.dir.join(format!("control-{page_code:02x}.bin"))
    }
}

impl DiagTransport for CaptureDir {
    fn send_vectored(&mut self, bufs: &[&[u8]]) -> TransportResult<()> {
        let code = bufs
            .iter()
            .find_map(|b| b.first())
            .ok_or(TransportError::BadArgument)?;
        let path = self.control_path(*code);
        let mut f = File::create(&path)?;
        for b in bufs {
            f.write_all(b)?;
        }
        debug!("wrote {}", path.display());
        Ok(())
    }

    fn recv<'f>(
        &mut self,
        page_code: u8,
        buf: &'f mut [u8],
    ) -> TransportResult<&'f mut [u8]> {
        let path = self.page_path(page_code);
        let mut f = File::open(&path)?;
        // Only the allocation length is read, as a device would
        let mut n = 0;
        while n < buf.len() {
            let l = f.read(&mut buf[n..])?;
            if l == 0 {
                break;
            }
            n += l;
        }
        debug!("read {} bytes from {}", n, path.display());
        Ok(&mut buf[..n])
    }
}

/// Parses comma or whitespace separated hex bytes.
///
/// An optional `0x` prefix is accepted on each value.
pub fn parse_hex_literal(s: &str) -> Result<Vec<u8>> {
    s.split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| -> Result<u8> {
            let h = t
                .strip_prefix("0x")
                .or_else(|| t.strip_prefix("0X"))
                .unwrap_or(t);
            let v = u32::from_str_radix(h, 16)
                .with_context(|| format!("Bad hex value '{t}'"))?;
            if v > 0xff {
                bail!("Hex value '{t}' larger than 0xff");
            }
            Ok(v as u8)
        })
        .collect()
}

/// Reads hex bytes from lines of text.
///
/// Blank lines are skipped, as is anything following a `#`.
pub fn read_hex_lines(r: impl BufRead) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (n, line) in r.lines().enumerate() {
        let line = line?;
        let line = match line.split_once('#') {
            Some((l, _)) => l,
            None => &line,
        };
        let v = parse_hex_literal(line)
            .with_context(|| format!("line {}", n + 1))?;
        out.extend_from_slice(&v);
    }
    Ok(out)
}

/// Payload from a `--data` argument: a hex literal, or `-` for stdin.
pub fn data_arg(arg: &str) -> Result<Vec<u8>> {
    if arg == "-" {
        read_hex_lines(std::io::stdin().lock())
    } else {
        parse_hex_literal(arg)
    }
}
