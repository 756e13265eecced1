// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * SES diagnostic page utility.
 *
 * Copyright (c) 2025 Code Construct
 */
#[allow(unused)]
use log::{debug, error, info, trace, warn};

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

use argh::FromArgs;

use ses::{SesError, DEFAULT_MAX_RESPONSE};
use ses_pages::report::{
    write_catalogs, write_hex, write_raw, write_report, ReportOptions,
};
use ses_pages::requester::{fetch_page, fetch_raw, send_control, Limits};
use ses_pages::ControlRequest;
use ses_util::{data_arg, CaptureDir};

#[derive(FromArgs, Debug)]
#[argh(description = "SES diagnostic page utility")]
struct Args {
    #[argh(switch, short = 'd')]
    /// debug logging
    debug: bool,

    #[argh(switch)]
    /// trace logging
    trace: bool,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Command {
    Status(StatusCommand),
    Control(ControlCommand),
    List(ListCommand),
    Version(VersionCommand),
}

#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "version", description = "Print version")]
struct VersionCommand {}

#[derive(FromArgs, Debug)]
#[argh(
    subcommand,
    name = "list",
    description = "List known diagnostic pages and element types"
)]
struct ListCommand {}

#[derive(FromArgs, Debug)]
#[argh(
    subcommand,
    name = "status",
    description = "Fetch and decode a diagnostic page"
)]
struct StatusCommand {
    /// directory of captured pages
    #[argh(positional)]
    dir: PathBuf,

    /// page code, decimal or 0x prefixed hex. Default 0 (supported pages)
    #[argh(option, short = 'p', default = "ByteArg(0)")]
    page: ByteArg,

    /// print the page as a hex dump
    #[argh(switch, short = 'H')]
    hex: bool,

    /// print the page payload as hex bytes, for use as control data
    #[argh(switch, short = 'r')]
    raw: bool,

    /// omit status lines with every flag clear
    #[argh(switch, short = 'f')]
    filter: bool,

    /// print status and threshold records in hex
    #[argh(switch, short = 'i')]
    inner_hex: bool,

    /// allocation length for received pages
    #[argh(option)]
    max_len: Option<usize>,

    /// most element types accepted from the configuration page
    #[argh(option)]
    max_types: Option<usize>,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "control", description = "Send a control page")]
struct ControlCommand {
    /// directory to write the control page to
    #[argh(positional)]
    dir: PathBuf,

    /// page code, decimal or 0x prefixed hex
    #[argh(option, short = 'p')]
    page: ByteArg,

    /// page byte 1
    #[argh(option, default = "ByteArg(0)")]
    byte1: ByteArg,

    /// page payload as comma or space separated hex bytes, or '-' to
    /// read from stdin
    #[argh(option)]
    data: Option<String>,
}

/// A byte argument, decimal or hex
#[derive(Debug, Clone, Copy)]
struct ByteArg(u8);

impl FromStr for ByteArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        let v = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(h) => u8::from_str_radix(h, 16),
            None => s.parse(),
        };
        v.map(Self)
            .map_err(|e| format!("bad value '{s}', expected 0-255: {e}"))
    }
}

fn status(cmd: StatusCommand) -> Result<()> {
    if cmd.hex && cmd.raw {
        bail!("--hex and --raw can't be used together");
    }

    let mut comm = CaptureDir::new(&cmd.dir)?;
    let mut limits = Limits {
        max_response_len: cmd.max_len.unwrap_or(DEFAULT_MAX_RESPONSE),
        ..Default::default()
    };
    if let Some(m) = cmd.max_types {
        limits.max_element_types = m;
    }
    let code = cmd.page.0;

    let mut out = String::new();
    if cmd.hex || cmd.raw {
        let raw = fetch_raw(&mut comm, code, &limits)?;
        if cmd.raw {
            write_raw(&mut out, &raw)?;
        } else {
            write_hex(&mut out, &raw)?;
        }
    } else {
        let fetched = match fetch_page(&mut comm, code, &limits) {
            Err(e @ SesError::Stale { .. }) => {
                debug!("{e}");
                eprintln!("state of enclosure changed, please try again");
                std::process::exit(2);
            }
            Err(e) if e.is_retryable() => {
                eprintln!("{e}");
                std::process::exit(2);
            }
            r => r.with_context(|| format!("Page 0x{code:02x}"))?,
        };
        let opts = ReportOptions {
            filter: cmd.filter,
            inner_hex: cmd.inner_hex,
        };
        write_report(&mut out, &fetched, &opts)?;
    }
    print!("{out}");
    Ok(())
}

fn control(cmd: ControlCommand) -> Result<()> {
    let data = match &cmd.data {
        Some(d) => data_arg(d).context("Bad --data")?,
        None => Vec::new(),
    };
    let req = ControlRequest::new(cmd.page.0, cmd.byte1.0, &data)?;

    let mut comm = CaptureDir::new(&cmd.dir)?;
    println!(
        "Sending {} [0x{:x}] page, with page length={} bytes",
        req.page.name(),
        cmd.page.0,
        data.len()
    );
    send_control(&mut comm, &req)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    let level = if args.trace {
        log::LevelFilter::Trace
    } else if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    match args.command {
        Command::Version(_) => info!("ses-util {}", env!("VERSION")),
        Command::List(_) => {
            let mut out = String::new();
            write_catalogs(&mut out)?;
            print!("{out}");
        }
        Command::Status(s) => status(s)?,
        Command::Control(c) => control(c)?,
    }
    Ok(())
}
