//! Turn one nmap XML scan file into a host record, or a reason to skip it.
//!
//! Parsing never fails outward: whatever is wrong with a file becomes a
//! [`SkipReason`], so one bad file cannot stop a batch.

mod xml;

use scanboard_core::{HostRecord, HostStatus, PortRecord, PortState, UNKNOWN_OS};
use std::io;
use thiserror::Error;

/// Why a scan file contributed no host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("unreadable file: {0}")]
    Unreadable(String),
    #[error("malformed XML: {0}")]
    Malformed(String),
    #[error("no host element")]
    NoHost,
    #[error("host has no status element")]
    NoStatus,
    #[error("host state is {0:?}, not up")]
    NotUp(String),
    #[error("host has no usable address")]
    NoAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// An Up host; its address is `record.address`.
    Host(HostRecord),
    Skip(SkipReason),
}

impl ParseOutcome {
    pub fn is_host(&self) -> bool {
        matches!(self, ParseOutcome::Host(_))
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            ParseOutcome::Skip(r) => Some(r),
            ParseOutcome::Host(_) => None,
        }
    }
}

/// Parse the result of reading a scan file. Read errors become
/// [`SkipReason::Unreadable`].
pub fn parse_loaded(read: io::Result<Vec<u8>>) -> ParseOutcome {
    match read {
        Ok(bytes) => parse_scan(&bytes),
        Err(e) => ParseOutcome::Skip(SkipReason::Unreadable(e.to_string())),
    }
}

/// Parse raw scan bytes. Only the first `<host>` element is considered.
pub fn parse_scan(bytes: &[u8]) -> ParseOutcome {
    let text = match std::str::from_utf8(bytes) {
        Ok(t) => t.trim_start_matches('\u{feff}'),
        Err(e) => return ParseOutcome::Skip(SkipReason::Malformed(e.to_string())),
    };
    let run: xml::NmapRun = match quick_xml::de::from_str(text) {
        Ok(run) => run,
        Err(e) => return ParseOutcome::Skip(SkipReason::Malformed(e.to_string())),
    };
    let Some(host) = run.hosts.into_iter().next() else {
        return ParseOutcome::Skip(SkipReason::NoHost);
    };
    let Some(status) = host.status.as_ref() else {
        return ParseOutcome::Skip(SkipReason::NoStatus);
    };
    if HostStatus::from_raw(&status.state) != HostStatus::Up {
        return ParseOutcome::Skip(SkipReason::NotUp(status.state.clone()));
    }
    let Some(address) = primary_address(&host.addresses) else {
        return ParseOutcome::Skip(SkipReason::NoAddress);
    };
    ParseOutcome::Host(build_record(address, host))
}

/// First non-empty IPv4 address, falling back to IPv6.
fn primary_address(addresses: &[xml::Address]) -> Option<String> {
    ["ipv4", "ipv6"].iter().find_map(|kind| {
        addresses
            .iter()
            .find(|a| a.addr_type == *kind && !a.addr.trim().is_empty())
            .map(|a| a.addr.trim().to_string())
    })
}

fn build_record(address: String, host: xml::Host) -> HostRecord {
    let mut record = HostRecord::new(address, HostStatus::Up);
    if let Some(name) = host.hostnames.and_then(|h| h.names.into_iter().next()) {
        record.hostname = name.name;
    }
    record.os_guess = host
        .os
        .and_then(|os| os.matches.into_iter().next())
        .map(|m| m.name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN_OS.to_string());
    if let Some(mac) = host.addresses.iter().find(|a| a.addr_type == "mac") {
        record.mac_address = mac.addr.clone();
        record.mac_vendor = mac.vendor.clone().unwrap_or_default();
    }
    for port in host.ports.map(|p| p.ports).unwrap_or_default() {
        if let Some(p) = build_port(port) {
            record.insert_port(p);
        }
    }
    record
}

/// A port needs a numeric id and a state to be worth keeping.
fn build_port(port: xml::Port) -> Option<PortRecord> {
    let number: u16 = port.portid.trim().parse().ok().filter(|n| *n != 0)?;
    let state = port.state?;
    let mut record = PortRecord::new(number, port.protocol, PortState::from_raw(&state.state));
    record.reason = state.reason;
    if let Some(svc) = port.service {
        record.service = svc.name;
        record.product = svc.product;
        record.version = svc.version;
    }
    for script in port.scripts.into_iter().filter(|s| s.id.contains("tls")) {
        record.script_output.push_str(&script.output);
        record.tls_output = Some(script.output);
    }
    Some(record)
}
