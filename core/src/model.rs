use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{OrderedCounts, OrderedMap};

/// OS label used when a host carries no fingerprint match.
pub const UNKNOWN_OS: &str = "Unknown";

/// Number of entries kept in a report's port distribution.
pub const TOP_PORTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Up,
    Down,
}

impl HostStatus {
    pub fn from_raw(raw: &str) -> Self {
        if raw == "up" { HostStatus::Up } else { HostStatus::Down }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
    Filtered,
    Other,
}

impl PortState {
    /// Verbatim mapping of the scanner's state string; anything unrecognised
    /// (`open|filtered`, `unfiltered`, ...) is `Other`.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "open" => PortState::Open,
            "closed" => PortState::Closed,
            "filtered" => PortState::Filtered,
            _ => PortState::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificatePosture {
    Valid,
    Expired,
    SelfSigned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRecord {
    pub port: u16,
    pub protocol: String,
    pub state: PortState,
    pub reason: String,
    pub service: String,
    pub product: String,
    pub version: String,
    /// Output of the last TLS diagnostic that ran against this port.
    pub tls_output: Option<String>,
    /// Every TLS diagnostic's output, concatenated in document order.
    pub script_output: String,
}

impl PortRecord {
    pub fn new(port: u16, protocol: impl Into<String>, state: PortState) -> Self {
        PortRecord {
            port,
            protocol: protocol.into(),
            state,
            reason: String::new(),
            service: String::new(),
            product: String::new(),
            version: String::new(),
            tls_output: None,
            script_output: String::new(),
        }
    }

    /// Port identifier, e.g. `22/tcp`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.port, self.protocol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub address: String,
    pub hostname: String,
    pub os_guess: String,
    pub mac_address: String,
    pub mac_vendor: String,
    pub status: HostStatus,
    pub ports: OrderedMap<PortRecord>,
}

impl HostRecord {
    pub fn new(address: impl Into<String>, status: HostStatus) -> Self {
        HostRecord {
            address: address.into(),
            hostname: String::new(),
            os_guess: UNKNOWN_OS.to_string(),
            mac_address: String::new(),
            mac_vendor: String::new(),
            status,
            ports: OrderedMap::new(),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == HostStatus::Up
    }

    /// Add a port under its identifier; a repeated identifier replaces the earlier entry.
    pub fn insert_port(&mut self, port: PortRecord) {
        self.ports.insert(port.key(), port);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Every scan file examined, including the ones that were skipped.
    pub total_files: u64,
    /// Distinct addresses of Up hosts.
    pub live_hosts: u64,
    pub total_port_entries: u64,
    pub unique_port_count: u64,
    pub skipped_files: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsPosture {
    pub valid: u64,
    pub expired: u64,
    pub self_signed: u64,
}

impl TlsPosture {
    pub fn record(&mut self, posture: CertificatePosture) {
        match posture {
            CertificatePosture::Valid => self.valid += 1,
            CertificatePosture::Expired => self.expired += 1,
            CertificatePosture::SelfSigned => self.self_signed += 1,
        }
    }

    pub fn merge(&mut self, other: &TlsPosture) {
        self.valid += other.valid;
        self.expired += other.expired;
        self.self_signed += other.self_signed;
    }

    pub fn total(&self) -> u64 {
        self.valid + self.expired + self.self_signed
    }
}

/// Per-host entry of an [`AggregateReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSummary {
    pub hostname: String,
    pub os: String,
    pub mac: String,
    pub vendor: String,
    pub status: HostStatus,
    pub ports: OrderedMap<PortRecord>,
    pub open_ports: u64,
    pub closed_ports: u64,
    pub filtered_ports: u64,
}

/// Aggregate of one date's scan batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub scan_date: String,
    /// RFC 3339 build time; the only field that differs between rebuilds of
    /// an unchanged directory.
    pub generated_at: String,
    pub summary: Summary,
    pub os_distribution: OrderedCounts,
    pub port_distribution: OrderedCounts,
    pub tls_posture: TlsPosture,
    pub hosts: BTreeMap<String, HostSummary>,
}

impl AggregateReport {
    pub fn same_content(&self, other: &AggregateReport) -> bool {
        self.scan_date == other.scan_date
            && self.summary == other.summary
            && self.os_distribution == other.os_distribution
            && self.port_distribution == other.port_distribution
            && self.tls_posture == other.tls_posture
            && self.hosts == other.hosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_state_mapping_is_verbatim() {
        assert_eq!(PortState::from_raw("open"), PortState::Open);
        assert_eq!(PortState::from_raw("closed"), PortState::Closed);
        assert_eq!(PortState::from_raw("filtered"), PortState::Filtered);
        assert_eq!(PortState::from_raw("open|filtered"), PortState::Other);
        assert_eq!(PortState::from_raw("Open"), PortState::Other);
    }

    #[test]
    fn host_status_only_up_is_up() {
        assert_eq!(HostStatus::from_raw("up"), HostStatus::Up);
        assert_eq!(HostStatus::from_raw("down"), HostStatus::Down);
        assert_eq!(HostStatus::from_raw("unknown"), HostStatus::Down);
    }

    #[test]
    fn port_key_and_replacement() {
        let mut host = HostRecord::new("10.0.0.5", HostStatus::Up);
        assert_eq!(host.os_guess, UNKNOWN_OS);
        host.insert_port(PortRecord::new(22, "tcp", PortState::Closed));
        host.insert_port(PortRecord::new(22, "udp", PortState::Open));
        host.insert_port(PortRecord::new(22, "tcp", PortState::Open));
        assert_eq!(host.ports.len(), 2);
        assert_eq!(host.ports.get("22/tcp").unwrap().state, PortState::Open);
    }

    #[test]
    fn posture_counts() {
        let mut t = TlsPosture::default();
        t.record(CertificatePosture::SelfSigned);
        t.record(CertificatePosture::Valid);
        t.record(CertificatePosture::Valid);
        assert_eq!((t.valid, t.expired, t.self_signed), (2, 0, 1));
        assert_eq!(t.total(), 3);
        let json = serde_json::to_string(&CertificatePosture::SelfSigned).unwrap();
        assert_eq!(json, "\"self_signed\"");
    }
}
