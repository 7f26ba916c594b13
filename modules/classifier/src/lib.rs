//! Derived attributes of a host record: certificate posture per TLS-probed
//! port and open/closed/filtered port tallies.

use scanboard_core::{CertificatePosture, HostRecord, PortRecord, PortState, TlsPosture};

/// One row of the posture rule table: a case-insensitive substring and the
/// posture it selects.
#[derive(Debug, Clone, Copy)]
pub struct PostureRule {
    pub needle: &'static str,
    pub posture: CertificatePosture,
}

/// Evaluated top to bottom, first match wins. Text matching no rule is Valid.
pub const POSTURE_RULES: &[PostureRule] = &[
    PostureRule { needle: "self-signed", posture: CertificatePosture::SelfSigned },
    PostureRule { needle: "expired", posture: CertificatePosture::Expired },
];

pub fn classify_posture(tls_output: &str) -> CertificatePosture {
    classify_with(POSTURE_RULES, tls_output)
}

pub fn classify_with(rules: &[PostureRule], tls_output: &str) -> CertificatePosture {
    let lower = tls_output.to_lowercase();
    rules
        .iter()
        .find(|rule| lower.contains(rule.needle))
        .map(|rule| rule.posture)
        .unwrap_or(CertificatePosture::Valid)
}

/// Posture of a port, or `None` when no TLS diagnostic produced output.
pub fn port_posture(port: &PortRecord) -> Option<CertificatePosture> {
    port.tls_output
        .as_deref()
        .filter(|out| !out.is_empty())
        .map(classify_posture)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortTally {
    pub open: u64,
    pub closed: u64,
    pub filtered: u64,
}

/// Count ports by state. `Other` ports are present on the host but land in
/// none of the three buckets.
pub fn tally_ports(host: &HostRecord) -> PortTally {
    let mut tally = PortTally::default();
    for port in host.ports.values() {
        match port.state {
            PortState::Open => tally.open += 1,
            PortState::Closed => tally.closed += 1,
            PortState::Filtered => tally.filtered += 1,
            PortState::Other => {}
        }
    }
    tally
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostClassification {
    pub tally: PortTally,
    pub postures: TlsPosture,
}

pub fn classify_host(host: &HostRecord) -> HostClassification {
    let mut postures = TlsPosture::default();
    for posture in host.ports.values().filter_map(port_posture) {
        postures.record(posture);
    }
    HostClassification { tally: tally_ports(host), postures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanboard_core::HostStatus;

    fn tls_port(port: u16, output: Option<&str>) -> PortRecord {
        let mut p = PortRecord::new(port, "tcp", PortState::Open);
        p.tls_output = output.map(str::to_string);
        p
    }

    #[test]
    fn self_signed_wins_over_expired() {
        assert_eq!(
            classify_posture("Self-signed certificate; also expired on 2023-01-01"),
            CertificatePosture::SelfSigned
        );
    }

    #[test]
    fn ordered_rules() {
        assert_eq!(classify_posture("certificate EXPIRED"), CertificatePosture::Expired);
        assert_eq!(classify_posture("SELF-SIGNED"), CertificatePosture::SelfSigned);
        assert_eq!(classify_posture("Subject: commonName=example.org"), CertificatePosture::Valid);
        assert_eq!(classify_posture("self signed"), CertificatePosture::Valid);
    }

    #[test]
    fn rule_table_is_swappable() {
        let rules = [PostureRule { needle: "expired", posture: CertificatePosture::Expired }];
        assert_eq!(classify_with(&rules, "self-signed, expired"), CertificatePosture::Expired);
        assert_eq!(classify_with(&[], "expired"), CertificatePosture::Valid);
    }

    #[test]
    fn no_tls_output_means_no_posture() {
        assert_eq!(port_posture(&tls_port(80, None)), None);
        assert_eq!(port_posture(&tls_port(443, Some(""))), None);
        assert_eq!(port_posture(&tls_port(443, Some("ok"))), Some(CertificatePosture::Valid));
    }

    #[test]
    fn tri_state_tally_ignores_other() {
        let mut host = HostRecord::new("10.0.0.1", HostStatus::Up);
        host.insert_port(PortRecord::new(22, "tcp", PortState::Open));
        host.insert_port(PortRecord::new(23, "tcp", PortState::Closed));
        host.insert_port(PortRecord::new(25, "tcp", PortState::Filtered));
        host.insert_port(PortRecord::new(26, "tcp", PortState::Filtered));
        host.insert_port(PortRecord::new(161, "udp", PortState::Other));
        let t = tally_ports(&host);
        assert_eq!(t, PortTally { open: 1, closed: 1, filtered: 2 });
        assert_eq!(host.ports.len(), 5);
    }

    #[test]
    fn host_postures() {
        let mut host = HostRecord::new("10.0.0.1", HostStatus::Up);
        host.insert_port(tls_port(443, Some("expired cert")));
        host.insert_port(tls_port(8443, Some("self-signed")));
        host.insert_port(tls_port(9443, Some("fine")));
        host.insert_port(tls_port(80, None));
        let c = classify_host(&host);
        assert_eq!((c.postures.valid, c.postures.expired, c.postures.self_signed), (1, 1, 1));
        assert_eq!(c.tally.open, 4);
    }
}
