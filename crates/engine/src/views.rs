//! Derived data for visualization consumers, computed from one report so
//! nothing downstream has to re-read scan files.

use aggregator::Counter;
use scanboard_core::{AggregateReport, OrderedCounts, Summary, TlsPosture};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryView {
    pub scan_date: String,
    pub generated_at: String,
    #[serde(flatten)]
    pub summary: Summary,
    pub tls_posture: TlsPosture,
}

pub fn summary_view(report: &AggregateReport) -> SummaryView {
    SummaryView {
        scan_date: report.scan_date.clone(),
        generated_at: report.generated_at.clone(),
        summary: report.summary.clone(),
        tls_posture: report.tls_posture,
    }
}

/// Untruncated port counts over every host, most frequent first.
///
/// Starts with the report's own `port_distribution` so the ranked head is
/// identical to it. Ports beyond that head are recounted from the hosts;
/// their ties follow address order.
pub fn full_port_counts(report: &AggregateReport) -> OrderedCounts {
    let mut counter = Counter::new();
    for host in report.hosts.values() {
        for key in host.ports.keys() {
            counter.add(key);
        }
    }
    let mut counts: OrderedCounts = report.port_distribution.iter().map(|(k, &n)| (k, n)).collect();
    for (key, n) in counter.ranked() {
        if !counts.contains_key(&key) {
            counts.insert(key, n);
        }
    }
    counts
}

pub fn top_ports(report: &AggregateReport, n: usize) -> Vec<(String, u64)> {
    full_port_counts(report).into_vec().into_iter().take(n).collect()
}

/// Edge of the port-to-host graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortHostLink {
    pub source: String,
    pub target: String,
}

pub fn port_host_links(report: &AggregateReport) -> Vec<PortHostLink> {
    report
        .hosts
        .iter()
        .flat_map(|(address, host)| {
            host.ports.keys().map(move |port| PortHostLink { source: port.to_string(), target: address.clone() })
        })
        .collect()
}

/// Flat per-host row for tables and CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostRow {
    pub address: String,
    pub hostname: String,
    pub os: String,
    pub mac: String,
    pub vendor: String,
    pub open_ports: u64,
    pub closed_ports: u64,
    pub filtered_ports: u64,
    pub ports: String,
}

pub fn host_rows(report: &AggregateReport) -> Vec<HostRow> {
    report
        .hosts
        .iter()
        .map(|(address, h)| HostRow {
            address: address.clone(),
            hostname: h.hostname.clone(),
            os: h.os.clone(),
            mac: h.mac.clone(),
            vendor: h.vendor.clone(),
            open_ports: h.open_ports,
            closed_ports: h.closed_ports,
            filtered_ports: h.filtered_ports,
            ports: h.ports.keys().collect::<Vec<_>>().join("|"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregator::aggregate;
    use record_parser::ParseOutcome;
    use scanboard_core::{HostRecord, HostStatus, PortRecord, PortState};

    fn report() -> AggregateReport {
        let host = |addr: &str, ports: &[u16]| {
            let mut h = HostRecord::new(addr, HostStatus::Up);
            for &p in ports {
                h.insert_port(PortRecord::new(p, "tcp", PortState::Open));
            }
            ParseOutcome::Host(h)
        };
        let ports: Vec<u16> = (1000..1012).collect();
        aggregate(
            "20240101",
            vec![host("10.0.0.2", &[22, 80]), host("10.0.0.1", &[22]), host("10.0.0.3", &ports)],
            "2024-01-01T00:00:00Z",
        )
    }

    #[test]
    fn full_counts_are_untruncated() {
        let r = report();
        let all = full_port_counts(&r);
        assert_eq!(all.len(), 14);
        assert_eq!(all.iter().next(), Some(("22/tcp", &2)));
        assert_eq!(r.port_distribution.len(), 10);
        assert_eq!(top_ports(&r, 2), vec![("22/tcp".to_string(), 2), ("80/tcp".to_string(), 1)]);
    }

    #[test]
    fn top_ports_follow_report_tie_order() {
        // 10.0.0.9 sorts after 10.0.0.10 but is processed first
        let host = |addr: &str, port: u16| {
            let mut h = HostRecord::new(addr, HostStatus::Up);
            h.insert_port(PortRecord::new(port, "tcp", PortState::Open));
            ParseOutcome::Host(h)
        };
        let r = aggregate("1", vec![host("10.0.0.9", 80), host("10.0.0.10", 22)], "2024-01-01T00:00:00Z");
        let report_order: Vec<&str> = r.port_distribution.keys().collect();
        assert_eq!(report_order, vec!["80/tcp", "22/tcp"]);
        let top: Vec<String> = top_ports(&r, 10).into_iter().map(|(k, _)| k).collect();
        assert_eq!(top, report_order);
        assert_eq!(full_port_counts(&r).keys().collect::<Vec<_>>(), report_order);
    }

    #[test]
    fn links_cover_every_port_of_every_host() {
        let links = port_host_links(&report());
        assert_eq!(links.len(), 15);
        assert_eq!(links[0], PortHostLink { source: "22/tcp".into(), target: "10.0.0.1".into() });
    }

    #[test]
    fn rows_and_summary() {
        let r = report();
        let rows = host_rows(&r);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].address, "10.0.0.2");
        assert_eq!(rows[1].ports, "22/tcp|80/tcp");
        assert_eq!(rows[1].open_ports, 2);

        let view = serde_json::to_value(summary_view(&r)).unwrap();
        assert_eq!(view["live_hosts"], 3);
        assert_eq!(view["total_files"], 3);
        assert_eq!(view["tls_posture"]["valid"], 0);
    }
}
