//! Fold per-file parse outcomes into one [`AggregateReport`].

use classifier::classify_host;
use record_parser::ParseOutcome;
use scanboard_core::{AggregateReport, HostRecord, HostSummary, OrderedCounts, Summary, TlsPosture, TOP_PORTS};
use std::collections::{BTreeMap, HashMap};

/// Occurrence counter that remembers first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    index: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Most frequent first; equal counts keep first-seen order.
    pub fn ranked(&self) -> Vec<(String, u64)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn top(&self, n: usize) -> OrderedCounts {
        self.ranked().into_iter().take(n).collect()
    }
}

/// Accumulates one date's outcomes. Owned by a single build and consumed by
/// [`Aggregator::finish`].
#[derive(Debug)]
pub struct Aggregator {
    scan_date: String,
    total_files: u64,
    skipped_files: u64,
    hosts: Vec<HostRecord>,
    slots: HashMap<String, usize>,
}

impl Aggregator {
    pub fn new(scan_date: impl Into<String>) -> Self {
        Aggregator {
            scan_date: scan_date.into(),
            total_files: 0,
            skipped_files: 0,
            hosts: Vec::new(),
            slots: HashMap::new(),
        }
    }

    /// Record one file's outcome. A later host with an already-seen address
    /// replaces the earlier record but keeps its encounter slot.
    pub fn push(&mut self, outcome: ParseOutcome) {
        self.total_files += 1;
        let record = match outcome {
            ParseOutcome::Host(record) if record.is_up() => record,
            _ => {
                self.skipped_files += 1;
                return;
            }
        };
        match self.slots.get(&record.address) {
            Some(&slot) => self.hosts[slot] = record,
            None => {
                self.slots.insert(record.address.clone(), self.hosts.len());
                self.hosts.push(record);
            }
        }
    }

    pub fn finish(self, generated_at: impl Into<String>) -> AggregateReport {
        let mut ports = Counter::new();
        let mut oses = Counter::new();
        let mut tls_posture = TlsPosture::default();
        let mut hosts = BTreeMap::new();

        for record in self.hosts {
            oses.add(&record.os_guess);
            for key in record.ports.keys() {
                ports.add(key);
            }
            let class = classify_host(&record);
            tls_posture.merge(&class.postures);
            hosts.insert(
                record.address,
                HostSummary {
                    hostname: record.hostname,
                    os: record.os_guess,
                    mac: record.mac_address,
                    vendor: record.mac_vendor,
                    status: record.status,
                    ports: record.ports,
                    open_ports: class.tally.open,
                    closed_ports: class.tally.closed,
                    filtered_ports: class.tally.filtered,
                },
            );
        }

        AggregateReport {
            scan_date: self.scan_date,
            generated_at: generated_at.into(),
            summary: Summary {
                total_files: self.total_files,
                live_hosts: hosts.len() as u64,
                total_port_entries: ports.total(),
                unique_port_count: ports.len() as u64,
                skipped_files: self.skipped_files,
            },
            os_distribution: oses.top(usize::MAX),
            port_distribution: ports.top(TOP_PORTS),
            tls_posture,
            hosts,
        }
    }
}

/// Fold a whole sequence in one call.
pub fn aggregate(
    scan_date: impl Into<String>,
    outcomes: impl IntoIterator<Item = ParseOutcome>,
    generated_at: impl Into<String>,
) -> AggregateReport {
    let mut agg = Aggregator::new(scan_date);
    for outcome in outcomes {
        agg.push(outcome);
    }
    agg.finish(generated_at)
}
