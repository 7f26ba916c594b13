use scanboard_core::{AggregateReport, DateKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const FORMAT_TAG: &str = "scanboard-report/1";

/// On-disk wrapper around a report. The checksum is the hex SHA-256 of the
/// compact JSON encoding of `report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope {
    pub format: String,
    pub scan_date: String,
    pub checksum: String,
    pub report: AggregateReport,
}

/// Why a stored entry was rejected.
#[derive(Debug, Error)]
pub enum Corruption {
    #[error("unreadable entry: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown format tag {0:?}")]
    Format(String),
    #[error("entry is for date {found}, expected {expected}")]
    DateMismatch { expected: String, found: String },
    #[error("checksum mismatch")]
    Checksum,
}

fn checksum(report: &AggregateReport) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(report)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

impl CacheEnvelope {
    pub fn seal(date: &DateKey, report: &AggregateReport) -> Result<Self, serde_json::Error> {
        Ok(CacheEnvelope {
            format: FORMAT_TAG.to_string(),
            scan_date: date.to_string(),
            checksum: checksum(report)?,
            report: report.clone(),
        })
    }

    /// Decode stored bytes and validate them against the requested key.
    pub fn open(date: &DateKey, bytes: &[u8]) -> Result<AggregateReport, Corruption> {
        let envelope: CacheEnvelope = serde_json::from_slice(bytes)?;
        if envelope.format != FORMAT_TAG {
            return Err(Corruption::Format(envelope.format));
        }
        if envelope.scan_date != date.as_str() || envelope.report.scan_date != date.as_str() {
            return Err(Corruption::DateMismatch {
                expected: date.to_string(),
                found: envelope.scan_date,
            });
        }
        if checksum(&envelope.report)? != envelope.checksum {
            return Err(Corruption::Checksum);
        }
        Ok(envelope.report)
    }
}
