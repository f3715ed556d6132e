//! Compact report tokens for the read-only "scan completed report" view.
//!
//! A token frames a JSON payload as `KNR{version}.{base64}.{checksum8}`
//! where `checksum8` is the first 8 hex characters of SHA-256 over the
//! base64 body. The checksum detects corruption in transit (a mangled QR
//! print, a truncated copy-paste); it is not an authenticity signature.
//! Encode/decode round-trips exactly for every valid payload, including
//! Tamil label content.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::questionnaire::Language;
use crate::risk::{AssessmentResult, Zone};

/// Current report token version.
pub const REPORT_VERSION: u32 = 1;

const FRAME_PREFIX: &str = "KNR";
const CHECKSUM_LEN: usize = 8;

/// Everything a completed-report view needs, serialized into the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub version: u32,
    pub code: String,
    pub timestamp: DateTime<Utc>,
    pub zone: Zone,
    pub language: Language,
    /// Recorded answer tokens in question order.
    pub answer_values: Vec<String>,
}

impl ReportPayload {
    pub fn new(result: &AssessmentResult, language: Language, answer_values: Vec<String>) -> Self {
        Self {
            version: REPORT_VERSION,
            code: result.code.clone(),
            timestamp: result.created_at,
            zone: result.zone,
            language,
            answer_values,
        }
    }
}

/// Decode failures. All of these surface as a "report unavailable or
/// corrupt" message in hosts; none may crash the caller.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Token does not match the `KNR{v}.{body}.{checksum}` frame.
    #[error("report token is not in the expected format")]
    InvalidFormat,

    /// Frame version is not one this build can read.
    #[error("unsupported report version {0}")]
    UnsupportedVersion(u32),

    /// Body does not match its checksum.
    #[error("report token failed its integrity check")]
    ChecksumMismatch,

    /// Body is not valid base64.
    #[error("report token body is not valid base64")]
    Encoding,

    /// Body decoded but the payload JSON did not.
    #[error("report payload could not be decoded: {0}")]
    Payload(#[from] serde_json::Error),
}

fn checksum(body: &str) -> String {
    let digest = Sha256::digest(body.as_bytes());
    hex::encode(digest)[..CHECKSUM_LEN].to_string()
}

/// Serialize a payload into a transportable token.
pub fn encode(payload: &ReportPayload) -> Result<String, ReportError> {
    let json = serde_json::to_vec(payload)?;
    let body = URL_SAFE_NO_PAD.encode(json);
    let sum = checksum(&body);
    Ok(format!("{FRAME_PREFIX}{}.{body}.{sum}", payload.version))
}

/// Reconstruct a payload from a token.
pub fn decode(token: &str) -> Result<ReportPayload, ReportError> {
    let rest = token.strip_prefix(FRAME_PREFIX).ok_or(ReportError::InvalidFormat)?;
    let mut parts = rest.splitn(3, '.');
    let version: u32 = parts
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or(ReportError::InvalidFormat)?;
    let body = parts.next().ok_or(ReportError::InvalidFormat)?;
    let sum = parts.next().ok_or(ReportError::InvalidFormat)?;

    if version != REPORT_VERSION {
        return Err(ReportError::UnsupportedVersion(version));
    }
    if checksum(body) != sum {
        return Err(ReportError::ChecksumMismatch);
    }
    let json = URL_SAFE_NO_PAD
        .decode(body)
        .map_err(|_| ReportError::Encoding)?;
    let payload: ReportPayload = serde_json::from_slice(&json)?;
    Ok(payload)
}
