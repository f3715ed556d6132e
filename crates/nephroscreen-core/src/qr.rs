//! Scanned-QR resolution.
//!
//! Every printed QR code carries a number that maps to the screening
//! location it is posted at. The directory comes from configuration; a
//! code with no entry blocks the wizard rather than starting a session
//! with no context to stamp submissions with.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::storage::config::QrEntry;

/// The resolved context of one scanned code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanContext {
    pub qr_no: String,
    pub location_code: String,
    pub unit: String,
}

/// Lookup table from QR number to screening location.
#[derive(Debug, Clone, Default)]
pub struct QrDirectory {
    entries: HashMap<String, QrEntry>,
}

impl QrDirectory {
    pub fn new(entries: HashMap<String, QrEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn resolve(&self, qr_no: &str) -> Option<ScanContext> {
        self.entries.get(qr_no).map(|entry| ScanContext {
            qr_no: qr_no.to_string(),
            location_code: entry.location_code.clone(),
            unit: entry.unit.clone(),
        })
    }

    /// All known codes with their locations, sorted by QR number.
    pub fn entries(&self) -> Vec<(String, QrEntry)> {
        let mut all: Vec<_> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}
