//! CRM lead forwarding -- post a derived lead to a configured webhook.
//!
//! Forwarding is fire-and-forget with respect to the assessment: the
//! outer shell executes it after the wizard has already reached
//! `Resulted`, logs failures and moves on. Nothing here may alter a
//! computed zone or code.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::error::CrmError;
use crate::questionnaire::Language;
use crate::risk::Zone;

/// The lead derived from a completed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadPayload {
    pub name: String,
    pub phone: String,
    pub zone: Zone,
    pub code: String,
    pub location_code: String,
    pub language: Language,
}

/// A destination for derived leads.
pub trait LeadSink: Send + Sync {
    /// Unique identifier (e.g. "crm").
    fn name(&self) -> &str;

    /// Whether this sink has everything it needs to forward.
    fn is_configured(&self) -> bool;

    /// Forward one lead. Failure is recoverable by the caller.
    fn forward(&self, lead: &LeadPayload) -> Result<(), CrmError>;
}

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "nephroscreen";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

const WEBHOOK_URL_KEY: &str = "crm_webhook_url";

/// Webhook-backed CRM sink. The webhook URL lives in the OS keyring,
/// looked up once at construction.
pub struct CrmWebhook {
    webhook_url: String,
    timeout_secs: u64,
}

impl CrmWebhook {
    /// Load the stored webhook URL from the OS keyring (empty if absent).
    pub fn from_keyring(timeout_secs: u64) -> Self {
        let webhook_url = keyring_store::get(WEBHOOK_URL_KEY)
            .ok()
            .flatten()
            .unwrap_or_default();
        Self {
            webhook_url,
            timeout_secs,
        }
    }

    /// Build a sink pointing at an explicit URL (tests, ad-hoc runs).
    pub fn with_url(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            webhook_url: url.into(),
            timeout_secs,
        }
    }

    /// Validate and persist a user-provided webhook URL to the keyring.
    pub fn set_credentials(&mut self, webhook_url: &str) -> Result<(), CrmError> {
        let parsed = url::Url::parse(webhook_url)
            .map_err(|e| CrmError::InvalidUrl(format!("{webhook_url}: {e}")))?;
        if parsed.scheme() != "https" {
            return Err(CrmError::InvalidUrl(format!(
                "{webhook_url}: scheme must be https"
            )));
        }
        keyring_store::set(WEBHOOK_URL_KEY, webhook_url)
            .map_err(|e| CrmError::Credentials(e.to_string()))?;
        self.webhook_url = webhook_url.to_string();
        Ok(())
    }

    /// Remove the stored webhook URL.
    pub fn clear_credentials(&mut self) -> Result<(), CrmError> {
        keyring_store::delete(WEBHOOK_URL_KEY).map_err(|e| CrmError::Credentials(e.to_string()))?;
        self.webhook_url.clear();
        Ok(())
    }

    fn post_lead(&self, lead: &LeadPayload) -> Result<(), CrmError> {
        if self.webhook_url.is_empty() {
            return Err(CrmError::NotConfigured);
        }

        let body = json!({
            "name": lead.name,
            "phone": lead.phone,
            "risk_zone": lead.zone.label(),
            "priority_code": lead.code,
            "location_code": lead.location_code,
            "language": lead.language,
        });

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CrmError::Runtime(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;
        let resp = rt.block_on(client.post(&self.webhook_url).json(&body).send())?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let body = rt.block_on(resp.text()).unwrap_or_default();
            Err(CrmError::Rejected { status, body })
        }
    }
}

impl LeadSink for CrmWebhook {
    fn name(&self) -> &str {
        "crm"
    }

    fn is_configured(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    fn forward(&self, lead: &LeadPayload) -> Result<(), CrmError> {
        self.post_lead(lead)
    }
}
