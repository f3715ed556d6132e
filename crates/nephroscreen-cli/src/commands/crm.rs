use clap::Subcommand;
use nephroscreen_core::{Config, CrmWebhook, LeadSink};

#[derive(Subcommand)]
pub enum CrmAction {
    /// Store the CRM webhook URL in the OS keyring
    SetUrl {
        /// HTTPS webhook endpoint
        url: String,
    },
    /// Remove the stored webhook URL
    Clear,
    /// Show forwarding status
    Status,
}

pub fn run(action: CrmAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut sink = CrmWebhook::from_keyring(config.crm.timeout_secs);

    match action {
        CrmAction::SetUrl { url } => {
            sink.set_credentials(&url)?;
            println!("ok");
        }
        CrmAction::Clear => {
            sink.clear_credentials()?;
            println!("ok");
        }
        CrmAction::Status => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "enabled": config.crm.enabled,
                    "configured": sink.is_configured(),
                    "timeout_secs": config.crm.timeout_secs,
                }))?
            );
        }
    }
    Ok(())
}
