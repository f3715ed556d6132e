use clap::Subcommand;
use nephroscreen_core::{report, Database, ReportPayload};

#[derive(Subcommand)]
pub enum ReportAction {
    /// Render a scanned report token read-only
    Show {
        /// The token embedded in a completed-report QR
        token: String,
    },
    /// Encode the last completed session into a token
    Export,
}

pub fn run(action: ReportAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ReportAction::Show { token } => match report::decode(&token) {
            Ok(payload) => {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            Err(e) => {
                // A malformed token is a read-only dead end, not a crash.
                println!("report unavailable or corrupt: {e}");
            }
        },
        ReportAction::Export => {
            let db = Database::open()?;
            let engine = super::screen::stored_engine(&db)
                .ok_or("no active session; nothing to export")?;
            let result = engine
                .result()
                .ok_or("the active session has no completed assessment yet")?;
            let values = engine
                .answers()
                .ordered_values(engine.questionnaire().questions());
            let payload = ReportPayload::new(result, engine.language(), values);
            println!("{}", report::encode(&payload)?);
        }
    }
    Ok(())
}
