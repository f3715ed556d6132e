use clap::Subcommand;
use nephroscreen_core::{
    report, Command, Config, CrmWebhook, Database, Gender, Identity, Language, LeadSink, Phase,
    QrDirectory, Questionnaire, ReportPayload, RestartMode, WizardAction, WizardEngine,
    WizardError,
};

const ENGINE_KEY: &str = "wizard_engine";

#[derive(Subcommand)]
pub enum ScreenAction {
    /// Start a session for a scanned QR code
    Start {
        /// QR number printed on the poster
        #[arg(long)]
        qr: String,
        /// Display language (english or tamil); defaults to config
        #[arg(long)]
        language: Option<String>,
    },
    /// Submit the intake identity form
    Intake {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        /// female, male or other
        #[arg(long, default_value = "other")]
        gender: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Answer the current question
    Answer {
        /// Question identifier (as shown by status)
        #[arg(long)]
        question: String,
        /// Option value token
        #[arg(long)]
        value: String,
    },
    /// Advance over an already-answered question
    Next,
    /// Step back to the previous question or the intake form
    Back,
    /// Print current wizard state as JSON
    Status,
    /// Restart the wizard
    Restart {
        /// Keep identity for a "check another relative" run
        #[arg(long)]
        keep_identity: bool,
    },
    /// Abandon the active session
    Abandon,
}

/// The persisted engine, if a session is active.
pub(crate) fn stored_engine(db: &Database) -> Option<WizardEngine> {
    let json = db.kv_get(ENGINE_KEY).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

fn save_engine(db: &Database, engine: &WizardEngine) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

fn parse_language(value: &str) -> Result<Language, Box<dyn std::error::Error>> {
    match value.to_ascii_lowercase().as_str() {
        "english" | "en" => Ok(Language::English),
        "tamil" | "ta" => Ok(Language::Tamil),
        other => Err(format!("unknown language: {other}").into()),
    }
}

fn parse_gender(value: &str) -> Result<Gender, Box<dyn std::error::Error>> {
    match value.to_ascii_lowercase().as_str() {
        "female" | "f" => Ok(Gender::Female),
        "male" | "m" => Ok(Gender::Male),
        "other" => Ok(Gender::Other),
        other => Err(format!("unknown gender: {other}").into()),
    }
}

/// Execute the commands emitted by a completed run. Sink failures are
/// logged warnings; the result shown to the user is already final.
fn execute_commands(db: &Database, config: &Config, commands: &[Command]) {
    for command in commands {
        match command {
            Command::PersistSubmission(submission) => {
                if let Err(e) = db.record_submission(submission) {
                    log::warn!("submission {} not persisted: {e}", submission.id);
                    eprintln!("warning: submission could not be stored locally");
                }
            }
            Command::ForwardLead(lead) => {
                if !config.crm.enabled {
                    continue;
                }
                let sink = CrmWebhook::from_keyring(config.crm.timeout_secs);
                if !sink.is_configured() {
                    log::warn!("CRM forwarding enabled but no webhook URL stored");
                    continue;
                }
                if let Err(e) = sink.forward(lead) {
                    log::warn!("lead {} not forwarded: {e}", lead.code);
                    eprintln!("warning: lead could not be forwarded to the CRM");
                }
            }
        }
    }
}

/// Print the advance event; on completion also print the report token.
fn print_advance(
    engine: &WizardEngine,
    advance: &nephroscreen_core::Advance,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&advance.event)?);

    if engine.phase() == Phase::Resulted {
        if let Some(result) = engine.result() {
            let values = engine
                .answers()
                .ordered_values(engine.questionnaire().questions());
            let payload = ReportPayload::new(result, engine.language(), values);
            let token = report::encode(&payload)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "type": "ReportToken",
                    "token": token,
                }))?
            );
        }
    }
    Ok(())
}

pub fn run(action: ScreenAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();

    match action {
        ScreenAction::Start { qr, language } => {
            let directory = QrDirectory::new(config.qr_codes.clone());
            let context = directory
                .resolve(&qr)
                .ok_or(WizardError::MissingScanContext)?;
            let language = match language {
                Some(value) => parse_language(&value)?,
                None => config.screening.default_language,
            };
            let engine = WizardEngine::new(Questionnaire::standard(), context, language);
            save_engine(&db, &engine)?;
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        }
        ScreenAction::Intake {
            name,
            age,
            gender,
            phone,
        } => {
            let mut engine = active_engine(&db)?;
            let advance = engine.submit_intake(Identity {
                name,
                age,
                gender: parse_gender(&gender)?,
                phone,
            })?;
            execute_commands(&db, &config, &advance.commands);
            print_advance(&engine, &advance)?;
            save_engine(&db, &engine)?;
        }
        ScreenAction::Answer { question, value } => {
            let mut engine = active_engine(&db)?;
            let advance = engine.apply(WizardAction::Answer {
                question_id: question,
                value,
            })?;
            execute_commands(&db, &config, &advance.commands);
            print_advance(&engine, &advance)?;
            save_engine(&db, &engine)?;
        }
        ScreenAction::Next => {
            let mut engine = active_engine(&db)?;
            let advance = engine.apply(WizardAction::Next)?;
            execute_commands(&db, &config, &advance.commands);
            print_advance(&engine, &advance)?;
            save_engine(&db, &engine)?;
        }
        ScreenAction::Back => {
            let mut engine = active_engine(&db)?;
            let advance = engine.apply(WizardAction::Back)?;
            print_advance(&engine, &advance)?;
            save_engine(&db, &engine)?;
        }
        ScreenAction::Status => {
            let engine = active_engine(&db)?;
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        }
        ScreenAction::Restart { keep_identity } => {
            let mut engine = active_engine(&db)?;
            let mode = if keep_identity {
                if !config.screening.allow_relative_mode {
                    return Err("relative mode is disabled in configuration".into());
                }
                RestartMode::RetainIdentity
            } else {
                RestartMode::Fresh
            };
            let advance = engine.apply(WizardAction::Restart { mode })?;
            print_advance(&engine, &advance)?;
            save_engine(&db, &engine)?;
        }
        ScreenAction::Abandon => {
            db.kv_delete(ENGINE_KEY)?;
            println!("{{\"type\": \"SessionAbandoned\"}}");
        }
    }
    Ok(())
}

fn active_engine(db: &Database) -> Result<WizardEngine, Box<dyn std::error::Error>> {
    stored_engine(db)
        .ok_or_else(|| "no active session; run `screen start --qr <code>` first".into())
}
