use clap::Subcommand;
use nephroscreen_core::{Config, QrDirectory};

#[derive(Subcommand)]
pub enum QrAction {
    /// Resolve a QR number to its screening location
    Resolve {
        /// QR number printed on the poster
        code: String,
    },
    /// List all configured QR codes
    List,
}

pub fn run(action: QrAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let directory = QrDirectory::new(config.qr_codes);

    match action {
        QrAction::Resolve { code } => match directory.resolve(&code) {
            Some(context) => {
                println!("{}", serde_json::to_string_pretty(&context)?);
            }
            None => {
                eprintln!("unknown QR code: {code}");
                std::process::exit(1);
            }
        },
        QrAction::List => {
            let entries: Vec<serde_json::Value> = directory
                .entries()
                .into_iter()
                .map(|(qr_no, entry)| {
                    serde_json::json!({
                        "qr_no": qr_no,
                        "location_code": entry.location_code,
                        "unit": entry.unit,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}
