use clap::{CommandFactory, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nephroscreen-cli", version, about = "Nephroscreen CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screening wizard control
    Screen {
        #[command(subcommand)]
        action: commands::screen::ScreenAction,
    },
    /// Completed-report tokens
    Report {
        #[command(subcommand)]
        action: commands::report::ReportAction,
    },
    /// QR directory lookups
    Qr {
        #[command(subcommand)]
        action: commands::qr::QrAction,
    },
    /// CRM forwarding credentials
    Crm {
        #[command(subcommand)]
        action: commands::crm::CrmAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Submission statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Generate shell completions
    Completions { shell: clap_complete::Shell },
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Screen { action } => commands::screen::run(action),
        Commands::Report { action } => commands::report::run(action),
        Commands::Qr { action } => commands::qr::run(action),
        Commands::Crm { action } => commands::crm::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "nephroscreen-cli",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
