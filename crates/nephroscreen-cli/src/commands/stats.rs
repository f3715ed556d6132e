use clap::Subcommand;
use nephroscreen_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Zone tallies across stored assessments
    Zones,
    /// Most recent assessments
    Recent {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        StatsAction::Zones => {
            let stats = db.zone_stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Recent { limit } => {
            let rows = db.recent(limit)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
