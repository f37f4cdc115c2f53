//! History command - show or clear past analyses

use agridoctor_pipeline::HistoryStore;
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct HistoryCommand {
    /// Delete the whole history instead of showing it
    #[arg(long)]
    clear: bool,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

impl HistoryCommand {
    pub fn execute(self) -> Result<()> {
        let store = HistoryStore::default_location();

        if self.clear {
            store.clear()?;
            println!("History cleared.");
            return Ok(());
        }

        let entries = store.entries()?;
        if entries.is_empty() {
            println!("No analyses recorded yet.");
            return Ok(());
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        for entry in entries {
            println!(
                "{}  {}  {}  {:.1}%  {}",
                entry.timestamp,
                entry.result.crop,
                entry.result.disease_key,
                entry.result.confidence,
                entry.image_path
            );
        }
        Ok(())
    }
}
