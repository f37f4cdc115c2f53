//! Diseases command - list what a crop's classifier can recognize

use agridoctor_common::{CropType, Language};
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct DiseasesCommand {
    /// Crop to list diseases for: corn, potato or wheat
    #[arg(short, long)]
    crop: String,

    /// Display language: en or bn
    #[arg(short, long, default_value = "en")]
    lang: String,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

impl DiseasesCommand {
    pub fn execute(self) -> Result<()> {
        let crop: CropType = self.crop.parse()?;
        let language: Language = self.lang.parse()?;

        let keys = agridoctor_disease_db::diseases_for(crop);

        if self.json {
            let entries: Vec<_> = keys
                .iter()
                .filter_map(|key| {
                    agridoctor_disease_db::lookup(crop, key, language)
                        .map(|info| serde_json::json!({ "key": key, "info": info }))
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        println!("Diseases recognized for {crop}:");
        for key in keys {
            if let Some(info) = agridoctor_disease_db::lookup(crop, key, language) {
                println!();
                println!("  {} ({key})", info.name);
                println!("    {}", info.description);
            }
        }
        Ok(())
    }
}
