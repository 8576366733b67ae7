//! Categories command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::models::CategoryConfig;

use super::App;

impl App {
    /// Print the category configuration, one line per category, followed by
    /// ignored classes and any `--region` overrides.
    pub fn run_categories(&self) -> Result<()> {
        let config = Config::load()?;
        let categories = CategoryConfig::load(&config.classifier.categories)?;

        for (name, category) in &categories.categories {
            println!(
                "{name}\tsize={}\tmin_notability={}\tmembers={}",
                category.size,
                category.min_notability,
                category.members.join(",")
            );
        }
        for (id, reason) in &categories.ignored {
            println!("ignored\t{id}\t{reason}");
        }

        if let Some(region) = self.load_region()? {
            let mut entries: Vec<_> = region.categories.iter().collect();
            entries.sort();
            for (id, category) in entries {
                let label = region.labels.get(id).map(String::as_str).unwrap_or("");
                println!("regional\t{id}\t{category}\t{label}");
            }
        }

        Ok(())
    }
}
