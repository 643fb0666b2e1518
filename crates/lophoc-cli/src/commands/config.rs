//! Configuration management commands for CLI.

use clap::Subcommand;
use lophoc_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full configuration as TOML
    Show,
    /// Get a configuration value
    Get {
        /// Key, e.g. reconcile.interval_secs
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Key, e.g. reconcile.interval_secs
        key: String,
        /// New value
        value: String,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = Config::load_or_default();
            let value = match key.as_str() {
                "reconcile.interval_secs" => config.reconcile.interval_secs.to_string(),
                "reconcile.trial_days" => config.reconcile.trial_days.to_string(),
                "reconcile.term_days" => config.reconcile.term_days.to_string(),
                other => return Err(format!("unknown config key: {other}").into()),
            };
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_or_default();
            match key.as_str() {
                "reconcile.interval_secs" => config.reconcile.interval_secs = value.parse()?,
                "reconcile.trial_days" => config.reconcile.trial_days = value.parse()?,
                "reconcile.term_days" => config.reconcile.term_days = value.parse()?,
                other => return Err(format!("unknown config key: {other}").into()),
            }
            config.save()?;
            println!("{key} = {value}");
        }
    }

    Ok(())
}
