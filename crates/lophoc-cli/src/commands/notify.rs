//! Notification history commands for CLI.

use clap::Subcommand;
use lophoc_core::Database;

#[derive(Subcommand)]
pub enum NotifyAction {
    /// List a user's recent notifications, newest first
    List {
        /// User ID
        user: String,
        /// Maximum number of events to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        NotifyAction::List { user, limit, json } => {
            let events = db.list_notifications(&user, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                for event in &events {
                    println!(
                        "[{}] {:?} class={}  {} -- {}",
                        event.created_at.to_rfc3339(),
                        event.kind,
                        event.related_id,
                        event.title,
                        event.message
                    );
                }
                if events.is_empty() {
                    println!("No notifications for {user}");
                }
            }
        }
    }

    Ok(())
}
