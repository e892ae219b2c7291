//! Handler for the `events` command.

use crate::error::Result;
use crate::infrastructure::bootstrap::init_reference_store;
use crate::infrastructure::config::settings::Config;
use crate::port::ActivationStore;

/// List the events currently marked active.
pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let store = init_reference_store(&config.database)?;
    let events = store.list_active_events().await?;

    if json {
        println!("{}", serde_json::to_string(&events)?);
        return Ok(());
    }
    if events.is_empty() {
        println!("No active events");
        return Ok(());
    }
    for event in &events {
        println!("{:>3}  {:<4} {}", event.id.get(), event.code, event.name);
    }
    Ok(())
}
