//! Handler for the `seed` command.

use serde_json::json;

use crate::error::Result;
use crate::infrastructure::bootstrap::init_reference_store;
use crate::infrastructure::config::settings::Config;

/// Load the demo catalog unless the store already has events.
pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let store = init_reference_store(&config.database)?;
    let report = store.seed_demo().await?;

    if json {
        println!(
            "{}",
            json!({
                "events": report.events,
                "markets": report.markets,
                "event_prices": report.event_prices,
                "skipped": report.skipped,
            })
        );
    } else if report.skipped {
        println!("Reference store already has events; nothing seeded");
    } else {
        println!(
            "Seeded {} events, {} markets, {} event prices",
            report.events, report.markets, report.event_prices
        );
    }
    Ok(())
}
