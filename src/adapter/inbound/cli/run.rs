//! Handler for the `run` command.

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapter::inbound::cli::command::RunArgs;
use crate::application::activation::ActivationRequest;
use crate::application::simulation::SessionReport;
use crate::error::Result;
use crate::infrastructure::bootstrap::Services;
use crate::infrastructure::config::settings::Config;

/// Execute the run command.
pub async fn execute(
    args: &RunArgs,
    mut config: Config,
    json: bool,
    cancel: CancellationToken,
) -> Result<()> {
    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }
    let services = Services::init(config).await?;

    if !args.events.is_empty() {
        let request = ActivationRequest::new(args.events.clone(), args.markets.clone());
        let activated = services.activation.activate(&request).await?;
        info!(
            events = activated.events,
            markets = activated.markets,
            "Activation applied"
        );
    }

    let report = services
        .session(args.duration.map(Duration::from_secs))
        .run(cancel)
        .await?;
    print_report(&report, json);

    services.shutdown();
    Ok(())
}

fn print_report(report: &SessionReport, json: bool) {
    if json {
        let events: Vec<_> = report
            .simulators
            .iter()
            .map(|sim| {
                json!({
                    "event_id": sim.event_id,
                    "ticks": sim.ticks,
                    "final_score": sim.final_score,
                    "failed_writes": sim.failed_writes,
                })
            })
            .collect();
        let body = json!({
            "generation": report.generation,
            "events": events,
            "goals": report.goals(),
            "monitor": {
                "cycles": report.monitor.cycles,
                "changed": report.monitor.changed,
                "failed": report.monitor.failed,
                "published": report.monitor.published,
                "publish_failures": report.monitor.publish_failures,
            },
            "persisted_prices": report.persisted_prices,
            "persisted_scores": report.persisted_scores,
        });
        println!("{body}");
        return;
    }

    println!("Session {} finished", report.generation);
    for sim in &report.simulators {
        println!(
            "  event {:>3}  {}-{}  ({} goals)",
            sim.event_id.get(),
            sim.final_score.team1_score(),
            sim.final_score.team2_score(),
            sim.ticks
        );
    }
    println!(
        "  {} cycles, {} updates published, {} failed",
        report.monitor.cycles, report.monitor.published, report.monitor.publish_failures
    );
    println!(
        "  persisted {} prices and {} scores",
        report.persisted_prices, report.persisted_scores
    );
}
