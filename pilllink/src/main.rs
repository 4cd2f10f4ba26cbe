// PillLink reminder runner
// Loads settings, wires the configured store and logs reminders as they come due.

use pilllink::app::AppState;
use pilllink::stores::FamilyRepository;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pilllink=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PillLink reminder runner");

    let data_dir = std::env::var("PILLLINK_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("pilllink-data"));

    let state = AppState::init(data_dir).await?;

    if let Some(family) = &state.family {
        for member in family.list().await? {
            tracing::info!(
                "Family member {}: {} ({}){}",
                member.id,
                member.name,
                member.relation,
                if member.is_default { " [default]" } else { "" }
            );
        }
    }

    let mut events = state.reminders.subscribe();
    let every = Duration::from_secs(state.settings.reminders.poll_interval_secs);
    let scheduler = state.reminders.clone().start_scheduler(every);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => tracing::info!(
                    "Time to take {} x{} (scheduled {})",
                    event.name,
                    event.count,
                    event.time
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} reminder events", skipped)
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    scheduler.abort();
    Ok(())
}
