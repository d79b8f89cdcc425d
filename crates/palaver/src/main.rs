//! The `palaver` server binary.
//!
//! Reads `Setting.json` for the bind address, loads the `UserData.json`
//! account snapshot, runs the server until Ctrl-C, and writes the snapshot
//! back on the way out.

use palaver::{PalaverError, PalaverServer, Settings, snapshot};
use tracing_subscriber::EnvFilter;

const SETTINGS_FILE: &str = "Setting.json";
const SNAPSHOT_FILE: &str = "UserData.json";

#[tokio::main]
async fn main() -> Result<(), PalaverError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut settings = Settings::load(SETTINGS_FILE)?;
    let ip = settings.get("ServerIP", "127.0.0.1");
    let port = settings.get("ServerPort", "11451");
    // Persist the keys we consulted so the file is editable after one run.
    settings.save()?;

    let users = snapshot::load_users(SNAPSHOT_FILE)?;

    let server = PalaverServer::builder()
        .bind(&format!("{ip}:{port}"))
        .preload_users(users)
        .build()
        .await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received");
            shutdown.shutdown();
        }
    });

    let users = server.run().await?;
    snapshot::save_users(SNAPSHOT_FILE, &users)?;
    Ok(())
}
