// Parking System - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use parking_system::api::{router, AppState};
use parking_system::{open_database, ParkingConfig, ParkingService};

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    println!("🌐 Parking System - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = ParkingConfig::load()?;

    let conn = open_database(&config.database_path)?;
    println!("✓ Database opened: {:?}", config.database_path);

    // Create shared state
    let state = AppState::new(conn, ParkingService::new(&config));
    let app = router(state);

    // Start server
    let addr = config.server.address.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/parking-slots", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
