use anyhow::{Context, Result};
use shellypv::Config;
use shellypv::dbus::DbusService;
use shellypv::driver::PvInverterDriver;
use shellypv::shelly::{MeterSource, ShellyClient};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    shellypv::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    info!("shellypv {} starting up", env!("APP_VERSION"));

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    let client = ShellyClient::new(&config.shelly).context("Failed to create Shelly client")?;
    let identity = match client.fetch_identity().await {
        Ok(identity) => identity,
        Err(e) => {
            error!("Cannot read meter identity from {}: {}", config.shelly.host, e);
            return Err(anyhow::anyhow!("Meter identity unavailable: {}", e));
        }
    };

    let mut dbus = DbusService::new(&config)?;
    if let Err(e) = dbus.start().await {
        if config.require_dbus {
            error!("Failed to initialize D-Bus and require_dbus=true: {}", e);
            return Err(e.into());
        }
        warn!(
            "D-Bus initialization failed but require_dbus=false, continuing without D-Bus: {}",
            e
        );
    }
    dbus.register_static_metadata(&identity, &config).await?;

    let mut driver = PvInverterDriver::new(&config, Box::new(client), Box::new(dbus))?;

    let shutdown = driver.shutdown_handle();
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown.send(());
    });

    match driver.run().await {
        Ok(()) => {
            info!("Driver shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Driver failed with error: {}", e);
            Err(anyhow::anyhow!("Driver error: {}", e))
        }
    }
}

/// Ctrl-C, or SIGTERM from the service supervisor
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
