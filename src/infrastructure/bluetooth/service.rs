//! Peripheral Service Module
//!
//! Brings up the adapter, registers the GATT application and advertisement,
//! and keeps them registered until the process is told to stop.

use crate::domain::motor::MotorLayout;
use crate::domain::settings::Settings;
use crate::infrastructure::bluetooth::{advertisement, gatt, gatt::SharedClient};
use anyhow::Result;
use bluer::{Adapter, Session};
use std::time::Duration;
use tracing::{info, warn};

/// Time given to BlueZ to process the unregister calls before exiting
const UNREGISTER_GRACE: Duration = Duration::from_secs(1);

/// BLE peripheral exposing the configured motors
pub struct PeripheralService {
    settings: Settings,
    client: SharedClient,
}

impl PeripheralService {
    pub fn new(settings: Settings, client: SharedClient) -> Self {
        Self { settings, client }
    }

    async fn open_adapter(&self, session: &Session) -> Result<Adapter> {
        let adapter = match &self.settings.adapter {
            Some(name) => session.adapter(name)?,
            None => session.default_adapter().await?,
        };
        adapter.set_powered(true).await?;
        info!(
            "Using Bluetooth adapter {} with address {}",
            adapter.name(),
            adapter.address().await?
        );
        Ok(adapter)
    }

    /// Serve until interrupted, then unregister the application and
    /// advertisement.
    pub async fn run(&self) -> Result<()> {
        let session = Session::new().await?;
        let adapter = self.open_adapter(&session).await?;

        let layouts = MotorLayout::for_motors(&self.settings.pvs, self.settings.naming);
        let characteristic_count: usize = layouts.iter().map(|l| l.characteristics.len()).sum();
        for layout in &layouts {
            info!("Motor {} bound to {}", layout.id, layout.pv_base);
        }

        let interval = Duration::from_millis(self.settings.notify_interval_ms);
        let app = gatt::build_application(&layouts, self.client.clone(), interval);
        let app_handle = adapter.serve_gatt_application(app).await?;
        info!(
            "GATT application registered: {} motor(s), {} characteristic(s)",
            layouts.len(),
            characteristic_count
        );

        let adv_handle = adapter
            .advertise(advertisement::build_advertisement(&self.settings))
            .await?;
        info!("Advertising as '{}'", self.settings.name);

        shutdown_signal().await;

        info!("Unregistering advertisement and GATT application");
        drop(adv_handle);
        drop(app_handle);
        tokio::time::sleep(UNREGISTER_GRACE).await;

        Ok(())
    }
}

/// Resolves on Ctrl-C, or on SIGTERM where available
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Interrupted"),
        _ = terminate => info!("Terminated"),
    }
}
