mod domain;
mod infrastructure;

use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::{gatt::SharedClient, PeripheralService};
use crate::infrastructure::epics::CaToolClient;
use crate::infrastructure::logging::init_logger;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Optional path to the JSON config, see SettingsService::new for the fallbacks
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings_service = SettingsService::new(config_path)?;
    let settings = settings_service.get().clone();

    let _logging_guard = init_logger(&settings.log_settings)?;
    info!("Starting BLE motor control peripheral");
    match settings_service.path() {
        Some(path) => info!("Loaded settings from {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let client: SharedClient = Arc::new(CaToolClient::new(&settings.channel_access));
    PeripheralService::new(settings, client).run().await
}
