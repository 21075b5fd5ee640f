use color_eyre::{eyre::eyre, Result};
use padbridge::config::BridgeConfig;
use padbridge::controller::{ControllerHandle, ControllerSettings, GilrsBackend};
use padbridge::input::{GamePadButton, InputState, InputType, StickSide};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = BridgeConfig::default_path()?;
    BridgeConfig::ensure_default_config(&config_path).await?;
    let config = BridgeConfig::load_from(&config_path).await?;
    info!("Using config: {:?}", config);

    let backend = GilrsBackend::new(Some(config.gilrs_settings()));
    let handle = ControllerHandle::spawn(Some(ControllerSettings::from(&config)), backend)
        .map_err(|e| eyre!("Failed to spawn controller: {}", e))?;

    let mut watchers = Vec::new();
    for slot in handle.polled_slots() {
        let Some(mut rx) = handle.subscribe(slot) else {
            continue;
        };
        let threshold = config.stick_direction_threshold;
        watchers.push(tokio::spawn(async move {
            let mut input = InputState::new(threshold);
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                input.update(snapshot.state);

                for button in GamePadButton::ALL {
                    if input.is_pressed(button, InputType::Single) {
                        info!("Slot {}: {:?} pressed", slot, button);
                    }
                }
                for side in [StickSide::Left, StickSide::Right] {
                    if let Some(direction) = input.stick(side).direction() {
                        info!("Slot {}: {:?} stick {:?}", slot, side, direction);
                    }
                }
                info!(
                    "Slot {} at {}: {:?}",
                    slot,
                    snapshot.captured_at.format("%H:%M:%S.%3f"),
                    snapshot.state.to_vector()
                );
            }
        }));
    }

    info!("Polling, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Stopping");

    handle
        .shutdown()
        .await
        .map_err(|e| eyre!("Controller shutdown failed: {}", e))?;
    for watcher in watchers {
        if let Err(e) = watcher.await {
            warn!("Watcher task ended abnormally: {}", e);
        }
    }
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
