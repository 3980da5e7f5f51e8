//! Firmware entry point: bring up peripherals, network and the HTTP API,
//! then hand the main thread to the UI loop.

use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::mdns::EspMdns;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::EspSntp;

use bsqtimer::adapters::display::ConsoleDisplay;
use bsqtimer::adapters::http;
use bsqtimer::adapters::log_sink::LogEventSink;
use bsqtimer::adapters::nvs::{load_config_or_default, NvsAdapter};
use bsqtimer::adapters::time::SystemClock;
use bsqtimer::adapters::wifi::{load_credentials, WifiAdapter};
use bsqtimer::app::{CommandApi, MenuState, SharedStatus, UiCommand};
use bsqtimer::menu::MenuStore;
use bsqtimer::ui::UiLoop;

const MDNS_HOSTNAME: &str = "bsq";

fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init().map_err(|e| anyhow::anyhow!("logger init failed: {e:?}"))?;

    info!("BSQ timer starting");

    let peripherals = Peripherals::take().context("taking peripherals")?;
    let sysloop = EspSystemEventLoop::take().context("taking system event loop")?;
    let nvs_partition = EspDefaultNvsPartition::take().context("taking NVS partition")?;

    // Storage, config, menu
    let mut storage = NvsAdapter::new(nvs_partition.clone())?;
    let config = load_config_or_default(&mut storage);
    let store = MenuStore::load(&mut storage, &config);
    let menu = Arc::new(Mutex::new(MenuState { store, storage }));

    // Command plumbing
    let (tx, rx) = channel::<UiCommand>();
    let status = Arc::new(SharedStatus::default());
    let api = CommandApi::new(Arc::clone(&menu), tx.clone(), Arc::clone(&status));

    // Network: station if credentials are stored, provisioning AP otherwise
    let creds = {
        let mut state = menu.lock().unwrap_or_else(PoisonError::into_inner);
        load_credentials(&mut state.storage)
    };
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs_partition)?;
    let mut _sntp = None;
    match creds {
        Some(creds) => match wifi.connect_station(&creds) {
            Ok(()) => {
                let _ = tx.send(UiCommand::SetConnected(true));
                _sntp = Some(EspSntp::new_default().context("starting SNTP")?);
            }
            Err(e) => {
                warn!("station connect failed ({e}), falling back to provisioning AP");
                wifi.start_access_point()?;
            }
        },
        None => {
            info!("no stored credentials, starting provisioning AP");
            wifi.start_access_point()?;
        }
    }

    let mut mdns = EspMdns::take().context("taking mDNS")?;
    mdns.set_hostname(MDNS_HOSTNAME).context("mDNS hostname")?;

    // Control surface
    let _server = http::serve(api)?;
    info!("HTTP API up");

    // UI loop owns the main thread from here on
    let display = Arc::new(Mutex::new(ConsoleDisplay::new()));
    let clock = SystemClock::new();
    let ui = UiLoop::new(config, display, menu, rx, status, LogEventSink);
    info!("entering UI loop");
    ui.run(|| clock.uptime_ms(), || clock.wall_time())
}
