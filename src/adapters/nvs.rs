//! Non-volatile storage adapter.
//!
//! Backs [`StoragePort`] with the ESP-IDF NVS partition on the device and a
//! `HashMap` on the host. Also implements [`ConfigPort`]: the system
//! configuration lives in the same namespace as the menu, as a postcard
//! blob under `syscfg`.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StoragePort};
use crate::config::SystemConfig;
use crate::error::StorageError;

/// All persistent state shares one NVS namespace.
pub const NVS_NAMESPACE: &str = "bsqcfg";

/// Key of the postcard-encoded [`SystemConfig`].
const KEY_SYSCFG: &str = "syscfg";

/// Postcard encoding of the config fits comfortably here.
const MAX_CONFIG_BLOB: usize = 128;

// ---------------------------------------------------------------------------
// Device implementation
// ---------------------------------------------------------------------------

#[cfg(feature = "espidf")]
mod device {
    use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
    use log::error;

    use super::NVS_NAMESPACE;
    use crate::app::ports::StoragePort;
    use crate::error::{Error, StorageError};

    pub struct NvsAdapter {
        nvs: EspNvs<NvsDefault>,
    }

    impl NvsAdapter {
        pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, Error> {
            let nvs = EspNvs::new(partition, NVS_NAMESPACE, true).map_err(|e| {
                error!("failed to open NVS namespace {NVS_NAMESPACE}: {e}");
                Error::Init("NVS namespace open failed")
            })?;
            Ok(Self { nvs })
        }
    }

    impl StoragePort for NvsAdapter {
        fn read(&mut self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
            match self.nvs.get_blob(key, buf) {
                Ok(Some(data)) => Ok(data.len()),
                Ok(None) => Err(StorageError::NotFound),
                Err(e) => {
                    error!("NVS read {key} failed: {e}");
                    Err(StorageError::IoError)
                }
            }
        }

        fn write(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
            self.nvs.set_blob(key, value).map_err(|e| {
                error!("NVS write {key} failed: {e}");
                if e.code() == esp_idf_svc::sys::ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }

        fn delete(&mut self, key: &str) -> Result<(), StorageError> {
            match self.nvs.remove(key) {
                Ok(_) => Ok(()),
                Err(e) => {
                    error!("NVS delete {key} failed: {e}");
                    Err(StorageError::IoError)
                }
            }
        }
    }
}

#[cfg(feature = "espidf")]
pub use device::NvsAdapter;

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(feature = "espidf"))]
mod sim {
    use std::collections::HashMap;

    use crate::app::ports::StoragePort;
    use crate::error::StorageError;

    /// In-memory stand-in for the NVS partition.
    #[derive(Default)]
    pub struct NvsAdapter {
        blobs: HashMap<String, Vec<u8>>,
    }

    impl NvsAdapter {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl StoragePort for NvsAdapter {
        fn read(&mut self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
            let blob = self.blobs.get(key).ok_or(StorageError::NotFound)?;
            if blob.len() > buf.len() {
                return Err(StorageError::IoError);
            }
            buf[..blob.len()].copy_from_slice(blob);
            Ok(blob.len())
        }

        fn write(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
            self.blobs.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        fn delete(&mut self, key: &str) -> Result<(), StorageError> {
            self.blobs.remove(key);
            Ok(())
        }
    }
}

#[cfg(not(feature = "espidf"))]
pub use sim::NvsAdapter;

// ---------------------------------------------------------------------------
// Configuration on top of storage
// ---------------------------------------------------------------------------

impl ConfigPort for NvsAdapter {
    fn load_config(&mut self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; MAX_CONFIG_BLOB];
        let len = self.read(KEY_SYSCFG, &mut buf).map_err(|e| match e {
            StorageError::NotFound => ConfigError::NotFound,
            _ => ConfigError::Io,
        })?;
        let config: SystemConfig =
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        validate_config(&config)?;
        Ok(config)
    }

    fn save_config(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::Corrupted)?;
        self.write(KEY_SYSCFG, &bytes)
            .map_err(|_| ConfigError::Io)
    }
}

/// Range checks for values coming out of flash.
pub fn validate_config(config: &SystemConfig) -> Result<(), ConfigError> {
    if config.ui_tick_interval_ms < 10 || config.ui_tick_interval_ms >= 1000 {
        return Err(ConfigError::ValidationFailed(
            "ui_tick_interval_ms out of range (10..1000)",
        ));
    }
    if config.bell_duration_secs == 0 {
        return Err(ConfigError::ValidationFailed("bell_duration_secs is zero"));
    }
    if config.idle_timeout_secs == 0 {
        return Err(ConfigError::ValidationFailed("idle_timeout_secs is zero"));
    }
    if config.menu_display_rows == 0 || config.menu_display_rows > 5 {
        return Err(ConfigError::ValidationFailed(
            "menu_display_rows out of range (1..=5)",
        ));
    }
    if config.fade_intensity_step == 0 {
        return Err(ConfigError::ValidationFailed("fade_intensity_step is zero"));
    }
    if config.default_fixed_secs == 0 {
        return Err(ConfigError::ValidationFailed("default_fixed_secs is zero"));
    }
    Ok(())
}

/// Load the stored configuration, falling back to (and persisting) the
/// defaults on first boot or corruption.
pub fn load_config_or_default(port: &mut impl ConfigPort) -> SystemConfig {
    match port.load_config() {
        Ok(config) => {
            info!("configuration loaded from storage");
            config
        }
        Err(ConfigError::NotFound) => {
            info!("no stored configuration, installing defaults");
            let config = SystemConfig::default();
            if let Err(e) = port.save_config(&config) {
                warn!("failed to persist default configuration: {e}");
            }
            config
        }
        Err(e) => {
            warn!("stored configuration unusable ({e}), using defaults");
            SystemConfig::default()
        }
    }
}
