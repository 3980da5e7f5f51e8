//! WiFi adapter: station mode with stored credentials, or a fallback
//! provisioning access point when none are stored.

use log::{info, warn};

use crate::app::api::{KEY_PASS, KEY_SSID};
use crate::app::ports::StoragePort;
use crate::error::{Error, Result};

/// SoftAP advertised when no station credentials are stored.
pub const FALLBACK_AP_SSID: &str = "BSQ_TIMER";
const FALLBACK_AP_PASS: &str = "12345678";

/// Station credentials, capped at the 802.11 field sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self> {
        if ssid.is_empty() {
            return Err(Error::Config("ssid must not be empty"));
        }
        Ok(Self {
            ssid: ssid
                .try_into()
                .map_err(|()| Error::Config("ssid longer than 32 bytes"))?,
            password: password
                .try_into()
                .map_err(|()| Error::Config("password longer than 64 bytes"))?,
        })
    }
}

/// Read stored station credentials, if any. Garbage (non-UTF-8, oversize,
/// empty SSID) is treated as absent so the device falls back to the AP.
pub fn load_credentials(storage: &mut impl StoragePort) -> Option<WifiCredentials> {
    let mut buf = [0u8; 64];

    let len = storage.read(KEY_SSID, &mut buf).ok()?;
    let ssid = core::str::from_utf8(&buf[..len]).ok()?.to_string();

    let pass = match storage.read(KEY_PASS, &mut buf) {
        Ok(len) => core::str::from_utf8(&buf[..len]).ok()?.to_string(),
        Err(_) => String::new(), // open network
    };

    match WifiCredentials::new(&ssid, &pass) {
        Ok(creds) => Some(creds),
        Err(e) => {
            warn!("stored credentials unusable: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Device implementation
// ---------------------------------------------------------------------------

#[cfg(feature = "espidf")]
mod device {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{
        AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration,
        EspWifi,
    };
    use log::{error, info};

    use super::{WifiCredentials, FALLBACK_AP_PASS, FALLBACK_AP_SSID};
    use crate::error::{Error, Result};

    pub struct WifiAdapter {
        wifi: BlockingWifi<EspWifi<'static>>,
    }

    impl WifiAdapter {
        pub fn new(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: EspDefaultNvsPartition,
        ) -> Result<Self> {
            let wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs)).map_err(|e| {
                error!("wifi driver init failed: {e}");
                Error::Init("wifi driver init failed")
            })?;
            let wifi = BlockingWifi::wrap(wifi, sysloop).map_err(|e| {
                error!("wifi event wiring failed: {e}");
                Error::Init("wifi event wiring failed")
            })?;
            Ok(Self { wifi })
        }

        /// Join the configured network and block until the interface is up.
        pub fn connect_station(&mut self, creds: &WifiCredentials) -> Result<()> {
            info!("connecting to SSID {:?}", creds.ssid.as_str());
            let config = Configuration::Client(ClientConfiguration {
                ssid: creds.ssid.clone(),
                password: creds.password.clone(),
                auth_method: if creds.password.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            });

            self.wifi
                .set_configuration(&config)
                .and_then(|()| self.wifi.start())
                .and_then(|()| self.wifi.connect())
                .and_then(|()| self.wifi.wait_netif_up())
                .map_err(|e| {
                    error!("station connect failed: {e}");
                    Error::Init("station connect failed")
                })?;

            info!("station up");
            Ok(())
        }

        /// Open the provisioning access point.
        pub fn start_access_point(&mut self) -> Result<()> {
            info!("starting provisioning AP {FALLBACK_AP_SSID:?}");
            let config = Configuration::AccessPoint(AccessPointConfiguration {
                ssid: FALLBACK_AP_SSID
                    .try_into()
                    .map_err(|()| Error::Init("AP ssid too long"))?,
                password: FALLBACK_AP_PASS
                    .try_into()
                    .map_err(|()| Error::Init("AP password too long"))?,
                auth_method: AuthMethod::WPA2Personal,
                channel: 1,
                ..Default::default()
            });

            self.wifi
                .set_configuration(&config)
                .and_then(|()| self.wifi.start())
                .map_err(|e| {
                    error!("AP start failed: {e}");
                    Error::Init("AP start failed")
                })
        }

        pub fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }
    }
}

#[cfg(feature = "espidf")]
pub use device::WifiAdapter;

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(feature = "espidf"))]
mod sim {
    use log::info;

    use super::{WifiCredentials, FALLBACK_AP_SSID};
    use crate::error::Result;

    /// Pretends to connect; always succeeds.
    #[derive(Default)]
    pub struct WifiAdapter {
        connected: bool,
    }

    impl WifiAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn connect_station(&mut self, creds: &WifiCredentials) -> Result<()> {
            info!("[sim] joined {:?}", creds.ssid.as_str());
            self.connected = true;
            Ok(())
        }

        pub fn start_access_point(&mut self) -> Result<()> {
            info!("[sim] provisioning AP {FALLBACK_AP_SSID:?} up");
            self.connected = false;
            Ok(())
        }

        pub fn is_connected(&self) -> bool {
            self.connected
        }
    }
}

#[cfg(not(feature = "espidf"))]
pub use sim::WifiAdapter;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemStorage(HashMap<String, Vec<u8>>);

    impl StoragePort for MemStorage {
        fn read(&mut self, key: &str, buf: &mut [u8]) -> std::result::Result<usize, StorageError> {
            let blob = self.0.get(key).ok_or(StorageError::NotFound)?;
            if blob.len() > buf.len() {
                return Err(StorageError::IoError);
            }
            buf[..blob.len()].copy_from_slice(blob);
            Ok(blob.len())
        }
        fn write(&mut self, key: &str, value: &[u8]) -> std::result::Result<(), StorageError> {
            self.0.insert(key.to_string(), value.to_vec());
            Ok(())
        }
        fn delete(&mut self, key: &str) -> std::result::Result<(), StorageError> {
            self.0.remove(key);
            Ok(())
        }
    }

    #[test]
    fn credentials_reject_oversize_and_empty() {
        assert!(WifiCredentials::new("", "x").is_err());
        assert!(WifiCredentials::new(&"s".repeat(33), "x").is_err());
        assert!(WifiCredentials::new("net", &"p".repeat(65)).is_err());
        assert!(WifiCredentials::new("net", "").is_ok(), "open networks allowed");
    }

    #[test]
    fn load_credentials_roundtrip() {
        let mut storage = MemStorage::default();
        storage.write(KEY_SSID, b"HomeNet").unwrap();
        storage.write(KEY_PASS, b"hunter22").unwrap();

        let creds = load_credentials(&mut storage).expect("stored creds");
        assert_eq!(creds.ssid.as_str(), "HomeNet");
        assert_eq!(creds.password.as_str(), "hunter22");
    }

    #[test]
    fn absent_or_garbage_credentials_mean_none() {
        let mut storage = MemStorage::default();
        assert!(load_credentials(&mut storage).is_none());

        storage.write(KEY_SSID, &[0xFF, 0xFE]).unwrap();
        assert!(load_credentials(&mut storage).is_none());

        storage.write(KEY_SSID, b"").unwrap();
        assert!(load_credentials(&mut storage).is_none());
    }
}
