//! NVS (Non-Volatile Storage) settings adapter.
//!
//! Implements [`SettingsPort`] for the clock.  The whole [`ClockConfig`]
//! record lives in one postcard blob under `FlipClock/userConfig`.
//!
//! - Validation: every save runs [`ClockConfig::validate`] first.
//! - Corruption: a blob that fails to decode or validate loads as defaults
//!   and is reported, so a bad flash never bricks the UI.
//! - Factory reset erases the namespace; the next boot starts from defaults.

use crate::app::ports::{SettingsError, SettingsPort};
use crate::config::ClockConfig;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const SETTINGS_NAMESPACE: &str = "FlipClock";
const SETTINGS_KEY: &str = "userConfig";

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsSettings {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsSettings {
    /// Initialise NVS flash and return the adapter.
    ///
    /// On first boot or after a partition version change the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, SettingsError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS user.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(SettingsError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(SettingsError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(SettingsError::IoError);
            }
            info!("NvsSettings: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsSettings: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key() -> String {
        format!("{}::{}", SETTINGS_NAMESPACE, SETTINGS_KEY)
    }

    /// Simulation only: plant raw bytes as the stored record.
    #[cfg(not(target_os = "espidf"))]
    pub fn inject_raw(&mut self, bytes: &[u8]) {
        self.store.insert(Self::composite_key(), bytes.to_vec());
    }

    /// Simulation only: whether a record is currently stored.
    #[cfg(not(target_os = "espidf"))]
    pub fn has_record(&self) -> bool {
        self.store.contains_key(&Self::composite_key())
    }

    /// Open the settings namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = SETTINGS_NAMESPACE.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob() -> Result<Option<Vec<u8>>, SettingsError> {
        let result = Self::with_nvs_handle(false, |handle| {
            let key_cstr = b"userConfig\0";
            let mut size: usize = 0;

            // First call: size only
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });

        match result {
            Ok(bytes) => Ok(Some(bytes)),
            // A fresh partition has no namespace yet either.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(SettingsError::Corrupted),
            Err(e) => {
                warn!("NvsSettings: NVS read error {}", e);
                Err(SettingsError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, SettingsError> {
        Ok(self.store.get(&Self::composite_key()).cloned())
    }
}

/// Decode and validate a stored record.
fn decode(bytes: &[u8]) -> Result<ClockConfig, SettingsError> {
    let config: ClockConfig = postcard::from_bytes(bytes).map_err(|_| SettingsError::Corrupted)?;
    config.validate().map_err(|_| SettingsError::Corrupted)?;
    Ok(config)
}

impl SettingsPort for NvsSettings {
    fn load(&mut self) -> Result<ClockConfig, SettingsError> {
        #[cfg(target_os = "espidf")]
        let stored = Self::read_blob()?;
        #[cfg(not(target_os = "espidf"))]
        let stored = self.read_blob()?;

        match stored {
            Some(bytes) => {
                let config = decode(&bytes)?;
                info!("NvsSettings: loaded settings ({} bytes)", bytes.len());
                Ok(config)
            }
            None => {
                info!("NvsSettings: no stored settings, using defaults");
                Ok(ClockConfig::default())
            }
        }
    }

    fn save(&mut self, config: &ClockConfig) -> Result<(), SettingsError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| SettingsError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            self.store.insert(Self::composite_key(), bytes);
            info!("NvsSettings: settings saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(true, |handle| {
                let key_cstr = b"userConfig\0";
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsSettings: settings saved ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(SettingsError::StorageFull),
                Err(e) => {
                    warn!("NvsSettings: NVS write error {}", e);
                    Err(SettingsError::IoError)
                }
            }
        }
    }

    fn factory_reset(&mut self) -> Result<(), SettingsError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let prefix = format!("{}::", SETTINGS_NAMESPACE);
            self.store.retain(|k, _| !k.starts_with(&prefix));
            info!("NvsSettings: namespace erased (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(true, |handle| {
                let ret = unsafe { nvs_erase_all(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsSettings: namespace erased");
                    Ok(())
                }
                // Nothing was ever saved.
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(()),
                Err(e) => {
                    warn!("NvsSettings: NVS erase error {}", e);
                    Err(SettingsError::IoError)
                }
            }
        }
    }
}
