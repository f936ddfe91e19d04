//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] over the ESP-IDF NVS partition (or an
//! in-memory map on host), and [`ConfigPort`] on top of it: the
//! [`InterlockConfig`] is stored as one postcard blob and validated on
//! both save and load.

use log::{info, warn};

use crate::app::ports::{ConfigPort, StoragePort};
use crate::config::InterlockConfig;
use crate::error::{ConfigError, StorageError};

#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;
#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use std::ffi::CString;

const CONFIG_NAMESPACE: &str = "limbsafety";
const CONFIG_KEY: &str = "lsscfg";

/// Largest blob the adapter reads back.
const MAX_BLOB_SIZE: usize = 512;
/// NVS limit for namespace and key names (excluding the terminator).
const MAX_NAME_LEN: usize = 15;

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t) -> Result<(), esp_err_t> {
    if ret == ESP_OK as esp_err_t { Ok(()) } else { Err(ret) }
}

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Initialise NVS flash, erasing it once on a layout/version mismatch.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any NVS access.
            let mut ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
            {
                warn!("NVS: erasing and re-initialising flash partition");
                check(unsafe { nvs_flash_erase() }).map_err(|_| StorageError::IoError)?;
                ret = unsafe { nvs_flash_init() };
            }
            check(ret).map_err(|_| StorageError::IoError)?;
            info!("NVS: initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NVS: in-memory backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: RefCell::new(HashMap::new()),
        })
    }

    fn check_names(namespace: &str, key: &str) -> Result<(), StorageError> {
        if namespace.is_empty()
            || key.is_empty()
            || namespace.len() > MAX_NAME_LEN
            || key.len() > MAX_NAME_LEN
        {
            return Err(StorageError::IoError);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{namespace}::{key}")
    }

    /// Open `namespace`, run `f` with the handle, close.
    #[cfg(target_os = "espidf")]
    fn with_handle<T>(
        namespace: &str,
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    ) -> Result<T, esp_err_t> {
        let ns = CString::new(namespace).map_err(|_| ESP_ERR_INVALID_ARG as esp_err_t)?;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: `ns` is a valid C string for the duration of the call.
        check(unsafe { nvs_open(ns.as_ptr(), mode, &mut handle) })?;
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn map_err(e: esp_err_t) -> StorageError {
        if e == ESP_ERR_NVS_NOT_FOUND as esp_err_t {
            StorageError::NotFound
        } else if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE as esp_err_t {
            StorageError::Full
        } else {
            StorageError::IoError
        }
    }

    /// Write a blob and commit.
    #[cfg(target_os = "espidf")]
    fn set_blob(namespace: &str, key: &str, data: &[u8]) -> Result<(), esp_err_t> {
        let k = CString::new(key).map_err(|_| ESP_ERR_INVALID_ARG as esp_err_t)?;
        Self::with_handle(namespace, true, |handle| {
            check(unsafe { nvs_set_blob(handle, k.as_ptr(), data.as_ptr().cast(), data.len()) })?;
            check(unsafe { nvs_commit(handle) })
        })
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        Self::check_names(namespace, key)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let store = self.store.borrow();
            let data = store
                .get(&Self::composite_key(namespace, key))
                .ok_or(StorageError::NotFound)?;
            let len = data.len().min(buf.len());
            buf[..len].copy_from_slice(&data[..len]);
            Ok(len)
        }

        #[cfg(target_os = "espidf")]
        {
            let k = CString::new(key).map_err(|_| StorageError::IoError)?;
            Self::with_handle(namespace, false, |handle| {
                let mut size = buf.len();
                check(unsafe {
                    nvs_get_blob(handle, k.as_ptr(), buf.as_mut_ptr().cast(), &mut size)
                })?;
                Ok(size)
            })
            .map_err(Self::map_err)
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        Self::check_names(namespace, key)?;

        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .insert(Self::composite_key(namespace, key), data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            Self::set_blob(namespace, key, data).map_err(Self::map_err)
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        Self::check_names(namespace, key)?;

        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .remove(&Self::composite_key(namespace, key));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let k = CString::new(key).map_err(|_| StorageError::IoError)?;
            Self::with_handle(namespace, true, |handle| {
                let ret = unsafe { nvs_erase_key(handle, k.as_ptr()) };
                if ret != ESP_ERR_NVS_NOT_FOUND as esp_err_t {
                    check(ret)?;
                }
                check(unsafe { nvs_commit(handle) })
            })
            .map_err(Self::map_err)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        if Self::check_names(namespace, key).is_err() {
            return false;
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow()
                .contains_key(&Self::composite_key(namespace, key))
        }

        #[cfg(target_os = "espidf")]
        {
            let Ok(k) = CString::new(key) else {
                return false;
            };
            Self::with_handle(namespace, false, |handle| {
                let ret = unsafe { nvs_find_key(handle, k.as_ptr(), core::ptr::null_mut()) };
                Ok(ret == ESP_OK as esp_err_t)
            })
            .unwrap_or(false)
        }
    }
}

impl NvsAdapter {
    fn read_config_blob(&self) -> Result<Vec<u8>, ConfigError> {
        let mut buf = vec![0u8; MAX_BLOB_SIZE];
        let len = self
            .read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf)
            .map_err(|e| match e {
                StorageError::NotFound => ConfigError::NotFound,
                _ => ConfigError::Corrupted,
            })?;
        buf.truncate(len);
        Ok(buf)
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<InterlockConfig, ConfigError> {
        let bytes = self.read_config_blob()?;
        let cfg: InterlockConfig =
            postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        if let Err(e) = cfg.validate() {
            warn!("NVS: stored config rejected: {e}");
            return Err(ConfigError::Corrupted);
        }
        info!("NVS: config loaded ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, config: &InterlockConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::Corrupted)?;

        #[cfg(not(target_os = "espidf"))]
        self.store
            .borrow_mut()
            .insert(Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY), bytes.clone());

        #[cfg(target_os = "espidf")]
        Self::set_blob(CONFIG_NAMESPACE, CONFIG_KEY, &bytes).map_err(|e| {
            warn!("NVS: config write error {e}");
            ConfigError::Corrupted
        })?;

        info!("NVS: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
