//! One-shot peripheral initialisation.
//!
//! Mounts the SPIFFS data partition that holds the JSON documents, using
//! raw ESP-IDF sys calls.  Called once from `main()` before the control
//! loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    /// The partition could not be mounted (ESP-IDF error code).
    StorageMountFailed(i32),
    /// A path or label contained an interior NUL.
    BadPath,
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::StorageMountFailed(rc) => write!(f, "SPIFFS mount failed (rc={})", rc),
            Self::BadPath => write!(f, "storage path contains NUL"),
        }
    }
}

impl std::error::Error for HwInitError {}

/// Maximum simultaneously open files on the data partition.
const MAX_OPEN_FILES: usize = 5;

#[cfg(target_os = "espidf")]
pub fn mount_storage(base_path: &str, partition: &str) -> Result<(), HwInitError> {
    use std::ffi::CString;

    let base = CString::new(base_path).map_err(|_| HwInitError::BadPath)?;
    let label = CString::new(partition).map_err(|_| HwInitError::BadPath)?;
    let conf = esp_vfs_spiffs_conf_t {
        base_path: base.as_ptr(),
        partition_label: label.as_ptr(),
        max_files: MAX_OPEN_FILES,
        format_if_mount_failed: true,
    };
    // SAFETY: Called once from main() before the control loop; the
    // configuration strings are copied by the VFS layer during the call.
    let rc = unsafe { esp_vfs_spiffs_register(&conf) };
    if rc != ESP_OK {
        return Err(HwInitError::StorageMountFailed(rc));
    }
    log::info!("hw_init: {} mounted at {}", partition, base_path);
    Ok(())
}

/// Host builds keep documents in an ordinary directory; just create it.
#[cfg(not(target_os = "espidf"))]
pub fn mount_storage(base_path: &str, partition: &str) -> Result<(), HwInitError> {
    std::fs::create_dir_all(base_path).map_err(|_| HwInitError::StorageMountFailed(-1))?;
    log::info!(
        "hw_init(sim): {} backed by {} (max {} files)",
        partition,
        base_path,
        MAX_OPEN_FILES
    );
    Ok(())
}
