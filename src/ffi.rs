//! FFI bindings for thighmotion
//!
//! This module provides C-compatible functions for calling thighmotion from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `thighmotion_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::PipelineConfig;
use crate::error::ComputeError;
use crate::features::FeatureComputer;
use crate::pipeline::{process_recording, recording_to_features_json};
use crate::schema::RecordingInput;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Parse an optional configuration; NULL selects the defaults
unsafe fn config_from_ptr(config_json: *const c_char) -> Result<PipelineConfig, ComputeError> {
    if config_json.is_null() {
        return Ok(PipelineConfig::default());
    }
    match cstr_to_string(config_json) {
        Some(json) => PipelineConfig::from_json(&json),
        None => Err(ComputeError::InvalidConfig(
            "configuration is not valid UTF-8".to_string(),
        )),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute the feature row of one recording document.
///
/// # Safety
/// - `recording_json` must be a valid null-terminated C string.
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Returns a newly allocated string that must be freed with `thighmotion_free_string`.
/// - Returns NULL on error; call `thighmotion_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn thighmotion_extract_json(
    recording_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(recording_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid recording string pointer");
            return ptr::null_mut();
        }
    };

    let config = match config_from_ptr(config_json) {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match recording_to_features_json(&json_str, &config) {
        Ok(row) => string_to_cstr(&row),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Reusable Computer API
// ============================================================================

/// Opaque handle to a FeatureComputer
pub struct FeatureComputerHandle {
    computer: FeatureComputer,
}

/// Create a FeatureComputer from a JSON configuration.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Must be freed with `thighmotion_computer_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn thighmotion_computer_new(
    config_json: *const c_char,
) -> *mut FeatureComputerHandle {
    clear_last_error();

    let computer = match config_from_ptr(config_json).and_then(FeatureComputer::new) {
        Ok(computer) => computer,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    Box::into_raw(Box::new(FeatureComputerHandle { computer }))
}

/// Free a FeatureComputer.
///
/// # Safety
/// - `computer` must be a valid pointer returned by `thighmotion_computer_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn thighmotion_computer_free(computer: *mut FeatureComputerHandle) {
    if !computer.is_null() {
        drop(Box::from_raw(computer));
    }
}

/// Run one recording and return its outcome JSON.
///
/// A recording that fails inside the pipeline still returns a string: an outcome
/// with `"status": "failure"` and the reason. NULL is returned only when the
/// document itself cannot be read.
///
/// # Safety
/// - `computer` must be a valid pointer returned by `thighmotion_computer_new`.
/// - `recording_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `thighmotion_free_string`.
#[no_mangle]
pub unsafe extern "C" fn thighmotion_computer_process(
    computer: *const FeatureComputerHandle,
    recording_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if computer.is_null() {
        set_last_error("Null computer pointer");
        return ptr::null_mut();
    }

    let handle = &*computer;

    let json_str = match cstr_to_string(recording_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid recording string pointer");
            return ptr::null_mut();
        }
    };

    let recording: RecordingInput = match serde_json::from_str(&json_str) {
        Ok(recording) => recording,
        Err(e) => {
            set_last_error(&ComputeError::from(e).to_string());
            return ptr::null_mut();
        }
    };

    let outcome = process_recording(&handle.computer, &recording);
    match serde_json::to_string(&outcome) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by thighmotion functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a thighmotion function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn thighmotion_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next thighmotion call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn thighmotion_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn thighmotion_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    /// 60 s at 10 Hz with a 10 s block of x = 1.0 starting at 20 s
    fn sample_recording_json() -> CString {
        let samples: Vec<[f64; 3]> = (0..600)
            .map(|i| if (200..300).contains(&i) { [1.0, 0.0, 0.0] } else { [0.0; 3] })
            .collect();
        let json = serde_json::json!({
            "recording_id": "ffi-01",
            "side": "right",
            "series": {
                "start": "2024-01-15T08:00:00Z",
                "sampling_rate_hz": 10.0,
                "samples": samples,
            }
        });
        CString::new(json.to_string()).unwrap()
    }

    fn config_json() -> CString {
        CString::new(r#"{"sampling_rate_hz": 10.0, "high_pass": null}"#).unwrap()
    }

    #[test]
    fn test_ffi_extract_json() {
        let recording = sample_recording_json();
        let config = config_json();

        unsafe {
            let result = thighmotion_extract_json(recording.as_ptr(), config.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let row: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(row["recording_id"], "ffi-01");
            assert_eq!(row["side"], "right");
            assert!(row["activity_percentage"].as_f64().unwrap() > 0.0);

            thighmotion_free_string(result);
        }
    }

    #[test]
    fn test_ffi_computer_lifecycle() {
        let config = config_json();

        unsafe {
            let computer = thighmotion_computer_new(config.as_ptr());
            assert!(!computer.is_null());

            let recording = sample_recording_json();
            let result = thighmotion_computer_process(computer, recording.as_ptr());
            assert!(!result.is_null());

            let outcome: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(outcome["status"], "success");

            thighmotion_free_string(result);
            thighmotion_computer_free(computer);
        }
    }

    #[test]
    fn test_ffi_computer_reports_failure_outcome() {
        // Default config expects 50 Hz; the 10 Hz recording fails inside the pipeline
        unsafe {
            let computer = thighmotion_computer_new(ptr::null());
            assert!(!computer.is_null());

            let recording = sample_recording_json();
            let result = thighmotion_computer_process(computer, recording.as_ptr());
            assert!(!result.is_null());

            let outcome: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(outcome["status"], "failure");
            assert!(outcome["reason"].as_str().unwrap().contains("Sampling rate mismatch"));

            thighmotion_free_string(result);
            thighmotion_computer_free(computer);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = thighmotion_extract_json(invalid_json.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = thighmotion_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_invalid_config() {
        let config = CString::new(r#"{"window_length_s": -1.0}"#).unwrap();
        unsafe {
            let computer = thighmotion_computer_new(config.as_ptr());
            assert!(computer.is_null());
            assert!(!thighmotion_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = thighmotion_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
