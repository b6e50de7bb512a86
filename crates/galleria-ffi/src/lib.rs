//! C FFI surface for galleria.
//!
//! Pattern: opaque LoaderHandle + C strings + JSON serialization.
//!
//! The host opens a loader over a directory, starts a cycle with a C
//! callback, and receives the gallery as JSON on the merge thread. Closing
//! the handle detaches the loader, so a cycle still in flight is dropped
//! instead of calling back into a dead host. `galleria_close` waits for a
//! callback already running on another thread, so `user_data` may be freed
//! as soon as it returns.

use std::cell::RefCell;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::sync::Arc;

use galleria_core::{AggregateResult, LoadListener, LoadOptions, LoadPhase, MediaLoader};

// ---------------------------------------------------------------------------
// Error handling (thread-local last error)
// ---------------------------------------------------------------------------

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn set_error(msg: String) {
    LAST_ERROR.with(|cell| *cell.borrow_mut() = Some(msg));
}

fn clear_error() {
    LAST_ERROR.with(|cell| *cell.borrow_mut() = None);
}

/// Returns the last error message (caller frees with `galleria_string_free`).
#[no_mangle]
pub extern "C" fn galleria_last_error() -> *mut c_char {
    LAST_ERROR.with(|cell| {
        cell.borrow_mut()
            .take()
            .and_then(|s| CString::new(s).ok())
            .map(|s| s.into_raw())
            .unwrap_or(ptr::null_mut())
    })
}

/// Frees a string returned from galleria FFI.
///
/// # Safety
/// Must be a pointer returned from this FFI and not already freed.
#[no_mangle]
pub unsafe extern "C" fn galleria_string_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        let _ = CString::from_raw(ptr);
    }
}

// ---------------------------------------------------------------------------
// Opaque handle
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct LoaderHandle {
    _private: [u8; 0],
}

struct LoaderHandleInner {
    loader: MediaLoader,
}

/// Status passed to [`GalleriaCallback`].
pub const GALLERIA_NO_MEDIA: i32 = 0;
pub const GALLERIA_LOADED: i32 = 1;

/// Completion callback.
///
/// `json` is the gallery as a JSON array when `status == GALLERIA_LOADED`,
/// NULL otherwise. It is only valid for the duration of the call. Invoked
/// on a background thread.
pub type GalleriaCallback =
    extern "C" fn(user_data: *mut c_void, status: i32, json: *const c_char);

struct CallbackListener {
    callback: GalleriaCallback,
    /// Opaque host pointer, passed back untouched.
    user_data: usize,
}

impl LoadListener for CallbackListener {
    fn on_loaded(&self, result: AggregateResult) {
        let json = match serde_json::to_string(&result).map(CString::new) {
            Ok(Ok(json)) => json,
            Ok(Err(e)) => {
                log::error!("galleria: gallery JSON contains NUL: {}", e);
                return;
            }
            Err(e) => {
                log::error!("galleria: failed to encode gallery: {}", e);
                return;
            }
        };
        (self.callback)(self.user_data as *mut c_void, GALLERIA_LOADED, json.as_ptr());
    }

    fn on_no_media(&self) {
        (self.callback)(self.user_data as *mut c_void, GALLERIA_NO_MEDIA, ptr::null());
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Opens a loader over the directory `root`.
///
/// `options_json` may be NULL for defaults, or a JSON object such as
/// `{"load_gifs": false, "labels": {"all_media": "All"}}`.
/// Returns NULL on error (see `galleria_last_error`).
///
/// # Safety
/// `root` must be a valid null-terminated C string; `options_json` must be
/// NULL or a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn galleria_open(
    root: *const c_char,
    options_json: *const c_char,
) -> *mut LoaderHandle {
    clear_error();
    let root = match read_cstr(root) {
        Ok(r) => r,
        Err(e) => return err_null_handle(e),
    };
    let options = if options_json.is_null() {
        LoadOptions::default()
    } else {
        match read_cstr(options_json).and_then(|json| {
            LoadOptions::parse(&json).map_err(|e| galleria_core::LoadError::from(e).to_string())
        }) {
            Ok(o) => o,
            Err(e) => return err_null_handle(e),
        }
    };

    let loader = MediaLoader::from_directory(root, options);
    Box::into_raw(Box::new(LoaderHandleInner { loader })) as *mut LoaderHandle
}

/// Starts a load cycle. Returns 1 on success, 0 on error.
///
/// `callback` fires exactly once per successful start, unless the handle is
/// closed first.
#[no_mangle]
pub extern "C" fn galleria_start(
    handle: *mut LoaderHandle,
    callback: GalleriaCallback,
    user_data: *mut c_void,
) -> i32 {
    clear_error();
    let loader = match loader_ref(handle) {
        Ok(l) => l,
        Err(e) => return err_zero(e),
    };
    let listener = CallbackListener {
        callback,
        user_data: user_data as usize,
    };
    match loader.start(Arc::new(listener)) {
        Ok(()) => 1,
        Err(e) => err_zero(e.to_string()),
    }
}

/// Returns 1 once the last started cycle delivered its gallery, 0 otherwise
/// (or -1 for a null handle).
#[no_mangle]
pub extern "C" fn galleria_is_ready(handle: *mut LoaderHandle) -> i32 {
    match loader_ref(handle) {
        Ok(l) => l.is_ready() as i32,
        Err(e) => {
            set_error(e);
            -1
        }
    }
}

/// Current phase: 0 idle, 1 loading, 2 merging, 3 ready, 4 no media,
/// 5 dropped, -1 null handle.
#[no_mangle]
pub extern "C" fn galleria_phase(handle: *mut LoaderHandle) -> i32 {
    match loader_ref(handle) {
        Ok(l) => phase_code(l.phase()),
        Err(e) => {
            set_error(e);
            -1
        }
    }
}

/// Detaches the loader and releases the handle.
///
/// Blocks while a callback for this handle is running on another thread;
/// no callback starts after it returns. The callback must not wait on a
/// thread that is inside `galleria_close`.
///
/// # Safety
/// `handle` must come from `galleria_open` and not already be closed.
#[no_mangle]
pub unsafe extern "C" fn galleria_close(handle: *mut LoaderHandle) {
    if !handle.is_null() {
        let inner = Box::from_raw(handle as *mut LoaderHandleInner);
        inner.loader.detach();
    }
}

/// Library version, bumped on breaking ABI changes.
#[no_mangle]
pub extern "C" fn galleria_version() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn phase_code(phase: LoadPhase) -> i32 {
    match phase {
        LoadPhase::Idle => 0,
        LoadPhase::Loading => 1,
        LoadPhase::Merging => 2,
        LoadPhase::Ready => 3,
        LoadPhase::NoMedia => 4,
        LoadPhase::Dropped => 5,
    }
}

fn loader_ref<'a>(handle: *mut LoaderHandle) -> Result<&'a MediaLoader, String> {
    if handle.is_null() {
        return Err("null loader handle".into());
    }
    let inner = unsafe { &*(handle as *mut LoaderHandleInner) };
    Ok(&inner.loader)
}

fn read_cstr(ptr: *const c_char) -> Result<String, String> {
    if ptr.is_null() {
        return Err("null string pointer".into());
    }
    unsafe {
        CStr::from_ptr(ptr)
            .to_str()
            .map(String::from)
            .map_err(|_| "invalid utf-8".into())
    }
}

fn err_null_handle(msg: String) -> *mut LoaderHandle {
    set_error(msg);
    ptr::null_mut()
}

fn err_zero(msg: String) -> i32 {
    set_error(msg);
    0
}

// ---------------------------------------------------------------------------
// FFI Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    /// What the C callback saw: (status, json).
    type Calls = Mutex<Vec<(i32, Option<String>)>>;

    extern "C" fn record(user_data: *mut c_void, status: i32, json: *const c_char) {
        let calls = unsafe { &*(user_data as *const Calls) };
        let json = if json.is_null() {
            None
        } else {
            Some(unsafe { CStr::from_ptr(json).to_str().unwrap().to_string() })
        };
        calls.lock().push((status, json));
    }

    static GATE_ENTERED: AtomicBool = AtomicBool::new(false);
    static GATE_RELEASE: AtomicBool = AtomicBool::new(false);
    static GATE_FINISHED: AtomicBool = AtomicBool::new(false);

    /// Like `record`, but holds the callback open until `GATE_RELEASE`.
    extern "C" fn gated(user_data: *mut c_void, status: i32, json: *const c_char) {
        GATE_ENTERED.store(true, Ordering::SeqCst);
        let deadline = Instant::now() + Duration::from_secs(5);
        while !GATE_RELEASE.load(Ordering::SeqCst) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        record(user_data, status, json);
        GATE_FINISHED.store(true, Ordering::SeqCst);
    }

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    /// Read a *mut c_char into a String and free it.
    fn read_ffi_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null(), "FFI returned null string");
        let s = unsafe { CStr::from_ptr(ptr).to_str().unwrap().to_string() };
        unsafe { galleria_string_free(ptr) };
        s
    }

    fn gallery_dir() -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        for rel in ["Camera/a.jpg", "Camera/b.mp4", "Movies/c.mkv"] {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"stub").unwrap();
        }
        dir
    }

    fn open(dir: &TempDir, options: Option<&str>) -> *mut LoaderHandle {
        let root = c(dir.path().to_str().unwrap());
        let options = options.map(c);
        let handle = unsafe {
            galleria_open(
                root.as_ptr(),
                options.as_ref().map_or(ptr::null(), |o| o.as_ptr()),
            )
        };
        assert!(!handle.is_null(), "galleria_open returned null");
        handle
    }

    fn wait_for_calls(calls: &Calls, n: usize) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if calls.lock().len() >= n {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn ffi_version() {
        assert_eq!(galleria_version(), 1);
    }

    #[test]
    fn ffi_open_close_lifecycle() {
        let dir = gallery_dir();
        let handle = open(&dir, None);
        assert_eq!(galleria_phase(handle), 0);
        assert_eq!(galleria_is_ready(handle), 0);
        unsafe { galleria_close(handle) };
    }

    #[test]
    fn ffi_null_handle_returns_error() {
        let calls: Calls = Mutex::new(Vec::new());
        let status = galleria_start(
            ptr::null_mut(),
            record,
            &calls as *const Calls as *mut c_void,
        );
        assert_eq!(status, 0);
        let err = read_ffi_string(galleria_last_error());
        assert!(err.contains("null"));
        assert_eq!(galleria_is_ready(ptr::null_mut()), -1);
    }

    #[test]
    fn ffi_invalid_options_rejected() {
        let dir = gallery_dir();
        let root = c(dir.path().to_str().unwrap());
        let options = c(r#"{"load_images": "yes"}"#);
        let handle = unsafe { galleria_open(root.as_ptr(), options.as_ptr()) };
        assert!(handle.is_null());
        let err = read_ffi_string(galleria_last_error());
        assert!(err.starts_with("invalid load options"));
    }

    #[test]
    fn ffi_load_delivers_json_gallery() {
        let dir = gallery_dir();
        let handle = open(&dir, Some(r#"{"labels": {"all_media": "Everything"}}"#));
        let calls: Calls = Mutex::new(Vec::new());

        let status = galleria_start(handle, record, &calls as *const Calls as *mut c_void);
        assert_eq!(status, 1);
        assert!(wait_for_calls(&calls, 1));
        assert_eq!(galleria_is_ready(handle), 1);
        assert_eq!(galleria_phase(handle), 3);
        unsafe { galleria_close(handle) };

        let calls = calls.lock();
        assert_eq!(calls.len(), 1);
        let (status, json) = &calls[0];
        assert_eq!(*status, GALLERIA_LOADED);
        let gallery: serde_json::Value = serde_json::from_str(json.as_ref().unwrap()).unwrap();
        let names: Vec<&str> = gallery
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["name"].as_str().unwrap())
            .collect();
        assert_eq!(names[0], "Everything");
        assert_eq!(names[2], "All videos");
        assert!(names.contains(&"Camera"));
        assert!(names.contains(&"Movies"));
    }

    #[test]
    fn ffi_empty_dir_reports_no_media() {
        let dir = TempDir::new().expect("tempdir");
        let handle = open(&dir, None);
        let calls: Calls = Mutex::new(Vec::new());

        assert_eq!(galleria_start(handle, record, &calls as *const Calls as *mut c_void), 1);
        assert!(wait_for_calls(&calls, 1));
        assert_eq!(calls.lock()[0], (GALLERIA_NO_MEDIA, None));
        assert_eq!(galleria_is_ready(handle), 0);
        assert_eq!(galleria_phase(handle), 4);
        unsafe { galleria_close(handle) };
    }

    #[test]
    fn ffi_nothing_requested_delivers_empty_array() {
        let dir = gallery_dir();
        let handle = open(&dir, Some(r#"{"load_images": false, "load_videos": false}"#));
        let calls: Calls = Mutex::new(Vec::new());

        assert_eq!(galleria_start(handle, record, &calls as *const Calls as *mut c_void), 1);
        assert!(wait_for_calls(&calls, 1));
        assert_eq!(calls.lock()[0], (GALLERIA_LOADED, Some("[]".to_string())));
        unsafe { galleria_close(handle) };
    }

    #[test]
    fn ffi_close_waits_for_running_callback() {
        let dir = gallery_dir();
        let handle = open(&dir, None);
        let calls: Calls = Mutex::new(Vec::new());

        assert_eq!(galleria_start(handle, gated, &calls as *const Calls as *mut c_void), 1);
        let deadline = Instant::now() + Duration::from_secs(5);
        while !GATE_ENTERED.load(Ordering::SeqCst) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(GATE_ENTERED.load(Ordering::SeqCst));

        let raw = handle as usize;
        let closer = std::thread::spawn(move || unsafe { galleria_close(raw as *mut LoaderHandle) });
        std::thread::sleep(Duration::from_millis(50));
        assert!(!closer.is_finished());
        assert!(!GATE_FINISHED.load(Ordering::SeqCst));

        GATE_RELEASE.store(true, Ordering::SeqCst);
        closer.join().unwrap();
        assert!(GATE_FINISHED.load(Ordering::SeqCst));
        assert_eq!(calls.lock().len(), 1);
    }

    #[test]
    fn ffi_no_callback_after_close_returns() {
        let dir = gallery_dir();
        let handle = open(&dir, None);
        let calls: Calls = Mutex::new(Vec::new());

        assert_eq!(galleria_start(handle, record, &calls as *const Calls as *mut c_void), 1);
        unsafe { galleria_close(handle) };
        let seen = calls.lock().len();
        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(calls.lock().len(), seen);
        assert!(seen <= 1);
    }

    #[test]
    fn ffi_string_free_null_safe() {
        unsafe { galleria_string_free(ptr::null_mut()) };
    }
}
