use std::sync::Mutex;

static HOME_MUTEX: Mutex<()> = Mutex::new(());

/// Runs `func` with `$HOME` pointing at a fresh temp dir and no base-dir override.
pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    let _guard = HOME_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    let old_base = std::env::var(crate::paths::BASE_DIR_ENV).ok();
    // SAFETY: environment mutation is serialised by HOME_MUTEX.
    unsafe {
        std::env::set_var("HOME", dir.path());
        std::env::remove_var(crate::paths::BASE_DIR_ENV);
    }
    let result = func(dir.path());
    unsafe {
        restore("HOME", old_home);
        restore(crate::paths::BASE_DIR_ENV, old_base);
    }
    result
}

/// Sets the base-dir override for the duration of `func`. Only call inside
/// [`with_temp_home`], which holds the environment lock.
pub(crate) fn with_base_dir<R>(value: &str, func: impl FnOnce() -> R) -> R {
    // SAFETY: callers hold HOME_MUTEX via with_temp_home.
    unsafe {
        std::env::set_var(crate::paths::BASE_DIR_ENV, value);
    }
    let result = func();
    unsafe {
        std::env::remove_var(crate::paths::BASE_DIR_ENV);
    }
    result
}

unsafe fn restore(key: &str, value: Option<String>) {
    match value {
        Some(value) => unsafe { std::env::set_var(key, value) },
        None => unsafe { std::env::remove_var(key) },
    }
}
