//! Login shell resolution.
//!
//! The login shell comes from the user's passwd entry. `$SHELL` is only
//! consulted when there is no such entry, since it is inherited and may name
//! a shell other than the one configured for the account.

use std::path::{Path, PathBuf};

/// Used when neither an override nor a login shell is available.
pub const FALLBACK_SHELL: &str = "/bin/bash";

/// Pick the shell to run the command in: the explicit override, else the
/// login shell from the passwd database, else `$SHELL`, else
/// [`FALLBACK_SHELL`].
pub fn resolve_shell(explicit: Option<&Path>) -> PathBuf {
    resolve_with(explicit, passwd_shell(), std::env::var("SHELL").ok())
}

fn resolve_with(
    explicit: Option<&Path>,
    passwd: Option<String>,
    env_shell: Option<String>,
) -> PathBuf {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return path.to_path_buf();
    }
    match passwd
        .into_iter()
        .chain(env_shell)
        .find(|shell| !shell.trim().is_empty())
    {
        Some(shell) => PathBuf::from(shell),
        None => {
            tracing::debug!("no login shell found, falling back to {}", FALLBACK_SHELL);
            PathBuf::from(FALLBACK_SHELL)
        }
    }
}

/// The current user's shell as recorded in the passwd database.
#[cfg(unix)]
pub fn passwd_shell() -> Option<String> {
    use std::ffi::CStr;
    use std::mem::MaybeUninit;

    let mut buf = vec![0 as libc::c_char; 4096];
    let mut pwd = MaybeUninit::<libc::passwd>::uninit();
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    // SAFETY: every pointer refers to live storage of the stated size, and
    // `pwd` is only read after getpwuid_r reports it filled in.
    unsafe {
        let rc = libc::getpwuid_r(
            libc::getuid(),
            pwd.as_mut_ptr(),
            buf.as_mut_ptr(),
            buf.len(),
            &mut result,
        );
        if rc != 0 || result.is_null() {
            return None;
        }
        let pwd = pwd.assume_init();
        if pwd.pw_shell.is_null() {
            return None;
        }
        Some(CStr::from_ptr(pwd.pw_shell).to_string_lossy().into_owned())
    }
}

#[cfg(not(unix))]
pub fn passwd_shell() -> Option<String> {
    None
}
