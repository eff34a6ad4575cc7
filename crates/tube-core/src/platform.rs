use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SOCKET: AtomicU64 = AtomicU64::new(0);

/// IPC endpoint name for one player library instance.  Unique per process and
/// per call, so two mounted widgets never share (or clobber) a socket.
#[cfg(unix)]
pub fn mpv_socket_name() -> String {
    let n = NEXT_SOCKET.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}/searchtube-mpv-{}-{}.sock",
        std::env::temp_dir().display(),
        std::process::id(),
        n
    )
}

#[cfg(windows)]
pub fn mpv_socket_name() -> String {
    let n = NEXT_SOCKET.fetch_add(1, Ordering::Relaxed);
    format!("searchtube-mpv-{}-{}", std::process::id(), n)
}

#[cfg(unix)]
pub fn mpv_socket_arg(socket_name: &str) -> String {
    format!("--input-ipc-server={}", socket_name)
}

#[cfg(windows)]
pub fn mpv_socket_arg(socket_name: &str) -> String {
    format!("--input-ipc-server=\\\\.\\pipe\\{}", socket_name)
}

pub fn data_dir() -> PathBuf {
    // ~/.local/share/searchtube on unix, even on macOS
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("searchtube")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("searchtube")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("searchtube")
    }
    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("searchtube")
    }
}

#[cfg(unix)]
pub fn mpv_binary_name() -> &'static str {
    "mpv"
}

#[cfg(windows)]
pub fn mpv_binary_name() -> &'static str {
    "mpv.exe"
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|p| p.exists())
}

/// Find the mpv binary.
///
/// Searches in order:
/// 1. `configured` (from config.toml), when non-empty
/// 2. MPV_PATH environment variable
/// 3. Beside the current executable
/// 4. PATH
pub fn find_mpv_binary(configured: Option<&std::path::Path>) -> Option<PathBuf> {
    if let Some(p) = configured.filter(|p| !p.as_os_str().is_empty()) {
        if p.exists() {
            return Some(p.to_path_buf());
        }
    }

    if let Ok(p) = std::env::var("MPV_PATH") {
        let p = PathBuf::from(p);
        if p.exists() {
            return Some(p);
        }
    }

    let exe_name = mpv_binary_name();
    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let local = dir.join(exe_name);
            if local.exists() {
                return Some(local);
            }
        }
    }

    find_on_path(exe_name)
}
