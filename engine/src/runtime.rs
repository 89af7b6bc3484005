//! Runtime and I/O driver detection for startup logs.

use tracing::info;

/// Name of the OS readiness mechanism tokio drives on this platform.
#[inline]
fn io_driver() -> &'static str {
    if cfg!(target_os = "linux") {
        "epoll"
    } else if cfg!(any(target_os = "macos", target_os = "freebsd")) {
        "kqueue"
    } else if cfg!(target_os = "windows") {
        "iocp"
    } else {
        "unknown"
    }
}

/// Log runtime information at startup.
pub fn print_runtime_info() {
    info!(
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        runtime = "tokio",
        io = io_driver(),
        "Runtime initialized"
    );
}

/// Short runtime description for the startup banner.
pub fn runtime_description() -> &'static str {
    if cfg!(target_os = "linux") {
        "tokio + epoll"
    } else if cfg!(any(target_os = "macos", target_os = "freebsd")) {
        "tokio + kqueue"
    } else if cfg!(target_os = "windows") {
        "tokio + iocp"
    } else {
        "tokio"
    }
}
