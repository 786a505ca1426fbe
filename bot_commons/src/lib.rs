//! Plumbing shared by the bots in this workspace, because some things
//! are just boilerplate.

use std::future::Future;

pub mod commands;
pub mod useful_methods;

/// Initialize logging and start the `closure` in an async runtime.
/// Logging is enabled by default on level `info` unless overridden
/// by environment variable `RUST_LOG`. This uses the crate
/// [pretty_env_logger][] internally, see its documentation for more details.
///
/// Timestamps are left out when running under systemd, since the journal
/// already stamps every line.
///
/// [pretty_env_logger]: https://docs.rs/pretty_env_logger
///
/// # Panics
/// Panics if the tokio runtime can't be built.
pub fn start_everything(closure: impl Future<Output = ()>) {
    let log_level = std::env::var_os("RUST_LOG")
        .unwrap_or_else(|| std::ffi::OsString::from("info"))
        .into_string()
        .unwrap_or_else(|_| String::from("info"));

    let running_as_systemd_service = std::env::var_os("JOURNAL_STREAM").is_some();

    let mut builder = match running_as_systemd_service {
        true => pretty_env_logger::formatted_builder(),
        false => pretty_env_logger::formatted_timed_builder(),
    };

    builder.parse_filters(&log_level);

    if builder.try_init().is_err() {
        log::error!("Tried to init logger twice!");
    }

    log::debug!("Logger is up with filter \"{log_level}\"");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build the tokio runtime")
        .block_on(closure);
}
