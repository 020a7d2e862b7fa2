//! Log output for the session thread and the client handle.
//!
//! Build with `--features tracing` to get structured events such as state
//! changes, connect failures and dropped frames. In default builds the
//! `debug!`/`info!`/`warn!`/`error!`/`trace!` macros used across the crate
//! accept the same arguments and expand to nothing.

/// Installs a stderr subscriber for armlink's events.
///
/// `RUST_LOG` selects what is shown (`armlink=debug` if unset). Lines carry
/// time since start and the emitting thread, so session events show up under
/// `armlink-session`. Calling it again, or after another subscriber was
/// installed, is harmless. A no-op without the `tracing` feature.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("armlink=debug"));
    let output = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(fmt::time::uptime());

    if tracing_subscriber::registry().with(output).with(filter).try_init().is_err() {
        tracing::debug!("subscriber already installed");
    }
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, error, info, trace, warn};

// Swallows any event syntax, fields and format arguments included.
#[cfg(not(feature = "tracing"))]
macro_rules! discard {
    ($($event:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use {
    discard as debug, discard as error, discard as info, discard as trace, discard as warn,
};
