//! Verbose diagnostics.
//!
//! Library code emits `tracing` events. The binary installs a stderr
//! subscriber whose level follows `--verbose`; `RUST_LOG` overrides it.

use tracing_subscriber::EnvFilter;

pub fn print_verbose(verbose: bool, msg: &str) {
    if verbose {
        eprintln!("Verbose: {}", msg);
    }
}

pub fn log_warning(msg: &str) {
    eprintln!("Warning: {}", msg);
}

/// Default filter when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> String {
    if verbose {
        format!("{}=debug", env!("CARGO_CRATE_NAME"))
    } else {
        "off".to_string()
    }
}

pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber. Only the first call in a process wins.
pub fn init_tracing(verbose: bool) {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .without_time()
        .try_init()
    {
        log_warning(&format!("tracing init failed: {}", e));
    }
}
