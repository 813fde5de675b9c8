//! `tracing-subscriber` setup shared by the xrpl-saga binaries.

mod logging;

pub use logging::{filter_directives, init, LogConfig, LogFormat, LogOutput};
