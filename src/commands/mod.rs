//! Command handlers module.
//!
//! - `io.rs`: `inspect` and `convert`
//! - `config.rs`: configuration display

mod config;
mod io;

pub use config::cmd_config;
pub use io::{cmd_convert, cmd_inspect};
