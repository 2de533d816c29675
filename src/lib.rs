pub mod aggregate;
pub mod backend;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod probes;
pub mod reporting;
pub mod scope;

/// `cloudcensus <version>`, plus the git hash when the build recorded one.
pub fn generator_string() -> String {
    match option_env!("GIT_HASH") {
        Some(hash) => format!("cloudcensus {} ({})", env!("CARGO_PKG_VERSION"), hash),
        None => format!("cloudcensus {}", env!("CARGO_PKG_VERSION")),
    }
}
