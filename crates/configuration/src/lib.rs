use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, Database, Insights, Server};

/// Loads the application configuration.
///
/// Reads `profitline.toml` and then applies `PROFITLINE_*` environment
/// overrides (e.g. `PROFITLINE_SERVER__LISTEN_ADDR`), deserializing the
/// result into our strongly-typed `Config` struct.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("profitline").required(false))
        .add_source(config::Environment::with_prefix("PROFITLINE").separator("__"))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;

    Ok(config)
}
