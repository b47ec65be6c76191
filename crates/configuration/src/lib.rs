// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{Config, DatabaseSettings, ServerSettings};

/// Loads the application configuration.
///
/// Settings come from an optional `config.toml` in the working directory,
/// overridden by `APP__`-prefixed environment variables (for example
/// `APP__SERVER__PORT=8080`). Anything left unset falls back to the
/// defaults baked into the settings structs.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config.toml").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;

    Ok(config)
}
