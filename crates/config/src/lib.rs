//! Configuration management for txplain
//!
//! This crate provides functionality for managing the txplain configuration,
//! including loading, saving, updating, and deleting configuration settings, and
//! overlaying the environment variables a deployment sets.

/// Error types for the configuration module
pub mod error;

use std::path::{Path, PathBuf};

use crate::error::Error;
use clap::Parser;
use serde::{Deserialize, Serialize};
#[allow(deprecated)]
use std::env::home_dir;
use tracing::{debug, error, info};
use txplain_common::{
    constants::{DEFAULT_CHAIN, DEFAULT_PRICE_TOLERANCE},
    utils::env::{get_env, get_env_parsed},
};

/// Overrides the location of the configuration file
pub const CONFIG_PATH_ENV: &str = "TXPLAIN_CONFIG_PATH";

/// Command line arguments for the configuration command
#[derive(Debug, Clone, Parser)]
#[clap(
    about = "Display and edit the current configuration",
    override_usage = "txplain config [OPTIONS]"
)]
pub struct ConfigArgs {
    /// The target key to update.
    #[clap(required = false, default_value = "")]
    key: String,

    /// The value to set the key to.
    #[clap(required = false, default_value = "")]
    value: String,
}

/// The [`Configuration`] struct represents the configuration of the CLI and the server. Every
/// command falls back to this configuration when an argument is left empty.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Configuration {
    /// The URL for the Ethereum RPC endpoint
    pub rpc_url: String,

    /// The URL for the price oracle JSON-RPC endpoint. Prices are skipped when empty.
    pub oracle_rpc_url: String,

    /// The chain transactions are explained on
    pub chain: String,

    /// The API key for the chat completion API
    pub openai_api_key: String,

    /// The base url of the chat completion API. Required for Azure.
    pub openai_api_base: String,

    /// The chat completion API version. Only used by Azure.
    pub openai_api_version: String,

    /// `openai` or `azure`
    pub openai_api_type: String,

    /// The model, or the deployment name on Azure
    pub openai_model: String,

    /// The address the server binds to
    pub server_host: String,

    /// The port the server listens on
    pub server_port: u16,

    /// The maximum distance, in seconds, between a block and the price used to value it
    pub price_tolerance: u64,

    /// The maximum number of concurrent price lookups
    pub oracle_max_workers: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            rpc_url: "".to_string(),
            oracle_rpc_url: "".to_string(),
            chain: DEFAULT_CHAIN.to_string(),
            openai_api_key: "".to_string(),
            openai_api_base: "".to_string(),
            openai_api_version: "".to_string(),
            openai_api_type: "openai".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            price_tolerance: DEFAULT_PRICE_TOLERANCE,
            oracle_max_workers: 10,
        }
    }
}

#[allow(deprecated)]
impl Configuration {
    /// Returns the path of the configuration file, `$HOME/.txplain/config.toml` unless
    /// `TXPLAIN_CONFIG_PATH` is set.
    pub fn path() -> Result<PathBuf, Error> {
        if let Some(path) = get_env(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let mut home = home_dir().ok_or_else(|| {
            Error::Generic(
                "failed to get home directory. does your os support `std::env::home_dir()`?"
                    .to_string(),
            )
        })?;
        home.push(".txplain");
        home.push("config.toml");

        Ok(home)
    }

    /// Returns the current configuration: the configuration file, then MESC, then the
    /// environment.
    pub fn load() -> Result<Self, Error> {
        let mut config = Self::load_from(&Self::path()?)?;

        // load mesc config if enabled
        if mesc::is_mesc_enabled() {
            if let Some(endpoint) = mesc::get_default_endpoint(Some("txplain"))? {
                debug!("overriding rpc_url with mesc endpoint");
                config.rpc_url = endpoint.url;
            }
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Reads the configuration file at `path`, creating it with defaults if it doesn't exist.
    /// Missing keys take their default value.
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            let config = Configuration::default();
            config.save_to(path)?;
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::ParseError(format!("failed to parse config file: {e}")))
    }

    /// Overlays the environment variables a deployment uses onto this configuration.
    pub fn apply_env_overrides(&mut self) -> Result<(), Error> {
        let overrides = [
            ("WEB3_PROVIDER_URI", "rpc_url"),
            ("ORACLE_PROVIDER_URI", "oracle_rpc_url"),
            ("OPENAI_CHAT_API_KEY", "openai_api_key"),
            ("OPENAI_CHAT_API_BASE", "openai_api_base"),
            ("OPENAI_CHAT_API_VERSION", "openai_api_version"),
            ("OPENAI_CHAT_API_TYPE", "openai_api_type"),
            ("OPENAI_CHAT_API_MODEL", "openai_model"),
        ];

        for (var, key) in overrides {
            if let Some(value) = get_env(var) {
                debug!("overriding {} with ${}", key, var);
                self.set(key, &value)?;
            }
        }

        if let Some(port) = get_env("TXPLAIN_SERVER_PORT") {
            debug!("overriding server_port with $TXPLAIN_SERVER_PORT");
            self.server_port = get_env_parsed("TXPLAIN_SERVER_PORT").ok_or_else(|| {
                Error::InvalidValue {
                    key: "server_port".to_string(),
                    reason: format!("'{port}' is not a valid port"),
                }
            })?;
        }

        Ok(())
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> Result<(), Error> {
        self.save_to(&Self::path()?)
    }

    /// Saves the current configuration to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string(&self)
            .map_err(|e| Error::ParseError(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Deletes the configuration file.
    pub fn delete() -> Result<(), Error> {
        let path = Self::path()?;
        if path.exists() {
            std::fs::remove_file(path)?;
        }

        Ok(())
    }

    /// Sets a single key/value pair in memory, ensuring the value fits the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let invalid = |reason: &str| Error::InvalidValue {
            key: key.to_string(),
            reason: format!("'{value}' {reason}"),
        };

        match key {
            "rpc_url" => self.rpc_url = value.to_string(),
            "oracle_rpc_url" => self.oracle_rpc_url = value.to_string(),
            "chain" => self.chain = value.to_lowercase(),
            "openai_api_key" => self.openai_api_key = value.to_string(),
            "openai_api_base" => self.openai_api_base = value.to_string(),
            "openai_api_version" => self.openai_api_version = value.to_string(),
            "openai_api_type" => {
                let api_type = value.to_lowercase();
                if !matches!(api_type.as_str(), "openai" | "open_ai" | "azure" | "azure_ad") {
                    return Err(invalid("is not one of openai, azure"));
                }
                self.openai_api_type = api_type;
            }
            "openai_model" => self.openai_model = value.to_string(),
            "server_host" => self.server_host = value.to_string(),
            "server_port" => {
                self.server_port = value.parse().map_err(|_| invalid("is not a valid port"))?
            }
            "price_tolerance" => {
                self.price_tolerance =
                    value.parse().map_err(|_| invalid("is not a number of seconds"))?
            }
            "oracle_max_workers" => {
                let workers: usize =
                    value.parse().map_err(|_| invalid("is not a positive integer"))?;
                if workers == 0 {
                    return Err(invalid("is not a positive integer"));
                }
                self.oracle_max_workers = workers;
            }
            _ => return Err(Error::InvalidKey(key.to_string())),
        }

        Ok(())
    }

    /// A copy safe to display, with the OpenAI api key masked down to its last four characters.
    pub fn redacted(&self) -> Self {
        Self { openai_api_key: mask_secret(&self.openai_api_key), ..self.clone() }
    }

    /// Update a single key/value pair in the configuration and write it to disk.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.set(key, value)?;
        self.save()?;

        Ok(())
    }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => String::new(),
        len if len <= 8 => "****".to_string(),
        len => format!("****{}", chars[len - 4..].iter().collect::<String>()),
    }
}

/// The `config` command is used to display and edit the current configuration.
pub fn config(args: ConfigArgs) -> Result<(), Error> {
    if !args.key.is_empty() {
        if !args.value.is_empty() {
            // only the persisted file is edited, not the environment overlay
            let mut config = Configuration::load_from(&Configuration::path()?)?;
            config.update(&args.key, &args.value)?;
            let shown = match args.key.as_str() {
                "openai_api_key" => mask_secret(&args.value),
                _ => args.value.clone(),
            };
            info!("updated configuration! Set \'{}\' = \'{}\' .", &args.key, shown);
        } else {
            // key is set, but no value is set
            error!("found key but no value to set. Please specify a value to set, use `txplain config --help` for more information.");
        }
    } else {
        // no key is set, print the config file
        println!("{:#?}", Configuration::load()?.redacted());
        info!("use `txplain config <KEY> <VALUE>` to set a key/value pair.");
    }

    Ok(())
}

/// Parse user input --rpc-url into a full url
pub fn parse_url_arg(url: &str) -> Result<String, String> {
    if mesc::is_mesc_enabled() {
        if let Ok(Some(endpoint)) = mesc::get_endpoint_by_query(url, Some("txplain")) {
            return Ok(endpoint.url);
        }
    }
    Ok(url.to_string())
}
