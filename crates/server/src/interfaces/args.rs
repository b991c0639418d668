use clap::Parser;
use derive_builder::Builder;

#[derive(Debug, Clone, Parser, Builder)]
#[clap(about = "Start the txplain server", override_usage = "txplain serve [OPTIONS]")]
/// Arguments for the serve operation
///
/// Empty values are filled in from the configuration by the CLI.
pub struct ServeArgs {
    /// The address to listen on.
    #[clap(long, default_value = "", hide_default_value = true)]
    pub host: String,

    /// The port to listen on.
    #[clap(long, short)]
    pub port: Option<u16>,
}

impl ServeArgsBuilder {
    /// Creates a new ServeArgsBuilder with default values
    pub fn new() -> Self {
        Self { host: Some(String::new()), port: Some(None) }
    }
}
