//! The txplain command line.

pub(crate) mod error;
pub(crate) mod log_args;

use std::io::Write;

use clap::{Parser, Subcommand};
use error::Error;
use futures::StreamExt;
use log_args::LogArgs;
use tracing::info;

use txplain_config::{config, ConfigArgs, Configuration};
use txplain_core::{
    explain, simulate, tx,
    txplain_pricing::{price, PriceArgs},
    ExplainArgs, Explainer, ProviderArgs, SimulateArgs, TxArgs,
};
use txplain_server::{serve, ServeArgs};

#[derive(Debug, Parser)]
#[clap(name = "txplain", version)]
pub(crate) struct Arguments {
    #[clap(subcommand)]
    pub(crate) sub: Subcommands,

    #[clap(flatten)]
    logs: LogArgs,
}

#[derive(Debug, Subcommand)]
#[clap(
    about = "txplain explains Ethereum transactions in plain language, valuing every balance change in USD."
)]
#[allow(clippy::large_enum_variant)]
pub(crate) enum Subcommands {
    #[clap(name = "serve", about = "Start the HTTP and WebSocket server")]
    Serve(ServeArgs),

    #[clap(name = "explain", about = "Explain a transaction in natural language")]
    Explain(ExplainArgs),

    #[clap(name = "tx", about = "Print the tagged form of a transaction")]
    Tx(TxArgs),

    #[clap(name = "simulate", about = "Simulate a call and print its tagged form")]
    Simulate(SimulateArgs),

    #[clap(name = "price", about = "Look up historical token prices from the price oracle")]
    Price(PriceArgs),

    #[clap(name = "config", about = "Display and edit the current configuration")]
    Config(ConfigArgs),
}

/// Fills every empty provider argument in from the configuration.
fn fill_provider(provider: &mut ProviderArgs, configuration: &Configuration) {
    if provider.rpc_url.is_empty() {
        provider.rpc_url = configuration.rpc_url.clone();
    }
    if provider.oracle_rpc_url.is_empty() {
        provider.oracle_rpc_url = configuration.oracle_rpc_url.clone();
    }
    if provider.chain.is_empty() {
        provider.chain = configuration.chain.clone();
    }
    if provider.tolerance.is_none() {
        provider.tolerance = Some(configuration.price_tolerance);
    }
    if provider.max_workers.is_none() {
        provider.max_workers = Some(configuration.oracle_max_workers);
    }
}

/// Fills every empty completion argument in from the configuration.
fn fill_completion(cmd: &mut ExplainArgs, configuration: &Configuration) {
    if cmd.openai_api_key.is_empty() {
        cmd.openai_api_key = configuration.openai_api_key.clone();
    }
    if cmd.openai_api_base.is_empty() {
        cmd.openai_api_base = configuration.openai_api_base.clone();
    }
    if cmd.openai_api_version.is_empty() {
        cmd.openai_api_version = configuration.openai_api_version.clone();
    }
    if cmd.openai_api_type.is_empty() {
        cmd.openai_api_type = configuration.openai_api_type.clone();
    }
    if cmd.model.is_empty() {
        cmd.model = configuration.openai_model.clone();
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Arguments::parse();

    // setup logging, the file guard must outlive every command
    let _guard = args.logs.init_tracing();

    let configuration = Configuration::load()
        .map_err(|e| Error::Generic(format!("failed to load configuration: {}", e)))?;
    match args.sub {
        Subcommands::Serve(mut cmd) => {
            // flags win over the configured address
            if cmd.host.is_empty() {
                cmd.host = configuration.server_host.clone();
            }
            if cmd.port.is_none() {
                cmd.port = Some(configuration.server_port);
            }

            let explainer = Explainer::from_config(&configuration)
                .map_err(|e| Error::Generic(format!("failed to build explainer: {}", e)))?;
            serve(cmd, explainer).await?;
        }

        Subcommands::Explain(mut cmd) => {
            fill_provider(&mut cmd.provider, &configuration);
            fill_completion(&mut cmd, &configuration);

            let txhash = cmd.txhash.clone();
            let mut stream = explain(cmd)
                .await
                .map_err(|e| Error::Generic(format!("failed to explain {}: {}", txhash, e)))?;

            let mut stdout = std::io::stdout();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk
                    .map_err(|e| Error::Generic(format!("failed to explain {}: {}", txhash, e)))?;
                stdout.write_all(chunk.as_bytes())?;
                stdout.flush()?;
            }
            writeln!(stdout)?;
        }

        Subcommands::Tx(mut cmd) => {
            fill_provider(&mut cmd.provider, &configuration);

            let tagged = tx(cmd)
                .await
                .map_err(|e| Error::Generic(format!("failed to tag transaction: {}", e)))?;
            println!("{}", serde_json::to_string_pretty(&tagged)?);
        }

        Subcommands::Simulate(mut cmd) => {
            fill_provider(&mut cmd.provider, &configuration);

            let tagged = simulate(cmd)
                .await
                .map_err(|e| Error::Generic(format!("failed to simulate call: {}", e)))?;
            println!("{}", serde_json::to_string_pretty(&tagged)?);
        }

        Subcommands::Price(mut cmd) => {
            // if the user has not specified a price oracle, use the default
            if cmd.rpc_url.is_empty() {
                cmd.rpc_url = configuration.oracle_rpc_url.clone();
            }

            let prices = price(cmd)
                .await
                .map_err(|e| Error::Generic(format!("failed to fetch prices: {}", e)))?;
            info!("found {} prices .", prices.len());
            println!("{}", serde_json::to_string_pretty(&prices)?);
        }

        Subcommands::Config(cmd) => {
            config(cmd)?;
        }
    }

    Ok(())
}
