use clap::{Args, Parser};
use derive_builder::Builder;
use txplain_config::parse_url_arg;

#[derive(Debug, Clone, Default, Args, Builder)]
/// Where transactions are read from and priced
///
/// Empty values are filled in from the configuration by the CLI.
pub struct ProviderArgs {
    /// The RPC provider to read transactions from.
    /// This can be an explicit URL or a reference to a MESC endpoint.
    #[clap(long, short, value_parser = parse_url_arg, default_value = "", hide_default_value = true)]
    pub rpc_url: String,

    /// The price oracle used to value balance changes in USD. Leave empty to skip pricing.
    #[clap(long = "oracle-rpc-url", value_parser = parse_url_arg, default_value = "", hide_default_value = true)]
    pub oracle_rpc_url: String,

    /// The chain the transaction lives on, e.g. `ethereum`.
    #[clap(long, default_value = "", hide_default_value = true)]
    pub chain: String,

    /// The maximum distance, in seconds, between the block time and an accepted price.
    /// Defaults to the configured `price_tolerance`.
    #[clap(long)]
    pub tolerance: Option<u64>,

    /// The maximum number of price lookups in flight. Defaults to the configured
    /// `oracle_max_workers`.
    #[clap(long = "max-workers")]
    pub max_workers: Option<usize>,
}

impl ProviderArgsBuilder {
    /// Creates a new ProviderArgsBuilder with default values
    pub fn new() -> Self {
        let defaults = ProviderArgs::default();
        Self {
            rpc_url: Some(defaults.rpc_url),
            oracle_rpc_url: Some(defaults.oracle_rpc_url),
            chain: Some(defaults.chain),
            tolerance: Some(defaults.tolerance),
            max_workers: Some(defaults.max_workers),
        }
    }
}

#[derive(Debug, Clone, Parser, Builder)]
#[clap(about = "Print the tagged form of a transaction", override_usage = "txplain tx <TXHASH> [OPTIONS]")]
/// Arguments for the tx operation
pub struct TxArgs {
    /// The transaction hash to tag.
    #[clap(required = true)]
    pub txhash: String,

    #[clap(flatten)]
    #[allow(missing_docs)]
    pub provider: ProviderArgs,
}

impl TxArgsBuilder {
    /// Creates a new TxArgsBuilder with default values
    pub fn new() -> Self {
        Self { txhash: Some(String::new()), provider: Some(ProviderArgs::default()) }
    }
}

#[derive(Debug, Clone, Parser, Builder)]
#[clap(
    about = "Simulate a call and print its tagged form",
    override_usage = "txplain simulate --from <FROM> --to <TO> [OPTIONS]"
)]
/// Arguments for the simulate operation
///
/// Amounts are given in user units: the value in ether and the gas price in gwei.
pub struct SimulateArgs {
    /// The sender.
    #[clap(long, required = true)]
    pub from: String,

    /// The recipient.
    #[clap(long, required = true)]
    pub to: String,

    /// The value sent, in ether.
    #[clap(long, default_value = "0")]
    pub value: String,

    /// The calldata.
    #[clap(long, short, default_value = "0x")]
    pub data: String,

    /// The block to simulate on top of: `latest` or a block number.
    #[clap(long, short, default_value = "latest")]
    pub block: String,

    /// The gas limit: `auto` or a number.
    #[clap(long, default_value = "auto")]
    pub gas: String,

    /// The gas price in gwei, or `auto`.
    #[clap(long = "gas-price", default_value = "auto")]
    pub gas_price: String,

    #[clap(flatten)]
    #[allow(missing_docs)]
    pub provider: ProviderArgs,
}

impl SimulateArgsBuilder {
    /// Creates a new SimulateArgsBuilder with default values
    pub fn new() -> Self {
        Self {
            from: Some(String::new()),
            to: Some(String::new()),
            value: Some("0".to_string()),
            data: Some("0x".to_string()),
            block: Some("latest".to_string()),
            gas: Some("auto".to_string()),
            gas_price: Some("auto".to_string()),
            provider: Some(ProviderArgs::default()),
        }
    }
}

#[derive(Debug, Clone, Parser, Builder)]
#[clap(
    about = "Explain a transaction in natural language",
    override_usage = "txplain explain <TXHASH> [OPTIONS]"
)]
/// Arguments for the explain operation
///
/// This struct contains the transaction to explain, where to read it from, and the chat
/// completion endpoint that writes the explanation.
pub struct ExplainArgs {
    /// The transaction hash to explain.
    #[clap(required = true)]
    pub txhash: String,

    #[clap(flatten)]
    #[allow(missing_docs)]
    pub provider: ProviderArgs,

    /// Your OpenAI (or Azure OpenAI) API key.
    #[clap(long, default_value = "", hide_default_value = true)]
    pub openai_api_key: String,

    /// The API base url. Required for Azure deployments.
    #[clap(long, default_value = "", hide_default_value = true)]
    pub openai_api_base: String,

    /// The API version, used by Azure deployments.
    #[clap(long, default_value = "", hide_default_value = true)]
    pub openai_api_version: String,

    /// The API flavor: `openai` or `azure`.
    #[clap(long, default_value = "", hide_default_value = true)]
    pub openai_api_type: String,

    /// The model, or the deployment name on Azure.
    #[clap(long, short, default_value = "", hide_default_value = true)]
    pub model: String,
}

impl ExplainArgsBuilder {
    /// Creates a new ExplainArgsBuilder with default values
    pub fn new() -> Self {
        Self {
            txhash: Some(String::new()),
            provider: Some(ProviderArgs::default()),
            openai_api_key: Some(String::new()),
            openai_api_base: Some(String::new()),
            openai_api_version: Some(String::new()),
            openai_api_type: Some(String::new()),
            model: Some(String::new()),
        }
    }
}
