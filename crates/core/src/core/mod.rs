mod backend;
mod explainer;
mod prompt;

use std::sync::Arc;

use tracing::debug;
use txplain_common::{
    constants::{DEFAULT_CHAIN, DEFAULT_PRICE_TOLERANCE},
    ether::tagged::TaggedTx,
    utils::env::get_env,
};
use txplain_pricing::{PriceOracle, DEFAULT_MAX_WORKERS};
use txplain_translate::{RpcTranslator, SimulationRequest};

use crate::{
    error::Error,
    interfaces::{ExplainArgs, ProviderArgs, SimulateArgs, TxArgs},
};

pub use backend::{CompletionBackend, CompletionStream, OpenAiBackend};
pub use explainer::Explainer;
pub use prompt::{render_prompt, PromptContext};

/// Builds an explainer without a completion backend from provider arguments.
fn explainer_from_args(args: &ProviderArgs) -> Result<Explainer, Error> {
    let rpc_url = match args.rpc_url.is_empty() {
        true => get_env("WEB3_PROVIDER_URI").ok_or_else(|| {
            Error::InvalidArgument("no rpc url given, use --rpc-url".to_string())
        })?,
        false => args.rpc_url.clone(),
    };
    let chain = match args.chain.is_empty() {
        true => DEFAULT_CHAIN,
        false => args.chain.as_str(),
    };

    let translator = RpcTranslator::new(&rpc_url, chain)?;
    let mut explainer = Explainer::new(Arc::new(translator), chain)
        .with_price_tolerance(Some(args.tolerance.unwrap_or(DEFAULT_PRICE_TOLERANCE)));

    match args.oracle_rpc_url.is_empty() {
        true => debug!("no price oracle given, skipping usd valuation ."),
        false => {
            let oracle = PriceOracle::new(&args.oracle_rpc_url)?
                .with_max_workers(args.max_workers.unwrap_or(DEFAULT_MAX_WORKERS));
            explainer = explainer.with_oracle(oracle);
        }
    }

    Ok(explainer)
}

/// Tags the transaction `args.txhash`.
pub async fn tx(args: TxArgs) -> Result<TaggedTx, Error> {
    explainer_from_args(&args.provider)?.tagged(&args.txhash).await
}

/// Simulates the call described by `args`.
pub async fn simulate(args: SimulateArgs) -> Result<TaggedTx, Error> {
    let request = SimulationRequest::from_user_units(
        &args.from,
        &args.to,
        &args.value,
        &args.data,
        &args.block,
        &args.gas,
        &args.gas_price,
    )?;

    explainer_from_args(&args.provider)?.simulate(&request).await
}

/// Explains the transaction `args.txhash`, streaming the explanation back as it's written.
pub async fn explain(args: ExplainArgs) -> Result<CompletionStream, Error> {
    let settings = backend::chat_settings(
        &args.openai_api_key,
        &args.openai_api_base,
        &args.openai_api_version,
        &args.openai_api_type,
        &args.model,
    )?;
    let backend = OpenAiBackend::new(&settings)?;

    explainer_from_args(&args.provider)?.with_backend(Arc::new(backend)).explain(&args.txhash).await
}
