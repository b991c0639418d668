use std::{sync::Arc, time::Instant};

use tracing::{debug, info, warn};
use txplain_common::ether::tagged::{is_txhash, TaggedTx};
use txplain_config::Configuration;
use txplain_pricing::{fill_usd_price, PriceOracle};
use txplain_translate::{RpcTranslator, SimulationRequest, Translator};

use crate::{
    core::{
        backend::{CompletionBackend, CompletionStream, OpenAiBackend},
        prompt::{render_prompt, PromptContext},
    },
    error::Error,
};

/// Tags, prices and explains transactions.
#[derive(Clone)]
pub struct Explainer {
    translator: Arc<dyn Translator>,
    oracle: Option<PriceOracle>,
    backend: Option<Arc<dyn CompletionBackend>>,
    chain: String,
    price_tolerance: Option<u64>,
}

impl std::fmt::Debug for Explainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explainer")
            .field("oracle", &self.oracle)
            .field("has_backend", &self.backend.is_some())
            .field("chain", &self.chain)
            .field("price_tolerance", &self.price_tolerance)
            .finish_non_exhaustive()
    }
}

impl Explainer {
    /// Creates an explainer without pricing or a completion backend.
    pub fn new(translator: Arc<dyn Translator>, chain: &str) -> Self {
        Self {
            translator,
            oracle: None,
            backend: None,
            chain: chain.to_string(),
            price_tolerance: None,
        }
    }

    /// Values balance changes with `oracle`.
    pub fn with_oracle(mut self, oracle: PriceOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Explains transactions with `backend`.
    pub fn with_backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Only accepts prices at most `tolerance` seconds away from the block time. `None`
    /// accepts any price.
    pub fn with_price_tolerance(mut self, tolerance: Option<u64>) -> Self {
        self.price_tolerance = tolerance;
        self
    }

    /// Builds an explainer from a configuration. Pricing is enabled when an oracle is
    /// configured, explanations when an OpenAI api key is.
    pub fn from_config(configuration: &Configuration) -> Result<Self, Error> {
        if configuration.rpc_url.is_empty() {
            return Err(Error::InvalidArgument(
                "no rpc url configured, set rpc_url or WEB3_PROVIDER_URI".to_string(),
            ));
        }

        let translator = RpcTranslator::new(&configuration.rpc_url, &configuration.chain)?;
        let mut explainer = Explainer::new(Arc::new(translator), &configuration.chain)
            .with_price_tolerance(Some(configuration.price_tolerance));

        if !configuration.oracle_rpc_url.is_empty() {
            let oracle = PriceOracle::new(&configuration.oracle_rpc_url)?
                .with_max_workers(configuration.oracle_max_workers);
            explainer = explainer.with_oracle(oracle);
        } else {
            debug!("no price oracle configured, skipping usd valuation .");
        }

        if !configuration.openai_api_key.is_empty() {
            explainer = explainer.with_backend(Arc::new(OpenAiBackend::from_config(configuration)?));
        }

        Ok(explainer)
    }

    /// The chain transactions are read from
    pub fn chain(&self) -> &str {
        &self.chain
    }

    /// The oracle balance changes are valued with, if any
    pub fn oracle(&self) -> Option<&PriceOracle> {
        self.oracle.as_ref()
    }

    /// The maximum distance, in seconds, between the block time and an accepted price
    pub fn price_tolerance(&self) -> Option<u64> {
        self.price_tolerance
    }

    /// Tags `txhash`, valuing its balance changes in USD when an oracle is set.
    pub async fn tagged(&self, txhash: &str) -> Result<TaggedTx, Error> {
        if !is_txhash(txhash) {
            return Err(Error::InvalidTxHash(txhash.to_string()));
        }

        let mut tagged = self.translator.translate(txhash).await?;
        self.enrich(&mut tagged).await;

        Ok(tagged)
    }

    /// Simulates `request`, valuing its balance changes in USD when an oracle is set.
    pub async fn simulate(&self, request: &SimulationRequest) -> Result<TaggedTx, Error> {
        let mut tagged = self.translator.simulate(request).await?;
        self.enrich(&mut tagged).await;

        Ok(tagged)
    }

    /// Explains `txhash`, streaming the explanation back as it's written.
    pub async fn explain(&self, txhash: &str) -> Result<CompletionStream, Error> {
        let start_time = Instant::now();
        if !is_txhash(txhash) {
            return Err(Error::InvalidTxHash(txhash.to_string()));
        }
        let backend = self.backend.as_ref().ok_or_else(|| {
            Error::InvalidArgument("no completion backend configured".to_string())
        })?;

        let tagged = self.tagged(txhash).await?;
        let prompt = render_prompt(&PromptContext::from_tagged(&tagged));
        debug!("rendered prompt for {} in {:?} .", txhash, start_time.elapsed());

        let stream = backend.stream(&prompt).await?;
        info!("explaining {} .", txhash);

        Ok(stream)
    }

    /// A pricing failure leaves the transaction unpriced.
    async fn enrich(&self, tagged: &mut TaggedTx) {
        let oracle = match &self.oracle {
            Some(oracle) => oracle,
            None => return,
        };

        if let Err(e) = fill_usd_price(oracle, &self.chain, tagged, self.price_tolerance).await {
            warn!("failed to price balance changes: {} .", e);
        }
    }
}
