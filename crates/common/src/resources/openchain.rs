//! Resolves 4-byte function selectors against the openchain signature database.

use serde::Serialize;
use tracing::trace;

use crate::{error::Error, utils::http::get_json_from_url};

/// The public openchain signature database
pub const OPENCHAIN_API_URL: &str = "https://api.openchain.xyz";

/// A text signature matching a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSignature {
    /// The function name. For example, `transfer`.
    pub name: String,
    /// The full text signature. For example, `transfer(address,uint256)`.
    pub signature: String,
}

/// Resolves a function selector using the public openchain API.
///
/// ```no_run
/// use txplain_common::resources::openchain::resolve_function_selector;
///
/// // resolve_function_selector("0xa9059cbb").await;
/// ```
pub async fn resolve_function_selector(
    selector: &str,
) -> Result<Option<Vec<ResolvedSignature>>, Error> {
    resolve_function_selector_at(OPENCHAIN_API_URL, selector).await
}

/// Resolves a function selector against an openchain compatible API at `base_url`.
///
/// Returns `None` when the database knows no signature for the selector.
pub async fn resolve_function_selector_at(
    base_url: &str,
    selector: &str,
) -> Result<Option<Vec<ResolvedSignature>>, Error> {
    let selector = selector.strip_prefix("0x").unwrap_or(selector).to_lowercase();
    trace!("resolving function selector 0x{} .", selector);

    let response = match get_json_from_url(
        &format!(
            "{}/signature-database/v1/lookup?filter=false&function=0x{}",
            base_url.trim_end_matches('/'),
            selector
        ),
        10,
    )
    .await?
    {
        Some(response) => response,
        None => return Ok(None),
    };

    let candidates = match response
        .get("result")
        .and_then(|result| result.get("function"))
        .and_then(|function| function.get(format!("0x{selector}")))
        .and_then(|item| item.as_array())
    {
        Some(candidates) => candidates,
        None => return Ok(None),
    };

    let signatures: Vec<ResolvedSignature> = candidates
        .iter()
        .filter_map(|candidate| candidate.get("name").and_then(|name| name.as_str()))
        .filter_map(|signature| {
            let (name, _) = signature.split_once('(')?;
            Some(ResolvedSignature { name: name.to_string(), signature: signature.to_string() })
        })
        .collect();

    trace!("found {} possible functions for selector 0x{} .", signatures.len(), selector);

    Ok(match signatures.is_empty() {
        true => None,
        false => Some(signatures),
    })
}
