use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};
use txplain_common::ether::tagged::is_txhash;
use txplain_core::txplain_translate::SimulationRequest;

use super::{chat::INVALID_TXHASH_MESSAGE, AppState};

fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({"message": message.into()}))).into_response()
}

/// `GET /tx/{txhash}`
pub(crate) async fn tagged_tx(
    State(state): State<AppState>,
    Path(txhash): Path<String>,
) -> Response {
    if !is_txhash(&txhash) {
        return message(StatusCode::BAD_REQUEST, INVALID_TXHASH_MESSAGE);
    }

    match state.explainer.tagged(&txhash).await {
        Ok(tagged) => {
            debug!("tagged {} with {} actions .", txhash, tagged.actions.len());
            Json(tagged).into_response()
        }
        Err(e) => {
            error!("failed to tag {}: {}", txhash, e);
            message(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// The query of `GET /simulate`, in user units
#[derive(Debug, Deserialize)]
pub(crate) struct SimulateQuery {
    from_address: String,
    to_address: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    block: Option<String>,
    #[serde(default)]
    gas: Option<String>,
    #[serde(default)]
    gas_price: Option<String>,
}

/// `GET /simulate`
pub(crate) async fn simulate(
    State(state): State<AppState>,
    query: Result<Query<SimulateQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return message(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let request = match SimulationRequest::from_user_units(
        &query.from_address,
        &query.to_address,
        query.value.as_deref().unwrap_or("0.0"),
        query.data.as_deref().unwrap_or("0x"),
        query.block.as_deref().unwrap_or("latest"),
        query.gas.as_deref().unwrap_or("auto"),
        query.gas_price.as_deref().unwrap_or("auto"),
    ) {
        Ok(request) => request,
        Err(e) => return message(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.explainer.simulate(&request).await {
        Ok(tagged) => Json(tagged).into_response(),
        Err(e) => {
            error!("failed to simulate call to {:#x}: {}", request.to_address, e);
            message(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
