use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{future::BoxFuture, FutureExt, Sink, SinkExt, StreamExt};
use tracing::{debug, error, info};
use txplain_common::ether::tagged::is_txhash;
use txplain_core::Explainer;

use super::AppState;

/// Sent when a chat session opens
pub(crate) const GREETING_MESSAGE: &str =
    "This is the transaction Explainer AI. Please input transaction hash on ethereum to start!";

/// Sent for anything that isn't a transaction hash
pub(crate) const INVALID_TXHASH_MESSAGE: &str =
    "This is not a valid transaction hash. Please try again.";

/// Sent before a transaction is looked up
pub(crate) const SEARCHING_MESSAGE: &str = "Searching transaction";

fn text(value: impl Into<String>) -> Message {
    Message::Text(value.into().into())
}

/// `GET /ws`
pub(crate) async fn chat(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| session(socket, state))
}

async fn session(mut socket: WebSocket, state: AppState) {
    debug!("chat session opened .");
    let mut handled = 0usize;

    if socket.send(text(GREETING_MESSAGE)).await.is_err() {
        return;
    }

    while let Some(message) = socket.recv().await {
        match message {
            Ok(Message::Text(input)) => {
                handled += 1;
                let explainer = Arc::clone(&state.explainer);
                if let Err(e) = answer(&mut socket, explainer, input.as_str().to_string()).await {
                    debug!("failed to answer chat message: {} .", e);
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                error!("chat session error: {}", e);
                break;
            }
        }
    }

    info!("chat session closed after {} requests .", handled);
}

/// Answers one chat message: a notice that the transaction is being looked up, then the
/// explanation as it streams in.
pub(crate) fn answer<S>(
    sink: &mut S,
    explainer: Arc<Explainer>,
    input: String,
) -> BoxFuture<'_, Result<(), S::Error>>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: Send,
{
    async move {
        let txhash = input.trim().to_string();
        if !is_txhash(&txhash) {
            return sink.send(text(INVALID_TXHASH_MESSAGE)).await;
        }

        sink.send(text(SEARCHING_MESSAGE)).await?;

        let mut stream = match explainer.explain(&txhash).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("failed to explain {}: {}", txhash, e);
                return sink.send(text(format!("Failed to explain {txhash}: {e}"))).await;
            }
        };

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => sink.send(text(chunk)).await?,
                Err(e) => {
                    error!("explanation of {} failed midway: {}", txhash, e);
                    return sink.send(text(format!("Failed to explain {txhash}: {e}"))).await;
                }
            }
        }

        Ok(())
    }
    .boxed()
}
