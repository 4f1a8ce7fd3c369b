//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and pumps hub records to the client as
//! text messages. Inbound messages other than close are ignored.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;

use crate::hub::{BroadcastHub, Subscription};
use crate::server::state::AppState;

/// Why a WebSocket delivery loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The hub closed the queue (shutdown)
    QueueClosed,
    /// Client sent a close frame or the connection ended
    ClientClosed,
    /// Writing to the client failed
    SendFailed,
    /// Reading from the client failed
    ReceiveFailed,
}

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<BroadcastHub>) {
    let subscription = hub.subscribe();
    let subscriber_id = subscription.id();
    tracing::debug!(subscriber_id = %subscriber_id, "WebSocket connection opened");

    let (sender, receiver) = socket.split();
    let end = forward_records(subscription, sender, receiver).await;

    tracing::debug!(subscriber_id = %subscriber_id, reason = ?end, "WebSocket connection closed");
}

/// Forward records from `subscription` to `sink` until either side ends
///
/// The subscription is consumed and therefore unregistered on every exit.
pub async fn forward_records<Tx, Rx, E>(
    mut subscription: Subscription,
    mut sink: Tx,
    mut incoming: Rx,
) -> StreamEnd
where
    Tx: Sink<Message> + Unpin,
    Tx::Error: Display,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let end = loop {
        tokio::select! {
            record = subscription.recv() => match record {
                Some(record) => {
                    let text = String::from(record.as_str());
                    if sink.send(Message::Text(text)).await.is_err() {
                        break StreamEnd::SendFailed;
                    }
                }
                None => break StreamEnd::QueueClosed,
            },
            message = incoming.next() => match message {
                Some(Ok(Message::Close(_))) | None => break StreamEnd::ClientClosed,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(
                        subscriber_id = %subscription.id(),
                        error = %e,
                        "WebSocket receive error"
                    );
                    break StreamEnd::ReceiveFailed;
                }
            },
        }
    };

    if let Err(e) = sink.close().await {
        tracing::debug!(
            subscriber_id = %subscription.id(),
            error = %e,
            "WebSocket close failed"
        );
    }
    end
}
