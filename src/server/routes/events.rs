//! Server-Sent Events stream
//!
//! Each connection gets its own hub subscription; every record becomes one
//! `data:` event. The subscription is unregistered when the response body is
//! dropped, which is how axum signals a disconnected client.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use crate::hub::Record;
use crate::server::state::AppState;

/// GET /events
pub async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.hub.subscribe();
    tracing::debug!(subscriber_id = %subscription.id(), "SSE stream opened");

    let stream = subscription
        .into_stream()
        .map(|record| Ok::<_, Infallible>(frame(&record)));

    let interval = Duration::from_secs(state.config.sse_keep_alive_secs.max(1));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(interval))
}

/// Build the event for a record
///
/// SSE cannot carry a carriage return inside a data field.
fn frame(record: &Record) -> Event {
    if record.contains('\r') {
        Event::default().data(record.replace('\r', ""))
    } else {
        Event::default().data(record.as_str())
    }
}

