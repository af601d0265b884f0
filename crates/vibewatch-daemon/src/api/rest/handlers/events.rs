//! Event streaming handlers

use crate::api::rest::state::AppState;
use crate::broadcast::Broadcaster;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream, StreamExt};
use std::convert::Infallible;

/// Stream live messages via SSE
///
/// The first event is the current state; every broadcast follows. Idle
/// periods are filled with `heartbeat` comments.
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let service = &state.service;
    let (subscription, rx) = service.broadcaster().subscribe_pollable();

    let initial = Broadcaster::encode(service.state_message())
        .map_err(|e| tracing::error!(error = %e, "Failed to encode initial SSE state"))
        .ok()
        .map(|frame| Ok::<_, Infallible>(Event::default().data(&*frame)));

    // The subscription travels with the stream and unregisters when the
    // client goes away.
    let updates = stream::unfold((rx, subscription), |(mut rx, subscription)| async move {
        let frame = rx.recv().await?;
        Some((
            Ok::<_, Infallible>(Event::default().data(&*frame)),
            (rx, subscription),
        ))
    });

    Sse::new(stream::iter(initial).chain(updates)).keep_alive(
        KeepAlive::new()
            .interval(state.config.broadcast.keepalive())
            .text("heartbeat"),
    )
}
