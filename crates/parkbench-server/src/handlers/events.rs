//! Server-sent events bridge over the change broadcaster.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use crate::events::POLL_FALLBACK_SECS;
use crate::handlers::{authenticate, ApiError};
use crate::AppState;

/// Long-lived stream of roster-change notifications.
///
/// Delivery is best-effort; a client not subscribed at publish time misses
/// the event and relies on its periodic roster poll instead.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    authenticate(&state, &headers).await?;

    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        // A lagged receiver just skips ahead; the client's poll covers the gap.
        let event = result.ok()?;
        Event::default()
            .event("roster:changed")
            .json_data(event)
            .ok()
            .map(Ok::<_, Infallible>)
    });

    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(POLL_FALLBACK_SECS))))
}
