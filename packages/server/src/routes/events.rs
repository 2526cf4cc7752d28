use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};

use crate::state::{Backend, SharedState};

/// One server-sent event per published change, named after the change. The
/// subscription ends when the client disconnects.
pub async fn stream<B: Backend>(
    State(state): State<SharedState<B>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.events.subscribe();
    tracing::debug!(listeners = state.events.subscriber_count(), "event stream opened");

    let changes = stream::unfold(subscription, |mut subscription| async move {
        let change = subscription.recv().await?;
        let event = Event::default().event(change.name()).data("");
        Some((Ok(event), subscription))
    });
    Sse::new(changes).keep_alive(KeepAlive::default())
}
