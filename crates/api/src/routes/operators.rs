//! Operator push channel.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use common::OperatorId;
use futures_util::{Stream, StreamExt};
use order_store::Backend;

use crate::AppState;
use crate::error::{ApiError, parse_id};

/// GET /operators/{id}/events: live server-sent events for one operator.
///
/// The session is registered for as long as the response stream is open.
/// Events sent while no stream is open are not replayed.
#[tracing::instrument(skip(state))]
pub async fn events<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let operator_id = OperatorId::new(parse_id("id", &id)?);
    let subscription = state.hub.register(operator_id);
    tracing::info!(%operator_id, session_id = %subscription.session_id(), "operator connected");

    let stream = subscription.filter_map(|notification| async move {
        match Event::default()
            .event(&notification.event)
            .json_data(&notification.payload)
        {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::warn!(error = %e, event = %notification.event, "dropping unencodable event");
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
