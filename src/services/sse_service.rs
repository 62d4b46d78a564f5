use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::sse::ServerEvent,
    error::ServiceError,
    services::{session_service, sse_events},
    state::SharedState,
};

/// Subscribe to a session's events. The returned backlog (handshake and
/// current snapshot) must be sent before anything read from the receiver.
pub async fn subscribe(
    state: &SharedState,
    quiz_id: Uuid,
) -> Result<(broadcast::Receiver<ServerEvent>, Vec<ServerEvent>), ServiceError> {
    let handle = session_service::session(state, quiz_id).await?;
    // Subscribe under the engine lock so no snapshot slips between the
    // backlog and the live stream.
    let engine = handle.engine().lock().await;
    let receiver = handle.events().subscribe();
    let backlog = [
        sse_events::handshake_event(quiz_id, state.is_degraded()),
        sse_events::snapshot_event(engine.snapshot()),
    ]
    .into_iter()
    .flatten()
    .collect();
    Ok((receiver, backlog))
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    backlog: Vec<ServerEvent>,
    quiz_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: replays the backlog, then reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        for payload in backlog {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Snapshots are self-contained; the next one catches the client up.
                            debug!(%quiz_id, skipped, "SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!(%quiz_id, "session SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}
