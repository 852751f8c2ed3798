//! Server-side stream relay.
//!
//! Forwards fragments from the completion client to the requesting client as
//! self-delimited wire records. One sink send per record: each send becomes
//! one transport frame, so no buffering layer can coalesce records and defeat
//! incremental display. The relay's lifecycle is
//! `Idle -> Streaming -> {Completed | Failed}`; terminal states are final and
//! there are no retries at this layer (a retry is a fresh request).

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use zhiyuan_core::completion::FragmentReceiver;
use zhiyuan_core::stream::StreamEvent;

/// Terminal state of one relay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Upstream finished normally; the client got `end` plus the sentinel.
    Completed,
    /// The upstream failed mid-stream (client got a terminal `error` record)
    /// or the client went away.
    Failed,
}

/// Pump fragments into the sink until the upstream sequence ends.
///
/// Every fragment becomes one `chunk` record, flushed immediately. A normal
/// end emits the `end` record and the end-of-stream sentinel. An upstream
/// error emits a well-formed terminal `error` record instead, after all
/// fragments that already arrived, so the client renders a partial-failure
/// notice rather than a silently truncated answer. Closing the sink (client
/// disconnect) stops the relay and, by dropping `fragments`, cancels the
/// upstream call.
pub async fn relay(mut fragments: FragmentReceiver, sink: mpsc::Sender<Bytes>) -> RelayOutcome {
    while let Some(item) = fragments.recv().await {
        match item {
            Ok(fragment) => {
                let record = StreamEvent::Chunk { content: fragment }.encode();
                if sink.send(Bytes::from(record)).await.is_err() {
                    debug!("Client disconnected, cancelling upstream stream");
                    return RelayOutcome::Failed;
                }
            }
            Err(e) => {
                warn!(error = %e, "Upstream failed mid-stream");
                let record = StreamEvent::Error {
                    message: e.to_string(),
                }
                .encode();
                let _ = sink.send(Bytes::from(record)).await;
                return RelayOutcome::Failed;
            }
        }
    }

    let _ = sink.send(Bytes::from(StreamEvent::End.encode())).await;
    let _ = sink
        .send(Bytes::from(StreamEvent::encode_sentinel()))
        .await;
    RelayOutcome::Completed
}
