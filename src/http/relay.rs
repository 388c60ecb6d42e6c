//! Streaming relay of upstream response bodies.
//!
//! The body is never fully buffered: upstream frames are handed to the
//! caller in chunks of at most [`RELAY_CHUNK_SIZE`] bytes.
//!
//! A read error from the upstream ends the relayed body as if the upstream
//! had finished. Status and headers are already committed by then, so the
//! caller sees a short body rather than an error. This is best-effort
//! delivery, not a reliable transfer.

use std::convert::Infallible;
use std::fmt::Display;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};

/// Upper bound on a single relayed chunk.
pub const RELAY_CHUNK_SIZE: usize = 64 * 1024;

struct RelayState<S> {
    upstream: Pin<Box<S>>,
    pending: Bytes,
    relayed: usize,
}

/// Re-chunk an upstream byte stream, stopping quietly at the first error.
pub fn relay<S, E>(upstream: S) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = RelayState {
        upstream: Box::pin(upstream),
        pending: Bytes::new(),
        relayed: 0,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if !state.pending.is_empty() {
                let take = state.pending.len().min(RELAY_CHUNK_SIZE);
                let chunk = state.pending.split_to(take);
                state.relayed += chunk.len();
                return Some((Ok(chunk), state));
            }

            match state.upstream.next().await {
                Some(Ok(bytes)) => state.pending = bytes,
                Some(Err(e)) => {
                    tracing::debug!(
                        error = %e,
                        relayed_bytes = state.relayed,
                        "Upstream body read failed, ending relay"
                    );
                    return None;
                }
                None => return None,
            }
        }
    })
}
