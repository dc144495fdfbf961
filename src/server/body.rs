//! Streamed response body for `/log/tail`.

use crate::extract::Frame;
use bytes::Bytes;
use futures::Stream;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::DropGuard;

/// Body stream fed by a [`ChannelTransport`](crate::extract::ChannelTransport).
///
/// Holds the request's cancellation guard: when the client goes away the body
/// is dropped and the reader is cancelled. A failure frame becomes a stream
/// error, which aborts the chunked response instead of finishing it.
pub struct TailBody {
    first: Option<Bytes>,
    frames: ReceiverStream<Frame>,
    _guard: DropGuard,
}

impl TailBody {
    /// `first` was already taken from `rx` to decide the response status
    pub fn new(first: Bytes, rx: mpsc::Receiver<Frame>, guard: DropGuard) -> Self {
        Self {
            first: Some(first),
            frames: ReceiverStream::new(rx),
            _guard: guard,
        }
    }
}

impl Stream for TailBody {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(first) = self.first.take() {
            return Poll::Ready(Some(Ok(first)));
        }

        let item = match ready!(Pin::new(&mut self.frames).poll_next(cx)) {
            Some(Frame::Data(bytes)) => Some(Ok(bytes)),
            Some(Frame::Failed(message)) => Some(Err(io::Error::other(message))),
            None => None,
        };
        Poll::Ready(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_yields_first_then_channel() {
        let (tx, rx) = mpsc::channel(4);
        let token = CancellationToken::new();
        let mut body = TailBody::new(Bytes::from_static(b"a"), rx, token.clone().drop_guard());

        tx.send(Frame::Data(Bytes::from_static(b"\nb"))).await.unwrap();
        drop(tx);

        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"a"));
        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"\nb"));
        assert!(body.next().await.is_none());
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_failure_frame_is_stream_error() {
        let (tx, rx) = mpsc::channel(4);
        let mut body = TailBody::new(
            Bytes::from_static(b"partial"),
            rx,
            CancellationToken::new().drop_guard(),
        );
        tx.send(Frame::Failed("read failed".to_string())).await.unwrap();

        assert!(body.next().await.unwrap().is_ok());
        let err = body.next().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "read failed");
    }

    #[tokio::test]
    async fn test_dropping_body_cancels_request() {
        let (_tx, rx) = mpsc::channel(4);
        let token = CancellationToken::new();
        let body = TailBody::new(Bytes::new(), rx, token.clone().drop_guard());

        drop(body);
        assert!(token.is_cancelled());
    }
}
