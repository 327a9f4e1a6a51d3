//! Response bodies that are either fully buffered or streamed.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::oneshot;

use crate::Error;

/// Stream of body chunks.
pub type BodyStream = BoxStream<'static, Result<Bytes, Error>>;

/// A response body.
///
/// Cached entries are always [`Body::Full`]; network responses and merged
/// responses are [`Body::Stream`].
pub enum Body {
    Full(Bytes),
    Stream(BodyStream),
}

impl Body {
    pub fn empty() -> Self {
        Body::Full(Bytes::new())
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, Error>> + Send + 'static,
    {
        Body::Stream(stream.boxed())
    }

    /// Convert into a chunk stream, regardless of representation.
    pub fn into_stream(self) -> BodyStream {
        match self {
            Body::Full(bytes) if bytes.is_empty() => stream::empty().boxed(),
            Body::Full(bytes) => stream::once(async move { Ok(bytes) }).boxed(),
            Body::Stream(stream) => stream,
        }
    }

    /// Read the whole body into memory.
    pub async fn collect(self) -> Result<Bytes, Error> {
        match self {
            Body::Full(bytes) => Ok(bytes),
            Body::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }

    /// Split the body into one that keeps flowing to the caller and a receiver
    /// that yields a full copy once the caller has read it to the end.
    ///
    /// The receiver errors if the stream fails or is dropped early.
    pub fn tee(self) -> (Body, oneshot::Receiver<Bytes>) {
        let (tx, rx) = oneshot::channel();
        match self {
            Body::Full(bytes) => {
                let _ = tx.send(bytes.clone());
                (Body::Full(bytes), rx)
            }
            Body::Stream(inner) => {
                let tee = Tee { inner, buf: BytesMut::new(), tx: Some(tx) };
                (Body::Stream(tee.boxed()), rx)
            }
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Full(bytes)
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Body::Full(Bytes::from_static(text.as_bytes()))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Full(Bytes::from(text))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Body::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

struct Tee {
    inner: BodyStream,
    buf: BytesMut,
    tx: Option<oneshot::Sender<Bytes>>,
}

impl Stream for Tee {
    type Item = Result<Bytes, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if self.tx.is_some() {
                    self.buf.extend_from_slice(&chunk);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                self.tx = None;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                if let Some(tx) = self.tx.take() {
                    let copy = self.buf.split().freeze();
                    let _ = tx.send(copy);
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&'static str]) -> Body {
        let items: Vec<Result<Bytes, Error>> = parts.iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))).collect();
        Body::from_stream(stream::iter(items))
    }

    #[tokio::test]
    async fn test_collect_stream() {
        let body = chunks(&["<p>", "hello", "</p>"]);
        assert_eq!(body.collect().await.unwrap(), Bytes::from("<p>hello</p>"));
    }

    #[tokio::test]
    async fn test_empty_full_body_yields_no_chunks() {
        let mut stream = Body::empty().into_stream();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_tee_delivers_copy_after_consumption() {
        let (body, copy) = chunks(&["a", "b", "c"]).tee();
        assert_eq!(body.collect().await.unwrap(), Bytes::from("abc"));
        assert_eq!(copy.await.unwrap(), Bytes::from("abc"));
    }

    #[tokio::test]
    async fn test_tee_abandoned_when_dropped_early() {
        let (body, copy) = chunks(&["a", "b"]).tee();
        let mut stream = body.into_stream();
        let _ = stream.next().await;
        drop(stream);
        assert!(copy.await.is_err());
    }

    #[tokio::test]
    async fn test_tee_abandoned_on_stream_error() {
        let items: Vec<Result<Bytes, Error>> =
            vec![Ok(Bytes::from_static(b"a")), Err(Error::Transport("connection reset".into()))];
        let (body, copy) = Body::from_stream(stream::iter(items)).tee();
        assert!(body.collect().await.is_err());
        assert!(copy.await.is_err());
    }
}
