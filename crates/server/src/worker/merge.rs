//! Streaming response merger.
//!
//! Constituents start together and race; their bodies are emitted strictly in
//! declared order through a bounded channel. The merged response is available
//! as soon as the first constituent resolves.

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt, stream};
use http::header::{self, HeaderMap};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

use herodex_core::{Body, Error, Response};

/// Chunks buffered between the piping task and the consumer.
const CHANNEL_CAPACITY: usize = 16;

/// One constituent of a merged response.
pub type Part = BoxFuture<'static, Result<Response, Error>>;

/// A merged response and the future that resolves once every constituent body
/// has been piped into it.
pub struct Merged {
    pub response: Response,
    pub completion: BoxFuture<'static, Result<(), Error>>,
}

/// Concatenate the bodies of `parts` into one streamed response.
///
/// Status and headers come from the first constituent unless `headers` is
/// given; `Content-Length` is always dropped. If a constituent fails, its error
/// is forwarded into the body, the rest are aborted and the stream ends.
pub async fn merge(parts: Vec<Part>, headers: Option<HeaderMap>) -> Result<Merged, Error> {
    if parts.is_empty() {
        return Err(Error::Merge("nothing to merge".into()));
    }

    let mut handles: Vec<JoinHandle<Result<Response, Error>>> = parts.into_iter().map(tokio::spawn).collect();
    let rest = handles.split_off(1);
    let first = handles.remove(0);

    let first = match joined(first).await {
        Ok(response) => response,
        Err(e) => {
            for handle in &rest {
                handle.abort();
            }
            return Err(e);
        }
    };

    let Response { url, status, headers: first_headers, response_type, body } = first;
    let mut headers = headers.unwrap_or(first_headers);
    headers.remove(header::CONTENT_LENGTH);

    let (tx, mut rx) = mpsc::channel::<Result<Bytes, Error>>(CHANNEL_CAPACITY);
    let pipe = tokio::spawn(pipe(body, rest, tx));

    let completion = pipe
        .map(|result| result.unwrap_or_else(|e| Err(Error::Merge(format!("piping task failed: {e}")))))
        .boxed();

    let output = stream::poll_fn(move |cx| rx.poll_recv(cx));
    let response = Response { url, status, headers, response_type, body: Body::from_stream(output) };

    Ok(Merged { response, completion })
}

async fn joined(handle: JoinHandle<Result<Response, Error>>) -> Result<Response, Error> {
    handle
        .await
        .map_err(|e| Error::Merge(format!("constituent task failed: {e}")))?
}

async fn pipe(
    first: Body, rest: Vec<JoinHandle<Result<Response, Error>>>, tx: mpsc::Sender<Result<Bytes, Error>>,
) -> Result<(), Error> {
    let aborts: Vec<AbortHandle> = rest.iter().map(JoinHandle::abort_handle).collect();
    let result = pipe_all(first, rest, &tx).await;
    if result.is_err() {
        for abort in &aborts {
            abort.abort();
        }
    }
    result
}

async fn pipe_all(
    first: Body, rest: Vec<JoinHandle<Result<Response, Error>>>, tx: &mpsc::Sender<Result<Bytes, Error>>,
) -> Result<(), Error> {
    forward(first, tx).await?;

    for (index, handle) in rest.into_iter().enumerate() {
        let response = tokio::select! {
            joined = joined(handle) => joined,
            _ = tx.closed() => return Err(cancelled()),
        };
        match response {
            Ok(response) => forward(response.body, tx).await?,
            Err(e) => {
                let message = format!("constituent {} failed: {e}", index + 1);
                tracing::warn!(error = %e, "merge constituent failed");
                let _ = tx.send(Err(e)).await;
                return Err(Error::Merge(message));
            }
        }
    }
    Ok(())
}

async fn forward(body: Body, tx: &mpsc::Sender<Result<Bytes, Error>>) -> Result<(), Error> {
    let mut chunks = body.into_stream();
    loop {
        let chunk = tokio::select! {
            chunk = chunks.next() => chunk,
            _ = tx.closed() => return Err(cancelled()),
        };
        match chunk {
            None => return Ok(()),
            Some(Ok(bytes)) if bytes.is_empty() => {}
            Some(Ok(bytes)) => {
                if tx.send(Ok(bytes)).await.is_err() {
                    return Err(cancelled());
                }
            }
            Some(Err(e)) => {
                let message = e.to_string();
                let _ = tx.send(Err(e)).await;
                return Err(Error::Merge(message));
            }
        }
    }
}

fn cancelled() -> Error {
    Error::Cancelled("consumer dropped the merged body".into())
}
