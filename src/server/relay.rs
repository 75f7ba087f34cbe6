use super::error::ApiError;
use crate::media::ByteStream;
use axum::{
    body::Body,
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        StatusCode,
    },
    response::Response,
};
use bytes::Bytes;
use futures::{future, stream, Stream, StreamExt};
use std::io;
use tracing::error;

const CONTENT_TYPE_MP4: &str = "video/mp4";

/// Turns extractor output into an attachment response.
///
/// The first chunk is awaited before any header is committed, so a failure
/// that happens before the extractor produced anything still becomes a proper
/// error response. Past that point errors can only cut the body short.
pub async fn relay(
    mut media: ByteStream,
    filename: &str,
    content_length: Option<u64>,
) -> Result<Response, ApiError> {
    let first = match media.next().await {
        Some(Ok(chunk)) => Some(chunk),
        Some(Err(e)) => return Err(ApiError::Download(e.to_string())),
        None => None,
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, CONTENT_TYPE_MP4)
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        );

    // Without a first chunk there is nothing to frame.
    let content_length = content_length.filter(|_| first.is_some());
    if let Some(length) = content_length {
        builder = builder.header(CONTENT_LENGTH, length);
    }

    let body = stream::iter(first.map(Ok::<Bytes, io::Error>)).chain(media);
    let body = end_on_first_error(body, filename.to_string(), content_length);
    builder
        .body(Body::from_stream(body))
        .map_err(|e| ApiError::Download(e.to_string()))
}

/// Forwards chunks until the first error, which is logged once and passed on
/// so the connection is cut instead of looking like a complete download.
///
/// Output running past the announced `Content-Length` counts as an error too:
/// hyper would otherwise stop at the declared length and finish the response
/// as if the file were complete.
fn end_on_first_error<S>(
    media: S,
    filename: String,
    limit: Option<u64>,
) -> impl Stream<Item = io::Result<Bytes>>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    media.scan((0u64, false), move |(relayed, failed), item| {
        if *failed {
            return future::ready(None);
        }

        let item = item.and_then(|chunk| {
            let total = *relayed + chunk.len() as u64;
            match limit {
                Some(limit) if total > limit => Err(io::Error::other(format!(
                    "yt-dlp produced more than the announced {} bytes",
                    limit
                ))),
                _ => {
                    *relayed = total;
                    Ok(chunk)
                }
            }
        });

        if let Err(e) = &item {
            *failed = true;
            error!(
                "❌ Stream error for {} after {} bytes: {}",
                filename, relayed, e
            );
        }
        future::ready(Some(item))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::{
        layer::{Context, SubscriberExt},
        Layer, Registry,
    };

    /// Counts ERROR events seen on the current thread.
    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn media(items: Vec<io::Result<&'static str>>) -> ByteStream {
        stream::iter(
            items
                .into_iter()
                .map(|item| item.map(|s| Bytes::from_static(s.as_bytes()))),
        )
        .boxed()
    }

    async fn collect_body(response: Response) -> Vec<Result<Bytes, axum::Error>> {
        response.into_body().into_data_stream().collect().await
    }

    #[tokio::test]
    async fn test_headers_and_body() {
        let response = relay(media(vec![Ok("abc"), Ok("def")]), "Clip.mp4", None)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "video/mp4");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"Clip.mp4\""
        );
        assert!(response.headers().get(CONTENT_LENGTH).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"abcdef");
    }

    #[tokio::test]
    async fn test_content_length_when_known() {
        let response = relay(media(vec![Ok("abc")]), "a.mp4", Some(3)).await.unwrap();
        assert_eq!(response.headers()[CONTENT_LENGTH], "3");
    }

    #[tokio::test]
    async fn test_error_before_first_chunk_is_an_error_response() {
        let result = relay(
            media(vec![Err(io::Error::other("yt-dlp exited with 1"))]),
            "a.mp4",
            Some(10),
        )
        .await;

        match result {
            Err(ApiError::Download(message)) => assert!(message.contains("exited")),
            other => panic!("expected download error, got {:?}", other.map(|r| r.status())),
        }
    }

    #[tokio::test]
    async fn test_mid_stream_error_truncates_body() {
        let response = relay(
            media(vec![
                Ok("abc"),
                Err(io::Error::other("connection reset")),
                Ok("never sent"),
            ]),
            "a.mp4",
            None,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let items = collect_body(response).await;
        assert_eq!(items.len(), 2);
        assert_eq!(&items[0].as_ref().unwrap()[..], b"abc");
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_empty_output() {
        let response = relay(media(vec![]), "a.mp4", Some(100)).await.unwrap();

        assert!(response.headers().get(CONTENT_LENGTH).is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_mid_stream_error_logged_once() {
        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = Registry::default().with(ErrorCounter(errors.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let response = relay(
            media(vec![
                Ok("abc"),
                Err(io::Error::other("broken pipe")),
                Err(io::Error::other("still broken")),
                Ok("late"),
            ]),
            "a.mp4",
            None,
        )
        .await
        .unwrap();

        let items = collect_body(response).await;
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_output_past_content_length_is_cut() {
        let response = relay(media(vec![Ok("abc"), Ok("defghi")]), "a.mp4", Some(6))
            .await
            .unwrap();
        assert_eq!(response.headers()[CONTENT_LENGTH], "6");

        let items = collect_body(response).await;
        assert_eq!(items.len(), 2);
        assert_eq!(&items[0].as_ref().unwrap()[..], b"abc");
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_output_matching_content_length_passes() {
        let response = relay(media(vec![Ok("abc"), Ok("def")]), "a.mp4", Some(6))
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"abcdef");
    }
}
