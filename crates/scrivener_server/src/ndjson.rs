//! Decoding of streamed generate responses.
//!
//! The server answers a streaming generate call with one JSON object per
//! line. Lines can be split across transport chunks, so bytes are buffered
//! until a newline arrives.

use crate::GenerateFrame;
use futures::{Stream, StreamExt};
use scrivener_core::Fragment;
use scrivener_error::{GenerationError, GenerationErrorKind};
use std::fmt::Display;

/// Turns a byte stream of NDJSON frames into fragments.
///
/// The stream ends after the first `done` frame, or when the body closes;
/// a trailing line without a newline becomes the final fragment. A
/// transport error, an undecodable line or an in-stream `error` frame each
/// yield one error and end the stream.
pub fn decode_fragments<S, B, E>(body: S) -> impl Stream<Item = Result<Fragment, GenerationError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    async_stream::stream! {
        let mut body = Box::pin(body);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(error = %e, "Stream interrupted");
                    yield Err(GenerationError::new(GenerationErrorKind::Stream(e.to_string())));
                    return;
                }
            };
            buffer.extend_from_slice(bytes.as_ref());

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                match decode_line(&line) {
                    Ok(None) => {}
                    Ok(Some(fragment)) => {
                        let done = fragment.is_complete;
                        yield Ok(fragment);
                        if done {
                            return;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        match decode_line(&buffer) {
            Ok(Some(fragment)) => {
                yield Ok(Fragment::last(fragment.content));
            }
            Ok(None) => {
                tracing::debug!("Body closed without a final frame");
                yield Ok(Fragment::last(""));
            }
            Err(e) => {
                yield Err(e);
            }
        }
    }
}

/// Decodes one line; blank lines decode to nothing.
fn decode_line(line: &[u8]) -> Result<Option<Fragment>, GenerationError> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let frame: GenerateFrame = serde_json::from_slice(trimmed).map_err(|e| {
        tracing::error!(error = %e, "Undecodable stream frame");
        GenerationError::new(GenerationErrorKind::Deserialization(format!(
            "Failed to parse frame: {}",
            e
        )))
    })?;
    if let Some(message) = frame.error {
        tracing::error!(%message, "Server reported an error mid-stream");
        return Err(GenerationError::new(GenerationErrorKind::Api {
            status: 200,
            message,
        }));
    }
    Ok(Some(Fragment {
        content: frame.response,
        is_complete: frame.done,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect(chunks: Vec<Result<&'static str, String>>) -> Vec<Result<Fragment, GenerationError>> {
        decode_fragments(stream::iter(chunks)).collect().await
    }

    #[tokio::test]
    async fn frames_split_across_chunks_are_reassembled() {
        let items = collect(vec![
            Ok("{\"response\":\"The \",\"done\":false}\n{\"resp"),
            Ok("onse\":\"sea\",\"done\":false}\n\n"),
            Ok("{\"response\":\"\",\"done\":true}\n"),
        ])
        .await;
        let fragments: Vec<Fragment> = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            fragments,
            vec![
                Fragment::partial("The "),
                Fragment::partial("sea"),
                Fragment::last(""),
            ]
        );
    }

    #[tokio::test]
    async fn final_frame_without_newline_is_accepted() {
        let items = collect(vec![Ok("{\"response\":\"end\",\"done\":true}")]).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), &Fragment::last("end"));
    }

    #[tokio::test]
    async fn frames_after_done_are_ignored() {
        let items = collect(vec![Ok(
            "{\"response\":\"\",\"done\":true}\n{\"response\":\"late\",\"done\":false}\n",
        )])
        .await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn error_frame_is_an_api_error() {
        let items = collect(vec![Ok("{\"error\":\"model not loaded\"}\n")]).await;
        let err = items[0].as_ref().unwrap_err();
        assert_eq!(
            err.kind,
            GenerationErrorKind::Api {
                status: 200,
                message: "model not loaded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn garbage_line_is_a_deserialization_error() {
        let items = collect(vec![Ok("not json\n")]).await;
        assert!(matches!(
            items[0].as_ref().unwrap_err().kind,
            GenerationErrorKind::Deserialization(_)
        ));
    }

    #[tokio::test]
    async fn transport_failure_ends_the_stream() {
        let items = collect(vec![
            Ok("{\"response\":\"a\",\"done\":false}\n"),
            Err("connection reset".to_string()),
            Ok("{\"response\":\"b\",\"done\":true}\n"),
        ])
        .await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(
            items[1].as_ref().unwrap_err().kind,
            GenerationErrorKind::Stream(_)
        ));
    }

    #[tokio::test]
    async fn clean_close_without_done_completes_the_stream() {
        let items = collect(vec![Ok("{\"response\":\"The sea rose.\",\"done\":false}\n")]).await;
        let fragments: Vec<Fragment> = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            fragments,
            vec![Fragment::partial("The sea rose."), Fragment::last("")]
        );
    }

    #[tokio::test]
    async fn unterminated_last_line_becomes_the_final_fragment() {
        let items = collect(vec![
            Ok("{\"response\":\"The \",\"done\":false}\n"),
            Ok("{\"response\":\"end\",\"done\":false}"),
        ])
        .await;
        let fragments: Vec<Fragment> = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(fragments, vec![Fragment::partial("The "), Fragment::last("end")]);
    }
}
