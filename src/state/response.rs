use super::segment::{Segment, StreamControl};
use super::tags::TagStateMachine;
use crate::api::{ApiError, ByteStream, ChunkBuffer, StreamItem};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Raw response text, markers included.
    pub text: String,
    pub cancelled: bool,
}

/// Turns raw transport chunks into live display segments while keeping the
/// complete response text for directive extraction.
#[derive(Debug, Default)]
pub struct StreamingResponseParser {
    chunks: ChunkBuffer,
    tags: TagStateMachine,
    text: String,
    cancelled: bool,
}

impl StreamingResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the stream reported completion or the receiver cancelled.
    pub fn is_finished(&self) -> bool {
        self.cancelled || self.chunks.is_done()
    }

    pub fn feed<F>(
        &mut self,
        chunk: &[u8],
        on_segment: &mut F,
    ) -> Result<StreamControl, ApiError>
    where
        F: FnMut(&Segment) -> StreamControl,
    {
        if self.cancelled {
            return Ok(StreamControl::Cancel);
        }
        let items = self.chunks.feed(chunk);
        self.apply(items, on_segment)
    }

    /// Drains the retained chunk tail and any held-back marker fragment.
    pub fn finish<F>(mut self, on_segment: &mut F) -> Result<StreamOutcome, ApiError>
    where
        F: FnMut(&Segment) -> StreamControl,
    {
        if !self.cancelled {
            let items = self.chunks.finish();
            self.apply(items, on_segment)?;
        }
        if !self.cancelled {
            for segment in self.tags.finish() {
                if on_segment(&segment) == StreamControl::Cancel {
                    self.cancelled = true;
                    break;
                }
            }
        }

        Ok(StreamOutcome {
            text: self.text,
            cancelled: self.cancelled,
        })
    }

    /// Stops consuming; text gathered so far is kept.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Pulls `stream` until the server signals completion, the stream ends,
    /// `on_segment` cancels or `cancel` fires. Dropping the stream afterwards
    /// abandons the connection.
    pub async fn drive<F>(
        mut self,
        mut stream: ByteStream,
        cancel: &CancellationToken,
        mut on_segment: F,
    ) -> Result<StreamOutcome, ApiError>
    where
        F: FnMut(&Segment) -> StreamControl,
    {
        while !self.is_finished() {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.cancel();
                    break;
                }
                next = stream.next() => next,
            };
            match next {
                Some(chunk) => {
                    self.feed(&chunk?, &mut on_segment)?;
                }
                None => break,
            }
        }
        drop(stream);
        self.finish(&mut on_segment)
    }

    fn apply<F>(
        &mut self,
        items: Vec<StreamItem>,
        on_segment: &mut F,
    ) -> Result<StreamControl, ApiError>
    where
        F: FnMut(&Segment) -> StreamControl,
    {
        for item in items {
            match item {
                StreamItem::Token(token) => {
                    self.text.push_str(&token);
                    for segment in self.tags.classify(&token) {
                        if on_segment(&segment) == StreamControl::Cancel {
                            self.cancelled = true;
                            return Ok(StreamControl::Cancel);
                        }
                    }
                }
                StreamItem::Error(message) => return Err(ApiError::Server(message)),
                StreamItem::Done => break,
            }
        }
        Ok(StreamControl::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_client::MockApiClient;
    use crate::state::segment::StreamSegmentKind;
    use bytes::Bytes;
    use futures::stream;

    fn byte_stream(chunks: Vec<String>) -> ByteStream {
        let items: Vec<Result<Bytes, ApiError>> =
            chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
        Box::pin(stream::iter(items))
    }

    #[tokio::test]
    async fn test_drive_reconstructs_text_and_classifies_segments() {
        let chunks =
            MockApiClient::reply(&["<thi", "nk>checking</th", "ink>I will list files."]);
        let mut seen = Vec::new();

        let outcome = StreamingResponseParser::new()
            .drive(byte_stream(chunks), &CancellationToken::new(), |segment| {
                seen.push(segment.clone());
                StreamControl::Continue
            })
            .await
            .expect("stream");

        assert_eq!(outcome.text, "<think>checking</think>I will list files.");
        assert!(!outcome.cancelled);
        let joined: Vec<(StreamSegmentKind, String)> =
            seen.into_iter().map(|s| (s.kind, s.text)).collect();
        assert_eq!(
            joined,
            vec![
                (StreamSegmentKind::Reasoning, "checking".to_string()),
                (StreamSegmentKind::Narrative, "I will list files.".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_records_split_mid_json_still_reassemble() {
        let whole: String = MockApiClient::reply(&["Hello", " world"]).concat();
        let pieces: Vec<String> = whole
            .as_bytes()
            .chunks(7)
            .map(|c| String::from_utf8(c.to_vec()).unwrap())
            .collect();

        let outcome = StreamingResponseParser::new()
            .drive(byte_stream(pieces), &CancellationToken::new(), |_| {
                StreamControl::Continue
            })
            .await
            .expect("stream");
        assert_eq!(outcome.text, "Hello world");
    }

    #[tokio::test]
    async fn test_cancel_stops_consuming_and_keeps_partial_text() {
        let chunks = MockApiClient::reply(&["one ", "two ", "three"]);
        let mut calls = 0;

        let outcome = StreamingResponseParser::new()
            .drive(byte_stream(chunks), &CancellationToken::new(), |_| {
                calls += 1;
                if calls == 2 {
                    StreamControl::Cancel
                } else {
                    StreamControl::Continue
                }
            })
            .await
            .expect("stream");

        assert!(outcome.cancelled);
        assert_eq!(outcome.text, "one two ");
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_tokens_after_done_are_ignored() {
        let mut chunks = MockApiClient::reply(&["final"]);
        chunks.push(MockApiClient::record_line(" extra", false));

        let outcome = StreamingResponseParser::new()
            .drive(byte_stream(chunks), &CancellationToken::new(), |_| {
                StreamControl::Continue
            })
            .await
            .expect("stream");
        assert_eq!(outcome.text, "final");
    }

    #[tokio::test]
    async fn test_server_error_record_fails_the_turn() {
        let chunks = vec![
            MockApiClient::record_line("partial", false),
            "{\"error\":\"out of memory\"}\n".to_string(),
        ];

        let result = StreamingResponseParser::new()
            .drive(byte_stream(chunks), &CancellationToken::new(), |_| {
                StreamControl::Continue
            })
            .await;
        assert!(matches!(result, Err(ApiError::Server(message)) if message == "out of memory"));
    }

    #[tokio::test]
    async fn test_fired_token_cancels_before_any_output() {
        let chunks = MockApiClient::reply(&["never shown"]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut seen = 0;

        let outcome = StreamingResponseParser::new()
            .drive(byte_stream(chunks), &cancel, |_| {
                seen += 1;
                StreamControl::Continue
            })
            .await
            .expect("stream");

        assert!(outcome.cancelled);
        assert!(outcome.text.is_empty());
        assert_eq!(seen, 0);
    }

    #[test]
    fn test_unterminated_reasoning_flushes_on_finish() {
        let mut parser = StreamingResponseParser::new();
        let mut seen = Vec::new();
        let mut collect = |segment: &Segment| {
            seen.push(segment.clone());
            StreamControl::Continue
        };
        let line = MockApiClient::record_line("<think>never closed</th", false);
        parser.feed(line.as_bytes(), &mut collect).expect("feed");
        let outcome = parser.finish(&mut collect).expect("finish");

        assert_eq!(outcome.text, "<think>never closed</th");
        assert!(seen.iter().all(|s| s.kind == StreamSegmentKind::Reasoning));
        let shown: String = seen.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(shown, "never closed</th");
    }
}
