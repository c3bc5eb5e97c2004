use super::segment::{Segment, StreamSegmentKind};

pub const REASONING_OPEN: &str = "<think>";
pub const REASONING_CLOSE: &str = "</think>";

/// Splits streamed tokens into reasoning and narrative segments.
///
/// Markers may arrive split across tokens, so a trailing fragment that could
/// still grow into the active marker is held back until the next token (or
/// `finish`) decides it. Regions never nest: while inside reasoning only the
/// close marker is looked for.
#[derive(Debug, Default)]
pub struct TagStateMachine {
    in_reasoning: bool,
    pending: String,
}

impl TagStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_reasoning(&self) -> bool {
        self.in_reasoning
    }

    pub fn classify(&mut self, token: &str) -> Vec<Segment> {
        let mut text = std::mem::take(&mut self.pending);
        text.push_str(token);

        let mut segments = Vec::new();
        let mut rest = text.as_str();

        loop {
            let marker = self.active_marker();
            match rest.find(marker) {
                Some(idx) => {
                    push_segment(&mut segments, self.current_kind(), &rest[..idx]);
                    self.in_reasoning = !self.in_reasoning;
                    rest = &rest[idx + marker.len()..];
                }
                None => {
                    let held = partial_marker_len(rest, marker);
                    let (emit, hold) = rest.split_at(rest.len() - held);
                    push_segment(&mut segments, self.current_kind(), emit);
                    self.pending = hold.to_string();
                    break;
                }
            }
        }

        segments
    }

    /// Flushes held-back text as plain text of the current kind.
    pub fn finish(&mut self) -> Vec<Segment> {
        let pending = std::mem::take(&mut self.pending);
        let mut segments = Vec::new();
        push_segment(&mut segments, self.current_kind(), &pending);
        segments
    }

    fn active_marker(&self) -> &'static str {
        if self.in_reasoning {
            REASONING_CLOSE
        } else {
            REASONING_OPEN
        }
    }

    fn current_kind(&self) -> StreamSegmentKind {
        if self.in_reasoning {
            StreamSegmentKind::Reasoning
        } else {
            StreamSegmentKind::Narrative
        }
    }
}

fn push_segment(segments: &mut Vec<Segment>, kind: StreamSegmentKind, text: &str) {
    if text.is_empty() {
        return;
    }
    segments.push(Segment {
        kind,
        text: text.to_string(),
    });
}

/// Length of the longest suffix of `text` that is a proper prefix of `marker`.
fn partial_marker_len(text: &str, marker: &str) -> usize {
    (1..marker.len())
        .rev()
        .find(|&len| text.ends_with(&marker[..len]))
        .unwrap_or(0)
}
