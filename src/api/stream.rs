use super::logging::log_dropped_record;
use crate::types::ChatRecord;

/// Longest partial record held while waiting for its newline.
pub const MAX_PENDING_RECORD: usize = 1 << 20;
const LOGGED_PREFIX: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    /// Incremental content fragment.
    Token(String),
    /// The server reported a failure inside an otherwise healthy stream.
    Error(String),
    Done,
}

/// Reassembles newline-delimited JSON records from arbitrarily split chunks.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    buffer: Vec<u8>,
    done: bool,
    /// Inside an oversized record; bytes are skipped up to its newline.
    discarding: bool,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamItem> {
        if self.done {
            return Vec::new();
        }

        let mut chunk = chunk;
        if self.discarding {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    self.discarding = false;
                    chunk = &chunk[end + 1..];
                }
                None => return Vec::new(),
            }
        }

        self.buffer.extend_from_slice(chunk);
        let mut items = Vec::new();
        let mut start = 0;

        while let Some(end) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let line_end = start + end;
            let line = trim_line(&self.buffer[start..line_end]);
            start = line_end + 1;

            if let Some(record) = parse_record(line) {
                push_record_items(record, &mut items);
                if matches!(items.last(), Some(StreamItem::Done)) {
                    self.done = true;
                    break;
                }
            }
        }

        if self.done {
            self.buffer.clear();
        } else if start > 0 {
            self.buffer.drain(..start);
        }

        if !self.done && self.buffer.len() > MAX_PENDING_RECORD {
            let logged = self.buffer.len().min(LOGGED_PREFIX);
            log_dropped_record(
                &self.buffer[..logged],
                &format!("no newline within {MAX_PENDING_RECORD} bytes"),
            );
            self.buffer.clear();
            self.discarding = true;
        }

        items
    }

    /// Consumes the retained tail at end of stream. A tail that is not a
    /// complete record is discarded.
    pub fn finish(&mut self) -> Vec<StreamItem> {
        let tail = std::mem::take(&mut self.buffer);
        if self.done {
            return Vec::new();
        }

        let mut items = Vec::new();
        if let Some(record) = parse_record(trim_line(&tail)) {
            push_record_items(record, &mut items);
        }
        if matches!(items.last(), Some(StreamItem::Done)) {
            self.done = true;
        }
        items
    }
}

fn trim_line(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn parse_record(line: &[u8]) -> Option<ChatRecord> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    match serde_json::from_slice::<ChatRecord>(line) {
        Ok(record) => Some(record),
        Err(error) => {
            log_dropped_record(line, &error);
            None
        }
    }
}

fn push_record_items(record: ChatRecord, items: &mut Vec<StreamItem>) {
    if let Some(error) = record.error.filter(|e| !e.trim().is_empty()) {
        items.push(StreamItem::Error(error));
    }
    if let Some(content) = record
        .message
        .and_then(|message| message.content)
        .filter(|content| !content.is_empty())
    {
        items.push(StreamItem::Token(content));
    }
    if record.done {
        items.push(StreamItem::Done);
    }
}
