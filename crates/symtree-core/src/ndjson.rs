//! Newline-delimited JSON decoding over arbitrary chunk boundaries

use crate::{Error, Result};
use bytes::BytesMut;
use memchr::memchr;
use serde::de::DeserializeOwned;

/// One complete, non-blank line of the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number, blank lines included
    pub number: usize,
    /// Line text without the terminator
    pub text: String,
}

impl Line {
    /// Deserialize the line as a JSON record
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.text)
            .map_err(|err| Error::invalid_record(self.number, err.to_string()))
    }
}

/// Splits a byte stream into lines
///
/// Chunks may cut a line, or a multi-byte character, anywhere: bytes are
/// buffered until the terminating `\n` arrives and only then decoded.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: BytesMut,
    lines: usize,
}

impl LineDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete non-blank line, if the buffer holds one
    pub fn next_line(&mut self) -> Result<Option<Line>> {
        while let Some(pos) = memchr(b'\n', &self.buffer) {
            let raw = self.buffer.split_to(pos + 1);
            self.lines += 1;
            if let Some(line) = self.decode(&raw[..pos])? {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Take whatever is left as the final, unterminated line
    pub fn finish(&mut self) -> Result<Option<Line>> {
        if let Some(line) = self.next_line()? {
            return Ok(Some(line));
        }
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let raw = self.buffer.split();
        self.lines += 1;
        self.decode(&raw)
    }

    /// Lines consumed so far, blank lines included
    pub fn lines_read(&self) -> usize {
        self.lines
    }

    /// Bytes waiting for a line terminator
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn decode(&self, raw: &[u8]) -> Result<Option<Line>> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let text =
            std::str::from_utf8(raw).map_err(|err| Error::utf8(self.lines, err.to_string()))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Line {
            number: self.lines,
            text: text.to_owned(),
        }))
    }
}
