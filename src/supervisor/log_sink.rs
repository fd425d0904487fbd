use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

use crate::process_manager::ExitReport;

const ESC: char = '\u{1b}';

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").expect("ansi escape pattern")
});

// An escape sequence that has started but not yet reached its final byte.
static PARTIAL_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B(?:\[[0-?]*[ -/]*)?$").expect("partial escape pattern"));

/// Removes every ANSI/VT100 escape sequence and any stray escape byte.
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE
        .replace_all(text, "")
        .chars()
        .filter(|ch| *ch != ESC)
        .collect()
}

/// Turns raw output chunks into clean text. Multi-byte characters and escape
/// sequences cut by a chunk boundary are held back until the next chunk.
#[derive(Debug, Default)]
pub struct OutputDecoder {
    pending_bytes: Vec<u8>,
    pending_text: String,
}

impl OutputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending_bytes);
        bytes.extend_from_slice(chunk);

        let mut text = std::mem::take(&mut self.pending_text);
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(error) => {
                    let (valid, tail) = rest.split_at(error.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match error.error_len() {
                        Some(invalid) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[invalid..];
                        }
                        None => {
                            self.pending_bytes = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        if let Some(start) = PARTIAL_ESCAPE.find(&text).map(|found| found.start()) {
            self.pending_text = text.split_off(start);
        }
        strip_ansi(&text)
    }

    /// Whatever is still held back, decoded lossily. Used once the stream ends.
    pub fn flush(&mut self) -> String {
        let mut text = std::mem::take(&mut self.pending_text);
        text.push_str(&String::from_utf8_lossy(&std::mem::take(
            &mut self.pending_bytes,
        )));
        strip_ansi(&text)
    }
}

pub fn finished_line(report: ExitReport) -> String {
    format!(
        "process finished with exit code {}, status {}",
        report.code, report.kind
    )
}

/// Append-only line buffer behind the log view.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    // Whether the last line is still waiting for its newline.
    open_tail: bool,
    max_lines: usize,
    dropped: usize,
}

impl LogBuffer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            open_tail: false,
            max_lines: max_lines.max(1),
            dropped: 0,
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.open_tail = false;
        self.dropped = 0;
    }

    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            if self.open_tail {
                if let Some(tail) = self.lines.back_mut() {
                    tail.push_str(first);
                }
            } else if !first.is_empty() || text.contains('\n') {
                self.push_line(first.to_owned());
            }
        }
        let rest = pieces.collect::<Vec<&str>>();
        if let Some((last, middle)) = rest.split_last() {
            for line in middle {
                self.push_line((*line).to_owned());
            }
            if !last.is_empty() {
                self.push_line((*last).to_owned());
            }
        }
        self.open_tail = !text.ends_with('\n');
    }

    /// Appends a full line, closing any line still open.
    pub fn append_line(&mut self, line: &str) {
        if self.open_tail {
            self.open_tail = false;
        }
        self.push_line(line.to_owned());
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line index a following view should sit on: always the end.
    pub fn cursor(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    /// Lines discarded from the front since the last clear.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn text(&self) -> String {
        let mut out = self
            .lines
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>()
            .join("\n");
        if !self.lines.is_empty() && !self.open_tail {
            out.push('\n');
        }
        out
    }

    fn push_line(&mut self, line: String) {
        self.lines.push_back(line);
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
            self.dropped += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process_manager::ExitKind;

    #[test]
    fn strip_ansi_removes_color_and_cursor_sequences() {
        let raw = "\u{1b}[32mINFO\u{1b}[0m ready \u{1b}[2K\u{1b}[1Adone \u{1b}=x";
        let cleaned = strip_ansi(raw);
        assert_eq!(cleaned, "INFO ready done =x");
        assert!(!cleaned.contains(ESC));
    }

    #[test]
    fn strip_ansi_keeps_non_escape_characters_in_order() {
        let raw = "a\u{1b}[1;31mb\tc\u{1b}[0m\r\nd 中文";
        assert_eq!(strip_ansi(raw), "ab\tc\r\nd 中文");
    }

    #[test]
    fn strip_ansi_drops_lone_escape_bytes() {
        assert_eq!(strip_ansi("x\u{1b}y\u{1b}"), "xy");
    }

    #[test]
    fn decoder_joins_escape_sequence_split_across_chunks() {
        let mut decoder = OutputDecoder::new();
        let first = decoder.decode(b"hello \x1b[3");
        let second = decoder.decode(b"1mred\x1b[0m\n");
        assert_eq!(first, "hello ");
        assert_eq!(second, "red\n");
    }

    #[test]
    fn decoder_joins_multibyte_character_split_across_chunks() {
        let bytes = "名字".as_bytes();
        let mut decoder = OutputDecoder::new();
        let first = decoder.decode(&bytes[..2]);
        let second = decoder.decode(&bytes[2..]);
        assert_eq!(first, "");
        assert_eq!(second, "名字");
    }

    #[test]
    fn decoder_replaces_invalid_bytes() {
        let mut decoder = OutputDecoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{fffd}b");
    }

    #[test]
    fn decoder_flush_releases_held_back_text() {
        let mut decoder = OutputDecoder::new();
        assert_eq!(decoder.decode(b"tail\x1b["), "tail");
        assert_eq!(decoder.flush(), "[");
    }

    #[test]
    fn buffer_continues_open_line_across_appends() {
        let mut buffer = LogBuffer::new(100);
        buffer.append("star");
        buffer.append("ting\nlist");
        buffer.append("ening\n");
        assert_eq!(buffer.lines().collect::<Vec<&str>>(), vec!["starting", "listening"]);
        assert_eq!(buffer.text(), "starting\nlistening\n");
        assert_eq!(buffer.cursor(), 1);
    }

    #[test]
    fn buffer_keeps_blank_lines() {
        let mut buffer = LogBuffer::new(100);
        buffer.append("a\n\nb\n");
        assert_eq!(buffer.lines().collect::<Vec<&str>>(), vec!["a", "", "b"]);
    }

    #[test]
    fn append_line_closes_open_tail() {
        let mut buffer = LogBuffer::new(100);
        buffer.append("partial");
        buffer.append_line(&finished_line(ExitReport {
            code: 0,
            kind: ExitKind::Normal,
        }));
        assert_eq!(
            buffer.lines().collect::<Vec<&str>>(),
            vec![
                "partial",
                "process finished with exit code 0, status normal"
            ]
        );
    }

    #[test]
    fn buffer_drops_oldest_lines_over_cap() {
        let mut buffer = LogBuffer::new(2);
        buffer.append("1\n2\n3\n");
        assert_eq!(buffer.lines().collect::<Vec<&str>>(), vec!["2", "3"]);
        assert_eq!(buffer.dropped(), 1);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.dropped(), 0);
    }
}
