//! Single-pass source excerpt extraction.
//!
//! patsopt reports spans as byte counts from the start of the file, so the
//! excerpt is built while streaming the file once from the beginning: no
//! seeking, no line index.

use std::io::{self, BufReader, Read};

use tracing::{instrument, trace};

use crate::domain::span::DiagnosticSpan;

/// Excerpts longer than this are cut.
pub const DEFAULT_MAX_LINES: usize = 10;

const INVERT: &str = "\x1b[7m";
const RESET: &str = "\x1b[0m";
const ELLIPSIS: &str = "...";

/// Strings inserted around the highlighted region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub begin: String,
    pub end: String,
}

impl Markers {
    pub fn new(begin: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
        }
    }

    /// Inverted video, for spans on a single line.
    pub fn token() -> Self {
        Self::new(INVERT, RESET)
    }

    /// Only a reset at the end, for spans over several lines.
    pub fn region() -> Self {
        Self::new("", RESET)
    }

    /// Visible ASCII markers for uncolored output.
    pub fn plain() -> Self {
        Self::new(">>", "<<")
    }
}

/// Highlighted source lines for one span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    /// Excerpt lines, including the truncation line when cut
    pub lines: Vec<String>,
    /// Whether lines beyond the maximum were dropped
    pub truncated: bool,
}

impl Excerpt {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Extract the source text covered by `span` from `reader`, with markers.
///
/// The excerpt starts with the partial line preceding the span, keeps the
/// begin marker right before the start byte and the end marker right before
/// the end byte (after it when the span is a single byte), and finishes the
/// last line for context. A reader shorter than the span yields whatever
/// was reached.
#[instrument(level = "debug", skip(span, reader, markers), fields(start = span.start.byte, end = span.end.byte))]
pub fn highlight<R: Read>(
    span: &DiagnosticSpan,
    reader: R,
    markers: &Markers,
    max_lines: usize,
) -> io::Result<Excerpt> {
    let start = span.start.byte.max(1);
    let end = span.end.byte.max(start);

    let mut bytes = BufReader::new(reader).bytes();
    let mut pending: Vec<u8> = Vec::new();
    let mut lines: Vec<Vec<u8>> = Vec::new();
    let mut position = 0usize;
    let mut closed = false;
    let mut finish_line = false;

    for byte in bytes.by_ref() {
        let byte = byte?;
        position += 1;

        if position < start {
            if byte == b'\n' {
                pending.clear();
            } else {
                pending.push(byte);
            }
            continue;
        }

        if position == start {
            let mut line = Vec::new();
            if byte != b'\n' {
                line.append(&mut pending);
                line.extend_from_slice(markers.begin.as_bytes());
                line.push(byte);
            }
            lines.push(line);

            if position == end {
                push_str(&mut lines, &markers.end);
                closed = true;
                finish_line = byte != b'\n';
                break;
            }
            continue;
        }

        if position == end {
            push_str(&mut lines, &markers.end);
            if byte != b'\n' {
                push_byte(&mut lines, byte);
            }
            closed = true;
            finish_line = byte != b'\n';
            break;
        }

        if byte == b'\n' {
            lines.push(Vec::new());
        } else {
            push_byte(&mut lines, byte);
        }
    }

    if finish_line {
        for byte in bytes {
            let byte = byte?;
            if byte == b'\n' {
                break;
            }
            push_byte(&mut lines, byte);
        }
    } else if !closed && !lines.is_empty() {
        // file ended inside the span
        push_str(&mut lines, &markers.end);
    }

    let truncated = lines.len() > max_lines;
    let mut lines: Vec<String> = lines
        .into_iter()
        .take(max_lines)
        .map(|line| String::from_utf8_lossy(&line).into_owned())
        .collect();
    if truncated {
        lines.push(format!("{}{}", markers.end, ELLIPSIS));
    }
    trace!(lines = lines.len(), truncated, "excerpt extracted");

    Ok(Excerpt { lines, truncated })
}

fn push_byte(lines: &mut [Vec<u8>], byte: u8) {
    if let Some(line) = lines.last_mut() {
        line.push(byte);
    }
}

fn push_str(lines: &mut [Vec<u8>], text: &str) {
    if let Some(line) = lines.last_mut() {
        line.extend_from_slice(text.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::span::{Position, Severity};
    use std::path::PathBuf;

    fn span(start: usize, end: usize) -> DiagnosticSpan {
        DiagnosticSpan {
            file: PathBuf::from("test.dats"),
            start: Position { byte: start, line: 1, offset: 0 },
            end: Position { byte: end, line: 1, offset: 0 },
            severity: Severity::Error,
            id: "3".to_string(),
            description: "test".to_string(),
        }
    }

    fn excerpt(source: &str, start: usize, end: usize) -> Excerpt {
        highlight(&span(start, end), source.as_bytes(), &Markers::new("[", "]"), DEFAULT_MAX_LINES)
            .unwrap()
    }

    #[test]
    fn test_span_inside_second_line() {
        // bytes: a1 b2 c3 \n4 d5 e6 f7 g8 \n9 h10
        let result = excerpt("abc\ndefg\nhij", 6, 9);
        assert_eq!(result.lines, vec!["d[efg]"]);
        assert!(!result.truncated);
    }

    #[test]
    fn test_end_marker_precedes_end_byte() {
        let result = excerpt("abc\ndefg\nhij", 6, 8);
        assert_eq!(result.lines, vec!["d[ef]g"]);
    }

    #[test]
    fn test_single_byte_span_marks_after_byte() {
        let result = excerpt("let x = 1\n", 5, 5);
        assert_eq!(result.lines, vec!["let [x] = 1"]);
    }

    #[test]
    fn test_span_starting_on_newline_drops_pending_text() {
        let result = excerpt("ab\ncd\n", 3, 5);
        assert_eq!(result.lines, vec!["c]d"]);
    }

    #[test]
    fn test_multiline_span() {
        let result = excerpt("fun f(x) =\n  x + 1\nend\n", 5, 18);
        assert_eq!(result.lines, vec!["fun [f(x) =", "  x + ]1"]);
    }

    #[test]
    fn test_file_shorter_than_span() {
        let result = excerpt("abc", 2, 40);
        assert_eq!(result.lines, vec!["a[bc]"]);
    }

    #[test]
    fn test_file_ends_before_span() {
        let result = excerpt("abc", 10, 12);
        assert!(result.is_empty());
    }

    #[test]
    fn test_long_span_is_truncated() {
        let source: String = (1..=20).map(|i| format!("line{i}\n")).collect();
        // from the first byte of line 1 to the first byte of line 16
        let end = (1..=15).map(|i| format!("line{i}\n").len()).sum::<usize>() + 1;
        let result = excerpt(&source, 1, end);
        assert!(result.truncated);
        assert_eq!(result.lines.len(), DEFAULT_MAX_LINES + 1);
        assert_eq!(result.lines[0], "[line1");
        assert_eq!(result.lines[DEFAULT_MAX_LINES], "]...");
    }

    #[test]
    fn test_span_of_exactly_max_lines_is_not_truncated() {
        let source: String = (1..=20).map(|i| format!("line{i}\n")).collect();
        let first_byte_of = |line: usize| {
            (1..line).map(|i| format!("line{i}\n").len()).sum::<usize>() + 1
        };

        let result = excerpt(&source, 1, first_byte_of(DEFAULT_MAX_LINES));
        assert!(!result.truncated);
        assert_eq!(result.lines.len(), DEFAULT_MAX_LINES);
        assert_eq!(result.lines[DEFAULT_MAX_LINES - 1], "]line10");

        let result = excerpt(&source, 1, first_byte_of(DEFAULT_MAX_LINES + 1));
        assert!(result.truncated);
        assert_eq!(result.lines.len(), DEFAULT_MAX_LINES + 1);
        assert_eq!(result.lines[DEFAULT_MAX_LINES], "]...");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let source: &[u8] = b"a\xffb";
        let result = highlight(&span(2, 3), source, &Markers::new("[", "]"), DEFAULT_MAX_LINES).unwrap();
        assert_eq!(result.lines, vec!["a[\u{fffd}]b"]);
    }
}
