//! Compiler output formatting service
//!
//! Rewrites patsopt's output one line at a time through an ordered table of
//! (pattern, action) rules. Located diagnostics are rendered with a
//! highlighted excerpt of the offending source.

use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use colored::{Color, Colorize};
use itertools::Itertools;
use regex::{Captures, Regex};
use tracing::{debug, info, instrument, warn};

use crate::application::services::ExpressionService;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{highlight, DiagnosticSpan, Excerpt, Markers, Position, Severity};
use crate::infrastructure::traits::FileSystem;

static TOOL_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^patsopt: ").unwrap());
static TOOL_NOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^patsopt\((.+)\): ").unwrap());
static MANGLED_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:_2[0-9A-Za-z]+)*_2Postiats.*__(.+)").unwrap());
static TYPE_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"( +)\[(.+)\]").unwrap());
static WARNING_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^warn?ing\((.+?)\): ").unwrap());
static ERROR_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(exit|error)\((.+?)\): ").unwrap());
static DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(.+\.[ds]ats): (\d+)\(line=(\d+), offs=(\d+)\) ",
        r"-- (\d+)\(line=(\d+), offs=(\d+)\): ([a-z]+)\((.+)\): (.+)"
    ))
    .unwrap()
});

/// What a matching rule does to the line.
#[derive(Debug, Clone)]
enum LineAction {
    /// Regex replacement template; matching lines may count as a severity.
    Replace {
        template: String,
        counts_as: Option<Severity>,
    },
    /// Render the located diagnostic with its excerpt.
    Reference,
}

#[derive(Debug, Clone)]
struct LineRule {
    pattern: &'static Regex,
    action: LineAction,
}

impl LineRule {
    fn replace(pattern: &'static Regex, template: String) -> Self {
        Self {
            pattern,
            action: LineAction::Replace {
                template,
                counts_as: None,
            },
        }
    }

    fn flag(pattern: &'static Regex, template: String, severity: Severity) -> Self {
        Self {
            pattern,
            action: LineAction::Replace {
                template,
                counts_as: Some(severity),
            },
        }
    }

    fn reference(pattern: &'static Regex) -> Self {
        Self {
            pattern,
            action: LineAction::Reference,
        }
    }
}

/// Counters collected while formatting a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatSummary {
    /// Non-empty input lines
    pub lines: usize,
    /// Located diagnostics rendered
    pub diagnostics: usize,
    pub errors: usize,
    pub warnings: usize,
    /// Expressions replaced by their readable form
    pub expressions: usize,
    /// Lines emitted with less than full formatting
    pub degraded: usize,
}

impl FormatSummary {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    fn count(&mut self, severity: &Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Other(_) => {}
        }
    }
}

impl fmt::Display for FormatSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} diagnostics ({} errors, {} warnings), {} expressions, {} degraded",
            self.lines, self.diagnostics, self.errors, self.warnings, self.expressions, self.degraded
        )
    }
}

/// Parse one located diagnostic line.
///
/// Returns `None` for lines outside the diagnostic grammar and for byte or
/// line numbers too large to represent.
pub fn parse_diagnostic(line: &str) -> Option<DiagnosticSpan> {
    let caps = DIAGNOSTIC.captures(line)?;
    span_from_captures(&caps)
}

fn span_from_captures(caps: &Captures<'_>) -> Option<DiagnosticSpan> {
    let number = |i: usize| caps[i].parse::<usize>().ok();
    Some(DiagnosticSpan {
        file: PathBuf::from(&caps[1]),
        start: Position {
            byte: number(2)?,
            line: number(3)?,
            offset: number(4)?,
        },
        end: Position {
            byte: number(5)?,
            line: number(6)?,
            offset: number(7)?,
        },
        severity: caps[8].parse().unwrap_or(Severity::Other(caps[8].to_string())),
        id: caps[9].to_string(),
        description: caps[10].to_string(),
    })
}

/// Line-oriented formatter for patsopt output.
pub struct DiagnosticFormatter {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    expressions: ExpressionService,
    rules: Vec<LineRule>,
    source_root: Option<PathBuf>,
}

impl DiagnosticFormatter {
    /// Create a formatter; fails when a configured pattern does not compile.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> ApplicationResult<Self> {
        let expressions = ExpressionService::new(&settings)?;
        let mut formatter = Self {
            fs,
            settings,
            expressions,
            rules: Vec::new(),
            source_root: None,
        };
        formatter.rules = formatter.line_rules();
        Ok(formatter)
    }

    /// Resolve relative diagnostic paths against `root` instead of the
    /// working directory.
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    fn line_rules(&self) -> Vec<LineRule> {
        vec![
            LineRule::replace(&TOOL_PREFIX, String::new()),
            LineRule::replace(&TOOL_NOTE, self.paint("${1}\t", Color::BrightYellow)),
            LineRule::replace(&MANGLED_PATH, "${1}".to_string()),
            LineRule::replace(&TYPE_ANNOTATION, self.paint("${1}${2}", Color::BrightBlue)),
            LineRule::flag(
                &WARNING_PREFIX,
                self.paint("${1}\t", Color::BrightYellow),
                Severity::Warning,
            ),
            LineRule::flag(
                &ERROR_PREFIX,
                self.paint("${1}\t", Color::BrightRed),
                Severity::Error,
            ),
            LineRule::reference(&DIAGNOSTIC),
        ]
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.settings.colored {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn markers_for(&self, span: &DiagnosticSpan) -> Markers {
        if !self.settings.colored {
            Markers::plain()
        } else if span.is_multiline() {
            Markers::region()
        } else {
            Markers::token()
        }
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        match &self.source_root {
            Some(root) if file.is_relative() => root.join(file),
            _ => file.to_path_buf(),
        }
    }

    /// Format one line; empty lines are dropped.
    pub fn format_line(&self, line: &str) -> Option<String> {
        self.process_line(line, &mut FormatSummary::default())
    }

    /// Format one line and record what happened in `summary`.
    pub fn process_line(&self, line: &str, summary: &mut FormatSummary) -> Option<String> {
        if line.is_empty() {
            return None;
        }
        summary.lines += 1;

        let mut current = self.prettify_expression(line, summary);
        for rule in &self.rules {
            if !rule.pattern.is_match(&current) {
                continue;
            }
            current = match &rule.action {
                LineAction::Replace {
                    template,
                    counts_as,
                } => {
                    if let Some(severity) = counts_as {
                        summary.count(severity);
                    }
                    rule.pattern
                        .replace_all(&current, template.as_str())
                        .into_owned()
                }
                LineAction::Reference => rule
                    .pattern
                    .replace_all(&current, |caps: &Captures<'_>| {
                        match span_from_captures(caps) {
                            Some(span) => self.render(&span, summary),
                            None => {
                                summary.degraded += 1;
                                caps[0].to_string()
                            }
                        }
                    })
                    .into_owned(),
            };
        }
        Some(current)
    }

    fn prettify_expression(&self, line: &str, summary: &mut FormatSummary) -> String {
        let found = self
            .settings
            .expression_markers
            .iter()
            .filter(|marker| !marker.is_empty())
            .filter_map(|marker| line.find(marker.as_str()).map(|at| at + marker.len()))
            .min();
        let Some(notation_start) = found else {
            return line.to_string();
        };

        let notation = line[notation_start..].trim_end();
        if notation.is_empty() {
            return line.to_string();
        }

        match self.expressions.prettify(notation) {
            Ok(pretty) => {
                summary.expressions += 1;
                format!("{}{}", &line[..notation_start], pretty)
            }
            Err(e) => {
                warn!(error = %e, notation, "leaving expression unformatted");
                summary.degraded += 1;
                line.to_string()
            }
        }
    }

    /// Header, location and excerpt for one diagnostic.
    pub fn render_diagnostic(&self, span: &DiagnosticSpan) -> String {
        self.render(span, &mut FormatSummary::default())
    }

    fn render(&self, span: &DiagnosticSpan, summary: &mut FormatSummary) -> String {
        summary.diagnostics += 1;
        summary.count(&span.severity);

        let mut out = match &span.severity {
            Severity::Error => self.paint("error\t", Color::BrightRed),
            Severity::Warning => self.paint("warning\t", Color::BrightYellow),
            Severity::Other(label) => format!("{}\t", label),
        };
        out.push_str(span.trimmed_description());
        if span.has_symbolic_id() {
            out.push_str(&format!(" ({})", span.id));
        }

        let file = span.file.display().to_string();
        out.push_str(&format!("\nin {}, ", self.paint(&file, Color::BrightCyan)));
        if span.is_multiline() {
            out.push_str(&format!(
                "from lines {} to {}:",
                span.start.line, span.end.line
            ));
        } else {
            out.push_str(&format!("on line {}:", span.start.line));
        }

        match self.excerpt(span) {
            Ok(excerpt) if !excerpt.is_empty() => {
                out.push('\n');
                out.push_str(&excerpt.lines.iter().join("\n"));
            }
            Ok(_) => debug!(%file, "span beyond end of source"),
            Err(e) => {
                warn!(error = %e, "showing diagnostic without excerpt");
                summary.degraded += 1;
            }
        }
        out
    }

    /// Highlighted excerpt of the source text a diagnostic points at.
    #[instrument(level = "debug", skip(self, span), fields(file = %span.file.display()))]
    pub fn excerpt(&self, span: &DiagnosticSpan) -> ApplicationResult<Excerpt> {
        let path = self.resolve(&span.file);
        let reader = self.fs.open(&path).source_unavailable(&path)?;
        let excerpt = highlight(
            span,
            reader,
            &self.markers_for(span),
            self.settings.max_excerpt_lines,
        )
        .source_unavailable(&path)?;
        debug!(lines = excerpt.lines.len(), truncated = excerpt.truncated, "excerpt extracted");
        Ok(excerpt)
    }

    /// Format a whole stream of compiler output.
    ///
    /// Input that is not valid UTF-8 is converted lossily; only failures to
    /// read or write the streams themselves are errors.
    #[instrument(level = "debug", skip_all)]
    pub fn format_stream<R: BufRead, W: Write>(
        &self,
        mut input: R,
        mut output: W,
    ) -> ApplicationResult<FormatSummary> {
        let mut summary = FormatSummary::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = input
                .read_until(b'\n', &mut buf)
                .map_err(|e| stream_err("read compiler output", e))?;
            if read == 0 {
                break;
            }

            let text = String::from_utf8_lossy(&buf);
            let line = text.trim_end_matches(['\n', '\r']);
            if let Some(formatted) = self.process_line(line, &mut summary) {
                writeln!(output, "{}", formatted).map_err(|e| stream_err("write output", e))?;
            }
        }

        output.flush().map_err(|e| stream_err("flush output", e))?;
        info!(%summary, "formatted compiler output");
        Ok(summary)
    }
}

fn stream_err(context: &str, source: std::io::Error) -> ApplicationError {
    ApplicationError::OperationFailed {
        context: context.to_string(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::RealFileSystem;

    fn plain_formatter() -> DiagnosticFormatter {
        let settings = Settings {
            colored: false,
            ..Settings::default()
        };
        DiagnosticFormatter::new(Arc::new(RealFileSystem), Arc::new(settings)).unwrap()
    }

    #[test]
    fn given_diagnostic_line_when_parsing_then_fields_extracted() {
        let span = parse_diagnostic(
            "/tmp/a.dats: 6(line=2, offs=1) -- 9(line=2, offs=4): error(3): the constraint fails.",
        )
        .unwrap();

        assert_eq!(span.file, PathBuf::from("/tmp/a.dats"));
        assert_eq!(span.start, Position { byte: 6, line: 2, offset: 1 });
        assert_eq!(span.end.byte, 9);
        assert_eq!(span.severity, Severity::Error);
        assert_eq!(span.id, "3");
        assert_eq!(span.description, "the constraint fails.");
    }

    #[test]
    fn given_non_diagnostic_line_when_parsing_then_none() {
        assert!(parse_diagnostic("typechecking is done").is_none());
        assert!(parse_diagnostic("a.txt: 1(line=1, offs=1) -- 2(line=1, offs=2): error(3): x").is_none());
    }

    #[test]
    fn given_empty_line_when_formatting_then_dropped() {
        assert_eq!(plain_formatter().format_line(""), None);
    }

    #[test]
    fn given_unrecognized_line_when_formatting_then_unchanged() {
        let formatter = plain_formatter();
        assert_eq!(
            formatter.format_line("typechecking is done").as_deref(),
            Some("typechecking is done")
        );
    }

    #[test]
    fn given_tool_prefix_when_formatting_then_removed() {
        let formatter = plain_formatter();
        assert_eq!(
            formatter.format_line("patsopt: nothing to do").as_deref(),
            Some("nothing to do")
        );
        assert_eq!(
            formatter.format_line("patsopt(TRANS3): there are errors").as_deref(),
            Some("TRANS3\tthere are errors")
        );
    }

    #[test]
    fn given_exit_line_when_formatting_then_tab_separated_and_counted() {
        let formatter = plain_formatter();
        let mut summary = FormatSummary::default();

        let line = formatter.process_line("exit(ATS): uncaught exception", &mut summary);

        assert_eq!(line.as_deref(), Some("exit\tuncaught exception"));
        assert_eq!(summary.errors, 1);
        assert!(summary.has_errors());
    }

    #[test]
    fn given_mangled_name_when_formatting_then_prefix_stripped() {
        let formatter = plain_formatter();
        let line = formatter
            .format_line("exception: _2home_2hwxi_2research_2Postiats_2git_2src_2pats_lexing__FatalErrorExn")
            .unwrap();
        assert_eq!(line, "exception: FatalErrorExn");
    }

    #[test]
    fn given_bracketed_annotation_when_formatting_then_brackets_dropped() {
        let formatter = plain_formatter();
        assert_eq!(
            formatter.format_line("the type  [int]").as_deref(),
            Some("the type  int")
        );
    }

    #[test]
    fn given_constraint_line_when_formatting_then_expression_prettified() {
        let formatter = plain_formatter();
        let mut summary = FormatSummary::default();

        let line = formatter
            .process_line(
                "unsolved constraint: C3NSTRprop(S2Eeqeq(S2Evar(x$1(2)); S2Evar(y$3(4))))",
                &mut summary,
            )
            .unwrap();

        assert_eq!(line, "unsolved constraint: (x == y)");
        assert_eq!(summary.expressions, 1);
    }

    #[test]
    fn given_malformed_expression_when_formatting_then_left_raw() {
        let formatter = plain_formatter();
        let mut summary = FormatSummary::default();

        let line = formatter
            .process_line("The actual term is: S2Eapp()", &mut summary)
            .unwrap();

        assert_eq!(line, "The actual term is: S2Eapp()");
        assert_eq!(summary.degraded, 1);
        assert_eq!(summary.expressions, 0);
    }

    #[test]
    fn given_unknown_severity_when_formatting_then_label_kept_and_not_counted() {
        // Arrange
        let formatter = plain_formatter();
        let mut summary = FormatSummary::default();

        // Act
        let line = formatter
            .process_line(
                "/nonexistent/patsfmt/a.dats: 1(line=1, offs=1) -- 2(line=1, offs=2): note(N1): see here",
                &mut summary,
            )
            .unwrap();

        // Assert
        assert_eq!(line, "note\tsee here (N1)\nin /nonexistent/patsfmt/a.dats, on line 1:");
        assert_eq!(summary.diagnostics, 1);
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.warnings, 0);
    }

    #[test]
    fn given_nesting_beyond_parser_limit_when_formatting_then_left_raw() {
        // Arrange
        let formatter = plain_formatter();
        let mut summary = FormatSummary::default();
        let raw = format!("unsolved constraint: {}", "f(".repeat(10_000));

        // Act
        let line = formatter.process_line(&raw, &mut summary);

        // Assert
        assert_eq!(line.as_deref(), Some(raw.as_str()));
        assert_eq!(summary.degraded, 1);
        assert_eq!(summary.expressions, 0);
    }

    #[test]
    fn given_summary_when_displayed_then_lists_counts() {
        let summary = FormatSummary {
            lines: 3,
            diagnostics: 1,
            errors: 1,
            ..FormatSummary::default()
        };
        assert_eq!(
            summary.to_string(),
            "3 lines, 1 diagnostics (1 errors, 0 warnings), 0 expressions, 0 degraded"
        );
    }
}
