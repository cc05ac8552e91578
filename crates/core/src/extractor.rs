use crate::traits::ResultSink;
use crate::{LogLine, ScanError};
use regex::Regex;
use scraper::Html;
use std::ops::Range;
use tracing::{error, info, warn};

pub const DEFAULT_CONTEXT_LENGTH: usize = 50;
pub const HIGHLIGHT_START: &str = "\u{1b}[33m";
pub const HIGHLIGHT_END: &str = "\u{1b}[0m";

pub trait HtmlToText {
    fn convert(&self, html: &str) -> Result<String, ScanError>;
}

/// Concatenates every text node of the fragment, like a browser's
/// `textContent`.
#[derive(Debug, Default)]
pub struct ScraperText;

impl HtmlToText for ScraperText {
    fn convert(&self, html: &str) -> Result<String, ScanError> {
        let fragment = Html::parse_fragment(html);
        Ok(fragment.root_element().text().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The keyword is used as a regular expression as written.
    #[default]
    Pattern,
    /// Regex metacharacters in the keyword are escaped first.
    Literal,
}

impl MatchMode {
    pub fn compile(self, keyword: &str) -> Result<Regex, ScanError> {
        let pattern = match self {
            MatchMode::Pattern => keyword.to_string(),
            MatchMode::Literal => regex::escape(keyword),
        };
        Ok(Regex::new(&pattern)?)
    }
}

pub struct TextExtractor {
    context_length: usize,
    mode: MatchMode,
    converter: Box<dyn HtmlToText + Send + Sync>,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_LENGTH, MatchMode::default())
    }
}

impl TextExtractor {
    pub fn new(context_length: usize, mode: MatchMode) -> Self {
        Self {
            context_length,
            mode,
            converter: Box::new(ScraperText),
        }
    }

    pub fn with_converter(mut self, converter: impl HtmlToText + Send + Sync + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// Emits one line per keyword occurrence to `sink` and the console.
    /// Failures are logged here and yield whatever was emitted before them.
    pub fn scan(
        &self,
        url: &str,
        title: &str,
        html: &str,
        keyword: &str,
        sink: &dyn ResultSink,
    ) -> Vec<LogLine> {
        let text = match self.converter.convert(html) {
            Ok(text) => text,
            Err(error) => {
                warn!(url, error = %error, "failed converting HTML to text, scanning raw markup");
                html.to_string()
            }
        };

        let mut emitted = Vec::new();
        if let Err(error) = self.emit_lines(url, title, &text, keyword, sink, &mut emitted) {
            error!(url, keyword, "extraction failed due to: {error}");
        }
        emitted
    }

    fn emit_lines(
        &self,
        url: &str,
        title: &str,
        text: &str,
        keyword: &str,
        sink: &dyn ResultSink,
        emitted: &mut Vec<LogLine>,
    ) -> Result<(), ScanError> {
        let pattern = self.mode.compile(keyword)?;

        for occurrence in find_occurrences(&pattern, text) {
            let snippet = surrounding(text, occurrence, self.context_length);
            let line = LogLine {
                keyword: keyword.to_string(),
                url: url.to_string(),
                title: title.to_string(),
                snippet: highlight(&pattern, &single_line(snippet)),
            };

            sink.record(&line)?;
            info!("{line}");
            emitted.push(line);
        }

        Ok(())
    }
}

/// Byte ranges of all non-overlapping, non-empty matches.
pub fn find_occurrences(pattern: &Regex, text: &str) -> Vec<Range<usize>> {
    pattern
        .find_iter(text)
        .filter(|found| !found.is_empty())
        .map(|found| found.range())
        .collect()
}

/// The match plus up to `context` characters either side, clamped to `text`.
pub fn surrounding(text: &str, occurrence: Range<usize>, context: usize) -> &str {
    let start = chars_back(text, occurrence.start, context);
    let end = chars_forward(text, occurrence.end, context);
    &text[start..end]
}

fn chars_back(text: &str, from: usize, count: usize) -> usize {
    if count == 0 {
        return from;
    }
    text[..from]
        .char_indices()
        .rev()
        .nth(count - 1)
        .map_or(0, |(index, _)| index)
}

fn chars_forward(text: &str, from: usize, count: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(count)
        .map_or(text.len(), |(index, _)| from + index)
}

pub fn single_line(snippet: &str) -> String {
    snippet.replace(['\r', '\n'], " ")
}

pub fn highlight(pattern: &Regex, snippet: &str) -> String {
    let mut marked = String::with_capacity(snippet.len() + 16);
    let mut cursor = 0;

    for found in find_occurrences(pattern, snippet) {
        marked.push_str(&snippet[cursor..found.start]);
        marked.push_str(HIGHLIGHT_START);
        marked.push_str(&snippet[found.clone()]);
        marked.push_str(HIGHLIGHT_END);
        cursor = found.end;
    }

    marked.push_str(&snippet[cursor..]);
    marked
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        lines: Mutex<Vec<String>>,
    }

    impl ResultSink for MemorySink {
        fn record(&self, line: &LogLine) -> Result<(), ScanError> {
            self.lines
                .lock()
                .map_err(|_| ScanError::Io(std::io::Error::other("poisoned")))?
                .push(line.to_string());
            Ok(())
        }
    }

    struct FailingConverter;

    impl HtmlToText for FailingConverter {
        fn convert(&self, _html: &str) -> Result<String, ScanError> {
            Err(ScanError::Io(std::io::Error::other("broken markup")))
        }
    }

    fn marked(text: &str) -> String {
        format!("{HIGHLIGHT_START}{text}{HIGHLIGHT_END}")
    }

    #[test]
    fn context_window_is_clamped_at_both_ends() -> Result<(), ScanError> {
        let text = "aaXaaXaa";
        let pattern = MatchMode::Literal.compile("X")?;
        let found = find_occurrences(&pattern, text);

        assert_eq!(found, vec![2..3, 5..6]);
        for occurrence in found {
            assert_eq!(surrounding(text, occurrence, 1), "aXa");
        }

        assert_eq!(surrounding("Xab", 0..1, 1), "Xa");
        assert_eq!(surrounding("abX", 2..3, 1), "bX");
        assert_eq!(surrounding("X", 0..1, 50), "X");
        Ok(())
    }

    #[test]
    fn context_counts_characters_not_bytes() {
        let text = "ääXöö";
        assert_eq!(surrounding(text, 4..5, 1), "äXö");
    }

    #[test]
    fn newlines_become_spaces_and_only_matches_are_marked() -> Result<(), ScanError> {
        let pattern = MatchMode::Literal.compile("secret")?;
        let snippet = single_line("top\nsecret\r\nhere");
        assert_eq!(snippet, "top secret  here");
        assert_eq!(
            highlight(&pattern, &snippet),
            format!("top {}  here", marked("secret"))
        );
        Ok(())
    }

    #[test]
    fn scan_emits_one_line_per_occurrence() {
        let sink = MemorySink::default();
        let extractor = TextExtractor::new(3, MatchMode::Literal);
        let lines = extractor.scan(
            "https://wiki/x",
            "Runbook",
            "<p>the secret</p><p>a secret!</p>",
            "secret",
            &sink,
        );

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].snippet, format!("he {}a s", marked("secret")));
        let recorded = sink.lines.lock().expect("sink lock");
        assert_eq!(
            recorded[1],
            format!(
                "[Keyword: secret] [URL: https://wiki/x] [Title: Runbook] [ta {}!]",
                marked("secret")
            )
        );
    }

    #[test]
    fn markup_is_not_scanned_after_conversion() {
        let sink = MemorySink::default();
        let lines = TextExtractor::default().scan(
            "u",
            "t",
            "<a href=\"/token\">link</a>",
            "token",
            &sink,
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn conversion_failure_falls_back_to_raw_html() {
        let sink = MemorySink::default();
        let extractor = TextExtractor::default().with_converter(FailingConverter);
        let lines = extractor.scan("u", "t", "<a href=\"/token\">link</a>", "token", &sink);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn keywords_are_patterns_unless_literal() {
        let sink = MemorySink::default();
        let html = "<p>pass1 pass2 pass.</p>";

        let as_pattern = TextExtractor::new(0, MatchMode::Pattern);
        assert_eq!(as_pattern.scan("u", "t", html, "pass.", &sink).len(), 3);

        let as_literal = TextExtractor::new(0, MatchMode::Literal);
        let lines = as_literal.scan("u", "t", html, "pass.", &sink);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].snippet, marked("pass."));
    }

    #[test]
    fn invalid_pattern_is_logged_not_raised() {
        let sink = MemorySink::default();
        let lines = TextExtractor::default().scan("u", "t", "<p>a(b</p>", "a(b", &sink);
        assert!(lines.is_empty());
        assert!(sink.lines.lock().expect("sink lock").is_empty());
    }
}
