//! A single player's game
//!
//! A [`Session`] owns the parsed reference, its [`NodeIndex`] and the derived hints,
//! all computed once at start-up. Guesses go through [`Session::submit`]; the session
//! keeps the accepted ones together with their resolved highlight spans.
//!
//! Time is supplied by the host: alerts carry an expiry instant and are cleared by
//! [`Session::expire_alert`], normally from an event-loop tick.

use crate::ast::Ast;
use crate::diff::{classify, resolve, HighlightSpan, NodeIndex};
use crate::error::{SessionError, SubmitError, SyntaxError};
use crate::hints::{self, Hint, HintSettings};
use crate::parser::{parse, ParseOptions};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Per-session knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub alert_timeout: Duration,
    pub hints: HintSettings,
    pub parse: ParseOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alert_timeout: Duration::from_millis(5000),
            hints: HintSettings::default(),
            parse: ParseOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Info,
    Success,
}

/// A transient message for the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub severity: Severity,
    /// `None` for alerts that stay until replaced
    pub expires_at: Option<Instant>,
}

impl Alert {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// An accepted guess and its highlighting against the reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guess {
    pub source: String,
    pub spans: Vec<HighlightSpan>,
}

#[derive(Debug)]
pub struct Session {
    reference: Ast,
    index: NodeIndex,
    symbols: BTreeSet<String>,
    code_length: usize,
    settings: Settings,
    guesses: Vec<Guess>,
    alert: Option<Alert>,
    solved: bool,
}

impl Session {
    /// Parse the reference and precompute everything guesses are compared against
    pub fn start(reference_source: &str, settings: &Settings) -> Result<Self, SessionError> {
        let reference =
            parse(reference_source, &settings.parse).map_err(SessionError::MalformedReference)?;
        let index = NodeIndex::build(reference.root());
        let symbols = hints::extract_symbols(reference.root());
        let code_length = hints::code_length(reference_source);
        tracing::debug!(
            nodes = index.len(),
            symbols = symbols.len(),
            code_length,
            "session started"
        );

        Ok(Self {
            reference,
            index,
            symbols,
            code_length,
            settings: *settings,
            guesses: Vec::new(),
            alert: None,
            solved: false,
        })
    }

    /// Submit a guess
    ///
    /// Blank input and syntax errors are rejected without touching the guess list. A
    /// syntax error also raises an error alert that expires after the configured
    /// timeout.
    pub fn submit(&mut self, text: &str) -> Result<&Guess, SubmitError> {
        if text.trim().is_empty() {
            return Err(SubmitError::Empty);
        }

        let ast = match parse(text, &self.settings.parse) {
            Ok(ast) => ast,
            Err(error) => {
                tracing::debug!(%error, "guess rejected");
                let error = SubmitError::from(error);
                self.raise(error.to_string(), Severity::Error, Some(self.settings.alert_timeout));
                return Err(error);
            }
        };

        let spans = self.spans_for(&ast);
        let matches_reference = ast.root() == self.reference.root();
        tracing::debug!(
            guess = self.guesses.len() + 1,
            spans = spans.len(),
            matches_reference,
            "guess accepted"
        );

        if matches_reference && !self.solved {
            self.solved = true;
            let message = format!("Solved in {} guesses!", self.guesses.len() + 1);
            self.raise(message, Severity::Success, None);
        }

        self.guesses.push(Guess {
            source: text.to_string(),
            spans,
        });
        Ok(&self.guesses[self.guesses.len() - 1])
    }

    /// Highlight `text` against the reference without recording it
    pub fn render_guess(&self, text: &str) -> Result<Vec<HighlightSpan>, SyntaxError> {
        let ast = parse(text, &self.settings.parse)?;
        Ok(self.spans_for(&ast))
    }

    fn spans_for(&self, ast: &Ast) -> Vec<HighlightSpan> {
        let highlights = classify(ast.root(), &self.index);
        resolve(ast.source(), &highlights)
    }

    fn raise(&mut self, message: String, severity: Severity, timeout: Option<Duration>) {
        self.alert = Some(Alert {
            message,
            severity,
            expires_at: timeout.map(|timeout| Instant::now() + timeout),
        });
    }

    /// Show an informational alert for the configured timeout
    pub fn notify(&mut self, message: impl Into<String>) {
        self.raise(message.into(), Severity::Info, Some(self.settings.alert_timeout));
    }

    /// Clear the current alert if it has expired by `now`. Returns whether it was cleared.
    pub fn expire_alert(&mut self, now: Instant) -> bool {
        if self.alert.as_ref().is_some_and(|alert| alert.is_expired(now)) {
            self.alert = None;
            return true;
        }
        false
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn guesses(&self) -> &[Guess] {
        &self.guesses
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn reference(&self) -> &Ast {
        &self.reference
    }

    pub fn index(&self) -> &NodeIndex {
        &self.index
    }

    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    pub fn hints(&self) -> HintSettings {
        self.settings.hints
    }

    /// Flip a hint toggle, returning whether the hint is now shown
    pub fn toggle_hint(&mut self, hint: Hint) -> bool {
        self.settings.hints.toggle(hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::MatchLabel;

    const FIBONACCI: &str = "def fibo(n)\n  if n <= 2\n    1\n  else\n    fibo(n - 1) + fibo(n - 2)\n  end\nend\n\nfibo 10\n";

    fn session() -> Session {
        Session::start(FIBONACCI, &Settings::default()).expect("reference to parse")
    }

    #[test]
    fn test_start_precomputes_hints() {
        let session = session();
        assert_eq!(session.code_length(), FIBONACCI.chars().count());
        assert!(session.symbols().contains("fibo"));
        assert!(!session.is_solved());
        assert!(session.guesses().is_empty());
    }

    #[test]
    fn test_malformed_reference_aborts_start() {
        let err = Session::start("def fibo(n", &Settings::default()).unwrap_err();
        assert!(matches!(err, SessionError::MalformedReference(_)));
    }

    #[test]
    fn test_submit_records_guess() {
        let mut session = session();
        let guess = session.submit("fibo 10").expect("guess to be accepted");
        assert_eq!(guess.source, "fibo 10");
        assert_eq!(guess.spans, vec![HighlightSpan::labeled(0, 7, MatchLabel::Weak)]);
        assert_eq!(session.guesses().len(), 1);
        assert!(session.alert().is_none());
    }

    #[test]
    fn test_syntax_error_leaves_guesses_untouched() {
        let mut session = session();
        let err = session.submit("fibo(").unwrap_err();
        assert!(matches!(err, SubmitError::Syntax(_)));
        assert!(session.guesses().is_empty());

        let alert = session.alert().expect("error alert");
        assert_eq!(alert.severity, Severity::Error);
        assert!(alert.message.starts_with("SyntaxError: "));
        assert!(alert.expires_at.is_some());
    }

    #[test]
    fn test_blank_submission_is_rejected() {
        let mut session = session();
        assert_eq!(session.submit("  \n").unwrap_err(), SubmitError::Empty);
        assert!(session.guesses().is_empty());
        assert!(session.alert().is_none());
    }

    #[test]
    fn test_alert_expires_after_timeout() {
        let settings = Settings {
            alert_timeout: Duration::from_millis(100),
            ..Settings::default()
        };
        let mut session = Session::start(FIBONACCI, &settings).expect("reference to parse");
        session.submit("1 +").unwrap_err();

        let raised = session.alert().and_then(|alert| alert.expires_at).expect("deadline");
        assert!(!session.expire_alert(raised - Duration::from_millis(1)));
        assert!(session.alert().is_some());
        assert!(session.expire_alert(raised));
        assert!(session.alert().is_none());
    }

    #[test]
    fn test_exact_guess_solves() {
        let mut session = session();
        session.submit("fibo 10").expect("accepted");
        let guess = session.submit(FIBONACCI).expect("accepted");
        assert!(guess
            .spans
            .iter()
            .all(|span| span.label == Some(MatchLabel::Strong) || span.text(FIBONACCI).trim().is_empty()));
        assert!(session.is_solved());

        let alert = session.alert().expect("success alert");
        assert_eq!(alert.severity, Severity::Success);
        assert_eq!(alert.message, "Solved in 2 guesses!");
        assert!(!session.expire_alert(Instant::now() + Duration::from_secs(3600)));
    }

    #[test]
    fn test_render_guess_does_not_record() {
        let session = session();
        let spans = session.render_guess("puts fibo 10").expect("guess to parse");
        assert_eq!(
            spans,
            vec![
                HighlightSpan::plain(0, 5),
                HighlightSpan::labeled(5, 12, MatchLabel::Weak)
            ]
        );
        assert!(session.guesses().is_empty());
    }

    #[test]
    fn test_toggle_hint() {
        let mut session = session();
        assert!(!session.toggle_hint(Hint::CodeLength));
        assert!(!session.hints().code_length);
        assert!(session.hints().symbols);
    }
}
