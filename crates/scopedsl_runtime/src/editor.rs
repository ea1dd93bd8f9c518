//! Line input for the scope REPL.
//!
//! The REPL talks to a [`LineEditor`] so tests can script input; the
//! interactive binary uses rustyline.

use std::borrow::Cow;

use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Completer, Config, Context, Editor, Helper, Hinter, Validator as RLValidator};
use scopedsl_foundation::{Error, ErrorKind, Result};

/// What one read from the terminal produced.
#[derive(Debug)]
pub enum ReadResult {
    /// A complete line.
    Line(String),
    /// User pressed Ctrl+C.
    Interrupted,
    /// User pressed Ctrl+D (EOF).
    Eof,
}

/// Source of REPL input lines.
pub trait LineEditor {
    /// Reads one line after printing `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Reads the next line of an unbalanced expression.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the terminal fails.
    fn read_continuation(&mut self, prompt: &str) -> Result<ReadResult> {
        self.read_line(prompt)
    }

    /// Add a line to history.
    fn add_history(&mut self, line: &str);

    /// Set completion candidates (commands and registered scope ids).
    fn set_keywords(&mut self, keywords: Vec<String>);
}

/// REPL commands offered for completion.
pub const COMMANDS: [&str; 12] = [
    ":load",
    ":save",
    ":actor",
    ":location",
    ":scopes",
    ":trace",
    ":errors",
    ":profile",
    ":entity",
    ":help",
    ":quit",
    ":clear",
];

/// Built-in sources offered for completion.
pub const SOURCES: [&str; 5] = ["actor", "location", "self", "none", "entities("];

/// Returns the default completion candidates.
#[must_use]
pub fn default_keywords() -> Vec<String> {
    COMMANDS
        .iter()
        .chain(SOURCES.iter())
        .map(|s| (*s).to_string())
        .collect()
}

/// Returns true if brackets and strings in `input` are balanced.
///
/// Unbalanced input continues on the next line.
#[must_use]
pub fn is_complete(input: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '(' | '[' | '{' if !in_string => depth += 1,
            ')' | ']' | '}' if !in_string => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && !in_string
}

/// Helper for rustyline that provides completion, hints, and validation.
#[derive(Helper, Completer, Hinter, RLValidator)]
struct ScopeHelper {
    #[rustyline(Completer)]
    completer: ScopeCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    #[rustyline(Validator)]
    validator: BracketValidator,
}

impl Highlighter for ScopeHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;32m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        false
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }
}

/// Completes commands, sources, scope ids, and (after `:load`/`:save`) paths.
struct ScopeCompleter {
    file_completer: FilenameCompleter,
    keywords: Vec<String>,
}

impl ScopeCompleter {
    fn new() -> Self {
        Self {
            file_completer: FilenameCompleter::new(),
            keywords: default_keywords(),
        }
    }
}

impl Completer for ScopeCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let head = &line[..pos];
        if head.starts_with(":load ") || head.starts_with(":save ") {
            return self.file_completer.complete(line, pos, ctx);
        }

        let start = head
            .rfind(|c: char| c.is_whitespace() || "()[]{}+|.".contains(c))
            .map_or(0, |i| i + 1);
        let word = &line[start..pos];

        let candidates = self
            .keywords
            .iter()
            .filter(|kw| kw.starts_with(word))
            .map(|kw| Pair {
                display: kw.clone(),
                replacement: kw.clone(),
            })
            .collect();

        Ok((start, candidates))
    }
}

/// Keeps reading while brackets or strings are open.
#[derive(Default)]
struct BracketValidator;

impl Validator for BracketValidator {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        if is_complete(ctx.input()) {
            return Ok(ValidationResult::Valid(None));
        }
        Ok(ValidationResult::Incomplete)
    }
}

/// Terminal input backed by rustyline, with history and completion.
pub struct RustylineEditor {
    editor: Editor<ScopeHelper, DefaultHistory>,
}

impl RustylineEditor {
    /// Creates the editor with scope completion installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be set up.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .max_history_size(1000)
            .map_err(internal)?
            .build();

        let helper = ScopeHelper {
            completer: ScopeCompleter::new(),
            hinter: HistoryHinter::new(),
            validator: BracketValidator,
        };

        let mut editor = Editor::with_config(config).map_err(internal)?;
        editor.set_helper(Some(helper));

        Ok(Self { editor })
    }
}

fn internal(err: ReadlineError) -> Error {
    Error::new(ErrorKind::Internal(err.to_string()))
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadResult::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
            Err(e) => Err(internal(e)),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }

    fn set_keywords(&mut self, keywords: Vec<String>) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.completer.keywords = keywords;
        }
    }
}
