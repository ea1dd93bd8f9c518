//! The main REPL implementation.
//!
//! Lines starting with `:` are commands; anything else is a scope expression
//! or an `id := expr` definition.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use scopedsl_foundation::{EntityId, EntitySet, Error, ErrorKind, Result};

use crate::editor::{self, LineEditor, ReadResult, RustylineEditor};
use crate::session::{Evaluation, Loaded, Session};

// =============================================================================
// Commands
// =============================================================================

/// What `:trace` should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceAction {
    /// Start recording.
    On,
    /// Stop recording.
    Off,
    /// Drop recorded events.
    Clear,
    /// Print the human-readable report.
    Show,
    /// Print the JSON report.
    Json,
}

/// A parsed REPL command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `:load PATH`
    Load(String),
    /// `:save PATH`
    Save(String),
    /// `:actor [ID]`
    Actor(Option<String>),
    /// `:location [ID|none]`
    Location(Option<String>),
    /// `:scopes`
    Scopes,
    /// `:trace on|off|clear|show|json`
    Trace(TraceAction),
    /// `:errors`
    Errors,
    /// `:clear` (scopes and errors)
    Clear,
    /// `:profile EXPR`
    Profile(String),
    /// `:entity ID`
    Entity(String),
    /// `:help`
    Help,
    /// `:quit`
    Quit,
}

impl Command {
    /// Parses a `:command` line.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown commands or missing arguments.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };
        let optional = (!arg.is_empty()).then(|| arg.to_string());

        match name {
            ":load" => required(name, arg).map(Self::Load),
            ":save" => required(name, arg).map(Self::Save),
            ":actor" => Ok(Self::Actor(optional)),
            ":location" => Ok(Self::Location(optional)),
            ":scopes" => Ok(Self::Scopes),
            ":trace" => match arg {
                "on" => Ok(Self::Trace(TraceAction::On)),
                "off" => Ok(Self::Trace(TraceAction::Off)),
                "clear" => Ok(Self::Trace(TraceAction::Clear)),
                "" | "show" => Ok(Self::Trace(TraceAction::Show)),
                "json" => Ok(Self::Trace(TraceAction::Json)),
                other => Err(usage(format!(
                    "unknown :trace action '{other}' (expected on, off, clear, show, json)"
                ))),
            },
            ":errors" => Ok(Self::Errors),
            ":clear" => Ok(Self::Clear),
            ":profile" => required(name, arg).map(Self::Profile),
            ":entity" => required(name, arg).map(Self::Entity),
            ":help" | ":h" | ":?" => Ok(Self::Help),
            ":quit" | ":q" | ":exit" => Ok(Self::Quit),
            other => Err(usage(format!("unknown command '{other}' (try :help)"))),
        }
    }
}

fn required(name: &str, arg: &str) -> Result<String> {
    if arg.is_empty() {
        Err(usage(format!("{name} requires an argument")))
    } else {
        Ok(arg.to_string())
    }
}

fn usage(message: String) -> Error {
    Error::new(ErrorKind::Internal(message))
}

/// What the loop should do after one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Print this text (possibly empty) and continue.
    Output(String),
    /// Leave the loop.
    Quit,
}

// =============================================================================
// REPL
// =============================================================================

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// Session state (engine, world, actor, tracer).
    session: Session,

    /// Whether to show the welcome banner.
    show_banner: bool,

    /// Primary prompt.
    prompt: String,

    /// Continuation prompt (for multi-line input).
    continuation_prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a new REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a new REPL with the given editor.
    pub fn with_editor(editor: E) -> Self {
        Self {
            editor,
            session: Session::new(),
            show_banner: true,
            prompt: "scope> ".to_string(),
            continuation_prompt: "   ... ".to_string(),
        }
    }

    /// Sets the session for this REPL.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub const fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the primary prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns a reference to the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Runs the REPL loop.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails fatally.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            self.print_banner();
        }
        self.refresh_keywords();

        loop {
            match self.read_eval_print() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => self.print_error(&e),
            }
        }

        println!("\nGoodbye!");
        Ok(())
    }

    /// Executes one read-eval-print iteration.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` to exit.
    fn read_eval_print(&mut self) -> Result<bool> {
        let Some(input) = self.read_input()? else {
            return Ok(false);
        };

        if input.trim().is_empty() {
            return Ok(true);
        }

        self.editor.add_history(&input);

        match self.eval(&input) {
            Ok(Outcome::Output(text)) => {
                if !text.is_empty() {
                    println!("{text}");
                }
            }
            Ok(Outcome::Quit) => return Ok(false),
            Err(e) => {
                self.print_error(&e);
                if self.session.config().show_errors {
                    eprint!("{}", self.session.engine().errors().format_summary());
                }
            }
        }

        self.refresh_keywords();
        Ok(true)
    }

    /// Reads a potentially multi-line input.
    fn read_input(&mut self) -> Result<Option<String>> {
        let mut input = String::new();
        let mut first_line = true;

        loop {
            let result = if first_line {
                self.editor.read_line(&self.prompt)?
            } else {
                self.editor.read_continuation(&self.continuation_prompt)?
            };

            match result {
                ReadResult::Line(line) => {
                    if !first_line {
                        input.push('\n');
                    }
                    input.push_str(&line);

                    if editor::is_complete(&input) {
                        return Ok(Some(input));
                    }

                    first_line = false;
                }
                ReadResult::Interrupted => {
                    if !first_line {
                        println!("\nInput cancelled.");
                    }
                    return Ok(Some(String::new()));
                }
                ReadResult::Eof => {
                    if first_line {
                        return Ok(None);
                    }
                    return Err(Error::new(ErrorKind::Internal(
                        "unexpected EOF in multi-line input".to_string(),
                    )));
                }
            }
        }
    }

    fn refresh_keywords(&mut self) {
        let mut keywords = editor::default_keywords();
        keywords.extend(
            self.session
                .engine()
                .scope_ids()
                .into_iter()
                .map(str::to_string),
        );
        self.editor.set_keywords(keywords);
    }

    /// Evaluates one input and returns what to print.
    ///
    /// # Errors
    ///
    /// Returns an error if the command, parse, or resolution fails.
    pub fn eval(&mut self, input: &str) -> Result<Outcome> {
        let input = input.trim();
        if input.starts_with(':') {
            let command = Command::parse(input)?;
            return self.execute(command);
        }

        let text = match self.session.eval(input)? {
            Evaluation::Defined(count) => format!("defined {count} scope(s)"),
            Evaluation::Resolved(set) => format_set(&set),
        };
        Ok(Outcome::Output(text))
    }

    /// Executes a parsed command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        let text = match command {
            Command::Load(path) => {
                let path = self.session.resolve_path(&path);
                match self.session.load_file(&path)? {
                    Loaded::Definitions(count) => format!("loaded {count} scope(s)"),
                    Loaded::World(count) => format!("loaded world with {count} entities"),
                }
            }
            Command::Save(path) => {
                let path = self.session.resolve_path(&path);
                self.session.save_world(&path)?;
                format!("saved world to {}", path.display())
            }
            Command::Actor(Some(id)) => {
                self.session.set_actor(id.as_str());
                format!("actor: {id}")
            }
            Command::Actor(None) => format!("actor: {}", self.session.actor().actor()),
            Command::Location(Some(id)) => {
                let location = (id != "none").then(|| EntityId::new(&id));
                self.session.set_location(location);
                format!("location: {id}")
            }
            Command::Location(None) => match self.session.actor().location() {
                Some(location) => format!("location: {location}"),
                None => "location: none".to_string(),
            },
            Command::Scopes => {
                let engine = self.session.engine();
                let mut out = String::new();
                for id in engine.scope_ids() {
                    if let Some(expr) = engine.scope(id) {
                        let _ = writeln!(out, "{id} := {expr}");
                    }
                }
                out.trim_end().to_string()
            }
            Command::Trace(action) => self.trace(action),
            Command::Errors => self.session.engine().errors().format_summary(),
            Command::Clear => {
                let engine = self.session.engine_mut();
                engine.clear_scopes();
                engine.errors().clear();
                "cleared scopes and errors".to_string()
            }
            Command::Profile(input) => {
                let report = self.session.profile(&input)?;
                let mut out = format_set(&report.result);
                let overhead = report.overhead;
                let _ = write!(
                    out,
                    "\nbaseline {:?}, instrumented {:?}, overhead {:.1}% over {} iteration(s)",
                    overhead.baseline, overhead.instrumented, overhead.percent, report.iterations
                );
                if !report.consistent {
                    out.push_str("\nwarning: traced and untraced results differ");
                }
                out
            }
            Command::Entity(id) => {
                let json = self.session.entity(&id)?;
                serde_json::to_string_pretty(&json)
                    .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))?
            }
            Command::Help => HELP.trim_end().to_string(),
            Command::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Output(text))
    }

    fn trace(&mut self, action: TraceAction) -> String {
        let tracer = self.session.tracer_mut();
        match action {
            TraceAction::On => {
                tracer.enable();
                "tracing on".to_string()
            }
            TraceAction::Off => {
                tracer.disable();
                "tracing off".to_string()
            }
            TraceAction::Clear => {
                tracer.clear();
                "trace cleared".to_string()
            }
            TraceAction::Show => tracer.format(),
            TraceAction::Json => tracer.format_json(),
        }
    }

    /// Loads a file (definitions or world snapshot) for CLI batch mode.
    ///
    /// The file's directory becomes the load path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn eval_file(&mut self, path: &Path) -> Result<Loaded> {
        if let Some(parent) = path.parent() {
            self.session.set_load_path(parent.to_path_buf());
        }
        self.session.load_file(path)
    }

    /// Evaluates every non-blank, non-comment line of a script.
    ///
    /// Returns the printed outputs in order.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered.
    pub fn eval_script(&mut self, path: &Path) -> Result<Vec<String>> {
        let source = fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorKind::Io(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        })?;

        let mut outputs = Vec::new();
        for line in source.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            match self.eval(line)? {
                Outcome::Output(text) => outputs.push(text),
                Outcome::Quit => break,
            }
        }
        Ok(outputs)
    }

    /// Prints an error to stderr.
    #[allow(clippy::unused_self)]
    fn print_error(&self, error: &Error) {
        eprintln!("\x1b[31mError: {error}\x1b[0m");
    }

    /// Prints the welcome banner.
    #[allow(clippy::unused_self)]
    fn print_banner(&self) {
        println!("\x1b[1;36mScopeDSL REPL v{}\x1b[0m", env!("CARGO_PKG_VERSION"));
        println!("Type a scope expression, `id := expr`, or :help. Ctrl+D exits.\n");
        let _ = io::stdout().flush();
    }
}

/// Formats a resolved set as `{a, b, c}` with its size.
#[must_use]
pub fn format_set(set: &EntitySet) -> String {
    let ids: Vec<&str> = set.iter().map(EntityId::as_str).collect();
    format!("{{{}}} ({} entities)", ids.join(", "), set.len())
}

const HELP: &str = "\
COMMANDS:
    :load PATH              Load a .scope file or a .json/.msgpack world
    :save PATH              Save the world (.json or .msgpack)
    :actor [ID]             Show or set the acting entity
    :location [ID|none]     Show, set, or clear the actor's location
    :scopes                 List registered scopes
    :trace on|off|clear     Control tracing
    :trace show|json        Print the trace report
    :errors                 Print the error summary
    :clear                  Remove all scopes and clear errors
    :profile EXPR           Measure tracing overhead for a scope or expression
    :entity ID              Print an entity as JSON
    :help                   Show this help
    :quit                   Exit

INPUT:
    id := expr              Register a scope
    expr                    Resolve an expression as the current actor
";
