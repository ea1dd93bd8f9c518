//! ScopeDSL CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use scopedsl_debug::DebugConfig;
use scopedsl_engine::EngineConfig;
use scopedsl_foundation::EntityId;
use scopedsl_runtime::{Outcome, Repl, Session, logging};

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    files: Vec<PathBuf>,
    evals: Vec<String>,
    actor: Option<String>,
    location: Option<String>,
    max_depth: Option<usize>,
    batch_mode: bool,
    show_help: bool,
    show_version: bool,
    verbose: bool,
    // Debug flags
    trace: bool,
    json: bool,
    show_errors: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();
    let mut args = args.into_iter().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "-v" | "--verbose" => config.verbose = true,
            "--trace" => config.trace = true,
            "--json" => config.json = true,
            "--show-errors" => config.show_errors = true,
            "-e" | "--eval" => config.evals.push(value(&mut args, &arg)?),
            "--actor" => config.actor = Some(value(&mut args, &arg)?),
            "--location" => config.location = Some(value(&mut args, &arg)?),
            "--max-depth" => {
                let raw = value(&mut args, &arg)?;
                config.max_depth = Some(
                    raw.parse()
                        .map_err(|_| format!("invalid --max-depth value: {raw}"))?,
                );
            }
            flag if flag.starts_with('-') => {
                return Err(format!("unknown option: {flag}").into());
            }
            path => config.files.push(PathBuf::from(path)),
        }
    }

    Ok(config)
}

fn value(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    args.next()
        .ok_or_else(|| format!("{flag} requires a value").into())
}

fn build_session(config: &CliConfig) -> Session {
    let debug = DebugConfig::default()
        .with_tracing(config.trace)
        .with_json(config.json)
        .with_show_errors(config.show_errors);
    let mut engine = EngineConfig::default();
    if let Some(depth) = config.max_depth {
        engine = engine.with_max_depth(depth);
    }

    let mut session = Session::with_config(debug, engine);
    if let Some(actor) = &config.actor {
        session.set_actor(actor.as_str());
    }
    if let Some(location) = &config.location {
        session.set_location(Some(EntityId::new(location)));
    }
    session
}

fn run(args: Vec<String>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(ExitCode::SUCCESS);
    }

    if config.show_version {
        println!("scopedsl {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    logging::init(config.verbose);

    let mut repl = Repl::new()?.with_session(build_session(&config));

    for file in &config.files {
        repl.eval_file(file)?;
    }

    let mut failed = false;
    for input in &config.evals {
        match repl.eval(input) {
            Ok(Outcome::Output(text)) => println!("{text}"),
            Ok(Outcome::Quit) => break,
            Err(e) => {
                eprintln!("\x1b[31mError: {e}\x1b[0m");
                failed = true;
            }
        }
    }

    let session = repl.session();
    if config.trace && !config.evals.is_empty() {
        if config.json {
            println!("{}", session.tracer().format_json());
        } else {
            println!("{}", session.tracer().format());
        }
    }
    if failed && session.config().show_errors {
        eprint!("{}", session.engine().errors().format_summary());
    }

    // Batch mode, or one-shot evaluation, exits without a prompt
    if config.batch_mode || !config.evals.is_empty() {
        return Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS });
    }

    if !config.files.is_empty() {
        repl = repl.without_banner();
    }

    repl.run()?;
    Ok(ExitCode::SUCCESS)
}

fn print_help() {
    println!(
        "\x1b[1mScopeDSL\x1b[0m - Scope resolution over entity/component worlds

\x1b[1mUSAGE:\x1b[0m
    scopedsl [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    .scope definition files and .json/.msgpack world snapshots

\x1b[1mOPTIONS:\x1b[0m
    -h, --help           Print help information
    -V, --version        Print version information
    -b, --batch          Load files and exit (no REPL)
    -e, --eval EXPR      Evaluate an expression or definition, then exit
    --actor ID           Entity resolutions run as (default: player)
    --location ID        The actor's location
    --max-depth N        Maximum resolver nesting depth (default: 64)
    -v, --verbose        Debug logging (overridden by SCOPEDSL_LOG / RUST_LOG)

\x1b[1mDEBUG OPTIONS:\x1b[0m
    --trace              Record resolver steps and print the trace report
    --json               Print the trace report as JSON
    --show-errors        Print the error summary after failures

\x1b[1mEXAMPLES:\x1b[0m
    scopedsl                                  Start interactive REPL
    scopedsl defs.scope world.json            Load both, then start REPL
    scopedsl defs.scope world.json -e items:inventory
    scopedsl --trace -e 'entities(core:item)' world.json

\x1b[1mREPL:\x1b[0m
    id := expr           Register a scope
    expr                 Resolve an expression as the current actor
    :help                List commands
    Ctrl+D               Exit REPL
    Ctrl+C               Cancel current input"
    );
}
