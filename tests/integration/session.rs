//! Runtime tests
//!
//! Drives [`Session`] and [`Repl`] with files on disk, as the CLI does.

use std::fs;
use std::path::PathBuf;

use scopedsl_debug::DebugConfig;
use scopedsl_engine::EngineConfig;
use scopedsl_foundation::{EntityId, ErrorCategory, Result};
use scopedsl_runtime::{
    Evaluation, LineEditor, Loaded, Outcome, ReadResult, Repl, Session, load_from_file,
    save_to_file,
};
use scopedsl_storage::World;
use serde_json::{Value, json};

/// A scratch directory removed on drop.
struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "scopedsl_integration_{}_{name}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.0.join(name);
        fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Feeds fixed lines to the REPL.
struct ScriptedEditor {
    lines: std::vec::IntoIter<String>,
}

impl ScriptedEditor {
    fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines
                .iter()
                .map(|s| (*s).to_string())
                .collect::<Vec<_>>()
                .into_iter(),
        }
    }
}

impl LineEditor for ScriptedEditor {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadResult> {
        Ok(self.lines.next().map_or(ReadResult::Eof, ReadResult::Line))
    }

    fn add_history(&mut self, _line: &str) {}

    fn set_keywords(&mut self, _keywords: Vec<String>) {}
}

const DEFINITIONS: &str = "\
// inventory scopes
items:inventory := actor.core:inventory.items[]
items:heavy := items:inventory[{\">\": [{\"var\": \"entity.core:item.weight\"}, 4]}]
";

fn world() -> World {
    World::new()
        .with_entity(
            "player",
            [("core:inventory", json!({"items": ["lamp", "anvil"]}))],
        )
        .with_entity("lamp", [("core:item", json!({"weight": 1}))])
        .with_entity("anvil", [("core:item", json!({"weight": 50}))])
}

fn ids(evaluation: Evaluation) -> Vec<String> {
    match evaluation {
        Evaluation::Resolved(set) => set.iter().map(EntityId::to_string).collect(),
        Evaluation::Defined(n) => panic!("expected a resolution, got {n} definitions"),
    }
}

// =============================================================================
// Session
// =============================================================================

#[test]
fn load_definitions_and_world_then_resolve() {
    let dir = TempDir::new("load");
    let defs = dir.file("inventory.scope", DEFINITIONS);
    let snapshot = dir.0.join("world.json");
    save_to_file(&world(), &snapshot).unwrap();

    let mut session = Session::new();
    assert_eq!(session.load_file(&defs).unwrap(), Loaded::Definitions(2));
    assert_eq!(session.load_file(&snapshot).unwrap(), Loaded::World(3));

    let heavy = session.resolve("items:heavy").unwrap();
    assert_eq!(heavy.len(), 1);
    assert!(heavy.contains("anvil"));
    assert_eq!(ids(session.eval("items:inventory").unwrap()), vec!["anvil", "lamp"]);
}

#[test]
fn msgpack_snapshot_roundtrip() {
    let dir = TempDir::new("msgpack");
    let path = dir.0.join("world.msgpack");

    let mut session = Session::new();
    session.set_world(world());
    session.save_world(&path).unwrap();

    let restored = load_from_file(&path).unwrap();
    assert_eq!(restored.entity_count(), 3);
    assert_eq!(restored.get("anvil", "core:item"), Some(&json!({"weight": 50})));
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = TempDir::new("ext");
    let path = dir.file("notes.txt", "hello");
    let err = Session::new().load_file(&path).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Internal);
}

#[test]
fn eval_definitions_and_parse_errors() {
    let mut session = Session::new();
    session.set_world(world());

    assert!(matches!(
        session.eval("mine:all := items:inventory + actor"),
        Ok(Evaluation::Defined(1))
    ));
    assert!(session.engine().has_scope("mine:all"));

    let err = session.eval("actor.").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Syntax);
    assert_eq!(session.engine().errors().count(ErrorCategory::Syntax), 1);
}

#[test]
fn configured_session_traces_and_limits_depth() {
    let mut session = Session::with_config(
        DebugConfig::development(),
        EngineConfig::new().with_max_depth(3),
    );
    session.set_world(world());
    session
        .engine_mut()
        .register_definitions("d:a := d:b\nd:b := d:c\nd:c := actor")
        .unwrap();

    let err = session.resolve("d:a").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::DepthLimit);

    session.tracer_mut().clear();
    session.resolve("d:c").unwrap();
    assert_eq!(session.tracer().stats().resolutions, 1);
}

#[test]
fn actor_and_location_changes() {
    let mut session = Session::new();
    session.set_world(world().with_entity("cellar", [("core:location", json!({}))]));
    session.set_location(Some(EntityId::new("cellar")));
    session.set_actor("lamp");

    assert_eq!(session.actor().actor().as_str(), "lamp");
    assert_eq!(session.actor().location().map(EntityId::as_str), Some("cellar"));
    assert_eq!(ids(session.eval("self + location").unwrap()), vec!["cellar", "lamp"]);

    session.set_location(None);
    let err = session.eval("location").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::MissingDependency);
}

#[test]
fn profile_scope_or_expression() {
    let mut session = Session::new();
    session.set_world(world());
    session.engine_mut().register_definitions(DEFINITIONS).unwrap();

    let by_id = session.profile("items:heavy").unwrap();
    assert!(by_id.consistent);
    assert_eq!(by_id.result.len(), 1);

    let by_expr = session.profile("entities(core:item)").unwrap();
    assert_eq!(by_expr.result.len(), 2);
    assert!(!session.tracer().is_enabled());
    assert!(session.tracer().overhead().is_some());
}

#[test]
fn entity_as_json() {
    let mut session = Session::new();
    session.set_world(world());
    let lamp = session.entity("lamp").unwrap();
    assert_eq!(lamp["id"], json!("lamp"));
    assert_eq!(lamp["components"]["core:item"]["weight"], json!(1));

    let err = session.entity("ghost").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Internal);
}

// =============================================================================
// REPL
// =============================================================================

fn repl() -> Repl<ScriptedEditor> {
    let mut session = Session::new();
    session.set_world(world());
    Repl::with_editor(ScriptedEditor::new(&[]))
        .without_banner()
        .with_session(session)
}

fn output(repl: &mut Repl<ScriptedEditor>, input: &str) -> String {
    match repl.eval(input).unwrap() {
        Outcome::Output(text) => text,
        Outcome::Quit => panic!("unexpected quit for {input}"),
    }
}

#[test]
fn repl_defines_and_resolves() {
    let mut repl = repl();
    assert_eq!(
        output(&mut repl, "items:inventory := actor.core:inventory.items[]"),
        "defined 1 scope(s)"
    );
    assert_eq!(output(&mut repl, "items:inventory"), "{anvil, lamp} (2 entities)");
    assert!(output(&mut repl, ":scopes").contains("items:inventory := "));
}

#[test]
fn repl_trace_commands() {
    let mut repl = repl();
    output(&mut repl, ":trace on");
    output(&mut repl, "entities(core:item)");

    let report = output(&mut repl, ":trace show");
    assert!(report.contains("=== Scope Resolution Trace ==="));

    let parsed: Value = serde_json::from_str(&output(&mut repl, ":trace json")).unwrap();
    assert!(!parsed["records"].as_array().unwrap().is_empty());

    output(&mut repl, ":trace clear");
    assert!(repl.session().tracer().is_empty());
    output(&mut repl, ":trace off");
    assert!(!repl.session().tracer().is_enabled());
}

#[test]
fn repl_errors_and_clear() {
    let mut repl = repl();
    assert!(repl.eval("items:nowhere").is_err());
    assert!(output(&mut repl, ":errors").contains("SCOPE_2001"));

    output(&mut repl, ":clear");
    assert!(repl.session().engine().errors().is_empty());
    assert!(repl.session().engine().scope_ids().is_empty());
}

#[test]
fn repl_load_and_save_relative_to_load_path() {
    let dir = TempDir::new("repl_files");
    let defs = dir.file("inventory.scope", DEFINITIONS);

    let mut repl = repl();
    assert_eq!(repl.eval_file(&defs).unwrap(), Loaded::Definitions(2));

    let saved = output(&mut repl, ":save snapshot.json");
    assert!(saved.starts_with("saved world to"));
    assert!(dir.0.join("snapshot.json").exists());

    repl.session_mut().set_world(World::new());
    assert_eq!(
        output(&mut repl, ":load snapshot.json"),
        "loaded world with 3 entities"
    );
    assert_eq!(output(&mut repl, "items:heavy"), "{anvil} (1 entities)");
}

#[test]
fn repl_script_skips_comments() {
    let dir = TempDir::new("script");
    let script = dir.file(
        "session.txt",
        "// set up\nitems:inventory := actor.core:inventory.items[]\n\nitems:inventory\n:quit\nactor\n",
    );

    let mut repl = repl();
    let outputs = repl.eval_script(&script).unwrap();
    assert_eq!(
        outputs,
        vec!["defined 1 scope(s)", "{anvil, lamp} (2 entities)"]
    );
}

#[test]
fn repl_run_reads_until_eof() {
    let mut session = Session::new();
    session.set_world(world());
    let mut repl = Repl::with_editor(ScriptedEditor::new(&[
        "items:inventory := actor.core:inventory.items[]",
        "items:inventory[{\"<\": [{\"var\": \"entity.core:item.weight\"},",
        "  10]}]",
        "items:missing",
        "",
    ]))
    .without_banner()
    .with_session(session);

    repl.run().unwrap();
    assert!(repl.session().engine().has_scope("items:inventory"));
    assert_eq!(repl.session().engine().errors().count(ErrorCategory::UnknownScope), 1);
}
