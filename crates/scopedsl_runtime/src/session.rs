//! Session state for the REPL and CLI.
//!
//! A session owns the scope engine, the current world snapshot, the actor
//! that resolutions run as, and the debugging tools.

use std::fs;
use std::path::{Path, PathBuf};

use scopedsl_debug::{DebugConfig, ProfileReport, Profiler, Tracer};
use scopedsl_engine::{ActorContext, EngineConfig, ScopeEngine};
use scopedsl_foundation::{EntityId, EntityManager, EntitySet, Error, ErrorKind, JsonValue, Result};
use scopedsl_language::parse_scope;
use scopedsl_storage::World;
use tracing::debug;

use crate::serialize::{self, SnapshotFormat};

/// Actor used until one is chosen.
pub const DEFAULT_ACTOR: &str = "player";

/// Extension of scope definition files.
pub const DEFINITIONS_EXTENSION: &str = "scope";

/// What loading a file produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Loaded {
    /// A definitions file; the number of scopes registered.
    Definitions(usize),
    /// A world snapshot; the number of entities it holds.
    World(usize),
}

/// What evaluating one line produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Evaluation {
    /// `id := expr` lines; the number of scopes registered.
    Defined(usize),
    /// An expression; the resolved entity set.
    Resolved(EntitySet),
}

/// Session state for an interactive or batch run.
pub struct Session {
    engine: ScopeEngine,
    world: World,
    actor: ActorContext,
    tracer: Tracer,
    profiler: Profiler,
    config: DebugConfig,
    /// Current load path for relative file resolution.
    load_path: PathBuf,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a session with an empty world and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DebugConfig::default(), EngineConfig::default())
    }

    /// Creates a session with the given debug and engine settings.
    #[must_use]
    pub fn with_config(config: DebugConfig, engine: EngineConfig) -> Self {
        Self {
            engine: ScopeEngine::with_config(engine),
            world: World::new(),
            actor: ActorContext::new(DEFAULT_ACTOR),
            tracer: config.build_tracer(),
            profiler: config.build_profiler(),
            config,
            load_path: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the scope engine.
    #[must_use]
    pub fn engine(&self) -> &ScopeEngine {
        &self.engine
    }

    /// Returns the scope engine mutably.
    pub fn engine_mut(&mut self) -> &mut ScopeEngine {
        &mut self.engine
    }

    /// Returns the current world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Replaces the current world.
    pub fn set_world(&mut self, world: World) {
        self.world = world;
    }

    /// Returns the actor context resolutions run as.
    #[must_use]
    pub fn actor(&self) -> &ActorContext {
        &self.actor
    }

    /// Changes the actor, keeping the location.
    pub fn set_actor(&mut self, actor: impl Into<EntityId>) {
        let mut next = ActorContext::new(actor);
        if let Some(location) = self.actor.location() {
            next = next.with_location(location.clone());
        }
        self.actor = next;
    }

    /// Sets or clears the actor's location.
    pub fn set_location(&mut self, location: Option<EntityId>) {
        let next = ActorContext::new(self.actor.actor().clone());
        self.actor = match location {
            Some(location) => next.with_location(location),
            None => next,
        };
    }

    /// Returns the tracer.
    #[must_use]
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Returns the tracer mutably.
    pub fn tracer_mut(&mut self) -> &mut Tracer {
        &mut self.tracer
    }

    /// Returns the debug settings.
    #[must_use]
    pub fn config(&self) -> &DebugConfig {
        &self.config
    }

    /// Returns the current load path.
    #[must_use]
    pub fn load_path(&self) -> &Path {
        &self.load_path
    }

    /// Sets the load path for relative file resolution.
    pub fn set_load_path(&mut self, path: PathBuf) {
        self.load_path = path;
    }

    /// Resolves a path relative to the load path.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.load_path.join(path)
        }
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Loads a definitions file or a world snapshot.
    ///
    /// `.scope` files register definitions; `.json` and `.msgpack` files
    /// replace the world.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the extension is not
    /// recognized, or the content fails to parse.
    pub fn load_file(&mut self, path: &Path) -> Result<Loaded> {
        if let Some(format) = SnapshotFormat::from_path(path) {
            let bytes = fs::read(path).map_err(|e| read_error(path, &e))?;
            let world = format.decode(&bytes)?;
            let count = world.entity_count();
            self.world = world;
            debug!(path = %path.display(), entities = count, "loaded world snapshot");
            return Ok(Loaded::World(count));
        }

        if path.extension().and_then(|ext| ext.to_str()) == Some(DEFINITIONS_EXTENSION) {
            let source = fs::read_to_string(path).map_err(|e| read_error(path, &e))?;
            let count = self.engine.register_definitions(&source)?;
            debug!(path = %path.display(), scopes = count, "loaded scope definitions");
            return Ok(Loaded::Definitions(count));
        }

        Err(Error::new(ErrorKind::Io(format!(
            "unrecognized file type '{}' (expected .scope, .json, or .msgpack)",
            path.display()
        ))))
    }

    /// Saves the current world, choosing the format from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or serialization fails.
    pub fn save_world(&self, path: &Path) -> Result<()> {
        serialize::save_to_file(&self.world, path)
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluates one input: definitions if it contains `:=`, otherwise an
    /// expression resolved against the current world.
    ///
    /// Parse errors are reported to the engine's error handler.
    ///
    /// # Errors
    ///
    /// Returns the parse or resolution error.
    pub fn eval(&mut self, input: &str) -> Result<Evaluation> {
        if input.contains(":=") {
            return self.engine.register_definitions(input).map(Evaluation::Defined);
        }

        let expr = parse_scope(input).map_err(|err| self.reject(err))?;
        self.engine
            .resolve_expr_traced(&expr, &self.actor, &self.world, &mut self.tracer)
            .map(Evaluation::Resolved)
    }

    /// Resolves a registered scope as the current actor.
    ///
    /// # Errors
    ///
    /// Returns the resolution error.
    pub fn resolve(&mut self, scope_id: &str) -> Result<EntitySet> {
        self.engine
            .resolve_traced(scope_id, &self.actor, &self.world, &mut self.tracer)
    }

    /// Profiles a registered scope id or an ad-hoc expression.
    ///
    /// # Errors
    ///
    /// Returns the parse or resolution error.
    pub fn profile(&mut self, input: &str) -> Result<ProfileReport> {
        let input = input.trim();
        if self.engine.has_scope(input) {
            return self.profiler.profile(
                &self.engine,
                input,
                &self.actor,
                &self.world,
                &mut self.tracer,
            );
        }

        let expr = parse_scope(input).map_err(|err| self.reject(err))?;
        self.profiler
            .profile_expr(&self.engine, &expr, &self.actor, &self.world, &mut self.tracer)
    }

    /// Returns an entity as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist.
    pub fn entity(&self, id: &str) -> Result<JsonValue> {
        self.world
            .entity(id)
            .map(|view| view.to_json())
            .ok_or_else(|| Error::entity_not_found(EntityId::new(id)))
    }

    fn reject(&self, err: Error) -> Error {
        self.engine.errors().report(&err, None);
        err
    }
}

fn read_error(path: &Path, err: &std::io::Error) -> Error {
    Error::new(ErrorKind::Io(format!(
        "failed to read '{}': {err}",
        path.display()
    )))
}
