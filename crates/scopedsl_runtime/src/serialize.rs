//! World snapshot serialization.
//!
//! Snapshots are stored either as JSON (human-editable fixtures) or as
//! `MessagePack` (compact binary). The format is chosen from the file
//! extension.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use scopedsl_foundation::{Error, ErrorKind, Result};
use scopedsl_storage::World;

/// On-disk snapshot encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// `.json`
    Json,
    /// `.msgpack` / `.mp`
    MessagePack,
}

impl SnapshotFormat {
    /// Picks a format from a path's extension.
    ///
    /// Returns `None` for extensions that are not snapshots.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "msgpack" | "mp" => Some(Self::MessagePack),
            _ => None,
        }
    }

    /// Encodes a world.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn encode(self, world: &World) -> Result<Vec<u8>> {
        match self {
            Self::Json => to_json(world).map(String::into_bytes),
            Self::MessagePack => to_bytes(world),
        }
    }

    /// Decodes a world.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the bytes are not a valid snapshot.
    pub fn decode(self, bytes: &[u8]) -> Result<World> {
        match self {
            Self::Json => serde_json::from_slice(bytes).map_err(serialization_error),
            Self::MessagePack => from_bytes(bytes),
        }
    }
}

fn serialization_error(err: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Serialization(err.to_string()))
}

fn io_error(action: &str, path: &Path, err: &std::io::Error) -> Error {
    Error::new(ErrorKind::Io(format!(
        "failed to {action} '{}': {err}",
        path.display()
    )))
}

/// Serializes a world to `MessagePack` bytes.
///
/// Uses named serialization so snapshots stay readable by other tools.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(world: &World) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(world).map_err(serialization_error)
}

/// Deserializes a world from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if deserialization fails.
pub fn from_bytes(bytes: &[u8]) -> Result<World> {
    rmp_serde::from_slice(bytes).map_err(serialization_error)
}

/// Serializes a world to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(world: &World) -> Result<String> {
    serde_json::to_string_pretty(world).map_err(serialization_error)
}

/// Deserializes a world from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not a valid snapshot.
pub fn from_json(text: &str) -> Result<World> {
    serde_json::from_str(text).map_err(serialization_error)
}

/// Saves a world to a file, choosing the format from the extension.
///
/// Unknown extensions are written as `MessagePack`.
///
/// # Errors
///
/// Returns an error if the file cannot be written or serialization fails.
pub fn save_to_file<P: AsRef<Path>>(world: &World, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = SnapshotFormat::from_path(path).unwrap_or(SnapshotFormat::MessagePack);
    let bytes = format.encode(world)?;

    let file = File::create(path).map_err(|e| io_error("create file", path, &e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .map_err(|e| io_error("write to file", path, &e))?;
    writer
        .flush()
        .map_err(|e| io_error("flush file", path, &e))?;

    Ok(())
}

/// Loads a world from a file, choosing the format from the extension.
///
/// Unknown extensions are read as `MessagePack`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<World> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_error("open file", path, &e))?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| io_error("read file", path, &e))?;

    SnapshotFormat::from_path(path)
        .unwrap_or(SnapshotFormat::MessagePack)
        .decode(&bytes)
}
