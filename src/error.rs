use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::WorldPoint;

/// Dungeon generation could not produce a valid layout.
#[derive(Debug, Error)]
pub enum GenerationFailure {
	/// The parameters can never be satisfied.
	#[error("invalid generation parameters: {0}")]
	InvalidParameters(String),

	/// Too few rooms fit within the grid.
	#[error(
		"placed only {placed} of {required} required rooms after {attempts} attempts"
	)]
	TooFewRooms {
		attempts: u32,
		placed: usize,
		required: usize,
	},

	/// Some rooms could not be joined to the rest by corridors.
	#[error("could not connect all rooms after {attempts} attempts")]
	Disconnected { attempts: u32 },
}

/// Malformed obstacle geometry. Skipped by the consumer, never surfaced.
#[derive(Debug, Error)]
pub enum GeometryError {
	#[error("degenerate segment from {start:?} to {end:?}")]
	DegenerateSegment { start: WorldPoint, end: WorldPoint },
}

/// Errors that can occur when loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read '{}': {source}", .path.display())]
	Read {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("parse error in '{}': {source}", .path.display())]
	Parse {
		path: PathBuf,
		source: ron::error::SpannedError,
	},
}

#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Generation(#[from] GenerationFailure),
}
