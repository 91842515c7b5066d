use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
	error::ConfigError,
	generator::GenerationParams,
	light::LightShape,
	progression::{Difficulty, KeyStep, LevelGrowth},
};

/// Every tunable, loaded from RON. Each section is `#[serde(default)]`, so a
/// settings file only needs the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Seed string for reproducible runs. A fresh seed is drawn when absent.
	pub seed: Option<String>,
	pub difficulty: Difficulty,
	pub rooms: RoomSettings,
	pub growth: LevelGrowth,
	/// Keys required per level, by the first level each step applies to.
	pub keys: Vec<KeyStep>,
	pub light: LightSettings,
	pub tiles: TileWeights,
}

impl Default for Settings {
	fn default() -> Self {
		Settings {
			seed: None,
			difficulty: Difficulty::Normal,
			rooms: RoomSettings::default(),
			growth: LevelGrowth::default(),
			keys: vec![
				KeyStep {
					from_level: 1,
					easy: 1,
					normal: 1,
				},
				KeyStep {
					from_level: 3,
					easy: 1,
					normal: 2,
				},
				KeyStep {
					from_level: 6,
					easy: 2,
					normal: 3,
				},
			],
			light: LightSettings::default(),
			tiles: TileWeights::default(),
		}
	}
}

impl Settings {
	pub fn load(path: &Path) -> Result<Settings, ConfigError> {
		let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		Settings::parse(&text).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}

	pub fn parse(text: &str) -> Result<Settings, ron::error::SpannedError> {
		ron::from_str(text)
	}

	/// Loads settings from `path`, falling back to defaults on any error.
	pub fn load_or_default(path: &Path) -> Settings {
		match Settings::load(path) {
			Ok(settings) => {
				log::info!("Loaded settings from {}", path.display());
				settings
			}
			Err(e) => {
				log::warn!("{e}. Using default settings.");
				Settings::default()
			}
		}
	}

	/// Generator input for the given level.
	pub fn generation_params(
		&self,
		level: u32,
		difficulty: Difficulty,
	) -> GenerationParams {
		GenerationParams {
			size: self.growth.dimensions(level, difficulty),
			rooms: self.rooms.clone(),
		}
	}

	pub fn keys_to_find(&self, level: u32, difficulty: Difficulty) -> u32 {
		KeyStep::keys_for(&self.keys, level, difficulty)
	}
}

/// Room placement and connection constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
	pub min_width: i32,
	pub max_width: i32,
	pub min_height: i32,
	pub max_height: i32,
	/// Upper bound on width × height, walls included.
	pub max_area: i32,
	pub max_rooms: usize,
	/// Fewer rooms than this fails the attempt.
	pub min_rooms: usize,
	/// Minimum gap between a door and the ends of its wall, and between two
	/// doors on one room.
	pub door_padding: i32,
	pub min_corridor_length: i32,
	pub max_corridor_length: i32,
	/// Chance of joining two rooms that are already connected.
	pub loop_chance: f64,
	/// Consecutive failed room placements before placement stops.
	pub max_placement_retries: u32,
	/// Whole-layout attempts before generation fails.
	pub max_attempts: u32,
}

impl Default for RoomSettings {
	fn default() -> Self {
		RoomSettings {
			min_width: 8,
			max_width: 20,
			min_height: 8,
			max_height: 20,
			max_area: 100,
			max_rooms: 20,
			min_rooms: 2,
			door_padding: 2,
			min_corridor_length: 2,
			max_corridor_length: 5,
			loop_chance: 0.15,
			max_placement_retries: 100,
			max_attempts: 10,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
	/// Half of the light cone's opening angle.
	pub cone_half_angle_degrees: f32,
	/// Reach of the cone, in tiles.
	pub max_distance: f32,
	/// Easy mode lights a full circle this many times wider than the cone's
	/// reach.
	pub easy_radius_multiplier: f32,
	/// Rays per full turn used to approximate arcs. More rays cost more per
	/// frame.
	pub arc_resolution: usize,
}

impl Default for LightSettings {
	fn default() -> Self {
		LightSettings {
			cone_half_angle_degrees: 35.0,
			max_distance: 6.25,
			easy_radius_multiplier: 2.0,
			arc_resolution: 64,
		}
	}
}

impl LightSettings {
	pub fn shape(&self, difficulty: Difficulty) -> LightShape {
		match difficulty {
			Difficulty::Easy => LightShape::Circle {
				radius: self.max_distance * self.easy_radius_multiplier,
			},
			Difficulty::Normal => LightShape::Cone {
				half_angle: self.cone_half_angle_degrees.to_radians(),
				max_distance: self.max_distance,
			},
		}
	}
}

/// Weights for each decorative variant, indexed by variant number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TileWeights {
	pub floor: Vec<u32>,
	pub wall_top: Vec<u32>,
	pub wall_bottom: Vec<u32>,
	pub wall_left: Vec<u32>,
	pub wall_right: Vec<u32>,
}

impl Default for TileWeights {
	fn default() -> Self {
		TileWeights {
			floor: vec![20, 1, 1],
			wall_top: vec![4, 1, 1, 1],
			wall_bottom: vec![1],
			wall_left: vec![1],
			wall_right: vec![1],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_bundled_settings_parse() {
		let settings = Settings::parse(include_str!("../assets/settings.ron"))
			.expect("bundled settings should parse");
		assert_eq!(settings.difficulty, Difficulty::Normal);
		assert_eq!(settings.rooms.door_padding, 2);
		assert_eq!(settings.tiles.floor, vec![20, 1, 1]);
		assert_eq!(settings.keys.len(), 3);
	}

	#[test]
	fn test_partial_settings_fill_defaults() {
		let settings =
			Settings::parse("(difficulty: Easy, rooms: (max_rooms: 4))")
				.unwrap();
		assert_eq!(settings.difficulty, Difficulty::Easy);
		assert_eq!(settings.rooms.max_rooms, 4);
		assert_eq!(settings.rooms.min_width, 8);
		assert_eq!(settings.light.arc_resolution, 64);
	}

	#[test]
	fn test_missing_file_falls_back_to_defaults() {
		let path = Path::new("does/not/exist.ron");
		assert!(matches!(
			Settings::load(path),
			Err(ConfigError::Read { .. })
		));
		let settings = Settings::load_or_default(path);
		assert_eq!(settings.rooms.max_area, 100);
	}

	#[test]
	fn test_light_shape_follows_difficulty() {
		let light = LightSettings::default();
		assert!(matches!(
			light.shape(Difficulty::Easy),
			LightShape::Circle { radius } if (radius - 12.5).abs() < 1e-6
		));
		assert!(matches!(
			light.shape(Difficulty::Normal),
			LightShape::Cone { .. }
		));
	}
}
