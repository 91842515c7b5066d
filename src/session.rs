use rand_pcg::Pcg32;

use crate::{
	dungeon::Dungeon,
	error::{Error, GenerationFailure},
	events::EventBus,
	generator,
	geometry::{TilePoint, WorldPoint},
	light::{Viewpoint, VisibilityEngine, VisiblePolygon},
	painter::TilePainter,
	progression::{Difficulty, Phase, ProgressEvent, Progression},
	room::Layout,
	settings::Settings,
};

/// A run of the game: progression across levels and the current dungeon.
pub struct Session {
	settings: Settings,
	painter: TilePainter,
	progression: Progression,
	/// Only empty while one level is swapped for the next.
	dungeon: Option<Dungeon>,
	pub events: EventBus<ProgressEvent>,
	input_frozen: bool,
	engine: VisibilityEngine,
}

impl Session {
	/// Starts a run on level 1.
	pub fn new(settings: Settings, rng: &mut Pcg32) -> Result<Session, Error> {
		let painter = TilePainter::new(&settings.tiles)?;
		let difficulty = settings.difficulty;
		let layout = generate_layout(&settings, 1, difficulty, rng)?;
		let keys = settings.keys_to_find(1, difficulty);
		let dungeon = Dungeon::build(layout, &painter, keys, rng);
		let engine = VisibilityEngine::new(settings.light.arc_resolution);
		let mut session = Session {
			progression: Progression::new(difficulty, keys_placed(&dungeon)),
			settings,
			painter,
			dungeon: Some(dungeon),
			events: EventBus::new(),
			input_frozen: false,
			engine,
		};
		session.unlock_if_keyless();
		Ok(session)
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn progression(&self) -> &Progression {
		&self.progression
	}

	pub fn difficulty(&self) -> Difficulty {
		self.progression.difficulty()
	}

	/// The current level's dungeon.
	pub fn dungeon(&self) -> Option<&Dungeon> {
		self.dungeon.as_ref()
	}

	pub fn dungeon_mut(&mut self) -> Option<&mut Dungeon> {
		self.dungeon.as_mut()
	}

	/// Reacts to the player entering `cell`: picks up any key there and walks
	/// through the exit if it's open. Ignored while input is frozen.
	pub fn player_moved(&mut self, cell: TilePoint) {
		if self.input_frozen {
			return;
		}
		let Some(dungeon) = self.dungeon.as_mut() else {
			return;
		};
		if let Some(index) = dungeon.key_at(cell) {
			let (key, exit) = dungeon.key_and_exit_mut(index);
			if self.progression.collect_key(key, exit, &mut self.events) {
				dungeon.open_exit();
			}
		}
		if cell == dungeon.exit_position() {
			self.progression
				.use_exit(dungeon.exit_mut(), &mut self.events);
		}
	}

	pub fn freeze_input(&mut self) {
		self.input_frozen = true;
	}

	pub fn resume_input(&mut self) {
		self.input_frozen = false;
	}

	pub fn input_frozen(&self) -> bool {
		self.input_frozen
	}

	/// The light polygon for `viewpoint` against the current obstacles.
	pub fn visible_polygon(&self, viewpoint: &Viewpoint) -> VisiblePolygon {
		let obstacles = self
			.dungeon
			.as_ref()
			.map_or(&[][..], Dungeon::obstacle_segments);
		self.engine.compute_visible_polygon(viewpoint, obstacles)
	}

	/// The viewpoint for a player at `position` facing `facing`, shaped by the
	/// current difficulty.
	pub fn viewpoint(&self, position: WorldPoint, facing: f32) -> Viewpoint {
		Viewpoint {
			position,
			facing,
			shape: self.settings.light.shape(self.difficulty()),
		}
	}

	/// Replaces the current dungeon with the next level's, once the exit has
	/// been used. Does nothing in any other phase.
	///
	/// The new layout is generated before anything is torn down, so on
	/// failure the current level stays in place, still transitioning, and the
	/// error is returned. Calling again retries.
	pub fn advance_level(
		&mut self,
		rng: &mut Pcg32,
	) -> Result<(), GenerationFailure> {
		if self.progression.phase() != Phase::Transitioning {
			log::debug!(
				"Ignoring level advance while {:?}",
				self.progression.phase()
			);
			return Ok(());
		}
		let level = self.progression.level() + 1;
		let difficulty = self.progression.difficulty();
		let layout = generate_layout(&self.settings, level, difficulty, rng)?;

		if let Some(old) = self.dungeon.take() {
			old.teardown();
		}
		let wanted = self.settings.keys_to_find(level, difficulty);
		let dungeon = Dungeon::build(layout, &self.painter, wanted, rng);
		let keys = keys_placed(&dungeon);
		self.dungeon = Some(dungeon);
		self.progression.begin_level(level, keys);
		self.unlock_if_keyless();
		log::info!("Entered level {level}, {keys} keys to find");
		Ok(())
	}

	fn unlock_if_keyless(&mut self) {
		let Some(dungeon) = self.dungeon.as_mut() else {
			return;
		};
		if self
			.progression
			.unlock_if_complete(dungeon.exit_mut(), &mut self.events)
		{
			dungeon.open_exit();
		}
	}
}

/// The keys that actually fit on the level, which can fall short of the
/// number asked for when rooms have no free floor.
fn keys_placed(dungeon: &Dungeon) -> u32 {
	dungeon.keys().len() as u32
}

/// Generates the layout for `level`, retrying once with relaxed parameters.
fn generate_layout(
	settings: &Settings,
	level: u32,
	difficulty: Difficulty,
	rng: &mut Pcg32,
) -> Result<Layout, GenerationFailure> {
	let params = settings.generation_params(level, difficulty);
	match generator::generate(&params, rng) {
		Ok(layout) => Ok(layout),
		Err(e @ GenerationFailure::InvalidParameters(_)) => Err(e),
		Err(e) => {
			log::warn!("Level {level}: {e}. Retrying with relaxed parameters.");
			generator::generate(&params.relaxed(), rng)
		}
	}
}
