use serde::{Deserialize, Serialize};

use crate::{
	events::EventBus,
	geometry::{TilePoint, TileVector},
};

#[derive(
	Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize,
)]
pub enum Difficulty {
	Easy,
	#[default]
	Normal,
}

/// The number of keys to find on each level from `from_level` onward, until
/// a later step takes over.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct KeyStep {
	pub from_level: u32,
	pub easy: u32,
	pub normal: u32,
}

impl KeyStep {
	/// Looks up the keys required on `level`. Steps may be listed in any
	/// order. Levels before every step need one key.
	pub fn keys_for(
		steps: &[KeyStep],
		level: u32,
		difficulty: Difficulty,
	) -> u32 {
		steps
			.iter()
			.filter(|step| step.from_level <= level)
			.max_by_key(|step| step.from_level)
			.map_or(1, |step| match difficulty {
				Difficulty::Easy => step.easy,
				Difficulty::Normal => step.normal,
			})
	}
}

/// How the grid grows from one level to the next.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelGrowth {
	pub base_width: i32,
	pub base_height: i32,
	pub easy_step: i32,
	pub normal_step: i32,
	pub max_width: i32,
	pub max_height: i32,
}

impl Default for LevelGrowth {
	fn default() -> Self {
		LevelGrowth {
			base_width: 50,
			base_height: 50,
			easy_step: 2,
			normal_step: 5,
			max_width: 100,
			max_height: 100,
		}
	}
}

impl LevelGrowth {
	/// Grid size for `level`, counting from 1.
	pub fn dimensions(
		&self,
		level: u32,
		difficulty: Difficulty,
	) -> TileVector {
		let step = match difficulty {
			Difficulty::Easy => self.easy_step,
			Difficulty::Normal => self.normal_step,
		};
		let grown = step.saturating_mul(level.saturating_sub(1) as i32);
		TileVector::new(
			self.base_width.saturating_add(grown).min(self.max_width),
			self.base_height.saturating_add(grown).min(self.max_height),
		)
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
	/// Keys remain to be found.
	Locked,
	/// The exit is open.
	Unlocked,
	/// The exit was used and the next level is loading.
	Transitioning,
}

#[derive(Clone, Copy, Debug)]
pub struct Key {
	pub position: TilePoint,
	pub used: bool,
}

impl Key {
	pub fn new(position: TilePoint) -> Key {
		Key {
			position,
			used: false,
		}
	}
}

#[derive(Clone, Copy, Debug)]
pub struct ExitDoor {
	pub position: TilePoint,
	pub opened: bool,
	pub used: bool,
}

impl ExitDoor {
	pub fn new(position: TilePoint) -> ExitDoor {
		ExitDoor {
			position,
			opened: false,
			used: false,
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProgressEvent {
	KeyCollected { found: u32, required: u32 },
	ExitOpened,
	LevelComplete { next_level: u32 },
}

/// Progress as handed to an external store between runs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ProgressSnapshot {
	pub level: u32,
	pub difficulty: Difficulty,
	pub keys_found: u32,
	pub keys_to_find: u32,
}

#[derive(Debug)]
pub struct Progression {
	level: u32,
	difficulty: Difficulty,
	phase: Phase,
	keys_found: u32,
	keys_to_find: u32,
}

impl Progression {
	/// Starts on level 1 with the exit locked.
	pub fn new(difficulty: Difficulty, keys_to_find: u32) -> Progression {
		Progression {
			level: 1,
			difficulty,
			phase: Phase::Locked,
			keys_found: 0,
			keys_to_find,
		}
	}

	/// Restores saved progress with the exit locked. If every key was
	/// already found, [`Progression::unlock_if_complete`] opens the level's
	/// exit.
	pub fn from_snapshot(snapshot: ProgressSnapshot) -> Progression {
		Progression {
			level: snapshot.level.max(1),
			difficulty: snapshot.difficulty,
			phase: Phase::Locked,
			keys_found: snapshot.keys_found,
			keys_to_find: snapshot.keys_to_find,
		}
	}

	pub fn level(&self) -> u32 {
		self.level
	}

	pub fn difficulty(&self) -> Difficulty {
		self.difficulty
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn keys_found(&self) -> u32 {
		self.keys_found
	}

	pub fn keys_to_find(&self) -> u32 {
		self.keys_to_find
	}

	pub fn snapshot(&self) -> ProgressSnapshot {
		ProgressSnapshot {
			level: self.level,
			difficulty: self.difficulty,
			keys_found: self.keys_found,
			keys_to_find: self.keys_to_find,
		}
	}

	/// Picks up `key` unless it was already used. Returns true if this key
	/// unlocked the exit, in which case `exit` is marked opened and
	/// [`ProgressEvent::ExitOpened`] has been published.
	pub fn collect_key(
		&mut self,
		key: &mut Key,
		exit: &mut ExitDoor,
		events: &mut EventBus<ProgressEvent>,
	) -> bool {
		if key.used {
			return false;
		}
		key.used = true;
		self.keys_found += 1;
		log::info!(
			"Found key {} of {} at {:?}",
			self.keys_found,
			self.keys_to_find,
			key.position
		);
		events.publish(ProgressEvent::KeyCollected {
			found: self.keys_found,
			required: self.keys_to_find,
		});
		self.unlock_if_complete(exit, events)
	}

	/// Opens the exit if enough keys have been found and it's still locked.
	/// Also covers levels that need no keys at all.
	pub fn unlock_if_complete(
		&mut self,
		exit: &mut ExitDoor,
		events: &mut EventBus<ProgressEvent>,
	) -> bool {
		if self.phase != Phase::Locked || self.keys_found < self.keys_to_find {
			return false;
		}
		self.phase = Phase::Unlocked;
		exit.opened = true;
		log::info!("Exit opened on level {}", self.level);
		events.publish(ProgressEvent::ExitOpened);
		true
	}

	/// Walks through the exit if it's open and unused. Returns true on the
	/// one call that completes the level.
	pub fn use_exit(
		&mut self,
		exit: &mut ExitDoor,
		events: &mut EventBus<ProgressEvent>,
	) -> bool {
		if self.phase != Phase::Unlocked || !exit.opened || exit.used {
			return false;
		}
		exit.used = true;
		self.phase = Phase::Transitioning;
		let next_level = self.level + 1;
		log::info!("Level {} complete", self.level);
		events.publish(ProgressEvent::LevelComplete { next_level });
		true
	}

	/// Resets for a freshly generated `level`.
	pub fn begin_level(&mut self, level: u32, keys_to_find: u32) {
		self.level = level;
		self.phase = Phase::Locked;
		self.keys_found = 0;
		self.keys_to_find = keys_to_find;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::shared::{share, Shared};

	fn recorded_bus() -> (EventBus<ProgressEvent>, Shared<Vec<ProgressEvent>>) {
		let events = share(Vec::new());
		let mut bus = EventBus::new();
		bus.subscribe({
			let events = events.clone();
			move |event: &ProgressEvent| events.borrow_mut().push(*event)
		});
		(bus, events)
	}

	#[test]
	fn test_keys_open_the_exit_once() {
		let (mut bus, events) = recorded_bus();
		let mut progression = Progression::new(Difficulty::Normal, 2);
		let mut exit = ExitDoor::new(TilePoint::new(5, 0));
		let mut keys =
			[Key::new(TilePoint::new(1, 1)), Key::new(TilePoint::new(2, 2))];
		assert_eq!(progression.keys_found(), 0);

		assert!(!progression.collect_key(&mut keys[0], &mut exit, &mut bus));
		assert!(!exit.opened);
		assert_eq!(progression.phase(), Phase::Locked);
		assert!(!progression.collect_key(&mut keys[0], &mut exit, &mut bus));
		assert_eq!(progression.keys_found(), 1);

		assert!(progression.collect_key(&mut keys[1], &mut exit, &mut bus));
		assert!(exit.opened);
		assert_eq!(progression.phase(), Phase::Unlocked);
		assert!(!progression.collect_key(&mut keys[1], &mut exit, &mut bus));

		assert_eq!(
			*events.borrow(),
			vec![
				ProgressEvent::KeyCollected { found: 1, required: 2 },
				ProgressEvent::KeyCollected { found: 2, required: 2 },
				ProgressEvent::ExitOpened,
			]
		);
	}

	#[test]
	fn test_locked_exit_never_completes() {
		let (mut bus, events) = recorded_bus();
		let mut progression = Progression::new(Difficulty::Normal, 1);
		let mut exit = ExitDoor::new(TilePoint::new(5, 0));
		for _ in 0..3 {
			assert!(!progression.use_exit(&mut exit, &mut bus));
		}
		assert!(!exit.used);
		assert!(events.borrow().is_empty());
	}

	#[test]
	fn test_open_exit_completes_exactly_once() {
		let (mut bus, events) = recorded_bus();
		let mut progression = Progression::new(Difficulty::Easy, 1);
		let mut exit = ExitDoor::new(TilePoint::new(5, 0));
		let mut key = Key::new(TilePoint::new(1, 1));
		progression.collect_key(&mut key, &mut exit, &mut bus);

		let completions = (0..5)
			.filter(|_| progression.use_exit(&mut exit, &mut bus))
			.count();
		assert_eq!(completions, 1);
		assert_eq!(progression.phase(), Phase::Transitioning);
		assert_eq!(
			events.borrow().last(),
			Some(&ProgressEvent::LevelComplete { next_level: 2 })
		);

		progression.begin_level(2, 2);
		assert_eq!(progression.level(), 2);
		assert_eq!(progression.phase(), Phase::Locked);
		assert_eq!(progression.keys_found(), 0);
		assert_eq!(progression.keys_to_find(), 2);
	}

	#[test]
	fn test_key_table_steps_by_level() {
		let steps = crate::settings::Settings::default().keys;
		let keys =
			|level, difficulty| KeyStep::keys_for(&steps, level, difficulty);
		assert_eq!(keys(1, Difficulty::Normal), 1);
		assert_eq!(keys(2, Difficulty::Easy), 1);
		assert_eq!(keys(3, Difficulty::Normal), 2);
		assert_eq!(keys(3, Difficulty::Easy), 1);
		assert_eq!(keys(6, Difficulty::Easy), 2);
		assert_eq!(keys(40, Difficulty::Normal), 3);
		assert_eq!(KeyStep::keys_for(&[], 4, Difficulty::Normal), 1);
	}

	#[test]
	fn test_growth_is_monotonic_and_capped() {
		let growth = LevelGrowth::default();
		assert_eq!(
			growth.dimensions(1, Difficulty::Normal),
			TileVector::new(50, 50)
		);
		assert_eq!(
			growth.dimensions(3, Difficulty::Easy),
			TileVector::new(54, 54)
		);
		for difficulty in [Difficulty::Easy, Difficulty::Normal] {
			let mut previous = growth.dimensions(1, difficulty);
			for level in 2..60 {
				let size = growth.dimensions(level, difficulty);
				assert!(size.x >= previous.x && size.y >= previous.y);
				assert!(size.x <= 100 && size.y <= 100);
				previous = size;
			}
			assert_eq!(previous, TileVector::new(100, 100));
		}
	}

	#[test]
	fn test_snapshot_round_trips_through_ron() {
		let mut progression = Progression::new(Difficulty::Easy, 3);
		progression.begin_level(4, 3);
		let text = ron::to_string(&progression.snapshot()).unwrap();
		let restored: ProgressSnapshot = ron::from_str(&text).unwrap();
		let restored = Progression::from_snapshot(restored);
		assert_eq!(restored.level(), 4);
		assert_eq!(restored.difficulty(), Difficulty::Easy);
		assert_eq!(restored.phase(), Phase::Locked);
	}

	#[test]
	fn test_restored_progress_reopens_the_exit() {
		let (mut bus, events) = recorded_bus();
		let mut progression = Progression::from_snapshot(ProgressSnapshot {
			level: 3,
			difficulty: Difficulty::Normal,
			keys_found: 2,
			keys_to_find: 2,
		});
		let mut exit = ExitDoor::new(TilePoint::new(5, 0));
		assert_eq!(progression.phase(), Phase::Locked);
		assert!(!progression.use_exit(&mut exit, &mut bus));

		assert!(progression.unlock_if_complete(&mut exit, &mut bus));
		assert!(exit.opened);
		assert!(progression.use_exit(&mut exit, &mut bus));
		assert_eq!(
			*events.borrow(),
			vec![
				ProgressEvent::ExitOpened,
				ProgressEvent::LevelComplete { next_level: 4 },
			]
		);
	}
}
