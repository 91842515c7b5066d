use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand_pcg::Pcg32;

use crate::{
	dijkstra_map::DijkstraMap,
	error::GenerationFailure,
	generator,
	geometry::{Segment, TilePoint, TileRectangle},
	grid::{DoorState, Grid, Tile},
	light::Viewpoint,
	occluders,
	painter::TilePainter,
	progression::{Difficulty, ExitDoor, Key},
	room::{Layout, Room},
	settings::Settings,
	vision,
};

/// One level's worth of generated state, created fresh per level.
pub struct Dungeon {
	layout: Layout,
	grid: Grid,
	obstacles: Vec<Segment>,
	keys: Vec<Key>,
	exit: ExitDoor,
	spawn: TilePoint,
	/// Tiles seen at least once on this level.
	explored: HashSet<TilePoint>,
}

impl Dungeon {
	/// Generates and furnishes a dungeon for `level`.
	pub fn generate(
		level: u32,
		difficulty: Difficulty,
		settings: &Settings,
		rng: &mut Pcg32,
	) -> Result<Dungeon, GenerationFailure> {
		let params = settings.generation_params(level, difficulty);
		let layout = generator::generate(&params, rng)?;
		let painter = TilePainter::new(&settings.tiles)?;
		let keys = settings.keys_to_find(level, difficulty);
		Ok(Dungeon::build(layout, &painter, keys, rng))
	}

	/// Paints `layout` and places the spawn point, the exit and
	/// `keys_to_place` keys.
	pub fn build(
		layout: Layout,
		painter: &TilePainter,
		keys_to_place: u32,
		rng: &mut Pcg32,
	) -> Dungeon {
		let mut grid = painter.paint(&layout, rng);
		let spawn = layout.rooms[0].center();

		let exit = place_exit(&layout, &mut grid, spawn, rng);
		let reachable =
			DijkstraMap::new([spawn], |coords| !grid.is_passable(coords));
		let keys =
			place_keys(&layout, &grid, &reachable, spawn, keys_to_place, rng);
		let obstacles = occluders::obstacle_segments(&grid);

		log::info!(
			"Built {}x{} dungeon: {} rooms, {} corridors, {} keys, {} obstacle segments",
			layout.width,
			layout.height,
			layout.rooms.len(),
			layout.corridors.len(),
			keys.len(),
			obstacles.len()
		);
		Dungeon {
			layout,
			grid,
			obstacles,
			keys,
			exit,
			spawn,
			explored: HashSet::new(),
		}
	}

	pub fn layout(&self) -> &Layout {
		&self.layout
	}

	pub fn grid(&self) -> &Grid {
		&self.grid
	}

	pub fn obstacle_segments(&self) -> &[Segment] {
		&self.obstacles
	}

	pub fn spawn(&self) -> TilePoint {
		self.spawn
	}

	/// Positions of the keys not yet collected.
	pub fn key_positions(&self) -> Vec<TilePoint> {
		self.keys
			.iter()
			.filter(|key| !key.used)
			.map(|key| key.position)
			.collect()
	}

	pub fn keys(&self) -> &[Key] {
		&self.keys
	}

	pub fn exit(&self) -> &ExitDoor {
		&self.exit
	}

	pub fn exit_position(&self) -> TilePoint {
		self.exit.position
	}

	/// The index of the uncollected key at `coords`, if any.
	pub fn key_at(&self, coords: TilePoint) -> Option<usize> {
		self.keys
			.iter()
			.position(|key| !key.used && key.position == coords)
	}

	/// The key at `index` alongside the exit, borrowed together.
	pub fn key_and_exit_mut(
		&mut self,
		index: usize,
	) -> (&mut Key, &mut ExitDoor) {
		(&mut self.keys[index], &mut self.exit)
	}

	pub fn exit_mut(&mut self) -> &mut ExitDoor {
		&mut self.exit
	}

	/// Swaps the exit tile to its open state. The door stops blocking light,
	/// so the obstacles are rebuilt.
	pub fn open_exit(&mut self) {
		self.grid.set(self.exit.position, Tile::Door(DoorState::Open));
		self.obstacles = occluders::obstacle_segments(&self.grid);
	}

	/// Remembers every tile the light from `viewpoint` reaches.
	pub fn reveal(&mut self, viewpoint: &Viewpoint) {
		let origin = viewpoint.position.tile();
		let radius = viewpoint.shape.reach().ceil() as i32;
		let seen = vision::visible_tiles(origin, radius, |coords| {
			self.grid.is_opaque(coords)
		});
		self.explored.extend(seen.into_iter().filter(|coords| {
			*coords == origin || viewpoint.covers(coords.center())
		}));
	}

	pub fn is_explored(&self, coords: TilePoint) -> bool {
		self.explored.contains(&coords)
	}

	/// Releases the level: obstacles first, then the grid.
	pub fn teardown(self) {
		let Dungeon {
			layout,
			grid,
			obstacles,
			..
		} = self;
		let segment_count = obstacles.len();
		drop(obstacles);
		drop(grid);
		log::debug!(
			"Tore down dungeon with {} rooms and {segment_count} obstacle segments",
			layout.rooms.len()
		);
	}
}

/// Puts a closed exit door in the room farthest from the spawn point. The
/// door goes on the top wall away from any breach if it can, then on another
/// wall, then on the interior cell nearest the centre. It never lands on the
/// spawn point.
fn place_exit(
	layout: &Layout,
	grid: &mut Grid,
	spawn: TilePoint,
	rng: &mut Pcg32,
) -> ExitDoor {
	let distances =
		DijkstraMap::new([spawn], |coords| !grid.is_passable(coords));
	let room = layout
		.rooms
		.iter()
		.filter_map(|room| {
			distances.distance(room.center()).map(|distance| (distance, room))
		})
		.max_by_key(|(distance, _)| *distance)
		.map_or(&layout.rooms[0], |(_, room)| room);

	let wall: Vec<TilePoint> = ring(room)
		.filter(|coords| {
			room.side_of(*coords).is_some() && clear_of_doors(room, *coords)
		})
		.collect();
	let top: Vec<TilePoint> = wall
		.iter()
		.copied()
		.filter(|coords| {
			coords.y == room.top()
				&& coords.x > room.left() + 1
				&& coords.x < room.right() - 1
		})
		.collect();
	let position = top
		.choose(rng)
		.or_else(|| wall.choose(rng))
		.copied()
		.or_else(|| {
			let center = room.center();
			cells(room.interior())
				.filter(|coords| *coords != spawn)
				.min_by_key(|coords| coords.chebyshev_distance(center))
		})
		// Corners never hold a door.
		.unwrap_or_else(|| room.origin());
	grid.set(position, Tile::Door(DoorState::Closed));
	ExitDoor::new(position)
}

/// The room's wall ring, row by row.
fn ring(room: &Room) -> impl Iterator<Item = TilePoint> + '_ {
	cells(room.bounds).filter(move |coords| {
		coords.x == room.left()
			|| coords.x == room.right()
			|| coords.y == room.top()
			|| coords.y == room.bottom()
	})
}

/// Every cell of `rect`, row by row.
fn cells(rect: TileRectangle) -> impl Iterator<Item = TilePoint> {
	(rect.pos.y..rect.pos.y + rect.size.y).flat_map(move |y| {
		(rect.pos.x..rect.pos.x + rect.size.x)
			.map(move |x| TilePoint::new(x, y))
	})
}

fn clear_of_doors(room: &Room, coords: TilePoint) -> bool {
	room.doors().all(|door| door.chebyshev_distance(coords) > 1)
}

/// Scatters keys over reachable floor, one per room before doubling up,
/// avoiding the spawn room unless it's the only one.
fn place_keys(
	layout: &Layout,
	grid: &Grid,
	reachable: &DijkstraMap,
	spawn: TilePoint,
	count: u32,
	rng: &mut Pcg32,
) -> Vec<Key> {
	let mut rooms: Vec<usize> = (1..layout.rooms.len()).collect();
	if rooms.is_empty() {
		rooms.push(0);
	}
	rooms.shuffle(rng);

	let mut keys: Vec<Key> = Vec::new();
	for room in rooms.iter().cycle().take(count as usize) {
		let free: Vec<TilePoint> = cells(layout.rooms[*room].interior())
			.filter(|coords| {
				*coords != spawn
					&& matches!(grid.get(*coords), Some(Tile::Floor { .. }))
					&& reachable.is_reachable(*coords)
					&& keys.iter().all(|key| key.position != *coords)
			})
			.collect();
		match free.choose(rng) {
			Some(coords) => keys.push(Key::new(*coords)),
			None => log::warn!("No free floor for a key in room {room}"),
		}
	}
	keys
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;

	use super::*;
	use crate::light::LightShape;

	fn dungeon(seed: u64, level: u32) -> Dungeon {
		let settings = Settings::default();
		let mut rng = Pcg32::seed_from_u64(seed);
		Dungeon::generate(level, Difficulty::Normal, &settings, &mut rng)
			.unwrap()
	}

	#[test]
	fn test_keys_and_exit_are_placed() {
		for seed in 0..10 {
			let dungeon = dungeon(seed, 6);
			assert_eq!(dungeon.key_positions().len(), 3);
			let reachable = DijkstraMap::new([dungeon.spawn()], |coords| {
				!dungeon.grid().is_passable(coords)
			});
			for key in dungeon.key_positions() {
				assert!(reachable.is_reachable(key));
				assert_ne!(key, dungeon.spawn());
			}
			assert_eq!(
				dungeon.grid().get(dungeon.exit_position()),
				Some(Tile::Door(DoorState::Closed))
			);
			assert!(!dungeon.exit().opened);
		}
	}

	#[test]
	fn test_exit_in_a_cramped_room_stays_off_the_spawn() {
		let mut settings = Settings::default();
		settings.rooms.min_width = 3;
		settings.rooms.max_width = 3;
		settings.rooms.min_height = 3;
		settings.rooms.max_height = 3;
		settings.rooms.max_area = 9;
		settings.rooms.min_rooms = 1;
		settings.rooms.max_rooms = 1;
		settings.rooms.door_padding = 1;
		for seed in 0..5 {
			let mut rng = Pcg32::seed_from_u64(seed);
			let dungeon =
				Dungeon::generate(1, Difficulty::Normal, &settings, &mut rng)
					.unwrap();
			let room = &dungeon.layout().rooms[0];
			let exit = dungeon.exit_position();
			// Too narrow for the top wall, so another wall takes the exit.
			assert_ne!(exit, dungeon.spawn());
			assert!(room.side_of(exit).is_some());
			assert!(matches!(
				dungeon.grid().get(dungeon.spawn()),
				Some(Tile::Floor { .. })
			));
			assert!(dungeon.keys().is_empty());
		}
	}

	#[test]
	fn test_exit_sits_on_a_wall_clear_of_doors() {
		for seed in 0..5 {
			let dungeon = dungeon(seed, 1);
			let exit = dungeon.exit_position();
			let layout = dungeon.layout();
			let room = &layout.rooms[layout.room_at(exit).unwrap()];
			assert!(room.side_of(exit).is_some());
			assert!(clear_of_doors(room, exit));
		}
	}

	#[test]
	fn test_spawn_is_on_open_floor() {
		let dungeon = dungeon(3, 1);
		assert!(dungeon.grid().is_passable(dungeon.spawn()));
		assert_eq!(dungeon.layout().room_at(dungeon.spawn()), Some(0));
	}

	#[test]
	fn test_opening_the_exit_rebuilds_obstacles() {
		let mut dungeon = dungeon(5, 1);
		let exit = dungeon.exit_position();
		let before = dungeon.obstacle_segments().to_vec();
		dungeon.open_exit();
		assert_eq!(dungeon.grid().get(exit), Some(Tile::Door(DoorState::Open)));
		assert!(!dungeon.grid().is_opaque(exit));
		assert_ne!(before, dungeon.obstacle_segments());
	}

	#[test]
	fn test_reveal_remembers_the_lit_room() {
		let mut dungeon = dungeon(2, 1);
		let spawn = dungeon.spawn();
		let viewpoint = Viewpoint {
			position: spawn.center(),
			facing: 0.0,
			shape: LightShape::Circle { radius: 3.0 },
		};
		assert!(!dungeon.is_explored(spawn));
		dungeon.reveal(&viewpoint);
		assert!(dungeon.is_explored(spawn));
		assert!(dungeon.is_explored(spawn + crate::geometry::TILE_RIGHT));
		assert!(!dungeon.is_explored(TilePoint::new(0, 0)));
	}
}
