use rand::{
	seq::{IteratorRandom, SliceRandom},
	Rng,
};
use rand_pcg::Pcg32;

use crate::{
	disjoint_sets::DisjointSets,
	error::GenerationFailure,
	geometry::{
		RectangleIntersection, TileIntersection, TilePoint, TileRectangle,
		TileVector,
	},
	grid::Side,
	room::{Axis, Corridor, Layout, Room},
	settings::RoomSettings,
	vision,
};

/// Everything the generator needs to lay out one level.
#[derive(Debug, Clone)]
pub struct GenerationParams {
	/// Grid width and height in tiles.
	pub size: TileVector,
	pub rooms: RoomSettings,
}

impl GenerationParams {
	/// Rejects parameters that no layout could ever satisfy.
	pub fn validate(&self) -> Result<(), GenerationFailure> {
		let r = &self.rooms;
		let invalid = |reason: String| {
			Err(GenerationFailure::InvalidParameters(reason))
		};
		if r.door_padding < 1 {
			return invalid(format!(
				"door padding must be at least 1, got {}",
				r.door_padding
			));
		}
		let min_side = 2 * r.door_padding + 1;
		if r.min_width < min_side || r.min_height < min_side {
			return invalid(format!(
				"rooms must be at least {min_side} tiles wide and tall to fit a padded door"
			));
		}
		if r.min_width > r.max_width || r.min_height > r.max_height {
			return invalid("minimum room size exceeds maximum".to_string());
		}
		if r.min_width * r.min_height > r.max_area {
			return invalid(format!(
				"the smallest room ({}x{}) exceeds the maximum area {}",
				r.min_width, r.min_height, r.max_area
			));
		}
		if r.min_corridor_length < 1
			|| r.min_corridor_length > r.max_corridor_length
		{
			return invalid(format!(
				"corridor lengths {}..={} must be a nonempty range starting at 1 or more",
				r.min_corridor_length, r.max_corridor_length
			));
		}
		if r.min_rooms < 1 || r.min_rooms > r.max_rooms {
			return invalid(format!(
				"room count bounds {}..={} are empty",
				r.min_rooms, r.max_rooms
			));
		}
		if r.max_attempts < 1 {
			return invalid("at least one attempt is required".to_string());
		}
		if !(0.0..=1.0).contains(&r.loop_chance) {
			return invalid(format!(
				"loop chance {} is not a probability",
				r.loop_chance
			));
		}
		if self.size.x < r.min_width || self.size.y < r.min_height {
			return invalid(format!(
				"a {}x{} grid cannot hold a {}x{} room",
				self.size.x, self.size.y, r.min_width, r.min_height
			));
		}
		Ok(())
	}

	/// Looser constraints to retry with after a failure: rooms may shrink to
	/// the smallest size that still fits a padded door, a single room is
	/// enough, and twice as many attempts are allowed.
	pub fn relaxed(&self) -> GenerationParams {
		let mut rooms = self.rooms.clone();
		let min_side = 2 * rooms.door_padding.max(1) + 1;
		rooms.door_padding = rooms.door_padding.max(1);
		rooms.min_width = min_side;
		rooms.min_height = min_side;
		rooms.max_width = rooms.max_width.max(min_side);
		rooms.max_height = rooms.max_height.max(min_side);
		rooms.max_area = rooms.max_area.max(min_side * min_side);
		rooms.min_rooms = 1;
		rooms.max_attempts = rooms.max_attempts.max(1) * 2;
		GenerationParams {
			size: self.size,
			rooms,
		}
	}
}

/// Generates a connected layout, retrying whole layouts up to
/// `max_attempts` times.
///
/// Rooms grow outward from a first room at the centre of the grid, each new
/// room lined up with an existing one so a straight corridor can join them.
/// Corridors are then laid shortest-first over a forest of disjoint sets
/// until every room is reachable.
pub fn generate(
	params: &GenerationParams,
	rng: &mut Pcg32,
) -> Result<Layout, GenerationFailure> {
	params.validate()?;
	let config = &params.rooms;

	let mut most_placed = 0;
	let mut disconnected = false;
	for attempt in 1..=config.max_attempts {
		let rooms = place_rooms(params, rng);
		most_placed = most_placed.max(rooms.len());
		if rooms.len() < config.min_rooms {
			log::debug!(
				"Attempt {attempt}: placed {} of {} required rooms",
				rooms.len(),
				config.min_rooms
			);
			continue;
		}
		match connect_rooms(params, rooms, rng) {
			Some(layout) => {
				log::debug!(
					"Attempt {attempt}: laid out {} rooms and {} corridors",
					layout.rooms.len(),
					layout.corridors.len()
				);
				return Ok(layout);
			}
			None => {
				log::debug!(
					"Attempt {attempt}: some rooms were left unreachable"
				);
				disconnected = true;
			}
		}
	}

	Err(if disconnected {
		GenerationFailure::Disconnected {
			attempts: config.max_attempts,
		}
	} else {
		GenerationFailure::TooFewRooms {
			attempts: config.max_attempts,
			placed: most_placed,
			required: config.min_rooms,
		}
	})
}

/// A random room size within the configured bounds and area cap.
fn random_room_size(config: &RoomSettings, rng: &mut Pcg32) -> TileVector {
	let widest = config.max_width.min(config.max_area / config.min_height);
	let width = rng.gen_range(config.min_width..=widest);
	let tallest = config.max_height.min(config.max_area / width);
	let height = rng.gen_range(config.min_height..=tallest);
	TileVector::new(width, height)
}

/// A random start coordinate for a room of length `len` beside a parent
/// spanning `parent_len` tiles from `parent_pos`, such that the two rooms
/// share at least one tile where both could take a padded door.
fn aligned_offset(
	rng: &mut Pcg32,
	parent_pos: i32,
	parent_len: i32,
	len: i32,
	padding: i32,
) -> i32 {
	let low = parent_pos + 2 * padding - (len - 1);
	let high = parent_pos + parent_len - 1 - 2 * padding;
	rng.gen_range(low..=high)
}

fn place_rooms(params: &GenerationParams, rng: &mut Pcg32) -> Vec<Room> {
	let config = &params.rooms;
	let grid = TileRectangle::new(TilePoint::new(0, 0), params.size);

	// The first room sits at the centre of the grid.
	let size = random_room_size(config, rng);
	let size =
		TileVector::new(size.x.min(grid.size.x), size.y.min(grid.size.y));
	let mut rooms = vec![TileRectangle::new(
		TilePoint::new((grid.size.x - size.x) / 2, (grid.size.y - size.y) / 2),
		size,
	)];

	let mut retries = 0;
	while rooms.len() < config.max_rooms
		&& retries < config.max_placement_retries
	{
		let parent = rooms[rng.gen_range(0..rooms.len())];
		let size = random_room_size(config, rng);
		let gap = rng.gen_range(
			config.min_corridor_length..=config.max_corridor_length,
		);
		let padding = config.door_padding;
		let side = [Side::Top, Side::Bottom, Side::Left, Side::Right]
			.into_iter()
			.choose(rng)
			.unwrap_or(Side::Right);
		let pos = match side {
			Side::Left | Side::Right => {
				let y = aligned_offset(
					rng,
					parent.pos.y,
					parent.size.y,
					size.y,
					padding,
				);
				let x = if side == Side::Right {
					parent.pos.x + parent.size.x + gap
				} else {
					parent.pos.x - gap - size.x
				};
				TilePoint::new(x, y)
			}
			Side::Top | Side::Bottom => {
				let x = aligned_offset(
					rng,
					parent.pos.x,
					parent.size.x,
					size.x,
					padding,
				);
				let y = if side == Side::Bottom {
					parent.pos.y + parent.size.y + gap
				} else {
					parent.pos.y - gap - size.y
				};
				TilePoint::new(x, y)
			}
		};
		let candidate = TileRectangle::new(pos, size);

		// Rooms must fit the grid and keep at least one tile from each other.
		if grid.contains_rectangle(candidate)
			&& !rooms.iter().any(|room| room.touching(candidate))
		{
			rooms.push(candidate);
			retries = 0;
		} else {
			retries += 1;
		}
	}

	rooms.into_iter().map(Room::new).collect()
}

/// A pair of rooms that a straight corridor could join.
struct Edge {
	i: usize,
	j: usize,
	intersection: TileIntersection,
}

/// Joins the closest rooms first until every room is reachable, returning
/// `None` if some rooms can't be joined.
fn connect_rooms(
	params: &GenerationParams,
	mut rooms: Vec<Room>,
	rng: &mut Pcg32,
) -> Option<Layout> {
	let config = &params.rooms;
	let lengths = config.min_corridor_length..=config.max_corridor_length;

	let mut edges = Vec::new();
	for (i, room1) in rooms.iter().enumerate() {
		for (j, room2) in rooms.iter().enumerate().skip(i + 1) {
			let intersection = room1.bounds.intersection(room2.bounds);
			let aligned = matches!(
				intersection,
				RectangleIntersection::Horizontal(_)
					| RectangleIntersection::Vertical(_)
			);
			if aligned && lengths.contains(&intersection.distance()) {
				edges.push(Edge { i, j, intersection });
			}
		}
	}
	// Shuffle before the stable sort so equally distant pairs are joined in
	// random order. Sorted farthest first, so popping yields the closest.
	edges.shuffle(rng);
	edges.sort_by(|e1, e2| {
		e2.intersection.distance().cmp(&e1.intersection.distance())
	});

	let mut connected_rooms = DisjointSets::new(rooms.len());
	let mut corridors: Vec<Corridor> = Vec::new();
	while let Some(Edge { i, j, intersection }) = edges.pop() {
		// Occasionally join rooms that are already connected, for loops.
		if connected_rooms.connected(i, j) && !rng.gen_bool(config.loop_chance)
		{
			continue;
		}
		let Some(corridor) = route_corridor(
			&rooms,
			&corridors,
			(i, j),
			intersection,
			config.door_padding,
			rng,
		) else {
			continue;
		};
		rooms[i].add_door(corridor.doors.0);
		rooms[j].add_door(corridor.doors.1);
		connected_rooms.merge(i, j);
		corridors.push(corridor);
	}

	(connected_rooms.size_of(0) == rooms.len()).then(|| Layout {
		width: params.size.x,
		height: params.size.y,
		rooms,
		corridors,
	})
}

/// Finds a straight corridor between rooms `i` and `j` whose doors respect
/// both rooms' padding and whose footprint is clear of every room and
/// corridor.
fn route_corridor(
	rooms: &[Room],
	corridors: &[Corridor],
	(i, j): (usize, usize),
	intersection: TileIntersection,
	padding: i32,
	rng: &mut Pcg32,
) -> Option<Corridor> {
	let (a, b) = (&rooms[i], &rooms[j]);
	// A vertical gap separates rooms side by side, joined by a horizontal
	// corridor, and vice versa.
	let (axis, gap) = match intersection {
		RectangleIntersection::Vertical(gap) => (Axis::Horizontal, gap),
		RectangleIntersection::Horizontal(gap) => (Axis::Vertical, gap),
		_ => return None,
	};
	let length = intersection.distance();

	// Coordinates across the corridor where both rooms can take a door.
	let (low, high) = match axis {
		Axis::Horizontal => (
			a.top().max(b.top()) + padding,
			a.bottom().min(b.bottom()) - padding,
		),
		Axis::Vertical => (
			a.left().max(b.left()) + padding,
			a.right().min(b.right()) - padding,
		),
	};
	// The walls facing the gap, for room `i` and room `j`.
	let (before, after) = match axis {
		Axis::Horizontal => (gap.pos.x - 1, gap.pos.x + gap.size.x),
		Axis::Vertical => (gap.pos.y - 1, gap.pos.y + gap.size.y),
	};
	let a_first = match axis {
		Axis::Horizontal => a.left() < b.left(),
		Axis::Vertical => a.top() < b.top(),
	};
	let (wall_a, wall_b) = if a_first {
		(before, after)
	} else {
		(after, before)
	};

	let mut candidates: Vec<i32> = (low..=high).collect();
	candidates.shuffle(rng);
	for across in candidates {
		let door = |wall: i32| match axis {
			Axis::Horizontal => TilePoint::new(wall, across),
			Axis::Vertical => TilePoint::new(across, wall),
		};
		let (door_a, door_b) = (door(wall_a), door(wall_b));
		if !a.accepts_door(door_a, padding) || !b.accepts_door(door_b, padding)
		{
			continue;
		}

		let corridor = Corridor {
			rooms: (i, j),
			doors: (door_a, door_b),
			axis,
			cells: vision::line_between(door_a, door_b)
				.skip(1)
				.take(length as usize)
				.collect(),
		};
		let footprint = corridor.footprint();
		let blocked = rooms.iter().any(|room| room.bounds.overlaps(footprint))
			|| corridors
				.iter()
				.any(|other| other.footprint().overlaps(footprint));
		if !blocked {
			return Some(corridor);
		}
	}
	None
}
