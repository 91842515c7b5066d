use crate::{
	geometry::{TilePoint, TileRectangle, TileVector},
	grid::Side,
};

/// An axis-aligned room. Its bounds include the surrounding ring of walls.
#[derive(Clone, Debug)]
pub struct Room {
	pub bounds: TileRectangle,
	/// Door locations as offsets from the room's top-left corner.
	doors: Vec<TileVector>,
}

impl Room {
	pub fn new(bounds: TileRectangle) -> Room {
		Room {
			bounds,
			doors: Vec::new(),
		}
	}

	pub fn left(&self) -> i32 {
		self.bounds.pos.x
	}

	pub fn top(&self) -> i32 {
		self.bounds.pos.y
	}

	pub fn right(&self) -> i32 {
		self.bounds.pos.x + self.bounds.size.x - 1
	}

	pub fn bottom(&self) -> i32 {
		self.bounds.pos.y + self.bounds.size.y - 1
	}

	pub fn width(&self) -> i32 {
		self.bounds.size.x
	}

	pub fn height(&self) -> i32 {
		self.bounds.size.y
	}

	pub fn origin(&self) -> TilePoint {
		self.bounds.pos
	}

	/// The floor inside the wall ring.
	pub fn interior(&self) -> TileRectangle {
		TileRectangle::new(
			self.bounds.pos + TileVector::new(1, 1),
			self.bounds.size - TileVector::new(2, 2),
		)
	}

	/// The interior tile nearest the room's centre.
	pub fn center(&self) -> TilePoint {
		TilePoint::new(
			self.left() + (self.width() - 1) / 2,
			self.top() + (self.height() - 1) / 2,
		)
	}

	pub fn door_locations(&self) -> &[TileVector] {
		&self.doors
	}

	/// Door locations in grid coordinates.
	pub fn doors(&self) -> impl Iterator<Item = TilePoint> + '_ {
		self.doors.iter().map(|offset| self.origin() + *offset)
	}

	pub fn add_door(&mut self, coords: TilePoint) {
		debug_assert!(
			self.side_of(coords).is_some(),
			"door at {coords:?} is not on a wall of {:?}",
			self.bounds
		);
		self.doors.push(coords - self.origin());
	}

	/// The wall that `coords` lies on, excluding corners.
	pub fn side_of(&self, coords: TilePoint) -> Option<Side> {
		let offset = coords - self.origin();
		let along_x = (1..self.width() - 1).contains(&offset.x);
		let along_y = (1..self.height() - 1).contains(&offset.y);
		if along_y && offset.x == 0 {
			Some(Side::Left)
		} else if along_y && offset.x == self.width() - 1 {
			Some(Side::Right)
		} else if along_x && offset.y == 0 {
			Some(Side::Top)
		} else if along_x && offset.y == self.height() - 1 {
			Some(Side::Bottom)
		} else {
			None
		}
	}

	/// Whether a door at `coords` keeps `padding` cells from the ends of its
	/// wall and stays more than `padding` cells from every existing door.
	pub fn accepts_door(&self, coords: TilePoint, padding: i32) -> bool {
		let Some(side) = self.side_of(coords) else {
			return false;
		};
		let offset = coords - self.origin();
		let (along, length) = match side {
			Side::Left | Side::Right => (offset.y, self.height()),
			Side::Top | Side::Bottom => (offset.x, self.width()),
		};
		along >= padding
			&& along <= length - 1 - padding
			&& self
				.doors()
				.all(|door| door.chebyshev_distance(coords) > padding)
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
	/// The corridor runs along x between rooms side by side.
	Horizontal,
	/// The corridor runs along y between stacked rooms.
	Vertical,
}

/// A straight corridor between doors on two rooms.
#[derive(Clone, Debug)]
pub struct Corridor {
	/// Indices of the joined rooms.
	pub rooms: (usize, usize),
	/// The door cells on each room's wall, in the same order as `rooms`.
	pub doors: (TilePoint, TilePoint),
	pub axis: Axis,
	/// Cells strictly between the two doors.
	pub cells: Vec<TilePoint>,
}

impl Corridor {
	/// The corridor cells plus the wall cells on both sides of them.
	pub fn footprint(&self) -> TileRectangle {
		let (first, last) = match (self.cells.first(), self.cells.last()) {
			(Some(first), Some(last)) => (*first, *last),
			_ => (self.doors.0, self.doors.0),
		};
		let min = TilePoint::new(first.x.min(last.x), first.y.min(last.y));
		let max = TilePoint::new(first.x.max(last.x), first.y.max(last.y));
		let cells = TileRectangle::new(
			min,
			max - min + TileVector::new(1, 1),
		);
		match self.axis {
			Axis::Horizontal => TileRectangle::new(
				cells.pos - TileVector::new(0, 1),
				cells.size + TileVector::new(0, 2),
			),
			Axis::Vertical => TileRectangle::new(
				cells.pos - TileVector::new(1, 0),
				cells.size + TileVector::new(2, 0),
			),
		}
	}

	/// The side walls flanking each cell, as (offset, facing) pairs.
	pub fn flanks(&self) -> [(TileVector, Side); 2] {
		match self.axis {
			Axis::Horizontal => [
				(TileVector::new(0, -1), Side::Top),
				(TileVector::new(0, 1), Side::Bottom),
			],
			Axis::Vertical => [
				(TileVector::new(-1, 0), Side::Left),
				(TileVector::new(1, 0), Side::Right),
			],
		}
	}
}

/// The generated room graph: rooms are nodes, corridors are edges.
#[derive(Clone, Debug)]
pub struct Layout {
	pub width: i32,
	pub height: i32,
	pub rooms: Vec<Room>,
	pub corridors: Vec<Corridor>,
}

impl Layout {
	/// Whether every room can reach every other room through corridors.
	pub fn is_connected(&self) -> bool {
		let mut sets = crate::disjoint_sets::DisjointSets::new(self.rooms.len());
		for corridor in &self.corridors {
			sets.merge(corridor.rooms.0, corridor.rooms.1);
		}
		self.rooms.is_empty() || sets.size_of(0) == self.rooms.len()
	}

	/// The index of the room whose bounds contain `coords`.
	pub fn room_at(&self, coords: TilePoint) -> Option<usize> {
		self.rooms
			.iter()
			.position(|room| room.bounds.contains(coords))
	}
}
