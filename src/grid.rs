use std::fmt;

use crate::geometry::TilePoint;

/// Which edge of a room (or side of a corridor) a wall faces.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Side {
	Top,
	Bottom,
	Left,
	Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Corner {
	TopLeft,
	TopRight,
	BottomLeft,
	BottomRight,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DoorState {
	Open,
	Closed,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Tile {
	/// Undecorated base, and the void between rooms.
	Ground,
	/// Room floor, one of several weighted decorative variants.
	Floor { variant: u8 },
	Corridor,
	Wall { side: Side, variant: u8 },
	WallCorner(Corner),
	/// Marks where a corridor breaches a room's wall.
	CorridorCorner(Corner),
	/// The level's exit door.
	Door(DoorState),
	/// A breached wall cell. Passable and transparent.
	Empty,
}

impl Tile {
	/// Whether this tile blocks light.
	pub fn is_opaque(self) -> bool {
		match self {
			Tile::Ground
			| Tile::Wall { .. }
			| Tile::WallCorner(_)
			| Tile::CorridorCorner(_)
			| Tile::Door(DoorState::Closed) => true,
			Tile::Floor { .. }
			| Tile::Corridor
			| Tile::Empty
			| Tile::Door(DoorState::Open) => false,
		}
	}

	/// Whether a body may stand on this tile.
	pub fn is_passable(self) -> bool {
		!self.is_opaque()
	}

	fn glyph(self) -> char {
		match self {
			Tile::Ground => ' ',
			Tile::Floor { variant: 0 } => '.',
			Tile::Floor { .. } => ',',
			Tile::Corridor => ':',
			Tile::Wall {
				side: Side::Top | Side::Bottom,
				..
			} => '-',
			Tile::Wall { .. } => '|',
			Tile::WallCorner(_) => '+',
			Tile::CorridorCorner(_) => '*',
			Tile::Door(DoorState::Closed) => 'D',
			Tile::Door(DoorState::Open) => 'd',
			Tile::Empty => '_',
		}
	}
}

/// A dense `width × height` grid of tiles with the origin at the top left.
#[derive(Clone, Debug)]
pub struct Grid {
	width: i32,
	height: i32,
	tiles: Vec<Tile>,
}

impl Grid {
	/// Creates a grid filled with [`Tile::Ground`].
	pub fn new(width: i32, height: i32) -> Grid {
		Grid {
			width,
			height,
			tiles: vec![Tile::Ground; (width.max(0) * height.max(0)) as usize],
		}
	}

	pub fn width(&self) -> i32 {
		self.width
	}

	pub fn height(&self) -> i32 {
		self.height
	}

	#[inline]
	pub fn in_bounds(&self, coords: TilePoint) -> bool {
		(0..self.width).contains(&coords.x)
			&& (0..self.height).contains(&coords.y)
	}

	#[inline]
	fn index(&self, coords: TilePoint) -> usize {
		(coords.y * self.width + coords.x) as usize
	}

	/// The tile at `coords`, or `None` outside the grid.
	pub fn get(&self, coords: TilePoint) -> Option<Tile> {
		self.in_bounds(coords)
			.then(|| self.tiles[self.index(coords)])
	}

	/// Sets the tile at `coords`. Writing outside the grid is a logic error:
	/// it panics in debug builds and is ignored in release builds.
	pub fn set(&mut self, coords: TilePoint, tile: Tile) {
		debug_assert!(
			self.in_bounds(coords),
			"tile write at {coords:?} outside {}x{} grid",
			self.width,
			self.height
		);
		if self.in_bounds(coords) {
			let index = self.index(coords);
			self.tiles[index] = tile;
		}
	}

	/// Out-of-bounds cells count as opaque.
	pub fn is_opaque(&self, coords: TilePoint) -> bool {
		self.get(coords).map_or(true, Tile::is_opaque)
	}

	pub fn is_passable(&self, coords: TilePoint) -> bool {
		self.get(coords).is_some_and(Tile::is_passable)
	}

	/// All coordinates with their tiles, row by row.
	pub fn iter(&self) -> impl Iterator<Item = (TilePoint, Tile)> + '_ {
		self.tiles.iter().enumerate().map(|(i, tile)| {
			let i = i as i32;
			(TilePoint::new(i % self.width, i / self.width), *tile)
		})
	}
}

/// Renders the grid as ASCII, one row per line.
impl fmt::Display for Grid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for row in self.tiles.chunks(self.width.max(1) as usize) {
			let line: String = row.iter().map(|tile| tile.glyph()).collect();
			writeln!(f, "{}", line.trim_end())?;
		}
		Ok(())
	}
}
