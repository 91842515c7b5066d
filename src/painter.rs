use rand::{distributions::WeightedIndex, prelude::Distribution};
use rand_pcg::Pcg32;

use crate::{
	error::GenerationFailure,
	geometry::{
		TilePoint, TileVector, TILE_DOWN, TILE_LEFT, TILE_RIGHT, TILE_UP,
	},
	grid::{Corner, Grid, Side, Tile},
	room::{Layout, Room},
	settings::TileWeights,
};

/// Paints layouts using weighted decoration tables.
#[derive(Debug, Clone)]
pub struct TilePainter {
	floor: WeightedIndex<u32>,
	wall_top: WeightedIndex<u32>,
	wall_bottom: WeightedIndex<u32>,
	wall_left: WeightedIndex<u32>,
	wall_right: WeightedIndex<u32>,
}

impl TilePainter {
	pub fn new(
		weights: &TileWeights,
	) -> Result<TilePainter, GenerationFailure> {
		let table = |name: &str, weights: &[u32]| {
			WeightedIndex::new(weights).map_err(|e| {
				GenerationFailure::InvalidParameters(format!(
					"{name} weights {weights:?}: {e}"
				))
			})
		};
		Ok(TilePainter {
			floor: table("floor", &weights.floor)?,
			wall_top: table("top wall", &weights.wall_top)?,
			wall_bottom: table("bottom wall", &weights.wall_bottom)?,
			wall_left: table("left wall", &weights.wall_left)?,
			wall_right: table("right wall", &weights.wall_right)?,
		})
	}

	fn wall(&self, side: Side, rng: &mut Pcg32) -> Tile {
		let table = match side {
			Side::Top => &self.wall_top,
			Side::Bottom => &self.wall_bottom,
			Side::Left => &self.wall_left,
			Side::Right => &self.wall_right,
		};
		Tile::Wall {
			side,
			variant: variant(table, rng),
		}
	}

	/// Paints `layout` onto a fresh grid: rooms, then corridors, then the
	/// breaches where doors cut through walls.
	pub fn paint(&self, layout: &Layout, rng: &mut Pcg32) -> Grid {
		let mut grid = Grid::new(layout.width, layout.height);

		for room in &layout.rooms {
			self.paint_room(&mut grid, room, rng);
		}

		for corridor in &layout.corridors {
			for cell in &corridor.cells {
				grid.set(*cell, Tile::Corridor);
				for (offset, side) in corridor.flanks() {
					grid.set(*cell + offset, self.wall(side, rng));
				}
			}
		}

		// Doors last, so nothing painted afterwards can seal a breach.
		for room in &layout.rooms {
			for door in room.doors() {
				let Some(side) = room.side_of(door) else {
					continue;
				};
				grid.set(door, Tile::Empty);
				for (offset, corner) in breach_flanks(side) {
					grid.set(door + offset, Tile::CorridorCorner(corner));
				}
			}
		}

		log::trace!("Painted {}x{} grid:\n{grid}", grid.width(), grid.height());
		grid
	}

	fn paint_room(&self, grid: &mut Grid, room: &Room, rng: &mut Pcg32) {
		let interior = room.interior();
		for y in interior.pos.y..interior.pos.y + interior.size.y {
			for x in interior.pos.x..interior.pos.x + interior.size.x {
				let variant = variant(&self.floor, rng);
				grid.set(TilePoint::new(x, y), Tile::Floor { variant });
			}
		}

		for x in room.left() + 1..room.right() {
			grid.set(TilePoint::new(x, room.top()), self.wall(Side::Top, rng));
			grid.set(
				TilePoint::new(x, room.bottom()),
				self.wall(Side::Bottom, rng),
			);
		}
		for y in room.top() + 1..room.bottom() {
			grid.set(
				TilePoint::new(room.left(), y),
				self.wall(Side::Left, rng),
			);
			grid.set(
				TilePoint::new(room.right(), y),
				self.wall(Side::Right, rng),
			);
		}

		let corners = [
			(TilePoint::new(room.left(), room.top()), Corner::TopLeft),
			(TilePoint::new(room.right(), room.top()), Corner::TopRight),
			(TilePoint::new(room.left(), room.bottom()), Corner::BottomLeft),
			(TilePoint::new(room.right(), room.bottom()), Corner::BottomRight),
		];
		for (coords, corner) in corners {
			grid.set(coords, Tile::WallCorner(corner));
		}
	}
}

fn variant(table: &WeightedIndex<u32>, rng: &mut Pcg32) -> u8 {
	table.sample(rng) as u8
}

/// The wall cells on either side of a door on the given side of its room,
/// and the corner tile each one becomes.
fn breach_flanks(side: Side) -> [(TileVector, Corner); 2] {
	match side {
		Side::Left => [
			(TILE_UP, Corner::TopRight),
			(TILE_DOWN, Corner::BottomRight),
		],
		Side::Right => [
			(TILE_UP, Corner::TopLeft),
			(TILE_DOWN, Corner::BottomLeft),
		],
		Side::Bottom => [
			(TILE_LEFT, Corner::BottomRight),
			(TILE_RIGHT, Corner::BottomLeft),
		],
		Side::Top => [
			(TILE_LEFT, Corner::TopRight),
			(TILE_RIGHT, Corner::TopLeft),
		],
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;

	use super::*;
	use crate::{
		generator::{self, GenerationParams},
		geometry::TileRectangle,
		room::{Axis, Corridor},
		settings::RoomSettings,
	};

	fn two_rooms() -> Layout {
		let mut left = Room::new(TileRectangle::new(
			TilePoint::new(1, 1),
			TileVector::new(8, 8),
		));
		let mut right = Room::new(TileRectangle::new(
			TilePoint::new(12, 1),
			TileVector::new(8, 8),
		));
		let doors = (TilePoint::new(8, 4), TilePoint::new(12, 4));
		left.add_door(doors.0);
		right.add_door(doors.1);
		Layout {
			width: 21,
			height: 10,
			rooms: vec![left, right],
			corridors: vec![Corridor {
				rooms: (0, 1),
				doors,
				axis: Axis::Horizontal,
				cells: (9..12).map(|x| TilePoint::new(x, 4)).collect(),
			}],
		}
	}

	#[test]
	fn test_rooms_corridors_and_breaches() {
		let painter = TilePainter::new(&TileWeights::default()).unwrap();
		let grid = painter.paint(&two_rooms(), &mut Pcg32::seed_from_u64(0));

		assert_eq!(
			grid.get(TilePoint::new(1, 1)),
			Some(Tile::WallCorner(Corner::TopLeft))
		);
		assert!(matches!(
			grid.get(TilePoint::new(4, 1)),
			Some(Tile::Wall { side: Side::Top, .. })
		));
		assert!(matches!(
			grid.get(TilePoint::new(1, 5)),
			Some(Tile::Wall { side: Side::Left, .. })
		));
		assert!(matches!(
			grid.get(TilePoint::new(4, 4)),
			Some(Tile::Floor { .. })
		));
		assert_eq!(grid.get(TilePoint::new(0, 0)), Some(Tile::Ground));

		// Corridor and its flanking walls.
		assert_eq!(grid.get(TilePoint::new(10, 4)), Some(Tile::Corridor));
		assert!(matches!(
			grid.get(TilePoint::new(10, 3)),
			Some(Tile::Wall { side: Side::Top, .. })
		));
		assert!(matches!(
			grid.get(TilePoint::new(10, 5)),
			Some(Tile::Wall { side: Side::Bottom, .. })
		));

		// Breaches on the right wall of one room and the left of the other.
		for door in [TilePoint::new(8, 4), TilePoint::new(12, 4)] {
			assert_eq!(grid.get(door), Some(Tile::Empty));
			assert!(!grid.is_opaque(door));
		}
		assert_eq!(
			grid.get(TilePoint::new(8, 3)),
			Some(Tile::CorridorCorner(Corner::TopLeft))
		);
		assert_eq!(
			grid.get(TilePoint::new(8, 5)),
			Some(Tile::CorridorCorner(Corner::BottomLeft))
		);
		assert_eq!(
			grid.get(TilePoint::new(12, 3)),
			Some(Tile::CorridorCorner(Corner::TopRight))
		);
		assert_eq!(
			grid.get(TilePoint::new(12, 5)),
			Some(Tile::CorridorCorner(Corner::BottomRight))
		);
	}

	#[test]
	fn test_vertical_breach_flanks() {
		assert_eq!(
			breach_flanks(Side::Bottom),
			[(TILE_LEFT, Corner::BottomRight), (TILE_RIGHT, Corner::BottomLeft)]
		);
		assert_eq!(
			breach_flanks(Side::Top),
			[(TILE_LEFT, Corner::TopRight), (TILE_RIGHT, Corner::TopLeft)]
		);
	}

	#[test]
	fn test_heaviest_floor_variant_dominates() {
		let painter = TilePainter::new(&TileWeights::default()).unwrap();
		let grid = painter.paint(&two_rooms(), &mut Pcg32::seed_from_u64(9));
		let mut counts = [0; 3];
		for (_, tile) in grid.iter() {
			if let Tile::Floor { variant } = tile {
				counts[variant as usize] += 1;
			}
		}
		assert!(counts[0] > counts[1] + counts[2]);
	}

	#[test]
	fn test_empty_weight_table_is_rejected() {
		let weights = TileWeights {
			floor: Vec::new(),
			..TileWeights::default()
		};
		assert!(matches!(
			TilePainter::new(&weights),
			Err(GenerationFailure::InvalidParameters(_))
		));
	}

	#[test]
	fn test_generated_breaches_stay_open_across_repaints() {
		let painter = TilePainter::new(&TileWeights::default()).unwrap();
		let params = GenerationParams {
			size: TileVector::new(50, 50),
			rooms: RoomSettings::default(),
		};
		for seed in 0..10 {
			let mut rng = Pcg32::seed_from_u64(seed);
			let layout = generator::generate(&params, &mut rng).unwrap();
			for _ in 0..2 {
				let grid = painter.paint(&layout, &mut rng);
				for room in &layout.rooms {
					for door in room.doors() {
						assert_eq!(grid.get(door), Some(Tile::Empty));
					}
				}
				for corridor in &layout.corridors {
					for cell in &corridor.cells {
						assert_eq!(grid.get(*cell), Some(Tile::Corridor));
					}
				}
			}
		}
	}
}
