use crate::{
	geometry::{Segment, TilePoint, WorldPoint},
	grid::Grid,
};

/// Extracts the boundary between opaque and transparent tiles as merged
/// segments, each oriented with its transparent side along
/// [`Segment::open_normal`].
///
/// Cells outside the grid count as opaque, so open tiles on the border are
/// closed off by the grid edge.
pub fn obstacle_segments(grid: &Grid) -> Vec<Segment> {
	let mut segments = Vec::new();
	let opaque = |x: i32, y: i32| grid.is_opaque(TilePoint::new(x, y));
	let point = |x: i32, y: i32| WorldPoint::new(x as f32, y as f32);

	// Horizontal boundaries, on the line between rows y - 1 and y.
	for y in 0..=grid.height() {
		let mut open_above: Option<i32> = None;
		let mut open_below: Option<i32> = None;
		for x in 0..=grid.width() {
			let above = x < grid.width() && opaque(x, y) && !opaque(x, y - 1);
			let below = x < grid.width() && opaque(x, y - 1) && !opaque(x, y);
			match (open_above, above) {
				(None, true) => open_above = Some(x),
				(Some(start), false) => {
					segments.push(Segment::new(point(start, y), point(x, y)));
					open_above = None;
				}
				_ => {}
			}
			match (open_below, below) {
				(None, true) => open_below = Some(x),
				(Some(start), false) => {
					segments.push(Segment::new(point(x, y), point(start, y)));
					open_below = None;
				}
				_ => {}
			}
		}
	}

	// Vertical boundaries, on the line between columns x - 1 and x.
	for x in 0..=grid.width() {
		let mut open_left: Option<i32> = None;
		let mut open_right: Option<i32> = None;
		for y in 0..=grid.height() {
			let left = y < grid.height() && opaque(x, y) && !opaque(x - 1, y);
			let right = y < grid.height() && opaque(x - 1, y) && !opaque(x, y);
			match (open_left, left) {
				(None, true) => open_left = Some(y),
				(Some(start), false) => {
					segments.push(Segment::new(point(x, y), point(x, start)));
					open_left = None;
				}
				_ => {}
			}
			match (open_right, right) {
				(None, true) => open_right = Some(y),
				(Some(start), false) => {
					segments.push(Segment::new(point(x, start), point(x, y)));
					open_right = None;
				}
				_ => {}
			}
		}
	}

	segments
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::grid::Tile;

	/// A 4x4 grid with a 2x2 floor in the middle.
	fn pocket() -> Grid {
		let mut grid = Grid::new(4, 4);
		for y in 1..3 {
			for x in 1..3 {
				grid.set(TilePoint::new(x, y), Tile::Floor { variant: 0 });
			}
		}
		grid
	}

	#[test]
	fn test_pocket_is_enclosed_by_four_segments() {
		let segments = obstacle_segments(&pocket());
		assert_eq!(segments.len(), 4);
		let p = |x: f32, y: f32| WorldPoint::new(x, y);
		// Each boundary is merged across both cells and faces into the pocket.
		assert!(segments.contains(&Segment::new(p(3.0, 1.0), p(1.0, 1.0))));
		assert!(segments.contains(&Segment::new(p(1.0, 3.0), p(3.0, 3.0))));
		assert!(segments.contains(&Segment::new(p(1.0, 1.0), p(1.0, 3.0))));
		assert!(segments.contains(&Segment::new(p(3.0, 3.0), p(3.0, 1.0))));

		let centre = p(2.0, 2.0);
		for segment in &segments {
			let midpoint = segment.start + segment.direction() * 0.5;
			let inward = (centre - midpoint).dot(segment.open_normal());
			assert!(inward > 0.0, "{segment:?} faces away from the floor");
		}
	}

	#[test]
	fn test_open_border_is_closed_by_the_grid_edge() {
		let mut grid = Grid::new(2, 1);
		grid.set(TilePoint::new(0, 0), Tile::Corridor);
		grid.set(TilePoint::new(1, 0), Tile::Corridor);
		let segments = obstacle_segments(&grid);
		// Top, bottom, left and right edges of the 2x1 strip.
		assert_eq!(segments.len(), 4);
		assert!(segments.iter().all(|s| s.validate().is_ok()));
	}

	#[test]
	fn test_solid_grid_has_no_segments() {
		assert!(obstacle_segments(&Grid::new(5, 5)).is_empty());
	}
}
