use std::collections::HashSet;

use num_rational::Rational32;

use crate::geometry::{TilePoint, TileVector};

/// Steps through the tiles of a Bresenham line.
struct Line {
	current: TilePoint,
	end: TilePoint,
	delta: TileVector,
	step: TileVector,
	error: i32,
	done: bool,
}

impl Iterator for Line {
	type Item = TilePoint;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}
		let result = self.current;
		if self.current == self.end {
			self.done = true;
			return Some(result);
		}
		let doubled = 2 * self.error;
		if doubled >= self.delta.y {
			self.error += self.delta.y;
			self.current.x += self.step.x;
		}
		if doubled <= self.delta.x {
			self.error += self.delta.x;
			self.current.y += self.step.y;
		}
		Some(result)
	}
}

/// The tiles on the segment from `start` to `end` inclusive.
pub fn line_between(
	start: TilePoint,
	end: TilePoint,
) -> impl Iterator<Item = TilePoint> {
	let offset = end - start;
	let delta = TileVector::new(offset.x.abs(), -offset.y.abs());
	Line {
		current: start,
		end,
		delta,
		step: TileVector::new(offset.x.signum(), offset.y.signum()),
		error: delta.x + delta.y,
		done: false,
	}
}

/// The tiles visible from `origin` within `radius` tiles (Euclidean, measured
/// between tile centres), blocked wherever `is_blocking` returns true.
///
/// Symmetric shadowcasting with diamond-shaped walls, after
/// https://www.albertford.com/shadowcasting/. Blocking tiles bordering a lit
/// area are included, so walls of the room the viewer stands in show up.
pub fn visible_tiles(
	origin: TilePoint,
	radius: i32,
	is_blocking: impl Fn(TilePoint) -> bool,
) -> HashSet<TilePoint> {
	let mut visible = HashSet::from([origin]);
	let in_range = |depth: i32, column: i32| {
		depth * depth + column * column <= radius * radius
	};

	// Each quadrant maps (depth, column) onto grid offsets from the origin.
	let quadrants: [fn(i32, i32) -> TileVector; 4] = [
		|depth, column| TileVector::new(column, -depth),
		|depth, column| TileVector::new(column, depth),
		|depth, column| TileVector::new(depth, column),
		|depth, column| TileVector::new(-depth, column),
	];
	for transform in quadrants {
		let tile = |depth: i32, column: i32| origin + transform(depth, column);

		let mut rows = vec![Row {
			depth: 1,
			start_slope: Rational32::from(-1),
			end_slope: Rational32::from(1),
		}];
		while let Some(mut row) = rows.pop() {
			if row.depth > radius {
				continue;
			}
			// Whether the previous tile in this row blocked sight, if any.
			let mut previous_blocked: Option<bool> = None;
			for column in row.min_column()..=row.max_column() {
				let blocked = is_blocking(tile(row.depth, column));
				if in_range(row.depth, column)
					&& (blocked || row.is_symmetric(column))
				{
					visible.insert(tile(row.depth, column));
				}
				match (previous_blocked, blocked) {
					(Some(false), true) => rows.push(Row {
						depth: row.depth + 1,
						end_slope: tangent_slope(row.depth, column),
						..row
					}),
					(Some(true), false) => {
						row.start_slope = tangent_slope(row.depth, column);
					}
					_ => {}
				}
				previous_blocked = Some(blocked);
			}
			if previous_blocked == Some(false) {
				rows.push(Row {
					depth: row.depth + 1,
					..row
				});
			}
		}
	}

	visible
}

/// A span of one row of a quadrant, bounded by two slopes from the origin.
#[derive(Clone, Copy)]
struct Row {
	depth: i32,
	start_slope: Rational32,
	end_slope: Rational32,
}

impl Row {
	fn min_column(&self) -> i32 {
		// Round half up.
		(self.start_slope * self.depth + Rational32::new(1, 2))
			.floor()
			.to_integer()
	}

	fn max_column(&self) -> i32 {
		// Round half down.
		(self.end_slope * self.depth - Rational32::new(1, 2))
			.ceil()
			.to_integer()
	}

	/// Whether the centre of the tile at `column` lies within the span.
	fn is_symmetric(&self, column: i32) -> bool {
		let column = Rational32::from(column);
		column >= self.start_slope * self.depth
			&& column <= self.end_slope * self.depth
	}
}

/// Slope to the far tangent of the diamond-shaped wall at (`depth`,
/// `column`).
fn tangent_slope(depth: i32, column: i32) -> Rational32 {
	Rational32::new(2 * column - 1, 2 * depth)
}
