use std::f32::consts::{PI, TAU};

use crate::geometry::{wrap_angle, Segment, WorldPoint, WorldVector};

/// Angular offset of the rays cast either side of each obstacle endpoint.
const CORNER_EPSILON: f32 = 1e-4;

/// Distance from a segment under which the origin is nudged off it.
const NUDGE_THRESHOLD: f32 = 1e-3;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LightShape {
	/// A wedge of `half_angle` radians either side of the facing direction.
	Cone { half_angle: f32, max_distance: f32 },
	/// Light in every direction.
	Circle { radius: f32 },
}

impl LightShape {
	pub fn reach(&self) -> f32 {
		match *self {
			LightShape::Cone { max_distance, .. } => max_distance,
			LightShape::Circle { radius } => radius,
		}
	}
}

#[derive(Clone, Copy, Debug)]
pub struct Viewpoint {
	pub position: WorldPoint,
	/// Radians, clockwise from the positive x-axis.
	pub facing: f32,
	pub shape: LightShape,
}

impl Viewpoint {
	/// Whether `point` falls within the light's reach and angle, ignoring
	/// obstacles.
	pub fn covers(&self, point: WorldPoint) -> bool {
		let offset = point - self.position;
		if offset.length() > self.shape.reach() {
			return false;
		}
		match self.shape {
			LightShape::Circle { .. } => true,
			LightShape::Cone { half_angle, .. } => {
				offset.length() <= f32::EPSILON
					|| wrap_angle(offset.angle() - self.facing).abs()
						<= half_angle
			}
		}
	}
}

/// The visible region as a simple polygon, in angular order around the
/// viewpoint. In cone mode the viewpoint itself closes the fan as the last
/// vertex.
#[derive(Clone, Debug, Default)]
pub struct VisiblePolygon {
	pub points: Vec<WorldPoint>,
}

impl VisiblePolygon {
	/// Even-odd point-in-polygon test.
	pub fn contains(&self, point: WorldPoint) -> bool {
		let n = self.points.len();
		let mut inside = false;
		for i in 0..n {
			let a = self.points[i];
			let b = self.points[(i + 1) % n];
			if (a.y > point.y) != (b.y > point.y) {
				let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
				if point.x < x {
					inside = !inside;
				}
			}
		}
		inside
	}
}

#[derive(Clone, Copy, Debug)]
pub struct VisibilityEngine {
	/// Rays per full turn used to approximate arcs.
	pub arc_resolution: usize,
}

impl VisibilityEngine {
	pub fn new(arc_resolution: usize) -> VisibilityEngine {
		VisibilityEngine {
			arc_resolution: arc_resolution.max(4),
		}
	}

	/// Casts rays toward every obstacle endpoint in reach, and just either
	/// side of it to see past corners, plus a fan of rays tracing the arc at
	/// full reach. Each ray stops at the nearest obstacle. Sorted by angle,
	/// the hits form the visible polygon.
	pub fn compute_visible_polygon(
		&self,
		viewpoint: &Viewpoint,
		obstacles: &[Segment],
	) -> VisiblePolygon {
		let segments: Vec<Segment> = obstacles
			.iter()
			.filter(|segment| match segment.validate() {
				Ok(()) => true,
				Err(e) => {
					log::debug!("Skipping obstacle: {e}");
					false
				}
			})
			.copied()
			.collect();

		let origin = nudge_origin(viewpoint.position, &segments);
		let reach = viewpoint.shape.reach().max(0.0);
		let (center, half, is_cone) = match viewpoint.shape {
			LightShape::Cone { half_angle, .. } => {
				(viewpoint.facing, half_angle.clamp(0.0, PI), true)
			}
			LightShape::Circle { .. } => (0.0, PI, false),
		};

		// Ray angles relative to `center`.
		let mut angles = Vec::new();
		let step = TAU / self.arc_resolution as f32;
		if is_cone {
			let steps = (2.0 * half / step).ceil() as usize;
			for i in 0..=steps {
				angles.push((-half + i as f32 * step).min(half));
			}
			angles.push(-half);
			angles.push(half);
		} else {
			for i in 0..self.arc_resolution {
				angles.push(-PI + i as f32 * step);
			}
		}
		for segment in &segments {
			for endpoint in [segment.start, segment.end] {
				if origin.distance(endpoint) > reach {
					continue;
				}
				let relative = wrap_angle((endpoint - origin).angle() - center);
				for offset in [-CORNER_EPSILON, 0.0, CORNER_EPSILON] {
					angles.push(wrap_angle(relative + offset));
				}
			}
		}
		if is_cone {
			angles.retain(|angle| angle.abs() <= half);
		}
		angles.sort_by(f32::total_cmp);
		angles.dedup_by(|a, b| (*a - *b).abs() < 1e-7);

		let mut points: Vec<WorldPoint> = angles
			.into_iter()
			.map(|angle| {
				let direction = WorldVector::from_angle(center + angle);
				let distance = segments
					.iter()
					.filter_map(|segment| {
						segment.ray_intersection(origin, direction)
					})
					.fold(reach, f32::min);
				origin + direction * distance
			})
			.collect();
		if is_cone {
			points.push(origin);
		}
		VisiblePolygon { points }
	}
}

/// Moves `position` off any segment it sits on, toward that segment's open
/// side, so rays from it aren't blocked at distance zero.
fn nudge_origin(position: WorldPoint, segments: &[Segment]) -> WorldPoint {
	let mut origin = position;
	for segment in segments {
		if segment.distance_to(origin) < NUDGE_THRESHOLD {
			origin += segment.open_normal() * (2.0 * NUDGE_THRESHOLD);
		}
	}
	origin
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{geometry::TilePoint, grid::Grid, grid::Tile, occluders};

	fn p(x: f32, y: f32) -> WorldPoint {
		WorldPoint::new(x, y)
	}

	fn engine() -> VisibilityEngine {
		VisibilityEngine::new(64)
	}

	/// Whether any two non-adjacent edges of the closed polygon cross.
	fn self_intersects(points: &[WorldPoint]) -> bool {
		let n = points.len();
		let edge = |i: usize| Segment::new(points[i], points[(i + 1) % n]);
		let crosses = |a: Segment, b: Segment| {
			let d1 = a.direction().cross(b.start - a.start);
			let d2 = a.direction().cross(b.end - a.start);
			let d3 = b.direction().cross(a.start - b.start);
			let d4 = b.direction().cross(a.end - b.start);
			d1 * d2 < -1e-6 && d3 * d4 < -1e-6
		};
		(0..n).any(|i| {
			(i + 2..n)
				.filter(|&j| (j + 1) % n != i)
				.any(|j| crosses(edge(i), edge(j)))
		})
	}

	/// A single room 10 tiles square, walls included.
	fn room_obstacles() -> Vec<Segment> {
		let mut grid = Grid::new(10, 10);
		for y in 1..9 {
			for x in 1..9 {
				grid.set(TilePoint::new(x, y), Tile::Floor { variant: 0 });
			}
		}
		occluders::obstacle_segments(&grid)
	}

	#[test]
	fn test_circle_without_obstacles_reaches_radius() {
		let viewpoint = Viewpoint {
			position: p(5.0, 5.0),
			facing: 0.0,
			shape: LightShape::Circle { radius: 3.0 },
		};
		let polygon = engine().compute_visible_polygon(&viewpoint, &[]);
		assert_eq!(polygon.points.len(), 64);
		for point in &polygon.points {
			assert!((point.distance(viewpoint.position) - 3.0).abs() < 1e-4);
		}
		assert!(polygon.contains(viewpoint.position));
		assert!(!self_intersects(&polygon.points));
	}

	#[test]
	fn test_circle_inside_large_room_reaches_radius() {
		let viewpoint = Viewpoint {
			position: p(5.0, 5.0),
			facing: 1.0,
			shape: LightShape::Circle { radius: 2.5 },
		};
		let polygon =
			engine().compute_visible_polygon(&viewpoint, &room_obstacles());
		for point in &polygon.points {
			assert!((point.distance(viewpoint.position) - 2.5).abs() < 1e-4);
		}
	}

	#[test]
	fn test_walls_clip_the_light() {
		let viewpoint = Viewpoint {
			position: p(5.0, 5.0),
			facing: 0.0,
			shape: LightShape::Circle { radius: 20.0 },
		};
		let polygon =
			engine().compute_visible_polygon(&viewpoint, &room_obstacles());
		assert!(polygon.contains(viewpoint.position));
		assert!(!self_intersects(&polygon.points));
		for point in &polygon.points {
			assert!((1.0 - 1e-3..=9.0 + 1e-3).contains(&point.x));
			assert!((1.0 - 1e-3..=9.0 + 1e-3).contains(&point.y));
		}
		// The room's corners are reached exactly.
		assert!(polygon.points.iter().any(|q| q.distance(p(1.0, 1.0)) < 1e-3));
	}

	#[test]
	fn test_cone_stays_within_half_angle() {
		let half_angle = 35f32.to_radians();
		let viewpoint = Viewpoint {
			position: p(4.5, 5.5),
			facing: 0.3,
			shape: LightShape::Cone {
				half_angle,
				max_distance: 6.25,
			},
		};
		let polygon =
			engine().compute_visible_polygon(&viewpoint, &room_obstacles());
		let (last, fan) = polygon.points.split_last().unwrap();
		assert_eq!(*last, viewpoint.position);
		assert!(fan.len() >= 3);
		for point in fan {
			let angle = (*point - viewpoint.position).angle();
			assert!(
				wrap_angle(angle - viewpoint.facing).abs() <= half_angle + 1e-4
			);
		}
		assert!(!self_intersects(&polygon.points));
		let ahead = viewpoint.position + WorldVector::from_angle(0.3) * 1.0;
		assert!(polygon.contains(ahead));
	}

	#[test]
	fn test_degenerate_segments_are_skipped() {
		let viewpoint = Viewpoint {
			position: p(0.0, 0.0),
			facing: 0.0,
			shape: LightShape::Circle { radius: 2.0 },
		};
		let obstacles = [
			Segment::new(p(1.0, 1.0), p(1.0, 1.0)),
			Segment::new(p(1.0, 0.0), p(f32::NAN, 2.0)),
		];
		let polygon = engine().compute_visible_polygon(&viewpoint, &obstacles);
		for point in &polygon.points {
			assert!((point.distance(viewpoint.position) - 2.0).abs() < 1e-4);
		}
	}

	#[test]
	fn test_origin_on_a_wall_is_nudged_into_the_open() {
		// A wall along y = 0, open side facing down (+y).
		let wall = Segment::new(p(5.0, 0.0), p(-5.0, 0.0));
		let viewpoint = Viewpoint {
			position: p(0.0, 0.0),
			facing: 0.0,
			shape: LightShape::Circle { radius: 2.0 },
		};
		let polygon = engine().compute_visible_polygon(&viewpoint, &[wall]);
		assert!(polygon.contains(p(0.0, 1.0)));
		assert!(!polygon.contains(p(0.0, -1.0)));
		assert!(polygon.points.iter().all(|q| q.y >= -1e-3));
	}

	#[test]
	fn test_viewpoint_coverage() {
		let viewpoint = Viewpoint {
			position: p(0.0, 0.0),
			facing: PI / 2.0,
			shape: LightShape::Cone {
				half_angle: 0.5,
				max_distance: 4.0,
			},
		};
		assert!(viewpoint.covers(p(0.0, 3.0)));
		assert!(!viewpoint.covers(p(0.0, -3.0)));
		assert!(!viewpoint.covers(p(0.0, 5.0)));
		assert!(viewpoint.covers(p(0.0, 0.0)));
	}
}
