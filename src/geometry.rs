use std::f32::consts::{PI, TAU};
use std::ops::{Add, AddAssign, Mul, Sub};

use ggez::{
	glam::Vec2,
	mint::{Point2, Vector2},
};
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Continuous coordinates in tile units. Tile `(x, y)` covers the square from
/// `(x, y)` to `(x + 1, y + 1)`.
pub type WorldVector = Vector<f32>;
pub type WorldPoint = Point<f32>;

pub type ScreenVector = Vector<f32>;
pub type ScreenPoint = Point<f32>;
pub type ScreenRectangle = Rectangle<f32>;

impl From<ScreenVector> for Vec2 {
	fn from(value: ScreenVector) -> Self {
		Vec2::new(value.x, value.y)
	}
}

impl From<ScreenPoint> for Vec2 {
	fn from(value: ScreenPoint) -> Self {
		Vec2::new(value.x, value.y)
	}
}

pub type TileVector = Vector<i32>;
pub type TilePoint = Point<i32>;
pub type TileRectangle = Rectangle<i32>;
pub type TileIntersection = RectangleIntersection<i32>;

pub const TILE_UP: TileVector = TileVector::new(0, -1);
pub const TILE_DOWN: TileVector = TileVector::new(0, 1);
pub const TILE_LEFT: TileVector = TileVector::new(-1, 0);
pub const TILE_RIGHT: TileVector = TileVector::new(1, 0);

pub const NEIGHBOR_OFFSETS_FOUR: [TileVector; 4] =
	[TILE_UP, TILE_DOWN, TILE_LEFT, TILE_RIGHT];

#[derive(
	Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct Vector<T> {
	pub x: T,
	pub y: T,
}

impl<T> Vector<T> {
	pub const fn new(x: T, y: T) -> Self {
		Vector { x, y }
	}
}

impl<T: AddAssign<T>> AddAssign for Vector<T> {
	fn add_assign(&mut self, rhs: Self) {
		self.x += rhs.x;
		self.y += rhs.y;
	}
}

impl<T: Add<Output = T>> Add for Vector<T> {
	type Output = Self;

	fn add(self, rhs: Self) -> Self {
		Self {
			x: self.x + rhs.x,
			y: self.y + rhs.y,
		}
	}
}

impl<T: Sub<Output = T>> Sub for Vector<T> {
	type Output = Self;

	fn sub(self, rhs: Self) -> Self {
		Self {
			x: self.x - rhs.x,
			y: self.y - rhs.y,
		}
	}
}

impl<T: Clone + Mul<Output = T>> Mul<T> for Vector<T> {
	type Output = Self;

	fn mul(self, rhs: T) -> Self {
		Self {
			x: self.x * rhs.clone(),
			y: self.y * rhs,
		}
	}
}

impl<T> From<Vector<T>> for Vector2<T> {
	fn from(value: Vector<T>) -> Self {
		Self {
			x: value.x,
			y: value.y,
		}
	}
}

impl WorldVector {
	/// The unit vector pointing at `angle` radians, measured clockwise from
	/// the positive x-axis (y points down).
	pub fn from_angle(angle: f32) -> WorldVector {
		WorldVector::new(angle.cos(), angle.sin())
	}

	pub fn length(self) -> f32 {
		self.x.hypot(self.y)
	}

	pub fn dot(self, other: Self) -> f32 {
		self.x * other.x + self.y * other.y
	}

	/// The z-component of the 3D cross product.
	pub fn cross(self, other: Self) -> f32 {
		self.x * other.y - self.y * other.x
	}

	/// The angle of this vector in `(-π, π]`.
	pub fn angle(self) -> f32 {
		self.y.atan2(self.x)
	}

	/// This vector scaled to unit length, or zero if it has no length.
	pub fn normalized(self) -> WorldVector {
		let length = self.length();
		if length > 0.0 {
			self * (1.0 / length)
		} else {
			WorldVector::new(0.0, 0.0)
		}
	}
}

#[derive(
	Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct Point<T> {
	pub x: T,
	pub y: T,
}

impl<T> Point<T> {
	pub const fn new(x: T, y: T) -> Self {
		Point { x, y }
	}
}

impl<T: AddAssign<T>> AddAssign<Vector<T>> for Point<T> {
	fn add_assign(&mut self, rhs: Vector<T>) {
		self.x += rhs.x;
		self.y += rhs.y;
	}
}

impl<T: Add<Output = T>> Add<Vector<T>> for Point<T> {
	type Output = Self;

	fn add(self, rhs: Vector<T>) -> Self {
		Self {
			x: self.x + rhs.x,
			y: self.y + rhs.y,
		}
	}
}

impl<T: Sub<Output = T>> Sub<Vector<T>> for Point<T> {
	type Output = Self;

	fn sub(self, rhs: Vector<T>) -> Self {
		Self {
			x: self.x - rhs.x,
			y: self.y - rhs.y,
		}
	}
}

impl<T: Sub<Output = T>> Sub for Point<T> {
	type Output = Vector<T>;

	fn sub(self, rhs: Self) -> Self::Output {
		Self::Output {
			x: self.x - rhs.x,
			y: self.y - rhs.y,
		}
	}
}

impl<T> From<Point<T>> for Point2<T> {
	fn from(value: Point<T>) -> Self {
		Self {
			x: value.x,
			y: value.y,
		}
	}
}

impl TilePoint {
	/// The world-space centre of this tile.
	pub fn center(self) -> WorldPoint {
		WorldPoint::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
	}

	/// The larger of the horizontal and vertical distances to `other`.
	pub fn chebyshev_distance(self, other: TilePoint) -> i32 {
		(self.x - other.x).abs().max((self.y - other.y).abs())
	}
}

impl WorldPoint {
	/// The tile containing this point.
	pub fn tile(self) -> TilePoint {
		TilePoint::new(self.x.floor() as i32, self.y.floor() as i32)
	}

	pub fn distance(self, other: WorldPoint) -> f32 {
		(other - self).length()
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

/// Wraps `angle` into `(-π, π]`.
pub fn wrap_angle(angle: f32) -> f32 {
	let wrapped = (angle + PI).rem_euclid(TAU) - PI;
	if wrapped <= -PI {
		wrapped + TAU
	} else {
		wrapped
	}
}

#[derive(
	Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct Rectangle<T> {
	pub pos: Point<T>,
	pub size: Vector<T>,
}

#[derive(Clone, Copy, Debug)]
pub enum RectangleIntersection<T> {
	/// The rectangles actually intersect.
	Real(Rectangle<T>),
	/// The rectangles share x-coordinates but not y-coordinates. The contained
	/// rectangle represents the empty space between the horizontally
	/// overlapping regions.
	Horizontal(Rectangle<T>),
	/// The rectangles share y-coordinates but not x-coordinates. The contained
	/// rectangle represents the empty space between the vertically overlapping
	/// regions.
	Vertical(Rectangle<T>),
	/// The rectangles share neither x- nor y-coordinates. The contained
	/// rectangle represents the empty space between the rectangles' nearest
	/// corners.
	None(Rectangle<T>),
}

impl<T> RectangleIntersection<T> {
	/// The Manhattan distance between the rectangles. If the rectangles
	/// overlap, their distance is zero. Nonintersecting rectangles that share a
	/// corner are considered to be zero distance apart.
	pub fn distance(self) -> T
	where
		T: Copy + Add<Output = T> + Zero,
	{
		match self {
			RectangleIntersection::Real(_) => T::zero(),
			RectangleIntersection::Horizontal(i) => i.size.y,
			RectangleIntersection::Vertical(i) => i.size.x,
			RectangleIntersection::None(i) => i.size.x + i.size.y,
		}
	}
}

impl<T> Rectangle<T> {
	pub fn new(pos: Point<T>, size: Vector<T>) -> Self {
		Rectangle { pos, size }
	}

	/// The nonempty overlapping region of `self` and `other`, if any.
	pub fn intersection(self, other: Self) -> RectangleIntersection<T>
	where
		T: Copy + Ord + Add<Output = T> + Sub<Output = T>,
	{
		let start_x = self.pos.x.max(other.pos.x);
		let start_y = self.pos.y.max(other.pos.y);
		let end_x = (self.pos.x + self.size.x).min(other.pos.x + other.size.x);
		let end_y = (self.pos.y + self.size.y).min(other.pos.y + other.size.y);
		match (start_x < end_x, start_y < end_y) {
			(true, true) => RectangleIntersection::Real(Rectangle {
				pos: Point::new(start_x, start_y),
				size: Vector::new(end_x - start_x, end_y - start_y),
			}),
			(true, false) => RectangleIntersection::Horizontal(Rectangle {
				pos: Point::new(start_x, end_y),
				size: Vector::new(end_x - start_x, start_y - end_y),
			}),
			(false, true) => RectangleIntersection::Vertical(Rectangle {
				pos: Point::new(end_x, start_y),
				size: Vector::new(start_x - end_x, end_y - start_y),
			}),
			(false, false) => RectangleIntersection::None(Rectangle {
				pos: Point::new(end_x, end_y),
				size: Vector::new(start_x - end_x, start_y - end_y),
			}),
		}
	}

	/// Whether `self` and `other` share at least one cell.
	pub fn overlaps(self, other: Self) -> bool
	where
		T: Copy + Ord + Add<Output = T> + Sub<Output = T>,
	{
		matches!(self.intersection(other), RectangleIntersection::Real(_))
	}

	/// Whether `self` and `other` are overlapping or adjacent.
	pub fn touching(self, other: Self) -> bool
	where
		T: Copy + Ord + Add<Output = T> + Sub<Output = T>,
	{
		let start_x = self.pos.x.max(other.pos.x);
		let start_y = self.pos.y.max(other.pos.y);
		let end_x = (self.pos.x + self.size.x).min(other.pos.x + other.size.x);
		let end_y = (self.pos.y + self.size.y).min(other.pos.y + other.size.y);
		start_x <= end_x && start_y <= end_y
	}

	/// Whether `other` lies entirely within `self`.
	pub fn contains_rectangle(self, other: Self) -> bool
	where
		T: Copy + Ord + Add<Output = T>,
	{
		other.pos.x >= self.pos.x
			&& other.pos.y >= self.pos.y
			&& other.pos.x + other.size.x <= self.pos.x + self.size.x
			&& other.pos.y + other.size.y <= self.pos.y + self.size.y
	}

	/// The rectangle's width times height.
	pub fn area(self) -> T
	where
		T: Mul<Output = T>,
	{
		self.size.x * self.size.y
	}
}

impl TileRectangle {
	/// Whether the tile at `coords` lies within `self`.
	pub fn contains(self, coords: TilePoint) -> bool {
		(self.pos.x..self.pos.x + self.size.x).contains(&coords.x)
			&& (self.pos.y..self.pos.y + self.size.y).contains(&coords.y)
	}
}

/// A directed line segment in world space. Obstacle segments are oriented so
/// that the transparent side lies along [`Segment::open_normal`].
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Segment {
	pub start: WorldPoint,
	pub end: WorldPoint,
}

impl Segment {
	pub fn new(start: WorldPoint, end: WorldPoint) -> Segment {
		Segment { start, end }
	}

	pub fn direction(&self) -> WorldVector {
		self.end - self.start
	}

	/// The unit normal on the open side of the segment: the direction rotated
	/// a quarter turn counterclockwise on screen.
	pub fn open_normal(&self) -> WorldVector {
		let d = self.direction();
		WorldVector::new(d.y, -d.x).normalized()
	}

	/// Rejects zero-length and non-finite segments.
	pub fn validate(&self) -> Result<(), GeometryError> {
		if !self.start.is_finite()
			|| !self.end.is_finite()
			|| self.direction().length() <= f32::EPSILON
		{
			return Err(GeometryError::DegenerateSegment {
				start: self.start,
				end: self.end,
			});
		}
		Ok(())
	}

	/// The shortest distance from `point` to any point on the segment.
	pub fn distance_to(&self, point: WorldPoint) -> f32 {
		let d = self.direction();
		let length_squared = d.dot(d);
		if length_squared == 0.0 {
			return self.start.distance(point);
		}
		let t = ((point - self.start).dot(d) / length_squared).clamp(0.0, 1.0);
		(self.start + d * t).distance(point)
	}

	/// The distance along the ray from `origin` with unit direction `dir` to
	/// where it crosses the segment, if it does.
	pub fn ray_intersection(
		&self,
		origin: WorldPoint,
		dir: WorldVector,
	) -> Option<f32> {
		let d = self.direction();
		let denominator = dir.cross(d);
		if denominator.abs() < 1e-9 {
			// Parallel rays never produce a unique hit.
			return None;
		}
		let offset = self.start - origin;
		let t = offset.cross(d) / denominator;
		let s = offset.cross(dir) / denominator;
		(t >= 0.0 && (-1e-6..=1.0 + 1e-6).contains(&s)).then_some(t)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rect(x: i32, y: i32, w: i32, h: i32) -> TileRectangle {
		TileRectangle::new(TilePoint::new(x, y), TileVector::new(w, h))
	}

	#[test]
	fn test_intersection_classifies_gaps() {
		let a = rect(0, 0, 5, 5);
		match a.intersection(rect(8, 2, 4, 6)) {
			RectangleIntersection::Vertical(gap) => {
				assert_eq!(gap.pos, TilePoint::new(5, 2));
				assert_eq!(gap.size, TileVector::new(3, 3));
			}
			other => panic!("expected a vertical gap, got {other:?}"),
		}
		match a.intersection(rect(1, 7, 2, 2)) {
			RectangleIntersection::Horizontal(gap) => {
				assert_eq!(gap.size, TileVector::new(2, 2));
			}
			other => panic!("expected a horizontal gap, got {other:?}"),
		}
		assert!(a.overlaps(rect(4, 4, 2, 2)));
		assert_eq!(a.intersection(rect(7, 9, 1, 1)).distance(), 6);
	}

	#[test]
	fn test_touching_includes_adjacency() {
		let a = rect(0, 0, 3, 3);
		assert!(a.touching(rect(3, 0, 2, 2)));
		assert!(!a.touching(rect(4, 0, 2, 2)));
		assert!(!a.overlaps(rect(3, 0, 2, 2)));
	}

	#[test]
	fn test_wrap_angle() {
		assert!((wrap_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
		assert!((wrap_angle(-PI) - PI).abs() < 1e-5);
		assert!((wrap_angle(0.25) - 0.25).abs() < 1e-6);
	}

	#[test]
	fn test_ray_intersection() {
		let wall =
			Segment::new(WorldPoint::new(2.0, -1.0), WorldPoint::new(2.0, 1.0));
		let origin = WorldPoint::new(0.0, 0.0);
		let hit = wall.ray_intersection(origin, WorldVector::new(1.0, 0.0));
		assert!((hit.unwrap() - 2.0).abs() < 1e-6);
		assert!(wall
			.ray_intersection(origin, WorldVector::new(-1.0, 0.0))
			.is_none());
		assert!(wall
			.ray_intersection(origin, WorldVector::new(0.0, 1.0))
			.is_none());
	}

	#[test]
	fn test_degenerate_segment_is_rejected() {
		let p = WorldPoint::new(1.0, 1.0);
		assert!(Segment::new(p, p).validate().is_err());
		assert!(Segment::new(p, WorldPoint::new(f32::NAN, 0.0))
			.validate()
			.is_err());
		assert!(Segment::new(p, WorldPoint::new(2.0, 1.0)).validate().is_ok());
	}

	#[test]
	fn test_open_normal_points_up_for_rightward_segment() {
		let s =
			Segment::new(WorldPoint::new(0.0, 0.0), WorldPoint::new(3.0, 0.0));
		assert_eq!(s.open_normal(), WorldVector::new(0.0, -1.0));
	}
}
