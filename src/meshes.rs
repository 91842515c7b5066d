use ggez::{
	glam::Vec2,
	graphics::{Color, DrawMode, Mesh, Rect},
	Context, GameResult,
};

use umbra::grid::{DoorState, Side, Tile};

/// A unit square, scaled to a tile when drawn.
fn tile_mesh(ctx: &mut Context, color: Color) -> GameResult<Mesh> {
	Mesh::new_rectangle(
		ctx,
		DrawMode::fill(),
		Rect {
			x: 0.0,
			y: 0.0,
			w: 1.0,
			h: 1.0,
		},
		color,
	)
}

pub struct Meshes {
	pub floor: Mesh,
	pub floor_decorated: Mesh,
	pub corridor: Mesh,
	pub wall: Mesh,
	pub wall_top: Mesh,
	pub corner: Mesh,
	pub breach: Mesh,
	pub door_closed: Mesh,
	pub door_open: Mesh,
	// Objects
	pub player: Mesh,
	pub key: Mesh,
	/// Plain white square for overlays, tinted by the draw color.
	pub blank: Mesh,
}

impl Meshes {
	pub fn new(ctx: &mut Context) -> GameResult<Meshes> {
		Ok(Meshes {
			floor: tile_mesh(ctx, Color::from_rgb(96, 92, 88))?,
			floor_decorated: tile_mesh(ctx, Color::from_rgb(110, 100, 84))?,
			corridor: tile_mesh(ctx, Color::from_rgb(80, 80, 80))?,
			wall: tile_mesh(ctx, Color::from_rgb(128, 0, 0))?,
			wall_top: tile_mesh(ctx, Color::from_rgb(150, 30, 30))?,
			corner: tile_mesh(ctx, Color::from_rgb(100, 0, 0))?,
			breach: tile_mesh(ctx, Color::from_rgb(70, 70, 70))?,
			door_closed: tile_mesh(ctx, Color::from_rgb(96, 58, 32))?,
			door_open: tile_mesh(ctx, Color::from_rgb(230, 200, 90))?,
			player: Mesh::new_ellipse(
				ctx,
				DrawMode::fill(),
				Vec2::new(0.0, 0.0),
				0.3,
				0.3,
				0.01,
				Color::BLUE,
			)?,
			key: Mesh::new_rectangle(
				ctx,
				DrawMode::fill(),
				Rect {
					x: -0.25,
					y: -0.25,
					w: 0.5,
					h: 0.5,
				},
				Color::YELLOW,
			)?,
			blank: tile_mesh(ctx, Color::WHITE)?,
		})
	}

	/// The mesh for `tile`, or `None` for the void.
	pub fn tile(&self, tile: Tile) -> Option<&Mesh> {
		match tile {
			Tile::Ground => None,
			Tile::Floor { variant: 0 } => Some(&self.floor),
			Tile::Floor { .. } => Some(&self.floor_decorated),
			Tile::Corridor => Some(&self.corridor),
			Tile::Wall {
				side: Side::Top, ..
			} => Some(&self.wall_top),
			Tile::Wall { .. } => Some(&self.wall),
			Tile::WallCorner(_) | Tile::CorridorCorner(_) => Some(&self.corner),
			Tile::Empty => Some(&self.breach),
			Tile::Door(DoorState::Closed) => Some(&self.door_closed),
			Tile::Door(DoorState::Open) => Some(&self.door_open),
		}
	}
}
