use ggez::{
	event,
	graphics::{Canvas, Color, DrawMode, DrawParam, Mesh, Text},
	input::keyboard::{KeyCode, KeyInput},
	mint::Point2,
	Context, GameError, GameResult,
};
use rand_pcg::Pcg32;

use umbra::{
	geometry::{
		ScreenPoint, ScreenRectangle, ScreenVector, TilePoint, TileRectangle,
		TileVector, WorldPoint, WorldVector,
	},
	grid::Grid,
	progression::ProgressEvent,
	session::Session,
	shared::{share, Shared},
};

use crate::meshes::Meshes;

/// Player speed in tiles per second.
const PLAYER_SPEED: f32 = 4.0;

/// Half the side of the player's collision box, in tiles.
const PLAYER_EXTENT: f32 = 0.3;

/// Seconds for each half of the fade between levels.
const FADE_SECONDS: f32 = 0.5;

/// Maps a region in tile space (the tileport) to a region in screen space (the
/// viewport), filling the viewport while keeping tiles square.
pub struct TileLayout {
	viewport: ScreenRectangle,
	tileport: TileRectangle,
	/// Tile width and height on-screen.
	tile_size: ScreenVector,
}

impl TileLayout {
	pub fn new(
		viewport: ScreenRectangle,
		tileport: TileRectangle,
	) -> TileLayout {
		// Shrink the viewport as needed so that its aspect ratio matches the
		// tileport's.
		let tileport_ar = tileport.size.x as f32 / tileport.size.y as f32;
		let viewport_ar = viewport.size.x / viewport.size.y;
		let viewport = if viewport_ar <= tileport_ar {
			let new_height = viewport.size.x / tileport_ar;
			ScreenRectangle {
				pos: ScreenPoint::new(
					viewport.pos.x,
					viewport.pos.y + 0.5 * (viewport.size.y - new_height),
				),
				size: ScreenVector::new(viewport.size.x, new_height),
			}
		} else {
			let new_width = viewport.size.y * tileport_ar;
			ScreenRectangle {
				pos: ScreenPoint::new(
					viewport.pos.x + 0.5 * (viewport.size.x - new_width),
					viewport.pos.y,
				),
				size: ScreenVector::new(new_width, viewport.size.y),
			}
		};
		let tile_size = ScreenVector::new(
			viewport.size.x / tileport.size.x as f32,
			viewport.size.y / tileport.size.y as f32,
		);
		TileLayout {
			viewport,
			tileport,
			tile_size,
		}
	}

	pub fn to_screen(&self, point: WorldPoint) -> ScreenPoint {
		ScreenPoint::new(
			self.viewport.pos.x
				+ self.tile_size.x * (point.x - self.tileport.pos.x as f32),
			self.viewport.pos.y
				+ self.tile_size.y * (point.y - self.tileport.pos.y as f32),
		)
	}

	pub fn to_world(&self, point: ScreenPoint) -> WorldPoint {
		WorldPoint::new(
			(point.x - self.viewport.pos.x) / self.tile_size.x
				+ self.tileport.pos.x as f32,
			(point.y - self.viewport.pos.y) / self.tile_size.y
				+ self.tileport.pos.y as f32,
		)
	}

	pub fn tile_rect(&self, coords: TilePoint) -> ScreenRectangle {
		ScreenRectangle {
			pos: self
				.to_screen(WorldPoint::new(coords.x as f32, coords.y as f32)),
			size: self.tile_size,
		}
	}
}

enum Fade {
	/// Darkening toward the level swap, from 0 to 1.
	Out(f32),
	/// Brightening into the new level, from 1 to 0.
	In(f32),
}

pub struct GameState {
	rng: Pcg32,
	session: Session,
	meshes: Meshes,
	player: WorldPoint,
	facing: f32,
	fade: Option<Fade>,
	/// Set by the session's event bus when the player walks out.
	level_complete: Shared<bool>,
	/// Why the last level load failed, shown until a retry succeeds.
	load_error: Option<String>,
}

impl GameState {
	pub fn new(rng: Pcg32, mut session: Session, meshes: Meshes) -> GameState {
		let level_complete = share(false);
		session.events.subscribe({
			let level_complete = level_complete.clone();
			move |event: &ProgressEvent| {
				if let ProgressEvent::LevelComplete { .. } = event {
					*level_complete.borrow_mut() = true;
				}
			}
		});
		let player = session
			.dungeon()
			.map_or(WorldPoint::new(0.0, 0.0), |d| d.spawn().center());
		GameState {
			rng,
			session,
			meshes,
			player,
			facing: 0.0,
			fade: None,
			level_complete,
			load_error: None,
		}
	}

	fn tile_layout(&self, ctx: &Context, grid: &Grid) -> TileLayout {
		let (width, height) = ctx.gfx.drawable_size();
		TileLayout::new(
			ScreenRectangle {
				pos: ScreenPoint::new(0.0, 0.0),
				size: ScreenVector::new(width, height),
			},
			TileRectangle::new(
				TilePoint::new(0, 0),
				TileVector::new(grid.width(), grid.height()),
			),
		)
	}

	/// Moves the player one axis at a time, so walls stop one component of
	/// the motion without cancelling the other.
	fn move_player(&mut self, offset: WorldVector) {
		let Some(dungeon) = self.session.dungeon() else {
			return;
		};
		let grid = dungeon.grid();
		let fits = |center: WorldPoint| {
			[(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)]
				.into_iter()
				.all(|(sx, sy)| {
					let corner = center
						+ WorldVector::new(sx, sy) * PLAYER_EXTENT;
					grid.is_passable(corner.tile())
				})
		};
		let mut position = self.player;
		let moved_x = position + WorldVector::new(offset.x, 0.0);
		if fits(moved_x) {
			position = moved_x;
		}
		let moved_y = position + WorldVector::new(0.0, offset.y);
		if fits(moved_y) {
			position = moved_y;
		}

		let previous = self.player.tile();
		self.player = position;
		if position.tile() != previous {
			self.session.player_moved(position.tile());
		}
	}

	fn update_fade(&mut self, dt: f32) {
		let step = dt / FADE_SECONDS;
		self.fade = match self.fade.take() {
			None => None,
			Some(Fade::Out(level)) if level + step < 1.0 => {
				Some(Fade::Out(level + step))
			}
			Some(Fade::Out(_)) => {
				// Fully dark: swap levels out of sight.
				match self.session.advance_level(&mut self.rng) {
					Ok(()) => {
						self.load_error = None;
						if let Some(dungeon) = self.session.dungeon() {
							self.player = dungeon.spawn().center();
						}
					}
					Err(e) => {
						log::error!("Could not generate the next level: {e}");
						self.load_error = Some(e.to_string());
					}
				}
				Some(Fade::In(1.0))
			}
			Some(Fade::In(level)) if level - step > 0.0 => {
				Some(Fade::In(level - step))
			}
			Some(Fade::In(_)) => {
				self.session.resume_input();
				None
			}
		};
	}
}

impl event::EventHandler<GameError> for GameState {
	fn update(&mut self, ctx: &mut Context) -> GameResult {
		let dt = ctx.time.delta().as_secs_f32();

		if std::mem::take(&mut *self.level_complete.borrow_mut()) {
			self.session.freeze_input();
			self.fade = Some(Fade::Out(0.0));
		}
		self.update_fade(dt);

		if !self.session.input_frozen() {
			let keyboard = &ctx.keyboard;
			let pressed = |keys: [KeyCode; 2]| {
				keys.into_iter().any(|key| keyboard.is_key_pressed(key))
			};
			let axis = |negative: [KeyCode; 2], positive: [KeyCode; 2]| {
				(pressed(positive) as i8 - pressed(negative) as i8) as f32
			};
			let direction = WorldVector::new(
				axis([KeyCode::A, KeyCode::Left], [KeyCode::D, KeyCode::Right]),
				axis([KeyCode::W, KeyCode::Up], [KeyCode::S, KeyCode::Down]),
			)
			.normalized();
			self.move_player(direction * (PLAYER_SPEED * dt));
		}

		// Face the mouse.
		if let Some(dungeon) = self.session.dungeon() {
			let layout = self.tile_layout(ctx, dungeon.grid());
			let mouse = ctx.mouse.position();
			let target = layout.to_world(ScreenPoint::new(mouse.x, mouse.y));
			let aim = target - self.player;
			if aim.length() > f32::EPSILON {
				self.facing = aim.angle();
			}
		}

		let viewpoint = self.session.viewpoint(self.player, self.facing);
		if let Some(dungeon) = self.session.dungeon_mut() {
			dungeon.reveal(&viewpoint);
		}
		Ok(())
	}

	fn key_down_event(
		&mut self,
		ctx: &mut Context,
		input: KeyInput,
		_repeat: bool,
	) -> GameResult {
		match input.keycode {
			Some(KeyCode::Escape) => ctx.request_quit(),
			Some(KeyCode::R)
				if self.load_error.is_some() && self.fade.is_none() =>
			{
				self.session.freeze_input();
				self.fade = Some(Fade::Out(0.0));
			}
			_ => {}
		}
		Ok(())
	}

	fn draw(&mut self, ctx: &mut Context) -> GameResult {
		let mut canvas = Canvas::from_frame(ctx, Color::BLACK);
		let Some(dungeon) = self.session.dungeon() else {
			return canvas.finish(ctx);
		};
		let grid = dungeon.grid();
		let layout = self.tile_layout(ctx, grid);
		let viewpoint = self.session.viewpoint(self.player, self.facing);
		let polygon = self.session.visible_polygon(&viewpoint);

		// Remembered tiles, dimmed. Lit tiles are drawn again at full
		// brightness.
		let reach = viewpoint.shape.reach();
		for (coords, tile) in grid.iter() {
			if !dungeon.is_explored(coords) {
				continue;
			}
			let Some(mesh) = self.meshes.tile(tile) else {
				continue;
			};
			let lit = coords.center().distance(self.player) <= reach + 1.0
				&& polygon.contains(coords.center());
			let color = if lit {
				Color::WHITE
			} else {
				Color::from_rgba(255, 255, 255, 64)
			};
			let rect = layout.tile_rect(coords);
			canvas.draw(
				mesh,
				DrawParam::new().dest(rect.pos).scale(rect.size).color(color),
			);
		}

		// The light itself.
		if polygon.points.len() >= 3 {
			let points: Vec<Point2<f32>> = polygon
				.points
				.iter()
				.map(|point| layout.to_screen(*point).into())
				.collect();
			match Mesh::new_polygon(
				ctx,
				DrawMode::fill(),
				&points,
				Color::from_rgba(255, 230, 150, 40),
			) {
				Ok(mesh) => canvas.draw(&mesh, DrawParam::new()),
				Err(e) => log::debug!("Skipping light polygon: {e}"),
			}
		}

		let tile_scale = layout.tile_rect(TilePoint::new(0, 0)).size;
		for key in dungeon.key_positions() {
			if polygon.contains(key.center()) {
				canvas.draw(
					&self.meshes.key,
					DrawParam::new()
						.dest(layout.to_screen(key.center()))
						.scale(tile_scale),
				);
			}
		}
		canvas.draw(
			&self.meshes.player,
			DrawParam::new()
				.dest(layout.to_screen(self.player))
				.scale(tile_scale),
		);

		let progression = self.session.progression();
		let mut hud = Text::new(format!(
			"Level {}   Keys {}/{}",
			progression.level(),
			progression.keys_found(),
			progression.keys_to_find()
		));
		hud.set_scale(24.0);
		canvas.draw(&hud, DrawParam::new().dest(ScreenPoint::new(16.0, 16.0)));
		if let Some(error) = &self.load_error {
			let mut message = Text::new(format!(
				"Could not load the next level: {error}\nPress R to try again"
			));
			message.set_scale(20.0);
			canvas.draw(
				&message,
				DrawParam::new()
					.dest(ScreenPoint::new(16.0, 48.0))
					.color(Color::RED),
			);
		}

		let darkness = match self.fade {
			Some(Fade::Out(level) | Fade::In(level)) => level,
			None => 0.0,
		};
		if darkness > 0.0 {
			let (width, height) = ctx.gfx.drawable_size();
			canvas.draw(
				&self.meshes.blank,
				DrawParam::new()
					.scale(ScreenVector::new(width, height))
					.color(Color::new(0.0, 0.0, 0.0, darkness.min(1.0))),
			);
		}

		canvas.finish(ctx)
	}
}
