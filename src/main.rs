mod game_state;
mod meshes;

use std::path::Path;

use game_state::GameState;
use ggez::{
	conf::{WindowMode, WindowSetup},
	event, GameError, GameResult,
};
use meshes::Meshes;
use rand::prelude::*;
use rand_pcg::Pcg32;
use rand_seeder::Seeder;
use umbra::{session::Session, settings::Settings};

fn main() -> GameResult {
	env_logger::Builder::from_env(
		env_logger::Env::default().default_filter_or("info"),
	)
	.init();
	log::info!("Starting umbra v{}", env!("CARGO_PKG_VERSION"));

	let settings = Settings::load_or_default(Path::new("assets/settings.ron"));
	let mut rng: Pcg32 = match &settings.seed {
		Some(seed) => {
			log::info!("Using seed {seed:?}");
			Seeder::from(seed.as_str()).make_rng()
		}
		None => Pcg32::from_entropy(),
	};
	let session = Session::new(settings, &mut rng)
		.map_err(|e| GameError::CustomError(e.to_string()))?;

	let (mut ctx, event_loop) =
		ggez::ContextBuilder::new("umbra", "umbra developers")
			.window_setup(WindowSetup {
				title: "Umbra".to_string(),
				..Default::default()
			})
			.window_mode(WindowMode {
				width: 1280.0,
				height: 960.0,
				resizable: true,
				..Default::default()
			})
			.build()?;
	let meshes = Meshes::new(&mut ctx)?;
	let state = GameState::new(rng, session, meshes);
	event::run(ctx, event_loop, state);
}
