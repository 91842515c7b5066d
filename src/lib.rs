pub mod dijkstra_map;
pub mod disjoint_sets;
pub mod dungeon;
pub mod error;
pub mod events;
pub mod generator;
pub mod geometry;
pub mod grid;
pub mod light;
pub mod occluders;
pub mod painter;
pub mod progression;
pub mod room;
pub mod session;
pub mod settings;
pub mod shared;
pub mod vision;
