//! Data-driven catalogs for the upgrade engine.
//!
//! A game directory holds a required `technologies` file and an optional
//! `engine` config file, each in RON, TOML or JSON (one format per file).
//! [`load_game_data`] reads both and returns a ready-to-use
//! [`TechCatalog`](formica_tech_tree::TechCatalog) and
//! [`EngineConfig`](formica_engine::EngineConfig).

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, Format, GameData, load_catalog, load_engine_config, load_game_data};
