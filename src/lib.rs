pub mod agents;
pub mod constants;
pub mod display;
pub mod engine;
pub mod error;
pub mod game;
pub mod ghost_policy;
pub mod grid;
pub mod layout;
pub mod replay;
pub mod rng;
pub mod state;
pub mod trace;
pub mod types;
