pub mod collision;
pub mod constants;
pub mod engine;
pub mod maze;
pub mod player;
pub mod rng;
pub mod robot;
pub mod session;
pub mod types;
