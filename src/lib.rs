pub mod api;
pub mod board;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod error_handler;
pub mod favorites;
pub mod itinerary;
pub mod map;
pub mod markers;
pub mod models;
pub mod navigation;
pub mod place_types;
pub mod session;
pub mod stream;

pub use config::Config;
pub use error::{ClientError, Result};
