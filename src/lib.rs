//! TownLoop: community events for the towns of the Cochrane District.

pub mod config;
pub mod export;
pub mod filter;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod models;
pub mod realtime;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod taxonomy;
pub mod utils;

pub use state::AppState;
