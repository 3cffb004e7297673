pub mod api;
pub mod config;
pub mod demo_api;
pub mod directory;
pub mod elo;
pub mod error;
pub mod http_client;
pub mod prediction;
pub mod provider;
pub mod ratings;
pub mod selection;
pub mod session;
pub mod state;
