pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;

pub use routes::app;
pub use state::AppState;
