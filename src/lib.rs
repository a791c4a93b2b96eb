pub mod app;
pub mod auth;
pub mod config;
pub mod contexts;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;
pub mod storage;
#[doc(hidden)]
pub mod testing;
pub mod types;

pub use app::router;
pub use state::AppState;
