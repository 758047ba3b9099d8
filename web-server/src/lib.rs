// web-server/src/lib.rs
pub mod api;
pub mod backend;
pub mod cookies;
pub mod errors;
pub mod middleware;
pub mod pages;
pub mod proxy;
pub mod relay;
pub mod state;

pub use errors::RelayError;
pub use state::{configure, AppState};
