pub mod auth;
pub mod members;
pub mod products;
pub mod server;
pub mod sessions;
