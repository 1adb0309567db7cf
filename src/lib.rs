pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod markers;
pub mod middleware;
pub mod models;
pub mod tenant;
