pub mod app;
pub mod auth;
pub mod bot;
pub mod config;
pub mod db;
pub mod logging;
pub mod state;
pub mod users;
