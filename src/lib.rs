pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod mailhog;
