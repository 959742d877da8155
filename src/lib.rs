pub mod app;
pub mod bridge;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod config;
pub mod error;
pub mod logger;
pub mod notify;
pub mod surface;
