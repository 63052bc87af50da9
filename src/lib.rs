// Crate root library declaration and module exports.
pub mod aggregator;
pub mod cli;
pub mod client;
pub mod color_utils;
pub mod config;
pub mod context;
pub mod error;
pub mod grid;
pub mod logging;
pub mod meeting;
pub mod model;
pub mod source;
pub mod tui;
pub mod viewport;
