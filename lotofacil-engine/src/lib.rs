pub mod batch;
pub mod config;
pub mod error;
pub mod filters;
pub mod generator;
pub mod history;
pub mod scoring;
pub mod session;
pub mod tickets;
