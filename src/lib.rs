pub mod api;
pub mod app_state;
pub mod cache;
pub mod config;
pub mod fetcher;
pub mod generator;
pub mod graph;
pub mod graphs;
pub mod health;
pub mod middleware;
pub mod parser;
pub mod strategies;
pub mod validators;
