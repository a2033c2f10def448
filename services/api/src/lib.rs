pub mod adapters;
pub mod config;
pub mod error;
pub mod seed;
pub mod token;
pub mod web;
