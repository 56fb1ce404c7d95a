pub mod artifacts;
pub mod config;
pub mod ensemble;
pub mod features;
pub mod models;
pub mod registry;
pub mod service;
pub mod training;

pub use loto_seq::error;
