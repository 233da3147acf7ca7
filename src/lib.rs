pub mod config;
pub mod counter;
pub mod pose;
pub mod session;
pub mod stats;
