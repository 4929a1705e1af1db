pub mod boundary;
pub mod client;
pub mod config;
pub mod logger;
pub mod observability;
