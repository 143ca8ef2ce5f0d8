pub mod config;
pub mod engine;
pub mod grid;
pub mod limits;
pub mod model;
pub mod observability;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod transfer;
