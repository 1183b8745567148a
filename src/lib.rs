pub mod clock;
pub mod config;
pub mod engine;
pub mod extract;
pub mod models;
pub mod remote;
pub mod storage;
