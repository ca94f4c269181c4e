pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod responses;
pub mod router;
pub mod storage;
