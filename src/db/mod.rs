pub mod connection;
pub mod listings;
pub mod users;

pub use connection::{init_db, Database};
