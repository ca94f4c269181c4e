pub mod listing;
pub mod query;

pub use listing::Listing;
