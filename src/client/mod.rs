pub mod cache;
pub mod gateway;
pub mod images;
pub mod sync;

pub use cache::SnapshotStore;
pub use gateway::{GatewayError, ListingApi, ListingGateway};
pub use sync::Snapshot;
