use crate::client::cache::SnapshotStore;
use crate::client::gateway::{GatewayError, ListingApi};
use crate::domain::Listing;

/// A delivered collection, tagged with where it came from. Callers get the
/// stale snapshot first (when one exists) and the authoritative copy after
/// the network round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Cached(Vec<Listing>),
    Fresh(Vec<Listing>),
}

/// Two-phase read of the whole listing collection: deliver the local
/// snapshot immediately, then fetch. A successful fetch overwrites the
/// snapshot file and is delivered as `Fresh`; a failed fetch is logged and
/// the stale data stays the system of record. With no snapshot and a failed
/// fetch nothing is delivered at all.
pub fn load_all_listings<G: ListingApi>(
    gateway: &G,
    snapshots: &SnapshotStore,
    mut on_update: impl FnMut(Snapshot),
) {
    if let Some(cached) = snapshots.load_all_listings() {
        on_update(Snapshot::Cached(cached));
    }

    match gateway.fetch_all() {
        Ok(fresh) => {
            snapshots.save_all_listings(&fresh);
            on_update(Snapshot::Fresh(fresh));
        }
        Err(e) => eprintln!("Network error fetching listings: {e}"),
    }
}

/// The acting user's own listings: an in-memory collection backed by the
/// per-owner snapshot file and the remote gateway. Mutations go through the
/// gateway first; only a confirmed write touches memory and the snapshot.
pub struct UserListings<'a, G: ListingApi> {
    user_id: String,
    gateway: &'a G,
    snapshots: &'a SnapshotStore,
    listings: Vec<Listing>,
}

impl<'a, G: ListingApi> UserListings<'a, G> {
    pub fn new(user_id: impl Into<String>, gateway: &'a G, snapshots: &'a SnapshotStore) -> Self {
        Self {
            user_id: user_id.into(),
            gateway,
            snapshots,
            listings: Vec::new(),
        }
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    /// Stale-then-fresh load of this owner's collection, same contract as
    /// `load_all_listings`.
    pub fn load(&mut self, mut on_update: impl FnMut(Snapshot)) {
        if let Some(cached) = self.snapshots.load_user_listings(&self.user_id) {
            self.listings = cached.clone();
            on_update(Snapshot::Cached(cached));
        }

        match self.gateway.fetch_by_owner(&self.user_id) {
            Ok(fresh) => {
                self.listings = fresh.clone();
                self.snapshots.save_user_listings(&fresh, &self.user_id);
                on_update(Snapshot::Fresh(fresh));
            }
            Err(e) => eprintln!("Network error fetching user listings: {e}"),
        }
    }

    /// Create through the gateway; on success the listing gets its assigned
    /// id, lands at the front of the collection, and the snapshot is
    /// re-saved. Returns the assigned id.
    pub fn create(&mut self, mut listing: Listing) -> Result<String, GatewayError> {
        let id = self.gateway.create(&listing, &self.user_id)?;

        listing.id = Some(id.clone());
        listing.user_id = Some(self.user_id.clone());
        self.listings.insert(0, listing);
        self.snapshots.save_user_listings(&self.listings, &self.user_id);
        Ok(id)
    }

    /// Edit in place. The ownership check happens here, before any request:
    /// an edit of a listing this user does not own returns `OwnerMismatch`
    /// with nothing sent and the collection untouched. The server verifies
    /// ownership again on its side.
    pub fn edit(&mut self, listing: Listing) -> Result<(), GatewayError> {
        let id = listing
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::InvalidListing("edit requires an id".to_string()))?;

        let owned = self
            .listings
            .iter()
            .any(|l| l.id.as_deref() == Some(id.as_str()) && l.is_owned_by(&self.user_id));
        if !owned {
            return Err(GatewayError::OwnerMismatch);
        }

        self.gateway.update(&listing, &self.user_id)?;

        if let Some(slot) = self
            .listings
            .iter_mut()
            .find(|l| l.id.as_deref() == Some(id.as_str()))
        {
            *slot = listing;
        }
        self.snapshots.save_user_listings(&self.listings, &self.user_id);
        Ok(())
    }

    /// Delete through the gateway (the server cascades to the image
    /// folder), then drop locally and re-save the snapshot.
    pub fn delete(&mut self, id: &str) -> Result<(), GatewayError> {
        self.gateway.delete(id)?;

        self.listings.retain(|l| l.id.as_deref() != Some(id));
        self.snapshots.save_user_listings(&self.listings, &self.user_id);
        Ok(())
    }
}
