use crate::domain::Listing;

/// Case-insensitive title/address substring match, the same behavior the
/// map screen's search bar applies to an in-memory collection.
pub fn filter_by_search(listings: &[Listing], query: &str) -> Vec<Listing> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return listings.to_vec();
    }
    listings
        .iter()
        .filter(|l| l.title.to_lowercase().contains(&q) || l.address.to_lowercase().contains(&q))
        .cloned()
        .collect()
}

/// Sort ascending by monthly price; ties keep their relative order.
pub fn sort_by_price(listings: &mut [Listing]) {
    listings.sort_by_key(|l| l.price);
}

/// Keep listings with at least `min` bedrooms still available.
pub fn filter_by_available_bedrooms(listings: &[Listing], min: i64) -> Vec<Listing> {
    listings
        .iter()
        .filter(|l| l.bedrooms_available >= min)
        .cloned()
        .collect()
}
