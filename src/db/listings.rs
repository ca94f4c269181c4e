use crate::domain::Listing;
use crate::errors::ServerError;
use rand::{distributions::Alphanumeric, Rng};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Opaque document id in the style the original backend assigned:
/// 20 random alphanumeric characters.
pub fn new_listing_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

const LISTING_COLUMNS: &str = r#"
    id, user_id, title, price, address, latitude, longitude,
    total_bedrooms, total_bathrooms, total_square_footage, bedrooms_available,
    start_date_available, last_date_available, description, storage_id, image_urls
"#;

fn row_to_listing(row: &Row) -> rusqlite::Result<Listing> {
    let image_urls: Option<String> = row.get(15)?;
    Ok(Listing {
        id: Some(row.get(0)?),
        user_id: Some(row.get(1)?),
        title: row.get(2)?,
        price: row.get(3)?,
        address: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        total_bedrooms: row.get(7)?,
        total_bathrooms: row.get(8)?,
        total_square_footage: row.get(9)?,
        bedrooms_available: row.get(10)?,
        start_date_available: row.get(11)?,
        last_date_available: row.get(12)?,
        description: row.get(13)?,
        storage_id: row.get(14)?,
        image_urls: image_urls.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

fn image_urls_json(listing: &Listing) -> Result<Option<String>, ServerError> {
    match &listing.image_urls {
        Some(urls) => serde_json::to_string(urls)
            .map(Some)
            .map_err(|e| ServerError::DbError(format!("serialize image urls failed: {e}"))),
        None => Ok(None),
    }
}

pub fn insert_listing(
    conn: &Connection,
    id: &str,
    user_id: &str,
    listing: &Listing,
    now: i64,
) -> Result<(), ServerError> {
    let image_urls = image_urls_json(listing)?;

    conn.execute(
        r#"
        INSERT INTO listings (
            id, user_id, title, price, address, latitude, longitude,
            total_bedrooms, total_bathrooms, total_square_footage, bedrooms_available,
            start_date_available, last_date_available, description, storage_id,
            image_urls, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        "#,
        params![
            id,
            user_id,
            listing.title,
            listing.price,
            listing.address,
            listing.latitude,
            listing.longitude,
            listing.total_bedrooms,
            listing.total_bathrooms,
            listing.total_square_footage,
            listing.bedrooms_available,
            listing.start_date_available,
            listing.last_date_available,
            listing.description,
            listing.storage_id,
            image_urls,
            now,
        ],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(())
}

pub fn get_all_listings(conn: &Connection) -> Result<Vec<Listing>, ServerError> {
    let sql = format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY created_at DESC, id");
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map([], row_to_listing)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

pub fn get_listings_by_user(conn: &Connection, user_id: &str) -> Result<Vec<Listing>, ServerError> {
    let sql = format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE user_id = ? ORDER BY created_at DESC, id"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map([user_id], row_to_listing)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

pub fn get_listing(conn: &Connection, id: &str) -> Result<Option<Listing>, ServerError> {
    let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?");
    conn.query_row(&sql, [id], row_to_listing)
        .optional()
        .map_err(|e| ServerError::DbError(e.to_string()))
}

/// Overwrite a listing's editable fields. Ownership is checked by the
/// caller; `user_id`, `storage_id` and `created_at` never change on update.
pub fn update_listing(conn: &Connection, id: &str, listing: &Listing) -> Result<(), ServerError> {
    conn.execute(
        r#"
        UPDATE listings SET
            title = ?1, price = ?2, address = ?3, latitude = ?4, longitude = ?5,
            total_bedrooms = ?6, total_bathrooms = ?7, total_square_footage = ?8,
            bedrooms_available = ?9, start_date_available = ?10,
            last_date_available = ?11, description = ?12
        WHERE id = ?13
        "#,
        params![
            listing.title,
            listing.price,
            listing.address,
            listing.latitude,
            listing.longitude,
            listing.total_bedrooms,
            listing.total_bathrooms,
            listing.total_square_footage,
            listing.bedrooms_available,
            listing.start_date_available,
            listing.last_date_available,
            listing.description,
            id,
        ],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(())
}

/// Returns true when a row was actually removed.
pub fn delete_listing(conn: &Connection, id: &str) -> Result<bool, ServerError> {
    let n = conn
        .execute("DELETE FROM listings WHERE id = ?", [id])
        .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(n > 0)
}
