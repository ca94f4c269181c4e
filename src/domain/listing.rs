use serde::{Deserialize, Serialize};

/// A rental-sublet record. Field names on the wire keep the original
/// backend's spelling (including "Availible") so existing documents and
/// clients keep decoding; the Rust names are spelled correctly.
///
/// `id` is assigned by the server on create. A locally constructed listing
/// carries no id until the gateway returns one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Listing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "userID", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub title: String,
    pub price: i64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,

    #[serde(rename = "totalNumberOfBedrooms")]
    pub total_bedrooms: i64,
    #[serde(rename = "totalNumberOfBathrooms")]
    pub total_bathrooms: i64,
    #[serde(rename = "totalSquareFootage")]
    pub total_square_footage: i64,
    #[serde(rename = "numberOfBedroomsAvailable")]
    pub bedrooms_available: i64,

    /// Availability window, seconds since epoch. Invariant: start <= end.
    #[serde(rename = "startDateAvailible")]
    pub start_date_available: i64,
    #[serde(rename = "lastDateAvailible")]
    pub last_date_available: i64,

    pub description: String,

    /// Folder key grouping this listing's photos in object storage.
    #[serde(rename = "storageID", skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,

    #[serde(rename = "imageURLs", skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
}

impl Listing {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }

    /// start <= end. Both dates are epoch seconds straight off the wire.
    pub fn has_valid_window(&self) -> bool {
        self.start_date_available <= self.last_date_available
    }
}
