use crate::domain::Listing;
use reqwest::blocking::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum GatewayError {
    Network(String),
    Decode(String),
    /// The create response carried no id ("cannot parse response").
    MissingId,
    /// The listing is not in a state the call accepts (e.g. update without id).
    InvalidListing(String),
    /// Non-2xx from the server, body passed through for display.
    Rejected { status: u16, message: String },
    /// Client-side short-circuit: the acting user does not own the listing.
    /// No request is sent when this is returned.
    OwnerMismatch,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Network(msg) => write!(f, "Network error: {msg}"),
            GatewayError::Decode(msg) => write!(f, "Decode error: {msg}"),
            GatewayError::MissingId => write!(f, "cannot parse response: missing id"),
            GatewayError::InvalidListing(msg) => write!(f, "Invalid listing: {msg}"),
            GatewayError::Rejected { status, message } => {
                write!(f, "Server rejected request ({status}): {message}")
            }
            GatewayError::OwnerMismatch => {
                write!(f, "Edit denied: listing does not belong to user")
            }
        }
    }
}

impl std::error::Error for GatewayError {}

/// The remote listing surface. A trait so the cache/sync layer can be
/// exercised against a scripted double without a server.
pub trait ListingApi {
    fn fetch_all(&self) -> Result<Vec<Listing>, GatewayError>;
    fn fetch_by_owner(&self, user_id: &str) -> Result<Vec<Listing>, GatewayError>;
    /// Returns the id the server assigned.
    fn create(&self, listing: &Listing, user_id: &str) -> Result<String, GatewayError>;
    fn update(&self, listing: &Listing, user_id: &str) -> Result<(), GatewayError>;
    fn delete(&self, id: &str) -> Result<(), GatewayError>;
}

/// Thin request/response client over the listing endpoints. One exchange
/// per call, no retries; every failure is terminal for its invocation.
pub struct ListingGateway {
    base_url: String,
    client: Client,
}

impl ListingGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, function: &str) -> String {
        format!("{}/{}", self.base_url, function)
    }

    fn get_json(&self, url: &str) -> Result<Value, GatewayError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    fn post_json(&self, url: &str, payload: &Value) -> Result<String, GatewayError> {
        let resp = self
            .client
            .post(url)
            .json(payload)
            .send()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(text)
    }

    fn lookup_user_field(&self, function: &str, user_id: &str, field: &str) -> Result<String, GatewayError> {
        let url = format!("{}?userID={}", self.url(function), user_id);
        let value = self.get_json(&url)?;
        value[field]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Decode(format!("missing {field} field")))
    }

    /// `getUserEmail` — backed by the auth provider's user record.
    pub fn user_email(&self, user_id: &str) -> Result<String, GatewayError> {
        self.lookup_user_field("getUserEmail", user_id, "email")
    }

    /// `getUserName` — backed by the auth provider's user record.
    pub fn user_name(&self, user_id: &str) -> Result<String, GatewayError> {
        self.lookup_user_field("getUserName", user_id, "name")
    }
}

impl ListingApi for ListingGateway {
    fn fetch_all(&self) -> Result<Vec<Listing>, GatewayError> {
        let value = self.get_json(&self.url("getListings"))?;
        serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    fn fetch_by_owner(&self, user_id: &str) -> Result<Vec<Listing>, GatewayError> {
        let url = format!("{}?userID={}", self.url("getUserListings"), user_id);
        let value = self.get_json(&url)?;
        serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    fn create(&self, listing: &Listing, user_id: &str) -> Result<String, GatewayError> {
        let payload = create_payload(listing, user_id)?;
        let body = self.post_json(&self.url("createListing"), &payload)?;
        parse_create_response(&body)
    }

    fn update(&self, listing: &Listing, user_id: &str) -> Result<(), GatewayError> {
        let id = listing
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::InvalidListing("update requires an id".to_string()))?;

        let mut payload = create_payload(listing, user_id)?;
        payload["id"] = Value::String(id.to_string());
        self.post_json(&self.url("updateListing"), &payload)?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), GatewayError> {
        let url = format!("{}?id={}", self.url("deleteListing"), id);
        self.get_json(&url).map(|_| ()).or_else(|e| match e {
            // plain-text success bodies ("Listing and images deleted
            // successfully") are not JSON; only real rejections count
            GatewayError::Decode(_) => Ok(()),
            other => Err(other),
        })
    }
}

/// Full field set plus the owner id, dates as numeric seconds. The `id`
/// field is left to the caller (absent on create, set on update).
fn create_payload(listing: &Listing, user_id: &str) -> Result<Value, GatewayError> {
    let mut value =
        serde_json::to_value(listing).map_err(|e| GatewayError::Decode(e.to_string()))?;
    value["userID"] = Value::String(user_id.to_string());
    Ok(value)
}

fn parse_create_response(body: &str) -> Result<String, GatewayError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
    match value["id"].as_str() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(GatewayError::MissingId),
    }
}
