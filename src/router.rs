use crate::db::{listings, users, Database};
use crate::domain::Listing;
use crate::errors::{ResultResp, ServerError};
use crate::responses::{json_response, text_response};
use crate::storage::ObjectStore;
use astra::Request;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::io::Read;

pub fn handle<S: ObjectStore>(mut req: Request, db: &Database, store: &S) -> ResultResp {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method.as_str(), path.as_str()) {
        ("POST", "/createListing") => create_listing(&mut req, db),
        ("GET", "/getListings") => get_listings(db),
        ("GET", "/getUserListings") => get_user_listings(&req, db),
        ("GET", "/getUserEmail") => get_user_field(&req, db, UserField::Email),
        ("GET", "/getUserName") => get_user_field(&req, db, UserField::Name),
        ("POST", "/updateListing") => update_listing(&mut req, db),
        ("GET", "/deleteListing") => delete_listing(&req, db, store),
        _ => Err(ServerError::NotFound("Not Found".to_string())),
    }
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    match req.uri().query() {
        Some(q) => url::form_urlencoded::parse(q.as_bytes())
            .into_owned()
            .collect(),
        None => HashMap::new(),
    }
}

fn require_param(req: &Request, name: &str, missing_msg: &str) -> Result<String, ServerError> {
    let mut params = parse_query(req);
    params
        .remove(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::BadRequest(missing_msg.to_string()))
}

fn read_body(req: &mut Request) -> Result<Vec<u8>, ServerError> {
    let mut buf = Vec::new();
    req.body_mut()
        .reader()
        .read_to_end(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("failed to read body: {e}")))?;
    Ok(buf)
}

fn parse_listing(body: &[u8]) -> Result<Listing, ServerError> {
    serde_json::from_slice(body)
        .map_err(|e| ServerError::BadRequest(format!("invalid listing body: {e}")))
}

fn create_listing(req: &mut Request, db: &Database) -> ResultResp {
    let body = read_body(req)?;
    let listing = parse_listing(&body)?;

    let user_id = listing
        .user_id
        .clone()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Missing userID".to_string()))?;
    if !listing.has_valid_window() {
        return Err(ServerError::BadRequest(
            "availability start date is after end date".to_string(),
        ));
    }

    let id = listings::new_listing_id();
    let now = Utc::now().timestamp();
    db.with_conn(|conn| listings::insert_listing(conn, &id, &user_id, &listing, now))?;

    json_response(&json!({ "id": id }))
}

fn get_listings(db: &Database) -> ResultResp {
    let all = db.with_conn(|conn| listings::get_all_listings(conn))?;
    json_response(&all)
}

fn get_user_listings(req: &Request, db: &Database) -> ResultResp {
    let user_id = require_param(req, "userID", "Missing userID")?;
    let mine = db.with_conn(|conn| listings::get_listings_by_user(conn, &user_id))?;
    json_response(&mine)
}

enum UserField {
    Email,
    Name,
}

fn get_user_field(req: &Request, db: &Database, field: UserField) -> ResultResp {
    let user_id = require_param(req, "userID", "Missing userID")?;

    let user = db
        .with_conn(|conn| users::get_user(conn, &user_id))?
        .ok_or_else(|| ServerError::NotFound("User not found".to_string()))?;

    match field {
        UserField::Email => json_response(&json!({ "email": user.email })),
        UserField::Name => json_response(&json!({ "name": user.name })),
    }
}

fn update_listing(req: &mut Request, db: &Database) -> ResultResp {
    let body = read_body(req)?;
    let listing = parse_listing(&body)?;

    let id = listing
        .id
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Missing id or userID".to_string()))?;
    let user_id = listing
        .user_id
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Missing id or userID".to_string()))?;
    if !listing.has_valid_window() {
        return Err(ServerError::BadRequest(
            "availability start date is after end date".to_string(),
        ));
    }

    db.with_conn(|conn| {
        let stored = listings::get_listing(conn, &id)?
            .ok_or_else(|| ServerError::NotFound("Listing not found".to_string()))?;

        // the authoritative ownership check; clients short-circuit earlier
        if !stored.is_owned_by(&user_id) {
            return Err(ServerError::Forbidden("Unauthorized".to_string()));
        }
        listings::update_listing(conn, &id, &listing)
    })?;

    text_response(200, "Listing updated successfully")
}

fn delete_listing<S: ObjectStore>(req: &Request, db: &Database, store: &S) -> ResultResp {
    let id = require_param(req, "id", "Missing listing ID")?;

    let stored = db
        .with_conn(|conn| listings::get_listing(conn, &id))?
        .ok_or_else(|| ServerError::NotFound("Listing not found".to_string()))?;

    let message = match stored.storage_id.as_deref().filter(|s| !s.is_empty()) {
        Some(storage_id) => {
            // purge the image folder first; a failed object delete is
            // logged and the document is removed regardless
            let folder = format!("listings/{storage_id}");
            for (key, result) in store.delete_prefix(&folder) {
                if let Err(e) = result {
                    eprintln!("Failed to delete stored object {key}: {e}");
                }
            }
            "Listing and images deleted successfully"
        }
        None => "Listing deleted without images",
    };

    db.with_conn(|conn| listings::delete_listing(conn, &id))?;
    text_response(200, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FsObjectStore, StorageError};
    use astra::{Body, Response};

    fn test_db(dir: &tempfile::TempDir) -> Database {
        let path = dir.path().join("test.sqlite3");
        let db = Database::new(path.to_string_lossy().into_owned());
        db.with_conn(|conn| {
            conn.execute_batch(include_str!("../sql/schema.sql"))
                .map_err(|e| ServerError::DbError(e.to_string()))
        })
        .unwrap();
        db
    }

    fn get(uri: &str) -> Request {
        http::Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::from(String::new()))
            .unwrap()
    }

    fn post(uri: &str, body: serde_json::Value) -> Request {
        http::Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn body_json(resp: Response) -> serde_json::Value {
        let mut body = resp.into_body();
        let mut buf = Vec::new();
        body.reader().read_to_end(&mut buf).unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    fn room_a_payload(user_id: &str) -> serde_json::Value {
        json!({
            "userID": user_id,
            "title": "Room A",
            "price": 500,
            "address": "1 Main St",
            "latitude": 39.95,
            "longitude": -75.19,
            "totalNumberOfBedrooms": 2,
            "totalNumberOfBathrooms": 1,
            "totalSquareFootage": 800,
            "numberOfBedroomsAvailable": 1,
            "startDateAvailible": 100,
            "lastDateAvailible": 200,
            "description": "desc"
        })
    }

    #[test]
    fn create_then_fetch_all_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = FsObjectStore::new(dir.path().join("objects"));

        let resp = handle(post("/createListing", room_a_payload("u-1")), &db, &store).unwrap();
        assert_eq!(resp.status(), 200);
        let created = body_json(resp);
        let id = created["id"].as_str().unwrap().to_string();
        assert!(!id.is_empty());

        let resp = handle(get("/getListings"), &db, &store).unwrap();
        assert_eq!(resp.status(), 200);
        let all = body_json(resp);
        let all = all.as_array().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["id"], id.as_str());
        assert_eq!(all[0]["title"], "Room A");
        assert_eq!(all[0]["price"], 500);
    }

    #[test]
    fn create_without_user_id_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = FsObjectStore::new(dir.path().join("objects"));

        let mut payload = room_a_payload("u-1");
        payload.as_object_mut().unwrap().remove("userID");

        match handle(post("/createListing", payload), &db, &store) {
            Err(ServerError::BadRequest(msg)) => assert_eq!(msg, "Missing userID"),
            Err(other) => panic!("expected BadRequest, got {other:?}"),
            Ok(_) => panic!("expected BadRequest, got success"),
        }
    }

    #[test]
    fn create_with_inverted_window_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = FsObjectStore::new(dir.path().join("objects"));

        let mut payload = room_a_payload("u-1");
        payload["startDateAvailible"] = json!(300);
        payload["lastDateAvailible"] = json!(200);

        assert!(matches!(
            handle(post("/createListing", payload), &db, &store),
            Err(ServerError::BadRequest(_))
        ));
    }

    #[test]
    fn user_listings_filter_by_owner_and_require_param() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = FsObjectStore::new(dir.path().join("objects"));

        handle(post("/createListing", room_a_payload("u-1")), &db, &store).unwrap();
        handle(post("/createListing", room_a_payload("u-2")), &db, &store).unwrap();

        let resp = handle(get("/getUserListings?userID=u-1"), &db, &store).unwrap();
        let mine = body_json(resp);
        assert_eq!(mine.as_array().unwrap().len(), 1);
        assert_eq!(mine[0]["userID"], "u-1");

        assert!(matches!(
            handle(get("/getUserListings"), &db, &store),
            Err(ServerError::BadRequest(_))
        ));
    }

    #[test]
    fn update_requires_matching_owner() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = FsObjectStore::new(dir.path().join("objects"));

        let resp = handle(post("/createListing", room_a_payload("u-1")), &db, &store).unwrap();
        let id = body_json(resp)["id"].as_str().unwrap().to_string();

        let mut hijack = room_a_payload("u-2");
        hijack["id"] = json!(id.clone());
        hijack["title"] = json!("Hijacked");

        match handle(post("/updateListing", hijack), &db, &store) {
            Err(ServerError::Forbidden(msg)) => assert_eq!(msg, "Unauthorized"),
            Err(other) => panic!("expected Forbidden, got {other:?}"),
            Ok(_) => panic!("expected Forbidden, got success"),
        }

        // stored document untouched
        let all = body_json(handle(get("/getListings"), &db, &store).unwrap());
        assert_eq!(all[0]["title"], "Room A");
    }

    #[test]
    fn update_happy_path_and_missing_listing() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = FsObjectStore::new(dir.path().join("objects"));

        let resp = handle(post("/createListing", room_a_payload("u-1")), &db, &store).unwrap();
        let id = body_json(resp)["id"].as_str().unwrap().to_string();

        let mut edit = room_a_payload("u-1");
        edit["id"] = json!(id.clone());
        edit["title"] = json!("Room A+");
        edit["price"] = json!(650);

        let resp = handle(post("/updateListing", edit.clone()), &db, &store).unwrap();
        assert_eq!(resp.status(), 200);

        let all = body_json(handle(get("/getListings"), &db, &store).unwrap());
        assert_eq!(all[0]["title"], "Room A+");
        assert_eq!(all[0]["price"], 650);
        // owner never changes on update
        assert_eq!(all[0]["userID"], "u-1");

        edit["id"] = json!("does-not-exist");
        assert!(matches!(
            handle(post("/updateListing", edit), &db, &store),
            Err(ServerError::NotFound(_))
        ));
    }

    #[test]
    fn update_without_id_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = FsObjectStore::new(dir.path().join("objects"));

        let payload = room_a_payload("u-1");
        match handle(post("/updateListing", payload), &db, &store) {
            Err(ServerError::BadRequest(msg)) => assert_eq!(msg, "Missing id or userID"),
            Err(other) => panic!("expected BadRequest, got {other:?}"),
            Ok(_) => panic!("expected BadRequest, got success"),
        }
    }

    #[test]
    fn user_lookup_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = FsObjectStore::new(dir.path().join("objects"));

        db.with_conn(|conn| users::upsert_user(conn, "u-1", "ada@example.com", "Ada"))
            .unwrap();

        let email = body_json(handle(get("/getUserEmail?userID=u-1"), &db, &store).unwrap());
        assert_eq!(email["email"], "ada@example.com");

        let name = body_json(handle(get("/getUserName?userID=u-1"), &db, &store).unwrap());
        assert_eq!(name["name"], "Ada");

        assert!(matches!(
            handle(get("/getUserEmail?userID=ghost"), &db, &store),
            Err(ServerError::NotFound(_))
        ));
        assert!(matches!(
            handle(get("/getUserName"), &db, &store),
            Err(ServerError::BadRequest(_))
        ));
    }

    #[test]
    fn delete_purges_image_folder_then_document() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = FsObjectStore::new(dir.path().join("objects"));

        let mut payload = room_a_payload("u-1");
        payload["storageID"] = json!("f1");
        let resp = handle(post("/createListing", payload), &db, &store).unwrap();
        let id = body_json(resp)["id"].as_str().unwrap().to_string();

        for i in 0..3 {
            store
                .put(&format!("listings/f1/photo_{i}.jpg"), b"img")
                .unwrap();
        }

        let resp = handle(get(&format!("/deleteListing?id={id}")), &db, &store).unwrap();
        assert_eq!(resp.status(), 200);

        assert!(store.list("listings/f1").unwrap().is_empty());
        let all = body_json(handle(get("/getListings"), &db, &store).unwrap());
        assert!(all.as_array().unwrap().is_empty());
    }

    #[test]
    fn delete_without_folder_only_removes_document() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = FsObjectStore::new(dir.path().join("objects"));

        let resp = handle(post("/createListing", room_a_payload("u-1")), &db, &store).unwrap();
        let id = body_json(resp)["id"].as_str().unwrap().to_string();

        let resp = handle(get(&format!("/deleteListing?id={id}")), &db, &store).unwrap();
        assert_eq!(resp.status(), 200);

        assert!(matches!(
            handle(get(&format!("/deleteListing?id={id}")), &db, &store),
            Err(ServerError::NotFound(_))
        ));
        assert!(matches!(
            handle(get("/deleteListing"), &db, &store),
            Err(ServerError::BadRequest(_))
        ));
    }

    /// Object store whose deletes always fail, for exercising the
    /// documented non-atomicity between image purge and record purge.
    struct UndeletableStore(FsObjectStore);

    impl ObjectStore for UndeletableStore {
        fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
            self.0.put(key, bytes)
        }
        fn get(&self, key: &str, max_len: u64) -> Result<Vec<u8>, StorageError> {
            self.0.get(key, max_len)
        }
        fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
            self.0.list(prefix)
        }
        fn delete(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Io("synthetic delete failure".to_string()))
        }
    }

    #[test]
    fn document_is_removed_even_when_image_purge_fails() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = UndeletableStore(FsObjectStore::new(dir.path().join("objects")));

        let mut payload = room_a_payload("u-1");
        payload["storageID"] = json!("f1");
        let resp = handle(post("/createListing", payload), &db, &store).unwrap();
        let id = body_json(resp)["id"].as_str().unwrap().to_string();

        store.put("listings/f1/photo_0.jpg", b"img").unwrap();

        let resp = handle(get(&format!("/deleteListing?id={id}")), &db, &store).unwrap();
        assert_eq!(resp.status(), 200);

        // objects survive, document does not
        assert_eq!(store.list("listings/f1").unwrap().len(), 1);
        let all = body_json(handle(get("/getListings"), &db, &store).unwrap());
        assert!(all.as_array().unwrap().is_empty());
    }

    #[test]
    fn unknown_route_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir);
        let store = FsObjectStore::new(dir.path().join("objects"));

        assert!(matches!(
            handle(get("/nope"), &db, &store),
            Err(ServerError::NotFound(_))
        ));
    }
}
