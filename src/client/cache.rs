use crate::domain::Listing;
use std::env;
use std::fs;
use std::path::PathBuf;

const ALL_LISTINGS_FILE: &str = "allListings.json";

fn user_listings_file(user_id: &str) -> String {
    format!("userListings_{user_id}.json")
}

/// Whole-collection snapshots on disk: a flat JSON array per file,
/// overwritten wholesale on every save. No partial updates, no versioning;
/// last writer wins. Read/write failures are logged and swallowed — a
/// broken cache behaves like an absent one.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory from `SUBLETHUB_CACHE`, defaulting next to the
    /// working directory.
    pub fn from_env() -> Self {
        let dir = env::var("SUBLETHUB_CACHE").unwrap_or_else(|_| ".sublethub-cache".to_string());
        Self::new(dir)
    }

    fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    fn save(&self, listings: &[Listing], filename: &str) {
        let data = match serde_json::to_vec(listings) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Snapshot save error ({filename}): {e}");
                return;
            }
        };
        if let Err(e) = fs::create_dir_all(&self.dir) {
            eprintln!("Snapshot save error ({filename}): {e}");
            return;
        }

        // write-then-rename so a crashed save never leaves a torn snapshot
        let tmp = self.path_for(&format!("{filename}.tmp"));
        let result = fs::write(&tmp, &data).and_then(|_| fs::rename(&tmp, self.path_for(filename)));
        if let Err(e) = result {
            eprintln!("Snapshot save error ({filename}): {e}");
        }
    }

    fn load(&self, filename: &str) -> Option<Vec<Listing>> {
        let path = self.path_for(filename);
        if !path.exists() {
            return None;
        }
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Snapshot load error ({filename}): {e}");
                return None;
            }
        };
        match serde_json::from_slice(&data) {
            Ok(listings) => Some(listings),
            Err(e) => {
                eprintln!("Snapshot decode error ({filename}): {e}");
                None
            }
        }
    }

    pub fn save_all_listings(&self, listings: &[Listing]) {
        self.save(listings, ALL_LISTINGS_FILE);
    }

    pub fn load_all_listings(&self) -> Option<Vec<Listing>> {
        self.load(ALL_LISTINGS_FILE)
    }

    pub fn save_user_listings(&self, listings: &[Listing], user_id: &str) {
        self.save(listings, &user_listings_file(user_id));
    }

    pub fn load_user_listings(&self, user_id: &str) -> Option<Vec<Listing>> {
        self.load(&user_listings_file(user_id))
    }
}
