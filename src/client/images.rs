use crate::storage::{ObjectStore, StorageError};
use std::fmt;
use std::thread;

/// Upper bound on photos attached to one listing.
pub const MAX_PHOTOS_PER_LISTING: usize = 10;

/// Hard ceiling on a single downloaded photo.
pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug)]
pub enum ImageError {
    TooManyPhotos(usize),
    /// At least one upload in the group failed; the keyed failures ride along.
    UploadFailed(Vec<String>),
    Storage(StorageError),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::TooManyPhotos(n) => {
                write!(f, "{n} photos exceeds the {MAX_PHOTOS_PER_LISTING} photo limit")
            }
            ImageError::UploadFailed(keys) => write!(f, "upload failed for: {}", keys.join(", ")),
            ImageError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for ImageError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoFormat {
    Jpeg,
    Png,
}

/// A displayable photo: raw bytes plus the sniffed container format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub name: String,
    pub format: PhotoFormat,
    pub bytes: Vec<u8>,
}

/// One upload's outcome, keyed so partial failure is visible per item.
#[derive(Debug)]
pub struct UploadOutcome {
    pub key: String,
    pub result: Result<(), StorageError>,
}

pub fn folder_key(storage_id: &str) -> String {
    format!("listings/{storage_id}")
}

/// Index-derived object key; indices keep names lexicographically ordered
/// for up to MAX_PHOTOS_PER_LISTING photos.
pub fn photo_key(storage_id: &str, index: usize) -> String {
    format!("listings/{storage_id}/photo_{index}.jpg")
}

/// Container sniffing from magic bytes. Anything else is undisplayable
/// and gets skipped on the download path.
pub fn sniff_format(bytes: &[u8]) -> Option<PhotoFormat> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(PhotoFormat::Jpeg);
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(PhotoFormat::Png);
    }
    None
}

/// Upload every photo concurrently under the listing's folder key: start
/// one worker per photo, join them all, and report per-item outcomes.
/// Callers treat the group as failed if any item failed; workers that
/// already finished are not rolled back.
pub fn upload_photos<S: ObjectStore + ?Sized>(
    store: &S,
    storage_id: &str,
    photos: &[Vec<u8>],
) -> Result<Vec<UploadOutcome>, ImageError> {
    if photos.len() > MAX_PHOTOS_PER_LISTING {
        return Err(ImageError::TooManyPhotos(photos.len()));
    }

    let outcomes = thread::scope(|scope| {
        let workers: Vec<_> = photos
            .iter()
            .enumerate()
            .map(|(index, bytes)| {
                let key = photo_key(storage_id, index);
                scope.spawn(move || {
                    let result = store.put(&key, bytes);
                    UploadOutcome { key, result }
                })
            })
            .collect();

        workers
            .into_iter()
            .enumerate()
            .map(|(index, worker)| {
                worker.join().unwrap_or_else(|_| UploadOutcome {
                    key: photo_key(storage_id, index),
                    result: Err(StorageError::Io("upload worker panicked".to_string())),
                })
            })
            .collect::<Vec<_>>()
    });
    Ok(outcomes)
}

/// All-or-nothing view over `upload_photos`.
pub fn upload_all<S: ObjectStore + ?Sized>(
    store: &S,
    storage_id: &str,
    photos: &[Vec<u8>],
) -> Result<(), ImageError> {
    let outcomes = upload_photos(store, storage_id, photos)?;
    let failed: Vec<String> = outcomes
        .iter()
        .filter(|o| o.result.is_err())
        .map(|o| o.key.clone())
        .collect();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(ImageError::UploadFailed(failed))
    }
}

/// Load a listing's photos for display: list the folder, fetch each object
/// concurrently under the size ceiling, then re-sort by name so display
/// order is deterministic regardless of fetch interleaving. A fetch or
/// decode failure skips that photo with a log line; the rest still load.
pub fn load_photos<S: ObjectStore + ?Sized>(
    store: &S,
    storage_id: &str,
) -> Result<Vec<Photo>, ImageError> {
    let keys = store
        .list(&folder_key(storage_id))
        .map_err(ImageError::Storage)?;

    let mut fetched: Vec<(String, Result<Vec<u8>, StorageError>)> = thread::scope(|scope| {
        let workers: Vec<_> = keys
            .iter()
            .map(|key| {
                scope.spawn(move || {
                    let result = store.get(key, MAX_PHOTO_BYTES);
                    (key.clone(), result)
                })
            })
            .collect();

        workers
            .into_iter()
            .filter_map(|worker| worker.join().ok())
            .collect()
    });

    // unordered parallel fetch, deterministic display order
    fetched.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut photos = Vec::new();
    for (key, result) in fetched {
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Skipping photo {key}: {e}");
                continue;
            }
        };
        match sniff_format(&bytes) {
            Some(format) => photos.push(Photo {
                name: key,
                format,
                bytes,
            }),
            None => eprintln!("Skipping photo {key}: unrecognized image data"),
        }
    }
    Ok(photos)
}
