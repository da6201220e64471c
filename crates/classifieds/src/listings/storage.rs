use mime::Mime;

use super::domain::ListingId;
use crate::access::UserId;

/// Object storage holding listing images.
pub trait ImageStore: Send + Sync {
    /// Bucket segment that appears in every public URL this store hands out.
    fn bucket(&self) -> &str;
    /// Writes (or overwrites) the object at `path`.
    fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &Mime) -> Result<(), StorageError>;
    fn public_url(&self, path: &str) -> String;
    fn remove(&self, paths: &[String]) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("{0}")]
    Rejected(String),
    #[error("magazyn plików jest niedostępny: {0}")]
    Unavailable(String),
}

/// One file submitted for an image slot.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Zero-based slot index.
    pub slot: usize,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Object key for an uploaded image: `{user}/{listing}/{slot}.{ext}`.
pub fn slot_object_path(user_id: UserId, listing_id: ListingId, slot: usize, file_name: &str) -> String {
    format!("{user_id}/{listing_id}/{slot}.{}", file_extension(file_name))
}

/// Lower-cased extension of the uploaded file name, `jpg` when there is none.
pub fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "jpg".to_string())
}

pub fn content_type_for(path: &str) -> Mime {
    mime_guess::from_path(path).first_or(mime::IMAGE_JPEG)
}

/// Recovers the object path from a public URL: everything after `/{bucket}/`, without the
/// query string. URLs pointing elsewhere yield `None`.
pub fn storage_path_from_public_url(url: &str, bucket: &str) -> Option<String> {
    let needle = format!("/{bucket}/");
    let start = url.find(&needle)? + needle.len();
    let path = url[start..].split('?').next().unwrap_or_default().trim();
    (!path.is_empty()).then(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn extracts_path_after_bucket_segment() {
        let url = "https://cdn.example.com/storage/v1/object/public/listing-images/u1/l1/0.jpg?token=abc";
        assert_eq!(
            storage_path_from_public_url(url, "listing-images").as_deref(),
            Some("u1/l1/0.jpg")
        );
    }

    #[test]
    fn foreign_or_empty_urls_have_no_path() {
        assert_eq!(
            storage_path_from_public_url("https://elsewhere.example.com/a.jpg", "listing-images"),
            None
        );
        assert_eq!(
            storage_path_from_public_url("https://cdn.example.com/listing-images/?v=1", "listing-images"),
            None
        );
    }

    #[test]
    fn object_path_uses_slot_and_lowercased_extension() {
        let user = UserId(Uuid::nil());
        let listing = ListingId(Uuid::nil());
        let path = slot_object_path(user, listing, 3, "Rower.PNG");
        assert_eq!(path, format!("{}/{}/3.png", Uuid::nil(), Uuid::nil()));
        assert_eq!(file_extension("bez-rozszerzenia"), "jpg");
        assert_eq!(file_extension("archive."), "jpg");
        assert_eq!(content_type_for(&path), mime::IMAGE_PNG);
    }
}
