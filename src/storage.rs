//! Local filesystem storage for uploaded donation photos.
//!
//! Files are written under the configured uploads directory with a
//! timestamp-prefixed, sanitized filename and served back via actix-files.

use actix_web::web;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;

/// File extensions accepted for donation photos.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

#[derive(Debug)]
pub enum StorageError {
    /// Upload rejected because the extension is not an allowed image type.
    DisallowedExtension(String),
    /// Filesystem failure while writing.
    Io(std::io::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::DisallowedExtension(name) => {
                write!(f, "disallowed file type: {}", name)
            }
            StorageError::Io(e) => write!(f, "storage io error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Create the uploads directory. Called once at startup.
pub fn init() {
    let path = crate::app_config::storage().uploads_path;
    fs::create_dir_all(&path).expect("Failed to create uploads directory.");
    log::info!("Photo storage initialized at {:?}", path);
}

/// Strip path components and reduce a client-supplied filename to a safe
/// character set.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let mut sanitized: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    // A name of only dots/underscores would vanish into the prefix.
    sanitized = sanitized.trim_matches(|c| c == '.' || c == '_').to_string();
    if sanitized.is_empty() {
        sanitized = "upload".to_string();
    }
    sanitized
}

/// Lowercased extension of a filename, if it is in the image allow-list.
pub fn allowed_extension(name: &str) -> Option<String> {
    let ext = name.rsplit('.').next()?.to_lowercase();
    if name.contains('.') && ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

/// Build the stored filename: `YYYYmmdd_HHMMSS_<sanitized original>`.
pub fn timestamped_name(now: NaiveDateTime, original: &str) -> String {
    format!(
        "{}_{}",
        now.format("%Y%m%d_%H%M%S"),
        sanitize_filename(original)
    )
}

/// Validate and persist an uploaded photo. Returns the stored filename to
/// record on the donation row.
pub async fn save_photo(data: Vec<u8>, original_name: &str) -> Result<String, StorageError> {
    if allowed_extension(original_name).is_none() {
        return Err(StorageError::DisallowedExtension(original_name.to_owned()));
    }

    let filename = timestamped_name(chrono::Utc::now().naive_utc(), original_name);
    let path = PathBuf::from(crate::app_config::storage().uploads_path).join(&filename);

    log::info!("storing donation photo at {:?}", path);

    // Blocking filesystem write off the async executor.
    web::block(move || fs::write(&path, data))
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename("C:\\pics\\cat.png"), "cat.png");
        assert_eq!(sanitize_filename("..."), "upload");
    }

    #[test]
    fn extension_allow_list() {
        assert_eq!(allowed_extension("cat.JPG").as_deref(), Some("jpg"));
        assert_eq!(allowed_extension("cat.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(allowed_extension("cat.png").as_deref(), Some("png"));
        assert_eq!(allowed_extension("anim.gif").as_deref(), Some("gif"));
        assert!(allowed_extension("script.php").is_none());
        assert!(allowed_extension("noextension").is_none());
        assert!(allowed_extension("archive.tar.gz").is_none());
    }

    #[test]
    fn stored_name_is_timestamp_prefixed() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 30, 9)
            .unwrap();
        assert_eq!(
            timestamped_name(ts, "warm coat.jpg"),
            "20240305_143009_warm_coat.jpg"
        );
    }
}
