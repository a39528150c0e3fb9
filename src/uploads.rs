use std::{fs, io, path::Path};

use crate::state::UploadConfig;

/// Content types accepted for avatar/room/location images.
pub fn extension_for(content_type: Option<&str>) -> Option<&'static str> {
    match content_type {
        Some("image/png") => Some("png"),
        Some("image/jpeg") => Some("jpg"),
        Some("image/webp") => Some("webp"),
        Some("image/gif") => Some("gif"),
        _ => None,
    }
}

/// Writes the uploaded bytes under the uploads directory and returns the
/// public URL the record should store.
pub fn store_image(
    config: &UploadConfig,
    file_stem: &str,
    extension: &str,
    bytes: &[u8],
) -> io::Result<String> {
    fs::create_dir_all(&config.dir)?;
    let file_name = format!("{file_stem}.{extension}");
    fs::write(Path::new(&config.dir).join(&file_name), bytes)?;
    Ok(config.url_for(&file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_image_content_types_are_accepted() {
        assert_eq!(extension_for(Some("image/png")), Some("png"));
        assert_eq!(extension_for(Some("image/jpeg")), Some("jpg"));
        assert_eq!(extension_for(Some("text/html")), None);
        assert_eq!(extension_for(None), None);
    }

    #[test]
    fn stored_image_gets_public_url() {
        let dir = std::env::temp_dir().join("roomnest-upload-test");
        let config = UploadConfig {
            dir: dir.to_string_lossy().into_owned(),
            public_base: "/static".to_string(),
        };
        let url = store_image(&config, "abc123", "png", b"fake-png").unwrap();
        assert_eq!(url, "/static/abc123.png");
        assert_eq!(fs::read(dir.join("abc123.png")).unwrap(), b"fake-png");
        let _ = fs::remove_dir_all(dir);
    }
}
