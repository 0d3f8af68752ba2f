/// Extension used when a payload does not declare a recognizable image type.
pub const DEFAULT_EXTENSION: &str = "png";

pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x47, 0x49, 0x46, 0x38, ..] => "image/gif",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}

/// Map a declared media type to the file extension used when saving.
///
/// Only `image/<subtype>` types whose subtype is made of letters and `+` are
/// honoured; everything else, including an undeclared type, saves as `.png`.
pub fn extension_for_mime(mime_type: Option<&str>) -> String {
    let Some(subtype) = mime_type.and_then(|m| m.strip_prefix("image/")) else {
        return DEFAULT_EXTENSION.to_string();
    };

    match subtype {
        "jpeg" => "jpg".to_string(),
        "png" | "gif" | "webp" => subtype.to_string(),
        other
            if !other.is_empty()
                && other.chars().all(|c| c.is_ascii_alphabetic() || c == '+') =>
        {
            other.to_string()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}
