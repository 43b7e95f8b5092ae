//! Blob-store path layout.

use crate::error::{CoreError, CoreResult};

/// Default blob path of the persisted index snapshot.
pub const DEFAULT_INDEX_SNAPSHOT_PATH: &str = "index/latest.flat";

/// Uploaded source image for an asset.
pub fn upload_path(user_id: &str, asset_id: &str) -> String {
    format!("uploads/{}/{}.jpg", user_id, asset_id)
}

/// Certificate JSON for an asset.
pub fn certificate_path(asset_id: &str) -> String {
    format!("certificates/{}.json", asset_id)
}

/// Badge PNG for an asset.
pub fn badge_path(asset_id: &str) -> String {
    format!("badges/{}.png", asset_id)
}

/// Reject ids that would escape their path prefix.
///
/// Ids are embedded directly in blob paths, so separators and parent
/// references are refused.
pub fn validate_path_segment(field: &str, value: &str) -> CoreResult<()> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0');
    if invalid {
        return Err(CoreError::ValidationError {
            field: field.to_string(),
            message: format!("'{}' is not a valid path segment", value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_layout() {
        assert_eq!(upload_path("u", "a"), "uploads/u/a.jpg");
        assert_eq!(certificate_path("a"), "certificates/a.json");
        assert_eq!(badge_path("a"), "badges/a.png");
    }

    #[test]
    fn test_validate_path_segment() {
        assert!(validate_path_segment("asset_id", "abc-123").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(
                validate_path_segment("asset_id", bad).is_err(),
                "'{}' must be rejected",
                bad
            );
        }
    }
}
