/// Everything the client can load lives below this directory.
pub const ASSET_ROOT_MARKER: &str = "images/";

/// Image shown for hidden pile faces.
pub const CARD_BACK: &str = "/static/assets/cardback.png";

/// Turns a raw image path from the authority into a root-relative URL.
///
/// Backslashes become slashes, anything before the last `images/` marker is
/// dropped, and the result gets exactly one leading slash. Empty paths have
/// no image.
pub fn normalize_image_path(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let mut path = raw.replace('\\', "/");
    // ASCII lowercasing keeps byte offsets valid for `path`
    if let Some(idx) = path.to_ascii_lowercase().rfind(ASSET_ROOT_MARKER) {
        path = path[idx..].to_string();
    }

    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!("/{trimmed}"))
}
