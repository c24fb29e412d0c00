//! Uploaded filename handling.
//!
//! Uploaded files are stored under a timestamp prefix; these helpers cover
//! the extension allow-list, sanitization of caller-supplied names, and the
//! reverse mapping from a stored name back to a display name.

/// File extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["mdb", "accdb", "sqlite", "db"];

/// Returns the lowercase extension of a filename, if any.
pub fn extension(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Checks whether a filename carries an allowed database extension.
pub fn allowed_file(name: &str) -> bool {
    extension(name)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Sanitizes a caller-supplied filename into a safe path component.
///
/// Keeps ASCII alphanumerics, dots, dashes and underscores; everything else
/// becomes an underscore. Leading dots are stripped so the result can never
/// be a hidden file or a traversal fragment.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// Recovers the original display name from a stored `{timestamp}_{name}`
/// filename. Names without a prefix are returned unchanged.
pub fn display_name(stored: &str) -> String {
    match stored.split_once('_') {
        Some((prefix, rest)) if !rest.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => stored.to_string(),
    }
}

/// Validates a caller-supplied database identifier as a single safe path
/// component: no separators, no parent references, not empty or hidden.
pub fn is_safe_component(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains('/')
        && !id.contains('\\')
        && !id.contains("..")
}
