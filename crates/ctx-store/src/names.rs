//! Validation of endpoint and file names used as path segments.
//!
//! Context names never touch the filesystem (they are hashed), but endpoint
//! and TLS file names are joined onto directories as-is. A valid segment:
//! - Must be non-empty
//! - Must not be `.` or `..`
//! - Must not contain `/`, `\` or NUL
//! - Must parse as exactly one normal path component (no roots or prefixes)

use std::path::{Component, Path};

use crate::error::{StoreError, StoreResult};

/// Characters that are forbidden anywhere in a segment.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '\0'];

/// Validate one path segment, returning `Ok(())` if it stays inside its
/// parent directory when joined.
///
/// `what` names the segment in the error ("endpoint name", "file name").
///
/// # Examples
///
/// ```
/// use ctx_store::names::validate_path_segment;
///
/// assert!(validate_path_segment("file name", "ca.pem").is_ok());
/// assert!(validate_path_segment("file name", "..").is_err());
/// assert!(validate_path_segment("file name", "a/b").is_err());
/// ```
pub fn validate_path_segment(what: &'static str, segment: &str) -> StoreResult<()> {
    let invalid = |reason: String| StoreError::InvalidPathSegment {
        what,
        segment: segment.to_string(),
        reason,
    };

    if segment.is_empty() {
        return Err(invalid("must not be empty".into()));
    }

    if segment == "." || segment == ".." {
        return Err(invalid("must not be a relative directory reference".into()));
    }

    for ch in FORBIDDEN_CHARS {
        if segment.contains(*ch) {
            return Err(invalid(format!("contains forbidden character: {ch:?}")));
        }
    }

    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid("must be a single plain path component".into())),
    }
}

/// Validate an endpoint name.
pub fn validate_endpoint_name(endpoint: &str) -> StoreResult<()> {
    validate_path_segment("endpoint name", endpoint)
}

/// Validate a TLS file name.
pub fn validate_file_name(file: &str) -> StoreResult<()> {
    validate_path_segment("file name", file)
}
