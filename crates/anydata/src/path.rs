//! Dataset file name resolution.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anydata_error::{AnyDataError, Result};

/// Suffix appended to dataset names given without an extension.
pub const DEFAULT_EXTENSION: &str = ".anydata.xml";

/// Append [`DEFAULT_EXTENSION`] to a bare file name.
///
/// Names that already carry an extension and stream-style locations
/// (anything containing `://`) are returned unchanged.
pub fn with_default_extension(path: &Path) -> PathBuf {
    let is_stream = path.to_string_lossy().contains("://");
    if path.extension().is_some() || is_stream {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(DEFAULT_EXTENSION);
    PathBuf::from(name)
}

/// Pick the file a save should write to.
///
/// An explicit path wins (after extension defaulting); otherwise the path the
/// dataset was opened from is used. With neither, the save has no
/// destination.
pub fn resolve_save_path(explicit: Option<&Path>, bound: Option<&Path>) -> Result<PathBuf> {
    match (explicit, bound) {
        (Some(path), _) => Ok(with_default_extension(path)),
        (None, Some(path)) => Ok(path.to_path_buf()),
        (None, None) => Err(AnyDataError::MissingDestination),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_gets_suffix() {
        assert_eq!(
            with_default_extension(Path::new("data/people")),
            PathBuf::from("data/people.anydata.xml")
        );
    }

    #[test]
    fn extension_is_kept() {
        assert_eq!(
            with_default_extension(Path::new("people.xml")),
            PathBuf::from("people.xml")
        );
        assert_eq!(
            with_default_extension(Path::new("people.anydata.xml")),
            PathBuf::from("people.anydata.xml")
        );
    }

    #[test]
    fn stream_paths_are_untouched() {
        assert_eq!(
            with_default_extension(Path::new("mem://scratch")),
            PathBuf::from("mem://scratch")
        );
    }

    #[test]
    fn explicit_path_wins() {
        let resolved =
            resolve_save_path(Some(Path::new("out")), Some(Path::new("in.anydata.xml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("out.anydata.xml"));
    }

    #[test]
    fn bound_path_is_fallback() {
        let resolved = resolve_save_path(None, Some(Path::new("in.anydata.xml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("in.anydata.xml"));
    }

    #[test]
    fn no_destination() {
        let err = resolve_save_path(None, None).unwrap_err();
        assert!(matches!(err, AnyDataError::MissingDestination));
    }
}
