use std::path::{Path, PathBuf};

const OUTPUT_SUFFIX: &str = "-HDR.png";

/// Highest numeric suffix tried before giving up on a crowded directory.
pub const MAX_COLLISION_COUNTER: u32 = 999;

/// Formats a playback position as `HH-MM-SS-mmm`, rounded to the millisecond.
///
/// Negative or non-finite positions format as zero; hours widen past two digits
/// only when needed.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() {
        (seconds * 1000.0).round().max(0.0) as u64
    } else {
        0
    };

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    format!("{:02}-{:02}-{:02}-{:03}", hours, minutes, secs, millis)
}

/// Picks the directory screenshots are written to, always with a trailing `/`.
///
/// A configured directory wins; otherwise the source file's parent is used.
/// Returns `None` when neither yields a directory (e.g. `/movie.mkv`).
pub fn derive_output_dir(configured: Option<&str>, source_path: &Path) -> Option<String> {
    let configured = configured.map(str::trim).filter(|dir| !dir.is_empty());

    let dir = match configured {
        Some(dir) => dir.to_string(),
        None => {
            let source = source_path.to_string_lossy();
            match source.rfind('/') {
                Some(idx) if idx > 0 => source[..idx].to_string(),
                _ => return None,
            }
        }
    };

    if dir.ends_with('/') {
        Some(dir)
    } else {
        Some(format!("{}/", dir))
    }
}

/// Builds `{dir}{stem}-{timestamp}-HDR.png`, inserting `-1`, `-2`, ... before the
/// suffix while the candidate exists. Returns `None` for an empty stem or once
/// every suffix up to [`MAX_COLLISION_COUNTER`] is taken.
pub fn build_output_path(dir: &str, stem: &str, seconds: f64) -> Option<PathBuf> {
    let stem = stem.trim();
    if stem.is_empty() {
        return None;
    }

    let base = format!("{}{}-{}", dir, stem, format_timestamp(seconds));
    let first = PathBuf::from(format!("{}{}", base, OUTPUT_SUFFIX));
    if !first.exists() {
        return Some(first);
    }

    (1..=MAX_COLLISION_COUNTER)
        .map(|counter| PathBuf::from(format!("{}-{}{}", base, counter, OUTPUT_SUFFIX)))
        .find(|candidate| !candidate.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::File;

    fn dir_string(dir: &tempfile::TempDir) -> String {
        format!("{}/", dir.path().display())
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(3725.125), "01-02-05-125");
        assert_eq!(format_timestamp(0.0), "00-00-00-000");
        assert_eq!(format_timestamp(5.0), "00-00-05-000");
        assert_eq!(format_timestamp(59.9996), "00-01-00-000");
        assert_eq!(format_timestamp(360_000.0), "100-00-00-000");
        assert_eq!(format_timestamp(-3.0), "00-00-00-000");
        assert_eq!(format_timestamp(f64::NAN), "00-00-00-000");
    }

    #[test]
    fn test_derive_output_dir_configured() {
        let source = Path::new("/videos/movie.mkv");
        assert_eq!(derive_output_dir(Some("/out"), source).as_deref(), Some("/out/"));
        assert_eq!(derive_output_dir(Some("/out/"), source).as_deref(), Some("/out/"));
    }

    #[test]
    fn test_derive_output_dir_from_source() {
        assert_eq!(
            derive_output_dir(None, Path::new("/videos/movie.mkv")).as_deref(),
            Some("/videos/")
        );
        assert_eq!(
            derive_output_dir(Some("   "), Path::new("/videos/movie.mkv")).as_deref(),
            Some("/videos/")
        );
        assert_eq!(derive_output_dir(None, Path::new("/movie.mkv")), None);
        assert_eq!(derive_output_dir(None, Path::new("movie.mkv")), None);
    }

    #[test]
    fn test_build_output_path_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = build_output_path(&dir_string(&dir), "movie", 5.0).unwrap();

        assert_eq!(path, dir.path().join("movie-00-00-05-000-HDR.png"));
    }

    #[test]
    fn test_build_output_path_collision_appends_counter() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("foo-01-00-00-000-HDR.png")).unwrap();

        let path = build_output_path(&dir_string(&dir), "foo", 3600.0).unwrap();
        assert_eq!(path, dir.path().join("foo-01-00-00-000-1-HDR.png"));
        assert!(!path.exists());
    }

    #[test]
    fn test_build_output_path_skips_taken_counters() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("foo-00-00-01-000-HDR.png")).unwrap();
        File::create(dir.path().join("foo-00-00-01-000-1-HDR.png")).unwrap();
        File::create(dir.path().join("foo-00-00-01-000-2-HDR.png")).unwrap();

        let path = build_output_path(&dir_string(&dir), "foo", 1.0).unwrap();
        assert_eq!(path, dir.path().join("foo-00-00-01-000-3-HDR.png"));
    }

    #[test]
    fn test_build_output_path_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("foo-01-00-00-000-HDR.png")).unwrap();
        for counter in 1..=MAX_COLLISION_COUNTER {
            File::create(dir.path().join(format!("foo-01-00-00-000-{}-HDR.png", counter))).unwrap();
        }

        assert_eq!(build_output_path(&dir_string(&dir), "foo", 3600.0), None);
    }

    #[test]
    fn test_build_output_path_empty_stem() {
        assert_eq!(build_output_path("/out/", "  ", 1.0), None);
    }
}
