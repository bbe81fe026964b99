//! Collision-free destination names.
//!
//! When a category folder already holds a file with the desired name, the
//! incoming file gets a numeric suffix before its extension: `report.pdf`
//! becomes `report_1.pdf`, then `report_2.pdf`, and so on.
//!
//! The existence check and the subsequent move are not atomic. Callers must
//! serialize resolution and move against the same directory.
use crate::file_category::split_extension;
use std::path::{Path, PathBuf};

/// Returns a path inside `destination_dir` that does not exist at call time.
///
/// # Examples
///
/// ```
/// use filesorter::conflict::resolve_destination;
/// use std::fs;
///
/// let dir = tempfile::tempdir().unwrap();
/// assert_eq!(resolve_destination(dir.path(), "report.pdf"), dir.path().join("report.pdf"));
///
/// fs::write(dir.path().join("report.pdf"), "v1").unwrap();
/// assert_eq!(resolve_destination(dir.path(), "report.pdf"), dir.path().join("report_1.pdf"));
/// ```
pub fn resolve_destination(destination_dir: &Path, desired_file_name: &str) -> PathBuf {
    let candidate = destination_dir.join(desired_file_name);
    if !occupied(&candidate) {
        return candidate;
    }

    let (stem, extension) = split_extension(desired_file_name);
    let extension = extension.unwrap_or("");

    let mut counter: u64 = 1;
    loop {
        let candidate = destination_dir.join(format!("{}_{}{}", stem, counter, extension));
        if !occupied(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Treats dangling symlinks as occupied so they are never clobbered.
fn occupied(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_free_name_is_returned_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let resolved = resolve_destination(temp_dir.path(), "report.pdf");
        assert_eq!(resolved, temp_dir.path().join("report.pdf"));
    }

    #[test]
    fn test_counter_increments_until_free() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        fs::write(dir.join("report.pdf"), "a").expect("Failed to write file");
        assert_eq!(resolve_destination(dir, "report.pdf"), dir.join("report_1.pdf"));

        fs::write(dir.join("report_1.pdf"), "b").expect("Failed to write file");
        assert_eq!(resolve_destination(dir, "report.pdf"), dir.join("report_2.pdf"));
    }

    #[test]
    fn test_gap_in_sequence_is_reused() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        fs::write(dir.join("photo.jpg"), "a").expect("Failed to write file");
        fs::write(dir.join("photo_2.jpg"), "c").expect("Failed to write file");

        assert_eq!(resolve_destination(dir, "photo.jpg"), dir.join("photo_1.jpg"));
    }

    #[test]
    fn test_name_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        fs::write(dir.join("README"), "a").expect("Failed to write file");
        assert_eq!(resolve_destination(dir, "README"), dir.join("README_1"));

        fs::write(dir.join(".env"), "a").expect("Failed to write file");
        assert_eq!(resolve_destination(dir, ".env"), dir.join(".env_1"));
    }

    #[test]
    fn test_suffix_goes_before_final_extension_only() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        fs::write(dir.join("archive.tar.gz"), "a").expect("Failed to write file");
        assert_eq!(
            resolve_destination(dir, "archive.tar.gz"),
            dir.join("archive.tar_1.gz")
        );
    }

    #[test]
    fn test_directory_with_same_name_counts_as_taken() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        fs::create_dir(dir.join("notes.txt")).expect("Failed to create directory");
        assert_eq!(resolve_destination(dir, "notes.txt"), dir.join("notes_1.txt"));
    }
}
