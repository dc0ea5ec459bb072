//! Default configuration lookup relative to the working directory.
//!
//! Kept in its own test binary: it changes the process working directory.

use std::fs;

use shifter_rust::builders::ConfigurationError;
use shifter_rust::config::ShifterConfig;
use tempfile::TempDir;

#[test]
fn test_from_default_location_search_order() {
    let original = std::env::current_dir().unwrap();
    let root = TempDir::new().unwrap();
    let work = root.path().join("work");
    fs::create_dir_all(work.join("rust_backend")).unwrap();
    std::env::set_current_dir(&work).unwrap();

    let missing = ShifterConfig::from_default_location();

    // Parent directory is the last resort.
    fs::write(root.path().join("shifter.toml"), "[semesters]\nfirst = \"10-10-2030\"\n").unwrap();
    let from_parent = ShifterConfig::from_default_location();

    fs::write(
        work.join("rust_backend/shifter.toml"),
        "[semesters]\nfirst = \"11-10-2030\"\n",
    )
    .unwrap();
    let from_backend = ShifterConfig::from_default_location();

    fs::write(work.join("shifter.toml"), "[semesters]\nfirst = \"12-10-2030\"\n").unwrap();
    let from_current = ShifterConfig::from_default_location();

    fs::write(work.join("shifter.toml"), "[cache]\nttl_secs = 0\n").unwrap();
    let invalid = ShifterConfig::from_default_location();

    std::env::set_current_dir(original).unwrap();

    assert!(matches!(missing, Err(ConfigurationError::Invalid(_))));
    assert_eq!(from_parent.unwrap().semesters.first, "10-10-2030");
    assert_eq!(from_backend.unwrap().semesters.first, "11-10-2030");
    assert_eq!(from_current.unwrap().semesters.first, "12-10-2030");
    assert!(matches!(invalid, Err(ConfigurationError::Invalid(_))));
}
