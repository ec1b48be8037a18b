//! Shared helpers for integration tests.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

/// How many parent directories to try when locating fixture files.
const MAX_PARENT_LOOKUPS: usize = 3;

/// Locate `relative` from the current directory or up to three parents.
pub fn find_testdata(relative: &str) -> Option<PathBuf> {
    let mut candidate = PathBuf::from(relative);
    for _ in 0..=MAX_PARENT_LOOKUPS {
        if candidate.exists() {
            return Some(candidate);
        }
        candidate = Path::new("..").join(candidate);
    }
    None
}

/// Read a fixture from `tests/testdata` and return its raw bytes and decoded value.
pub fn read_testdata<T: DeserializeOwned>(relative: &str) -> (Vec<u8>, T) {
    let path = find_testdata(&format!("tests/testdata/{}", relative))
        .unwrap_or_else(|| panic!("{} not found", relative));
    let data = std::fs::read(&path).unwrap_or_else(|e| panic!("{} read failed: {}", relative, e));
    let value = serde_json::from_slice(&data)
        .unwrap_or_else(|e| panic!("{} is not valid: {}", relative, e));
    (data, value)
}
