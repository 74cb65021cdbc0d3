//! Scratch directories for unit tests.

use rand::{Rng, distributions::Alphanumeric};
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

const TEST_TMP_DIR: &str = "tests/tmp";

/// A fresh directory under `tests/tmp`, removed again when dropped.
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub fn new(sub_path: &str) -> Self {
        let rand_string: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        let path = PathBuf::from(TEST_TMP_DIR).join(format!("unit-{}-{}", sub_path, rand_string));
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }
}

impl Deref for TestDir {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
