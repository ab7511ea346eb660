// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Clock abstraction
//!
//! All wall-clock reads and file timestamp reads go through [`TimeProvider`]
//! so tests can drive the dirty-save debounce without sleeping.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Time provider abstraction for test isolation
pub trait TimeProvider: Send + Sync {
    fn now(&self) -> SystemTime;
    fn file_modified(&self, path: &Path) -> std::io::Result<SystemTime>;

    /// Modification time, or `None` when the file is missing or unreadable.
    fn last_write_time(&self, path: &Path) -> Option<SystemTime> {
        self.file_modified(path).ok()
    }
}

/// System time provider for production use
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn file_modified(&self, path: &Path) -> std::io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }
}

/// Manually advanced clock. File timestamps still come from the filesystem.
///
/// Cloning shares the underlying instant, so a test can keep one handle and
/// give the other to the database.
#[derive(Clone)]
pub struct ManualTimeProvider {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualTimeProvider {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now += delta;
    }

    pub fn set(&self, instant: SystemTime) {
        *self.now.lock() = instant;
    }
}

impl Default for ManualTimeProvider {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}

impl TimeProvider for ManualTimeProvider {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }

    fn file_modified(&self, path: &Path) -> std::io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }
}

/// Absolute distance between two instants.
pub fn elapsed_between(earlier: SystemTime, later: SystemTime) -> Duration {
    match later.duration_since(earlier) {
        Ok(delta) => delta,
        Err(err) => err.duration(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualTimeProvider::default();
        let other = clock.clone();
        let start = clock.now();

        other.advance(Duration::from_secs(3));
        assert_eq!(clock.now(), start + Duration::from_secs(3));
    }

    #[test]
    fn test_missing_file_has_no_write_time() {
        let clock = SystemTimeProvider;
        assert!(clock
            .last_write_time(Path::new("/definitely/not/here.txt"))
            .is_none());
    }

    #[test]
    fn test_elapsed_between_is_symmetric() {
        let a = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let b = SystemTime::UNIX_EPOCH + Duration::from_secs(12);
        assert_eq!(elapsed_between(a, b), Duration::from_secs(2));
        assert_eq!(elapsed_between(b, a), Duration::from_secs(2));
    }
}
