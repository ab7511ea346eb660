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


//! Shared fixtures for the integration tests

#![allow(dead_code)]

use asset_pipeline::{AssetDatabase, AssetNotification, DatabaseConfig, TimeProvider};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A temporary project directory
pub struct Project {
    pub dir: TempDir,
    pub config: DatabaseConfig,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::for_project(dir.path());
        std::fs::create_dir_all(config.assets_path()).unwrap();
        Self { dir, config }
    }

    /// Filesystem path of a logical asset path.
    pub fn path(&self, logical: &str) -> PathBuf {
        if let Some(rest) = logical.strip_prefix("Engine/Shaders/") {
            self.config.engine_shader_path.join(rest)
        } else if let Some(rest) = logical.strip_prefix("Engine/Resources/") {
            self.config.engine_resource_path.join(rest)
        } else {
            self.dir.path().join(logical)
        }
    }

    pub fn write(&self, logical: &str, contents: &str) -> PathBuf {
        let path = self.path(logical);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Rewrite a file and move its timestamp forward so the change is seen
    /// regardless of filesystem timestamp resolution.
    pub fn edit(&self, logical: &str, contents: &str) -> PathBuf {
        let path = self.path(logical);
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();
        std::fs::write(&path, contents).unwrap();
        set_modified(&path, before + Duration::from_secs(10));
        path
    }

    pub fn database(&self) -> AssetDatabase {
        AssetDatabase::new(self.config.clone())
    }

    pub fn database_with_clock(&self, clock: impl TimeProvider + 'static) -> AssetDatabase {
        AssetDatabase::with_clock(self.config.clone(), Box::new(clock))
    }
}

pub fn set_modified(path: &Path, time: std::time::SystemTime) {
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

pub type NotificationLog = Arc<Mutex<Vec<AssetNotification>>>;

/// Record every notification the database sends from now on.
pub fn record(database: &mut AssetDatabase) -> NotificationLog {
    let log = NotificationLog::default();
    let sink = log.clone();
    database.subscribe_fn(move |notification| {
        sink.lock().push(notification.clone());
        Ok(())
    });
    log
}

/// Paths of the recorded notifications of one kind, in order.
pub fn paths_of(log: &NotificationLog, kind: &str) -> Vec<String> {
    log.lock()
        .iter()
        .filter(|n| n.kind() == kind)
        .map(|n| n.location().asset_path.clone())
        .collect()
}
