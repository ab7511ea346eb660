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

//! Modification detection
//!
//! Staleness is decided from timestamps only. A dependency is tracked by the
//! write time of its importer metadata file rather than its source file: a
//! reimport always rewrites the metadata, so dependers notice it even when
//! the dependency's own source timestamp did not move.

use super::ImportHost;
use crate::location::AssetLocation;
use crate::time::TimeProvider;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySnapshot {
    pub path: String,
    pub importer_last_write_time: Option<SystemTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModificationDetector {
    asset_last_write_time: Option<SystemTime>,
    dependencies: Vec<DependencySnapshot>,
}

impl ModificationDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asset_last_write_time(&self) -> Option<SystemTime> {
        self.asset_last_write_time
    }

    /// Record the source file's current write time.
    pub fn sync_asset(&mut self, location: &AssetLocation, clock: &dyn TimeProvider) {
        self.asset_last_write_time = clock.last_write_time(&location.asset_full_path);
    }

    pub fn is_asset_modified(&self, location: &AssetLocation, clock: &dyn TimeProvider) -> bool {
        clock.last_write_time(&location.asset_full_path) != self.asset_last_write_time
    }

    pub fn are_dependencies_modified(&self, host: &dyn ImportHost) -> bool {
        self.dependencies.iter().any(|dependency| {
            let location = host.resolve(&dependency.path);
            host.clock().last_write_time(&location.importer_full_path)
                != dependency.importer_last_write_time
        })
    }

    pub fn is_modified(&self, location: &AssetLocation, host: &dyn ImportHost) -> bool {
        self.is_asset_modified(location, host.clock()) || self.are_dependencies_modified(host)
    }

    /// Replace the dependency list with the current metadata write times.
    /// Paths with no importer are skipped.
    pub fn update_dependencies<I>(&mut self, paths: I, host: &mut dyn ImportHost)
    where
        I: IntoIterator<Item = String>,
    {
        let mut dependencies: Vec<DependencySnapshot> = Vec::new();
        for path in paths {
            if dependencies.iter().any(|d| d.path == path) {
                continue;
            }
            if !host.has_importer(&path) {
                warn!(path = %path, "dependency has no importer, skipped");
                continue;
            }
            let location = host.resolve(&path);
            dependencies.push(DependencySnapshot {
                importer_last_write_time: host.clock().last_write_time(&location.importer_full_path),
                path,
            });
        }
        self.dependencies = dependencies;
    }

    /// Re-key a dependency after its asset moved. The recorded time is kept,
    /// so the move itself still counts as a modification.
    pub fn rename_dependency(&mut self, old_path: &str, new_path: &str) -> bool {
        let mut renamed = false;
        for dependency in &mut self.dependencies {
            if dependency.path == old_path {
                dependency.path = new_path.to_string();
                renamed = true;
            }
        }
        renamed
    }

    pub fn dependencies(&self) -> &[DependencySnapshot] {
        &self.dependencies
    }

    pub fn dependency_paths(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.path.as_str())
    }
}
