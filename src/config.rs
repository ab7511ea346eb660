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

//! Database configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Output color space used when compiling shaders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColorSpace {
    Gamma,
    #[default]
    Linear,
}

/// Global render settings that compiled shader output depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsSettings {
    pub reversed_z: bool,
    pub color_space: ColorSpace,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            reversed_z: true,
            color_space: ColorSpace::Linear,
        }
    }
}

/// Asset database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Project directory; contains `Assets/`, `Library/` and `Meta/`
    pub project_path: PathBuf,
    /// Directory mapped to `Engine/Shaders/`
    pub engine_shader_path: PathBuf,
    /// Directory mapped to `Engine/Resources/`
    pub engine_resource_path: PathBuf,
    /// Minimum time between two flushes of dirty assets, in milliseconds
    pub dirty_save_interval_ms: u64,
    /// Start OS file watchers during `initialize`
    pub watch_file_system: bool,
    pub graphics: GraphicsSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::for_project(".")
    }
}

impl DatabaseConfig {
    pub const ASSETS_DIR: &'static str = "Assets";
    pub const LIBRARY_DIR: &'static str = "Library";
    pub const META_DIR: &'static str = "Meta";
    pub const ARTIFACTS_DIR: &'static str = "Artifacts";

    /// Configuration for a project directory, with engine content under
    /// `<project>/Engine`.
    pub fn for_project(path: impl Into<PathBuf>) -> Self {
        let project_path = path.into();
        Self {
            engine_shader_path: project_path.join("Engine").join("Shaders"),
            engine_resource_path: project_path.join("Engine").join("Resources"),
            project_path,
            dirty_save_interval_ms: 2_000,
            watch_file_system: false,
            graphics: GraphicsSettings::default(),
        }
    }

    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn dirty_save_interval(&self) -> Duration {
        Duration::from_millis(self.dirty_save_interval_ms)
    }

    pub fn assets_path(&self) -> PathBuf {
        self.project_path.join(Self::ASSETS_DIR)
    }

    pub fn library_path(&self) -> PathBuf {
        self.project_path.join(Self::LIBRARY_DIR)
    }

    /// Cache artifacts root: `<project>/Library/Artifacts`
    pub fn artifacts_path(&self) -> PathBuf {
        self.library_path().join(Self::ARTIFACTS_DIR)
    }

    /// Metadata tree for read-only engine content: `<project>/Meta`
    pub fn meta_path(&self) -> PathBuf {
        self.project_path.join(Self::META_DIR)
    }
}
