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

//! Asset location resolver
//!
//! Maps a logical asset path (`Assets/Textures/a.png`, `Engine/Shaders/Lit.shader`)
//! to its file on disk, its importer metadata file and its category. Nothing
//! in here touches the filesystem.

use crate::config::DatabaseConfig;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Suffix of importer metadata files
pub const IMPORTER_FILE_EXTENSION: &str = ".meta";

const PROJECT_PREFIX: &str = "Assets/";
const ENGINE_SHADER_PREFIX: &str = "Engine/Shaders/";
const ENGINE_RESOURCE_PREFIX: &str = "Engine/Resources/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    /// Not importable
    Unknown,
    ProjectAsset,
    EngineShader,
    EngineResource,
}

/// Filesystem roots the resolver maps logical prefixes onto.
#[derive(Debug, Clone)]
pub struct AssetRoots {
    pub project: PathBuf,
    pub engine_shaders: PathBuf,
    pub engine_resources: PathBuf,
    pub meta: PathBuf,
}

impl AssetRoots {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            project: config.project_path.clone(),
            engine_shaders: config.engine_shader_path.clone(),
            engine_resources: config.engine_resource_path.clone(),
            meta: config.meta_path(),
        }
    }

    fn assets(&self) -> PathBuf {
        self.project.join(DatabaseConfig::ASSETS_DIR)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetLocation {
    pub category: AssetCategory,
    /// Logical path, forward slashes, no trailing slash
    pub asset_path: String,
    pub asset_full_path: PathBuf,
    /// Importer metadata file
    pub importer_full_path: PathBuf,
}

impl AssetLocation {
    /// Resolve a logical asset path.
    pub fn from_path(path: &str, roots: &AssetRoots) -> Self {
        let path = normalize_path(path);

        if is_importer_file_path(&path) {
            return Self::unknown(path);
        }

        if let Some(rest) = strip_prefix_ignore_case(&path, PROJECT_PREFIX) {
            let asset_path = format!("{PROJECT_PREFIX}{rest}");
            let asset_full_path = roots.assets().join(rest);
            let importer_full_path = with_meta_suffix(&asset_full_path);
            return Self {
                category: AssetCategory::ProjectAsset,
                asset_path,
                asset_full_path,
                importer_full_path,
            };
        }

        if let Some(rest) = strip_prefix_ignore_case(&path, ENGINE_SHADER_PREFIX) {
            return Self::engine(
                AssetCategory::EngineShader,
                format!("{ENGINE_SHADER_PREFIX}{rest}"),
                roots.engine_shaders.join(rest),
                roots,
            );
        }

        if let Some(rest) = strip_prefix_ignore_case(&path, ENGINE_RESOURCE_PREFIX) {
            return Self::engine(
                AssetCategory::EngineResource,
                format!("{ENGINE_RESOURCE_PREFIX}{rest}"),
                roots.engine_resources.join(rest),
                roots,
            );
        }

        Self::unknown(path)
    }

    /// Resolve a filesystem path back to its logical location.
    pub fn from_full_path(full_path: &Path, roots: &AssetRoots) -> Self {
        let full = normalize_path(&full_path.to_string_lossy());

        if is_importer_file_path(&full) {
            return Self::unknown(full);
        }

        let candidates = [
            (roots.engine_shaders.clone(), ENGINE_SHADER_PREFIX),
            (roots.engine_resources.clone(), ENGINE_RESOURCE_PREFIX),
            (roots.assets(), PROJECT_PREFIX),
        ];

        // Longest root wins when roots are nested.
        let matched = candidates
            .iter()
            .filter_map(|(root, prefix)| {
                let root = normalize_path(&root.to_string_lossy());
                let rest = full.strip_prefix(&root)?.strip_prefix('/')?;
                (!rest.is_empty()).then(|| (root.len(), format!("{prefix}{rest}")))
            })
            .max_by_key(|(len, _)| *len);

        match matched {
            Some((_, asset_path)) => Self::from_path(&asset_path, roots),
            None => Self::unknown(full),
        }
    }

    pub fn is_editable(&self) -> bool {
        self.category == AssetCategory::ProjectAsset
    }

    pub fn is_unknown(&self) -> bool {
        self.category == AssetCategory::Unknown
    }

    /// Lower-cased extension including the dot, or an empty string.
    pub fn extension(&self) -> String {
        extension_of(&self.asset_path)
    }

    /// Last path component.
    pub fn file_name(&self) -> &str {
        self.asset_path
            .rsplit_once('/')
            .map_or(self.asset_path.as_str(), |(_, name)| name)
    }

    /// Logical path of the containing folder, if any.
    pub fn parent_path(&self) -> Option<&str> {
        self.asset_path.rsplit_once('/').map(|(parent, _)| parent)
    }

    fn engine(
        category: AssetCategory,
        asset_path: String,
        asset_full_path: PathBuf,
        roots: &AssetRoots,
    ) -> Self {
        let importer_full_path = with_meta_suffix(&roots.meta.join(&asset_path));
        Self {
            category,
            asset_path,
            asset_full_path,
            importer_full_path,
        }
    }

    fn unknown(path: String) -> Self {
        let asset_full_path = PathBuf::from(&path);
        let importer_full_path = with_meta_suffix(&asset_full_path);
        Self {
            category: AssetCategory::Unknown,
            asset_path: path,
            asset_full_path,
            importer_full_path,
        }
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.asset_path)
    }
}

/// Convert separators to `/` and strip trailing slashes.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Byte-wise so the suffix may cut through a multi-byte character.
pub fn is_importer_file_path(path: &str) -> bool {
    path.as_bytes()
        .len()
        .checked_sub(IMPORTER_FILE_EXTENSION.len())
        .is_some_and(|start| {
            path.as_bytes()[start..].eq_ignore_ascii_case(IMPORTER_FILE_EXTENSION.as_bytes())
        })
}

/// Lower-cased extension including the dot, or an empty string.
pub fn extension_of(path: &str) -> String {
    let name = path.rsplit_once('/').map_or(path, |(_, name)| name);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[dot..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// ASCII case-insensitive `strip_prefix`.
pub fn strip_prefix_ignore_case<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let head = path.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &path[prefix.len()..])
}

fn with_meta_suffix(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(IMPORTER_FILE_EXTENSION);
    PathBuf::from(os)
}
