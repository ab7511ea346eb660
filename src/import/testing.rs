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

//! In-memory import host for unit tests

use super::{AssetImporter, ImportHost};
use crate::assets::{share, ObjectStore, TypedAsset, UntypedAssetHandle};
use crate::config::{DatabaseConfig, GraphicsSettings};
use crate::error::{AssetError, Result};
use crate::location::{AssetLocation, AssetRoots};
use crate::persistence::Persistence;
use crate::time::{SystemTimeProvider, TimeProvider};
use ahash::AHashMap;
use std::path::PathBuf;

pub(crate) struct TestHost {
    pub dir: tempfile::TempDir,
    pub config: DatabaseConfig,
    pub roots: AssetRoots,
    pub clock: SystemTimeProvider,
    pub persistence: Persistence,
    pub objects: ObjectStore,
    pub graphics: GraphicsSettings,
    pub provided: AHashMap<String, UntypedAssetHandle>,
    pub hook_calls: Vec<String>,
    pub fail_hooks: bool,
}

impl TestHost {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::for_project(dir.path());
        std::fs::create_dir_all(config.assets_path()).unwrap();
        Self {
            roots: AssetRoots::from_config(&config),
            config,
            dir,
            clock: SystemTimeProvider,
            persistence: Persistence::default(),
            objects: ObjectStore::new(),
            graphics: GraphicsSettings::default(),
            provided: AHashMap::new(),
            hook_calls: Vec::new(),
            fail_hooks: false,
        }
    }

    pub fn location(&self, path: &str) -> AssetLocation {
        AssetLocation::from_path(path, &self.roots)
    }

    /// Write a source file and return its location.
    pub fn write(&self, path: &str, contents: &str) -> AssetLocation {
        let location = self.location(path);
        if let Some(parent) = location.asset_full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&location.asset_full_path, contents).unwrap();
        location
    }

    /// Make an object loadable through `load_asset`.
    pub fn provide<T: TypedAsset>(&mut self, path: &str, value: T) -> UntypedAssetHandle {
        let object = share(value);
        let id = self.objects.insert(object.clone());
        let handle = UntypedAssetHandle::new(id, object);
        self.provided.insert(path.to_string(), handle.clone());
        handle
    }
}

impl ImportHost for TestHost {
    fn clock(&self) -> &dyn TimeProvider {
        &self.clock
    }

    fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    fn objects_mut(&mut self) -> &mut ObjectStore {
        &mut self.objects
    }

    fn graphics_settings(&self) -> GraphicsSettings {
        self.graphics
    }

    fn artifacts_path(&self) -> PathBuf {
        self.config.artifacts_path()
    }

    fn resolve(&self, path: &str) -> AssetLocation {
        self.location(path)
    }

    fn has_importer(&mut self, path: &str) -> bool {
        self.provided.contains_key(path) || self.location(path).asset_full_path.exists()
    }

    fn load_asset(&mut self, path: &str) -> Option<UntypedAssetHandle> {
        self.provided.get(path).cloned()
    }

    fn will_reimport(&mut self, importer: &AssetImporter) -> Result<()> {
        self.hook_calls.push(format!("will:{}", importer.location()));
        if self.fail_hooks {
            return Err(AssetError::ImportFailed("hook".into()));
        }
        Ok(())
    }

    fn did_reimport(&mut self, importer: &AssetImporter, _imported: bool) -> Result<()> {
        self.hook_calls.push(format!("did:{}", importer.location()));
        if self.fail_hooks {
            return Err(AssetError::ImportFailed("hook".into()));
        }
        Ok(())
    }
}
