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

//! Per-import asset collection

use super::{AssetData, ImportHost};
use crate::assets::{share, AssetHandle, SharedAsset, TypedAsset, UntypedAssetHandle};
use crate::config::GraphicsSettings;
use crate::error::{AssetError, Result};
use crate::guid::AssetGuid;
use crate::location::AssetLocation;
use ahash::AHashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Name of the main asset when the importer does not choose one
pub const MAIN_ASSET_NAME: &str = "Main";

/// Icons shown for an asset in the editor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetIcons {
    pub normal: Option<String>,
    pub expanded: Option<String>,
}

impl AssetIcons {
    pub fn new(normal: &str) -> Self {
        Self {
            normal: Some(normal.to_string()),
            expanded: None,
        }
    }

    pub fn folder() -> Self {
        Self {
            normal: Some("folder".to_string()),
            expanded: Some("folder-open".to_string()),
        }
    }
}

/// Output of a successful import pass
pub struct ImportResults {
    pub main_asset_guid: AssetGuid,
    pub assets: BTreeMap<AssetGuid, AssetData>,
    /// Records from the previous import whose names were not produced again
    pub unused: Vec<AssetData>,
    pub dependencies: SmallVec<[String; 4]>,
    /// Produced objects, kept alive until their caches are written
    pub objects: Vec<(AssetGuid, SharedAsset)>,
}

impl ImportResults {
    /// Every record this pass saw, used to roll back to the previous map.
    pub fn into_previous(self) -> BTreeMap<AssetGuid, AssetData> {
        self.assets
            .into_values()
            .chain(self.unused)
            .map(|data| (data.guid(), data))
            .collect()
    }
}

/// Collects the objects produced by one importer invocation.
///
/// Records from the previous import are pooled by name, so an output that
/// keeps its name keeps its guid and, while alive, its live object.
pub struct AssetImportContext<'a> {
    host: &'a mut dyn ImportHost,
    location: &'a AssetLocation,
    main_asset_name: Option<String>,
    produced: Vec<AssetData>,
    pool: AHashMap<String, AssetData>,
    keep_alive: Vec<SharedAsset>,
    dependencies: SmallVec<[String; 4]>,
}

impl<'a> AssetImportContext<'a> {
    pub fn new(
        host: &'a mut dyn ImportHost,
        location: &'a AssetLocation,
        previous: BTreeMap<AssetGuid, AssetData>,
    ) -> Self {
        let pool = previous
            .into_values()
            .map(|data| (data.name().to_string(), data))
            .collect();
        Self {
            host,
            location,
            main_asset_name: None,
            produced: Vec::new(),
            pool,
            keep_alive: Vec::new(),
            dependencies: SmallVec::new(),
        }
    }

    pub fn location(&self) -> &AssetLocation {
        self.location
    }

    pub fn host(&self) -> &dyn ImportHost {
        &*self.host
    }

    pub fn graphics_settings(&self) -> GraphicsSettings {
        self.host.graphics_settings()
    }

    pub fn read_source_bytes(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.location.asset_full_path)?)
    }

    pub fn read_source_text(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.location.asset_full_path)?)
    }

    pub fn add_main_asset<T: TypedAsset>(&mut self) -> Result<AssetHandle<T>> {
        self.add_asset(MAIN_ASSET_NAME, true, AssetIcons::default())
    }

    pub fn add_main_asset_with_icons<T: TypedAsset>(
        &mut self,
        icons: AssetIcons,
    ) -> Result<AssetHandle<T>> {
        self.add_asset(MAIN_ASSET_NAME, true, icons)
    }

    pub fn add_main_asset_named<T: TypedAsset>(&mut self, name: &str) -> Result<AssetHandle<T>> {
        self.add_asset(name, true, AssetIcons::default())
    }

    pub fn add_sub_asset<T: TypedAsset>(&mut self, name: &str) -> Result<AssetHandle<T>> {
        self.add_asset(name, false, AssetIcons::default())
    }

    pub fn add_asset<T: TypedAsset>(
        &mut self,
        name: &str,
        is_main: bool,
        icons: AssetIcons,
    ) -> Result<AssetHandle<T>> {
        let handle = self.add_asset_with(name, is_main, icons, T::TYPE_NAME, || {
            share(T::default())
        })?;
        let found = handle.type_name();
        handle.typed::<T>().ok_or_else(|| AssetError::TypeMismatch {
            expected: T::TYPE_NAME,
            found: found.to_string(),
        })
    }

    /// Add an output by type name. `create` runs only when no live object
    /// of that type can be reused.
    pub fn add_asset_with(
        &mut self,
        name: &str,
        is_main: bool,
        icons: AssetIcons,
        type_name: &str,
        create: impl FnOnce() -> SharedAsset,
    ) -> Result<UntypedAssetHandle> {
        if self.produced.iter().any(|data| data.name() == name) {
            return Err(AssetError::DuplicateAssetName(format!(
                "{} in {}",
                name, self.location
            )));
        }
        if is_main && self.main_asset_name.is_some() {
            return Err(AssetError::MainAssetAlreadySet(
                self.location.asset_path.clone(),
            ));
        }

        let mut data = self
            .pool
            .remove(name)
            .unwrap_or_else(|| AssetData::new(name));

        let reusable = data
            .try_get_asset(self.host.objects())
            .filter(|handle| handle.type_name() == type_name);

        let handle = match reusable {
            Some(handle) => handle,
            None => {
                let object = create();
                let objects = self.host.objects_mut();
                let id = objects.insert(object.clone());
                data.set_asset(objects, id);
                UntypedAssetHandle::new(id, object)
            }
        };

        data.set_icons(icons.normal, icons.expanded);
        self.keep_alive.push(handle.object().clone());
        self.produced.push(data);
        if is_main {
            self.main_asset_name = Some(name.to_string());
        }
        Ok(handle)
    }

    /// Load another asset for use during this import. With `depends_on`,
    /// a change to that asset later reimports this one.
    pub fn require_other_asset<T: TypedAsset>(
        &mut self,
        path: &str,
        depends_on: bool,
    ) -> Result<AssetHandle<T>> {
        let canonical = self.host.resolve(path).asset_path;
        let handle = self
            .host
            .load_asset(&canonical)
            .ok_or_else(|| AssetError::AssetNotFound(canonical.clone()))?;

        let found = handle.type_name();
        let typed = handle.typed::<T>().ok_or_else(|| AssetError::TypeMismatch {
            expected: T::TYPE_NAME,
            found: found.to_string(),
        })?;

        if depends_on && !self.dependencies.contains(&canonical) {
            self.dependencies.push(canonical);
        }
        Ok(typed)
    }

    /// Persistent guid of a live object, e.g. one returned by
    /// [`require_other_asset`](Self::require_other_asset).
    pub fn guid_of(&self, handle: &UntypedAssetHandle) -> Option<AssetGuid> {
        self.host.objects().guid(handle.id())
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Harvest the pass. On error the previous records are handed back.
    pub fn finish(self) -> std::result::Result<ImportResults, (AssetError, BTreeMap<AssetGuid, AssetData>)> {
        let Some(main_name) = self.main_asset_name.clone() else {
            let err = AssetError::MainAssetMissing(self.location.asset_path.clone());
            return Err((err, self.abandon()));
        };

        let mut main_asset_guid = None;
        let mut objects = Vec::with_capacity(self.produced.len());
        let mut assets = BTreeMap::new();
        for (data, object) in self.produced.into_iter().zip(self.keep_alive) {
            if data.name() == main_name {
                main_asset_guid = Some(data.guid());
            }
            objects.push((data.guid(), object));
            assets.insert(data.guid(), data);
        }

        let unused = self.pool.into_values().collect();
        let Some(main_asset_guid) = main_asset_guid else {
            let results = ImportResults {
                main_asset_guid: AssetGuid::new(),
                assets,
                unused,
                dependencies: self.dependencies,
                objects,
            };
            let err = AssetError::MainAssetMissing(self.location.asset_path.clone());
            return Err((err, results.into_previous()));
        };

        Ok(ImportResults {
            main_asset_guid,
            assets,
            unused,
            dependencies: self.dependencies,
            objects,
        })
    }

    /// Drop the pass and return every record, produced or pooled.
    pub fn abandon(self) -> BTreeMap<AssetGuid, AssetData> {
        self.produced
            .into_iter()
            .chain(self.pool.into_values())
            .map(|data| (data.guid(), data))
            .collect()
    }
}
