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

//! Asset importer
//!
//! One importer per source file or folder. It owns the guid map of the
//! objects produced from that file, decides when the file is stale and runs
//! the import. The metadata file is always written last, so a failed import
//! leaves the previous state on disk and the next trigger retries it.

use super::{
    AssetData, AssetImportContext, AssetStorage, ImportHost, ImporterBehavior,
    ImporterDescriptor, ImporterRegistry, ModificationDetector, ReimportCheck, ReimportMode,
    MAIN_ASSET_NAME, PIPELINE_VERSION,
};
use crate::assets::{SharedAsset, UntypedAssetHandle};
use crate::error::{AssetError, Result};
use crate::guid::AssetGuid;
use crate::location::AssetLocation;
use crate::persistence::Persistence;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

const STAGED_CACHE_EXTENSION: &str = "staged";

pub type SharedImporter = Arc<RwLock<AssetImporter>>;

#[derive(Serialize)]
struct ImporterFileRef<'a> {
    importer: &'a str,
    serialized_version: u32,
    main_asset_guid: Option<AssetGuid>,
    assets: &'a BTreeMap<AssetGuid, AssetData>,
    detector: &'a ModificationDetector,
    settings: &'a dyn ImporterBehavior,
}

#[derive(Deserialize)]
struct ImporterFile {
    importer: String,
    #[serde(default)]
    serialized_version: u32,
    #[serde(default)]
    main_asset_guid: Option<AssetGuid>,
    #[serde(default)]
    assets: BTreeMap<AssetGuid, AssetData>,
    #[serde(default)]
    detector: ModificationDetector,
    #[serde(default)]
    settings: serde_json::Value,
}

pub struct AssetImporter {
    descriptor: Arc<ImporterDescriptor>,
    behavior: Box<dyn ImporterBehavior>,
    location: AssetLocation,
    /// Version the current outputs were produced with; 0 = never imported
    serialized_version: u32,
    main_asset_guid: Option<AssetGuid>,
    assets: BTreeMap<AssetGuid, AssetData>,
    detector: ModificationDetector,
    /// Whether the database wants will/did reimport callbacks
    hooks_attached: bool,
}

impl AssetImporter {
    /// Fresh importer with default settings.
    pub fn new(descriptor: Arc<ImporterDescriptor>, location: AssetLocation) -> Self {
        Self {
            behavior: descriptor.create_behavior(),
            descriptor,
            location,
            serialized_version: 0,
            main_asset_guid: None,
            assets: BTreeMap::new(),
            detector: ModificationDetector::new(),
            hooks_attached: false,
        }
    }

    /// Load from the location's metadata file; `Ok(None)` when there is none.
    pub fn load(
        location: AssetLocation,
        registry: &ImporterRegistry,
        persistence: &Persistence,
    ) -> Result<Option<Self>> {
        let Some(file) = persistence.load_value::<ImporterFile>(&location.importer_full_path)?
        else {
            return Ok(None);
        };
        let descriptor = registry
            .by_name(&file.importer)
            .ok_or_else(|| AssetError::UnknownImporter(file.importer.clone()))?;
        let behavior = descriptor.deserialize_behavior(file.settings)?;
        let assets = file
            .assets
            .into_iter()
            .map(|(guid, data)| (guid, data.with_guid(guid)))
            .collect();

        Ok(Some(Self {
            descriptor,
            behavior,
            location,
            serialized_version: file.serialized_version,
            main_asset_guid: file.main_asset_guid,
            assets,
            detector: file.detector,
            hooks_attached: false,
        }))
    }

    pub fn into_shared(self) -> SharedImporter {
        Arc::new(RwLock::new(self))
    }

    pub fn location(&self) -> &AssetLocation {
        &self.location
    }

    pub fn descriptor(&self) -> &Arc<ImporterDescriptor> {
        &self.descriptor
    }

    pub fn display_name(&self) -> &str {
        &self.descriptor.display_name
    }

    /// Current importer code version
    pub fn version(&self) -> u32 {
        self.descriptor.version + PIPELINE_VERSION
    }

    pub fn serialized_version(&self) -> u32 {
        self.serialized_version
    }

    pub fn storage(&self) -> AssetStorage {
        self.behavior.storage()
    }

    pub fn is_folder(&self) -> bool {
        self.descriptor.is_folder
    }

    pub fn main_asset_guid(&self) -> Option<AssetGuid> {
        self.main_asset_guid
    }

    pub fn guids(&self) -> impl Iterator<Item = AssetGuid> + '_ {
        self.assets.keys().copied()
    }

    pub fn asset_data(&self, guid: &AssetGuid) -> Option<&AssetData> {
        self.assets.get(guid)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetData> {
        self.assets.values()
    }

    pub fn detector(&self) -> &ModificationDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut ModificationDetector {
        &mut self.detector
    }

    pub fn dependency_paths(&self) -> impl Iterator<Item = &str> {
        self.detector.dependency_paths()
    }

    pub fn behavior(&self) -> &dyn ImporterBehavior {
        &*self.behavior
    }

    /// Typed view of the importer settings.
    pub fn settings<B: ImporterBehavior>(&self) -> Option<&B> {
        self.behavior.as_any().downcast_ref::<B>()
    }

    pub fn settings_mut<B: ImporterBehavior>(&mut self) -> Option<&mut B> {
        self.behavior.as_any_mut().downcast_mut::<B>()
    }

    pub fn hooks_attached(&self) -> bool {
        self.hooks_attached
    }

    pub(crate) fn set_hooks_attached(&mut self, attached: bool) {
        self.hooks_attached = attached;
    }

    pub fn check_need_reimport(&self, full_check: bool, host: &dyn ImportHost) -> bool {
        let main_missing = self
            .main_asset_guid
            .is_none_or(|guid| !self.assets.contains_key(&guid));
        if main_missing || self.serialized_version != self.version() {
            return true;
        }
        if self.detector.is_asset_modified(&self.location, host.clock()) {
            return true;
        }
        if full_check && self.detector.are_dependencies_modified(host) {
            return true;
        }
        self.behavior.check_need_reimport(&ReimportCheck {
            location: &self.location,
            full_check,
            host,
        })
    }

    /// Reimport when `mode` says so. Returns whether an import ran and
    /// succeeded.
    pub fn reimport_and_save(&mut self, mode: ReimportMode, host: &mut dyn ImportHost) -> Result<bool> {
        let needed = match mode {
            ReimportMode::Skip => false,
            ReimportMode::FastCheck => self.check_need_reimport(false, &*host),
            ReimportMode::FullCheck => self.check_need_reimport(true, &*host),
            ReimportMode::Force => true,
        };
        if !needed {
            return Ok(false);
        }

        debug!(path = %self.location, ?mode, "reimporting asset");

        if self.hooks_attached {
            if let Err(err) = host.will_reimport(self) {
                error!(path = %self.location, error = %err, "will-reimport handler failed");
            }
        }

        let result = self.import_and_save(host);
        if let Err(err) = &result {
            error!(path = %self.location, error = %err, "failed to import asset");
        }

        if self.hooks_attached {
            if let Err(err) = host.did_reimport(self, result.is_ok()) {
                error!(path = %self.location, error = %err, "did-reimport handler failed");
            }
        }

        self.behavior.log_import_messages(&self.location);
        result.map(|()| true)
    }

    /// `force` reimports unconditionally, otherwise a full check decides.
    pub fn save_and_reimport(&mut self, force: bool, host: &mut dyn ImportHost) -> Result<bool> {
        let mode = if force {
            ReimportMode::Force
        } else {
            ReimportMode::FullCheck
        };
        self.reimport_and_save(mode, host)
    }

    fn import_and_save(&mut self, host: &mut dyn ImportHost) -> Result<()> {
        let previous = std::mem::take(&mut self.assets);
        let mut ctx = AssetImportContext::new(&mut *host, &self.location, previous);

        if let Err(err) = self.behavior.on_import_assets(&mut ctx) {
            self.assets = ctx.abandon();
            return Err(err);
        }
        let results = match ctx.finish() {
            Ok(results) => results,
            Err((err, previous)) => {
                self.assets = previous;
                return Err(err);
            }
        };

        if self.storage() == AssetStorage::Cache {
            let guids: Vec<AssetGuid> = results.objects.iter().map(|(guid, _)| *guid).collect();
            let staged = results
                .objects
                .iter()
                .try_for_each(|(guid, object)| self.stage_cache(*guid, object, &*host))
                .and_then(|()| self.commit_caches(&guids, &*host));
            if let Err(err) = staged {
                self.discard_staged_caches(&guids, &*host);
                self.assets = results.into_previous();
                return Err(err);
            }
        }

        self.detector
            .update_dependencies(results.dependencies.iter().cloned(), host);

        for data in &results.unused {
            self.delete_cache(data.guid(), &*host);
            if let Some(id) = data.object_id() {
                host.objects_mut().clear_guid(id);
            }
        }

        self.main_asset_guid = Some(results.main_asset_guid);
        self.assets = results.assets;
        self.serialized_version = self.version();
        self.detector.sync_asset(&self.location, host.clock());
        self.save_importer_file(&*host)
    }

    /// The main object; importing first if nothing was ever imported.
    pub fn main_asset(&mut self, host: &mut dyn ImportHost) -> Result<UntypedAssetHandle> {
        if self.main_asset_guid.is_none() {
            self.reimport_and_save(ReimportMode::FastCheck, host)?;
        }
        let guid = self
            .main_asset_guid
            .ok_or_else(|| AssetError::MainAssetMissing(self.location.asset_path.clone()))?;
        self.get_asset(guid, host)
            .ok_or_else(|| AssetError::AssetNotFound(format!("{} ({guid})", self.location)))
    }

    /// Live object for `guid`, recreated from storage when it was evicted.
    ///
    /// At most two attempts: the first reimports only if stale, the second
    /// forces a reimport because the stored artifact was missing.
    pub fn get_asset(&mut self, guid: AssetGuid, host: &mut dyn ImportHost) -> Option<UntypedAssetHandle> {
        let mut mode = ReimportMode::FastCheck;
        for _ in 0..2 {
            // Failures are already logged; fall through to whatever is stored.
            let _ = self.reimport_and_save(mode, host);

            let data = self.assets.get(&guid)?;
            if let Some(handle) = data.try_get_asset(host.objects()) {
                return Some(handle);
            }

            match self.load_from_storage(guid, &*host) {
                Ok(Some(object)) => {
                    let id = host.objects_mut().insert(object.clone());
                    if let Some(data) = self.assets.get_mut(&guid) {
                        data.set_asset(host.objects_mut(), id);
                    }
                    return Some(UntypedAssetHandle::new(id, object));
                }
                Ok(None) => {
                    debug!(path = %self.location, %guid, "stored asset missing, forcing reimport");
                }
                Err(err) => {
                    warn!(path = %self.location, %guid, error = %err, "failed to load stored asset");
                }
            }
            mode = ReimportMode::Force;
        }
        None
    }

    fn load_from_storage(&self, guid: AssetGuid, host: &dyn ImportHost) -> Result<Option<SharedAsset>> {
        let path = match self.storage() {
            AssetStorage::Cache => self.cache_path(guid, host),
            AssetStorage::Direct(_) => self.location.asset_full_path.clone(),
            AssetStorage::Transient => return Ok(None),
        };
        Ok(host.persistence().load(&path)?.map(|loaded| loaded.object))
    }

    /// `<artifacts>/<first two hex chars>/<guid>`
    pub fn cache_path(&self, guid: AssetGuid, host: &dyn ImportHost) -> PathBuf {
        host.artifacts_path()
            .join(guid.bucket())
            .join(guid.to_string())
    }

    /// Sibling of the cache file that holds a write until every output of
    /// the import succeeded.
    pub fn staged_cache_path(&self, guid: AssetGuid, host: &dyn ImportHost) -> PathBuf {
        self.cache_path(guid, host).with_extension(STAGED_CACHE_EXTENSION)
    }

    fn stage_cache(&self, guid: AssetGuid, object: &SharedAsset, host: &dyn ImportHost) -> Result<()> {
        let path = self.staged_cache_path(guid, host);
        let guard = object.read();
        host.persistence().save(&*guard, Some(guid), &path)
    }

    // Runs only once every output serialized.
    fn commit_caches(&self, guids: &[AssetGuid], host: &dyn ImportHost) -> Result<()> {
        for guid in guids {
            std::fs::rename(self.staged_cache_path(*guid, host), self.cache_path(*guid, host))?;
        }
        Ok(())
    }

    fn discard_staged_caches(&self, guids: &[AssetGuid], host: &dyn ImportHost) {
        for guid in guids {
            if let Err(err) = remove_if_exists(&self.staged_cache_path(*guid, host)) {
                warn!(path = %self.location, %guid, error = %err, "failed to discard staged cache");
            }
        }
    }

    fn delete_cache(&self, guid: AssetGuid, host: &dyn ImportHost) {
        if self.storage() != AssetStorage::Cache {
            return;
        }
        if let Err(err) = remove_if_exists(&self.cache_path(guid, host)) {
            warn!(path = %self.location, %guid, error = %err, "failed to delete cache");
        }
    }

    /// Remove the cache artifact of every output.
    pub fn delete_caches(&self, host: &dyn ImportHost) {
        for guid in self.assets.keys() {
            self.delete_cache(*guid, host);
        }
    }

    /// Write the metadata file.
    pub fn save_importer_file(&self, host: &dyn ImportHost) -> Result<()> {
        let path = &self.location.importer_full_path;
        let before = host.clock().last_write_time(path);
        let file = ImporterFileRef {
            importer: &self.descriptor.name,
            serialized_version: self.serialized_version,
            main_asset_guid: self.main_asset_guid,
            assets: &self.assets,
            detector: &self.detector,
            settings: &*self.behavior,
        };
        host.persistence().save_value(&file, path)?;

        // Keep the metadata timestamp strictly increasing across saves.
        if let (Some(before), Some(after)) = (before, host.clock().last_write_time(path)) {
            if after <= before {
                set_modified(path, before + Duration::from_millis(1))?;
            }
        }
        Ok(())
    }

    pub fn delete_importer_file(&self) {
        if let Err(err) = remove_if_exists(&self.location.importer_full_path) {
            warn!(path = %self.location, error = %err, "failed to delete importer file");
        }
    }

    /// Rebind to a new location, dropping the metadata file at the old one.
    /// The caller reimports afterwards to write it at the new location.
    pub fn move_location(&mut self, location: AssetLocation) {
        self.delete_importer_file();
        self.location = location;
    }

    /// Make `handle` the main asset of a direct importer and write both the
    /// asset file and the metadata.
    pub fn set_asset_and_save(&mut self, handle: &UntypedAssetHandle, host: &mut dyn ImportHost) -> Result<AssetGuid> {
        let AssetStorage::Direct(type_name) = self.storage() else {
            return Err(AssetError::NotDirectImporter(self.location.asset_path.clone()));
        };
        if handle.type_name() != type_name {
            return Err(AssetError::TypeMismatch {
                expected: type_name,
                found: handle.type_name().to_string(),
            });
        }

        let mut data = AssetData::new(MAIN_ASSET_NAME);
        data.set_asset(host.objects_mut(), handle.id());
        let guid = data.guid();
        self.assets = BTreeMap::from([(guid, data)]);
        self.main_asset_guid = Some(guid);
        self.save_asset(host)?;
        Ok(guid)
    }

    /// Write the live main object of a direct importer back to its file.
    pub fn save_asset(&mut self, host: &mut dyn ImportHost) -> Result<()> {
        if !matches!(self.storage(), AssetStorage::Direct(_)) {
            return Err(AssetError::NotDirectImporter(self.location.asset_path.clone()));
        }
        let guid = self
            .main_asset_guid
            .ok_or_else(|| AssetError::MainAssetMissing(self.location.asset_path.clone()))?;
        let Some(handle) = self
            .assets
            .get(&guid)
            .and_then(|data| data.try_get_asset(host.objects()))
        else {
            // Not loaded, so the file already holds the latest state.
            return Ok(());
        };

        {
            let guard = handle.object().read();
            host.persistence()
                .save(&*guard, Some(guid), &self.location.asset_full_path)?;
        }
        self.serialized_version = self.version();
        self.detector.sync_asset(&self.location, host.clock());
        self.save_importer_file(&*host)
    }

    pub fn log_import_messages(&self) {
        self.behavior.log_import_messages(&self.location);
    }
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

fn set_modified(path: &Path, time: std::time::SystemTime) -> std::io::Result<()> {
    std::fs::File::options()
        .write(true)
        .open(path)?
        .set_modified(time)
}
