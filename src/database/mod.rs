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


//! Asset database
//!
//! Owns every importer, the `guid -> path` and `path -> dependers` tables, the
//! live object store and the queue of file-system events. All mutation happens
//! on the caller's thread: file watchers only push events, and
//! [`AssetDatabase::update`] drains them once per tick.
//!
//! Importers are shared behind `RwLock`s. The database takes an importer's
//! write lock for the whole of a reimport and passes itself in as the
//! [`ImportHost`], so an importer that loads another asset re-enters the
//! database. A lock that is already held means an import cycle; that importer
//! is skipped instead of deadlocking. Dependency cascades are queued while any
//! importer is locked and run once the outermost import returns.

pub mod events;
pub mod native;
pub mod watcher;

pub use events::{AssetNotification, AssetObserver, CallbackObserver, ObserverList};
pub use native::NativeHandle;
pub use watcher::{EventQueue, FileSystemEvent, FileWatcher, RenameCoalescer, RenameSide};

use crate::assets::{
    share, AssetHandle, ObjectId, ObjectStore, SharedAsset, TypedAsset, UntypedAssetHandle,
};
use crate::config::{DatabaseConfig, GraphicsSettings};
use crate::error::{AssetError, Result};
use crate::guid::AssetGuid;
use crate::import::{
    AssetImporter, AssetStorage, ImportHost, ImporterRegistry, ReimportMode, SharedImporter,
};
use crate::location::{is_importer_file_path, strip_prefix_ignore_case, AssetLocation, AssetRoots};
use crate::persistence::Persistence;
use crate::time::{elapsed_between, SystemTimeProvider, TimeProvider};
use ahash::AHashMap;
use native::NativeReferenceTable;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, info_span, trace, warn};
use walkdir::WalkDir;

pub struct AssetDatabase {
    config: DatabaseConfig,
    roots: AssetRoots,
    clock: Box<dyn TimeProvider>,
    persistence: Persistence,
    registry: ImporterRegistry,
    objects: ObjectStore,
    /// Keyed by logical path; ordered so full passes are deterministic
    importers: BTreeMap<String, SharedImporter>,
    guid_to_path: AHashMap<AssetGuid, String>,
    /// Dependency path -> paths of the importers that depend on it
    dependers: AHashMap<String, BTreeSet<String>>,
    native_refs: NativeReferenceTable,
    /// Strong references keep dirty objects alive until they are saved
    dirty: AHashMap<ObjectId, SharedAsset>,
    last_dirty_save: Option<SystemTime>,
    events: EventQueue,
    renames: RenameCoalescer,
    watchers: Vec<FileWatcher>,
    observers: ObserverList,
    pending_cascades: VecDeque<(String, ReimportMode)>,
    /// Number of importer write locks currently held by this thread
    lock_depth: usize,
    cascading: bool,
}

impl AssetDatabase {
    pub fn new(config: DatabaseConfig) -> Self {
        Self::with_clock(config, Box::new(SystemTimeProvider))
    }

    pub fn with_clock(config: DatabaseConfig, clock: Box<dyn TimeProvider>) -> Self {
        Self {
            roots: AssetRoots::from_config(&config),
            config,
            clock,
            persistence: Persistence::default(),
            registry: ImporterRegistry::with_builtin_importers(),
            objects: ObjectStore::new(),
            importers: BTreeMap::new(),
            guid_to_path: AHashMap::new(),
            dependers: AHashMap::new(),
            native_refs: NativeReferenceTable::default(),
            dirty: AHashMap::new(),
            last_dirty_save: None,
            events: EventQueue::default(),
            renames: RenameCoalescer::default(),
            watchers: Vec::new(),
            observers: ObserverList::new(),
            pending_cascades: VecDeque::new(),
            lock_depth: 0,
            cascading: false,
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn roots(&self) -> &AssetRoots {
        &self.roots
    }

    pub fn registry(&self) -> &ImporterRegistry {
        &self.registry
    }

    /// Register custom importers here before [`initialize`](Self::initialize).
    pub fn registry_mut(&mut self) -> &mut ImporterRegistry {
        &mut self.registry
    }

    /// Register custom asset types here before they are imported or loaded.
    pub fn persistence_mut(&mut self) -> &mut Persistence {
        &mut self.persistence
    }

    pub fn store(&self) -> &ObjectStore {
        &self.objects
    }

    /// Create importers for everything on disk, then bring them all up to
    /// date.
    pub fn initialize(&mut self) -> Result<()> {
        let span = info_span!("initialize", project = %self.config.project_path.display());
        let _enter = span.enter();

        std::fs::create_dir_all(self.config.assets_path())?;

        // Importers only; cross-asset references resolve by guid, so every
        // guid must be known before anything imports.
        for root in self.watched_roots() {
            for path in walk_sorted(&root, 1) {
                if is_importer_file_path(&path.to_string_lossy()) {
                    continue;
                }
                let location = AssetLocation::from_full_path(&path, &self.roots);
                if !location.is_unknown() {
                    self.get_asset_importer(&location.asset_path, ReimportMode::Skip);
                }
            }
        }

        let importers: Vec<SharedImporter> = self.importers.values().cloned().collect();
        for importer in &importers {
            self.with_importer(importer, |importer, db| {
                // A reimport logs its own messages and failures.
                if let Ok(false) = importer.reimport_and_save(ReimportMode::FullCheck, db) {
                    importer.log_import_messages();
                }
            });
        }

        info!(
            importers = self.importers.len(),
            guids = self.guid_to_path.len(),
            "asset database initialized"
        );

        if self.config.watch_file_system {
            self.start_watching()?;
        }
        Ok(())
    }

    fn watched_roots(&self) -> Vec<PathBuf> {
        [
            self.config.assets_path(),
            self.config.engine_shader_path.clone(),
            self.config.engine_resource_path.clone(),
        ]
        .into_iter()
        .filter(|root| root.is_dir())
        .collect()
    }

    /// Importer for `path`, created on first request and then brought up to
    /// date according to `mode`. `None` when the path is not importable or
    /// its source file is gone.
    pub fn get_asset_importer(&mut self, path: &str, mode: ReimportMode) -> Option<SharedImporter> {
        let (importer, created) = self.get_or_create_importer(path, false)?;
        if !created && mode == ReimportMode::Skip {
            return Some(importer);
        }

        self.with_importer(&importer, |importer, db| {
            let imported = matches!(importer.reimport_and_save(mode, db), Ok(true));
            if created {
                db.register_importer_data(importer);
                importer.set_hooks_attached(true);
                if imported {
                    db.notify_importer(importer, |location, is_folder| {
                        AssetNotification::Reimported {
                            location,
                            is_folder,
                        }
                    });
                }
                db.queue_cascade(&importer.location().asset_path, mode);
            }
        });
        Some(importer)
    }

    /// Importer of the asset an object was loaded from.
    pub fn get_asset_importer_for(&mut self, id: ObjectId, mode: ReimportMode) -> Option<SharedImporter> {
        let guid = self.objects.guid(id)?;
        let path = self.guid_to_path.get(&guid)?.clone();
        self.get_asset_importer(&path, mode)
    }

    /// Existing importer only; never creates or imports.
    pub fn get_importer(&self, path: &str) -> Option<SharedImporter> {
        let location = self.resolve(path);
        self.importers.get(&location.asset_path).cloned()
    }

    fn get_or_create_importer(&mut self, path: &str, allow_missing: bool) -> Option<(SharedImporter, bool)> {
        let location = self.resolve(path);
        if location.is_unknown() {
            return None;
        }
        if let Some(importer) = self.importers.get(&location.asset_path) {
            return Some((importer.clone(), false));
        }

        if !allow_missing && !location.asset_full_path.exists() {
            if location.importer_full_path.is_file() {
                info!(path = %location, "importer file exists but asset file does not, deleting it");
                if let Err(err) = std::fs::remove_file(&location.importer_full_path) {
                    warn!(path = %location, error = %err, "failed to delete importer file");
                }
            }
            return None;
        }

        let importer = match AssetImporter::load(location.clone(), &self.registry, &self.persistence) {
            Ok(Some(importer)) => importer,
            Ok(None) => self.create_importer(&location)?,
            Err(err) => {
                warn!(path = %location, error = %err, "unreadable importer file, starting over");
                self.create_importer(&location)?
            }
        };
        trace!(path = %location, importer = %importer.descriptor().name, "importer created");

        let importer = importer.into_shared();
        self.importers
            .insert(location.asset_path, importer.clone());
        Some((importer, true))
    }

    fn create_importer(&self, location: &AssetLocation) -> Option<AssetImporter> {
        let descriptor = if location.asset_full_path.is_dir() {
            self.registry.folder_importer()
        } else {
            self.registry.for_path(&location.asset_path)
        };
        match descriptor {
            Some(descriptor) => Some(AssetImporter::new(descriptor, location.clone())),
            None => {
                debug!(path = %location, "no importer for this file type");
                None
            }
        }
    }

    /// Run `f` with the importer write-locked. `None` when the importer is
    /// already locked further up the stack.
    fn with_importer<R>(
        &mut self,
        importer: &SharedImporter,
        f: impl FnOnce(&mut AssetImporter, &mut Self) -> R,
    ) -> Option<R> {
        let result = {
            let Some(mut guard) = importer.try_write() else {
                let err = AssetError::ImportCycle(self.path_of(importer).unwrap_or_default());
                warn!(error = %err, "importer is busy, skipping");
                return None;
            };
            self.lock_depth += 1;
            let result = f(&mut guard, self);
            self.lock_depth -= 1;
            result
        };

        if self.lock_depth == 0 {
            self.drain_cascades();
        }
        Some(result)
    }

    fn path_of(&self, importer: &SharedImporter) -> Option<String> {
        self.importers
            .iter()
            .find(|(_, candidate)| Arc::ptr_eq(candidate, importer))
            .map(|(path, _)| path.clone())
    }

    fn queue_cascade(&mut self, path: &str, mode: ReimportMode) {
        if mode == ReimportMode::Skip {
            return;
        }
        match self.pending_cascades.iter_mut().find(|(pending, _)| pending == path) {
            Some((_, pending_mode)) => *pending_mode = (*pending_mode).max(mode),
            None => self.pending_cascades.push_back((path.to_string(), mode)),
        }
    }

    /// Reimport dependers of everything that was reimported, breadth first.
    fn drain_cascades(&mut self) {
        if self.cascading {
            return;
        }
        self.cascading = true;
        while let Some((path, mode)) = self.pending_cascades.pop_front() {
            // Reimports edit the depender sets, so iterate a copy.
            let dependers: Vec<String> = self
                .dependers
                .get(&path)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default();
            for depender in dependers {
                trace!(dependency = %path, depender = %depender, ?mode, "cascading reimport");
                self.get_asset_importer(&depender, mode);
            }
        }
        self.cascading = false;
    }

    fn register_importer_data(&mut self, importer: &AssetImporter) {
        let path = &importer.location().asset_path;
        for guid in importer.guids() {
            if let Some(previous) = self.guid_to_path.insert(guid, path.clone()) {
                if &previous != path {
                    warn!(%guid, previous = %previous, path = %path, "guid claimed by two assets");
                }
            }
        }
        for dependency in importer.dependency_paths() {
            self.dependers
                .entry(dependency.to_string())
                .or_default()
                .insert(path.clone());
        }
    }

    fn unregister_importer_data(&mut self, importer: &AssetImporter) {
        let path = &importer.location().asset_path;
        for guid in importer.guids() {
            if self.guid_to_path.get(&guid) == Some(path) {
                self.guid_to_path.remove(&guid);
            }
        }
        for dependency in importer.dependency_paths() {
            if let Some(dependers) = self.dependers.get_mut(dependency) {
                dependers.remove(path);
            }
        }
    }

    // ---- queries ----

    pub fn get_guid_by_path(&mut self, path: &str) -> Option<AssetGuid> {
        let importer = self.get_asset_importer(path, ReimportMode::FastCheck)?;
        let importer = importer.try_read()?;
        importer.main_asset_guid()
    }

    pub fn get_path_by_guid(&self, guid: AssetGuid) -> Option<&str> {
        self.guid_to_path.get(&guid).map(String::as_str)
    }

    pub fn is_folder(&self, path: &str) -> bool {
        self.get_importer(path)
            .and_then(|importer| describe(&importer))
            .is_some_and(|(_, is_folder)| is_folder)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.importers.contains_key(&self.resolve(path).asset_path)
    }

    /// Every known asset in path order, with whether it is a folder.
    pub fn get_all_asset_locations(&self) -> Vec<(AssetLocation, bool)> {
        self.importers.values().filter_map(describe).collect()
    }

    pub fn importer_count(&self) -> usize {
        self.importers.len()
    }

    /// Paths of the importers that depend on `path`.
    pub fn dependers_of(&self, path: &str) -> Vec<String> {
        let path = self.resolve(path).asset_path;
        self.dependers
            .get(&path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    // ---- loading ----

    /// Main object of the asset at `path`. `Err` only for metadata paths.
    pub fn load_untyped(&mut self, path: &str) -> Result<Option<UntypedAssetHandle>> {
        if is_importer_file_path(path) {
            return Err(AssetError::ImporterFilePath(path.to_string()));
        }
        let Some(importer) = self.get_asset_importer(path, ReimportMode::FastCheck) else {
            return Ok(None);
        };
        let loaded = self.with_importer(&importer, |importer, db| importer.main_asset(db));
        Ok(match loaded {
            Some(Ok(handle)) => Some(handle),
            Some(Err(err)) => {
                debug!(path, error = %err, "asset could not be loaded");
                None
            }
            None => None,
        })
    }

    /// Typed main object; `None` when missing or of another type.
    pub fn load<T: TypedAsset>(&mut self, path: &str) -> Result<Option<AssetHandle<T>>> {
        Ok(self.load_untyped(path)?.and_then(UntypedAssetHandle::typed))
    }

    pub fn load_untyped_by_guid(&mut self, guid: AssetGuid) -> Option<UntypedAssetHandle> {
        let path = self.guid_to_path.get(&guid)?.clone();
        let importer = self.get_asset_importer(&path, ReimportMode::FastCheck)?;
        self.with_importer(&importer, |importer, db| importer.get_asset(guid, db))
            .flatten()
    }

    pub fn load_by_guid<T: TypedAsset>(&mut self, guid: AssetGuid) -> Option<AssetHandle<T>> {
        self.load_untyped_by_guid(guid)?.typed()
    }

    /// Force a reimport, then load.
    pub fn reload<T: TypedAsset>(&mut self, path: &str) -> Result<Option<AssetHandle<T>>> {
        self.reload_with(path, |_| {})
    }

    /// Change the importer's settings, force a reimport that saves them, then
    /// load.
    pub fn reload_with<T, F>(&mut self, path: &str, configure: F) -> Result<Option<AssetHandle<T>>>
    where
        T: TypedAsset,
        F: FnOnce(&mut AssetImporter),
    {
        if is_importer_file_path(path) {
            return Err(AssetError::ImporterFilePath(path.to_string()));
        }
        let Some(importer) = self.get_asset_importer(path, ReimportMode::FastCheck) else {
            return Ok(None);
        };
        self.with_importer(&importer, |importer, db| {
            configure(importer);
            // Failures are logged; the previous outputs stay loadable.
            let _ = importer.reimport_and_save(ReimportMode::Force, db);
        });
        self.load(path)
    }

    /// Put a new, not yet persistent object into the store.
    pub fn instantiate<T: TypedAsset>(&mut self, value: T) -> AssetHandle<T> {
        let object = share(value);
        let id = self.objects.insert(object.clone());
        AssetHandle::from_untyped_unchecked(UntypedAssetHandle::new(id, object))
    }

    /// Persist an object from [`instantiate`](Self::instantiate) as a new
    /// asset at `path`.
    pub fn create(&mut self, path: &str, handle: &UntypedAssetHandle) -> Result<AssetGuid> {
        let location = self.resolve(path);
        if self.objects.guid(handle.id()).is_some() || self.importers.contains_key(&location.asset_path) {
            return Err(AssetError::AlreadyExists(location.asset_path));
        }
        if !location.is_editable() {
            return Err(AssetError::NotEditable(location.asset_path));
        }

        let Some((importer, created)) = self.get_or_create_importer(&location.asset_path, true) else {
            return Err(AssetError::ImporterNotFound(location.asset_path));
        };
        if !created {
            return Err(AssetError::AlreadyExists(location.asset_path));
        }

        let result = self
            .with_importer(&importer, |importer, db| {
                let guid = importer.set_asset_and_save(handle, db)?;
                db.register_importer_data(importer);
                importer.set_hooks_attached(true);
                Ok(guid)
            })
            .unwrap_or_else(|| Err(AssetError::ImportCycle(location.asset_path.clone())));

        if result.is_err() {
            self.discard_importer(&location.asset_path);
        }
        result
    }

    fn discard_importer(&mut self, path: &str) {
        if let Some(importer) = self.importers.remove(path) {
            if let Some(importer) = importer.try_read() {
                importer.delete_importer_file();
            }
        }
    }

    // ---- dirty assets ----

    /// Queue a persistent object for saving. Non-persistent objects are
    /// ignored.
    pub fn set_dirty(&mut self, id: ObjectId) {
        if self.objects.guid(id).is_none() {
            return;
        }
        if let Some(object) = self.objects.get(id) {
            self.dirty.insert(id, object);
        }
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Save dirty objects unless the last flush was too recent. Returns how
    /// many were saved.
    pub fn save_dirty_assets(&mut self) -> usize {
        if self.dirty.is_empty() {
            return 0;
        }
        let now = self.clock.now();
        let interval = self.config.dirty_save_interval();
        let due = self
            .last_dirty_save
            .is_none_or(|last| elapsed_between(last, now) >= interval);
        if !due {
            return 0;
        }
        self.last_dirty_save = Some(now);
        self.flush_dirty_assets()
    }

    fn flush_dirty_assets(&mut self) -> usize {
        let mut dirty: Vec<(ObjectId, SharedAsset)> = self.dirty.drain().collect();
        dirty.sort_unstable_by_key(|(id, _)| *id);

        let mut saved = 0;
        for (id, _object) in &dirty {
            match self.save_asset_immediately(*id) {
                Ok(true) => saved += 1,
                Ok(false) => {}
                Err(err) => error!(error = %err, "failed to save dirty asset"),
            }
        }
        debug!(saved, "dirty assets flushed");
        saved
    }

    /// Write a direct asset back to its source file now. `Ok(false)` when the
    /// object is not persistent or not owned by a direct importer.
    pub fn save_asset_immediately(&mut self, id: ObjectId) -> Result<bool> {
        let Some(importer) = self.get_asset_importer_for(id, ReimportMode::Skip) else {
            return Ok(false);
        };
        self.with_importer(&importer, |importer, db| {
            if !matches!(importer.storage(), AssetStorage::Direct(_)) {
                return Ok(false);
            }
            importer.save_asset(db).map(|()| true)
        })
        .unwrap_or(Ok(false))
    }

    // ---- native references ----

    /// Load a native asset and pin it for the renderer.
    pub fn native_load_asset(&mut self, path: &str) -> Option<NativeHandle> {
        let handle = match self.load_untyped(path) {
            Ok(Some(handle)) => handle,
            _ => {
                error!(path, "native code requested an asset that cannot be loaded");
                return None;
            }
        };
        if !handle.is_native() {
            error!(path, asset_type = handle.type_name(), "attempting to load a non-native asset");
            return None;
        }
        Some(self.native_refs.acquire(handle))
    }

    pub fn native_unload_asset(&mut self, handle: NativeHandle) {
        if self.native_refs.release(handle).is_none() {
            error!(%handle, "native code is unloading an asset that is not loaded");
        }
    }

    pub fn native_ref_count(&self, handle: NativeHandle) -> u32 {
        self.native_refs.ref_count(handle)
    }

    /// Distinct objects currently pinned by native code.
    pub fn native_pinned_count(&self) -> usize {
        self.native_refs.pinned_count()
    }

    /// Drop live objects nothing references. They reload from storage on
    /// demand.
    pub fn collect_garbage(&mut self) -> usize {
        let evicted = self.objects.collect_unreferenced();
        debug!(evicted, remaining = self.objects.len(), "collected unreferenced assets");
        evicted
    }

    // ---- ticking ----

    /// One editor tick.
    pub fn update(&mut self) {
        self.process_file_system_events();
        self.save_dirty_assets();
    }

    /// Flush every dirty asset and stop watching.
    pub fn shutdown(&mut self) {
        let saved = self.flush_dirty_assets();
        self.last_dirty_save = Some(self.clock.now());
        self.watchers.clear();
        info!(saved, "asset database shut down");
    }

    // ---- observers ----

    pub fn subscribe(&mut self, observer: Box<dyn AssetObserver>) -> usize {
        self.observers.register(observer)
    }

    pub fn subscribe_fn<F>(&mut self, callback: F) -> usize
    where
        F: FnMut(&AssetNotification) -> Result<()> + Send + Sync + 'static,
    {
        self.subscribe(Box::new(CallbackObserver::new(callback)))
    }

    pub fn unsubscribe(&mut self, index: usize) -> bool {
        self.observers.unregister(index).is_some()
    }

    fn notify(&mut self, notification: AssetNotification) {
        debug!(kind = notification.kind(), path = %notification.location(), "asset notification");
        self.observers.broadcast(&notification);
    }

    fn notify_importer(
        &mut self,
        importer: &AssetImporter,
        make: impl FnOnce(AssetLocation, bool) -> AssetNotification,
    ) {
        self.notify(make(importer.location().clone(), importer.is_folder()));
    }

    // ---- file-system events ----

    /// Shared queue the watchers push into; other producers may push too.
    pub fn event_queue(&self) -> EventQueue {
        self.events.clone()
    }

    pub fn enqueue_event(&self, event: FileSystemEvent) {
        self.events.push(event);
    }

    pub fn start_watching(&mut self) -> Result<()> {
        if !self.watchers.is_empty() {
            return Ok(());
        }
        for root in self.watched_roots() {
            self.watchers.push(FileWatcher::watch(root, self.events.clone())?);
        }
        Ok(())
    }

    pub fn stop_watching(&mut self) {
        self.watchers.clear();
    }

    pub fn is_watching(&self) -> bool {
        !self.watchers.is_empty()
    }

    /// Handle queued events in arrival order, after pairing the halves of
    /// moves. Returns how many were handled.
    pub fn process_file_system_events(&mut self) -> usize {
        if self.events.is_empty() && !self.renames.has_held() {
            return 0;
        }
        let span = info_span!("process_file_system_events", queued = self.events.len());
        let _enter = span.enter();

        let queued: Vec<FileSystemEvent> = std::iter::from_fn(|| self.events.pop()).collect();
        let events = self.renames.coalesce(queued);
        let processed = events.len();
        for event in events {
            trace!(?event, "file system event");
            match event {
                FileSystemEvent::Changed(path) => self.on_asset_changed(&path),
                FileSystemEvent::Created(path) => self.on_asset_created(&path),
                FileSystemEvent::Deleted(path) => self.on_asset_deleted(&path),
                FileSystemEvent::Renamed { from, to } => self.on_asset_renamed(&from, &to),
                FileSystemEvent::RenameHalf { path, side } => match side {
                    RenameSide::From => self.on_asset_deleted(&path),
                    RenameSide::To => self.on_asset_created(&path),
                },
            }
        }
        processed
    }

    fn known_location(&self, full_path: &Path, action: &str) -> Option<AssetLocation> {
        let location = AssetLocation::from_full_path(full_path, &self.roots);
        if location.is_unknown() {
            warn!(path = %full_path.display(), "attempting to {action} an asset whose path is unknown");
            return None;
        }
        Some(location)
    }

    fn on_asset_changed(&mut self, full_path: &Path) {
        if is_meta_path(full_path) {
            return;
        }
        let Some(location) = self.known_location(full_path, "reimport") else {
            return;
        };
        let Some(importer) = self.get_asset_importer(&location.asset_path, ReimportMode::Skip) else {
            return;
        };

        let changed = self.with_importer(&importer, |importer, db| {
            let reimported = matches!(importer.reimport_and_save(ReimportMode::FullCheck, db), Ok(true));
            reimported.then(|| (importer.location().clone(), importer.is_folder()))
        });
        if let Some(Some((location, is_folder))) = changed {
            self.notify(AssetNotification::Changed {
                location,
                is_folder,
            });
        }
    }

    fn on_asset_created(&mut self, full_path: &Path) {
        if full_path.is_dir() {
            // The folder itself first, then its contents, parents before children.
            for path in walk_sorted(full_path, 0) {
                self.on_single_asset_created(&path);
            }
        } else {
            self.on_single_asset_created(full_path);
        }
    }

    fn on_single_asset_created(&mut self, full_path: &Path) {
        if is_meta_path(full_path) {
            return;
        }
        let Some(location) = self.known_location(full_path, "import") else {
            return;
        };
        let Some(importer) = self.get_asset_importer(&location.asset_path, ReimportMode::FastCheck) else {
            return;
        };
        if let Some((location, is_folder)) = describe(&importer) {
            self.notify(AssetNotification::Imported {
                location,
                is_folder,
            });
        }
    }

    fn on_asset_deleted(&mut self, full_path: &Path) {
        if is_meta_path(full_path) {
            return;
        }
        let Some(location) = self.known_location(full_path, "delete") else {
            return;
        };
        if let Some(importer) = self.get_asset_importer(&location.asset_path, ReimportMode::Skip) {
            self.delete_importer(&importer);
        }
    }

    /// Logical paths strictly inside folder `path`, deepest first.
    fn children_of(&self, path: &str) -> Vec<String> {
        let prefix = format!("{path}/");
        let mut children: Vec<String> = self
            .importers
            .keys()
            .filter(|key| strip_prefix_ignore_case(key, &prefix).is_some())
            .cloned()
            .collect();
        children.sort_unstable_by(|a, b| b.cmp(a));
        children
    }

    fn delete_importer(&mut self, importer: &SharedImporter) {
        let Some((location, is_folder)) = describe(importer) else {
            return;
        };
        if is_folder {
            for child in self.children_of(&location.asset_path) {
                self.delete_single_importer(&child);
            }
        }
        self.delete_single_importer(&location.asset_path);
    }

    fn delete_single_importer(&mut self, path: &str) {
        let Some(importer) = self.importers.remove(path) else {
            return;
        };
        let removed = self.with_importer(&importer, |importer, db| {
            importer.delete_caches(db);
            importer.delete_importer_file();
            importer.set_hooks_attached(false);
            db.unregister_importer_data(importer);
            for data in importer.assets() {
                if let Some(id) = data.object_id() {
                    db.objects.clear_guid(id);
                }
            }
            (importer.location().clone(), importer.is_folder())
        });
        self.dependers.remove(path);

        if let Some((location, is_folder)) = removed {
            self.notify(AssetNotification::Removed {
                location,
                is_folder,
            });
        }
    }

    fn on_asset_renamed(&mut self, from: &Path, to: &Path) {
        // Editors save through temporary files: `name~` is written and
        // renamed over the original, which is parked as `*.TMP`.
        if is_temp_file(to) {
            return;
        }
        if is_temp_file(from) {
            self.on_asset_changed(to);
            return;
        }
        if is_meta_path(from) || is_meta_path(to) {
            return;
        }

        let old = AssetLocation::from_full_path(from, &self.roots);
        let new = AssetLocation::from_full_path(to, &self.roots);
        if old.is_unknown() || new.is_unknown() {
            warn!(from = %from.display(), to = %to.display(), "attempting to rename an asset whose path is unknown");
            return;
        }
        if old.asset_path.eq_ignore_ascii_case(&new.asset_path) {
            return;
        }

        let Some(old_importer) = self.get_asset_importer(&old.asset_path, ReimportMode::Skip) else {
            // Created and renamed before any event for it was handled.
            self.on_asset_created(to);
            return;
        };

        if let Some(existing) = self.importers.get(&new.asset_path).cloned() {
            warn!(path = %new, "asset already exists at the new path, it will be deleted");
            self.delete_importer(&existing);
        }

        let is_folder = describe(&old_importer).is_some_and(|(_, is_folder)| is_folder);
        let mut renamed = Vec::new();
        if is_folder {
            for child in self.children_of(&old.asset_path) {
                let child_new = self.resolve(&format!("{}{}", new.asset_path, &child[old.asset_path.len()..]));
                let child_new_path = child_new.asset_path.clone();
                if self.rename_single_importer(&child, child_new) {
                    renamed.push(child_new_path);
                }
            }
        }
        let new_path = new.asset_path.clone();
        if self.rename_single_importer(&old.asset_path, new) {
            renamed.push(new_path);
        }

        for path in renamed {
            let Some(importer) = self.importers.get(&path).cloned() else {
                continue;
            };
            // Queued before the reimport so the hook's cascade merges into it.
            self.queue_cascade(&path, ReimportMode::Force);
            self.with_importer(&importer, |importer, db| {
                let _ = importer.reimport_and_save(ReimportMode::Force, db);
            });
        }
        self.drain_cascades();
    }

    /// Move one importer and every table entry keyed by its path.
    fn rename_single_importer(&mut self, old_path: &str, new_location: AssetLocation) -> bool {
        let Some(importer) = self.importers.remove(old_path) else {
            return false;
        };
        let new_path = new_location.asset_path.clone();
        let to = new_location.clone();

        let moved = self.with_importer(&importer, |importer, db| {
            let from = importer.location().clone();
            importer.move_location(new_location);
            for guid in importer.guids() {
                db.guid_to_path.insert(guid, new_path.clone());
            }
            for dependency in importer.dependency_paths() {
                let dependers = db.dependers.entry(dependency.to_string()).or_default();
                dependers.remove(old_path);
                dependers.insert(new_path.clone());
            }
            (from, importer.is_folder())
        });
        let Some((from, is_folder)) = moved else {
            self.importers.insert(old_path.to_string(), importer);
            return false;
        };
        self.importers.insert(new_path.clone(), importer);

        if let Some(my_dependers) = self.dependers.remove(old_path) {
            for depender in &my_dependers {
                let Some(depender) = self.importers.get(depender) else {
                    continue;
                };
                if let Some(mut depender) = depender.try_write() {
                    depender.detector_mut().rename_dependency(old_path, &new_path);
                }
            }
            self.dependers
                .entry(new_path)
                .or_default()
                .extend(my_dependers);
        }

        self.notify(AssetNotification::Renamed { from, to, is_folder });
        true
    }
}

impl ImportHost for AssetDatabase {
    fn clock(&self) -> &dyn TimeProvider {
        &*self.clock
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
        self.config.graphics
    }

    fn artifacts_path(&self) -> PathBuf {
        self.config.artifacts_path()
    }

    fn resolve(&self, path: &str) -> AssetLocation {
        AssetLocation::from_path(path, &self.roots)
    }

    fn has_importer(&mut self, path: &str) -> bool {
        self.get_asset_importer(path, ReimportMode::Skip).is_some()
    }

    fn load_asset(&mut self, path: &str) -> Option<UntypedAssetHandle> {
        self.load_untyped(path).ok().flatten()
    }

    fn will_reimport(&mut self, importer: &AssetImporter) -> Result<()> {
        self.unregister_importer_data(importer);
        Ok(())
    }

    fn did_reimport(&mut self, importer: &AssetImporter, imported: bool) -> Result<()> {
        self.register_importer_data(importer);
        if imported {
            self.notify_importer(importer, |location, is_folder| AssetNotification::Reimported {
                location,
                is_folder,
            });
        }
        self.queue_cascade(&importer.location().asset_path, ReimportMode::FullCheck);
        Ok(())
    }
}

fn describe(importer: &SharedImporter) -> Option<(AssetLocation, bool)> {
    let importer = importer.try_read()?;
    Some((importer.location().clone(), importer.is_folder()))
}

fn is_meta_path(path: &Path) -> bool {
    is_importer_file_path(&path.to_string_lossy())
}

fn is_temp_file(path: &Path) -> bool {
    if path.to_string_lossy().ends_with('~') {
        return true;
    }
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tmp"))
}

/// Entries under `root` with parents before children and siblings by name.
fn walk_sorted(root: &Path, min_depth: usize) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(min_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.into_path()),
            Err(err) => {
                warn!(error = %err, "failed to read directory entry");
                None
            }
        })
        .collect()
}
