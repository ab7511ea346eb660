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

//! Import pipeline
//!
//! An [`AssetImporter`] owns one source file. During a reimport it builds an
//! [`AssetImportContext`], hands it to its [`ImporterBehavior`], then writes
//! caches and its metadata file. Everything it needs from the outside world
//! comes through [`ImportHost`], which the asset database implements.

pub mod context;
pub mod data;
pub mod detector;
pub mod importer;
pub mod importers;
pub mod registry;

pub use context::{AssetIcons, AssetImportContext, ImportResults, MAIN_ASSET_NAME};
pub use data::AssetData;
pub use detector::{DependencySnapshot, ModificationDetector};
pub use importer::{AssetImporter, SharedImporter};
pub use registry::{
    ImporterBehavior, ImporterDescriptor, ImporterRegistry, ReimportCheck, PIPELINE_VERSION,
};

use crate::assets::{ObjectStore, UntypedAssetHandle};
use crate::config::GraphicsSettings;
use crate::error::Result;
use crate::location::AssetLocation;
use crate::persistence::Persistence;
use crate::time::TimeProvider;
use std::path::PathBuf;

/// How eagerly to check whether an importer is stale. Later variants are
/// stricter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReimportMode {
    /// Never reimport
    Skip,
    /// Version, main asset and source timestamp
    FastCheck,
    /// Fast check plus dependency metadata timestamps and importer extras
    FullCheck,
    /// Always reimport
    Force,
}

/// Where an importer keeps its produced objects between sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStorage {
    /// One artifact per guid under the library cache
    Cache,
    /// The source file is the asset; holds the asset type name
    Direct(&'static str),
    /// Nothing on disk; rebuilt by reimporting
    Transient,
}

/// Services an importer uses while importing
pub trait ImportHost {
    fn clock(&self) -> &dyn TimeProvider;

    fn persistence(&self) -> &Persistence;

    fn objects(&self) -> &ObjectStore;

    fn objects_mut(&mut self) -> &mut ObjectStore;

    fn graphics_settings(&self) -> GraphicsSettings;

    /// Root of the per-guid cache artifacts
    fn artifacts_path(&self) -> PathBuf;

    fn resolve(&self, path: &str) -> AssetLocation;

    /// Whether an importer exists, or can be created, for `path`
    fn has_importer(&mut self, path: &str) -> bool;

    /// Main object of another asset, importing it first if needed
    fn load_asset(&mut self, path: &str) -> Option<UntypedAssetHandle>;

    /// Called before an attached importer reimports
    fn will_reimport(&mut self, importer: &AssetImporter) -> Result<()>;

    /// Called after an attached importer reimported, whether or not it succeeded
    fn did_reimport(&mut self, importer: &AssetImporter, imported: bool) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing;
