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


//! Asset Pipeline - editor asset import and dependency tracking
//!
//! Turns files under a project's `Assets/` folder (and the engine's shader and
//! resource folders) into GUID-identified runtime objects, keeps them in sync
//! with their sources and reimports dependers when a dependency changes.

pub mod assets;
pub mod config;
pub mod database;
pub mod error;
pub mod guid;
pub mod import;
pub mod location;
pub mod persistence;
pub mod prelude;
pub mod time;

pub use assets::{
    Asset, AssetHandle, AssetTypeRegistry, ObjectId, ObjectStore, SharedAsset, TypedAsset,
    UntypedAssetHandle,
};
pub use config::{ColorSpace, DatabaseConfig, GraphicsSettings};
pub use database::{
    AssetDatabase, AssetNotification, AssetObserver, CallbackObserver, FileSystemEvent,
    NativeHandle, RenameSide,
};
pub use error::*;
pub use guid::AssetGuid;
pub use import::{
    AssetImportContext, AssetImporter, ImportHost, ImporterBehavior, ImporterDescriptor,
    ImporterRegistry, ReimportMode,
};
pub use location::{AssetCategory, AssetLocation, AssetRoots};
pub use persistence::Persistence;
pub use time::{ManualTimeProvider, SystemTimeProvider, TimeProvider};
