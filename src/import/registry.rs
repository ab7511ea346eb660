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

//! Importer plugin contract and registry

use super::{AssetImportContext, AssetStorage, ImportHost};
use crate::error::{AssetError, Result};
use crate::location::{extension_of, AssetLocation};
use ahash::AHashMap;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Added to every importer version. Bumping it invalidates every import.
pub const PIPELINE_VERSION: u32 = 8;

/// Format-specific import logic. The behavior value doubles as the
/// importer's settings and is stored in its metadata file.
pub trait ImporterBehavior: erased_serde::Serialize + Send + Sync + 'static {
    fn storage(&self) -> AssetStorage {
        AssetStorage::Cache
    }

    /// Produce outputs. Must add exactly one main asset.
    fn on_import_assets(&mut self, ctx: &mut AssetImportContext<'_>) -> Result<()>;

    /// Extra staleness conditions on top of version and timestamps.
    fn check_need_reimport(&self, _check: &ReimportCheck<'_>) -> bool {
        false
    }

    /// Report messages kept from the last import.
    fn log_import_messages(&self, _location: &AssetLocation) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

erased_serde::serialize_trait_object!(ImporterBehavior);

/// Arguments for [`ImporterBehavior::check_need_reimport`]
pub struct ReimportCheck<'a> {
    pub location: &'a AssetLocation,
    pub full_check: bool,
    pub host: &'a dyn ImportHost,
}

pub type CreateImporterFn = Arc<dyn Fn() -> Box<dyn ImporterBehavior> + Send + Sync>;
pub type DeserializeImporterFn =
    Arc<dyn Fn(serde_json::Value) -> Result<Box<dyn ImporterBehavior>> + Send + Sync>;

/// Declarative description of one importer
pub struct ImporterDescriptor {
    /// Stable id written to metadata files
    pub name: String,
    pub display_name: String,
    /// Lower-case, with leading dot
    pub extensions: Vec<String>,
    pub version: u32,
    pub is_folder: bool,
    create: CreateImporterFn,
    deserialize: DeserializeImporterFn,
}

impl ImporterDescriptor {
    pub fn new<B>(name: &str, display_name: &str, extensions: &[&str], version: u32) -> Self
    where
        B: ImporterBehavior + Default + DeserializeOwned,
    {
        Self::with_factory(
            name,
            display_name,
            extensions,
            version,
            Arc::new(|| Box::new(B::default()) as Box<dyn ImporterBehavior>),
            Arc::new(|value: serde_json::Value| {
                serde_json::from_value::<B>(value)
                    .map(|behavior| Box::new(behavior) as Box<dyn ImporterBehavior>)
                    .map_err(|e| AssetError::DeserializationError(e.to_string()))
            }),
        )
    }

    pub fn with_factory(
        name: &str,
        display_name: &str,
        extensions: &[&str],
        version: u32,
        create: CreateImporterFn,
        deserialize: DeserializeImporterFn,
    ) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            extensions: extensions.iter().map(|ext| normalize_extension(ext)).collect(),
            version,
            is_folder: false,
            create,
            deserialize,
        }
    }

    /// Mark as the importer used for directories.
    pub fn for_folders(mut self) -> Self {
        self.is_folder = true;
        self
    }

    pub fn create_behavior(&self) -> Box<dyn ImporterBehavior> {
        (self.create)()
    }

    /// Rebuild settings from a metadata file; missing settings use defaults.
    pub fn deserialize_behavior(&self, value: serde_json::Value) -> Result<Box<dyn ImporterBehavior>> {
        if value.is_null() {
            return Ok(self.create_behavior());
        }
        (self.deserialize)(value)
    }
}

/// Extension -> importer table, built once at startup
#[derive(Default)]
pub struct ImporterRegistry {
    by_name: AHashMap<String, Arc<ImporterDescriptor>>,
    by_extension: AHashMap<String, Arc<ImporterDescriptor>>,
    folder: Option<Arc<ImporterDescriptor>>,
}

impl ImporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_importers() -> Self {
        let mut registry = Self::new();
        super::importers::register_builtin_importers(&mut registry);
        registry
    }

    /// Register an importer. A later registration for the same extension
    /// replaces the earlier one.
    pub fn register(&mut self, descriptor: ImporterDescriptor) -> Arc<ImporterDescriptor> {
        let descriptor = Arc::new(descriptor);
        for ext in &descriptor.extensions {
            if let Some(previous) = self.by_extension.insert(ext.clone(), descriptor.clone()) {
                debug!(
                    extension = %ext,
                    previous = %previous.name,
                    importer = %descriptor.name,
                    "importer overridden"
                );
            }
        }
        if descriptor.is_folder {
            self.folder = Some(descriptor.clone());
        }
        self.by_name
            .insert(descriptor.name.clone(), descriptor.clone());
        descriptor
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<ImporterDescriptor>> {
        self.by_name.get(name).cloned()
    }

    pub fn for_extension(&self, extension: &str) -> Option<Arc<ImporterDescriptor>> {
        self.by_extension.get(&normalize_extension(extension)).cloned()
    }

    /// Importer for a logical or filesystem path by its extension.
    pub fn for_path(&self, path: &str) -> Option<Arc<ImporterDescriptor>> {
        let extension = extension_of(path);
        if extension.is_empty() {
            return None;
        }
        self.by_extension.get(&extension).cloned()
    }

    pub fn folder_importer(&self) -> Option<Arc<ImporterDescriptor>> {
        self.folder.clone()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<ImporterDescriptor>> {
        self.by_name.values()
    }
}

fn normalize_extension(extension: &str) -> String {
    let lower = extension.to_ascii_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::importers::{TextImporter, TextureImporter};

    #[test]
    fn test_builtin_lookup() {
        let registry = ImporterRegistry::with_builtin_importers();
        assert_eq!(
            registry.for_path("Assets/Textures/Grass.PNG").unwrap().name,
            "TextureImporter"
        );
        assert_eq!(registry.for_extension("mat").unwrap().name, "MaterialImporter");
        assert!(registry.for_path("Assets/README").is_none());
        assert!(registry.for_path("Assets/x.unknownext").is_none());
        assert!(registry.folder_importer().unwrap().is_folder);
    }

    #[test]
    fn test_settings_round_trip() {
        let registry = ImporterRegistry::with_builtin_importers();
        let descriptor = registry.by_name("TextureImporter").unwrap();

        let mut behavior = descriptor.create_behavior();
        behavior
            .as_any_mut()
            .downcast_mut::<TextureImporter>()
            .unwrap()
            .srgb = false;
        let value = serde_json::to_value(&*behavior).unwrap();

        let back = descriptor.deserialize_behavior(value).unwrap();
        let settings = back.as_any().downcast_ref::<TextureImporter>().unwrap();
        assert!(!settings.srgb);
    }

    #[test]
    fn test_null_settings_use_defaults() {
        let registry = ImporterRegistry::with_builtin_importers();
        let descriptor = registry.by_name("TextImporter").unwrap();
        let behavior = descriptor
            .deserialize_behavior(serde_json::Value::Null)
            .unwrap();
        assert!(behavior.as_any().is::<TextImporter>());
    }

    #[test]
    fn test_plugin_override() {
        let mut registry = ImporterRegistry::with_builtin_importers();
        registry.register(ImporterDescriptor::new::<TextImporter>(
            "NotesImporter",
            "Notes",
            &["TXT", ".notes"],
            1,
        ));
        assert_eq!(registry.for_extension(".txt").unwrap().name, "NotesImporter");
        assert_eq!(registry.for_extension("notes").unwrap().name, "NotesImporter");
        assert!(registry.by_name("TextImporter").is_some());
    }
}
