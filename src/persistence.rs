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

//! Persistence service
//!
//! Assets are written as a JSON envelope `{ "type", "guid", "data" }` so the
//! loader can find the concrete type in the [`AssetTypeRegistry`].

use crate::assets::{Asset, AssetTypeRegistry, SharedAsset, TypedAsset};
use crate::error::{AssetError, Result};
use crate::guid::AssetGuid;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    #[serde(rename = "type")]
    type_name: &'a str,
    guid: Option<AssetGuid>,
    data: &'a dyn Asset,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    guid: Option<AssetGuid>,
    data: serde_json::Value,
}

/// Asset loaded from disk
pub struct LoadedAsset {
    pub object: SharedAsset,
    pub guid: Option<AssetGuid>,
}

pub struct Persistence {
    types: AssetTypeRegistry,
}

impl Persistence {
    pub fn new(types: AssetTypeRegistry) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &AssetTypeRegistry {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut AssetTypeRegistry {
        &mut self.types
    }

    /// Write an asset, creating parent directories.
    pub fn save(&self, asset: &dyn Asset, guid: Option<AssetGuid>, path: &Path) -> Result<()> {
        let envelope = EnvelopeRef {
            type_name: asset.type_name(),
            guid,
            data: asset,
        };
        let json = serde_json::to_vec_pretty(&envelope)?;
        write_file(path, &json)
    }

    /// Read an asset. A missing file is `Ok(None)`.
    pub fn load(&self, path: &Path) -> Result<Option<LoadedAsset>> {
        let Some(envelope) = self.read_envelope(path)? else {
            return Ok(None);
        };
        let registration = self
            .types
            .get(&envelope.type_name)
            .ok_or_else(|| AssetError::UnknownAssetType(envelope.type_name.clone()))?;
        let object = (registration.deserialize_fn)(envelope.data)?;
        Ok(Some(LoadedAsset {
            object,
            guid: envelope.guid,
        }))
    }

    pub fn load_typed<T: TypedAsset>(&self, path: &Path) -> Result<Option<T>> {
        let Some(envelope) = self.read_envelope(path)? else {
            return Ok(None);
        };
        if envelope.type_name != T::TYPE_NAME {
            return Err(AssetError::TypeMismatch {
                expected: T::TYPE_NAME,
                found: envelope.type_name,
            });
        }
        serde_json::from_value(envelope.data)
            .map(Some)
            .map_err(|e| AssetError::DeserializationError(e.to_string()))
    }

    /// Replace the contents of `target` with the file's data, keeping the
    /// object's identity. Returns false when the file is missing or empty.
    pub fn overwrite(&self, path: &Path, target: &mut dyn Asset) -> Result<bool> {
        let Some(envelope) = self.read_envelope(path)? else {
            return Ok(false);
        };
        let registration = self
            .types
            .get(target.type_name())
            .ok_or_else(|| AssetError::UnknownAssetType(target.type_name().to_string()))?;
        if envelope.type_name != registration.type_name {
            return Err(AssetError::TypeMismatch {
                expected: registration.type_name,
                found: envelope.type_name,
            });
        }
        (registration.overwrite_fn)(target, envelope.data)?;
        Ok(true)
    }

    /// Write any serde value as JSON, creating parent directories.
    pub fn save_value<T: Serialize + ?Sized>(&self, value: &T, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(value)?;
        write_file(path, &json)
    }

    pub fn load_value<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match read_file(path)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| AssetError::DeserializationError(e.to_string())),
            None => Ok(None),
        }
    }

    fn read_envelope(&self, path: &Path) -> Result<Option<Envelope>> {
        match read_file(path)? {
            Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| AssetError::DeserializationError(format!("{}: {e}", path.display()))),
            None => Ok(None),
        }
    }
}

impl Default for Persistence {
    fn default() -> Self {
        Self::new(AssetTypeRegistry::with_builtin_types())
    }
}

fn read_file(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{share, Material, MaterialValue, TextAsset};

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/m.mat");
        let persistence = Persistence::default();

        let mut material = Material::default();
        material
            .properties
            .insert("_Roughness".into(), MaterialValue::Float(0.5));
        let guid = AssetGuid::new();
        persistence.save(&material, Some(guid), &path).unwrap();

        let loaded = persistence.load(&path).unwrap().unwrap();
        assert_eq!(loaded.guid, Some(guid));
        let guard = loaded.object.read();
        assert_eq!(guard.as_any().downcast_ref::<Material>(), Some(&material));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = Persistence::default();
        assert!(persistence.load(&dir.path().join("nope")).unwrap().is_none());
        assert!(persistence
            .load_value::<serde_json::Value>(&dir.path().join("nope"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_overwrite_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt.asset");
        let persistence = Persistence::default();
        persistence
            .save(&TextAsset { text: "disk".into() }, None, &path)
            .unwrap();

        let live = share(TextAsset { text: "memory".into() });
        assert!(persistence.overwrite(&path, &mut *live.write()).unwrap());
        let guard = live.read();
        assert_eq!(guard.as_any().downcast_ref::<TextAsset>().unwrap().text, "disk");
    }

    #[test]
    fn test_empty_file_overwrites_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.mat");
        std::fs::write(&path, "").unwrap();
        let persistence = Persistence::default();

        let live = share(Material::default());
        assert!(!persistence.overwrite(&path, &mut *live.write()).unwrap());
    }

    #[test]
    fn test_unknown_type_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.asset");
        std::fs::write(&path, r#"{ "type": "Alien", "data": {} }"#).unwrap();
        let persistence = Persistence::default();
        assert!(matches!(
            persistence.load(&path),
            Err(AssetError::UnknownAssetType(_))
        ));
    }

    #[test]
    fn test_load_typed_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.mat");
        let persistence = Persistence::default();
        persistence.save(&Material::default(), None, &path).unwrap();
        assert!(persistence.load_typed::<Material>(&path).unwrap().is_some());
        assert!(persistence.load_typed::<TextAsset>(&path).is_err());
    }
}
