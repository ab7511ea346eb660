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

//! Asset object model
//!
//! Live assets are `Arc<RwLock<dyn Asset>>` values kept in an [`ObjectStore`].
//! Concrete types register with an [`AssetTypeRegistry`] so persisted files
//! can be turned back into trait objects.

pub mod handle;
pub mod store;
pub mod types;

pub use handle::{AssetHandle, UntypedAssetHandle};
pub use store::{ObjectId, ObjectStore, StoreStats};
pub use types::*;

use crate::error::{AssetError, Result};
use ahash::AHashMap;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Runtime object produced by an importer
pub trait Asset: Any + Send + Sync + erased_serde::Serialize {
    /// Stable name used in persisted files
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Whether the native renderer holds references to this asset
    fn is_native(&self) -> bool {
        false
    }
}

erased_serde::serialize_trait_object!(Asset);

/// Concrete, registrable asset type
pub trait TypedAsset: Asset + Serialize + DeserializeOwned + Default + Sized {
    const TYPE_NAME: &'static str;
}

/// Shared live asset
pub type SharedAsset = Arc<RwLock<dyn Asset>>;

/// Wrap a value as a shared asset.
pub fn share<T: Asset>(value: T) -> SharedAsset {
    Arc::new(RwLock::new(value))
}

/// Implement [`Asset`] and [`TypedAsset`] for a serde type
#[macro_export]
macro_rules! impl_asset {
    ($t:ty, $name:expr) => {
        $crate::impl_asset!($t, $name, native: false);
    };

    ($t:ty, $name:expr, native: $native:expr) => {
        impl $crate::assets::Asset for $t {
            fn type_name(&self) -> &'static str {
                $name
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }

            fn is_native(&self) -> bool {
                $native
            }
        }

        impl $crate::assets::TypedAsset for $t {
            const TYPE_NAME: &'static str = $name;
        }
    };
}

/// Registration data for one asset type
pub struct AssetTypeRegistration {
    pub type_name: &'static str,
    pub type_id: TypeId,
    pub default_fn: fn() -> SharedAsset,
    pub deserialize_fn: fn(serde_json::Value) -> Result<SharedAsset>,
    /// Replace the contents of an existing object in place
    pub overwrite_fn: fn(&mut dyn Asset, serde_json::Value) -> Result<()>,
}

impl AssetTypeRegistration {
    pub fn new<T: TypedAsset>() -> Self {
        Self {
            type_name: T::TYPE_NAME,
            type_id: TypeId::of::<T>(),
            default_fn: || share(T::default()),
            deserialize_fn: |value| Ok(share(parse_value::<T>(value)?)),
            overwrite_fn: |target, value| {
                let parsed = parse_value::<T>(value)?;
                let found = target.type_name();
                match target.as_any_mut().downcast_mut::<T>() {
                    Some(slot) => {
                        *slot = parsed;
                        Ok(())
                    }
                    None => Err(AssetError::TypeMismatch {
                        expected: T::TYPE_NAME,
                        found: found.to_string(),
                    }),
                }
            },
        }
    }
}

fn parse_value<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| AssetError::DeserializationError(e.to_string()))
}

/// Registry of asset types by persisted name
#[derive(Default)]
pub struct AssetTypeRegistry {
    registrations: AHashMap<&'static str, AssetTypeRegistration>,
}

impl AssetTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in asset type
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        types::register_builtin_types(&mut registry);
        registry
    }

    pub fn register<T: TypedAsset>(&mut self) {
        self.registrations
            .insert(T::TYPE_NAME, AssetTypeRegistration::new::<T>());
    }

    pub fn get(&self, type_name: &str) -> Option<&AssetTypeRegistration> {
        self.registrations.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.registrations.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_types_registered() {
        let registry = AssetTypeRegistry::with_builtin_types();
        assert!(registry.contains(Material::TYPE_NAME));
        assert!(registry.contains(Shader::TYPE_NAME));
        assert!(registry.contains(FolderAsset::TYPE_NAME));
        assert!(!registry.contains("Nope"));
    }

    #[test]
    fn test_deserialize_through_registry() {
        let registry = AssetTypeRegistry::with_builtin_types();
        let text = TextAsset {
            text: "hello".into(),
        };
        let value = serde_json::to_value(&text).unwrap();

        let reg = registry.get(TextAsset::TYPE_NAME).unwrap();
        let shared = (reg.deserialize_fn)(value).unwrap();
        let guard = shared.read();
        let back = guard.as_any().downcast_ref::<TextAsset>().unwrap();
        assert_eq!(back.text, "hello");
    }

    #[test]
    fn test_overwrite_keeps_identity() {
        let registry = AssetTypeRegistry::with_builtin_types();
        let shared = share(TextAsset { text: "old".into() });
        let before = Arc::as_ptr(&shared) as *const ();

        let value = serde_json::json!({ "text": "new" });
        let reg = registry.get(TextAsset::TYPE_NAME).unwrap();
        (reg.overwrite_fn)(&mut *shared.write(), value).unwrap();

        assert_eq!(Arc::as_ptr(&shared) as *const (), before);
        let guard = shared.read();
        assert_eq!(guard.as_any().downcast_ref::<TextAsset>().unwrap().text, "new");
    }

    #[test]
    fn test_overwrite_rejects_other_type() {
        let registry = AssetTypeRegistry::with_builtin_types();
        let shared = share(BinaryAsset::default());
        let reg = registry.get(TextAsset::TYPE_NAME).unwrap();
        let err = (reg.overwrite_fn)(&mut *shared.write(), serde_json::json!({ "text": "x" }));
        assert!(matches!(err, Err(AssetError::TypeMismatch { .. })));
    }

    #[test]
    fn test_trait_object_serializes() {
        let shared = share(TextAsset { text: "abc".into() });
        let guard = shared.read();
        let value = serde_json::to_value(&*guard).unwrap();
        assert_eq!(value, serde_json::json!({ "text": "abc" }));
    }
}
