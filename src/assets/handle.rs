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

//! Asset handles
//!
//! Handles are strong: holding one keeps the live object out of
//! [`ObjectStore::collect_unreferenced`](super::ObjectStore::collect_unreferenced).

use super::{ObjectId, SharedAsset, TypedAsset};
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::marker::PhantomData;

/// Handle to a live asset of any type
#[derive(Clone)]
pub struct UntypedAssetHandle {
    id: ObjectId,
    object: SharedAsset,
}

impl UntypedAssetHandle {
    pub fn new(id: ObjectId, object: SharedAsset) -> Self {
        Self { id, object }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn object(&self) -> &SharedAsset {
        &self.object
    }

    pub fn type_name(&self) -> &'static str {
        self.object.read().type_name()
    }

    pub fn is<T: TypedAsset>(&self) -> bool {
        self.object.read().as_any().is::<T>()
    }

    pub fn is_native(&self) -> bool {
        self.object.read().is_native()
    }

    /// Typed view, or `None` when the object is of another type.
    pub fn typed<T: TypedAsset>(self) -> Option<AssetHandle<T>> {
        self.is::<T>().then(|| AssetHandle {
            inner: self,
            _marker: PhantomData,
        })
    }
}

impl PartialEq for UntypedAssetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for UntypedAssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UntypedAssetHandle")
            .field("id", &self.id)
            .field("type", &self.type_name())
            .finish()
    }
}

/// Typed handle to a live asset
pub struct AssetHandle<T: TypedAsset> {
    inner: UntypedAssetHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: TypedAsset> AssetHandle<T> {
    /// Caller guarantees the object is a `T`.
    pub(crate) fn from_untyped_unchecked(inner: UntypedAssetHandle) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    pub fn untyped(&self) -> &UntypedAssetHandle {
        &self.inner
    }

    pub fn into_untyped(self) -> UntypedAssetHandle {
        self.inner
    }

    pub fn object(&self) -> &SharedAsset {
        &self.inner.object
    }

    /// Read access. `None` only if the object was replaced by another type.
    pub fn read(&self) -> Option<MappedRwLockReadGuard<'_, T>> {
        RwLockReadGuard::try_map(self.inner.object.read(), |asset| {
            asset.as_any().downcast_ref::<T>()
        })
        .ok()
    }

    pub fn write(&self) -> Option<MappedRwLockWriteGuard<'_, T>> {
        RwLockWriteGuard::try_map(self.inner.object.write(), |asset| {
            asset.as_any_mut().downcast_mut::<T>()
        })
        .ok()
    }
}

impl<T: TypedAsset> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: TypedAsset> PartialEq for AssetHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: TypedAsset> fmt::Debug for AssetHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle")
            .field("id", &self.inner.id)
            .field("type", &T::TYPE_NAME)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{share, BinaryAsset, ObjectStore, TextAsset};

    #[test]
    fn test_typed_access() {
        let mut store = ObjectStore::new();
        let id = store.insert(share(TextAsset { text: "v1".into() }));
        let handle = store.handle(id).unwrap().typed::<TextAsset>().unwrap();

        handle.write().unwrap().text.push_str("+edit");
        assert_eq!(handle.read().unwrap().text, "v1+edit");
    }

    #[test]
    fn test_wrong_type_is_none() {
        let mut store = ObjectStore::new();
        let id = store.insert(share(TextAsset::default()));
        assert!(store.handle(id).unwrap().typed::<BinaryAsset>().is_none());
    }
}
