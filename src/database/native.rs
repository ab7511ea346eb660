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


//! Reference counts held by the native renderer

use crate::assets::{ObjectId, UntypedAssetHandle};
use ahash::AHashMap;
use std::fmt;

/// Opaque integer handle given to native code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(u64);

impl NativeHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn object_id(self) -> ObjectId {
        ObjectId::from_native(self.0)
    }
}

impl From<ObjectId> for NativeHandle {
    fn from(id: ObjectId) -> Self {
        Self(id.to_native())
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Pins the object while the count is above zero.
struct NativeReference {
    _object: UntypedAssetHandle,
    ref_count: u32,
}

#[derive(Default)]
pub(crate) struct NativeReferenceTable {
    refs: AHashMap<NativeHandle, NativeReference>,
}

impl NativeReferenceTable {
    pub fn acquire(&mut self, object: UntypedAssetHandle) -> NativeHandle {
        let handle = NativeHandle::from(object.id());
        self.refs
            .entry(handle)
            .or_insert(NativeReference {
                _object: object,
                ref_count: 0,
            })
            .ref_count += 1;
        handle
    }

    /// Remaining count, or `None` for a handle that was never acquired.
    pub fn release(&mut self, handle: NativeHandle) -> Option<u32> {
        let reference = self.refs.get_mut(&handle)?;
        reference.ref_count -= 1;
        let remaining = reference.ref_count;
        if remaining == 0 {
            self.refs.remove(&handle);
        }
        Some(remaining)
    }

    pub fn ref_count(&self, handle: NativeHandle) -> u32 {
        self.refs.get(&handle).map_or(0, |r| r.ref_count)
    }

    pub fn pinned_count(&self) -> usize {
        self.refs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{share, ObjectStore, Texture};

    #[test]
    fn test_acquire_release_pins_object() {
        let mut store = ObjectStore::new();
        let object = share(Texture::default());
        let id = store.insert(object.clone());
        let mut table = NativeReferenceTable::default();

        let handle = table.acquire(UntypedAssetHandle::new(id, object.clone()));
        assert_eq!(table.acquire(UntypedAssetHandle::new(id, object)), handle);
        assert_eq!(table.ref_count(handle), 2);
        assert_eq!(handle.object_id(), id);

        assert_eq!(store.collect_unreferenced(), 0);
        assert_eq!(table.release(handle), Some(1));
        assert_eq!(table.release(handle), Some(0));
        assert_eq!(table.pinned_count(), 0);
        assert_eq!(store.collect_unreferenced(), 1);
    }

    #[test]
    fn test_release_unknown_handle() {
        let mut table = NativeReferenceTable::default();
        assert_eq!(table.release(NativeHandle::from_raw(42)), None);
        assert_eq!(table.ref_count(NativeHandle::from_raw(42)), 0);
    }
}
