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

//! Live object store
//!
//! A generational arena of live assets. An [`ObjectId`] acts as a weak
//! handle: it stays valid only while the slot is occupied, and a recycled
//! slot gets a new generation so stale ids never alias a newer object.

use super::{SharedAsset, UntypedAssetHandle};
use crate::guid::AssetGuid;
use slotmap::{new_key_type, Key, KeyData, SlotMap};
use std::sync::Arc;

new_key_type! {
    /// Weak identifier of a live asset object.
    pub struct ObjectId;
}

impl ObjectId {
    /// Stable integer form handed to native code.
    pub fn to_native(self) -> u64 {
        self.data().as_ffi()
    }

    pub fn from_native(value: u64) -> Self {
        KeyData::from_ffi(value).into()
    }
}

struct ObjectSlot {
    object: SharedAsset,
    /// Persistent identity, set once the object belongs to an importer
    guid: Option<AssetGuid>,
}

/// Store statistics
#[derive(Clone, Debug, Default)]
pub struct StoreStats {
    pub inserted: u64,
    pub removed: u64,
    pub evicted: u64,
}

#[derive(Default)]
pub struct ObjectStore {
    slots: SlotMap<ObjectId, ObjectSlot>,
    stats: StoreStats,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: SharedAsset) -> ObjectId {
        self.stats.inserted += 1;
        self.slots.insert(ObjectSlot { object, guid: None })
    }

    pub fn get(&self, id: ObjectId) -> Option<SharedAsset> {
        self.slots.get(id).map(|slot| slot.object.clone())
    }

    pub fn handle(&self, id: ObjectId) -> Option<UntypedAssetHandle> {
        self.get(id).map(|object| UntypedAssetHandle::new(id, object))
    }

    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn guid(&self, id: ObjectId) -> Option<AssetGuid> {
        self.slots.get(id).and_then(|slot| slot.guid)
    }

    /// Mark the object as persistent. Returns false for a dead id.
    pub fn set_guid(&mut self, id: ObjectId, guid: AssetGuid) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.guid = Some(guid);
                true
            }
            None => false,
        }
    }

    pub fn clear_guid(&mut self, id: ObjectId) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.guid = None;
        }
    }

    /// Find the id of an object by pointer identity.
    pub fn find(&self, object: &SharedAsset) -> Option<ObjectId> {
        self.slots
            .iter()
            .find(|(_, slot)| Arc::ptr_eq(&slot.object, object))
            .map(|(id, _)| id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SharedAsset> {
        let slot = self.slots.remove(id)?;
        self.stats.removed += 1;
        Some(slot.object)
    }

    /// Evict every object that nothing outside the store references.
    ///
    /// Evicted persistent objects are recreated from their cache on the next
    /// request; their guid is unaffected.
    pub fn collect_unreferenced(&mut self) -> usize {
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| Arc::strong_count(&slot.object) > 1);
        let evicted = before - self.slots.len();
        self.stats.evicted += evicted as u64;
        evicted
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{share, TextAsset};

    #[test]
    fn test_insert_and_get() {
        let mut store = ObjectStore::new();
        let id = store.insert(share(TextAsset { text: "a".into() }));
        assert!(store.is_alive(id));
        assert!(store.get(id).is_some());
        assert!(store.guid(id).is_none());
    }

    #[test]
    fn test_collect_unreferenced() {
        let mut store = ObjectStore::new();
        let kept = store.insert(share(TextAsset::default()));
        let dropped = store.insert(share(TextAsset::default()));
        let hold = store.get(kept).unwrap();

        assert_eq!(store.collect_unreferenced(), 1);
        assert!(store.is_alive(kept));
        assert!(!store.is_alive(dropped));
        assert_eq!(store.stats().evicted, 1);
        drop(hold);
    }

    #[test]
    fn test_stale_id_after_recycle() {
        let mut store = ObjectStore::new();
        let first = store.insert(share(TextAsset::default()));
        store.remove(first);
        let second = store.insert(share(TextAsset::default()));
        assert!(!store.is_alive(first));
        assert!(store.is_alive(second));
        assert_ne!(first, second);
    }

    #[test]
    fn test_native_round_trip() {
        let mut store = ObjectStore::new();
        let id = store.insert(share(TextAsset::default()));
        assert_eq!(ObjectId::from_native(id.to_native()), id);
    }

    #[test]
    fn test_guid_marking() {
        let mut store = ObjectStore::new();
        let id = store.insert(share(TextAsset::default()));
        let guid = AssetGuid::new();
        assert!(store.set_guid(id, guid));
        assert_eq!(store.guid(id), Some(guid));
        store.clear_guid(id);
        assert!(store.guid(id).is_none());
    }
}
