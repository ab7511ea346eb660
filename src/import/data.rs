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

//! Per-object asset record

use crate::assets::{ObjectId, ObjectStore, UntypedAssetHandle};
use crate::guid::AssetGuid;
use serde::{Deserialize, Serialize};

/// Icon used when an importer does not pick one
pub const DEFAULT_ICON: &str = "file";

/// Metadata for one object produced by an importer.
///
/// The guid is persisted as the key of the importer's asset map, and the
/// live object is only referenced weakly through its [`ObjectId`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetData {
    #[serde(skip)]
    guid: AssetGuid,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    normal_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expanded_icon: Option<String>,
    #[serde(skip)]
    object: Option<ObjectId>,
}

impl AssetData {
    /// New record with a freshly generated guid.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            guid: AssetGuid::new(),
            name: name.into(),
            normal_icon: None,
            expanded_icon: None,
            object: None,
        }
    }

    /// Rebind the guid read from the metadata map key.
    pub(crate) fn with_guid(mut self, guid: AssetGuid) -> Self {
        self.guid = guid;
        self
    }

    pub fn guid(&self) -> AssetGuid {
        self.guid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normal_icon(&self) -> &str {
        self.normal_icon.as_deref().unwrap_or(DEFAULT_ICON)
    }

    /// Icon for an expanded tree node; falls back to the normal icon.
    pub fn expanded_icon(&self) -> &str {
        self.expanded_icon
            .as_deref()
            .unwrap_or_else(|| self.normal_icon())
    }

    pub fn set_icons(&mut self, normal: Option<String>, expanded: Option<String>) {
        self.normal_icon = normal;
        self.expanded_icon = expanded;
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        self.object
    }

    pub fn is_asset_created(&self, store: &ObjectStore) -> bool {
        self.object.is_some_and(|id| store.is_alive(id))
    }

    /// Live object, if it has not been evicted.
    pub fn try_get_asset(&self, store: &ObjectStore) -> Option<UntypedAssetHandle> {
        self.object.and_then(|id| store.handle(id))
    }

    /// Bind a live object and give it this record's guid.
    pub fn set_asset(&mut self, store: &mut ObjectStore, id: ObjectId) {
        store.set_guid(id, self.guid);
        self.object = Some(id);
    }

    pub fn clear_asset(&mut self) {
        self.object = None;
    }
}
