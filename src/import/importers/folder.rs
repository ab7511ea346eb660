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

use super::behavior_any;
use crate::assets::FolderAsset;
use crate::error::Result;
use crate::import::{AssetIcons, AssetImportContext, AssetStorage, ImporterBehavior};
use serde::{Deserialize, Serialize};

/// Folders produce a placeholder object rebuilt on demand.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FolderImporter {}

impl ImporterBehavior for FolderImporter {
    fn storage(&self) -> AssetStorage {
        AssetStorage::Transient
    }

    fn on_import_assets(&mut self, ctx: &mut AssetImportContext<'_>) -> Result<()> {
        ctx.add_main_asset_with_icons::<FolderAsset>(AssetIcons::folder())?;
        Ok(())
    }

    behavior_any!();
}
