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

//! Plain text and binary passthrough importers

use super::behavior_any;
use crate::assets::{BinaryAsset, TextAsset};
use crate::error::Result;
use crate::import::{AssetIcons, AssetImportContext, ImporterBehavior};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TextImporter {}

impl ImporterBehavior for TextImporter {
    fn on_import_assets(&mut self, ctx: &mut AssetImportContext<'_>) -> Result<()> {
        let text = ctx.read_source_text()?;
        let handle = ctx.add_main_asset_with_icons::<TextAsset>(AssetIcons::new("file-lines"))?;
        if let Some(mut asset) = handle.write() {
            asset.text = text;
        }
        Ok(())
    }

    behavior_any!();
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BinaryImporter {}

impl ImporterBehavior for BinaryImporter {
    fn on_import_assets(&mut self, ctx: &mut AssetImportContext<'_>) -> Result<()> {
        let bytes = ctx.read_source_bytes()?;
        let handle = ctx.add_main_asset::<BinaryAsset>()?;
        if let Some(mut asset) = handle.write() {
            asset.bytes = bytes;
        }
        Ok(())
    }

    behavior_any!();
}
