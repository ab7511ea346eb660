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
use crate::assets::{FilterMode, Texture, WrapMode};
use crate::error::{AssetError, Result};
use crate::import::{AssetIcons, AssetImportContext, ImporterBehavior};
use serde::{Deserialize, Serialize};

/// Texture import settings. Pixel decoding is left to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureImporter {
    pub srgb: bool,
    pub generate_mipmaps: bool,
    pub filter: FilterMode,
    pub wrap: WrapMode,
}

impl Default for TextureImporter {
    fn default() -> Self {
        Self {
            srgb: true,
            generate_mipmaps: true,
            filter: FilterMode::default(),
            wrap: WrapMode::default(),
        }
    }
}

impl ImporterBehavior for TextureImporter {
    fn on_import_assets(&mut self, ctx: &mut AssetImportContext<'_>) -> Result<()> {
        let bytes = ctx.read_source_bytes()?;
        if bytes.is_empty() {
            return Err(AssetError::ImportFailed(format!(
                "{}: texture file is empty",
                ctx.location()
            )));
        }
        let source_format = ctx.location().extension().trim_start_matches('.').to_string();

        let handle = ctx.add_main_asset_with_icons::<Texture>(AssetIcons::new("image"))?;
        if let Some(mut texture) = handle.write() {
            *texture = Texture {
                source_format,
                srgb: self.srgb,
                generate_mipmaps: self.generate_mipmaps,
                filter: self.filter,
                wrap: self.wrap,
                bytes,
            };
        }
        Ok(())
    }

    behavior_any!();
}
