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
use crate::assets::{Mesh, Model};
use crate::error::{AssetError, Result};
use crate::import::{AssetIcons, AssetImportContext, ImporterBehavior};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// glTF (JSON) models. Every mesh becomes a sub-asset named `Mesh/<name>`,
/// so meshes keep their guid across reimports as long as their name is
/// unchanged. Geometry extraction happens in the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GltfImporter {
    pub import_meshes: bool,
}

impl Default for GltfImporter {
    fn default() -> Self {
        Self {
            import_meshes: true,
        }
    }
}

impl ImporterBehavior for GltfImporter {
    fn on_import_assets(&mut self, ctx: &mut AssetImportContext<'_>) -> Result<()> {
        let text = ctx.read_source_text()?;
        let document: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| AssetError::ImportFailed(format!("{}: {e}", ctx.location())))?;

        let model = ctx.add_main_asset_with_icons::<Model>(AssetIcons::new("cube"))?;

        let mut mesh_guids = Vec::new();
        if self.import_meshes {
            let meshes = document["meshes"].as_array().cloned().unwrap_or_default();
            let mut used = HashSet::new();
            for (index, mesh) in meshes.iter().enumerate() {
                let base = mesh["name"]
                    .as_str()
                    .map_or_else(|| format!("Mesh{index}"), str::to_string);
                let mut name = base.clone();
                let mut suffix = 1;
                while !used.insert(name.clone()) {
                    name = format!("{base}_{suffix}");
                    suffix += 1;
                }

                let primitives = mesh["primitives"].as_array();
                let handle = ctx.add_asset::<Mesh>(
                    &format!("Mesh/{name}"),
                    false,
                    AssetIcons::new("shapes"),
                )?;
                if let Some(mut value) = handle.write() {
                    *value = Mesh {
                        name,
                        primitive_count: primitives.map_or(0, Vec::len),
                        material: primitives
                            .and_then(|p| p.first())
                            .and_then(|p| p["material"].as_u64())
                            .map(|m| m as usize),
                    };
                }
                mesh_guids.extend(ctx.guid_of(handle.untyped()));
            }
        }

        if let Some(mut value) = model.write() {
            value.meshes = mesh_guids;
        }
        Ok(())
    }

    behavior_any!();
}
