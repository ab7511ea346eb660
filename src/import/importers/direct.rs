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

//! Importers whose source file is the asset itself

use super::behavior_any;
use crate::assets::{Material, Scene, TypedAsset};
use crate::error::Result;
use crate::import::{AssetIcons, AssetImportContext, AssetStorage, ImporterBehavior};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Round-trips `T` through its source file. Importing overwrites the live
/// object in place; saving writes it back.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct DirectAssetImporter<T> {
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

pub type MaterialImporter = DirectAssetImporter<Material>;
pub type SceneImporter = DirectAssetImporter<Scene>;

impl<T> Default for DirectAssetImporter<T> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

fn icons_for(type_name: &str) -> AssetIcons {
    match type_name {
        "Material" => AssetIcons::new("droplet"),
        "Scene" => AssetIcons::new("clapperboard"),
        _ => AssetIcons::default(),
    }
}

impl<T: TypedAsset> ImporterBehavior for DirectAssetImporter<T> {
    fn storage(&self) -> AssetStorage {
        AssetStorage::Direct(T::TYPE_NAME)
    }

    fn on_import_assets(&mut self, ctx: &mut AssetImportContext<'_>) -> Result<()> {
        let handle = ctx.add_main_asset_with_icons::<T>(icons_for(T::TYPE_NAME))?;
        let path = ctx.location().asset_full_path.clone();

        let loaded = {
            let mut guard = handle.object().write();
            ctx.host().persistence().overwrite(&path, &mut *guard)?
        };
        // Empty or missing file: start from defaults.
        if !loaded {
            if let Some(mut value) = handle.write() {
                *value = T::default();
            }
        }
        Ok(())
    }

    behavior_any!();
}
