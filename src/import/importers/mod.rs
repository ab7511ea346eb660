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

//! Built-in importers

mod direct;
mod folder;
mod gltf;
mod raw;
mod shader;
mod texture;

pub use direct::{DirectAssetImporter, MaterialImporter, SceneImporter};
pub use folder::FolderImporter;
pub use gltf::GltfImporter;
pub use raw::{BinaryImporter, TextImporter};
pub use shader::{ShaderImporter, ShaderIncludeImporter};
pub use texture::TextureImporter;

use super::{ImporterBehavior, ImporterDescriptor, ImporterRegistry};
use crate::assets::ShaderKind;
use crate::error::AssetError;
use std::sync::Arc;

macro_rules! behavior_any {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

pub(crate) use behavior_any;

pub(crate) fn register_builtin_importers(registry: &mut ImporterRegistry) {
    registry.register(
        ImporterDescriptor::new::<FolderImporter>("FolderImporter", "Folder", &[], 1).for_folders(),
    );
    registry.register(ImporterDescriptor::new::<MaterialImporter>(
        "MaterialImporter",
        "Material",
        &[".mat"],
        1,
    ));
    registry.register(ImporterDescriptor::new::<SceneImporter>(
        "SceneImporter",
        "Scene",
        &[".scene"],
        1,
    ));
    registry.register(ImporterDescriptor::new::<TextureImporter>(
        "TextureImporter",
        "Texture",
        &[".png", ".jpg", ".jpeg", ".tga", ".bmp", ".dds"],
        2,
    ));
    registry.register(ImporterDescriptor::new::<ShaderIncludeImporter>(
        "ShaderIncludeImporter",
        "Shader Include",
        &[".hlsl", ".hlsli"],
        1,
    ));
    registry.register(ImporterDescriptor::new::<ShaderImporter>(
        "ShaderImporter",
        "Shader",
        &[".shader"],
        3,
    ));
    registry.register(ImporterDescriptor::with_factory(
        "ComputeShaderImporter",
        "Compute Shader",
        &[".compute"],
        3,
        Arc::new(|| Box::new(ShaderImporter::new(ShaderKind::Compute)) as Box<dyn ImporterBehavior>),
        Arc::new(|value: serde_json::Value| {
            serde_json::from_value::<ShaderImporter>(value)
                .map(|behavior| Box::new(behavior) as Box<dyn ImporterBehavior>)
                .map_err(|e| AssetError::DeserializationError(e.to_string()))
        }),
    ));
    registry.register(ImporterDescriptor::new::<GltfImporter>(
        "GltfImporter",
        "glTF Model",
        &[".gltf"],
        1,
    ));
    registry.register(ImporterDescriptor::new::<TextImporter>(
        "TextImporter",
        "Text",
        &[".txt", ".json", ".md", ".toml"],
        1,
    ));
    registry.register(ImporterDescriptor::new::<BinaryImporter>(
        "BinaryImporter",
        "Binary",
        &[".bytes", ".bin"],
        1,
    ));
}
