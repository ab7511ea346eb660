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

//! Built-in asset types

use super::AssetTypeRegistry;
use crate::config::ColorSpace;
use crate::guid::AssetGuid;
use crate::impl_asset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder object for a folder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderAsset;

impl_asset!(FolderAsset, "Folder");

/// Material property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialValue {
    Float(f32),
    Int(i32),
    Vector([f32; 4]),
    Color([f32; 4]),
    Texture(Option<AssetGuid>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub shader: Option<AssetGuid>,
    pub render_queue: i32,
    pub properties: BTreeMap<String, MaterialValue>,
}

impl_asset!(Material, "Material");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneObject {
    pub name: String,
    pub parent: Option<usize>,
    pub components: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
}

impl_asset!(Scene, "Scene");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    Point,
    #[default]
    Bilinear,
    Trilinear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapMode {
    #[default]
    Repeat,
    Clamp,
    Mirror,
}

/// Texture source bytes plus sampling state; decoding happens in the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Texture {
    pub source_format: String,
    pub srgb: bool,
    pub generate_mipmaps: bool,
    pub filter: FilterMode,
    pub wrap: WrapMode,
    pub bytes: Vec<u8>,
}

impl_asset!(Texture, "Texture", native: true);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderInclude {
    pub source: String,
}

impl_asset!(ShaderInclude, "ShaderInclude");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaderKind {
    #[default]
    Graphics,
    Compute,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shader {
    pub name: String,
    pub kind: ShaderKind,
    /// Source with every include resolved in place
    pub source: String,
    pub includes: Vec<AssetGuid>,
    pub reversed_z: bool,
    pub color_space: ColorSpace,
}

impl_asset!(Shader, "Shader", native: true);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextAsset {
    pub text: String,
}

impl_asset!(TextAsset, "Text");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryAsset {
    pub bytes: Vec<u8>,
}

impl_asset!(BinaryAsset, "Binary");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mesh {
    pub name: String,
    pub primitive_count: usize,
    pub material: Option<usize>,
}

impl_asset!(Mesh, "Mesh", native: true);

/// Root object of an imported model file; meshes are sub-assets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    pub meshes: Vec<AssetGuid>,
}

impl_asset!(Model, "Model");

pub(crate) fn register_builtin_types(registry: &mut AssetTypeRegistry) {
    registry.register::<FolderAsset>();
    registry.register::<Material>();
    registry.register::<Scene>();
    registry.register::<Texture>();
    registry.register::<ShaderInclude>();
    registry.register::<Shader>();
    registry.register::<TextAsset>();
    registry.register::<BinaryAsset>();
    registry.register::<Mesh>();
    registry.register::<Model>();
}
