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

//! Shader importers
//!
//! Includes are resolved through the asset database so each include becomes
//! a dependency: editing a `.hlsl` file reimports every shader using it.
//! Compilation itself belongs to the renderer; this importer only runs the
//! checks that do not need a compiler and records their messages.

use super::behavior_any;
use crate::assets::{Shader, ShaderInclude, ShaderKind};
use crate::config::GraphicsSettings;
use crate::error::{AssetError, Result};
use crate::import::{AssetIcons, AssetImportContext, ImporterBehavior, ReimportCheck};
use crate::location::{normalize_path, strip_prefix_ignore_case, AssetLocation};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

const ENGINE_SHADER_ROOT: &str = "Engine/Shaders";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShaderIncludeImporter {}

impl ImporterBehavior for ShaderIncludeImporter {
    fn on_import_assets(&mut self, ctx: &mut AssetImportContext<'_>) -> Result<()> {
        let source = ctx.read_source_text()?;
        let handle = ctx.add_main_asset_with_icons::<ShaderInclude>(AssetIcons::new("file-code"))?;
        if let Some(mut include) = handle.write() {
            include.source = source;
        }
        Ok(())
    }

    behavior_any!();
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderImporter {
    pub kind: ShaderKind,
    warnings: Vec<String>,
    errors: Vec<String>,
    /// Settings the current output was produced for
    compiled_with: Option<GraphicsSettings>,
}

impl ShaderImporter {
    pub fn new(kind: ShaderKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    fn check_entry_points(&mut self, source: &str) {
        let pragmas: Vec<&str> = source
            .lines()
            .filter_map(|line| line.trim_start().strip_prefix("#pragma"))
            .map(str::trim)
            .collect();
        let has = |name: &str| pragmas.iter().any(|p| p.split_whitespace().next() == Some(name));

        match self.kind {
            ShaderKind::Graphics => {
                for stage in ["vertex", "fragment"] {
                    if !has(stage) {
                        self.warnings
                            .push(format!("no #pragma {stage}; default entry point assumed"));
                    }
                }
            }
            ShaderKind::Compute => {
                if !has("kernel") {
                    self.errors.push("compute shader declares no #pragma kernel".to_string());
                }
            }
        }
    }
}

impl ImporterBehavior for ShaderImporter {
    fn on_import_assets(&mut self, ctx: &mut AssetImportContext<'_>) -> Result<()> {
        self.warnings.clear();
        self.errors.clear();

        let source = ctx.read_source_text()?;
        let settings = ctx.graphics_settings();
        let mut resolved = String::with_capacity(source.len());
        let mut includes = Vec::new();

        for (index, line) in source.lines().enumerate() {
            let Some(target) = parse_include(line) else {
                resolved.push_str(line);
                resolved.push('\n');
                continue;
            };

            match require_include(ctx, target) {
                Ok((handle, guid)) => {
                    if let Some(include) = handle.read() {
                        resolved.push_str(&include.source);
                        resolved.push('\n');
                    }
                    includes.extend(guid);
                }
                Err(err) => self
                    .errors
                    .push(format!("line {}: cannot include \"{target}\": {err}", index + 1)),
            }
        }

        self.check_entry_points(&source);
        self.compiled_with = Some(settings);

        let name = ctx
            .location()
            .file_name()
            .rsplit_once('.')
            .map_or(ctx.location().file_name(), |(stem, _)| stem)
            .to_string();
        let handle = ctx.add_main_asset_with_icons::<Shader>(AssetIcons::new("code"))?;
        if let Some(mut shader) = handle.write() {
            *shader = Shader {
                name,
                kind: self.kind,
                source: resolved,
                includes,
                reversed_z: settings.reversed_z,
                color_space: settings.color_space,
            };
        }
        Ok(())
    }

    fn check_need_reimport(&self, check: &ReimportCheck<'_>) -> bool {
        self.compiled_with != Some(check.host.graphics_settings())
    }

    fn log_import_messages(&self, location: &AssetLocation) {
        for message in &self.warnings {
            warn!(path = %location, "{message}");
        }
        for message in &self.errors {
            error!(path = %location, "{message}");
        }
    }

    behavior_any!();
}

type IncludeHandle = crate::assets::AssetHandle<ShaderInclude>;

/// Resolve relative to the including file, then under `Engine/Shaders`.
fn require_include(
    ctx: &mut AssetImportContext<'_>,
    target: &str,
) -> Result<(IncludeHandle, Option<crate::guid::AssetGuid>)> {
    let relative = resolve_include(ctx.location(), target);
    let handle = match ctx.require_other_asset::<ShaderInclude>(&relative, true) {
        Err(AssetError::AssetNotFound(_)) if !is_rooted(target) => {
            let engine = format!("{ENGINE_SHADER_ROOT}/{}", normalize_path(target));
            ctx.require_other_asset::<ShaderInclude>(&engine, true)?
        }
        other => other?,
    };
    let guid = ctx.guid_of(handle.untyped());
    Ok((handle, guid))
}

fn parse_include(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("#include")?.trim_start();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn is_rooted(target: &str) -> bool {
    strip_prefix_ignore_case(target, "Assets/").is_some()
        || strip_prefix_ignore_case(target, "Engine/").is_some()
}

fn resolve_include(location: &AssetLocation, target: &str) -> String {
    let target = normalize_path(target);
    if is_rooted(&target) {
        return target;
    }
    let mut parts: Vec<&str> = location
        .parent_path()
        .unwrap_or("")
        .split('/')
        .filter(|part| !part.is_empty())
        .collect();
    for part in target.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
