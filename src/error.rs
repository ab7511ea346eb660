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

//! Error types

use std::fmt;

/// Asset pipeline error type
#[derive(Debug, Clone)]
pub enum AssetError {
    /// No asset (or no importer) exists for the given path or guid
    AssetNotFound(String),

    /// No importer is registered for the file extension
    ImporterNotFound(String),

    /// Importer name recorded in a metadata file is not registered
    UnknownImporter(String),

    /// Asset type name recorded in a persisted file is not registered
    UnknownAssetType(String),

    /// Path resolves to no known asset category
    UnknownCategory(String),

    /// Path is a metadata file, not an asset
    ImporterFilePath(String),

    /// Asset outside the project category cannot be created or edited
    NotEditable(String),

    /// Asset or path is already registered
    AlreadyExists(String),

    /// Importer for the path does not store assets directly
    NotDirectImporter(String),

    /// Two outputs of one import share a name
    DuplicateAssetName(String),

    /// Main asset was added twice during one import
    MainAssetAlreadySet(String),

    /// Main asset requested before any import populated it
    MainAssetMissing(String),

    /// Live object does not have the requested type
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// Importer is already running further up the call stack
    ImportCycle(String),

    /// Import logic failed
    ImportFailed(String),

    /// Serialization error
    SerializationError(String),

    /// Deserialization error
    DeserializationError(String),

    /// File watcher error
    WatchError(String),

    /// IO error (file operations, etc.)
    IoError(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::AssetNotFound(msg) => write!(f, "Asset not found: {msg}"),
            AssetError::ImporterNotFound(msg) => write!(f, "No importer for: {msg}"),
            AssetError::UnknownImporter(name) => write!(f, "Unknown importer: {name}"),
            AssetError::UnknownAssetType(name) => write!(f, "Unknown asset type: {name}"),
            AssetError::UnknownCategory(path) => write!(f, "Path has no asset category: {path}"),
            AssetError::ImporterFilePath(path) => write!(f, "Path is an importer file: {path}"),
            AssetError::NotEditable(path) => write!(f, "Asset is not editable: {path}"),
            AssetError::AlreadyExists(msg) => write!(f, "Asset already exists: {msg}"),
            AssetError::NotDirectImporter(path) => {
                write!(f, "Importer does not store assets directly: {path}")
            }
            AssetError::DuplicateAssetName(name) => write!(f, "Duplicate asset name: {name}"),
            AssetError::MainAssetAlreadySet(path) => {
                write!(f, "Main asset was already added: {path}")
            }
            AssetError::MainAssetMissing(path) => write!(f, "Main asset is missing: {path}"),
            AssetError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {expected}, found {found}")
            }
            AssetError::ImportCycle(path) => write!(f, "Import cycle detected at: {path}"),
            AssetError::ImportFailed(msg) => write!(f, "Import failed: {msg}"),
            AssetError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            AssetError::DeserializationError(msg) => write!(f, "Deserialization error: {msg}"),
            AssetError::WatchError(msg) => write!(f, "Watch error: {msg}"),
            AssetError::IoError(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for AssetError {}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        AssetError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AssetError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            AssetError::IoError(err.to_string())
        } else {
            AssetError::SerializationError(err.to_string())
        }
    }
}

impl From<notify::Error> for AssetError {
    fn from(err: notify::Error) -> Self {
        AssetError::WatchError(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AssetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AssetError::DuplicateAssetName("Main".into());
        assert_eq!(err.to_string(), "Duplicate asset name: Main");

        let err = AssetError::TypeMismatch {
            expected: "Material",
            found: "Texture".into(),
        };
        assert_eq!(err.to_string(), "Type mismatch: expected Material, found Texture");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AssetError = io.into();
        assert!(matches!(err, AssetError::IoError(_)));
    }
}
