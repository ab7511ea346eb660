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


mod common;

use asset_pipeline::assets::{Material, MaterialValue, TextAsset};
use asset_pipeline::{AssetError, AssetGuid, ReimportMode};
use common::{paths_of, record, Project};

#[test]
fn test_initialize_imports_everything() {
    let project = Project::new();
    project.write("Assets/readme.txt", "hello");
    project.write("Assets/Notes/todo.md", "- ship it");
    project.write("Engine/Shaders/Common.hlsl", "float4 tint;");
    project.write("Assets/unknown.xyz", "ignored");

    let mut db = project.database();
    db.initialize().unwrap();

    let paths: Vec<String> = db
        .get_all_asset_locations()
        .into_iter()
        .map(|(location, _)| location.asset_path)
        .collect();
    assert_eq!(
        paths,
        vec![
            "Assets/Notes",
            "Assets/Notes/todo.md",
            "Assets/readme.txt",
            "Engine/Shaders/Common.hlsl",
        ]
    );
    assert!(db.is_folder("Assets/Notes"));
    assert!(!db.is_folder("Assets/readme.txt"));

    // Engine metadata lives in the project's Meta tree, project metadata
    // next to the source.
    assert!(project.path("Assets/readme.txt.meta").is_file());
    assert!(project.path("Meta/Engine/Shaders/Common.hlsl.meta").is_file());

    let text = db.load::<TextAsset>("Assets/readme.txt").unwrap().unwrap();
    assert_eq!(text.read().unwrap().text, "hello");
}

#[test]
fn test_non_ascii_asset_names() {
    let project = Project::new();
    project.write("Assets/Textures/草原", "no extension");
    project.write("Assets/日本/草原.txt", "grassland");

    let mut db = project.database();
    db.initialize().unwrap();

    assert!(db.is_folder("Assets/日本"));
    assert!(!db.contains_path("Assets/Textures/草原"));
    assert!(project.path("Assets/日本/草原.txt.meta").is_file());
    let guid = db.get_guid_by_path("Assets/日本/草原.txt").unwrap();
    assert_eq!(db.get_path_by_guid(guid), Some("Assets/日本/草原.txt"));

    let text = db.load::<TextAsset>("Assets/日本/草原.txt").unwrap().unwrap();
    assert_eq!(text.read().unwrap().text, "grassland");
}

#[test]
fn test_reimport_is_idempotent_across_sessions() {
    let project = Project::new();
    project.write("Assets/readme.txt", "hello");
    project.write("Assets/Shaders/Common.hlsl", "float4 tint;");
    project.write(
        "Assets/Shaders/Lit.shader",
        "#include \"Common.hlsl\"\n#pragma vertex vert\n#pragma fragment frag\n",
    );

    let mut first = project.database();
    first.initialize().unwrap();
    let guid = first.get_guid_by_path("Assets/readme.txt").unwrap();
    first.shutdown();
    drop(first);

    let mut second = project.database();
    let log = record(&mut second);
    second.initialize().unwrap();

    assert!(paths_of(&log, "reimported").is_empty());
    assert_eq!(second.get_guid_by_path("Assets/readme.txt"), Some(guid));
    assert_eq!(second.get_path_by_guid(guid), Some("Assets/readme.txt"));
    assert_eq!(
        second.dependers_of("Assets/Shaders/Common.hlsl"),
        vec!["Assets/Shaders/Lit.shader"]
    );
}

#[test]
fn test_guid_format() {
    let project = Project::new();
    project.write("Assets/readme.txt", "hello");
    let mut db = project.database();
    db.initialize().unwrap();

    let guid = db.get_guid_by_path("Assets/readme.txt").unwrap().to_string();
    assert_eq!(guid.len(), 32);
    assert!(guid.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_create_and_load_round_trip() {
    let project = Project::new();
    let mut db = project.database();
    db.initialize().unwrap();

    let mut material = Material {
        render_queue: 3000,
        ..Material::default()
    };
    material
        .properties
        .insert("_Color".to_string(), MaterialValue::Color([1.0, 0.5, 0.25, 1.0]));
    let handle = db.instantiate(material.clone());
    let guid = db.create("Assets/Materials/Rock.mat", handle.untyped()).unwrap();

    assert_eq!(db.store().guid(handle.id()), Some(guid));
    assert_eq!(db.get_guid_by_path("Assets/Materials/Rock.mat"), Some(guid));
    assert!(project.path("Assets/Materials/Rock.mat").is_file());

    // Evicted, then recreated from the source file.
    drop(handle);
    assert!(db.collect_garbage() >= 1);
    let loaded = db.load::<Material>("Assets/Materials/Rock.mat").unwrap().unwrap();
    assert_eq!(*loaded.read().unwrap(), material);
    assert_eq!(db.load_by_guid::<Material>(guid).unwrap(), loaded);
}

#[test]
fn test_create_rejects_invalid_targets() {
    let project = Project::new();
    let mut db = project.database();
    db.initialize().unwrap();

    let first = db.instantiate(Material::default());
    db.create("Assets/a.mat", first.untyped()).unwrap();

    // The object is already persistent.
    let err = db.create("Assets/b.mat", first.untyped()).unwrap_err();
    assert!(matches!(err, AssetError::AlreadyExists(_)));

    // The path is taken.
    let second = db.instantiate(Material::default());
    let err = db.create("Assets/a.mat", second.untyped()).unwrap_err();
    assert!(matches!(err, AssetError::AlreadyExists(_)));

    let err = db.create("Engine/Resources/c.mat", second.untyped()).unwrap_err();
    assert!(matches!(err, AssetError::NotEditable(_)));

    // Text files are imported into the cache, not edited in place.
    let text = db.instantiate(TextAsset::default());
    let err = db.create("Assets/notes.txt", text.untyped()).unwrap_err();
    assert!(matches!(err, AssetError::NotDirectImporter(_)));
    assert!(!db.contains_path("Assets/notes.txt"));

    let err = db.create("Assets/level.scene", second.untyped()).unwrap_err();
    assert!(matches!(err, AssetError::TypeMismatch { .. }));
    assert!(!db.contains_path("Assets/level.scene"));
    assert!(db.store().guid(second.id()).is_none());
}

#[test]
fn test_loading_metadata_path_is_an_error() {
    let project = Project::new();
    project.write("Assets/readme.txt", "hello");
    let mut db = project.database();
    db.initialize().unwrap();

    assert!(matches!(
        db.load_untyped("Assets/readme.txt.meta"),
        Err(AssetError::ImporterFilePath(_))
    ));
    assert!(db.load_untyped("Assets/missing.txt").unwrap().is_none());
    assert!(db.load::<Material>("Assets/readme.txt").unwrap().is_none());
}

#[test]
fn test_missing_cache_is_rebuilt() {
    let project = Project::new();
    project.write("Assets/readme.txt", "hello");
    let mut db = project.database();
    db.initialize().unwrap();
    let guid = db.get_guid_by_path("Assets/readme.txt").unwrap();

    db.collect_garbage();
    std::fs::remove_dir_all(project.config.library_path()).unwrap();

    let text = db.load_by_guid::<TextAsset>(guid).unwrap();
    assert_eq!(text.read().unwrap().text, "hello");
    assert_eq!(db.get_guid_by_path("Assets/readme.txt"), Some(guid));
}

#[test]
fn test_stray_metadata_is_removed() {
    let project = Project::new();
    project.write("Assets/gone.txt.meta", "{}");
    let mut db = project.database();
    db.initialize().unwrap();

    assert!(db.get_asset_importer("Assets/gone.txt", ReimportMode::FastCheck).is_none());
    assert!(!project.path("Assets/gone.txt.meta").exists());
}

#[test]
fn test_unreadable_metadata_starts_over() {
    let project = Project::new();
    project.write("Assets/readme.txt", "hello");
    project.write("Assets/readme.txt.meta", "not json at all");
    let mut db = project.database();
    db.initialize().unwrap();

    let text = db.load::<TextAsset>("Assets/readme.txt").unwrap().unwrap();
    assert_eq!(text.read().unwrap().text, "hello");
    let meta = std::fs::read_to_string(project.path("Assets/readme.txt.meta")).unwrap();
    assert!(meta.contains("\"importer\""));
}

#[test]
fn test_reload_with_new_settings() {
    use asset_pipeline::assets::Texture;
    use asset_pipeline::import::importers::TextureImporter;

    let project = Project::new();
    project.write("Assets/grass.png", "png bytes");
    let mut db = project.database();
    db.initialize().unwrap();
    let guid = db.get_guid_by_path("Assets/grass.png").unwrap();

    let texture = db
        .reload_with::<Texture, _>("Assets/grass.png", |importer| {
            importer.settings_mut::<TextureImporter>().unwrap().srgb = false;
        })
        .unwrap()
        .unwrap();
    assert!(!texture.read().unwrap().srgb);
    assert_eq!(db.get_guid_by_path("Assets/grass.png"), Some(guid));

    // The new settings were saved with the metadata.
    drop(texture);
    let mut restarted = project.database();
    restarted.initialize().unwrap();
    let texture = restarted.load::<Texture>("Assets/grass.png").unwrap().unwrap();
    assert!(!texture.read().unwrap().srgb);
}

#[test]
fn test_unknown_guid_does_not_load() {
    let project = Project::new();
    let mut db = project.database();
    db.initialize().unwrap();
    assert!(db.load_by_guid::<TextAsset>(AssetGuid::new()).is_none());
}

#[test]
fn test_material_create_rename_delete() {
    use asset_pipeline::FileSystemEvent;

    let project = Project::new();
    let mut db = project.database();
    db.initialize().unwrap();

    let material = db.instantiate(Material {
        shader: None,
        ..Material::default()
    });
    db.create("Assets/Materials/M.mat", material.untyped()).unwrap();
    let guid = db.get_guid_by_path("Assets/Materials/M.mat").unwrap();
    assert_eq!(guid.to_string().len(), 32);

    let from = project.path("Assets/Materials/M.mat");
    let to = project.path("Assets/Materials/M2.mat");
    std::fs::rename(&from, &to).unwrap();
    db.enqueue_event(FileSystemEvent::Renamed {
        from,
        to: to.clone(),
    });
    db.process_file_system_events();

    assert_eq!(db.get_guid_by_path("Assets/Materials/M2.mat"), Some(guid));
    assert_eq!(db.get_path_by_guid(guid), Some("Assets/Materials/M2.mat"));
    assert_eq!(db.load_by_guid::<Material>(guid).unwrap(), material);

    std::fs::remove_file(&to).unwrap();
    db.enqueue_event(FileSystemEvent::Deleted(to));
    db.process_file_system_events();

    assert!(db
        .get_asset_importer("Assets/Materials/M2.mat", ReimportMode::FastCheck)
        .is_none());
    assert!(db.get_path_by_guid(guid).is_none());
    assert!(db.load_by_guid::<Material>(guid).is_none());
}
