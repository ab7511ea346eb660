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

use asset_pipeline::assets::{Mesh, Model, Shader};
use asset_pipeline::FileSystemEvent;
use common::{paths_of, record, Project};

const LIT: &str = "#include \"Common.hlsl\"\n#pragma vertex vert\n#pragma fragment frag\n";

#[test]
fn test_include_edit_reimports_dependers() {
    let project = Project::new();
    project.write("Assets/Shaders/Common.hlsl", "float4 tint;");
    project.write("Assets/Shaders/Lit.shader", LIT);
    let mut db = project.database();
    db.initialize().unwrap();
    let lit = db.get_guid_by_path("Assets/Shaders/Lit.shader").unwrap();
    let log = record(&mut db);

    let path = project.edit("Assets/Shaders/Common.hlsl", "float4 tint;\nfloat glow;");
    db.enqueue_event(FileSystemEvent::Changed(path));
    db.process_file_system_events();

    // The dependency first, then whatever includes it.
    assert_eq!(
        paths_of(&log, "reimported"),
        vec!["Assets/Shaders/Common.hlsl", "Assets/Shaders/Lit.shader"]
    );
    assert_eq!(paths_of(&log, "changed"), vec!["Assets/Shaders/Common.hlsl"]);

    let shader = db.load::<Shader>("Assets/Shaders/Lit.shader").unwrap().unwrap();
    assert!(shader.read().unwrap().source.contains("float glow;"));
    assert_eq!(db.get_guid_by_path("Assets/Shaders/Lit.shader"), Some(lit));
}

#[test]
fn test_unrelated_edit_does_not_cascade() {
    let project = Project::new();
    project.write("Assets/Shaders/Common.hlsl", "float4 tint;");
    project.write("Assets/Shaders/Lit.shader", LIT);
    project.write("Assets/readme.txt", "hello");
    let mut db = project.database();
    db.initialize().unwrap();
    let log = record(&mut db);

    let path = project.edit("Assets/readme.txt", "hello again");
    db.enqueue_event(FileSystemEvent::Changed(path));
    db.process_file_system_events();

    assert_eq!(paths_of(&log, "reimported"), vec!["Assets/readme.txt"]);
}

#[test]
fn test_untouched_file_change_event_is_quiet() {
    let project = Project::new();
    project.write("Assets/readme.txt", "hello");
    let mut db = project.database();
    db.initialize().unwrap();
    let log = record(&mut db);

    db.enqueue_event(FileSystemEvent::Changed(project.path("Assets/readme.txt")));
    db.process_file_system_events();

    assert!(log.lock().is_empty());
}

#[test]
fn test_engine_include_fallback() {
    let project = Project::new();
    project.write("Engine/Shaders/Common.hlsl", "float4 engine_tint;");
    project.write("Assets/Lit.shader", LIT);
    let mut db = project.database();
    db.initialize().unwrap();

    let shader = db.load::<Shader>("Assets/Lit.shader").unwrap().unwrap();
    assert!(shader.read().unwrap().source.contains("engine_tint"));
    assert_eq!(db.dependers_of("Engine/Shaders/Common.hlsl"), vec!["Assets/Lit.shader"]);
}

#[test]
fn test_deleting_include_keeps_depender_loadable() {
    let project = Project::new();
    project.write("Assets/Shaders/Common.hlsl", "float4 tint;");
    project.write("Assets/Shaders/Lit.shader", LIT);
    let mut db = project.database();
    db.initialize().unwrap();

    std::fs::remove_file(project.path("Assets/Shaders/Common.hlsl")).unwrap();
    db.enqueue_event(FileSystemEvent::Deleted(project.path("Assets/Shaders/Common.hlsl")));
    db.process_file_system_events();

    assert!(!db.contains_path("Assets/Shaders/Common.hlsl"));
    assert!(db.dependers_of("Assets/Shaders/Common.hlsl").is_empty());
    assert!(db.load::<Shader>("Assets/Shaders/Lit.shader").unwrap().is_some());
}

const SHIP_V1: &str = r#"{
  "meshes": [
    { "name": "Hull", "primitives": [{ "material": 0 }, {}] },
    { "name": "Sail", "primitives": [{}] }
  ]
}"#;

const SHIP_V2: &str = r#"{
  "meshes": [
    { "name": "Hull", "primitives": [{ "material": 1 }, {}, {}] },
    { "name": "Mast", "primitives": [{}] }
  ]
}"#;

#[test]
fn test_sub_asset_guids_survive_reimport() {
    let project = Project::new();
    project.write("Assets/ship.gltf", SHIP_V1);
    let mut db = project.database();
    db.initialize().unwrap();

    let model = db.load::<Model>("Assets/ship.gltf").unwrap().unwrap();
    let meshes = model.read().unwrap().meshes.clone();
    assert_eq!(meshes.len(), 2);
    let (hull, sail) = (meshes[0], meshes[1]);
    drop(model);

    let hull_mesh = db.load_by_guid::<Mesh>(hull).unwrap();
    assert_eq!(hull_mesh.read().unwrap().primitive_count, 2);
    assert_eq!(db.get_path_by_guid(sail), Some("Assets/ship.gltf"));
    drop(hull_mesh);

    let path = project.edit("Assets/ship.gltf", SHIP_V2);
    db.enqueue_event(FileSystemEvent::Changed(path));
    db.process_file_system_events();

    let model = db.load::<Model>("Assets/ship.gltf").unwrap().unwrap();
    let meshes = model.read().unwrap().meshes.clone();
    assert_eq!(meshes.len(), 2);
    assert_eq!(meshes[0], hull);
    assert!(!meshes.contains(&sail));

    let hull_mesh = db.load_by_guid::<Mesh>(hull).unwrap();
    assert_eq!(hull_mesh.read().unwrap().primitive_count, 3);
    assert_eq!(hull_mesh.read().unwrap().material, Some(1));
    assert!(db.load_by_guid::<Mesh>(sail).is_none());
    assert!(db.get_path_by_guid(sail).is_none());
}

#[test]
fn test_failed_reimport_keeps_previous_outputs() {
    let project = Project::new();
    project.write("Assets/ship.gltf", SHIP_V1);
    let mut db = project.database();
    db.initialize().unwrap();
    let guid = db.get_guid_by_path("Assets/ship.gltf").unwrap();

    let path = project.edit("Assets/ship.gltf", "{ not json");
    db.enqueue_event(FileSystemEvent::Changed(path));
    db.process_file_system_events();

    assert_eq!(db.get_path_by_guid(guid), Some("Assets/ship.gltf"));
    let model = db.load_by_guid::<Model>(guid).unwrap();
    assert_eq!(model.read().unwrap().meshes.len(), 2);
}
