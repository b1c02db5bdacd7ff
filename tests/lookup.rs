//! Integration tests for id and name lookups.

use spec_definitions::{
    Entity, LookupError, ParseSource, SpecDefinitions, TypeDefinition,
};

const ON_OFF: &str = r#"{
    "clusters": [{
        "code": 6,
        "name": "On Off",
        "commands": [
            {"code": 0, "name": "Off"},
            {"code": 1, "name": "On"},
            {"code": 64, "name": "OffWithEffect", "input_param": "OffWithEffectRequest"}
        ],
        "attributes": [
            {"definition": {"code": 0, "name": "OnOff", "type": "boolean"},
             "qualities": "READABLE"},
            {"definition": {"code": 16387, "name": "StartUpOnOff",
                            "type": "StartUpOnOffEnum", "qualities": "NULLABLE"},
             "qualities": "READABLE | WRITABLE"}
        ],
        "events": [{"code": 0, "name": "StateChange", "priority": "info"}],
        "bitmaps": [{"name": "Feature", "base_type": "bitmap32",
                     "entries": [{"name": "Lighting", "code": 1}]}],
        "enums": [
            {"name": "StartUpOnOffEnum", "base_type": "enum8",
             "entries": [{"name": "Off", "code": 0}]},
            {"name": "Feature", "base_type": "enum8"}
        ],
        "structs": [
            {"name": "Feature"},
            {"name": "OffWithEffectRequest", "fields": [
                {"code": 0, "name": "EffectIdentifier", "type": "enum8"}
            ]}
        ]
    }, {
        "code": 4,
        "name": "Groups",
        "commands": [
            {"code": 0, "name": "AddGroup", "output_param": "AddGroupResponse",
             "qualities": "FABRIC_SCOPED"}
        ],
        "structs": [
            {"name": "AddGroupResponse", "code": 0, "tag": "response"},
            {"name": "GroupKeyMapStruct", "qualities": "FABRIC_SCOPED"}
        ]
    }]
}"#;

fn definitions() -> SpecDefinitions {
    SpecDefinitions::new([ParseSource::from_document("on-off.json", ON_OFF)])
        .unwrap()
}

fn ambiguous(requested: &str, suggestion: &str) -> LookupError {
    LookupError::AmbiguousCasing {
        requested: requested.to_string(),
        suggestion: suggestion.to_string(),
    }
}

#[test]
fn test_every_cluster_code_resolves_to_its_name() {
    let definitions = definitions();
    assert_eq!(definitions.len(), 2);
    for cluster in definitions.clusters() {
        assert_eq!(
            definitions.get_cluster_name(cluster.code),
            Some(cluster.name.as_str())
        );
    }
    assert_eq!(definitions.get_cluster_name(9999), None);
}

#[test]
fn test_name_then_id_round_trip() {
    let definitions = definitions();

    let command = definitions.get_command_by_name("OnOff", "OffWithEffect");
    let command = command.unwrap().unwrap();
    assert_eq!(
        definitions.get_command_name(6, command.code),
        Some("OffWithEffect")
    );

    let attribute = definitions
        .get_attribute_by_name("OnOff", "StartUpOnOff")
        .unwrap()
        .unwrap();
    assert_eq!(
        definitions.get_attribute_name(6, attribute.code()),
        Some("StartUpOnOff")
    );

    let event =
        definitions.get_event_by_name("OnOff", "StateChange").unwrap().unwrap();
    assert_eq!(definitions.get_event_name(6, event.code), Some("StateChange"));

    let response = definitions
        .get_response_by_name("Groups", "AddGroupResponse")
        .unwrap()
        .unwrap();
    assert_eq!(
        definitions.get_response_name(4, response.code.unwrap()),
        Some("AddGroupResponse")
    );
}

#[test]
fn test_wrong_case_is_reported_for_every_kind() {
    let definitions = definitions();

    assert_eq!(
        definitions.get_command_by_name("OnOff", "off").unwrap_err(),
        ambiguous("off", "Off")
    );
    assert_eq!(
        definitions.get_attribute_by_name("OnOff", "onoff").unwrap_err(),
        ambiguous("onoff", "OnOff")
    );
    assert_eq!(
        definitions.get_event_by_name("OnOff", "STATECHANGE").unwrap_err(),
        ambiguous("STATECHANGE", "StateChange")
    );
    assert_eq!(
        definitions.get_response_by_name("Groups", "addGroupResponse").unwrap_err(),
        ambiguous("addGroupResponse", "AddGroupResponse")
    );
    assert_eq!(
        definitions.get_bitmap_by_name("OnOff", "feature").unwrap_err(),
        ambiguous("feature", "Feature")
    );
    assert_eq!(
        definitions.get_enum_by_name("OnOff", "startUpOnOffEnum").unwrap_err(),
        ambiguous("startUpOnOffEnum", "StartUpOnOffEnum")
    );
    assert_eq!(
        definitions.get_struct_by_name("Groups", "groupKeyMapStruct").unwrap_err(),
        ambiguous("groupKeyMapStruct", "GroupKeyMapStruct")
    );
}

#[test]
fn test_unknown_names_are_not_found() {
    let definitions = definitions();
    assert_eq!(definitions.get_command_by_name("OnOff", "Blink"), Ok(None));
    assert_eq!(definitions.get_attribute_by_name("OnOff", "Level"), Ok(None));
    assert_eq!(definitions.get_event_by_name("Groups", "StateChange"), Ok(None));
    assert_eq!(definitions.get_enum_by_name("Groups", "Feature"), Ok(None));
    assert_eq!(definitions.get_type_by_name("OnOff", "Missing"), Ok(None));
}

#[test]
fn test_unknown_cluster_is_not_found_without_hint() {
    let definitions = definitions();
    assert_eq!(definitions.get_command_by_name("LevelControl", "off"), Ok(None));
    assert_eq!(definitions.get_command_by_name("onoff", "off"), Ok(None));
    assert_eq!(definitions.get_type_by_name("Scenes", "feature"), Ok(None));
}

#[test]
fn test_cluster_name_whitespace_is_ignored() {
    let definitions = definitions();
    assert_eq!(definitions.cluster_code("On Off"), Some(6));
    assert!(
        definitions
            .get_command_by_name(" On  Off", "On")
            .unwrap()
            .is_some()
    );
}

#[test]
fn test_type_lookup_prefers_bitmap_then_enum_then_struct() {
    let definitions = definitions();

    let feature = definitions.get_type_by_name("OnOff", "Feature").unwrap();
    assert!(matches!(feature, Some(TypeDefinition::Bitmap(b)) if b.base_type == "bitmap32"));

    let start_up =
        definitions.get_type_by_name("OnOff", "StartUpOnOffEnum").unwrap();
    assert!(matches!(start_up, Some(TypeDefinition::Enum(_))));

    let request =
        definitions.get_type_by_name("OnOff", "OffWithEffectRequest").unwrap();
    assert_eq!(request.map(|t| t.name()), Some("OffWithEffectRequest"));
    assert!(matches!(request, Some(TypeDefinition::Struct(_))));
}

#[test]
fn test_type_lookup_prefers_enum_over_struct() {
    let json = r#"{"clusters": [{
        "code": 80,
        "name": "Mode Select",
        "enums": [{"name": "Mode", "base_type": "enum8"}],
        "structs": [{"name": "Mode"}]
    }]}"#;
    let definitions =
        SpecDefinitions::new([ParseSource::from_document("mode.json", json)])
            .unwrap();

    let mode = definitions.get_type_by_name("ModeSelect", "Mode").unwrap();
    assert!(matches!(mode, Some(TypeDefinition::Enum(e)) if e.base_type == "enum8"));
}

#[test]
fn test_type_lookup_surfaces_casing_errors() {
    let definitions = definitions();
    assert_eq!(
        definitions.get_type_by_name("OnOff", "offWithEffectRequest"),
        Err(ambiguous("offWithEffectRequest", "OffWithEffectRequest"))
    );
}

#[test]
fn test_fabric_scoped_predicate() {
    let definitions = definitions();

    let add_group =
        definitions.get_command_by_name("Groups", "AddGroup").unwrap().unwrap();
    assert!(definitions.is_fabric_scoped(add_group));

    let key_map = definitions
        .get_struct_by_name("Groups", "GroupKeyMapStruct")
        .unwrap()
        .unwrap();
    assert!(definitions.is_fabric_scoped(key_map));

    let response = definitions.get_response(4, 0).unwrap();
    assert!(!definitions.is_fabric_scoped(Entity::Response(response)));

    let off = definitions.get_command(6, 0).unwrap();
    assert!(!definitions.is_fabric_scoped(off));
}

#[test]
fn test_nullable_predicate() {
    let definitions = definitions();

    let start_up = definitions.get_attribute(6, 16387).unwrap();
    assert!(definitions.is_nullable(start_up));
    assert!(definitions.is_nullable(&start_up.definition));

    let on_off = definitions.get_attribute(6, 0).unwrap();
    assert!(!definitions.is_nullable(on_off));
}

#[test]
fn test_predicates_are_false_without_qualities() {
    let definitions = definitions();

    let cluster = definitions.cluster(6).unwrap();
    let event = definitions.get_event(6, 0).unwrap();
    let bitmap = definitions.get_bitmap_by_name("OnOff", "Feature").unwrap().unwrap();
    let e = definitions.get_enum_by_name("OnOff", "Feature").unwrap().unwrap();

    for entity in [
        Entity::from(cluster),
        Entity::from(event),
        Entity::from(bitmap),
        Entity::from(e),
    ] {
        assert!(!definitions.is_fabric_scoped(entity));
        assert!(!definitions.is_nullable(entity));
    }
}

#[test]
fn test_parse_failure_aborts_construction() {
    let result = SpecDefinitions::new([
        ParseSource::from_document("on-off.json", ON_OFF),
        ParseSource::from_document("broken.json", "{ this is not valid json }"),
    ]);
    assert!(matches!(result, Err(spec_definitions::Error::Parse(_))));
}

#[test]
fn test_concurrent_reads() {
    let definitions = definitions();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert_eq!(definitions.get_command_name(6, 1), Some("On"));
                assert_eq!(
                    definitions.get_command_by_name("OnOff", "on"),
                    Err(ambiguous("on", "On"))
                );
            });
        }
    });
}
