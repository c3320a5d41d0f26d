use dtcg_core::codec::{parse_color, BlendMode, DropShadow, Rgba};
use dtcg_core::host::{Effect, HostValue, InMemoryStore, VariableStore, VariableType};
use dtcg_core::merge::ConflictAction;

fn shadow(offset_y: f64, alpha: f64, visible: bool) -> DropShadow {
    DropShadow {
        color: Rgba { r: 0.0, g: 0.0, b: 0.0, a: alpha },
        offset_x: 0.0,
        offset_y,
        radius: 4.0,
        spread: 0.0,
        visible,
        blend_mode: BlendMode::Normal,
    }
}

#[test]
fn rem_dimensions_export_normalized_to_px() {
    let mut store = InMemoryStore::new();
    dtcg_core::import(
        &mut store,
        r#"{ "spacing": { "md": { "$value": "1rem", "$type": "dimension" } } }"#,
        |_, _| ConflictAction::IgnoreOnce,
    )
    .unwrap();

    let output = dtcg_core::export(&store).unwrap();
    assert_eq!(output.variable_count, 1);
    assert_eq!(output.document["spacing"]["md"]["$value"], "16px");
    assert_eq!(output.document["spacing"]["md"]["$type"], "dimension");
}

#[test]
fn pure_floats_export_as_bare_numbers() {
    let mut store = InMemoryStore::new();
    dtcg_core::import(
        &mut store,
        r#"{ "fontWeight": { "bold": { "$value": 700, "$type": "fontWeight" } } }"#,
        |_, _| ConflictAction::IgnoreOnce,
    )
    .unwrap();

    let output = dtcg_core::export(&store).unwrap();
    assert_eq!(output.document["fontWeight"]["bold"]["$value"], 700);
}

#[test]
fn colors_export_as_hex_with_color_type_tag() {
    let mut store = InMemoryStore::new();
    dtcg_core::import(
        &mut store,
        r##"{ "color": { "brand": { "$value": "#FF0000", "$type": "color" } } }"##,
        |_, _| ConflictAction::IgnoreOnce,
    )
    .unwrap();

    let output = dtcg_core::export(&store).unwrap();
    assert_eq!(output.document["color"]["brand"]["$value"], "#ff0000");
    assert_eq!(output.document["color"]["brand"]["$type"], "color");
}

#[test]
fn translucent_colors_keep_their_alpha_byte() {
    let mut store = InMemoryStore::new();
    let colors = store.create_collection("Colors").unwrap();
    let id = store
        .create_variable(colors.id, "color/overlay", VariableType::Color)
        .unwrap();
    store
        .set_variable_value(
            id,
            colors.default_mode,
            HostValue::Color(parse_color("#ff000080").unwrap()),
        )
        .unwrap();

    let output = dtcg_core::export(&store).unwrap();
    let exported = output.document["color"]["overlay"]["$value"]
        .as_str()
        .unwrap();
    assert_eq!(exported.len(), 9);
    assert!(exported.starts_with("#ff0000"));
}

#[test]
fn alias_valued_variables_are_skipped_not_dereferenced() {
    let mut store = InMemoryStore::new();
    let colors = store.create_collection("Colors").unwrap();
    let target = store
        .create_variable(colors.id, "color/base", VariableType::Color)
        .unwrap();
    store
        .set_variable_value(
            target,
            colors.default_mode,
            HostValue::Color(parse_color("#336699").unwrap()),
        )
        .unwrap();
    let alias = store
        .create_variable(colors.id, "color/accent", VariableType::Color)
        .unwrap();
    store
        .set_variable_value(alias, colors.default_mode, HostValue::Alias(target))
        .unwrap();

    let output = dtcg_core::export(&store).unwrap();
    assert_eq!(output.variable_count, 1);
    assert!(output.document["color"].get("accent").is_none());
}

#[test]
fn variables_without_a_value_are_omitted() {
    let mut store = InMemoryStore::new();
    let colors = store.create_collection("Colors").unwrap();
    store
        .create_variable(colors.id, "color/unset", VariableType::Color)
        .unwrap();

    let output = dtcg_core::export(&store).unwrap();
    assert_eq!(output.variable_count, 0);
}

#[test]
fn descriptions_are_exported_when_present() {
    let mut store = InMemoryStore::new();
    let colors = store.create_collection("Colors").unwrap();
    let id = store
        .create_variable(colors.id, "color/brand", VariableType::Color)
        .unwrap();
    store
        .set_variable_value(
            id,
            colors.default_mode,
            HostValue::Color(parse_color("#FF0000").unwrap()),
        )
        .unwrap();
    store.set_variable_description(id, "primary brand red").unwrap();

    let output = dtcg_core::export(&store).unwrap();
    assert_eq!(
        output.document["color"]["brand"]["$description"],
        "primary brand red"
    );
}

#[test]
fn multiple_visible_shadows_export_as_an_array() {
    let mut store = InMemoryStore::new();
    store
        .create_effect_style(
            "shadow/elevated",
            vec![
                Effect::DropShadow(shadow(2.0, 0.25, true)),
                Effect::DropShadow(shadow(8.0, 0.1, true)),
            ],
        )
        .unwrap();

    let output = dtcg_core::export(&store).unwrap();
    assert_eq!(output.effect_count, 1);
    let value = &output.document["shadow"]["elevated"]["$value"];
    assert!(value.is_array());
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[0]["offsetY"], "2px");
    assert_eq!(value[1]["offsetY"], "8px");
    assert_eq!(output.document["shadow"]["elevated"]["$type"], "shadow");
}

#[test]
fn invisible_and_non_drop_shadows_are_filtered() {
    let mut store = InMemoryStore::new();
    store
        .create_effect_style(
            "shadow/mixed",
            vec![
                Effect::LayerBlur { radius: 10.0 },
                Effect::DropShadow(shadow(2.0, 0.25, false)),
                Effect::DropShadow(shadow(4.0, 0.25, true)),
            ],
        )
        .unwrap();
    store
        .create_effect_style("shadow/blur-only", vec![Effect::LayerBlur { radius: 6.0 }])
        .unwrap();

    let output = dtcg_core::export(&store).unwrap();
    // The blur-only style is omitted entirely.
    assert_eq!(output.effect_count, 1);
    let value = &output.document["shadow"]["mixed"]["$value"];
    assert!(value.is_object());
    assert_eq!(value["offsetY"], "4px");
}

#[test]
fn single_shadow_exports_as_one_object() {
    let mut store = InMemoryStore::new();
    store
        .create_effect_style("shadow/card", vec![Effect::DropShadow(shadow(2.0, 0.25, true))])
        .unwrap();

    let output = dtcg_core::export(&store).unwrap();
    let value = &output.document["shadow"]["card"]["$value"];
    assert_eq!(value["offsetX"], "0px");
    assert_eq!(value["offsetY"], "2px");
    assert_eq!(value["blur"], "4px");
    assert_eq!(value["spread"], "0px");
    assert_eq!(value["color"], "#00000040");
}

#[test]
fn slash_names_renest_into_groups() {
    let mut store = InMemoryStore::new();
    dtcg_core::import(
        &mut store,
        r##"{ "color": { "brand": { "primary": { "$value": "#FF0000", "$type": "color" } } } }"##,
        |_, _| ConflictAction::IgnoreOnce,
    )
    .unwrap();

    let output = dtcg_core::export(&store).unwrap();
    assert!(output.document["color"]["brand"]["primary"].is_object());

    let json = output.to_json().unwrap();
    assert!(json.contains("\"primary\""));
    let yaml = output.to_yaml().unwrap();
    assert!(yaml.contains("primary"));
}
