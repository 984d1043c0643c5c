//! Pins the outward tool-catalog contract.
//!
//! The remote model keys on these names and schema fields; renaming a tool or
//! a parameter silently would break every running agent prompt.

use screen_pilot_core::agent::ToolCatalog;

#[test]
fn standard_catalog_exposes_the_expected_tools() {
    let catalog = ToolCatalog::standard().unwrap();
    let names: Vec<String> = catalog
        .definitions()
        .iter()
        .map(|t| t.name.clone())
        .collect();
    assert_eq!(
        names,
        vec![
            "take_screenshot",
            "press_key",
            "hold_key",
            "move_mouse",
            "click_mouse",
            "wait",
            "end_session",
            "note_situation",
        ]
    );
}

#[test]
fn schema_shape_matches_the_messages_api_contract() {
    let catalog = ToolCatalog::standard().unwrap();
    for tool in catalog.schema() {
        assert!(tool["name"].is_string());
        assert!(tool["description"].is_string());
        let schema = &tool["input_schema"];
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"].is_object());
        assert!(schema["required"].is_array());
    }
}

#[test]
fn hold_key_declares_key_and_duration() {
    let catalog = ToolCatalog::standard().unwrap();
    let schema = catalog.schema();
    let hold = schema
        .iter()
        .find(|t| t["name"] == "hold_key")
        .expect("hold_key registered");
    let required: Vec<&str> = hold["input_schema"]["required"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(required, vec!["key", "duration"]);
    assert_eq!(
        hold["input_schema"]["properties"]["duration"]["type"],
        "number"
    );
}
