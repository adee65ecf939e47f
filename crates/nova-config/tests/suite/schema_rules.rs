use nova_config::{json_schema, json_schema_value};

#[test]
fn failure_policy_schema_lists_both_policies() {
    let value = serde_json::to_value(json_schema()).expect("schema serializes");

    let policy = value
        .pointer("/definitions/BoundFailurePolicy")
        .expect("BoundFailurePolicy definition exists");
    let variants: Vec<&str> = policy
        .get("oneOf")
        .and_then(|v| v.as_array())
        .expect("policy variants are documented individually")
        .iter()
        .filter_map(|variant| variant.pointer("/enum/0").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(variants, vec!["retry", "memoize"]);
}

#[test]
fn sections_reject_unknown_fields() {
    let value = json_schema_value();
    for section in ["CacheConfig", "BoundsConfig", "LoggingConfig"] {
        let pointer = format!("/definitions/{section}/additionalProperties");
        assert_eq!(
            value.pointer(&pointer).and_then(|v| v.as_bool()),
            Some(false),
            "{section} should deny unknown fields"
        );
    }
}
