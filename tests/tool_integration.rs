use chatrelay::tools::{calculate, ToolError, ToolOutcome, ToolRegistry};
use serde_json::{json, Map, Value};

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::test]
async fn test_catalog_is_stable_and_complete() {
    let registry = ToolRegistry::builtin();
    let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();

    assert_eq!(
        names,
        vec![
            "get_current_time",
            "calculate",
            "get_system_info",
            "reverse_string",
            "count_words"
        ]
    );
}

#[tokio::test]
async fn test_count_words_reports_all_stats() {
    let result = ToolRegistry::builtin()
        .execute("count_words", &args(json!({"text": "a b"})))
        .await
        .unwrap();

    assert_eq!(
        result,
        json!({"characters": 3, "words": 2, "lines": 1, "characters_no_spaces": 2})
    );
}

#[tokio::test]
async fn test_calculator_through_registry() {
    let registry = ToolRegistry::builtin();

    let ok = registry
        .execute("calculate", &args(json!({"expression": "(2 + 3) * 4"})))
        .await;
    assert_eq!(ok, Ok(json!("(2 + 3) * 4 = 20")));

    let rejected = registry
        .execute("calculate", &args(json!({"expression": "__import__('os')"})))
        .await;
    assert!(matches!(rejected, Err(ToolError::InvalidInput(_))));
}

#[tokio::test]
async fn test_failures_become_error_payloads() {
    let outcome: ToolOutcome = ToolRegistry::builtin()
        .execute("calculate", &args(json!({"expression": "1 / 0"})))
        .await
        .into();

    assert!(!outcome.is_success());
    let payload = serde_json::to_value(&outcome).unwrap();
    assert!(payload["error"]
        .as_str()
        .unwrap()
        .starts_with("Evaluation failed"));
}

#[test]
fn test_calculate_examples() {
    assert_eq!(calculate("2 + 2").unwrap(), "2 + 2 = 4");
    assert_eq!(calculate("10*5").unwrap(), "10*5 = 50");
    assert!(matches!(
        calculate("2; import os"),
        Err(ToolError::InvalidInput(_))
    ));
}
