use super::error::ToolError;
use super::traits::{single_string_schema, string_arg, Tool};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

pub struct ReverseStringTool;

#[async_trait]
impl Tool for ReverseStringTool {
    fn name(&self) -> &'static str {
        "reverse_string"
    }

    fn description(&self) -> &'static str {
        "Reverse any text string"
    }

    fn parameters(&self) -> Value {
        single_string_schema("text", "The text to reverse")
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        let text = string_arg(arguments, "text");
        Ok(Value::String(text.chars().rev().collect()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub characters: usize,
    pub words: usize,
    pub lines: usize,
    pub characters_no_spaces: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
            // An empty string is still one line
            lines: text.split('\n').count(),
            characters_no_spaces: text.chars().filter(|c| *c != ' ').count(),
        }
    }
}

pub struct CountWordsTool;

#[async_trait]
impl Tool for CountWordsTool {
    fn name(&self) -> &'static str {
        "count_words"
    }

    fn description(&self) -> &'static str {
        "Count words, characters, and lines in text"
    }

    fn parameters(&self) -> Value {
        single_string_schema("text", "The text to analyze")
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        let stats = TextStats::of(string_arg(arguments, "text"));
        Ok(serde_json::json!(stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_args(text: &str) -> Map<String, Value> {
        let mut args = Map::new();
        args.insert("text".to_string(), Value::from(text));
        args
    }

    #[tokio::test]
    async fn test_reverse_unicode() {
        let result = ReverseStringTool.call(&text_args("héllo")).await.unwrap();
        assert_eq!(result, Value::from("olléh"));
    }

    #[tokio::test]
    async fn test_reverse_missing_argument_is_empty() {
        let result = ReverseStringTool.call(&Map::new()).await.unwrap();
        assert_eq!(result, Value::from(""));
    }

    #[test]
    fn test_text_stats() {
        assert_eq!(
            TextStats::of("a b"),
            TextStats {
                characters: 3,
                words: 2,
                lines: 1,
                characters_no_spaces: 2
            }
        );
        assert_eq!(TextStats::of("one\ntwo  three\n").lines, 3);
        assert_eq!(TextStats::of("one\ntwo  three\n").words, 3);
    }

    #[tokio::test]
    async fn test_count_words_missing_argument() {
        let result = CountWordsTool.call(&Map::new()).await.unwrap();
        assert_eq!(
            result,
            serde_json::json!({"characters": 0, "words": 0, "lines": 1, "characters_no_spaces": 0})
        );
    }
}
