use async_trait::async_trait;
use serde_json::json;

use crate::{required_str, Tool, ToolError};

/// Weather lookup tool. Answers with a fixed forecast.
pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather for a location"
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City or place to get the weather for"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let location = required_str(&args, "location")?.trim();
        if location.is_empty() {
            return Err(ToolError::InvalidArguments("'location' must not be empty".into()));
        }
        Ok(format!("Sunny, 72°F in {}", location))
    }
}
