use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "run": {
                "type": "object",
                "properties": {
                    "concurrency": { "type": "integer", "minimum": 1 },
                    "timeout_secs": { "type": "integer", "minimum": 1 }
                }
            },
            "retry": {
                "type": "object",
                "properties": {
                    "max_attempts": { "type": "integer", "minimum": 1 },
                    "base_delay_ms": { "type": "integer", "minimum": 0 },
                    "max_delay_ms": { "type": "integer", "minimum": 0 },
                    "jitter_ms": { "type": "integer", "minimum": 0 }
                }
            },
            "aws": {
                "type": "object",
                "properties": {
                    "regions": { "$ref": "#/$defs/names" },
                    "resources": { "$ref": "#/$defs/names" }
                }
            },
            "azure": {
                "type": "object",
                "properties": {
                    "subscriptions": { "$ref": "#/$defs/names" },
                    "resources": { "$ref": "#/$defs/names" }
                }
            },
            "gcp": {
                "type": "object",
                "properties": {
                    "projects": { "$ref": "#/$defs/names" },
                    "resources": { "$ref": "#/$defs/names" }
                }
            },
            "output": {
                "type": "object",
                "properties": {
                    "format": { "type": "string", "enum": ["table", "json", "csv"] },
                    "path": { "type": "string" }
                }
            }
        },
        "$defs": {
            "names": {
                "type": "array",
                "items": { "type": "string", "minLength": 1 }
            }
        }
    })
});
