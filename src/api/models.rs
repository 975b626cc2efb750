use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Uniform wrapper every backend response uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T = Value> {
    pub is_success: bool,
    #[serde(default)]
    pub response_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Fields the backend adds beyond the documented envelope
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T> Envelope<T> {
    pub fn failure_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Request failed with code {}", self.response_code))
    }
}

impl Envelope<Value> {
    /// `data` as a list of records; a single object becomes a one-element list
    pub fn records(&self) -> Vec<Value> {
        match &self.data {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Object(obj)) => match obj.get("items").or_else(|| obj.get("rows")) {
                Some(Value::Array(items)) => items.clone(),
                _ => vec![Value::Object(obj.clone())],
            },
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
