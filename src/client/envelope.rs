use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard wrapper the API puts around successful payloads:
/// `{ "data": ..., "message": ..., "success": ..., "meta": ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_success")]
    pub success: bool,
    /// Pagination and similar, left untyped
    #[serde(default)]
    pub meta: Option<Value>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> T {
        self.data
    }
}
