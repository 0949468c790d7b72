// src/common/response.rs

use serde::Serialize;

// Envelope padrão de sucesso: { success, message, data }
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: String, data: T) -> Self {
        Self {
            success: true,
            message,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    // Para DELETE e logout, que não devolvem dados
    pub fn message_only(message: String) -> Self {
        Self {
            success: true,
            message,
            data: None,
        }
    }
}
