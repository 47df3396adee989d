//! Request/response DTOs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub balance: f64,
    pub status: String,
}

/// `POST /accounts/:account_id/transfer?amount=...`
#[derive(Debug, Clone, Deserialize)]
pub struct TransferQuery {
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub status: String,
    pub transferred: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    pub principal_id: String,
    pub display_name: String,
    pub tenant_id: String,
    pub roles: Vec<String>,
}
