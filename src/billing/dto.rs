use serde::{Deserialize, Serialize};

/// Request body for `POST /checkout`. Every field is required; they are
/// optional here so a missing field maps to a 400 instead of a decode error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub plan_type: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}
