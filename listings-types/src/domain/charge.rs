//! Provider charge request (STK push) wire body.

use serde::{Deserialize, Serialize};

/// Transaction type for paybill STK pushes.
pub const CUSTOMER_PAYBILL_ONLINE: &str = "CustomerPayBillOnline";

/// A signed STK push request. Field names follow the provider's wire format
/// exactly; `password` must equal `base64(shortcode ++ passkey ++ timestamp)`
/// for the same `timestamp` sent alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChargeRequest {
    pub business_short_code: String,
    pub password: String,
    pub timestamp: String,
    pub transaction_type: String,
    pub amount: u64,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    #[serde(rename = "PartyB")]
    pub party_b: String,
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
}
