//! Provider result notification (STK callback) decoding.
//!
//! The provider posts a nested envelope whose interesting values live in a
//! list of name/value metadata items. Decoding turns that into a
//! `CallbackResult` and fails loudly when nothing identifies the request.

use serde::Deserialize;
use serde_json::Value;

use super::payment::CorrelationRef;
use crate::error::DomainError;

/// Result code the provider uses for a completed payment.
pub const RESULT_SUCCESS: i64 = 0;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Body")]
    body: Body,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(rename = "stkCallback")]
    stk_callback: StkCallback,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    merchant_request_id: Option<String>,
    #[serde(rename = "CheckoutRequestID", default)]
    checkout_request_id: Option<String>,
    result_code: Value,
    #[serde(default)]
    result_desc: Option<String>,
    #[serde(default)]
    callback_metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    #[serde(rename = "Item", default)]
    items: Vec<MetadataItem>,
}

#[derive(Debug, Deserialize)]
struct MetadataItem {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Value", default)]
    value: Option<Value>,
}

/// A decoded callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackResult {
    /// Echoed `AccountReference`, when the provider includes it
    pub correlation_ref: Option<CorrelationRef>,
    pub checkout_request_id: Option<String>,
    pub merchant_request_id: Option<String>,
    pub result_code: i64,
    pub result_desc: Option<String>,
    pub receipt_number: Option<String>,
    /// Amount actually paid, in whole shillings
    pub amount: Option<u64>,
    pub payer_phone: Option<String>,
}

impl CallbackResult {
    /// Decodes a raw callback body.
    pub fn decode(payload: &[u8]) -> Result<Self, DomainError> {
        let envelope: Envelope = serde_json::from_slice(payload)
            .map_err(|e| DomainError::MalformedCallback(e.to_string()))?;
        let cb = envelope.body.stk_callback;

        let result_code = match &cb.result_code {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            DomainError::MalformedCallback(format!("unreadable ResultCode: {}", cb.result_code))
        })?;

        let items = cb
            .callback_metadata
            .map(|m| m.items)
            .unwrap_or_default();

        let correlation_ref = match find_item(&items, "AccountReference") {
            None => None,
            Some(value) => Some(
                value_as_text(value)
                    .filter(|s| !s.is_empty())
                    .map(CorrelationRef::from)
                    .ok_or_else(|| {
                        DomainError::MalformedCallback(format!(
                            "unreadable AccountReference: {}",
                            value
                        ))
                    })?,
            ),
        };

        let checkout_request_id = cb.checkout_request_id.filter(|s| !s.trim().is_empty());
        if correlation_ref.is_none() && checkout_request_id.is_none() {
            return Err(DomainError::MalformedCallback(
                "callback carries neither AccountReference nor CheckoutRequestID".into(),
            ));
        }

        Ok(Self {
            correlation_ref,
            checkout_request_id,
            merchant_request_id: cb.merchant_request_id,
            result_code,
            result_desc: cb.result_desc,
            receipt_number: find_item(&items, "MpesaReceiptNumber").and_then(value_as_text),
            amount: find_item(&items, "Amount").and_then(value_as_amount),
            payer_phone: find_item(&items, "PhoneNumber").and_then(value_as_text),
        })
    }

    pub fn is_success(&self) -> bool {
        self.result_code == RESULT_SUCCESS
    }
}

fn find_item<'a>(items: &'a [MetadataItem], name: &str) -> Option<&'a Value> {
    items
        .iter()
        .find(|item| item.name == name)
        .and_then(|item| item.value.as_ref())
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_amount(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(result_code: Value, items: Value) -> Vec<u8> {
        json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": result_code,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": { "Item": items }
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_decode_success_callback() {
        let payload = envelope(
            json!(0),
            json!([
                {"Name": "Amount", "Value": 50.00},
                {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"},
                {"Name": "AccountReference", "Value": "R-L1-7"},
                {"Name": "PhoneNumber", "Value": 254712345678u64}
            ]),
        );

        let result = CallbackResult::decode(&payload).unwrap();
        assert!(result.is_success());
        assert_eq!(result.correlation_ref, Some(CorrelationRef::from("R-L1-7")));
        assert_eq!(result.receipt_number.as_deref(), Some("NLJ7RT61SV"));
        assert_eq!(result.amount, Some(50));
        assert_eq!(result.payer_phone.as_deref(), Some("254712345678"));
    }

    #[test]
    fn test_decode_failure_without_metadata() {
        let payload = json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_1",
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user"
                }
            }
        })
        .to_string();

        let result = CallbackResult::decode(payload.as_bytes()).unwrap();
        assert!(!result.is_success());
        assert_eq!(result.result_code, 1032);
        assert!(result.correlation_ref.is_none());
        assert_eq!(result.checkout_request_id.as_deref(), Some("ws_CO_1"));
    }

    #[test]
    fn test_string_result_code_accepted() {
        let payload = envelope(json!("0"), json!([{"Name": "AccountReference", "Value": "R-L1-1"}]));
        assert!(CallbackResult::decode(&payload).unwrap().is_success());
    }

    #[test]
    fn test_unparseable_body_is_malformed() {
        assert!(matches!(
            CallbackResult::decode(b"not json"),
            Err(DomainError::MalformedCallback(_))
        ));
        assert!(matches!(
            CallbackResult::decode(br#"{"Body":{}}"#),
            Err(DomainError::MalformedCallback(_))
        ));
    }

    #[test]
    fn test_empty_account_reference_is_malformed() {
        let payload = envelope(json!(0), json!([{"Name": "AccountReference", "Value": ""}]));
        assert!(matches!(
            CallbackResult::decode(&payload),
            Err(DomainError::MalformedCallback(_))
        ));
    }

    #[test]
    fn test_no_correlation_at_all_is_malformed() {
        let payload = json!({
            "Body": { "stkCallback": { "ResultCode": 0, "CallbackMetadata": { "Item": [] } } }
        })
        .to_string();
        assert!(matches!(
            CallbackResult::decode(payload.as_bytes()),
            Err(DomainError::MalformedCallback(_))
        ));
    }
}
