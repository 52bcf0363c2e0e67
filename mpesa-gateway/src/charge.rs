//! STK push request assembly.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};

use listings_types::domain::charge::CUSTOMER_PAYBILL_ONLINE;
use listings_types::{ChargeRequest, CorrelationRef, KesAmount, ListingId, PhoneNumber};

const TRANSACTION_DESC: &str = "Feature Listing Payment";

/// Timestamp in the provider's `YYYYMMDDHHMMSS` layout.
pub fn provider_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// The provider's request password: standard base64 (with padding) of
/// `shortcode ++ passkey ++ timestamp`. The provider verifies this
/// byte-for-byte and silently drops requests that do not match.
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{}{}{}", shortcode, passkey, timestamp))
}

/// Builds signed charges and hands out correlation references.
///
/// The sequence starts at the wall-clock millisecond the builder was created,
/// so references keep increasing across restarts as well as within a process.
pub struct ChargeRequestBuilder {
    shortcode: String,
    passkey: String,
    callback_url: String,
    sequence: AtomicU64,
}

impl ChargeRequestBuilder {
    pub fn new(
        shortcode: impl Into<String>,
        passkey: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        let seed = Utc::now().timestamp_millis().max(0) as u64;
        Self {
            shortcode: shortcode.into(),
            passkey: passkey.into(),
            callback_url: callback_url.into(),
            sequence: AtomicU64::new(seed),
        }
    }

    pub fn next_ref(&self, listing_id: ListingId) -> CorrelationRef {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed);
        CorrelationRef::for_listing(listing_id, n)
    }

    pub fn build(
        &self,
        phone: &PhoneNumber,
        amount: KesAmount,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> (ChargeRequest, CorrelationRef) {
        let correlation_ref = self.next_ref(listing_id);
        let timestamp = provider_timestamp(now);
        let password = stk_password(&self.shortcode, &self.passkey, &timestamp);

        let request = ChargeRequest {
            business_short_code: self.shortcode.clone(),
            password,
            timestamp,
            transaction_type: CUSTOMER_PAYBILL_ONLINE.to_string(),
            amount: amount.shillings(),
            party_a: phone.as_str().to_string(),
            party_b: self.shortcode.clone(),
            phone_number: phone.as_str().to_string(),
            callback_url: self.callback_url.clone(),
            account_reference: correlation_ref.to_string(),
            transaction_desc: TRANSACTION_DESC.to_string(),
        };

        (request, correlation_ref)
    }
}
