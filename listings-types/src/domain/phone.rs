//! Mobile-money payer identity and charge amount.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const COUNTRY_CODE: &str = "254";
const SUBSCRIBER_DIGITS: usize = 9;

/// A Safaricom-style MSISDN: `254` followed by a 9-digit subscriber number
/// starting with 7 or 1 (e.g. `254712345678`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidPhone(raw.to_string());

        let subscriber = raw.strip_prefix(COUNTRY_CODE).ok_or_else(invalid)?;
        if subscriber.len() != SUBSCRIBER_DIGITS || !subscriber.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if !matches!(subscriber.as_bytes()[0], b'7' | b'1') {
            return Err(invalid());
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A charge amount in whole shillings, the unit the provider accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KesAmount(u64);

impl KesAmount {
    /// Converts cents to whole shillings. The amount must be positive and
    /// carry no fractional shillings.
    pub fn from_minor_units(minor: i64) -> Result<Self, DomainError> {
        if minor <= 0 || minor % 100 != 0 {
            return Err(DomainError::InvalidAmount(minor));
        }
        Ok(Self((minor / 100) as u64))
    }

    pub fn shillings(&self) -> u64 {
        self.0
    }

    pub fn minor_units(&self) -> i64 {
        (self.0 * 100) as i64
    }
}
