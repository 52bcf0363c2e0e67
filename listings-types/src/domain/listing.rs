//! Listing domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::DomainError;

/// Unique identifier for a Listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ListingId(Uuid);

impl ListingId {
    /// Creates a new random ListingId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a ListingId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ListingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A business listed in the directory.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    /// Unique identifier
    pub id: ListingId,
    /// Trading name shown to consumers
    #[schema(example = "Mama Njeri Plumbing")]
    pub business_name: String,
    #[schema(example = "Plumber")]
    pub category: String,
    #[schema(example = "Nairobi")]
    pub city: String,
    pub description: String,
    /// WhatsApp number used for the contact deep link
    #[schema(example = "254712345678")]
    pub whatsapp: String,
    pub image_url: Option<String>,
    /// Set by an administrator after checking the business
    pub verified: bool,
    /// Promoted placement, unlocked only by a successful payment
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Creates a new unverified, unfeatured listing.
    ///
    /// # Validation
    /// - Business name, category and city cannot be empty
    pub fn new(
        business_name: String,
        category: String,
        city: String,
        description: String,
        whatsapp: String,
        image_url: Option<String>,
    ) -> Result<Self, DomainError> {
        for (field, value) in [
            ("Business name", &business_name),
            ("Category", &category),
            ("City", &city),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::ValidationError(format!(
                    "{} cannot be empty",
                    field
                )));
            }
        }

        Ok(Self {
            id: ListingId::new(),
            business_name,
            category,
            city,
            description,
            whatsapp,
            image_url,
            verified: false,
            featured: false,
            created_at: Utc::now(),
        })
    }

    /// The `wa.me` deep link consumers use to contact the business.
    pub fn contact_link(&self) -> Option<String> {
        let digits: String = self.whatsapp.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            None
        } else {
            Some(format!("https://wa.me/{}", digits))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(name: &str, city: &str) -> Result<Listing, DomainError> {
        Listing::new(
            name.to_string(),
            "Plumber".to_string(),
            city.to_string(),
            "Leaks fixed fast".to_string(),
            "+254 712 345 678".to_string(),
            None,
        )
    }

    #[test]
    fn test_listing_creation() {
        let listing = listing("Njeri Plumbing", "Nairobi").unwrap();
        assert!(!listing.verified);
        assert!(!listing.featured);
        assert_eq!(listing.city, "Nairobi");
    }

    #[test]
    fn test_empty_business_name_fails() {
        let result = listing("  ", "Nairobi");
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_empty_city_fails() {
        let result = listing("Njeri Plumbing", "");
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_contact_link_strips_formatting() {
        let listing = listing("Njeri Plumbing", "Nairobi").unwrap();
        assert_eq!(
            listing.contact_link().as_deref(),
            Some("https://wa.me/254712345678")
        );
    }
}
