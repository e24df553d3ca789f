use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{DomainError, DomainResult, Entity, ResellerId, UserId};

/// A reseller: operates a white-label storefront over the shared catalog.
///
/// The `slug` is the public storefront address and must stay unique across
/// the platform (uniqueness itself is enforced at the store layer; the
/// format is enforced here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reseller {
    id: ResellerId,
    user_id: UserId,
    business_name: String,
    slug: String,
    store_description: Option<String>,
    is_published: bool,
    is_onboarded: bool,
    created_at: DateTime<Utc>,
}

impl Reseller {
    pub fn new(
        user_id: UserId,
        business_name: impl Into<String>,
        slug: impl Into<String>,
    ) -> DomainResult<Self> {
        let business_name = business_name.into();
        let slug = slug.into();

        if business_name.trim().is_empty() {
            return Err(DomainError::validation("business name cannot be empty"));
        }
        validate_slug(&slug)?;

        Ok(Self {
            id: ResellerId::new(),
            user_id,
            business_name,
            slug,
            store_description: None,
            is_published: false,
            is_onboarded: false,
            created_at: Utc::now(),
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn business_name(&self) -> &str {
        &self.business_name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn store_description(&self) -> Option<&str> {
        self.store_description.as_deref()
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn is_onboarded(&self) -> bool {
        self.is_onboarded
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_store_description(&mut self, description: Option<String>) {
        self.store_description = description;
    }

    /// Mark onboarding complete. Idempotent.
    pub fn complete_onboarding(&mut self) {
        self.is_onboarded = true;
    }

    /// Make the storefront publicly reachable under its slug.
    ///
    /// Only onboarded resellers may publish.
    pub fn publish(&mut self) -> DomainResult<()> {
        if !self.is_onboarded {
            return Err(DomainError::validation(
                "storefront cannot be published before onboarding is complete",
            ));
        }
        self.is_published = true;
        Ok(())
    }

    /// Take the storefront offline. Existing orders are unaffected.
    pub fn unpublish(&mut self) {
        self.is_published = false;
    }
}

impl Entity for Reseller {
    type Id = ResellerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Slug rules: 3-60 chars, lowercase alphanumeric and hyphens, no leading,
/// trailing, or doubled hyphen.
fn validate_slug(slug: &str) -> DomainResult<()> {
    let ok_len = (3..=60).contains(&slug.len());
    let ok_chars = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let ok_shape = !slug.starts_with('-') && !slug.ends_with('-') && !slug.contains("--");

    if ok_len && ok_chars && ok_shape {
        Ok(())
    } else {
        Err(DomainError::validation(format!("invalid store slug: {slug:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_slugs() {
        for slug in ["", "ab", "Has-Upper", "trailing-", "-leading", "dou--ble", "with space"] {
            assert!(Reseller::new(UserId::new(), "Acme Stores", slug).is_err(), "{slug:?}");
        }
    }

    #[test]
    fn publish_requires_onboarding() {
        let mut r = Reseller::new(UserId::new(), "Acme Stores", "acme-stores").unwrap();
        assert!(r.publish().is_err());
        assert!(!r.is_published());

        r.complete_onboarding();
        r.publish().unwrap();
        assert!(r.is_published());

        r.unpublish();
        assert!(!r.is_published());
    }
}
