//! Employer company profiles.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A company owned by exactly one employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn from_new(id: u64, new: NewCompany) -> Self {
        Self {
            id,
            user_id: new.user_id,
            name: new.name,
            website: new.website,
            industry: new.industry,
            size: new.size,
            description: new.description,
            created_at: Utc::now(),
        }
    }
}

/// Insert payload for a company. `user_id` is always taken from the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    #[serde(default)]
    pub user_id: u64,

    #[validate(length(min = 1, message = "Company name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(url(message = "Invalid website URL"))]
    pub website: Option<String>,

    #[serde(default)]
    pub industry: Option<String>,

    #[serde(default)]
    pub size: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_name_required() {
        let company = NewCompany {
            user_id: 1,
            name: String::new(),
            website: None,
            industry: None,
            size: None,
            description: None,
        };
        assert!(company.validate().is_err());
    }

    #[test]
    fn test_company_website_must_be_url() {
        let company = NewCompany {
            user_id: 1,
            name: "Acme".to_string(),
            website: Some("acme".to_string()),
            industry: None,
            size: None,
            description: None,
        };
        assert!(company.validate().is_err());
    }
}
