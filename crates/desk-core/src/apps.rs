//! App records managed through the admin API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A single app entry. `id` is empty when the record has not been created yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AppRecord {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub app_type: String,
    #[serde(default)]
    pub description: String,
}

impl AppRecord {
    /// Whether saving this record creates a new entry rather than editing one.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.id.trim().is_empty()
    }

    /// Title and type are required by the admin API.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` naming the first blank field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("app title must not be empty".into()));
        }
        if self.app_type.trim().is_empty() {
            return Err(CoreError::Validation("app type must not be empty".into()));
        }
        Ok(())
    }
}

/// Response body of the app list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AppList {
    #[serde(default)]
    pub applist: Vec<AppRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_field_uses_wire_name() {
        let record = AppRecord {
            id: "a1".into(),
            title: "Billing".into(),
            app_type: "web".into(),
            description: String::new(),
        };
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["type"], "web");
        assert!(json.get("app_type").is_none());
    }

    #[test]
    fn blank_id_is_new() {
        let record = AppRecord {
            id: "  ".into(),
            ..Default::default()
        };
        assert!(record.is_new());
    }

    #[test]
    fn validate_requires_title_and_type() {
        let mut record = AppRecord {
            title: "Billing".into(),
            ..Default::default()
        };
        assert!(record.validate().unwrap_err().to_string().contains("type"));

        record.app_type = "web".into();
        assert!(record.validate().is_ok());

        record.title = " ".into();
        assert!(record.validate().unwrap_err().to_string().contains("title"));
    }

    #[test]
    fn missing_applist_defaults_empty() {
        let list: AppList = serde_json::from_str("{}").expect("parse");
        assert!(list.applist.is_empty());
    }
}
