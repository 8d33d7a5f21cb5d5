//! Sync configuration shared by every client.
//!
//! `SyncSettings` names the remote folder, file naming, and the metadata tag that
//! marks files as belonging to this application.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::remote::ShareRole;
use crate::util::normalize_text_option;

const DEFAULT_FOLDER_NAME: &str = "MyShoppingLists";
const DEFAULT_FILE_NAME_PREFIX: &str = "list_";
const DEFAULT_APP_PROPERTY_KEY: &str = "app";
const DEFAULT_APP_PROPERTY_VALUE: &str = "shoppinglist";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Remote layout and polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    /// Remote folder that holds one JSON file per list
    pub folder_name: String,
    /// File names are `{prefix}{list id}.json`
    pub file_name_prefix: String,
    /// Metadata tag key identifying this application's files
    pub app_property_key: String,
    pub app_property_value: String,
    /// Background poll period in seconds
    pub poll_interval_secs: u64,
    /// Role granted by `share` when the caller does not pick one
    pub default_share_role: ShareRole,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            folder_name: DEFAULT_FOLDER_NAME.to_string(),
            file_name_prefix: DEFAULT_FILE_NAME_PREFIX.to_string(),
            app_property_key: DEFAULT_APP_PROPERTY_KEY.to_string(),
            app_property_value: DEFAULT_APP_PROPERTY_VALUE.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            default_share_role: ShareRole::Reader,
        }
    }
}

impl SyncSettings {
    /// Remote file name for a list
    pub fn file_name(&self, list_id: &str) -> String {
        format!("{}{list_id}.json", self.file_name_prefix)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Reject settings that would produce unusable remote names or a busy poll loop.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("folder_name", &self.folder_name),
            ("app_property_key", &self.app_property_key),
            ("app_property_value", &self.app_property_value),
        ] {
            if normalize_text_option(Some(value.clone())).is_none() {
                return Err(Error::InvalidInput(format!(
                    "sync setting '{field}' must not be empty"
                )));
            }
        }
        if self.folder_name.contains('/') || self.file_name_prefix.contains('/') {
            return Err(Error::InvalidInput(
                "sync folder and file names must not contain '/'".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::InvalidInput(
                "sync setting 'poll_interval_secs' must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse settings from JSON, filling in defaults and validating the result.
pub fn parse_sync_settings(payload: &str) -> Result<SyncSettings> {
    let settings: SyncSettings = serde_json::from_str(payload)?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let settings = SyncSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.file_name("abc"), "list_abc.json");
        assert_eq!(settings.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn parse_fills_missing_fields() {
        let parsed = parse_sync_settings(r#"{ "folder_name": "Groceries" }"#).unwrap();
        assert_eq!(
            parsed,
            SyncSettings {
                folder_name: "Groceries".to_string(),
                ..SyncSettings::default()
            }
        );
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        let error = parse_sync_settings(r#"{ "unexpected": true }"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn validate_rejects_blank_names_and_zero_interval() {
        let blank = SyncSettings {
            folder_name: "  ".to_string(),
            ..SyncSettings::default()
        };
        assert!(matches!(blank.validate(), Err(Error::InvalidInput(_))));

        let busy = SyncSettings {
            poll_interval_secs: 0,
            ..SyncSettings::default()
        };
        assert!(busy.validate().unwrap_err().to_string().contains("poll_interval_secs"));

        let nested = SyncSettings {
            folder_name: "a/b".to_string(),
            ..SyncSettings::default()
        };
        assert!(nested.validate().is_err());
    }

    #[test]
    fn share_role_parses_from_lowercase() {
        let parsed = parse_sync_settings(r#"{ "default_share_role": "writer" }"#).unwrap();
        assert_eq!(parsed.default_share_role, ShareRole::Writer);
    }
}
