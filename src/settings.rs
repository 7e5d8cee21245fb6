//! User settings persisted next to the ledger: low-balance threshold,
//! disbursement categories, notification and appearance preferences.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Amount;
use crate::storage::{self, KeyValueStore, StorageError, keys};

pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Office Supplies",
    "Meals & Entertainment",
    "Transportation",
    "Postage & Shipping",
    "Maintenance",
    "Miscellaneous",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub low_balance_alerts: bool,
    pub reconciliation_reminders: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            low_balance_alerts: true,
            reconciliation_reminders: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppearanceSettings {
    pub theme: Theme,
    pub currency_symbol: String,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            currency_symbol: "$".to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CategoryError {
    #[error("Category name is empty")]
    Empty,
    #[error("Category {0:?} already exists")]
    Duplicate(String),
    #[error("Category {0:?} not found")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub low_balance_threshold: Amount,
    pub custom_categories: Vec<String>,
    pub notifications: NotificationSettings,
    pub appearance: AppearanceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            low_balance_threshold: Amount::from_cents(5000),
            custom_categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            notifications: NotificationSettings::default(),
            appearance: AppearanceSettings::default(),
        }
    }
}

impl Settings {
    /// Missing keys fall back to their defaults individually.
    pub fn load(store: &impl KeyValueStore) -> Result<Self, StorageError> {
        let defaults = Settings::default();
        let settings = Settings {
            low_balance_threshold: storage::read_json(store, keys::LOW_BALANCE_THRESHOLD)?
                .unwrap_or(defaults.low_balance_threshold),
            custom_categories: storage::read_json(store, keys::CUSTOM_CATEGORIES)?
                .unwrap_or(defaults.custom_categories),
            notifications: storage::read_json(store, keys::NOTIFICATION_SETTINGS)?
                .unwrap_or(defaults.notifications),
            appearance: storage::read_json(store, keys::APPEARANCE_SETTINGS)?
                .unwrap_or(defaults.appearance),
        };
        debug!(?settings, "settings loaded");
        Ok(settings)
    }

    pub fn save(&self, store: &impl KeyValueStore) -> Result<(), StorageError> {
        storage::write_json(store, keys::LOW_BALANCE_THRESHOLD, &self.low_balance_threshold)?;
        storage::write_json(store, keys::CUSTOM_CATEGORIES, &self.custom_categories)?;
        storage::write_json(store, keys::NOTIFICATION_SETTINGS, &self.notifications)?;
        storage::write_json(store, keys::APPEARANCE_SETTINGS, &self.appearance)
    }

    pub fn is_low_balance(&self, balance: Amount) -> bool {
        self.notifications.low_balance_alerts && balance <= self.low_balance_threshold
    }

    pub fn add_category(&mut self, name: &str) -> Result<(), CategoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CategoryError::Empty);
        }
        if self.find_category(name).is_some() {
            return Err(CategoryError::Duplicate(name.to_owned()));
        }
        self.custom_categories.push(name.to_owned());
        Ok(())
    }

    pub fn remove_category(&mut self, name: &str) -> Result<String, CategoryError> {
        let index = self
            .find_category(name.trim())
            .ok_or_else(|| CategoryError::NotFound(name.trim().to_owned()))?;
        Ok(self.custom_categories.remove(index))
    }

    fn find_category(&self, name: &str) -> Option<usize> {
        self.custom_categories
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }
}
