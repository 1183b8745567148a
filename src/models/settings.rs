use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    Monday,
    Sunday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// Per-user preferences. A single record, persisted separately from the
/// entity lists and never mirrored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_name: String,
    pub default_currency: String,
    pub week_starts_on: WeekStart,
    pub categories: Vec<String>,
    pub accounts: Vec<String>,
    pub theme: Theme,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            user_name: String::new(),
            default_currency: "EUR".to_string(),
            week_starts_on: WeekStart::Monday,
            categories: [
                "Food",
                "Transport",
                "Entertainment",
                "Services",
                "Salary",
                "Freelance",
            ]
            .map(str::to_string)
            .to_vec(),
            accounts: ["Main Account", "Savings Account"].map(str::to_string).to_vec(),
            theme: Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub user_name: Option<String>,
    pub default_currency: Option<String>,
    pub week_starts_on: Option<WeekStart>,
    pub categories: Option<Vec<String>>,
    pub accounts: Option<Vec<String>>,
    pub theme: Option<Theme>,
}

impl SettingsPatch {
    pub fn apply_to(self, settings: &mut UserSettings) {
        if let Some(v) = self.user_name {
            settings.user_name = v;
        }
        if let Some(v) = self.default_currency {
            settings.default_currency = v;
        }
        if let Some(v) = self.week_starts_on {
            settings.week_starts_on = v;
        }
        if let Some(v) = self.categories {
            settings.categories = v;
        }
        if let Some(v) = self.accounts {
            settings.accounts = v;
        }
        if let Some(v) = self.theme {
            settings.theme = v;
        }
    }
}
