use std::sync::{Arc, RwLock};

use super::{PREF_THEME, PreferencesExt, UserPreferencesService};
use crate::{
    error::ServiceError,
    events::{EventChannel, Subscription},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    fn as_preference(self) -> &'static str {
        match self {
            Theme::Dark => "Dark",
            Theme::Light => "Light",
        }
    }

    fn from_preference(value: &str) -> Self {
        if value == "Light" { Theme::Light } else { Theme::Dark }
    }
}

/// Holds the active theme and notifies subscribers when it changes.
pub struct ThemeManager {
    preferences: Arc<dyn UserPreferencesService>,
    current: RwLock<Theme>,
    changed: EventChannel<Theme>,
}

impl ThemeManager {
    pub fn new(preferences: Arc<dyn UserPreferencesService>) -> Self {
        Self {
            preferences,
            current: RwLock::new(Theme::default()),
            changed: EventChannel::new(),
        }
    }

    pub fn current(&self) -> Theme {
        self.current.read().map(|theme| *theme).unwrap_or_default()
    }

    /// Loads the saved theme. Subscribers are notified if it differs from
    /// the current one.
    pub async fn load(&self) -> Theme {
        let saved = self
            .preferences
            .get_preference(PREF_THEME, Theme::Dark.as_preference().to_string())
            .await;
        let theme = Theme::from_preference(&saved);
        self.apply(theme);
        theme
    }

    /// Switches the theme and persists the choice.
    pub async fn set_theme(&self, theme: Theme) -> Result<(), ServiceError> {
        self.apply(theme);
        self.preferences
            .save_preference(PREF_THEME, theme.as_preference())
            .await
    }

    pub fn subscribe(&self, handler: impl Fn(&Theme) + Send + Sync + 'static) -> Subscription {
        self.changed.subscribe(handler)
    }

    fn apply(&self, theme: Theme) {
        let changed = match self.current.write() {
            Ok(mut current) if *current != theme => {
                *current = theme;
                true
            }
            _ => false,
        };
        if changed {
            self.changed.publish(&theme);
        }
    }
}
