use std::{collections::HashMap, sync::RwLock};

use super::LocalizationService;
use crate::{
    error::ServiceError,
    events::{EventChannel, Subscription},
};

/// In-memory translation tables keyed by language code.
pub struct TranslationCatalog {
    translations: HashMap<String, HashMap<String, String>>,
    current_language: RwLock<String>,
    language_changed: EventChannel<String>,
}

impl TranslationCatalog {
    /// Creates an empty catalog starting in `language`.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            translations: HashMap::new(),
            current_language: RwLock::new(language.into()),
            language_changed: EventChannel::new(),
        }
    }

    /// Catalog pre-populated with the built-in English strings.
    pub fn with_builtin_tables() -> Self {
        let english = [
            ("Nav_SoftwareApps", "Software Apps"),
            ("Nav_Optimize", "Optimize"),
            ("Nav_Customize", "Customize"),
            ("Nav_AdvancedTools", "Advanced Tools"),
            ("Dialog_Yes", "Yes"),
            ("Dialog_No", "No"),
            ("Dialog_OK", "OK"),
            ("Dialog_Cancel", "Cancel"),
            ("Dialog_Error_Title", "Error"),
            ("Dialog_Warning_Title", "Warning"),
            ("Dialog_Info_Title", "Information"),
            ("Startup_Error_Title", "Startup Error"),
            ("Update_Available_Title", "Update Available"),
            ("Notification_Backup_Title", "System Backup"),
            ("Notification_Migration_Title", "Scripts Moved"),
        ];
        Self::new("en").with_language("en", english)
    }

    /// Adds (or extends) the table for `code`.
    pub fn with_language<'a>(
        mut self,
        code: &str,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let table = self.translations.entry(code.to_string()).or_default();
        for (key, value) in entries {
            table.insert(key.to_string(), value.to_string());
        }
        self
    }
}

impl LocalizationService for TranslationCatalog {
    fn get_string(&self, key: &str) -> String {
        let language = self.current_language();
        self.translations
            .get(&language)
            .and_then(|table| table.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    fn set_language(&self, code: &str) -> Result<(), ServiceError> {
        let changed = {
            let mut current = self
                .current_language
                .write()
                .map_err(|_| ServiceError::failed("language state is poisoned"))?;
            if *current == code {
                false
            } else {
                *current = code.to_string();
                true
            }
        };
        if changed {
            log::info!("Language changed to {code}");
            self.language_changed.publish(&code.to_string());
        }
        Ok(())
    }

    fn current_language(&self) -> String {
        self.current_language
            .read()
            .map(|current| current.clone())
            .unwrap_or_else(|_| "en".to_string())
    }

    fn available_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.translations.keys().cloned().collect();
        languages.sort();
        languages
    }

    fn subscribe(&self, handler: Box<dyn Fn(&String) + Send + Sync>) -> Subscription {
        self.language_changed.subscribe(handler)
    }
}
