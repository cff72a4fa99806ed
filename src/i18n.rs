use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_LOCALE: &str = "en";

const BUILTIN_EN: &str = include_str!("../resources/translations/en.json");
const BUILTIN_FR: &str = include_str!("../resources/translations/fr.json");

/// Key → display text lookup for one locale. Unknown keys translate to
/// themselves so untranslated status values still render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translations {
    locale: String,
    entries: HashMap<String, String>,
}

impl Translations {
    /// Resources bundled with the binary. Unknown locales fall back to English.
    pub fn builtin(locale: &str) -> Self {
        let mut translations = Self::from_json(DEFAULT_LOCALE, BUILTIN_EN).unwrap_or_default();
        if locale == "fr" {
            if let Ok(fr) = Self::from_json("fr", BUILTIN_FR) {
                translations.merge(fr);
            }
        }
        translations.locale = locale.to_string();
        translations
    }

    pub fn from_json(locale: &str, json: &str) -> anyhow::Result<Self> {
        let entries: HashMap<String, String> =
            serde_json::from_str(json).with_context(|| format!("parse {locale} translations"))?;
        Ok(Self {
            locale: locale.to_string(),
            entries,
        })
    }

    /// Built-in resources overlaid with `<dir>/<locale>.json` when present.
    pub fn load(dir: impl AsRef<Path>, locale: &str) -> anyhow::Result<Self> {
        let mut translations = Self::builtin(locale);
        let path = dir.as_ref().join(format!("{locale}.json"));
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let overlay = Self::from_json(locale, &content)
                    .with_context(|| format!("load {}", path.display()))?;
                translations.merge(overlay);
            }
            Err(err) => {
                tracing::debug!(path = %path.display(), "no translation file: {err}");
            }
        }
        Ok(translations)
    }

    pub fn merge(&mut self, other: Translations) {
        self.entries.extend(other.entries);
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(key)
    }
}
