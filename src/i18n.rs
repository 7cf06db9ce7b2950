//! Localized log lines with `{placeholder}` substitution

use regex::{Captures, Regex};
use std::sync::OnceLock;

const EN: &[(&str, &str)] = &[
    ("logStart", "Deleting messages from Trash and Junk folders..."),
    ("logDeleted", "Deleted: {subject}"),
    ("logError", "Failed to delete message {id}: {error}"),
    ("logComplete", "Done. {count} message(s) deleted."),
    ("logAlreadyRunning", "A deletion is already in progress."),
];

const FR: &[(&str, &str)] = &[
    ("logStart", "Suppression des messages des dossiers Corbeille et Indésirables..."),
    ("logDeleted", "Supprimé : {subject}"),
    ("logError", "Échec de la suppression du message {id} : {error}"),
    ("logComplete", "Terminé. {count} message(s) supprimé(s)."),
    ("logAlreadyRunning", "Une suppression est déjà en cours."),
];

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\w+)\}").unwrap())
}

/// Replace `{name}` placeholders; unknown ones are left as written
pub fn format_message(template: &str, values: &[(&str, &str)]) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(key, _)| *key == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[derive(Debug, Clone)]
pub struct Catalog {
    locale: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl Catalog {
    /// Accepts tags like "fr", "fr-FR" or "fr_FR.UTF-8"; anything else is English
    pub fn for_locale(tag: &str) -> Self {
        let language = tag
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match language.as_str() {
            "fr" => Self {
                locale: "fr",
                entries: FR,
            },
            _ => Self {
                locale: "en",
                entries: EN,
            },
        }
    }

    pub fn locale(&self) -> &str {
        self.locale
    }

    pub fn get_message(&self, key: &str, substitutions: &[(&str, &str)]) -> String {
        let template = lookup(self.entries, key)
            .or_else(|| lookup(EN, key))
            .unwrap_or(key);
        format_message(template, substitutions)
    }
}

fn lookup(entries: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    entries
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, template)| *template)
}
