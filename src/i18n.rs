// i18n.rs - UI strings for the demo window
//
// Catalog format: { "<lang>": { "<key>": "text with {placeholders}" } }.
// The built-in catalog is compiled in from assets/i18n.json; a catalog found at
// <exe_dir>/assets/i18n.json or ./assets/i18n.json is merged over it.
//
// Language: --lang <code>, else PANO_LANG, else English.

use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::RwLock;

pub const FALLBACK_LANG: &str = "en";
const BUILTIN: &str = include_str!("../assets/i18n.json");

type Table = HashMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<String, Table>,
}

impl Catalog {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let tables: BTreeMap<String, Table> = serde_json::from_str(text)?;
        Ok(Self { tables })
    }

    /// Entries of `other` win over ours.
    pub fn merge(&mut self, other: Catalog) {
        for (lang, table) in other.tables {
            self.tables.entry(lang).or_default().extend(table);
        }
    }

    pub fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.tables
            .get(lang)
            .and_then(|t| t.get(key))
            .or_else(|| self.tables.get(FALLBACK_LANG).and_then(|t| t.get(key)))
            .map(String::as_str)
    }

    /// `(code, display name)` of every language in the catalog.
    pub fn languages(&self) -> Vec<(String, String)> {
        self.tables
            .iter()
            .map(|(code, table)| {
                let name = table.get("language.name").cloned().unwrap_or_else(|| code.clone());
                (code.clone(), name)
            })
            .collect()
    }
}

struct Active {
    lang: String,
    catalog: Catalog,
}

static ACTIVE: OnceCell<RwLock<Active>> = OnceCell::new();

fn override_file() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join("assets").join("i18n.json"));
        }
    }
    candidates.push(PathBuf::from("assets").join("i18n.json"));
    candidates.into_iter().find(|p| p.exists())
}

fn load_catalog() -> Catalog {
    let mut catalog = Catalog::parse(BUILTIN).unwrap_or_else(|e| {
        log::error!("Built-in string catalog is malformed: {}", e);
        Catalog::default()
    });

    if let Some(path) = override_file() {
        match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| Catalog::parse(&text).map_err(|e| e.to_string()))
        {
            Ok(extra) => catalog.merge(extra),
            Err(e) => log::warn!("Ignoring string catalog {:?}: {}", path, e),
        }
    }
    catalog
}

/// Select `lang`. The catalog is loaded on first use only.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    if let Some(lock) = ACTIVE.get() {
        if let Ok(mut active) = lock.write() {
            active.lang = lang;
        }
        return;
    }
    let _ = ACTIVE.set(RwLock::new(Active {
        lang,
        catalog: load_catalog(),
    }));
}

pub fn current_lang() -> String {
    ACTIVE
        .get()
        .and_then(|l| l.read().ok().map(|a| a.lang.clone()))
        .unwrap_or_else(|| FALLBACK_LANG.to_string())
}

pub fn languages() -> Vec<(String, String)> {
    ACTIVE
        .get()
        .and_then(|l| l.read().ok().map(|a| a.catalog.languages()))
        .unwrap_or_default()
}

/// Localized text for `key`; the key itself when nothing matches.
pub fn tr(key: &str) -> String {
    let Some(active) = ACTIVE.get().and_then(|l| l.read().ok()) else {
        return key.to_string();
    };
    active
        .catalog
        .lookup(&active.lang, key)
        .unwrap_or(key)
        .to_string()
}

/// Like [`tr`], substituting `{name}` placeholders. Unknown ones are kept.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    substitute(tr(key), args)
}

fn substitute(mut text: String, args: &[(&str, String)]) -> String {
    for (name, value) in args {
        text = text.replace(&format!("{{{}}}", name), value);
    }
    text
}

/// Language from `--lang <code>` or `PANO_LANG`.
pub fn resolve_lang(args: &[String]) -> String {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == "--lang" {
            if let Some(v) = it.next() {
                return v.clone();
            }
        }
    }

    match std::env::var("PANO_LANG") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => FALLBACK_LANG.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_covers_every_key_in_every_language() {
        let catalog = Catalog::parse(BUILTIN).unwrap();
        let english = &catalog.tables[FALLBACK_LANG];
        for (lang, table) in &catalog.tables {
            for key in english.keys() {
                assert!(table.contains_key(key), "{lang} is missing {key}");
            }
        }
    }

    #[test]
    fn lookup_falls_back_to_english() {
        let catalog = Catalog::parse(
            r#"{ "en": { "a": "A", "b": "B" }, "fr": { "a": "Â" } }"#,
        )
        .unwrap();
        assert_eq!(catalog.lookup("fr", "a"), Some("Â"));
        assert_eq!(catalog.lookup("fr", "b"), Some("B"));
        assert_eq!(catalog.lookup("xx", "a"), Some("A"));
        assert_eq!(catalog.lookup("fr", "c"), None);
    }

    #[test]
    fn merge_overrides_and_extends() {
        let mut catalog = Catalog::parse(r#"{ "en": { "a": "A", "b": "B" } }"#).unwrap();
        catalog.merge(Catalog::parse(r#"{ "en": { "b": "bee" }, "de": { "a": "Ä" } }"#).unwrap());
        assert_eq!(catalog.lookup("en", "a"), Some("A"));
        assert_eq!(catalog.lookup("en", "b"), Some("bee"));
        assert_eq!(catalog.lookup("de", "a"), Some("Ä"));
        assert_eq!(
            catalog.languages(),
            vec![
                ("de".to_string(), "de".to_string()),
                ("en".to_string(), "en".to_string())
            ]
        );
    }

    #[test]
    fn placeholders_are_substituted() {
        let text = substitute(
            "FOV: {fov}° ({min}°–{max}°) {other}".to_string(),
            &[("fov", "90.0".into()), ("min", "75.0".into()), ("max", "100.0".into())],
        );
        assert_eq!(text, "FOV: 90.0° (75.0°–100.0°) {other}");
    }

    #[test]
    fn lang_flag_wins() {
        let args = vec!["--config".to_string(), "x.json".into(), "--lang".into(), "fr".into()];
        assert_eq!(resolve_lang(&args), "fr");
    }
}
