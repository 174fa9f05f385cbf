//! Translation lookup and the pass that applies it to the view.
//!
//! Elements opt in by carrying a [`LOOKUP_KEY_ATTR`] attribute whose value is
//! a dotted key (`servers.add`). Missing keys and unknown languages are
//! errors, never silently replaced: a hole in the catalog is a content bug.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::view::{NodeId, ViewError, ViewTree};

pub type LanguageId = String;

pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Attribute holding an element's lookup key.
pub const LOOKUP_KEY_ATTR: &str = "data-i18n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("unknown language `{0}`")]
    UnknownLanguage(LanguageId),
    #[error("no `{key}` translation for `{language}`")]
    MissingKey { language: LanguageId, key: String },
    #[error("translation catalog is invalid: {0}")]
    Catalog(String),
    #[error(transparent)]
    View(#[from] ViewError),
}

pub trait Translator {
    fn translate(&self, language: &str, key: &str) -> Result<String, TranslateError>;

    fn has_language(&self, language: &str) -> bool;

    fn languages(&self) -> Vec<LanguageId>;
}

/// Per-language JSON trees, addressed by dotted keys.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    languages: BTreeMap<LanguageId, Value>,
}

impl Catalog {
    /// Parse `{ "<language>": { ...nested keys... }, ... }`.
    pub fn from_json(data: &str) -> Result<Self, TranslateError> {
        let root: Value =
            serde_json::from_str(data).map_err(|err| TranslateError::Catalog(err.to_string()))?;
        let Value::Object(map) = root else {
            return Err(TranslateError::Catalog(
                "top level must be an object keyed by language".to_owned(),
            ));
        };
        let languages = map
            .into_iter()
            .map(|(language, tree)| {
                if tree.is_object() {
                    Ok((language, tree))
                } else {
                    Err(TranslateError::Catalog(format!(
                        "`{language}` must map to an object"
                    )))
                }
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { languages })
    }

    /// Display name from the language's `meta.label`, else its id.
    pub fn label<'a>(&'a self, language: &'a str) -> &'a str {
        self.languages
            .get(language)
            .and_then(|tree| resolve(tree, "meta.label"))
            .unwrap_or(language)
    }
}

impl Translator for Catalog {
    fn translate(&self, language: &str, key: &str) -> Result<String, TranslateError> {
        let tree = self
            .languages
            .get(language)
            .ok_or_else(|| TranslateError::UnknownLanguage(language.to_owned()))?;
        resolve(tree, key)
            .map(str::to_owned)
            .ok_or_else(|| TranslateError::MissingKey {
                language: language.to_owned(),
                key: key.to_owned(),
            })
    }

    fn has_language(&self, language: &str) -> bool {
        self.languages.contains_key(language)
    }

    fn languages(&self) -> Vec<LanguageId> {
        self.languages.keys().cloned().collect()
    }
}

fn resolve<'a>(tree: &'a Value, path: &str) -> Option<&'a str> {
    let mut node = tree;
    for segment in path.split('.') {
        node = node.get(segment)?;
    }
    node.as_str()
}

/// Replace the text of every tagged element under `scope` (inclusive).
///
/// Returns how many elements were rendered. Stops at the first failure.
pub fn render_translations<A, T>(
    tree: &mut ViewTree<A>,
    scope: NodeId,
    translator: &T,
    language: &str,
) -> Result<usize, TranslateError>
where
    T: Translator + ?Sized,
{
    if !translator.has_language(language) {
        return Err(TranslateError::UnknownLanguage(language.to_owned()));
    }

    let tagged: Vec<(NodeId, String)> = tree
        .descendants(scope)
        .into_iter()
        .filter_map(|id| tree.attr(id, LOOKUP_KEY_ATTR).map(|key| (id, key.to_owned())))
        .collect();

    for (id, key) in &tagged {
        let text = translator.translate(language, key)?;
        tree.set_text(*id, text)?;
    }
    Ok(tagged.len())
}

/// Tag `node` with `key` and render it right away.
pub fn bind_text<A, T>(
    tree: &mut ViewTree<A>,
    node: NodeId,
    key: &str,
    translator: &T,
    language: &str,
) -> Result<(), TranslateError>
where
    T: Translator + ?Sized,
{
    tree.set_attr(node, LOOKUP_KEY_ATTR, key)?;
    let text = translator.translate(language, key)?;
    tree.set_text(node, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "en-US": { "meta": { "label": "English" }, "tabs": { "servers": "Servers" }, "greeting": "Hello" },
        "fr-FR": { "meta": { "label": "Français" }, "tabs": { "servers": "Serveurs" }, "greeting": "Bonjour" }
    }"#;

    fn catalog() -> Catalog {
        Catalog::from_json(CATALOG).unwrap()
    }

    #[test]
    fn resolves_dotted_keys_per_language() {
        let catalog = catalog();
        assert_eq!(catalog.translate("en-US", "tabs.servers").unwrap(), "Servers");
        assert_eq!(catalog.translate("fr-FR", "tabs.servers").unwrap(), "Serveurs");
        assert_eq!(catalog.label("fr-FR"), "Français");
        assert_eq!(catalog.languages(), ["en-US", "fr-FR"]);
    }

    #[test]
    fn missing_key_fails_fast() {
        let err = catalog().translate("en-US", "tabs.nope").unwrap_err();
        assert_eq!(
            err,
            TranslateError::MissingKey {
                language: "en-US".to_owned(),
                key: "tabs.nope".to_owned()
            }
        );
        // A key naming a subtree is not a string either.
        assert!(catalog().translate("en-US", "tabs").is_err());
    }

    #[test]
    fn unknown_language_fails_fast() {
        assert_eq!(
            catalog().translate("xx-XX", "greeting"),
            Err(TranslateError::UnknownLanguage("xx-XX".to_owned()))
        );
    }

    #[test]
    fn rejects_malformed_catalogs() {
        assert!(matches!(
            Catalog::from_json(r#"["en-US"]"#),
            Err(TranslateError::Catalog(_))
        ));
        assert!(matches!(
            Catalog::from_json(r#"{"en-US": "flat"}"#),
            Err(TranslateError::Catalog(_))
        ));
    }

    #[test]
    fn language_switch_rewrites_only_tagged_text() {
        let catalog = catalog();
        let mut tree: ViewTree<()> = ViewTree::new("main");
        let root = tree.root();
        let title = tree.element(root, "h1").unwrap();
        let plain = tree.element(root, "p").unwrap();
        tree.set_text(plain, "udp://10.0.0.1").unwrap();
        bind_text(&mut tree, title, "greeting", &catalog, "en-US").unwrap();
        assert_eq!(tree.text(title), Some("Hello"));

        let rendered = render_translations(&mut tree, root, &catalog, "fr-FR").unwrap();
        assert_eq!(rendered, 1);
        assert_eq!(tree.text(title), Some("Bonjour"));
        assert_eq!(tree.text(plain), Some("udp://10.0.0.1"));
    }

    #[test]
    fn render_stops_on_a_missing_key() {
        let catalog = catalog();
        let mut tree: ViewTree<()> = ViewTree::new("main");
        let root = tree.root();
        let broken = tree.element(root, "span").unwrap();
        tree.set_attr(broken, LOOKUP_KEY_ATTR, "not.there").unwrap();
        assert!(matches!(
            render_translations(&mut tree, root, &catalog, "en-US"),
            Err(TranslateError::MissingKey { .. })
        ));
    }
}
