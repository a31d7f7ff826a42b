use scraper::Html;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::{element_text, selector};

/// One repository from the listing page. Transient: lives only until it is
/// folded into a RepoMap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEntry {
    pub name: String,
    pub language: Option<String>,
}

/// Ordered name → language mapping. Listing order is preserved; a repeated
/// name keeps its first position but takes the later language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoMap {
    entries: Vec<(String, Option<String>)>,
}

impl RepoMap {
    pub fn insert(&mut self, name: String, language: Option<String>) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = language,
            None => self.entries.push((name, language)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, language)| (name.as_str(), language.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<RepoEntry> for RepoMap {
    fn from_iter<I: IntoIterator<Item = RepoEntry>>(entries: I) -> Self {
        let mut map = RepoMap::default();
        for entry in entries {
            map.insert(entry.name, entry.language);
        }
        map
    }
}

// Serializes as a JSON object in insertion order.
impl Serialize for RepoMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, language) in &self.entries {
            map.serialize_entry(name, language)?;
        }
        map.end()
    }
}

/// Pull owned repositories off the listing page. An entry with no name
/// anchor is skipped; the rest of the batch still goes through.
pub fn extract(doc: &Html) -> RepoMap {
    let owns = selector(r#"li[itemprop="owns"]"#);
    let name_sel = selector(r#"a[itemprop="name codeRepository"]"#);
    let lang_sel = selector(r#"span[itemprop="programmingLanguage"]"#);

    doc.select(&owns)
        .filter_map(|repo| {
            let name = repo
                .select(&name_sel)
                .next()
                .map(|a| element_text(a).trim().to_string())
                .filter(|n| !n.is_empty())?;
            let language = repo
                .select(&lang_sel)
                .next()
                .map(|s| element_text(s).trim().to_string());
            Some(RepoEntry { name, language })
        })
        .collect()
}
