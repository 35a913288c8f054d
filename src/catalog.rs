//! Manifest parsing into categorized tool lists
//!
//! The manifest is a flat text file. A line starting with the marker
//! character opens a category; every other non-blank line is a package
//! name belonging to the most recently opened category.
//!
//! ```text
//! #Web
//! nginx
//! apache2
//! #DB
//! postgres
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::CatalogError;

pub const DEFAULT_MARKER: char = '#';

/// A named group of package names, in manifest order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub label: String,
    pub items: Vec<String>,
}

/// Ordered mapping from category label to items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    /// Read and parse a manifest file
    pub fn load(path: &Path, marker: char) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                CatalogError::ManifestNotFound(path.to_path_buf())
            } else {
                CatalogError::ManifestRead {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let catalog = Self::parse(&text, marker);
        debug!(
            path = %path.display(),
            categories = catalog.len(),
            items = catalog.item_count(),
            "loaded manifest"
        );
        Ok(catalog)
    }

    /// Parse manifest text. Never fails: anything unrecognised is skipped.
    pub fn parse(text: &str, marker: char) -> Self {
        let mut catalog = Self::default();
        // Index into `categories` of the category receiving items
        let mut current: Option<usize> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(label) = line.strip_prefix(marker) {
                current = Some(catalog.open_category(label.trim()));
            } else if let Some(idx) = current {
                catalog.categories[idx].items.push(line.to_string());
            }
        }

        catalog
    }

    /// Find or create a category; a repeated header reopens the original
    fn open_category(&mut self, label: &str) -> usize {
        if let Some(idx) = self.categories.iter().position(|c| c.label == label) {
            return idx;
        }
        self.categories.push(Category {
            label: label.to_string(),
            items: Vec::new(),
        });
        self.categories.len() - 1
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up a category by label
    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.items.as_slice())
    }

    /// Category at a 1-based menu position
    pub fn nth(&self, position: usize) -> Option<&Category> {
        position.checked_sub(1).and_then(|i| self.categories.get(i))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.label.as_str())
    }

    /// Every item in every category, in manifest order
    pub fn all_items(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn parses_categories_in_order() {
        let catalog = Catalog::parse("#Web\nnginx\napache2\n#DB\npostgres\n", '#');

        assert_eq!(catalog.labels().collect::<Vec<_>>(), vec!["Web", "DB"]);
        assert_eq!(catalog.get("Web"), Some(items(&["nginx", "apache2"]).as_slice()));
        assert_eq!(catalog.get("DB"), Some(items(&["postgres"]).as_slice()));
    }

    #[test]
    fn manifest_without_markers_is_empty() {
        let catalog = Catalog::parse("nmap\nsqlmap\n\nhydra\n", '#');
        assert!(catalog.is_empty());
        assert_eq!(catalog.item_count(), 0);
    }

    #[test]
    fn lines_before_first_marker_are_ignored() {
        let catalog = Catalog::parse("orphan\n\n#Recon\n  nmap  \n\n\nmasscan\n", '#');
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Recon"), Some(items(&["nmap", "masscan"]).as_slice()));
    }

    #[test]
    fn header_label_is_trimmed() {
        let catalog = Catalog::parse("#   Password Attacks  \njohn\n", '#');
        assert_eq!(catalog.nth(1).map(|c| c.label.as_str()), Some("Password Attacks"));
        assert!(catalog.nth(0).is_none());
        assert!(catalog.nth(2).is_none());
    }

    #[test]
    fn custom_marker() {
        let catalog = Catalog::parse("@Sniffing\nwireshark\n#not-a-header\n", '@');
        assert_eq!(
            catalog.get("Sniffing"),
            Some(items(&["wireshark", "#not-a-header"]).as_slice())
        );
    }

    #[test]
    fn duplicate_header_reopens_category() {
        let catalog = Catalog::parse("#A\none\n#B\ntwo\n#A\nthree\none\n", '#');
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("A"), Some(items(&["one", "three", "one"]).as_slice()));
        assert_eq!(catalog.all_items(), items(&["one", "three", "one", "two"]));
    }

    #[test]
    fn empty_category_is_kept() {
        let catalog = Catalog::parse("#Empty\n#Full\nx\n", '#');
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("Empty"), Some(&[][..]));
    }
}
