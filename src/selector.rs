//! Selection expressions over a numbered item list
//!
//! Accepted forms: the wildcard token (`all`, case-insensitive), a single
//! 1-based index, or indices separated by commas (`1, 3,5`). A malformed
//! token rejects the whole input; an out-of-range index is dropped.

use std::num::IntErrorKind;

use crate::error::SelectionError;

pub const DEFAULT_WILDCARD: &str = "all";

/// A parsed selection, not yet applied to any list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    /// 1-based positions as typed. `None` marks an integer too large to
    /// represent, which can never be in range.
    Indices(Vec<Option<i64>>),
}

impl Selection {
    pub fn parse(raw: &str, wildcard: &str) -> Result<Self, SelectionError> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(wildcard) {
            return Ok(Self::All);
        }
        if raw.is_empty() {
            return Err(SelectionError::EmptySelection);
        }

        let mut indices = Vec::new();
        for token in raw.split(',') {
            match token.trim().parse::<i64>() {
                Ok(n) => indices.push(Some(n)),
                Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                    indices.push(None);
                }
                Err(_) => return Err(SelectionError::InvalidSelectionSyntax(raw.to_string())),
            }
        }
        Ok(Self::Indices(indices))
    }

    /// Apply to `items`, dropping out-of-range positions
    pub fn apply<'a, T>(&self, items: &'a [T]) -> Result<Vec<&'a T>, SelectionError> {
        let resolved: Vec<&T> = match self {
            Self::All => items.iter().collect(),
            Self::Indices(indices) => indices
                .iter()
                .flatten()
                .filter_map(|&n| usize::try_from(n).ok())
                .filter_map(|n| n.checked_sub(1))
                .filter_map(|i| items.get(i))
                .collect(),
        };

        if resolved.is_empty() {
            Err(SelectionError::EmptySelection)
        } else {
            Ok(resolved)
        }
    }
}

/// Parse `raw` and resolve it against `items` in one step
pub fn resolve(items: &[String], raw: &str, wildcard: &str) -> Result<Vec<String>, SelectionError> {
    let selection = Selection::parse(raw, wildcard)?;
    Ok(selection.apply(items)?.into_iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<String> {
        ["nginx", "apache2", "postgres"].iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn comma_list_resolves_in_typed_order() {
        assert_eq!(resolve(&items(), "1,3", "all").unwrap(), vec!["nginx", "postgres"]);
        assert_eq!(resolve(&items(), " 3 , 1 ", "all").unwrap(), vec!["postgres", "nginx"]);
    }

    #[test]
    fn wildcard_is_case_insensitive() {
        assert_eq!(resolve(&items(), "ALL", "all").unwrap(), items());
        assert_eq!(resolve(&items(), "  All\n", "all").unwrap(), items());
    }

    #[test]
    fn wildcard_on_empty_list_is_empty_selection() {
        assert_eq!(resolve(&[], "all", "all"), Err(SelectionError::EmptySelection));
    }

    #[test]
    fn out_of_range_only_is_empty_selection() {
        assert_eq!(resolve(&items(), "5", "all"), Err(SelectionError::EmptySelection));
        assert_eq!(resolve(&items(), "0,4,-1", "all"), Err(SelectionError::EmptySelection));
    }

    #[test]
    fn out_of_range_is_dropped_silently() {
        assert_eq!(resolve(&items(), "2,9", "all").unwrap(), vec!["apache2"]);
    }

    #[test]
    fn one_bad_token_rejects_everything() {
        assert!(matches!(
            resolve(&items(), "1,x,3", "all"),
            Err(SelectionError::InvalidSelectionSyntax(_))
        ));
        assert!(matches!(
            resolve(&items(), "1,,2", "all"),
            Err(SelectionError::InvalidSelectionSyntax(_))
        ));
        assert!(matches!(
            resolve(&items(), "1.5", "all"),
            Err(SelectionError::InvalidSelectionSyntax(_))
        ));
    }

    #[test]
    fn empty_input_is_empty_selection() {
        assert_eq!(resolve(&items(), "", "all"), Err(SelectionError::EmptySelection));
        assert_eq!(resolve(&items(), "   ", "all"), Err(SelectionError::EmptySelection));
    }

    #[test]
    fn huge_index_counts_as_out_of_range() {
        assert_eq!(
            resolve(&items(), "99999999999999999999999", "all"),
            Err(SelectionError::EmptySelection)
        );
        assert_eq!(
            resolve(&items(), "1,99999999999999999999999", "all").unwrap(),
            vec!["nginx"]
        );
    }

    #[test]
    fn duplicates_are_kept() {
        assert_eq!(resolve(&items(), "2,2", "all").unwrap(), vec!["apache2", "apache2"]);
    }

    #[test]
    fn custom_wildcard() {
        assert_eq!(resolve(&items(), "*", "*").unwrap(), items());
        assert!(matches!(
            resolve(&items(), "all", "*"),
            Err(SelectionError::InvalidSelectionSyntax(_))
        ));
    }
}
