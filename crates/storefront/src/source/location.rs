//! Candidate locations of the product source.

use core::fmt;
use core::str::FromStr;
use std::path::PathBuf;

use url::Url;

/// A single place to look for `products.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Fetched over HTTP(S).
    Url(Url),
    /// Read from the local filesystem.
    Path(PathBuf),
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for SourceLocation {
    type Err = url::ParseError;

    /// `http://` and `https://` entries are URLs, anything else is a path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Url::parse(s).map(Self::Url)
        } else {
            Ok(Self::Path(PathBuf::from(s)))
        }
    }
}

const SOURCE_FILE: &str = "products.json";

/// Derive the ordered candidate URLs for a page at `base`.
///
/// Tries the file relative to the page, explicitly relative, at the site
/// root, and next to the page's directory. Duplicates keep their first
/// position.
#[must_use]
pub fn candidate_urls(base: &Url) -> Vec<Url> {
    let mut directory = base.clone();
    let path = base.path();
    let parent = path
        .rfind('/')
        .and_then(|i| path.get(..=i))
        .unwrap_or("/");
    directory.set_path(&format!("{parent}{SOURCE_FILE}"));
    directory.set_query(None);
    directory.set_fragment(None);

    let mut candidates: Vec<Url> = Vec::new();
    let joined = [
        base.join(SOURCE_FILE).ok(),
        base.join(&format!("./{SOURCE_FILE}")).ok(),
        base.join(&format!("/{SOURCE_FILE}")).ok(),
        Some(directory),
    ];
    for url in joined.into_iter().flatten() {
        if !candidates.contains(&url) {
            candidates.push(url);
        }
    }
    candidates
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        assert!(matches!(
            "https://shop.example/products.json".parse::<SourceLocation>().unwrap(),
            SourceLocation::Url(_)
        ));
        assert_eq!(
            "data/products.json".parse::<SourceLocation>().unwrap(),
            SourceLocation::Path(PathBuf::from("data/products.json"))
        );
    }

    #[test]
    fn test_candidates_from_nested_page() {
        let base = Url::parse("https://shop.example/store/parts.html?cat=gpu").unwrap();
        let candidates: Vec<String> = candidate_urls(&base)
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            candidates,
            vec![
                "https://shop.example/store/products.json".to_string(),
                "https://shop.example/products.json".to_string(),
            ]
        );
    }

    #[test]
    fn test_candidates_from_root() {
        let base = Url::parse("https://shop.example/").unwrap();
        let candidates = candidate_urls(&base);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].as_str(), "https://shop.example/products.json");
    }
}
