//! Static language → strategy table

use crate::{
    error::Error,
    types::{LanguageId, Strategy},
};

const ENTRIES: &[(LanguageId, Strategy)] = &[
    (LanguageId::JavaScript, Strategy::Native),
    (LanguageId::Python, Strategy::Hosted),
];

/// Pure lookup from language identifier to execution strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeRegistry;

impl RuntimeRegistry {
    /// Resolve a raw identifier. Unknown identifiers are rejected, never defaulted.
    pub fn resolve(&self, language: &str) -> Result<(LanguageId, Strategy), Error> {
        let id: LanguageId = language
            .parse()
            .map_err(|_| Error::UnsupportedLanguage(language.to_string()))?;

        ENTRIES
            .iter()
            .find(|(entry, _)| *entry == id)
            .copied()
            .ok_or_else(|| Error::UnsupportedLanguage(language.to_string()))
    }

    pub fn entries(&self) -> &'static [(LanguageId, Strategy)] {
        ENTRIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_languages() {
        let registry = RuntimeRegistry;
        assert_eq!(
            registry.resolve("javascript").unwrap(),
            (LanguageId::JavaScript, Strategy::Native)
        );
        assert_eq!(
            registry.resolve("python").unwrap(),
            (LanguageId::Python, Strategy::Hosted)
        );
    }

    #[test]
    fn test_resolve_rejects_unknown() {
        let registry = RuntimeRegistry;
        for language in ["ruby", "", "PYTHON", "typescript"] {
            assert!(matches!(
                registry.resolve(language),
                Err(Error::UnsupportedLanguage(ref l)) if l == language
            ));
        }
    }
}
