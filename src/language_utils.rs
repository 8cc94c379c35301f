use isolang::Language;

/// Language utilities for locale and scope handling
///
/// Locale and scope values end up interpolated into filesystem paths and
/// cache keys, so every component passes them through these sanitizers first.
/// Normalize a locale code: trimmed, lowercased, restricted to [a-z0-9_-]
pub fn normalize_locale(locale: &str) -> String {
    locale
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Normalize a scope name: trimmed, restricted to [A-Za-z0-9_.-]
///
/// Dots are allowed for scopes like "backoffice.v2"; a scope consisting only
/// of dots would still escape the base directory, so those collapse to empty.
pub fn normalize_scope(scope: &str) -> String {
    let cleaned: String = scope
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        String::new()
    } else {
        cleaned
    }
}

/// Check whether a locale code is already in normalized form
pub fn is_normalized_locale(locale: &str) -> bool {
    !locale.is_empty() && normalize_locale(locale) == locale
}

/// Get an English display name for a locale code
///
/// Accepts ISO 639-1 codes and ISO 639-3 codes, optionally followed by a
/// region ("pt-br", "zh_tw"). Returns `None` for unknown languages.
pub fn display_name(code: &str) -> Option<String> {
    let normalized = normalize_locale(code);
    let base = normalized
        .split(['-', '_'])
        .next()
        .unwrap_or_default();

    let language = match base.len() {
        2 => Language::from_639_1(base),
        3 => Language::from_639_3(base),
        _ => None,
    }?;

    Some(language.to_name().to_string())
}
