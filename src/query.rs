// src/query.rs
//! Query-string and path-segment helpers for backend URLs.

/// Language the backend stores content in; requests in it skip i18n params.
pub const BASE_LANGUAGE: &str = "KR";

// ==================== QUERY PARAMETERS ====================

#[derive(Debug, Clone, Default)]
pub struct ApiQuery {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub lang: Option<String>,
    pub include_i18n: bool,
    pub extra: Vec<(String, String)>,
}

impl ApiQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn cursor(mut self, cursor: Option<impl ToString>) -> Self {
        self.cursor = cursor.map(|c| c.to_string());
        self
    }

    /// Sets `lang` and `includeI18n` unless `language` is the base language.
    pub fn language(mut self, language: &str) -> Self {
        if !language.is_empty() && language != BASE_LANGUAGE {
            self.lang = Some(language.to_string());
            self.include_i18n = true;
        }
        self
    }

    /// Adds or replaces an extra parameter.
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.extra.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.extra.push((key.to_string(), value)),
        }
        self
    }

    pub fn build(&self) -> String {
        build_api_query(self)
    }
}

/// Renders `?limit=..&cursor=..&lang=..&includeI18n=1&<extra>`, or "" when empty.
pub fn build_api_query(query: &ApiQuery) -> String {
    let mut params: Vec<(String, String)> = Vec::new();

    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(cursor) = &query.cursor {
        params.push(("cursor".to_string(), cursor.clone()));
    }
    if let Some(lang) = query.lang.as_deref().filter(|l| !l.is_empty()) {
        params.push(("lang".to_string(), lang.to_string()));
    }
    if query.include_i18n {
        params.push(("includeI18n".to_string(), "1".to_string()));
    }
    for (key, value) in &query.extra {
        match params.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.clone(),
            None => params.push((key.clone(), value.clone())),
        }
    }

    if params.is_empty() {
        return String::new();
    }

    let encoded = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("?{}", encoded)
}

/// Percent-encodes an id for use as one path segment.
pub fn encode_path_segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query() {
        assert_eq!(build_api_query(&ApiQuery::new()), "");
    }

    #[test]
    fn test_full_query_order() {
        let query = ApiQuery::new()
            .limit(50)
            .cursor(Some("abc"))
            .language("EN")
            .param("status", "in_progress");
        assert_eq!(query.build(), "?limit=50&cursor=abc&lang=EN&includeI18n=1&status=in_progress");
    }

    #[test]
    fn test_base_language_skips_i18n() {
        let query = ApiQuery::new().limit(10).language(BASE_LANGUAGE);
        assert_eq!(query.build(), "?limit=10");
    }

    #[test]
    fn test_extra_overrides_and_encodes() {
        let query = ApiQuery::new()
            .limit(10)
            .param("limit", "all")
            .param("chem_name", "sulfuric acid & co");
        assert_eq!(query.build(), "?limit=all&chem_name=sulfuric%20acid%20%26%20co");
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("H2SO4-001"), "H2SO4-001");
        assert_eq!(encode_path_segment("a/b c"), "a%2Fb%20c");
    }
}
