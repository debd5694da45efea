// Search providers - pure logic.
//
// The search bar submits to the current provider's URL template, with the
// query substituted for `%s`. Clicking the provider icon cycles to the next
// one. At least one provider always exists.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::modules::icons::{domain_from_url, favicon_url};
use crate::store::KeyValueStore;

const PROVIDERS_KEY: &str = "searchProviders";
const INDEX_KEY: &str = "searchProviderIndex";
const FALLBACK_TEMPLATE: &str = "https://www.google.com/search?q=%s";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchProvider {
    pub name: String,
    /// URL template containing `%s`.
    pub url: String,
    #[serde(default)]
    pub icon: Option<String>,
}

impl SearchProvider {
    fn new(name: &str, url: &str, icon: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            icon: Some(icon.to_string()),
        }
    }

    pub fn query_url(&self, query: &str) -> String {
        self.url.replacen("%s", &encode_query(query), 1)
    }
}

/// Percent-encodes like `encodeURIComponent`: `!*'()` stay literal.
fn encode_query(query: &str) -> String {
    let mut out = urlencoding::encode(query).into_owned();
    for (escaped, literal) in [("%21", "!"), ("%2A", "*"), ("%27", "'"), ("%28", "("), ("%29", ")")] {
        out = out.replace(escaped, literal);
    }
    out
}

pub fn default_providers() -> Vec<SearchProvider> {
    vec![
        SearchProvider::new(
            "Google",
            "https://www.google.com/search?q=%s",
            "https://www.google.com/favicon.ico",
        ),
        SearchProvider::new(
            "Bing",
            "https://www.bing.com/search?q=%s",
            "https://www.bing.com/sa/simg/favicon-2x.ico",
        ),
        SearchProvider::new(
            "DuckDuckGo",
            "https://duckduckgo.com/?q=%s",
            "https://duckduckgo.com/favicon.ico",
        ),
    ]
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("a provider URL is required")]
    EmptyUrl,

    #[error("no provider at index {0}")]
    NoSuchProvider(usize),

    #[error("cannot remove the last search provider")]
    LastProvider,
}

/// Turns whatever the user typed into a query template: adds a scheme,
/// a `/search` path for bare hosts and a `q=%s` parameter when there is no
/// placeholder yet.
pub fn normalize_search_url(url: &str) -> String {
    let url = url.trim();
    let url = if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    let mut parsed = match Url::parse(&url) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("[Search] Invalid provider URL {:?}: {}", url, e);
            return FALLBACK_TEMPLATE.to_string();
        }
    };

    if url.contains("%s") {
        return url;
    }

    if parsed.path().is_empty() || parsed.path() == "/" {
        parsed.set_path("/search");
    }

    let separator = match parsed.query() {
        Some(query) if !query.is_empty() => '&',
        _ => '?',
    };
    if separator == '?' {
        parsed.set_query(None);
    }
    format!("{}{}q=%s", parsed, separator)
}

/// "my-search.example.com" -> "My Search".
pub fn format_provider_name(domain: &str) -> String {
    domain
        .split('.')
        .next()
        .unwrap_or_default()
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchProviders {
    providers: Vec<SearchProvider>,
    current: usize,
}

impl SearchProviders {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut providers = match store.get(PROVIDERS_KEY) {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("[Search] Failed to parse saved providers: {}, using defaults", e);
                default_providers()
            }),
            None => default_providers(),
        };

        if providers.is_empty() {
            providers.extend(default_providers().into_iter().take(1));
        }

        let current = store
            .get(INDEX_KEY)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|&index| index < providers.len())
            .unwrap_or(0);

        Self { providers, current }
    }

    fn save(&self, store: &dyn KeyValueStore) {
        match serde_json::to_string(&self.providers) {
            Ok(json) => store.set(PROVIDERS_KEY, &json),
            Err(e) => log::error!("[Search] Failed to serialize providers: {}", e),
        }
        store.set(INDEX_KEY, &self.current.to_string());
    }

    pub fn providers(&self) -> &[SearchProvider] {
        &self.providers
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &SearchProvider {
        &self.providers[self.current]
    }

    pub fn search_url(&self, query: &str) -> String {
        self.current().query_url(query)
    }

    /// Advances to the next provider, wrapping around.
    pub fn cycle(&mut self, store: &dyn KeyValueStore) -> &SearchProvider {
        self.current = (self.current + 1) % self.providers.len();
        store.set(INDEX_KEY, &self.current.to_string());
        self.current()
    }

    /// Adds a provider. Blank name and icon are derived from the URL.
    pub fn add(
        &mut self,
        store: &dyn KeyValueStore,
        name: &str,
        url: &str,
        icon: &str,
    ) -> Result<&SearchProvider, ProviderError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ProviderError::EmptyUrl);
        }

        let domain = domain_from_url(url);
        let name = match name.trim() {
            "" => domain
                .as_deref()
                .map(format_provider_name)
                .unwrap_or_else(|| url.to_string()),
            name => name.to_string(),
        };
        let icon = match icon.trim() {
            "" => domain.as_deref().and_then(favicon_url),
            icon => Some(icon.to_string()),
        };

        log::info!("[Search] Adding provider '{}'", name);
        self.providers.push(SearchProvider {
            name,
            url: normalize_search_url(url),
            icon,
        });
        self.save(store);
        Ok(&self.providers[self.providers.len() - 1])
    }

    pub fn remove(
        &mut self,
        store: &dyn KeyValueStore,
        index: usize,
    ) -> Result<SearchProvider, ProviderError> {
        if index >= self.providers.len() {
            return Err(ProviderError::NoSuchProvider(index));
        }
        if self.providers.len() == 1 {
            return Err(ProviderError::LastProvider);
        }

        let removed = self.providers.remove(index);
        if self.current >= self.providers.len() {
            self.current = 0;
        }
        log::info!("[Search] Removed provider '{}'", removed.name);
        self.save(store);
        Ok(removed)
    }
}
