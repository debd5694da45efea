// Icon fallback chain - pure logic.
//
// Tiles show a site icon picked from a fixed list of sources. The first
// source that loads wins; the webview reports each load failure and we hand
// back the next candidate.

use url::Url;

/// Neutral globe icon used when a URL can't be resolved and for
/// browser-internal pages.
pub const DEFAULT_ICON: &str = "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHdpZHRoPSIyNCIgaGVpZ2h0PSIyNCIgdmlld0JveD0iMCAwIDI0IDI0IiBmaWxsPSJub25lIiBzdHJva2U9ImN1cnJlbnRDb2xvciIgc3Ryb2tlLXdpZHRoPSIyIiBzdHJva2UtbGluZWNhcD0icm91bmQiIHN0cm9rZS1saW5lam9pbj0icm91bmQiPjxjaXJjbGUgY3g9IjEyIiBjeT0iMTIiIHI9IjEwIj48L2NpcmNsZT48bGluZSB4MT0iMiIgeTE9IjEyIiB4Mj0iMjIiIHkyPSIxMiI+PC9saW5lPjxwYXRoIGQ9Ik0xMiAyYTE1LjMgMTUuMyAwIDAgMSA0IDEwIDE1LjMgMTUuMyAwIDAgMS00IDEwIDE1LjMgMTUuMyAwIDAgMS00LTEwIDE1LjMgMTUuMyAwIDAgMSA0LTEweiI+PC9wYXRoPjwvc3ZnPg==";

const INTERNAL_SCHEMES: [&str; 4] = ["chrome:", "brave:", "edge:", "firefox:"];

/// Host of `url` without its first `www.`. Bare domains are read as https.
pub fn domain_from_url(url: &str) -> Option<String> {
    let url = url.trim();
    let candidate = if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    let parsed = Url::parse(&candidate).ok()?;
    let host = parsed.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(host.replacen("www.", "", 1))
}

/// Pages like `chrome://settings` have no fetchable icon.
pub fn is_internal_url(url: &str) -> bool {
    INTERNAL_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
}

/// Candidate icon URLs for `url`, best source first.
pub fn resolve(url: &str) -> Option<Vec<String>> {
    let domain = domain_from_url(url)?;
    let clean: String = domain
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    Some(vec![
        format!("https://logo.clearbit.com/{}", domain),
        format!(
            "https://cdn.jsdelivr.net/gh/edent/SuperTinyIcons/images/svg/{}.svg",
            clean
        ),
        format!("https://cdn.simpleicons.org/{}", clean),
        format!("https://{}/favicon.ico", domain),
        format!("https://www.google.com/s2/favicons?domain={}&sz=128", domain),
        format!("https://www.google.com/s2/favicons?domain={}", domain),
    ])
}

/// Best icon for a bare domain; used to pre-fill icon fields.
pub fn favicon_url(domain: &str) -> Option<String> {
    resolve(&format!("https://{}", domain)).and_then(|candidates| candidates.into_iter().next())
}

/// Anything that displays an image from a source URL.
pub trait IconImage {
    fn set_source(&mut self, src: &str);
    fn set_alt(&mut self, alt: &str);
}

/// Per-image cursor over the candidate list. Walks forward only; once the
/// last candidate has failed it stays put until `attach` is called again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconFallback {
    candidates: Vec<String>,
    index: usize,
}

impl IconFallback {
    /// Points `image` at the first candidate for `url`. Unresolvable and
    /// browser-internal URLs get [`DEFAULT_ICON`] and an empty chain.
    pub fn attach(image: &mut dyn IconImage, url: &str, alt: &str) -> Self {
        image.set_alt(alt);

        let candidates = if is_internal_url(url) {
            Vec::new()
        } else {
            resolve(url).unwrap_or_default()
        };

        match candidates.first() {
            Some(first) => image.set_source(first),
            None => image.set_source(DEFAULT_ICON),
        }

        Self {
            candidates,
            index: 0,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.candidates.get(self.index).map(String::as_str)
    }

    pub fn is_exhausted(&self) -> bool {
        self.index + 1 >= self.candidates.len()
    }

    /// Load failure on the current source. Moves `image` to the next
    /// candidate and returns true, or returns false when none are left.
    pub fn on_error(&mut self, image: &mut dyn IconImage) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.index += 1;
        image.set_source(&self.candidates[self.index]);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Default)]
    struct RecordingImage {
        sources: Vec<String>,
        alt: String,
    }

    impl IconImage for RecordingImage {
        fn set_source(&mut self, src: &str) {
            self.sources.push(src.to_string());
        }

        fn set_alt(&mut self, alt: &str) {
            self.alt = alt.to_string();
        }
    }

    #[rstest]
    #[case("https://www.github.com/rust-lang", Some("github.com"))]
    #[case("http://news.ycombinator.com", Some("news.ycombinator.com"))]
    #[case("docs.rs/serde", Some("docs.rs"))]
    #[case("https://Example.COM/x", Some("example.com"))]
    #[case("", None)]
    #[case("not a url", None)]
    fn test_domain_from_url(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(domain_from_url(input).as_deref(), expected);
    }

    #[test]
    fn test_resolve_priority() {
        let candidates = resolve("https://www.my-site.io/page").unwrap();
        assert_eq!(
            candidates,
            vec![
                "https://logo.clearbit.com/my-site.io",
                "https://cdn.jsdelivr.net/gh/edent/SuperTinyIcons/images/svg/mysiteio.svg",
                "https://cdn.simpleicons.org/mysiteio",
                "https://my-site.io/favicon.ico",
                "https://www.google.com/s2/favicons?domain=my-site.io&sz=128",
                "https://www.google.com/s2/favicons?domain=my-site.io",
            ]
        );
    }

    #[test]
    fn test_resolve_malformed() {
        assert_eq!(resolve("http://"), None);
        assert_eq!(favicon_url(""), None);
    }

    #[test]
    fn test_favicon_url() {
        assert_eq!(
            favicon_url("duckduckgo.com").as_deref(),
            Some("https://logo.clearbit.com/duckduckgo.com")
        );
    }

    #[test]
    fn test_fallback_walks_to_last_candidate_then_stops() {
        let mut image = RecordingImage::default();
        let mut fallback = IconFallback::attach(&mut image, "https://example.com", "Example icon");
        assert_eq!(image.alt, "Example icon");
        assert_eq!(fallback.current(), Some("https://logo.clearbit.com/example.com"));

        for _ in 0..5 {
            assert!(fallback.on_error(&mut image));
        }
        assert_eq!(
            image.sources.last().map(String::as_str),
            Some("https://www.google.com/s2/favicons?domain=example.com")
        );
        assert!(fallback.is_exhausted());

        assert!(!fallback.on_error(&mut image));
        assert!(!fallback.on_error(&mut image));
        assert_eq!(image.sources.len(), 6);
    }

    #[test]
    fn test_attach_again_restarts_chain() {
        let mut image = RecordingImage::default();
        let mut fallback = IconFallback::attach(&mut image, "example.com", "icon");
        while fallback.on_error(&mut image) {}

        let fallback = IconFallback::attach(&mut image, "example.com", "icon");
        assert_eq!(fallback.current(), Some("https://logo.clearbit.com/example.com"));
        assert_eq!(image.sources.len(), 7);
    }

    #[rstest]
    #[case("chrome://extensions")]
    #[case("http://")]
    fn test_default_icon(#[case] url: &str) {
        let mut image = RecordingImage::default();
        let mut fallback = IconFallback::attach(&mut image, url, "icon");
        assert_eq!(image.sources, vec![DEFAULT_ICON.to_string()]);
        assert_eq!(fallback.current(), None);
        assert!(!fallback.on_error(&mut image));
    }
}
