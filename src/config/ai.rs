// src/config/ai.rs

/// External AI search delegate. Unset URL means the feature is off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiSearchConfig {
    pub service_url: Option<String>,
}

impl AiSearchConfig {
    pub fn enabled(&self) -> bool {
        self.endpoint().is_some()
    }

    /// Usable endpoint: must look like an http(s) URL.
    pub fn endpoint(&self) -> Option<&str> {
        self.service_url
            .as_deref()
            .map(str::trim)
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_http_urls_enable_the_delegate() {
        assert!(!AiSearchConfig::default().enabled());
        let cfg = AiSearchConfig {
            service_url: Some("ftp://nope".into()),
        };
        assert!(!cfg.enabled());
        let cfg = AiSearchConfig {
            service_url: Some(" https://ai.test/search ".into()),
        };
        assert_eq!(cfg.endpoint(), Some("https://ai.test/search"));
    }
}
