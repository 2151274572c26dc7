use serde::Deserialize;

/// W3C element identifier key inside element reply objects.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// WebDriver key codepoints used by the adapters.
pub mod keys {
    pub const ENTER: &str = "\u{E007}";
    pub const ESCAPE: &str = "\u{E00C}";
}

/// Element location strategy. Text-dependent lookups use XPath since the
/// wire protocol has no text pseudo-selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(value: impl Into<String>) -> Self {
        Locator::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Locator::XPath(value.into())
    }

    /// XPath matching `css_class`-bearing elements whose text contains
    /// `needle`. Used for toast/banner probes.
    pub fn class_containing_text(css_class: &str, needle: &str) -> Self {
        Locator::XPath(format!(
            "//*[contains(@class, '{css_class}') and contains(., '{needle}')]"
        ))
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Locator::Css(_) => "css selector",
            Locator::XPath(_) => "xpath",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Locator::Css(v) | Locator::XPath(v) => v,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

/// Every WebDriver reply wraps its payload in `{"value": ...}`.
#[derive(Debug, Deserialize)]
pub struct Reply<T> {
    pub value: T,
}

/// Error payload carried in the `value` of a non-2xx reply.
#[derive(Debug, Deserialize)]
pub struct WireError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct NewSessionValue {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusValue {
    #[serde(default)]
    pub ready: bool,
}
