//! Error types for locator handling

/// Errors from locator intake and rule construction
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    /// Base URL for relative locators is not absolute
    #[error("invalid base url '{base}': {source}")]
    InvalidBase {
        /// Base as given
        base: String,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },

    /// Relative locator could not be joined onto the base
    #[error("cannot resolve '{locator}' against base: {source}")]
    Join {
        /// Relative locator as given
        locator: String,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },

    /// Unwrap rule pattern failed to compile
    #[error("invalid pattern for rule {rule}: {source}")]
    Pattern {
        /// Rule name
        rule: String,
        /// Regex compile failure
        #[source]
        source: regex::Error,
    },
}
