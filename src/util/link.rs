use thiserror::Error;
use url::Url;

/// Errors that can occur during link validation.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Validates a provider-supplied URL before it is written into markup.
///
/// Article links, thumbnails and source icons come from a third party.
/// Rejecting everything but `http`/`https` keeps `javascript:` and `data:`
/// targets out of rendered pages.
///
/// # Examples
///
/// ```
/// use matome::util::validate_link;
///
/// let url = validate_link("https://example.com/a?b=1").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_link("javascript:alert(1)").is_err());
/// assert!(validate_link("not a url").is_err());
/// ```
pub fn validate_link(url_str: &str) -> Result<Url, LinkError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(LinkError::UnsupportedScheme(scheme.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_links() {
        assert!(validate_link("https://example.com/news/1").is_ok());
        assert!(validate_link("http://x").is_ok());
        assert!(validate_link("  https://example.com  ").is_ok());
    }

    #[test]
    fn test_script_schemes_rejected() {
        assert!(matches!(
            validate_link("javascript:alert(1)"),
            Err(LinkError::UnsupportedScheme(_))
        ));
        assert!(validate_link("data:text/html,<script>").is_err());
        assert!(validate_link("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_relative_rejected() {
        assert!(matches!(
            validate_link("/articles/1"),
            Err(LinkError::InvalidUrl(_))
        ));
    }
}
