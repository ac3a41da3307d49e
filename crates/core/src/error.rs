use thiserror::Error;

/// Maximum number of body bytes shown when displaying an [Error::Http].
const MAX_DISPLAYED_BODY_LENGTH: usize = 500;

/// Error enum for crate-specific errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The API token could not be resolved from the environment or from a
    /// config file field.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote API returned a non-success status.
    #[error("HTTP {status}: {}", truncate(.body))]
    Http {
        /// The response status code.
        status: u16,

        /// The response body.
        body: String,
    },

    /// [std::io::Error]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Something required was not found, e.g. a config file or an `"items"`
    /// link.
    #[error("not found: {0}")]
    NotFound(String),

    /// A response could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    /// [reqwest::Error]
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// [serde_json::Error]
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// [toml::de::Error]
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// [url::ParseError]
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_DISPLAYED_BODY_LENGTH {
        body.to_string()
    } else {
        let mut end = MAX_DISPLAYED_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... ({} bytes total)", &body[..end], body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn http_display_truncates_long_bodies() {
        let error = Error::Http {
            status: 500,
            body: "x".repeat(1000),
        };
        let message = error.to_string();
        assert!(message.starts_with("HTTP 500: xxx"));
        assert!(message.ends_with("(1000 bytes total)"));
    }

    #[test]
    fn http_display_keeps_short_bodies() {
        let error = Error::Http {
            status: 404,
            body: "not here".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP 404: not here");
    }
}
