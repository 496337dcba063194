use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MxcParseError {
    #[error("not an mxc URI: {0}")]
    BadScheme(String),
    #[error("mxc URI missing server name or media id: {0}")]
    MissingPart(String),
}

/// A parsed `mxc://<server-name>/<media-id>` content URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxcUri {
    pub server_name: String,
    pub media_id: String,
}

impl MxcUri {
    pub fn parse(s: &str) -> Result<Self, MxcParseError> {
        let rest = s
            .strip_prefix("mxc://")
            .ok_or_else(|| MxcParseError::BadScheme(s.to_owned()))?;

        let (server_name, media_id) = rest
            .split_once('/')
            .ok_or_else(|| MxcParseError::MissingPart(s.to_owned()))?;

        if server_name.is_empty() || media_id.is_empty() || media_id.contains('/') {
            return Err(MxcParseError::MissingPart(s.to_owned()));
        }

        Ok(Self {
            server_name: server_name.to_owned(),
            media_id: media_id.to_owned(),
        })
    }
}

impl FromStr for MxcUri {
    type Err = MxcParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MxcUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mxc://{}/{}", self.server_name, self.media_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_uri() {
        let mxc = MxcUri::parse("mxc://matrix.example.org/abcDEF123").unwrap();
        assert_eq!(mxc.server_name, "matrix.example.org");
        assert_eq!(mxc.media_id, "abcDEF123");
        assert_eq!(mxc.to_string(), "mxc://matrix.example.org/abcDEF123");
    }

    #[test]
    fn rejects_wrong_scheme() {
        assert_eq!(
            MxcUri::parse("https://example.org/abc"),
            Err(MxcParseError::BadScheme("https://example.org/abc".into()))
        );
    }

    #[test]
    fn rejects_missing_parts() {
        assert!(MxcUri::parse("mxc://example.org").is_err());
        assert!(MxcUri::parse("mxc://example.org/").is_err());
        assert!(MxcUri::parse("mxc:///abc").is_err());
        assert!(MxcUri::parse("mxc://example.org/a/b").is_err());
    }

    #[test]
    fn round_trips_through_from_str() {
        let mxc: MxcUri = "mxc://example.org/xyz".parse().unwrap();
        assert_eq!(mxc.to_string().parse::<MxcUri>().unwrap(), mxc);
    }
}
