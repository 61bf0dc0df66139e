use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of title in the external catalog.
///
/// Serialized with the catalog's names (`"movie"` / `"tv"`), which is also what the
/// embedded player writes into its progress snapshots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ParseIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" | "m" => Ok(MediaKind::Movie),
            "tv" | "t" | "series" | "show" => Ok(MediaKind::Series),
            other => Err(ParseIdentityError::UnknownKind(other.to_string())),
        }
    }
}

/// Identity of a title: `(kind, catalog id)`.
///
/// This is the join key between the progress store and the watchlist store.
/// The textual form is `movie-550` / `tv-1399`; parsing also accepts `:` or `/`
/// as separator and the compact `m550` / `t1399` form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaIdentity {
    pub kind: MediaKind,
    pub id: u64,
}

impl MediaIdentity {
    pub fn new(kind: MediaKind, id: u64) -> Self {
        Self { kind, id }
    }

    pub fn movie(id: u64) -> Self {
        Self::new(MediaKind::Movie, id)
    }

    pub fn series(id: u64) -> Self {
        Self::new(MediaKind::Series, id)
    }

    pub fn is_series(&self) -> bool {
        self.kind == MediaKind::Series
    }
}

impl fmt::Display for MediaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIdentityError {
    #[error("unknown media kind '{0}' (expected 'movie' or 'tv')")]
    UnknownKind(String),
    #[error("invalid media id '{0}'")]
    InvalidId(String),
}

impl FromStr for MediaIdentity {
    type Err = ParseIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, id) = match s.find(|c: char| c == '-' || c == ':' || c == '/') {
            Some(pos) => (&s[..pos], &s[pos + 1..]),
            // Compact form: m550 / t1399
            None => {
                let split = s
                    .find(|c: char| c.is_ascii_digit())
                    .ok_or_else(|| ParseIdentityError::InvalidId(s.to_string()))?;
                (&s[..split], &s[split..])
            }
        };

        let kind: MediaKind = kind.parse()?;
        let id = id
            .trim()
            .parse::<u64>()
            .map_err(|_| ParseIdentityError::InvalidId(id.to_string()))?;
        Ok(Self { kind, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        assert_eq!(MediaIdentity::movie(550).to_string(), "movie-550");
        assert_eq!(MediaIdentity::series(1399).to_string(), "tv-1399");
    }

    #[test]
    fn test_identity_parse_forms() {
        assert_eq!("movie-550".parse::<MediaIdentity>().unwrap(), MediaIdentity::movie(550));
        assert_eq!("tv:1399".parse::<MediaIdentity>().unwrap(), MediaIdentity::series(1399));
        assert_eq!("series/7".parse::<MediaIdentity>().unwrap(), MediaIdentity::series(7));
        assert_eq!("m550".parse::<MediaIdentity>().unwrap(), MediaIdentity::movie(550));
        assert_eq!("t1399".parse::<MediaIdentity>().unwrap(), MediaIdentity::series(1399));
    }

    #[test]
    fn test_identity_parse_errors() {
        assert!(matches!(
            "book-1".parse::<MediaIdentity>(),
            Err(ParseIdentityError::UnknownKind(_))
        ));
        assert!(matches!(
            "movie-abc".parse::<MediaIdentity>(),
            Err(ParseIdentityError::InvalidId(_))
        ));
        assert!("movie".parse::<MediaIdentity>().is_err());
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(serde_json::to_string(&MediaKind::Movie).unwrap(), "\"movie\"");
        assert_eq!(serde_json::to_string(&MediaKind::Series).unwrap(), "\"tv\"");
        let kind: MediaKind = serde_json::from_str("\"tv\"").unwrap();
        assert_eq!(kind, MediaKind::Series);
    }
}
