//! Schema-scoped connection targets.
//!
//! A [`ScopedTarget`] pairs a base connection URL with a worker schema and
//! knows how to render the connection string that external tools need to
//! land inside that schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use super::schema::SchemaName;
use crate::config::ConfigError;

/// Query parameter used by [`SchemaSelector::default`].
pub const DEFAULT_SCHEMA_PARAM: &str = "schema";

/// How the schema is encoded into the connection string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSelector {
    /// `?<name>=<schema>`, the convention understood by ORM-style migration
    /// tools (`?schema=test_schema_2`).
    QueryParam(String),
    /// `?options=-c search_path=<schema>`, understood by libpq and `sqlx`.
    SearchPath,
}

impl Default for SchemaSelector {
    fn default() -> Self {
        Self::QueryParam(DEFAULT_SCHEMA_PARAM.to_string())
    }
}

impl FromStr for SchemaSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "search-path" | "search_path" | "options" => Ok(Self::SearchPath),
            "" => Err(ConfigError::InvalidSelector(s.to_string())),
            param if param.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') => {
                Ok(Self::QueryParam(param.to_string()))
            }
            other => Err(ConfigError::InvalidSelector(other.to_string())),
        }
    }
}

impl fmt::Display for SchemaSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryParam(param) => f.write_str(param),
            Self::SearchPath => f.write_str("search-path"),
        }
    }
}

/// Connection target confined to one worker schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedTarget {
    base: Url,
    schema: SchemaName,
    selector: SchemaSelector,
}

impl ScopedTarget {
    /// Build a target from an already validated base URL.
    pub const fn new(base: Url, schema: SchemaName, selector: SchemaSelector) -> Self {
        Self {
            base,
            schema,
            selector,
        }
    }

    /// Parse `base` and build a target from it.
    pub fn parse(
        base: &str,
        schema: SchemaName,
        selector: SchemaSelector,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_base_url(base)?, schema, selector))
    }

    /// The schema this target is confined to.
    pub const fn schema(&self) -> &SchemaName {
        &self.schema
    }

    /// The selector used when rendering [`ScopedTarget::url`].
    pub const fn selector(&self) -> &SchemaSelector {
        &self.selector
    }

    /// The base URL, without any schema selector.
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Render the schema-scoped connection string.
    ///
    /// Spaces are written as `%20`: libpq decodes `%XX` in URIs but passes
    /// `+` through literally. An existing parameter with the selector's name is replaced rather than
    /// duplicated. For [`SchemaSelector::SearchPath`] any existing `options`
    /// value is kept and the `search_path` setting is appended to it.
    pub fn url(&self) -> String {
        let mut url = self.base.clone();

        let (key, value) = match &self.selector {
            SchemaSelector::QueryParam(param) => (param.as_str(), self.schema.to_string()),
            SchemaSelector::SearchPath => {
                let setting = format!("-c search_path={}", self.schema);
                let existing = url
                    .query_pairs()
                    .find(|(k, _)| k == "options")
                    .map(|(_, v)| v.into_owned())
                    .filter(|v| !v.trim().is_empty());
                let value = match existing {
                    Some(prev) => format!("{prev} {setting}"),
                    None => setting,
                };
                ("options", value)
            }
        };

        let mut pairs: Vec<String> = url
            .query_pairs()
            .filter(|(k, _)| k != key)
            .map(|(k, v)| format!("{}={}", uri_encode(&k), uri_encode(&v)))
            .collect();
        pairs.push(format!("{}={}", uri_encode(key), uri_encode(&value)));

        url.set_query(Some(&pairs.join("&")));
        url.to_string()
    }

    /// [`ScopedTarget::url`] with the password masked, for logs.
    pub fn redacted(&self) -> String {
        redact(&self.url())
    }
}

/// Percent-encode a query component the way libpq decodes it.
fn uri_encode(raw: &str) -> String {
    // byte_serialize writes ' ' as '+' and a literal '+' as "%2B".
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl fmt::Display for ScopedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Parse and sanity-check a base connection URL.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidDatabaseUrl {
        value: redact(raw),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "postgres" | "postgresql" => Ok(url),
        other => Err(ConfigError::InvalidDatabaseUrl {
            value: redact(raw),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Mask the password component of a connection URL.
pub fn redact(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => "<unparseable url>".to_string(),
    }
}
