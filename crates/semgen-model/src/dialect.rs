//! Expression dialects
//!
//! OSI expressions carry one entry per SQL flavour. The set of flavours is
//! closed; anything else is preserved verbatim in [`Dialect::Other`] so the
//! validator can report it instead of silently dropping it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// SQL flavour an expression targets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Portable ANSI SQL
    AnsiSql,
    /// Snowflake SQL
    Snowflake,
    /// Multidimensional expressions
    Mdx,
    /// Tableau calculated fields
    Tableau,
    /// Databricks SQL
    Databricks,
    /// Any dialect outside the OSI enumeration
    Other(String),
}

impl Dialect {
    /// All dialects defined by OSI, in wire order
    pub const KNOWN: [Dialect; 5] = [
        Dialect::AnsiSql,
        Dialect::Snowflake,
        Dialect::Mdx,
        Dialect::Tableau,
        Dialect::Databricks,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Dialect::AnsiSql => "ANSI_SQL",
            Dialect::Snowflake => "SNOWFLAKE",
            Dialect::Mdx => "MDX",
            Dialect::Tableau => "TABLEAU",
            Dialect::Databricks => "DATABRICKS",
            Dialect::Other(name) => name,
        }
    }

    /// Whether the dialect is part of the OSI enumeration
    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Dialect::Other(_))
    }

    /// Comma separated list of the known wire names
    #[must_use]
    pub fn known_names() -> String {
        Self::KNOWN
            .iter()
            .map(Dialect::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Dialect {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Ok(match normalized.as_str() {
            "ANSI_SQL" => Dialect::AnsiSql,
            "SNOWFLAKE" => Dialect::Snowflake,
            "MDX" => Dialect::Mdx,
            "TABLEAU" => Dialect::Tableau,
            "DATABRICKS" => Dialect::Databricks,
            _ => Dialect::Other(s.to_string()),
        })
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Dialect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Dialect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        // Infallible: unknown names become Dialect::Other
        Ok(raw.parse().unwrap_or_else(|never: Infallible| match never {}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_dialects_case_insensitively() {
        assert_eq!("ansi_sql".parse::<Dialect>().unwrap(), Dialect::AnsiSql);
        assert_eq!("Snowflake".parse::<Dialect>().unwrap(), Dialect::Snowflake);
        assert_eq!("ansi-sql".parse::<Dialect>().unwrap(), Dialect::AnsiSql);
        assert_eq!(" MDX ".parse::<Dialect>().unwrap(), Dialect::Mdx);
    }

    #[test]
    fn unknown_dialect_is_preserved() {
        let dialect: Dialect = "POSTGRES".parse().unwrap();
        assert_eq!(dialect, Dialect::Other("POSTGRES".to_string()));
        assert!(!dialect.is_known());
        assert_eq!(dialect.to_string(), "POSTGRES");
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Dialect::Databricks).unwrap();
        assert_eq!(json, "\"DATABRICKS\"");

        let parsed: Dialect = serde_json::from_str("\"tableau\"").unwrap();
        assert_eq!(parsed, Dialect::Tableau);

        let other: Dialect = serde_json::from_str("\"BIGQUERY\"").unwrap();
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"BIGQUERY\"");
    }

    #[test]
    fn known_names_lists_all() {
        assert_eq!(
            Dialect::known_names(),
            "ANSI_SQL, SNOWFLAKE, MDX, TABLEAU, DATABRICKS"
        );
    }
}
