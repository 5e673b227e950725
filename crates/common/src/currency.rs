use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Currencies a bill can be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
    /// Georgian lari.
    Gel,
}

/// Returned when a currency code is not one of the supported codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported currency '{0}'")]
pub struct UnsupportedCurrency(pub String);

impl Currency {
    /// Every supported currency, in display order.
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Gel];

    /// Parses a currency code case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, UnsupportedCurrency> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GEL" => Ok(Currency::Gel),
            _ => Err(UnsupportedCurrency(raw.to_string())),
        }
    }

    /// Returns the ISO code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gel => "GEL",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = UnsupportedCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Currency::parse("usd").unwrap(), Currency::Usd);
        assert_eq!(Currency::parse("Eur").unwrap(), Currency::Eur);
        assert_eq!(Currency::parse("GEL").unwrap(), Currency::Gel);
    }

    #[test]
    fn parse_rejects_unknown_codes() {
        let err = Currency::parse("JPY").unwrap_err();
        assert_eq!(err.to_string(), "unsupported currency 'JPY'");
        assert!(Currency::parse("").is_err());
    }

    #[test]
    fn display_uses_iso_code() {
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(Currency::Gel.to_string(), "GEL");
    }

    #[test]
    fn serializes_as_iso_code() {
        assert_eq!(serde_json::to_string(&Currency::Eur).unwrap(), "\"EUR\"");
        let parsed: Currency = serde_json::from_str("\"GEL\"").unwrap();
        assert_eq!(parsed, Currency::Gel);
    }
}
