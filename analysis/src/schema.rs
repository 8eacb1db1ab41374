use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self, Display};

// Rankings
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Week(String);

impl Week {
    pub fn new(label: impl Into<String>) -> Self {
        Week(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Week {
    fn from(label: &str) -> Self {
        Week(label.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub country: String,
    pub week: Week,
    pub rank: u32,
    pub track_name: String,
    pub artist_names: String,
    pub streams: f64,
}

// Country codes, in the format of the ISO-3166 `all.json` reference.
#[derive(Clone, Debug, Deserialize)]
pub struct CountryCodeEntry {
    pub name: String,
    #[serde(rename = "alpha-3")]
    pub alpha_3: String,
    #[serde(rename = "country-code", deserialize_with = "numeric_code")]
    pub country_code: u16,
}

// Helpers
/// Parses zero-padded numeric codes such as `"056"`.
fn numeric_code<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumericCode;

    impl Visitor<'_> for NumericCode {
        type Value = u16;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("numeric country code, as a string or an integer")
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            s.trim()
                .parse()
                .map_err(|e| de::Error::custom(format!("Invalid country code {s:?}: {e}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u16::try_from(v).map_err(|_| de::Error::custom(format!("Country code too large: {v}")))
        }
    }

    deserializer.deserialize_any(NumericCode)
}
