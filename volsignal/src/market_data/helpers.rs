use chrono::{DateTime, NaiveDate};

pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;

    // CSV exports carry plain dates ("2024-01-02"), some tools append a time
    let date_part = s.trim().split(|c| c == ' ' || c == 'T').next().unwrap_or("");
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| serde::de::Error::custom(format!("Failed to parse date {:?}: {}", s, e)))
}

/// Empty cells and "null" become `None`; anything else must parse as a number.
pub fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    s.parse::<f64>().map(Some).map_err(serde::de::Error::custom)
}

/// Converts a unix timestamp in seconds to the UTC calendar date.
pub fn date_from_unix(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}
