//! US Census ACS 5-year lookups keyed by ZIP Code Tabulation Area.
//!
//! The API answers with a JSON table: a header row of variable names followed
//! by one row of string cells per ZCTA. Suppressed estimates come back as
//! large negative sentinels and are read as missing.

pub mod error;

pub use error::{CensusError, Result};

use serde::{Deserialize, Serialize};

const BASE_URL: &str = "https://api.census.gov/data";
const DEFAULT_VINTAGE: &str = "2022";

const VAR_NAME: &str = "NAME";
const VAR_POPULATION: &str = "B01001_001E";
const VAR_MEDIAN_INCOME: &str = "B19013_001E";
const VAR_WHITE: &str = "B02001_002E";
const VAR_BLACK: &str = "B02001_003E";
const GEO_ZCTA: &str = "zip code tabulation area";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZctaProfile {
    pub zcta: String,
    pub name: String,
    pub population: Option<i64>,
    pub median_income: Option<i64>,
    pub white: Option<i64>,
    pub black: Option<i64>,
}

impl ZctaProfile {
    /// One prompt-ready line, e.g. `ZCTA5 90210: Pop 21134, Income $154740, White: 17000, Black: 450`.
    pub fn summary_line(&self) -> String {
        format!(
            "{}: Pop {}, Income ${}, White: {}, Black: {}",
            self.name,
            display(self.population),
            display(self.median_income),
            display(self.white),
            display(self.black),
        )
    }
}

fn display(value: Option<i64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

pub struct CensusClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    vintage: String,
}

impl CensusClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_key)
    }

    pub fn with_client(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            vintage: DEFAULT_VINTAGE.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_vintage(mut self, year: &str) -> Self {
        self.vintage = year.to_string();
        self
    }

    /// Fetch profiles for every ZCTA in one request. Unknown ZCTAs are simply absent.
    pub async fn zcta_profiles(&self, zips: &[String]) -> Result<Vec<ZctaProfile>> {
        if zips.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/{}/acs/acs5", self.base_url, self.vintage);
        let get = [VAR_NAME, VAR_POPULATION, VAR_MEDIAN_INCOME, VAR_WHITE, VAR_BLACK].join(",");
        let geo = format!("{GEO_ZCTA}:{}", zips.join(","));

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("get", get.as_str()),
                ("for", geo.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        // 204 is how the API says "no rows for that geography".
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(CensusError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        let profiles = decode_table(&text)?;
        tracing::debug!(requested = zips.len(), found = profiles.len(), "Census profiles fetched");
        Ok(profiles)
    }
}

/// Decode the header-plus-rows table the ACS endpoint returns.
pub fn decode_table(json: &str) -> Result<Vec<ZctaProfile>> {
    let rows: Vec<Vec<Option<String>>> = serde_json::from_str(json)?;
    let mut rows = rows.into_iter();
    let header = rows
        .next()
        .ok_or_else(|| CensusError::Parse("empty census table".into()))?;

    let column = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| h.as_deref() == Some(name))
            .ok_or_else(|| CensusError::Parse(format!("missing column {name}")))
    };
    let name_idx = column(VAR_NAME)?;
    let pop_idx = column(VAR_POPULATION)?;
    let income_idx = column(VAR_MEDIAN_INCOME)?;
    let white_idx = column(VAR_WHITE)?;
    let black_idx = column(VAR_BLACK)?;
    let zcta_idx = column(GEO_ZCTA)?;

    let cell = |row: &[Option<String>], idx: usize| -> Option<String> {
        row.get(idx).cloned().flatten()
    };

    Ok(rows
        .map(|row| ZctaProfile {
            zcta: cell(&row[..], zcta_idx).unwrap_or_default(),
            name: cell(&row[..], name_idx).unwrap_or_default(),
            population: estimate(cell(&row[..], pop_idx)),
            median_income: estimate(cell(&row[..], income_idx)),
            white: estimate(cell(&row[..], white_idx)),
            black: estimate(cell(&row[..], black_idx)),
        })
        .collect())
}

/// Parse an estimate cell, mapping suppression sentinels (negative values) to `None`.
fn estimate(cell: Option<String>) -> Option<i64> {
    cell.and_then(|c| c.trim().parse::<i64>().ok())
        .filter(|v| *v >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"[
        ["NAME","B01001_001E","B19013_001E","B02001_002E","B02001_003E","zip code tabulation area"],
        ["ZCTA5 90210","21134","154740","17012","452","90210"],
        ["ZCTA5 10001","27004","-666666666","14501",null,"10001"]
    ]"#;

    #[test]
    fn rows_map_by_header_position() {
        let profiles = decode_table(TABLE).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].zcta, "90210");
        assert_eq!(profiles[0].population, Some(21134));
        assert_eq!(profiles[0].median_income, Some(154740));
    }

    #[test]
    fn sentinels_and_nulls_become_missing() {
        let profiles = decode_table(TABLE).unwrap();
        assert_eq!(profiles[1].median_income, None);
        assert_eq!(profiles[1].black, None);
        assert_eq!(profiles[1].white, Some(14501));
    }

    #[test]
    fn summary_line_matches_prompt_format() {
        let profiles = decode_table(TABLE).unwrap();
        assert_eq!(
            profiles[0].summary_line(),
            "ZCTA5 90210: Pop 21134, Income $154740, White: 17012, Black: 452"
        );
        assert_eq!(
            profiles[1].summary_line(),
            "ZCTA5 10001: Pop 27004, Income $N/A, White: 14501, Black: N/A"
        );
    }

    #[test]
    fn header_without_geography_column_is_a_parse_error() {
        let err = decode_table(r#"[["NAME","B01001_001E"]]"#).unwrap_err();
        assert!(matches!(err, CensusError::Parse(_)));
    }

    #[test]
    fn empty_table_is_a_parse_error() {
        assert!(decode_table("[]").is_err());
    }
}
