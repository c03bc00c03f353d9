use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// --- Service styles ---

/// Restaurant format, used both as a search keyword and as a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ServiceStyle {
    FullService,
    FineDining,
    FastCasual,
    QuickService,
    Cafe,
    Bakery,
    BarPub,
    Buffet,
    FoodTruck,
}

impl ServiceStyle {
    pub const ALL: [ServiceStyle; 9] = [
        ServiceStyle::FullService,
        ServiceStyle::FineDining,
        ServiceStyle::FastCasual,
        ServiceStyle::QuickService,
        ServiceStyle::Cafe,
        ServiceStyle::Bakery,
        ServiceStyle::BarPub,
        ServiceStyle::Buffet,
        ServiceStyle::FoodTruck,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ServiceStyle::FullService => "Full Service",
            ServiceStyle::FineDining => "Fine Dining",
            ServiceStyle::FastCasual => "Fast Casual",
            ServiceStyle::QuickService => "Quick Service",
            ServiceStyle::Cafe => "Café",
            ServiceStyle::Bakery => "Bakery",
            ServiceStyle::BarPub => "Bar / Pub",
            ServiceStyle::Buffet => "Buffet",
            ServiceStyle::FoodTruck => "Food Truck",
        }
    }

    /// Term sent to the places keyword search.
    pub fn search_keyword(self) -> &'static str {
        match self {
            ServiceStyle::BarPub => "Bar",
            other => other.label(),
        }
    }

    /// Directory place types that indicate this style.
    pub fn place_types(self) -> &'static [&'static str] {
        match self {
            ServiceStyle::FullService => &["restaurant", "casual_dining", "fine_dining"],
            ServiceStyle::FineDining => &["fine_dining"],
            ServiceStyle::FastCasual => &["meal_takeaway", "restaurant"],
            ServiceStyle::QuickService => &["fast_food", "meal_takeaway"],
            ServiceStyle::Cafe => &["cafe", "coffee_shop"],
            ServiceStyle::Bakery => &["bakery"],
            ServiceStyle::BarPub => &["bar", "pub", "night_club"],
            ServiceStyle::Buffet => &["buffet"],
            ServiceStyle::FoodTruck => &["food_truck"],
        }
    }

    fn slug(self) -> &'static str {
        match self {
            ServiceStyle::FullService => "full-service",
            ServiceStyle::FineDining => "fine-dining",
            ServiceStyle::FastCasual => "fast-casual",
            ServiceStyle::QuickService => "quick-service",
            ServiceStyle::Cafe => "cafe",
            ServiceStyle::Bakery => "bakery",
            ServiceStyle::BarPub => "bar",
            ServiceStyle::Buffet => "buffet",
            ServiceStyle::FoodTruck => "food-truck",
        }
    }
}

impl fmt::Display for ServiceStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ServiceStyle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_key(s);
        let aliases = |style: ServiceStyle| -> Vec<String> {
            let mut keys = vec![
                normalize_key(style.label()),
                normalize_key(style.slug()),
                normalize_key(&format!("{style:?}")),
            ];
            match style {
                ServiceStyle::QuickService => {
                    keys.extend(["qsr", "quickserve", "quickserveqsr"].map(String::from))
                }
                ServiceStyle::Cafe => keys.extend(["coffeeshop", "cafecoffeeshop"].map(String::from)),
                ServiceStyle::BarPub => keys.push("pub".to_string()),
                _ => {}
            }
            keys
        };

        ServiceStyle::ALL
            .into_iter()
            .find(|style| aliases(*style).contains(&wanted))
            .ok_or_else(|| ValidationError::UnknownServiceStyle(s.trim().to_string()))
    }
}

impl TryFrom<String> for ServiceStyle {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceStyle> for String {
    fn from(style: ServiceStyle) -> Self {
        style.label().to_string()
    }
}

/// Lowercase, fold "é", drop everything but letters and digits.
fn normalize_key(s: &str) -> String {
    s.chars()
        .map(|c| if c == 'é' || c == 'É' { 'e' } else { c })
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Cuisine keywords offered by the report form.
pub const CUISINE_CATALOG: [&str; 35] = [
    "Mexican", "Chinese", "Japanese", "Italian", "Thai", "Vietnamese", "Indian", "American",
    "Korean", "Mediterranean", "Seafood", "Barbecue", "Vegan", "Vegetarian", "Burgers", "Pizza",
    "Coffee", "Bakery", "Sushi", "Middle Eastern", "Caribbean", "French", "Greek", "Soul Food",
    "Southern", "German", "Cuban", "Hawaiian", "Brazilian", "Spanish", "Turkish", "African",
    "Tapas", "Steakhouse", "Hot Pot",
];

// --- Competitors ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Classification {
    Style(ServiceStyle),
    Manual,
    Unknown,
}

impl Classification {
    pub fn style(self) -> Option<ServiceStyle> {
        match self {
            Classification::Style(style) => Some(style),
            _ => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Style(style) => f.write_str(style.label()),
            Classification::Manual => f.write_str("Manual"),
            Classification::Unknown => f.write_str("Unknown"),
        }
    }
}

impl TryFrom<String> for Classification {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "Manual" => Ok(Classification::Manual),
            "Unknown" => Ok(Classification::Unknown),
            other => other.parse().map(Classification::Style),
        }
    }
}

impl From<Classification> for String {
    fn from(c: Classification) -> Self {
        c.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitorSource {
    Auto,
    Manual,
}

/// One ranked competitor. Identity is `name`, exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub address: String,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub website: String,
    pub service_classification: Classification,
    pub source: CompetitorSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_analysis: Option<String>,
}

impl Competitor {
    /// A user-entered competitor: no rating, no reviews, classified `Manual`.
    pub fn manual(name: impl Into<String>, website: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: String::new(),
            rating: None,
            review_count: None,
            website: website.into(),
            service_classification: Classification::Manual,
            source: CompetitorSource::Manual,
            place_id: None,
            types: Vec::new(),
            price_level: None,
            brand_analysis: None,
        }
    }

    /// Popularity-weighted quality: `rating × review_count`, missing values as 0.
    pub fn score(&self) -> f64 {
        self.rating.unwrap_or(0.0) * f64::from(self.review_count.unwrap_or(0))
    }
}

/// Name/website pair typed into the manual competitor form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualCompetitor {
    pub name: String,
    #[serde(default)]
    pub website: String,
}

impl FromStr for ManualCompetitor {
    type Err = ValidationError;

    /// `"Name"` or `"Name=https://site"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, website) = match s.split_once('=') {
            Some((name, website)) => (name, website),
            None => (s, ""),
        };
        Ok(Self {
            name: name.trim().to_string(),
            website: website.trim().to_string(),
        })
    }
}

// --- Modes ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitorMode {
    #[default]
    Auto,
    Manual,
}

impl FromStr for CompetitorMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "automatic" | "places" => Ok(CompetitorMode::Auto),
            "manual" => Ok(CompetitorMode::Manual),
            other => Err(ValidationError::UnknownOption {
                field: "competitor mode",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaMode {
    /// One persona set for all ZIP codes together.
    #[default]
    Combined,
    /// One persona set per ZIP code.
    Individual,
}

impl FromStr for PersonaMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combined" | "cumulative" => Ok(PersonaMode::Combined),
            "individual" | "per-zip" => Ok(PersonaMode::Individual),
            other => Err(ValidationError::UnknownOption {
                field: "persona mode",
                value: other.to_string(),
            }),
        }
    }
}

// --- Reports ---

/// A persisted report. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub user_id: String,
    pub zip_codes: Vec<String>,
    pub notes: String,
    pub service_styles: Vec<String>,
    pub cuisines: Vec<String>,
    pub personas: String,
    pub competitors: String,
    pub whitespace: String,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_parse_from_labels_slugs_and_aliases() {
        assert_eq!("Café".parse::<ServiceStyle>().unwrap(), ServiceStyle::Cafe);
        assert_eq!("cafe".parse::<ServiceStyle>().unwrap(), ServiceStyle::Cafe);
        assert_eq!("Café / Coffee Shop".parse::<ServiceStyle>().unwrap(), ServiceStyle::Cafe);
        assert_eq!("Quick Serve (QSR)".parse::<ServiceStyle>().unwrap(), ServiceStyle::QuickService);
        assert_eq!("bar / pub".parse::<ServiceStyle>().unwrap(), ServiceStyle::BarPub);
        assert_eq!("FullService".parse::<ServiceStyle>().unwrap(), ServiceStyle::FullService);
        assert!("Drive-In".parse::<ServiceStyle>().is_err());
    }

    #[test]
    fn every_style_round_trips_through_its_label() {
        for style in ServiceStyle::ALL {
            assert_eq!(style.label().parse::<ServiceStyle>().unwrap(), style);
        }
    }

    #[test]
    fn classification_serializes_as_label() {
        let json = serde_json::to_string(&Classification::Style(ServiceStyle::FineDining)).unwrap();
        assert_eq!(json, "\"Fine Dining\"");
        let manual: Classification = serde_json::from_str("\"Manual\"").unwrap();
        assert_eq!(manual, Classification::Manual);
    }

    #[test]
    fn missing_rating_or_reviews_scores_zero() {
        let mut c = Competitor::manual("Joe's Diner", "");
        assert_eq!(c.score(), 0.0);
        c.rating = Some(5.0);
        assert_eq!(c.score(), 0.0);
        c.review_count = Some(10);
        assert_eq!(c.score(), 50.0);
    }

    #[test]
    fn manual_competitor_parses_name_and_site() {
        let m: ManualCompetitor = "Joe's Diner = https://joes.example".parse().unwrap();
        assert_eq!(m.name, "Joe's Diner");
        assert_eq!(m.website, "https://joes.example");
        let bare: ManualCompetitor = "Taco Stand".parse().unwrap();
        assert_eq!(bare.website, "");
    }

    #[test]
    fn modes_parse_original_form_labels() {
        assert_eq!("Cumulative".parse::<PersonaMode>().unwrap(), PersonaMode::Combined);
        assert_eq!("per-zip".parse::<PersonaMode>().unwrap(), PersonaMode::Individual);
        assert_eq!("manual".parse::<CompetitorMode>().unwrap(), CompetitorMode::Manual);
        assert!("sometimes".parse::<CompetitorMode>().is_err());
    }
}
