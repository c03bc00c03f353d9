use serde::{Deserialize, Serialize};

use matador_common::{
    CompetitorMode, ManualCompetitor, PersonaMode, ServiceStyle, ValidationError,
};

pub const MIN_ZIP_CODES: usize = 1;
pub const MAX_ZIP_CODES: usize = 5;
pub const MAX_MANUAL_COMPETITORS: usize = 3;

/// Raw form input, as typed into the CLI or posted to the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportForm {
    /// Comma-separated ZIP codes.
    pub zip_codes: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub service_styles: Vec<String>,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub competitor_mode: CompetitorMode,
    #[serde(default)]
    pub manual_competitors: Vec<ManualCompetitor>,
    #[serde(default)]
    pub persona_mode: PersonaMode,
    /// Drop auto-discovered competitors whose style isn't selected.
    #[serde(default)]
    pub filter_by_style: bool,
}

/// Validated input for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub zip_codes: Vec<String>,
    pub notes: String,
    pub service_styles: Vec<ServiceStyle>,
    pub cuisines: Vec<String>,
    pub competitor_mode: CompetitorMode,
    pub manual_competitors: Vec<ManualCompetitor>,
    pub persona_mode: PersonaMode,
    pub filter_by_style: bool,
}

impl ReportRequest {
    pub fn from_form(form: ReportForm) -> Result<Self, ValidationError> {
        let zip_codes = parse_zip_codes(&form.zip_codes);
        if !(MIN_ZIP_CODES..=MAX_ZIP_CODES).contains(&zip_codes.len()) {
            return Err(ValidationError::ZipCount(zip_codes.len()));
        }

        let mut service_styles = Vec::new();
        for raw in form.service_styles.iter().filter(|s| !s.trim().is_empty()) {
            let style: ServiceStyle = raw.parse()?;
            if !service_styles.contains(&style) {
                service_styles.push(style);
            }
        }

        let cuisines = form
            .cuisines
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();

        // Blank rows in the manual form are ignored, like unfilled inputs.
        let manual_competitors: Vec<ManualCompetitor> = form
            .manual_competitors
            .into_iter()
            .map(|m| ManualCompetitor {
                name: m.name.trim().to_string(),
                website: m.website.trim().to_string(),
            })
            .filter(|m| !m.name.is_empty())
            .collect();
        if manual_competitors.len() > MAX_MANUAL_COMPETITORS {
            return Err(ValidationError::TooManyManualCompetitors(
                manual_competitors.len(),
            ));
        }

        Ok(Self {
            zip_codes,
            notes: form.notes.trim().to_string(),
            service_styles,
            cuisines,
            competitor_mode: form.competitor_mode,
            manual_competitors,
            persona_mode: form.persona_mode,
            filter_by_style: form.filter_by_style,
        })
    }
}

/// Split comma-separated input into trimmed, non-empty ZIP codes, in order.
pub fn parse_zip_codes(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|z| !z.is_empty())
        .map(String::from)
        .collect()
}
