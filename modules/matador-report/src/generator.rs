//! Report generation: one request-scoped context run through every stage in
//! order. Stages never fail the report; each upstream failure degrades the
//! part of the output it feeds.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use ai_client::OpenAi;
use census_client::{CensusClient, ZctaProfile};
use matador_common::{CompetitorMode, Competitor, Config, MatadorError, PersonaMode, Report};
use places_client::PlacesClient;

use crate::competitors;
use crate::fetcher::WebsiteTextFetcher;
use crate::personas::{parse_persona_blocks, PersonaBlock};
use crate::prompts::{demographic_summary, persona_prompt, whitespace_prompt, PERSONA_SYSTEM};
use crate::render;
use crate::request::{ReportForm, ReportRequest};
use crate::traits::{
    Demographics, Geocoder, LanguageModel, NoDemographics, OpenAiModels, PageFetcher,
    PlacesDirectory, Task,
};

/// Shared adapters for every generation.
#[derive(Clone, TypedBuilder)]
pub struct ReportDeps {
    pub geocoder: Arc<dyn Geocoder>,
    pub places: Arc<dyn PlacesDirectory>,
    #[builder(default = Arc::new(NoDemographics) as Arc<dyn Demographics>)]
    pub demographics: Arc<dyn Demographics>,
    pub pages: Arc<dyn PageFetcher>,
    pub llm: Arc<dyn LanguageModel>,
    /// Ask for schema-validated personas before falling back to free text.
    #[builder(default = true)]
    pub structured_personas: bool,
}

impl ReportDeps {
    /// Production adapters from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let places = Arc::new(PlacesClient::new(&config.google_api_key));
        let demographics: Arc<dyn Demographics> = match &config.census_api_key {
            Some(key) => Arc::new(CensusClient::new(key)),
            None => Arc::new(NoDemographics),
        };
        let persona = OpenAi::new(&config.openai_api_key, &config.persona_model);
        let brand = persona.with_model(&config.brand_model);

        Ok(Self::builder()
            .geocoder(places.clone())
            .places(places)
            .demographics(demographics)
            .pages(Arc::new(WebsiteTextFetcher::new()?))
            .llm(Arc::new(OpenAiModels::new(persona, brand)))
            .structured_personas(config.structured_personas)
            .build())
    }
}

/// Personas for all ZIPs together (`zip: None`) or for one ZIP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaSection {
    pub zip: Option<String>,
    pub blocks: Vec<PersonaBlock>,
    /// Inline failure text when the persona call itself failed.
    pub error: Option<String>,
}

/// Everything accumulated while one report is generated.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub request: ReportRequest,
    pub competitors: Vec<Competitor>,
    pub profiles: Vec<ZctaProfile>,
    pub persona_sections: Vec<PersonaSection>,
    /// Raw persona text across all sections, fed to the whitespace prompt.
    pub persona_text: String,
    pub whitespace: String,
}

impl GenerationContext {
    pub fn new(request: ReportRequest) -> Self {
        Self {
            request,
            competitors: Vec::new(),
            profiles: Vec::new(),
            persona_sections: Vec::new(),
            persona_text: String::new(),
            whitespace: String::new(),
        }
    }

    fn has_personas(&self) -> bool {
        self.persona_sections.iter().any(|s| !s.blocks.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panels {
    pub patrons: String,
    pub competition: String,
    pub whitespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    pub request: ReportRequest,
    pub personas: Vec<PersonaSection>,
    pub competitors: Vec<Competitor>,
    pub whitespace: String,
    pub panels: Panels,
    pub generated_at: DateTime<Utc>,
}

impl ReportOutput {
    /// Persisted form: request echo plus the three rendered panels.
    pub fn to_report(&self, user_id: &str) -> Report {
        Report {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            zip_codes: self.request.zip_codes.clone(),
            notes: self.request.notes.clone(),
            service_styles: self
                .request
                .service_styles
                .iter()
                .map(|s| s.label().to_string())
                .collect(),
            cuisines: self.request.cuisines.clone(),
            personas: self.panels.patrons.clone(),
            competitors: self.panels.competition.clone(),
            whitespace: self.panels.whitespace.clone(),
            generated_at: self.generated_at,
        }
    }
}

pub struct ReportGenerator {
    deps: ReportDeps,
}

impl ReportGenerator {
    pub fn new(deps: ReportDeps) -> Self {
        Self { deps }
    }

    /// Validate the form, then run every stage. Only validation can fail, and
    /// it fails before any adapter is called.
    pub async fn generate(&self, form: ReportForm) -> Result<ReportOutput, MatadorError> {
        let request = ReportRequest::from_form(form)?;
        Ok(self.run(request).await)
    }

    pub async fn run(&self, request: ReportRequest) -> ReportOutput {
        info!(
            zips = ?request.zip_codes,
            styles = request.service_styles.len(),
            cuisines = request.cuisines.len(),
            "Generating report"
        );
        let mut ctx = GenerationContext::new(request);

        self.competitor_stage(&mut ctx).await;
        self.demographics_stage(&mut ctx).await;
        self.persona_stage(&mut ctx).await;
        competitors::analyze_brands(
            self.deps.pages.as_ref(),
            self.deps.llm.as_ref(),
            &mut ctx.competitors,
        )
        .await;
        self.whitespace_stage(&mut ctx).await;

        let panels = Panels {
            patrons: render::patrons_panel(&ctx.persona_sections),
            competition: render::competition_panel(&ctx.competitors),
            whitespace: ctx.whitespace.clone(),
        };
        info!(
            competitors = ctx.competitors.len(),
            persona_sections = ctx.persona_sections.len(),
            "Report generated"
        );

        ReportOutput {
            request: ctx.request,
            personas: ctx.persona_sections,
            competitors: ctx.competitors,
            whitespace: ctx.whitespace,
            panels,
            generated_at: Utc::now(),
        }
    }

    async fn competitor_stage(&self, ctx: &mut GenerationContext) {
        let request = &ctx.request;
        let collected = match request.competitor_mode {
            CompetitorMode::Auto => {
                let terms = competitors::search_terms(&request.service_styles, &request.cuisines);
                competitors::collect(
                    self.deps.geocoder.as_ref(),
                    self.deps.places.as_ref(),
                    &request.zip_codes,
                    &terms,
                )
                .await
            }
            CompetitorMode::Manual => Vec::new(),
        };

        let style_filter = request
            .filter_by_style
            .then_some(request.service_styles.as_slice());
        ctx.competitors =
            competitors::finalize(collected, &request.manual_competitors, style_filter);
        info!(count = ctx.competitors.len(), "Competitor list ranked");
    }

    async fn demographics_stage(&self, ctx: &mut GenerationContext) {
        ctx.profiles = match self.deps.demographics.profiles(&ctx.request.zip_codes).await {
            Ok(profiles) => profiles,
            Err(e) => {
                warn!(error = %e, "Census lookup failed");
                Vec::new()
            }
        };
    }

    async fn persona_stage(&self, ctx: &mut GenerationContext) {
        let request = ctx.request.clone();
        let mut texts = Vec::new();

        match request.persona_mode {
            PersonaMode::Combined => {
                let summary = demographic_summary(&ctx.profiles);
                let (section, text) = self
                    .persona_section(None, &request.zip_codes, &request.notes, &summary)
                    .await;
                ctx.persona_sections.push(section);
                texts.extend(text);
            }
            PersonaMode::Individual => {
                for zip in &request.zip_codes {
                    let local: Vec<ZctaProfile> = ctx
                        .profiles
                        .iter()
                        .filter(|p| &p.zcta == zip)
                        .cloned()
                        .collect();
                    let summary = demographic_summary(&local);
                    let (section, text) = self
                        .persona_section(
                            Some(zip.clone()),
                            std::slice::from_ref(zip),
                            &request.notes,
                            &summary,
                        )
                        .await;
                    ctx.persona_sections.push(section);
                    texts.extend(text.map(|t| format!("ZIP {zip}:\n{t}")));
                }
            }
        }

        ctx.persona_text = texts.join("\n\n");
    }

    /// Structured call first when enabled, free-text plus parser otherwise or
    /// on failure. Returns the section and the raw persona text, if any.
    async fn persona_section(
        &self,
        zip: Option<String>,
        zip_codes: &[String],
        notes: &str,
        demographics: &str,
    ) -> (PersonaSection, Option<String>) {
        if self.deps.structured_personas {
            let prompt = persona_prompt(zip_codes, notes, demographics, true);
            match self.deps.llm.personas(PERSONA_SYSTEM, &prompt).await {
                Ok(set) if !set.personas.is_empty() => {
                    let text = set
                        .personas
                        .iter()
                        .map(|p| p.to_text())
                        .collect::<Vec<_>>()
                        .join("\n\n");
                    let section = PersonaSection {
                        zip,
                        blocks: set.into_blocks(),
                        error: None,
                    };
                    return (section, Some(text));
                }
                Ok(_) => warn!(zip = ?zip, "Structured persona call returned no personas, falling back"),
                Err(e) => warn!(zip = ?zip, error = %e, "Structured persona call failed, falling back"),
            }
        }

        let prompt = persona_prompt(zip_codes, notes, demographics, false);
        match self.deps.llm.complete(Task::Personas, &prompt).await {
            Ok(text) => {
                let section = PersonaSection {
                    zip,
                    blocks: parse_persona_blocks(&text),
                    error: None,
                };
                let text = text.trim().to_string();
                (section, (!text.is_empty()).then_some(text))
            }
            Err(e) => {
                warn!(zip = ?zip, error = %e, "Persona generation failed");
                let section = PersonaSection {
                    zip,
                    blocks: Vec::new(),
                    error: Some(format!("Error generating personas: {e}")),
                };
                (section, None)
            }
        }
    }

    async fn whitespace_stage(&self, ctx: &mut GenerationContext) {
        if !ctx.has_personas() {
            info!("No personas generated, skipping whitespace analysis");
            ctx.whitespace = render::WHITESPACE_NEEDS_PERSONAS.to_string();
            return;
        }

        let summaries: Vec<(String, String)> = ctx
            .competitors
            .iter()
            .filter_map(|c| Some((c.name.clone(), c.brand_analysis.clone()?)))
            .collect();
        let prompt = whitespace_prompt(&ctx.persona_text, &summaries);

        ctx.whitespace = match self.deps.llm.complete(Task::Whitespace, &prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Whitespace analysis failed");
                format!("Error generating white space analysis: {e}")
            }
        };
    }
}
