// Trait seams for every upstream service the report generator calls.
//
// Geocoder and PlacesDirectory front the Google client, Demographics the
// census client, PageFetcher the website scraper, LanguageModel the OpenAI
// agents. The generator only sees these traits, so tests swap in the
// in-memory mocks from `testing` and never touch the network.

use anyhow::Result;
use async_trait::async_trait;

use ai_client::{OpenAi, OutputBuilder, PromptBuilder};
use census_client::{CensusClient, ZctaProfile};
use places_client::{LatLng, Place, PlacesClient, DEFAULT_RADIUS_METERS};

use crate::personas::PersonaSet;
use crate::prompts::PERSONA_SYSTEM;

// ---------------------------------------------------------------------------
// Geocoder
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// ZIP centroid, `Ok(None)` when the ZIP is unknown.
    async fn geocode(&self, zip: &str) -> Result<Option<LatLng>>;
}

#[async_trait]
impl Geocoder for PlacesClient {
    async fn geocode(&self, zip: &str) -> Result<Option<LatLng>> {
        Ok(self.geocode_zip(zip).await?)
    }
}

// ---------------------------------------------------------------------------
// PlacesDirectory
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlacesDirectory: Send + Sync {
    /// Restaurants near `at` matching the keyword terms.
    async fn search(&self, at: LatLng, keywords: &[String]) -> Result<Vec<Place>>;

    /// Website from the place's details record.
    async fn website(&self, place_id: &str) -> Result<Option<String>>;
}

#[async_trait]
impl PlacesDirectory for PlacesClient {
    async fn search(&self, at: LatLng, keywords: &[String]) -> Result<Vec<Place>> {
        Ok(self
            .nearby_restaurants(at, keywords, DEFAULT_RADIUS_METERS)
            .await?)
    }

    async fn website(&self, place_id: &str) -> Result<Option<String>> {
        Ok(PlacesClient::website(self, place_id).await?)
    }
}

// ---------------------------------------------------------------------------
// Demographics
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Demographics: Send + Sync {
    async fn profiles(&self, zips: &[String]) -> Result<Vec<ZctaProfile>>;
}

#[async_trait]
impl Demographics for CensusClient {
    async fn profiles(&self, zips: &[String]) -> Result<Vec<ZctaProfile>> {
        Ok(self.zcta_profiles(zips).await?)
    }
}

/// Stand-in when no census key is configured.
pub struct NoDemographics;

#[async_trait]
impl Demographics for NoDemographics {
    async fn profiles(&self, _zips: &[String]) -> Result<Vec<ZctaProfile>> {
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Visible text of the page at `url`.
    async fn text(&self, url: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// LanguageModel
// ---------------------------------------------------------------------------

/// The three prompt kinds, each with its own sampling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Personas,
    BrandVoice,
    Whitespace,
}

impl Task {
    pub fn temperature(self) -> f32 {
        match self {
            Task::Personas | Task::Whitespace => 0.75,
            Task::BrandVoice => 0.7,
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            Task::Personas => 1600,
            Task::Whitespace => 1000,
            Task::BrandVoice => 500,
        }
    }

    /// System message, where the task has one.
    pub fn system(self) -> Option<&'static str> {
        match self {
            Task::Personas => Some(PERSONA_SYSTEM),
            Task::BrandVoice | Task::Whitespace => None,
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Free-text completion for one prompt.
    async fn complete(&self, task: Task, prompt: &str) -> Result<String>;

    /// Schema-validated persona set.
    async fn personas(&self, system: &str, prompt: &str) -> Result<PersonaSet>;
}

/// Production models: a stronger one for personas and whitespace, a cheaper
/// one for the per-competitor brand calls.
#[derive(Clone)]
pub struct OpenAiModels {
    pub persona: OpenAi,
    pub brand: OpenAi,
}

impl OpenAiModels {
    pub fn new(persona: OpenAi, brand: OpenAi) -> Self {
        Self { persona, brand }
    }

    fn for_task(&self, task: Task) -> &OpenAi {
        match task {
            Task::BrandVoice => &self.brand,
            Task::Personas | Task::Whitespace => &self.persona,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModels {
    async fn complete(&self, task: Task, prompt: &str) -> Result<String> {
        let mut builder = self
            .for_task(task)
            .prompt(prompt)
            .temperature(task.temperature())
            .max_tokens(task.max_tokens());
        if let Some(system) = task.system() {
            builder = builder.preamble(system);
        }
        builder.send().await
    }

    async fn personas(&self, system: &str, prompt: &str) -> Result<PersonaSet> {
        self.persona
            .prompt(prompt)
            .preamble(system)
            .temperature(Task::Personas.temperature())
            .max_tokens(Task::Personas.max_tokens())
            .output::<PersonaSet>()
            .send()
            .await
    }
}
