// Test mocks for the report generator.
//
// One mock per trait seam, each recording the calls it receives so tests can
// assert on upstream traffic as well as on output:
// - MockGeocoder (Geocoder): ZIP → coordinates map
// - MockPlaces (PlacesDirectory): fixed search results plus place_id → website
// - MockPages (PageFetcher): URL → page text, Err for unregistered URLs
// - MockLanguageModel (LanguageModel): canned completion per task
// - MockDemographics (Demographics): fixed profiles or a failure
//
// Plus `place()` for building directory results.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use census_client::ZctaProfile;
use places_client::{LatLng, Place};

use crate::personas::PersonaSet;
use crate::traits::{Demographics, Geocoder, LanguageModel, PageFetcher, PlacesDirectory, Task};

/// Beverly Hills, CA.
pub const BEVERLY_HILLS: LatLng = LatLng {
    lat: 34.0901,
    lng: -118.4065,
};

/// Directory result with the fields the pipeline reads.
pub fn place(
    place_id: &str,
    name: &str,
    rating: Option<f64>,
    reviews: Option<u32>,
    types: &[&str],
) -> Place {
    Place {
        place_id: place_id.to_string(),
        name: name.to_string(),
        vicinity: "1 Main St, Beverly Hills".to_string(),
        rating,
        user_ratings_total: reviews,
        types: types.iter().map(|t| t.to_string()).collect(),
        price_level: None,
    }
}

// ---------------------------------------------------------------------------
// MockGeocoder
// ---------------------------------------------------------------------------

/// Unregistered ZIPs geocode to `None`; `.failing()` ZIPs return `Err`.
#[derive(Default)]
pub struct MockGeocoder {
    zips: HashMap<String, LatLng>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_zip(mut self, zip: &str, at: LatLng) -> Self {
        self.zips.insert(zip.to_string(), at);
        self
    }

    pub fn failing(mut self, zip: &str) -> Self {
        self.failing.insert(zip.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, zip: &str) -> Result<Option<LatLng>> {
        self.calls.lock().unwrap().push(zip.to_string());
        if self.failing.contains(zip) {
            bail!("MockGeocoder: geocoding failed for {zip}");
        }
        Ok(self.zips.get(zip).copied())
    }
}

// ---------------------------------------------------------------------------
// MockPlaces
// ---------------------------------------------------------------------------

/// Every search returns the same results. Websites come from a
/// place_id → URL map; unregistered ids have no website.
#[derive(Default)]
pub struct MockPlaces {
    results: Vec<Place>,
    websites: HashMap<String, String>,
    failing_search: bool,
    searches: Mutex<Vec<(LatLng, Vec<String>)>>,
    detail_lookups: Mutex<Vec<String>>,
}

impl MockPlaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, results: Vec<Place>) -> Self {
        self.results = results;
        self
    }

    pub fn on_website(mut self, place_id: &str, url: &str) -> Self {
        self.websites.insert(place_id.to_string(), url.to_string());
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.failing_search = true;
        self
    }

    pub fn searches(&self) -> Vec<(LatLng, Vec<String>)> {
        self.searches.lock().unwrap().clone()
    }

    pub fn detail_lookups(&self) -> Vec<String> {
        self.detail_lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlacesDirectory for MockPlaces {
    async fn search(&self, at: LatLng, keywords: &[String]) -> Result<Vec<Place>> {
        self.searches.lock().unwrap().push((at, keywords.to_vec()));
        if self.failing_search {
            bail!("MockPlaces: search failed");
        }
        Ok(self.results.clone())
    }

    async fn website(&self, place_id: &str) -> Result<Option<String>> {
        self.detail_lookups.lock().unwrap().push(place_id.to_string());
        Ok(self.websites.get(place_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// MockPages
// ---------------------------------------------------------------------------

/// URL → page text. Returns `Err` for unregistered URLs.
#[derive(Default)]
pub struct MockPages {
    pages: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl MockPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, url: &str, text: &str) -> Self {
        self.pages.insert(url.to_string(), text.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockPages {
    async fn text(&self, url: &str) -> Result<String> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("MockPages: no page registered for {url}"))
    }
}

// ---------------------------------------------------------------------------
// MockLanguageModel
// ---------------------------------------------------------------------------

/// Canned completions per task. A task with no registered text returns `Err`,
/// as does the structured persona call unless `.with_personas()` was set.
#[derive(Default)]
pub struct MockLanguageModel {
    completions: HashMap<Task, String>,
    personas: Option<PersonaSet>,
    calls: Mutex<Vec<(Task, String)>>,
    persona_calls: Mutex<Vec<String>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_task(mut self, task: Task, text: &str) -> Self {
        self.completions.insert(task, text.to_string());
        self
    }

    pub fn with_personas(mut self, set: PersonaSet) -> Self {
        self.personas = Some(set);
        self
    }

    /// Free-text completions, in call order.
    pub fn calls(&self) -> Vec<(Task, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, task: Task) -> usize {
        self.calls.lock().unwrap().iter().filter(|(t, _)| *t == task).count()
    }

    /// Prompts sent to the structured persona call.
    pub fn persona_calls(&self) -> Vec<String> {
        self.persona_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(&self, task: Task, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push((task, prompt.to_string()));
        self.completions
            .get(&task)
            .cloned()
            .ok_or_else(|| anyhow!("MockLanguageModel: no completion for {task:?}"))
    }

    async fn personas(&self, _system: &str, prompt: &str) -> Result<PersonaSet> {
        self.persona_calls.lock().unwrap().push(prompt.to_string());
        self.personas
            .clone()
            .ok_or_else(|| anyhow!("MockLanguageModel: structured personas unavailable"))
    }
}

// ---------------------------------------------------------------------------
// MockDemographics
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockDemographics {
    profiles: Vec<ZctaProfile>,
    failing: bool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockDemographics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(mut self, profiles: Vec<ZctaProfile>) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Demographics for MockDemographics {
    async fn profiles(&self, zips: &[String]) -> Result<Vec<ZctaProfile>> {
        self.calls.lock().unwrap().push(zips.to_vec());
        if self.failing {
            bail!("MockDemographics: census unavailable");
        }
        Ok(self.profiles.clone())
    }
}
