//! Competitor pipeline: collect places per ZIP, merge manual entries,
//! deduplicate, filter, rank, then attach brand-voice summaries.
//!
//! Every upstream failure is local to the data point it affects. A ZIP that
//! won't geocode is skipped, a failed search contributes nothing, a failed
//! details lookup leaves the website empty, and a failed fetch or brand call
//! becomes inline text on that one competitor.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use matador_common::{Classification, Competitor, CompetitorSource, ManualCompetitor, ServiceStyle};
use places_client::Place;

use crate::prompts::brand_prompt;
use crate::traits::{Geocoder, LanguageModel, PageFetcher, PlacesDirectory, Task};

pub const MAX_COMPETITORS: usize = 10;

/// Places per ZIP that get a details call for their website.
pub const DETAIL_LOOKUPS_PER_ZIP: usize = 10;

/// Style keywords first, then cuisines, without repeats.
pub fn search_terms(styles: &[ServiceStyle], cuisines: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    styles
        .iter()
        .map(|s| s.search_keyword().to_string())
        .chain(cuisines.iter().cloned())
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Assign a service style from name keywords, place types, price and rating.
/// Rules are checked in order and the first match wins.
pub fn classify(
    name: &str,
    types: &[String],
    price_level: Option<u8>,
    rating: Option<f64>,
) -> Classification {
    let name = name.to_lowercase();
    let has_type = |wanted: &[&str]| types.iter().any(|t| wanted.contains(&t.as_str()));
    let name_has = |words: &[&str]| words.iter().any(|w| name.contains(w));

    let style = if has_type(&["food_truck"]) || name_has(&["food truck"]) {
        ServiceStyle::FoodTruck
    } else if has_type(&["bakery"]) || name_has(&["bakery", "bakehouse"]) {
        ServiceStyle::Bakery
    } else if has_type(&["cafe", "coffee_shop"]) || name_has(&["coffee", "café", "cafe", "espresso"])
    {
        ServiceStyle::Cafe
    } else if has_type(&["bar", "pub", "night_club"]) || name_has(&["tavern", "pub", "brewery"]) {
        ServiceStyle::BarPub
    } else if has_type(&["buffet"]) || name_has(&["buffet"]) {
        ServiceStyle::Buffet
    } else if price_level.is_some_and(|p| p <= 1) || has_type(&["fast_food"]) {
        ServiceStyle::QuickService
    } else if price_level.is_some_and(|p| p >= 3) && rating.is_some_and(|r| r >= 4.5) {
        ServiceStyle::FineDining
    } else if has_type(&["meal_takeaway"]) {
        ServiceStyle::FastCasual
    } else if has_type(&["restaurant"]) || price_level == Some(2) {
        ServiceStyle::FullService
    } else {
        return Classification::Unknown;
    };
    Classification::Style(style)
}

pub fn from_place(place: Place) -> Competitor {
    let service_classification =
        classify(&place.name, &place.types, place.price_level, place.rating);
    Competitor {
        name: place.name,
        address: place.vicinity,
        rating: place.rating,
        review_count: place.user_ratings_total,
        website: String::new(),
        service_classification,
        source: CompetitorSource::Auto,
        place_id: Some(place.place_id),
        types: place.types,
        price_level: place.price_level,
        brand_analysis: None,
    }
}

/// Indices of the `n` highest-scoring entries, ties broken by position.
fn top_by_score(competitors: &[Competitor], n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..competitors.len()).collect();
    order.sort_by(|&a, &b| competitors[b].score().total_cmp(&competitors[a].score()));
    order.truncate(n);
    order
}

/// Search every ZIP and look up websites for each ZIP's top places.
pub async fn collect(
    geocoder: &dyn Geocoder,
    places: &dyn PlacesDirectory,
    zip_codes: &[String],
    terms: &[String],
) -> Vec<Competitor> {
    let mut all = Vec::new();

    for zip in zip_codes {
        let at = match geocoder.geocode(zip).await {
            Ok(Some(at)) => at,
            Ok(None) => {
                warn!(zip = zip.as_str(), "ZIP did not geocode, skipping");
                continue;
            }
            Err(e) => {
                warn!(zip = zip.as_str(), error = %e, "Geocoding failed, skipping ZIP");
                continue;
            }
        };

        let found = match places.search(at, terms).await {
            Ok(found) => found,
            Err(e) => {
                warn!(zip = zip.as_str(), error = %e, "Places search failed");
                Vec::new()
            }
        };
        info!(zip = zip.as_str(), count = found.len(), "Places found");

        let mut batch: Vec<Competitor> = found
            .into_iter()
            .filter(|p| {
                let named = !p.name.trim().is_empty();
                if !named {
                    debug!(place_id = p.place_id.as_str(), "Dropping unnamed place");
                }
                named
            })
            .map(from_place)
            .collect();
        for idx in top_by_score(&batch, DETAIL_LOOKUPS_PER_ZIP) {
            let Some(place_id) = batch[idx].place_id.clone() else {
                continue;
            };
            match places.website(&place_id).await {
                Ok(Some(site)) => batch[idx].website = site,
                Ok(None) => debug!(place_id = place_id.as_str(), "No website listed"),
                Err(e) => {
                    warn!(place_id = place_id.as_str(), error = %e, "Place details failed")
                }
            }
        }
        all.extend(batch);
    }

    all
}

/// Append user-entered competitors. Rows with a blank name are dropped.
pub fn merge_manual(competitors: &mut Vec<Competitor>, manual: &[ManualCompetitor]) {
    competitors.extend(
        manual
            .iter()
            .filter(|m| !m.name.trim().is_empty())
            .map(|m| Competitor::manual(m.name.trim(), m.website.trim())),
    );
}

/// Keep the first entry for each exact name.
pub fn dedup_by_name(competitors: Vec<Competitor>) -> Vec<Competitor> {
    let mut seen = HashSet::new();
    competitors
        .into_iter()
        .filter(|c| seen.insert(c.name.clone()))
        .collect()
}

/// Drop auto entries outside the selected styles. Manual entries always stay,
/// and an empty selection keeps everything.
pub fn filter_by_styles(competitors: Vec<Competitor>, styles: &[ServiceStyle]) -> Vec<Competitor> {
    if styles.is_empty() {
        return competitors;
    }
    competitors
        .into_iter()
        .filter(|c| {
            c.source == CompetitorSource::Manual
                || c.service_classification
                    .style()
                    .is_some_and(|style| styles.contains(&style))
        })
        .collect()
}

/// Stable descending sort by score, truncated to [`MAX_COMPETITORS`].
pub fn rank_and_cap(mut competitors: Vec<Competitor>) -> Vec<Competitor> {
    competitors.sort_by(|a, b| b.score().total_cmp(&a.score()));
    competitors.truncate(MAX_COMPETITORS);
    competitors
}

/// Merge, dedup, optionally filter, then rank. Entries with a blank name are
/// dropped whatever their source.
pub fn finalize(
    mut collected: Vec<Competitor>,
    manual: &[ManualCompetitor],
    style_filter: Option<&[ServiceStyle]>,
) -> Vec<Competitor> {
    collected.retain(|c| !c.name.trim().is_empty());
    merge_manual(&mut collected, manual);
    let mut list = dedup_by_name(collected);
    if let Some(styles) = style_filter {
        list = filter_by_styles(list, styles);
    }
    rank_and_cap(list)
}

/// One website fetch and one brand call per competitor that has a website.
pub async fn analyze_brands(
    pages: &dyn PageFetcher,
    llm: &dyn LanguageModel,
    competitors: &mut [Competitor],
) {
    for competitor in competitors.iter_mut() {
        if competitor.website.trim().is_empty() {
            continue;
        }

        let text = match pages.text(&competitor.website).await {
            Ok(text) => text,
            Err(e) => {
                warn!(url = competitor.website.as_str(), error = %e, "Website fetch failed");
                competitor.brand_analysis = Some(format!("Website content unavailable: {e}"));
                continue;
            }
        };

        let prompt = brand_prompt(&competitor.name, &competitor.address, &text);
        competitor.brand_analysis = Some(match llm.complete(Task::BrandVoice, &prompt).await {
            Ok(analysis) => analysis.trim().to_string(),
            Err(e) => {
                warn!(name = competitor.name.as_str(), error = %e, "Brand analysis failed");
                format!("Error analyzing brand: {e}")
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    fn scored(name: &str, rating: Option<f64>, reviews: Option<u32>) -> Competitor {
        Competitor {
            rating,
            review_count: reviews,
            source: CompetitorSource::Auto,
            service_classification: Classification::Unknown,
            ..Competitor::manual(name, "")
        }
    }

    #[test]
    fn search_terms_keep_first_seen_order() {
        let terms = search_terms(
            &[ServiceStyle::Cafe, ServiceStyle::BarPub],
            &["Coffee".to_string(), "Café".to_string(), "Tapas".to_string()],
        );
        assert_eq!(terms, vec!["Café", "Bar", "Coffee", "Tapas"]);
    }

    #[test]
    fn classification_rules_apply_in_order() {
        let style = |name: &str, t: &[&str], price: Option<u8>, rating: Option<f64>| {
            classify(name, &types(t), price, rating)
        };

        // Name keywords beat types further down the list.
        assert_eq!(
            style("Tacos Food Truck", &["restaurant"], Some(1), None),
            Classification::Style(ServiceStyle::FoodTruck)
        );
        assert_eq!(
            style("Sunrise Bakehouse", &["cafe"], None, None),
            Classification::Style(ServiceStyle::Bakery)
        );
        assert_eq!(
            style("Blue Bottle", &["cafe", "restaurant"], Some(2), None),
            Classification::Style(ServiceStyle::Cafe)
        );
        assert_eq!(
            style("The Local Tavern", &["restaurant"], None, None),
            Classification::Style(ServiceStyle::BarPub)
        );
        assert_eq!(
            style("Golden Corral", &["buffet"], Some(1), None),
            Classification::Style(ServiceStyle::Buffet)
        );
        assert_eq!(
            style("Burger Shack", &["restaurant"], Some(1), Some(4.9)),
            Classification::Style(ServiceStyle::QuickService)
        );
        assert_eq!(
            style("Maison", &["restaurant"], Some(4), Some(4.6)),
            Classification::Style(ServiceStyle::FineDining)
        );
        // Pricey but not rated highly enough for fine dining.
        assert_eq!(
            style("Maison", &["restaurant"], Some(4), Some(4.2)),
            Classification::Style(ServiceStyle::FullService)
        );
        assert_eq!(
            style("Bowl Co", &["meal_takeaway", "restaurant"], None, None),
            Classification::Style(ServiceStyle::FastCasual)
        );
        assert_eq!(
            style("Nameless", &["point_of_interest"], Some(2), None),
            Classification::Style(ServiceStyle::FullService)
        );
        assert_eq!(
            style("Nameless", &["point_of_interest"], None, None),
            Classification::Unknown
        );
    }

    #[test]
    fn blank_named_places_never_survive_finalize() {
        let unnamed: Place =
            serde_json::from_str(r#"{"place_id":"p1","rating":4.0,"user_ratings_total":50}"#)
                .unwrap();
        let blank = Place {
            place_id: "p2".into(),
            name: "   ".into(),
            vicinity: String::new(),
            rating: Some(5.0),
            user_ratings_total: Some(900),
            types: types(&["cafe"]),
            price_level: None,
        };

        let list = finalize(
            vec![
                from_place(blank),
                from_place(unnamed),
                scored("Alfred Coffee", Some(4.4), Some(812)),
            ],
            &[],
            None,
        );

        let names: Vec<&str> = list.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alfred Coffee"]);
    }

    #[test]
    fn dedup_is_exact_and_keeps_first() {
        let list = dedup_by_name(vec![
            scored("Joe's Diner", Some(4.0), Some(10)),
            scored("Joe's Diner ", Some(3.0), Some(5)),
            scored("Joe's Diner", Some(5.0), Some(100)),
            scored("joe's diner", None, None),
        ]);
        let names: Vec<&str> = list.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Joe's Diner", "Joe's Diner ", "joe's diner"]);
        assert_eq!(list[0].rating, Some(4.0));
    }

    #[test]
    fn ranking_is_descending_stable_and_capped() {
        let mut input: Vec<Competitor> = (0..15)
            .map(|i| scored(&format!("Place {i}"), Some(4.0), Some(i)))
            .collect();
        input.push(scored("Tie A", Some(2.0), Some(2)));
        input.push(scored("Tie B", Some(4.0), Some(1)));

        let ranked = rank_and_cap(input);
        assert_eq!(ranked.len(), MAX_COMPETITORS);
        assert_eq!(ranked[0].name, "Place 14");
        assert!(ranked.windows(2).all(|w| w[0].score() >= w[1].score()));

        let ties = rank_and_cap(vec![
            scored("Tie A", Some(2.0), Some(2)),
            scored("Tie B", Some(4.0), Some(1)),
        ]);
        assert_eq!(ties[0].name, "Tie A");
    }

    #[test]
    fn missing_scores_rank_below_any_positive_score() {
        let ranked = rank_and_cap(vec![
            Competitor::manual("Manual First", ""),
            scored("No Rating", None, Some(300)),
            scored("Tiny", Some(1.0), Some(1)),
        ]);
        assert_eq!(ranked[0].name, "Tiny");
        assert_eq!(ranked[1].name, "Manual First");
        assert_eq!(ranked[2].name, "No Rating");
    }

    #[test]
    fn blank_manual_names_are_dropped() {
        let mut list = Vec::new();
        merge_manual(
            &mut list,
            &[
                ManualCompetitor { name: "   ".into(), website: "https://x.example".into() },
                ManualCompetitor { name: " Joe's Diner ".into(), website: String::new() },
            ],
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Joe's Diner");
        assert_eq!(list[0].service_classification, Classification::Manual);
        assert_eq!(list[0].rating, None);
        assert_eq!(list[0].address, "");
    }

    #[test]
    fn style_filter_keeps_manual_entries() {
        let mut cafe = scored("Cafe One", Some(4.0), Some(10));
        cafe.service_classification = Classification::Style(ServiceStyle::Cafe);
        let mut bar = scored("Bar One", Some(4.0), Some(10));
        bar.service_classification = Classification::Style(ServiceStyle::BarPub);
        let unknown = scored("Mystery", Some(4.0), Some(10));
        let manual = Competitor::manual("Joe's Diner", "");

        let kept = filter_by_styles(
            vec![cafe.clone(), bar.clone(), unknown.clone(), manual.clone()],
            &[ServiceStyle::Cafe],
        );
        let names: Vec<&str> = kept.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Cafe One", "Joe's Diner"]);

        assert_eq!(filter_by_styles(vec![bar, unknown], &[]).len(), 2);
    }

    #[test]
    fn finalize_dedups_across_auto_and_manual() {
        let auto = vec![scored("Joe's Diner", Some(4.5), Some(20))];
        let manual = [ManualCompetitor { name: "Joe's Diner".into(), website: String::new() }];
        let list = finalize(auto, &manual, None);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].source, CompetitorSource::Auto);
    }

    #[test]
    fn from_place_keeps_directory_fields() {
        let competitor = from_place(Place {
            place_id: "p1".into(),
            name: "Alfred Coffee".into(),
            vicinity: "490 N Beverly Dr".into(),
            rating: Some(4.4),
            user_ratings_total: Some(812),
            types: types(&["cafe", "food"]),
            price_level: Some(2),
        });
        assert_eq!(competitor.address, "490 N Beverly Dr");
        assert_eq!(competitor.place_id.as_deref(), Some("p1"));
        assert_eq!(competitor.website, "");
        assert_eq!(
            competitor.service_classification,
            Classification::Style(ServiceStyle::Cafe)
        );
    }
}
