//! Persona blocks: parsing free-text persona completions and rendering the
//! structured (schema-validated) variant into the same shape.
//!
//! The free-text parser is best effort. Model formatting is not a contract,
//! so every input produces blocks and nothing is ever dropped: a block with
//! no recognizable name or prevalence gets a fallback label and keeps its raw
//! text for display.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const UNNAMED_PERSONA: &str = "Unnamed Persona";

/// A "Persona Name:" label line, tolerating list numbering, bullets,
/// markdown headings and bold markers around the label.
static RE_NAME_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:#+[ \t]*)?(?:[-*•][ \t]+)?(?:\d+[.)][ \t]*)?(?:\*\*)?[ \t]*persona[ \t]+name[ \t]*(?:\*\*)?[ \t]*:[ \t]*(?:\*\*)?(?P<name>[^\n]*)$",
    )
    .expect("valid regex")
});

/// First percentage following a "prevalence" label on the same line.
static RE_PREVALENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)prevalence[^\n]*?(?P<pct>\d{1,3})(?:\.\d+)?[ \t]*%").expect("valid regex")
});

static RE_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaBlock {
    pub name: String,
    pub prevalence: Option<u32>,
    /// Raw block text as the model wrote it.
    pub text: String,
}

impl PersonaBlock {
    /// Display label, e.g. `Sun Chasers — 22%` or `Unnamed Persona — Unknown`.
    pub fn label(&self) -> String {
        match self.prevalence {
            Some(pct) => format!("{} — {}%", self.name, pct),
            None => format!("{} — Unknown", self.name),
        }
    }

    /// Block lines other than the name label, for bullet rendering.
    pub fn detail_lines(&self) -> impl Iterator<Item = &str> {
        self.text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !RE_NAME_LINE.is_match(line))
    }
}

/// Split a persona completion into labelled blocks, sorted by prevalence
/// (highest first, unknown last, ties in original order).
pub fn parse_persona_blocks(text: &str) -> Vec<PersonaBlock> {
    let mut blocks: Vec<PersonaBlock> = split_blocks(text)
        .into_iter()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| PersonaBlock {
            name: extract_name(chunk).unwrap_or_else(|| UNNAMED_PERSONA.to_string()),
            prevalence: extract_prevalence(chunk),
            text: chunk.to_string(),
        })
        .collect();

    blocks.sort_by(|a, b| b.prevalence.cmp(&a.prevalence));
    blocks
}

/// Split at each "Persona Name:" line when the label is present, otherwise on blank lines.
fn split_blocks(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = RE_NAME_LINE.find_iter(text).map(|m| m.start()).collect();
    if starts.is_empty() {
        return RE_BLANK_LINES.split(text).collect();
    }

    let mut chunks = Vec::with_capacity(starts.len() + 1);
    chunks.push(&text[..starts[0]]);
    for (i, start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        chunks.push(&text[*start..end]);
    }
    chunks
}

fn extract_name(chunk: &str) -> Option<String> {
    let caps = RE_NAME_LINE.captures(chunk)?;
    let name = caps
        .name("name")?
        .as_str()
        .trim()
        .trim_matches(|c: char| c == '*' || c == '"' || c == '“' || c == '”')
        .trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn extract_prevalence(chunk: &str) -> Option<u32> {
    RE_PREVALENCE
        .captures(chunk)
        .and_then(|caps| caps.name("pct"))
        .and_then(|m| m.as_str().parse().ok())
}

// ---------------------------------------------------------------------------
// Structured personas
// ---------------------------------------------------------------------------

/// Schema the persona call asks the completion endpoint to fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PersonaSet {
    /// Three to five personas for the area
    pub personas: Vec<PersonaProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PersonaProfile {
    /// Collective name such as "Sun Chasers", never an individual's name
    pub name: String,
    /// Lifestyle and cultural tendencies
    pub lifestyle_summary: String,
    /// One of: Citizen, Sage, Rebel, Lover, Creator, Explorer, Innocent, Magician, Hero, Jester, Caregiver, Sovereign
    pub archetype: String,
    /// Emotional and behavioral drivers
    pub motivators: Vec<String>,
    /// Two or three secondary groups this persona influences
    pub influenced_groups: Vec<String>,
    /// Five brands they love that reflect their values
    pub favored_brands: Vec<String>,
    /// Estimated share of the total population, 0-100
    pub prevalence_percent: u32,
}

impl PersonaProfile {
    /// Labelled text in the same layout the free-text prompt asks for.
    pub fn to_text(&self) -> String {
        format!(
            "Persona Name: {}\nLifestyle: {}\nArchetype: {}\nMotivators: {}\nInfluenced Groups: {}\nFavorite Brands: {}\nPrevalence: {}%",
            self.name.trim(),
            self.lifestyle_summary.trim(),
            self.archetype.trim(),
            self.motivators.join(", "),
            self.influenced_groups.join(", "),
            self.favored_brands.join(", "),
            self.prevalence_percent,
        )
    }

    pub fn to_block(&self) -> PersonaBlock {
        let name = self.name.trim();
        PersonaBlock {
            name: if name.is_empty() {
                UNNAMED_PERSONA.to_string()
            } else {
                name.to_string()
            },
            prevalence: Some(self.prevalence_percent),
            text: self.to_text(),
        }
    }
}

impl PersonaSet {
    pub fn into_blocks(self) -> Vec<PersonaBlock> {
        let mut blocks: Vec<PersonaBlock> = self.personas.iter().map(PersonaProfile::to_block).collect();
        blocks.sort_by(|a, b| b.prevalence.cmp(&a.prevalence));
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_persona_gets_name_and_prevalence() {
        let blocks =
            parse_persona_blocks("Persona Name: Sun Chasers\nPrevalence Score: 22%\nMotivators: ...");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].label(), "Sun Chasers — 22%");
    }

    #[test]
    fn unlabelled_text_falls_back_and_keeps_raw_text() {
        let text = "Some people like tacos a lot.";
        let blocks = parse_persona_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].label(), "Unnamed Persona — Unknown");
        assert_eq!(blocks[0].text, text);
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert!(parse_persona_blocks("").is_empty());
        assert!(parse_persona_blocks("  \n\n \n").is_empty());
    }

    #[test]
    fn splits_on_label_even_without_blank_lines() {
        let text = "Persona Name: Night Owls\nPrevalence: 12%\nPersona Name: Trail Mix Families\nPrevalence: 30%";
        let blocks = parse_persona_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].label(), "Trail Mix Families — 30%");
        assert_eq!(blocks[1].label(), "Night Owls — 12%");
    }

    #[test]
    fn label_split_keeps_blank_lines_inside_a_persona() {
        let text = "1. **Persona Name:** Sun Chasers\n\nLifestyle: beach mornings\n\n7. Estimated prevalence: 22%\n\n2. **Persona Name:** Quiet Regulars\nPrevalence: 9%";
        let blocks = parse_persona_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].label(), "Sun Chasers — 22%");
        assert!(blocks[0].text.contains("beach mornings"));
        assert_eq!(blocks[1].label(), "Quiet Regulars — 9%");
    }

    #[test]
    fn preamble_before_first_label_is_kept_as_its_own_block() {
        let text = "Here are the personas:\nPersona Name: Sun Chasers\nPrevalence: 22%";
        let blocks = parse_persona_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "Sun Chasers");
        assert_eq!(blocks[1].label(), "Unnamed Persona — Unknown");
    }

    #[test]
    fn blank_line_split_when_no_labels() {
        let text = "Block one\nPrevalence: 5%\n\nBlock two\n\n\nBlock three\nprevalence ~ 40 %";
        let blocks = parse_persona_blocks(text);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].prevalence, Some(40));
        assert_eq!(blocks[1].prevalence, Some(5));
        assert_eq!(blocks[2].prevalence, None);
        assert!(blocks.iter().all(|b| b.name == UNNAMED_PERSONA));
    }

    #[test]
    fn first_prevalence_wins_and_labels_without_percent_are_unknown() {
        let many = parse_persona_blocks("Persona Name: A\nPrevalence: 18%\nPrevalence: 50%");
        assert_eq!(many[0].prevalence, Some(18));

        let no_pct = parse_persona_blocks("Persona Name: B\nPrevalence: high");
        assert_eq!(no_pct[0].label(), "B — Unknown");
    }

    #[test]
    fn percent_label_in_heading_does_not_confuse_prevalence() {
        let blocks = parse_persona_blocks(
            "Persona Name: Sun Chasers\nEstimated prevalence (% of total population): 22%",
        );
        assert_eq!(blocks[0].prevalence, Some(22));
    }

    #[test]
    fn empty_name_label_falls_back() {
        let blocks = parse_persona_blocks("Persona Name: **\nPrevalence: 3%");
        assert_eq!(blocks[0].label(), "Unnamed Persona — 3%");
    }

    #[test]
    fn odd_input_never_panics() {
        for text in ["%", "prevalence", "Persona Name:", "\u{0}\u{1}", "Prevalence: 9999999%", "é\n\n%\n\nPersona name: ü"] {
            let _ = parse_persona_blocks(text);
        }
    }

    #[test]
    fn detail_lines_skip_the_name_label() {
        let blocks = parse_persona_blocks("Persona Name: Sun Chasers\nPrevalence: 22%\n\nMotivators: sunsets");
        let lines: Vec<&str> = blocks[0].detail_lines().collect();
        assert_eq!(lines, vec!["Prevalence: 22%", "Motivators: sunsets"]);
    }

    #[test]
    fn structured_persona_text_reads_back_through_the_parser() {
        let profile = PersonaProfile {
            name: "Sun Chasers".into(),
            lifestyle_summary: "Outdoor brunch crowd".into(),
            archetype: "Explorer".into(),
            motivators: vec!["novelty".into(), "sunlight".into()],
            influenced_groups: vec!["Young families".into()],
            favored_brands: vec!["Patagonia".into()],
            prevalence_percent: 22,
        };
        let parsed = parse_persona_blocks(&profile.to_text());
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].label(), profile.to_block().label());
    }

    #[test]
    fn structured_set_sorts_by_prevalence() {
        let set = PersonaSet {
            personas: vec![
                PersonaProfile {
                    name: "Small".into(),
                    lifestyle_summary: String::new(),
                    archetype: "Sage".into(),
                    motivators: vec![],
                    influenced_groups: vec![],
                    favored_brands: vec![],
                    prevalence_percent: 10,
                },
                PersonaProfile {
                    name: "Large".into(),
                    lifestyle_summary: String::new(),
                    archetype: "Hero".into(),
                    motivators: vec![],
                    influenced_groups: vec![],
                    favored_brands: vec![],
                    prevalence_percent: 35,
                },
            ],
        };
        let blocks = set.into_blocks();
        assert_eq!(blocks[0].name, "Large");
        assert_eq!(blocks[1].name, "Small");
    }
}
