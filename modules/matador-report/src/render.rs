//! Markdown for the three report panels.

use std::fmt::Write;

use matador_common::Competitor;

use crate::generator::PersonaSection;

pub const NO_COMPETITORS: &str = "_No competitors found._";
pub const NO_WEBSITE: &str = "_No website available for this competitor._";
pub const NO_PERSONAS: &str = "_No personas were generated._";
pub const WHITESPACE_NEEDS_PERSONAS: &str = "White space analysis needs generated personas.";

pub fn patrons_panel(sections: &[PersonaSection]) -> String {
    if sections.is_empty() {
        return NO_PERSONAS.to_string();
    }

    sections
        .iter()
        .map(|section| {
            let body = persona_section_body(section);
            match &section.zip {
                Some(zip) => format!("## ZIP {zip}\n\n{body}"),
                None => body,
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn persona_section_body(section: &PersonaSection) -> String {
    if let Some(error) = &section.error {
        return error.clone();
    }
    if section.blocks.is_empty() {
        return NO_PERSONAS.to_string();
    }

    section
        .blocks
        .iter()
        .map(|block| {
            let mut out = format!("### {}\n", block.label());
            for line in block.detail_lines() {
                let _ = writeln!(out, "- {}", line.trim_start_matches(['-', '*', '•']).trim());
            }
            out.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn competition_panel(competitors: &[Competitor]) -> String {
    if competitors.is_empty() {
        return NO_COMPETITORS.to_string();
    }
    competitors
        .iter()
        .map(competitor_card)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn competitor_card(c: &Competitor) -> String {
    let location = if c.address.trim().is_empty() {
        "Manual Entry"
    } else {
        c.address.as_str()
    };
    let rating = c
        .rating
        .map_or_else(|| "N/A".to_string(), |r| format!("{r:.1}"));

    let mut out = format!(
        "### {}\n**Location:** {}\n**Rating:** {} ({} reviews)\n**Style:** {}\n",
        c.name,
        location,
        rating,
        c.review_count.unwrap_or(0),
        c.service_classification,
    );

    if c.website.trim().is_empty() {
        out.push('\n');
        out.push_str(NO_WEBSITE);
    } else {
        let _ = writeln!(out, "**Website:** {}", c.website);
        if let Some(analysis) = &c.brand_analysis {
            let _ = write!(out, "\n{}", analysis.trim());
        }
    }
    out.trim_end().to_string()
}
