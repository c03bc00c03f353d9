use ai_client::truncate_to_char_boundary;
use census_client::ZctaProfile;

/// Website text sent with each brand prompt is capped at this many bytes.
pub const BRAND_TEXT_LIMIT: usize = 3000;

pub const NO_CENSUS_DATA: &str = "No Census data available for these ZIPs.";

pub const PERSONA_SYSTEM: &str =
    "You are an expert in psychographics, anthropology, and brand strategy.";

const ARCHETYPES: &str = "Citizen, Sage, Rebel, Lover, Creator, Explorer, Innocent, Magician, Hero, Jester, Caregiver, Sovereign";

/// One line per ZCTA, or the fixed no-data sentence.
pub fn demographic_summary(profiles: &[ZctaProfile]) -> String {
    if profiles.is_empty() {
        return NO_CENSUS_DATA.to_string();
    }
    profiles
        .iter()
        .map(ZctaProfile::summary_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Persona request. The free-text variant pins the "Persona Name:" and
/// "Prevalence:" labels the block parser looks for.
pub fn persona_prompt(
    zip_codes: &[String],
    notes: &str,
    demographics: &str,
    structured: bool,
) -> String {
    let notes = if notes.trim().is_empty() {
        "None provided"
    } else {
        notes.trim()
    };

    let mut prompt = format!(
        "Demographic Snapshot:\n{demographics}\n\n\
Based on the following data for a 10-mile radius around ZIP code(s): {zips}\n\
- User Notes: {notes}\n\n\
Generate 3-5 audience personas with the following:\n\
1. Persona Name (must be a collective name like \"Sun Chasers\", not an individual name)\n\
2. Summary of their lifestyle and cultural tendencies\n\
3. Archetypal opportunity (what they're psychologically drawn to; choose 1 of the 12 Jungian archetypes but renamed as: {ARCHETYPES})\n\
4. Motivators (emotional + behavioral drivers)\n\
5. 2-3 influenced secondary groups\n\
6. 5 brands they love that reflect their values\n\
7. Estimated prevalence (% of total population they represent)\n",
        zips = zip_codes.join(", "),
    );

    if !structured {
        prompt.push_str(
            "\nStart every persona with a line \"Persona Name: <name>\" and include a line \
\"Prevalence: <number>%\". Separate personas with a blank line.\n",
        );
    }
    prompt
}

pub fn brand_prompt(name: &str, address: &str, website_text: &str) -> String {
    format!(
        "You are a brand strategist. Based on the following content from the restaurant's website, analyze and return:\n\n\
1. The brand's tone of voice\n\
2. Three personality traits that reflect the brand\n\
3. Their core brand message or positioning\n\
4. What they emphasize in marketing (e.g. ingredients, experience, convenience)\n\
5. Overall impression in 1 sentence\n\n\
Restaurant Name: {name}\n\
Location: {address}\n\
Website Text: {text}\n",
        text = truncate_to_char_boundary(website_text, BRAND_TEXT_LIMIT),
    )
}

/// Whitespace request over the persona text and every competitor's brand summary.
pub fn whitespace_prompt(persona_text: &str, brand_summaries: &[(String, String)]) -> String {
    let competitors = if brand_summaries.is_empty() {
        "No competitor brand analyses were available.".to_string()
    } else {
        brand_summaries
            .iter()
            .map(|(name, summary)| format!("### {name}\n{}", summary.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "Based on the patron personas and competitor brand analyses below, identify three whitespace brand personality opportunities that aren't currently dominant among the competitors.\n\n\
For each opportunity:\n\
- List 3 underrepresented brand personality traits that combine into the opportunity\n\
- Name 2-3 patron personas who would likely be attracted\n\
- Write a short brand strategy insight explaining why this combination is open and how a new brand could embody it\n\n\
Patron Personas:\n{persona_text}\n\n\
Competitor Brand Analyses:\n{competitors}\n",
        persona_text = persona_text.trim(),
    )
}
