// LLM prompt constants for prospect research.

/// Pain-point research prompt.
/// Replace: {name}, {company}, {title}, {industry}
pub const PAIN_POINT_PROMPT_TEMPLATE: &str = r#"Based on the prospect information:
Name: {name}
Company: {company}
Title: {title}
Industry: {industry}

Identify 3-5 potential business pain points this prospect might have that a
sales-efficiency product could address. Each pain point is one short phrase.

Return a JSON ARRAY of strings, for example:
["Manual prospect research", "Low reply rates on cold outreach"]"#;
