// LLM prompt constants for outreach drafting.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Initial outreach prompt.
/// Replace: {voice}, {schema}, {name}, {company}, {title}, {industry}, {pain_points}
pub const INITIAL_EMAIL_PROMPT_TEMPLATE: &str = r#"{voice}

Write a personalized first-touch sales email for:

Prospect: {name}
Company: {company}
Title: {title}
Industry: {industry}
Pain Points: {pain_points}

The email must:
- Be personalized and relevant to the prospect's role and industry
- Carry a clear value proposition
- End with a soft call-to-action
- Stay within 100-150 words

{schema}"#;

/// Follow-up prompt.
/// Replace: {voice}, {schema}, {number}, {hint}, {name}, {company}, {industry}
pub const FOLLOW_UP_PROMPT_TEMPLATE: &str = r#"{voice}

Write follow-up email #{number} in an outreach sequence, built around this idea:
{hint}

For prospect:
Name: {name}
Company: {company}
Industry: {industry}

Keep it short, valuable, and respectful. Do not repeat the first email verbatim.

{schema}"#;

/// Angle for each follow-up in the sequence. Follow-ups past the last hint reuse the first.
pub const FOLLOW_UP_HINTS: [&str; 5] = [
    "Following up on my previous email about {company}'s sales process...",
    "Sharing a relevant case study that might interest {company}...",
    "Quick question - what's your biggest challenge with lead generation?",
    "Should I assume this isn't a priority for {company} right now?",
    "Last follow-up - would love to help {company} grow sales by 35%...",
];

pub fn follow_up_hint(number: u8, company: &str) -> String {
    let index = usize::from(number.saturating_sub(1));
    FOLLOW_UP_HINTS
        .get(index)
        .unwrap_or(&FOLLOW_UP_HINTS[0])
        .replace("{company}", company)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_per_sequence_number() {
        assert!(follow_up_hint(2, "Acme").contains("case study"));
        assert!(follow_up_hint(5, "Acme").starts_with("Last follow-up"));
    }

    #[test]
    fn test_hint_out_of_range_reuses_first() {
        assert_eq!(follow_up_hint(9, "Acme"), follow_up_hint(1, "Acme"));
        assert_eq!(follow_up_hint(0, "Acme"), follow_up_hint(1, "Acme"));
    }

    #[test]
    fn test_hint_substitutes_company() {
        assert_eq!(
            follow_up_hint(4, "Acme"),
            "Should I assume this isn't a priority for Acme right now?"
        );
    }
}
