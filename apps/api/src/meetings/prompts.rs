// LLM prompt constants for meeting scheduling.

/// Scheduling email prompt.
/// Replace: {voice}, {schema}, {name}, {company}, {slots}
pub const SCHEDULING_EMAIL_PROMPT_TEMPLATE: &str = r#"{voice}

Write an email to schedule a 30-minute meeting with {name} from {company}.

Available times (UTC):
{slots}

The email must:
- Mention the value of the meeting for {company}
- List the available times exactly as numbered above
- Ask the prospect to pick a time
- Include the placeholder [calendar link] for self-scheduling

{schema}"#;
