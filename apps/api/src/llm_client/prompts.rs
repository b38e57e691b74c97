// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Voice shared by every outbound email the service drafts.
pub const SENDER_VOICE_INSTRUCTION: &str = "\
    Write as a sales development representative. \
    Be professional but friendly, specific to the prospect, and respectful of their time. \
    Never invent facts about the prospect or their company beyond what is provided. \
    Sign off as \"AI SDR\".";

/// Output contract for anything that produces an email.
pub const EMAIL_JSON_SCHEMA: &str = r#"Return a JSON object with EXACTLY these fields:
{
  "subject": "short subject line",
  "content": "plain-text email body with \n line breaks"
}"#;
