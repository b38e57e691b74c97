//! Email drafting: turns a prospect profile and an email type into subject/content.
//!
//! The LLM is the primary drafter. When it fails, `FallbackPolicy` decides
//! explicitly whether the canned template is substituted:
//!
//! | policy         | transport failure | malformed output |
//! |----------------|-------------------|------------------|
//! | `never`        | error             | error            |
//! | `on_malformed` | error             | template         |
//! | `always`       | template          | template         |
//!
//! Every draft reports whether the template was used, so callers never have to
//! guess which path produced the copy.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::cadence::models::EmailType;
use crate::llm_client::prompts::{EMAIL_JSON_SCHEMA, JSON_ONLY_SYSTEM, SENDER_VOICE_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError, DRAFTING_TEMPERATURE};
use crate::models::prospect::ProspectRow;
use crate::outreach::prompts::{
    follow_up_hint, FOLLOW_UP_PROMPT_TEMPLATE, INITIAL_EMAIL_PROMPT_TEMPLATE,
};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredEmail {
    pub subject: String,
    pub content: String,
}

/// The slice of a prospect the drafters are allowed to see.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProspectProfile {
    pub name: String,
    pub company: String,
    pub title: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub pain_points: Vec<String>,
}

impl From<&ProspectRow> for ProspectProfile {
    fn from(row: &ProspectRow) -> Self {
        Self {
            name: row.name.clone(),
            company: row.company.clone(),
            title: row.title.clone(),
            industry: row.industry.clone(),
            pain_points: row.pain_points.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftOutcome {
    pub email_type: EmailType,
    pub email: StructuredEmail,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The model was never reached or never answered usefully.
    #[error("LLM transport failure: {0}")]
    Transport(String),

    /// The model answered, but not with the structure we asked for.
    #[error("Malformed LLM output: {0}")]
    Malformed(String),
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        if err.is_transport() {
            GenerationError::Transport(err.to_string())
        } else {
            GenerationError::Malformed(err.to_string())
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fallback policy
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    Never,
    #[default]
    OnMalformed,
    Always,
}

impl FallbackPolicy {
    pub fn allows(&self, err: &GenerationError) -> bool {
        match self {
            FallbackPolicy::Never => false,
            FallbackPolicy::OnMalformed => matches!(err, GenerationError::Malformed(_)),
            FallbackPolicy::Always => true,
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FallbackPolicy::Never => "never",
            FallbackPolicy::OnMalformed => "on_malformed",
            FallbackPolicy::Always => "always",
        })
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(FallbackPolicy::Never),
            "on_malformed" => Ok(FallbackPolicy::OnMalformed),
            "always" => Ok(FallbackPolicy::Always),
            other => Err(format!("unknown fallback policy '{other}'")),
        }
    }
}

/// Applies `policy` to a generation result. Returns the value and whether the
/// fallback produced it.
pub fn resolve_with_policy<T>(
    result: Result<T, GenerationError>,
    policy: FallbackPolicy,
    fallback: impl FnOnce() -> T,
) -> Result<(T, bool), GenerationError> {
    match result {
        Ok(value) => Ok((value, false)),
        Err(err) if policy.allows(&err) => {
            warn!("Using template fallback under policy '{policy}': {err}");
            Ok((fallback(), true))
        }
        Err(err) => Err(err),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Drafters
// ────────────────────────────────────────────────────────────────────────────

/// Pluggable email drafter. Carried in `AppState` as `Arc<dyn EmailDrafter>`.
#[async_trait]
pub trait EmailDrafter: Send + Sync {
    async fn draft(
        &self,
        profile: &ProspectProfile,
        email_type: EmailType,
    ) -> Result<StructuredEmail, GenerationError>;
}

/// Drafts emails through the LLM client.
pub struct LlmEmailDrafter(pub LlmClient);

#[async_trait]
impl EmailDrafter for LlmEmailDrafter {
    async fn draft(
        &self,
        profile: &ProspectProfile,
        email_type: EmailType,
    ) -> Result<StructuredEmail, GenerationError> {
        let prompt = build_email_prompt(profile, email_type);
        let email: StructuredEmail = self
            .0
            .call_json(&prompt, JSON_ONLY_SYSTEM, DRAFTING_TEMPERATURE)
            .await?;
        validate_email(email)
    }
}

/// Rejects structurally valid JSON that is still unusable as an email.
pub fn validate_email(email: StructuredEmail) -> Result<StructuredEmail, GenerationError> {
    if email.subject.trim().is_empty() {
        return Err(GenerationError::Malformed("email subject is empty".to_string()));
    }
    if email.content.trim().is_empty() {
        return Err(GenerationError::Malformed("email content is empty".to_string()));
    }
    Ok(email)
}

pub fn build_email_prompt(profile: &ProspectProfile, email_type: EmailType) -> String {
    let industry = profile.industry.as_deref().unwrap_or("unknown");
    let template = match email_type {
        EmailType::Initial => INITIAL_EMAIL_PROMPT_TEMPLATE
            .replace("{title}", profile.title.as_deref().unwrap_or("unknown"))
            .replace("{pain_points}", &format_pain_points(&profile.pain_points)),
        EmailType::FollowUp(n) => FOLLOW_UP_PROMPT_TEMPLATE
            .replace("{number}", &n.to_string())
            .replace("{hint}", &follow_up_hint(n, &profile.company)),
    };
    template
        .replace("{voice}", SENDER_VOICE_INSTRUCTION)
        .replace("{schema}", EMAIL_JSON_SCHEMA)
        .replace("{name}", &profile.name)
        .replace("{company}", &profile.company)
        .replace("{industry}", industry)
}

fn format_pain_points(pain_points: &[String]) -> String {
    if pain_points.is_empty() {
        "none identified".to_string()
    } else {
        pain_points.join("; ")
    }
}

/// Canned copy used when the fallback policy allows it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEmailDrafter;

impl TemplateEmailDrafter {
    pub fn compose(&self, profile: &ProspectProfile, email_type: EmailType) -> StructuredEmail {
        let name = &profile.name;
        let company = &profile.company;
        match email_type {
            EmailType::Initial => {
                let industry = profile.industry.as_deref().unwrap_or("your industry");
                StructuredEmail {
                    subject: format!("Quick question about {company}'s sales process"),
                    content: format!(
                        "Hi {name},\n\n\
                         I noticed {company} is doing great work in {industry}. \
                         I'm curious - how are you currently handling your lead generation and sales outreach?\n\n\
                         We've helped similar companies increase their sales efficiency by 35%. \
                         Would love to share a quick insight that might be relevant.\n\n\
                         Worth a brief chat?\n\n\
                         Best,\nAI SDR"
                    ),
                }
            }
            EmailType::FollowUp(_) => StructuredEmail {
                subject: format!("Re: {company} sales process"),
                content: format!(
                    "Hi {name},\n\n\
                     Just following up on my previous email. \
                     Would love to help {company} improve sales efficiency.\n\n\
                     Best,\nAI SDR"
                ),
            },
        }
    }
}

/// Drafts with `primary`, applying `policy` on failure.
pub async fn draft_with_policy(
    primary: &dyn EmailDrafter,
    policy: FallbackPolicy,
    profile: &ProspectProfile,
    email_type: EmailType,
) -> Result<DraftOutcome, GenerationError> {
    let result = primary.draft(profile, email_type).await;
    let (email, used_fallback) = resolve_with_policy(result, policy, || {
        TemplateEmailDrafter.compose(profile, email_type)
    })?;
    Ok(DraftOutcome {
        email_type,
        email,
        used_fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubDrafter(Result<StructuredEmail, GenerationError>);

    #[async_trait]
    impl EmailDrafter for StubDrafter {
        async fn draft(
            &self,
            _profile: &ProspectProfile,
            _email_type: EmailType,
        ) -> Result<StructuredEmail, GenerationError> {
            self.0.clone()
        }
    }

    fn profile() -> ProspectProfile {
        ProspectProfile {
            name: "Dana Reyes".to_string(),
            company: "Northwind".to_string(),
            title: Some("VP Sales".to_string()),
            industry: Some("Logistics".to_string()),
            pain_points: vec!["Manual prospect research".to_string()],
        }
    }

    fn llm_email() -> StructuredEmail {
        StructuredEmail {
            subject: "Shipping faster at Northwind".to_string(),
            content: "Hi Dana, ...".to_string(),
        }
    }

    #[test]
    fn test_policy_matrix() {
        let transport = GenerationError::Transport("timeout".to_string());
        let malformed = GenerationError::Malformed("not json".to_string());

        assert!(!FallbackPolicy::Never.allows(&transport));
        assert!(!FallbackPolicy::Never.allows(&malformed));
        assert!(!FallbackPolicy::OnMalformed.allows(&transport));
        assert!(FallbackPolicy::OnMalformed.allows(&malformed));
        assert!(FallbackPolicy::Always.allows(&transport));
        assert!(FallbackPolicy::Always.allows(&malformed));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("never".parse::<FallbackPolicy>().unwrap(), FallbackPolicy::Never);
        assert_eq!(
            " ON_MALFORMED ".parse::<FallbackPolicy>().unwrap(),
            FallbackPolicy::OnMalformed
        );
        assert!("sometimes".parse::<FallbackPolicy>().is_err());
        assert_eq!(FallbackPolicy::default(), FallbackPolicy::OnMalformed);
    }

    #[test]
    fn test_llm_errors_are_classified() {
        let transport: GenerationError = LlmError::RateLimited { retries: 3 }.into();
        assert!(matches!(transport, GenerationError::Transport(_)));
        let malformed: GenerationError = LlmError::EmptyContent.into();
        assert!(matches!(malformed, GenerationError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_successful_draft_is_not_fallback() {
        let drafter = StubDrafter(Ok(llm_email()));
        let outcome = draft_with_policy(&drafter, FallbackPolicy::Always, &profile(), EmailType::Initial)
            .await
            .unwrap();
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.email, llm_email());
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back_by_default() {
        let drafter = StubDrafter(Err(GenerationError::Malformed("prose".to_string())));
        let outcome = draft_with_policy(
            &drafter,
            FallbackPolicy::default(),
            &profile(),
            EmailType::FollowUp(2),
        )
        .await
        .unwrap();
        assert!(outcome.used_fallback);
        assert_eq!(outcome.email.subject, "Re: Northwind sales process");
        assert_eq!(outcome.email_type, EmailType::FollowUp(2));
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_by_default() {
        let drafter = StubDrafter(Err(GenerationError::Transport("connection reset".to_string())));
        let result = draft_with_policy(
            &drafter,
            FallbackPolicy::default(),
            &profile(),
            EmailType::Initial,
        )
        .await;
        assert_eq!(
            result.unwrap_err(),
            GenerationError::Transport("connection reset".to_string())
        );
    }

    #[tokio::test]
    async fn test_never_policy_surfaces_malformed() {
        let drafter = StubDrafter(Err(GenerationError::Malformed("prose".to_string())));
        let result =
            draft_with_policy(&drafter, FallbackPolicy::Never, &profile(), EmailType::Initial).await;
        assert!(matches!(result, Err(GenerationError::Malformed(_))));
    }

    #[test]
    fn test_initial_template_mentions_company_and_industry() {
        let email = TemplateEmailDrafter.compose(&profile(), EmailType::Initial);
        assert_eq!(email.subject, "Quick question about Northwind's sales process");
        assert!(email.content.starts_with("Hi Dana Reyes,"));
        assert!(email.content.contains("great work in Logistics"));
        assert!(email.content.ends_with("AI SDR"));
    }

    #[test]
    fn test_initial_template_without_industry() {
        let mut p = profile();
        p.industry = None;
        let email = TemplateEmailDrafter.compose(&p, EmailType::Initial);
        assert!(email.content.contains("great work in your industry"));
    }

    #[test]
    fn test_validate_email_rejects_blank_fields() {
        let blank_subject = StructuredEmail {
            subject: "  ".to_string(),
            content: "body".to_string(),
        };
        assert!(matches!(
            validate_email(blank_subject),
            Err(GenerationError::Malformed(_))
        ));
        assert!(validate_email(llm_email()).is_ok());
    }

    #[test]
    fn test_initial_prompt_fills_every_placeholder() {
        let prompt = build_email_prompt(&profile(), EmailType::Initial);
        assert!(prompt.contains("Prospect: Dana Reyes"));
        assert!(prompt.contains("Title: VP Sales"));
        assert!(prompt.contains("Manual prospect research"));
        assert!(!prompt.contains("{name}"));
        assert!(!prompt.contains("{schema}"));
        assert!(!prompt.contains("{voice}"));
    }

    #[test]
    fn test_follow_up_prompt_uses_sequence_hint() {
        let prompt = build_email_prompt(&profile(), EmailType::FollowUp(3));
        assert!(prompt.contains("follow-up email #3"));
        assert!(prompt.contains("biggest challenge with lead generation"));
        assert!(!prompt.contains("{hint}"));
    }

    #[test]
    fn test_resolve_with_policy_passes_through_success() {
        let (value, used) =
            resolve_with_policy(Ok(7), FallbackPolicy::Never, || 0).unwrap();
        assert_eq!(value, 7);
        assert!(!used);
    }
}
