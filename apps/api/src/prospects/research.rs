//! Prospect research: input validation and enrichment at creation time.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, PRECISE_TEMPERATURE};
use crate::outreach::drafter::{resolve_with_policy, FallbackPolicy, GenerationError};
use crate::prospects::prompts::PAIN_POINT_PROMPT_TEMPLATE;

pub const FALLBACK_PAIN_POINTS: [&str; 3] = [
    "Inefficient sales processes",
    "Lead generation challenges",
    "Poor data quality",
];

const MAX_PAIN_POINTS: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProspectRequest {
    pub name: String,
    pub email: String,
    pub company: String,
    pub title: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub linkedin_url: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub linkedin_url: String,
    pub pain_points: Vec<String>,
    pub used_fallback: bool,
}

/// Trims the request in place and rejects missing identity fields.
pub fn validate_create_request(req: &mut CreateProspectRequest) -> Result<(), AppError> {
    req.name = req.name.trim().to_string();
    req.email = req.email.trim().to_ascii_lowercase();
    req.company = req.company.trim().to_string();

    if req.name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if req.company.is_empty() {
        return Err(AppError::Validation("company cannot be empty".to_string()));
    }
    if !is_plausible_email(&req.email) {
        return Err(AppError::Validation(format!(
            "'{}' is not a valid email address",
            req.email
        )));
    }
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// `https://linkedin.com/in/<name-slug>` guess used when no profile URL is given.
pub fn guess_linkedin_url(name: &str) -> String {
    let slug = name
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-");
    format!("https://linkedin.com/in/{slug}")
}

pub fn build_pain_point_prompt(req: &CreateProspectRequest) -> String {
    PAIN_POINT_PROMPT_TEMPLATE
        .replace("{name}", &req.name)
        .replace("{company}", &req.company)
        .replace("{title}", req.title.as_deref().unwrap_or("unknown"))
        .replace("{industry}", req.industry.as_deref().unwrap_or("unknown"))
}

/// Keeps non-blank, de-duplicated entries, capped at five.
pub fn normalize_pain_points(raw: Vec<String>) -> Result<Vec<String>, GenerationError> {
    let mut out: Vec<String> = Vec::new();
    for point in raw {
        let point = point.trim().to_string();
        if !point.is_empty() && !out.iter().any(|p| p.eq_ignore_ascii_case(&point)) {
            out.push(point);
        }
    }
    if out.is_empty() {
        return Err(GenerationError::Malformed(
            "pain point list is empty".to_string(),
        ));
    }
    out.truncate(MAX_PAIN_POINTS);
    Ok(out)
}

/// Enriches a new prospect. The LLM call is governed by the same fallback
/// policy as email drafting.
pub async fn research_prospect(
    llm: &LlmClient,
    policy: FallbackPolicy,
    req: &CreateProspectRequest,
) -> Result<ResearchReport, AppError> {
    let prompt = build_pain_point_prompt(req);
    let result = llm
        .call_json::<Vec<String>>(&prompt, JSON_ONLY_SYSTEM, PRECISE_TEMPERATURE)
        .await
        .map_err(GenerationError::from)
        .and_then(normalize_pain_points);

    let (pain_points, used_fallback) = resolve_with_policy(result, policy, || {
        FALLBACK_PAIN_POINTS.iter().map(|p| p.to_string()).collect()
    })?;

    info!(
        "Researched prospect {} at {}: {} pain points (fallback={})",
        req.name,
        req.company,
        pain_points.len(),
        used_fallback
    );

    Ok(ResearchReport {
        linkedin_url: req
            .linkedin_url
            .clone()
            .unwrap_or_else(|| guess_linkedin_url(&req.name)),
        pain_points,
        used_fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateProspectRequest {
        CreateProspectRequest {
            name: "  Dana Reyes ".to_string(),
            email: " Dana@Northwind.io ".to_string(),
            company: "Northwind".to_string(),
            title: None,
            industry: Some("Logistics".to_string()),
            company_size: None,
            linkedin_url: None,
            phone: None,
        }
    }

    #[test]
    fn test_validation_trims_and_lowercases() {
        let mut req = request();
        validate_create_request(&mut req).unwrap();
        assert_eq!(req.name, "Dana Reyes");
        assert_eq!(req.email, "dana@northwind.io");
    }

    #[test]
    fn test_validation_rejects_blank_name() {
        let mut req = request();
        req.name = "   ".to_string();
        assert!(matches!(
            validate_create_request(&mut req),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validation_rejects_bad_emails() {
        for bad in ["dana", "dana@", "@northwind.io", "dana@northwind", "da na@northwind.io"] {
            let mut req = request();
            req.email = bad.to_string();
            assert!(validate_create_request(&mut req).is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn test_linkedin_guess() {
        assert_eq!(
            guess_linkedin_url("Dana  Maria Reyes"),
            "https://linkedin.com/in/dana-maria-reyes"
        );
    }

    #[test]
    fn test_prompt_defaults_unknown_fields() {
        let prompt = build_pain_point_prompt(&request());
        assert!(prompt.contains("Title: unknown"));
        assert!(prompt.contains("Industry: Logistics"));
    }

    #[test]
    fn test_normalize_dedups_and_caps() {
        let raw = vec![
            "Slow onboarding".to_string(),
            "slow onboarding".to_string(),
            " ".to_string(),
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
            "D".to_string(),
            "E".to_string(),
        ];
        let points = normalize_pain_points(raw).unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], "Slow onboarding");
        assert_eq!(points[1], "A");
    }

    #[test]
    fn test_normalize_rejects_empty_list() {
        assert!(matches!(
            normalize_pain_points(vec![]),
            Err(GenerationError::Malformed(_))
        ));
    }
}
