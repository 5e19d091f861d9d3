//! Prompt templates for every interview phase.
//!
//! Templates are plain text with two placeholders, `{theme}` and `{context}`.
//! There is one field per [`Phase`] and [`PromptTemplates::for_phase`] is an
//! exhaustive match, so adding a phase without a template does not compile.
//! Every field can be overridden from the `[templates]` configuration table.

use serde::Deserialize;

use crate::error::InterviewError;
use crate::phase::Phase;

const THEME: &str = "{theme}";
const CONTEXT: &str = "{context}";

const PERSONAL_ATTRIBUTES: &str = "\
You are an interviewer conducting an interview about {theme}.
Collect the respondent's basic profile.

Conversation so far:
{context}

Guidelines for the next question:
- Start with demographics (age, occupation and household are required).
- Include questions about lifestyle and values.
- Ask about hobbies and habits related to {theme}.
- Ask exactly one question per turn. Never combine several questions.
- This phase covers five questions in total.
- Keep acknowledgements to a minimum.";

const USAGE_SITUATION: &str = "\
You are an interviewer conducting an interview about {theme}.
Explore in detail how and when the respondent uses {theme}.

Conversation so far:
{context}

Guidelines for the next question:
- In which situations they use {theme}, with concrete episodes.
- What satisfied and dissatisfied them when using it, with concrete episodes.
- The feelings and expectations they have when using {theme}, with concrete episodes.
- Features they wish {theme} had, with concrete episodes.
- Ask exactly one question per turn.
- Dig into why they think so.
- When useful, check whether the need is really unmet by other providers.
- This phase covers five questions in total.
- Keep acknowledgements to a minimum.";

const PURCHASE_INTENTION: &str = "\
You are an interviewer conducting an interview about {theme}.
Dig into how the respondent decides which {theme} to choose.

Conversation so far:
{context}

Guidelines for the next question:
- Ask which factors matter when choosing (price, quality, brand and so on) and why they matter.
- Ask concretely what triggered the choice and which information sources were used.
- Ask concretely about satisfaction and dissatisfaction after choosing.
- Ask exactly one question per turn.
- Dig into why they think so.
- When useful, check whether the need is really unmet by other providers.
- This phase covers five questions in total.
- Keep acknowledgements to a minimum.";

const COMPETITOR_ANALYSIS: &str = "\
You are an interviewer conducting an interview about {theme}.
Investigate how the respondent perceives competing products and brands.

Conversation so far:
{context}

Guidelines for the next question:
- Which competing brands they know and what characterises them, with concrete episodes.
- How they compare with competitors and why they chose as they did, with concrete episodes.
- Their impressions of and expectations for competitors, with concrete episodes.
- Ask exactly one question per turn.
- Dig into why they think so.
- This phase covers five questions in total.
- Keep acknowledgements to a minimum.";

const SUMMARY: &str = "\
Theme: {theme}

Analyse the whole interview and write an analysis report in exactly this format,
one item per line:

1. What kind of {theme} gets chosen:
2. Why the respondent chose their current {theme}:
3. Its appeal compared with other {theme} offerings:
4. What they would prioritise when choosing {theme} in the future:
5. Dissatisfaction and problems with {theme}:
6. New characteristics or features they want from {theme}:

Conversation so far:
{context}";

const OPENING: &str = "\
The interview has not started yet. Ask only what the respondent would like to be \
called. Throughout the whole interview, never ask more than one question per turn.";

const INTRODUCTION: &str = "\
This interview helps us bring consumers' real voices into product development. \
Your answers will be anonymised.";

const CLOSING: &str = "The interview is complete. Thank you very much.";

/// Instruction text for each phase plus the fixed introduction and closing
/// messages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub personal_attributes: String,
    pub usage_situation: String,
    pub purchase_intention: String,
    pub competitor_analysis: String,
    pub summary: String,
    /// Used as `{context}` for the very first question.
    pub opening: String,
    /// Shown before the first question.
    pub introduction: String,
    /// Shown after the summary.
    pub closing: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            personal_attributes: PERSONAL_ATTRIBUTES.to_string(),
            usage_situation: USAGE_SITUATION.to_string(),
            purchase_intention: PURCHASE_INTENTION.to_string(),
            competitor_analysis: COMPETITOR_ANALYSIS.to_string(),
            summary: SUMMARY.to_string(),
            opening: OPENING.to_string(),
            introduction: INTRODUCTION.to_string(),
            closing: CLOSING.to_string(),
        }
    }
}

impl PromptTemplates {
    /// The unfilled template for `phase`.
    pub fn for_phase(&self, phase: Phase) -> &str {
        match phase {
            Phase::PersonalAttributes => &self.personal_attributes,
            Phase::UsageSituation => &self.usage_situation,
            Phase::PurchaseIntention => &self.purchase_intention,
            Phase::CompetitorAnalysis => &self.competitor_analysis,
            Phase::Summary => &self.summary,
        }
    }

    /// Fills the template for `phase` with `theme` and `context`.
    pub fn render(&self, phase: Phase, theme: &str, context: &str) -> String {
        fill(self.for_phase(phase), theme, context)
    }

    /// Rejects phase templates that are missing a placeholder.
    pub fn validate(&self) -> Result<(), InterviewError> {
        for phase in Phase::ALL {
            let template = self.for_phase(phase);
            for placeholder in [THEME, CONTEXT] {
                if !template.contains(placeholder) {
                    return Err(InterviewError::InvalidTemplate(format!(
                        "template for {phase} is missing {placeholder}"
                    )));
                }
            }
        }
        if self.closing.trim().is_empty() {
            return Err(InterviewError::InvalidTemplate(
                "closing message must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Substitutes placeholders in a single pass, so placeholder-like text inside
/// `theme` or `context` is never expanded a second time.
pub fn fill(template: &str, theme: &str, context: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if tail.starts_with(THEME) {
            out.push_str(theme);
            rest = &tail[THEME.len()..];
        } else if tail.starts_with(CONTEXT) {
            out.push_str(context);
            rest = &tail[CONTEXT.len()..];
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PromptTemplates::default()
            .validate()
            .expect("built-in templates should validate");
    }

    #[test]
    fn every_phase_has_its_own_template() {
        let templates = PromptTemplates::default();
        let mut seen = std::collections::HashSet::new();
        for phase in Phase::ALL {
            assert!(seen.insert(templates.for_phase(phase)), "{phase} shares a template");
        }
    }

    #[test]
    fn fill_replaces_every_occurrence() {
        let filled = fill("{theme} and {theme}: {context}", "tea", "User: hi\n");
        assert_eq!(filled, "tea and tea: User: hi\n");
    }

    #[test]
    fn fill_does_not_expand_placeholders_inside_values() {
        let filled = fill("[{context}] {theme}", "{context}", "User: my {theme}\n");
        assert_eq!(filled, "[User: my {theme}\n] {context}");
    }

    #[test]
    fn fill_keeps_unknown_braces() {
        assert_eq!(fill("{x} {theme} {", "tea", ""), "{x} tea {");
    }

    #[test]
    fn summary_template_lists_six_sections() {
        let rendered = PromptTemplates::default().render(Phase::Summary, "coffee", "");
        for n in 1..=6 {
            assert!(rendered.contains(&format!("{n}. ")), "missing section {n}");
        }
        assert!(!rendered.contains("7. "));
    }

    #[test]
    fn validate_rejects_missing_context() {
        let templates = PromptTemplates {
            usage_situation: "Ask about {theme}.".to_string(),
            ..PromptTemplates::default()
        };
        let err = templates.validate().unwrap_err();
        assert!(err.to_string().contains("usage_situation"));
        assert!(err.to_string().contains("{context}"));
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let templates: PromptTemplates =
            serde_json::from_str(r#"{"closing":"Thanks!"}"#).unwrap();
        assert_eq!(templates.closing, "Thanks!");
        assert_eq!(templates.summary, PromptTemplates::default().summary);
    }
}
