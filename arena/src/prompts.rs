//! Prompt templates for the three debate actions.
//!
//! Rendering is pure: a template plus a complete [`PromptParams`] always yields
//! the same string. A placeholder with no supplied value is a [`TemplateError`];
//! nothing is defaulted.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever template text changes so a
//! transcript can be traced back to the wording that produced it.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::score::ScoreLedger;

/// Prompt version. Bump on any template content change.
pub const PROMPT_VERSION: &str = "1.2.0";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z0-9_]+)\}").expect("placeholder pattern is valid"));

const DEFENSE_TEMPLATE: &str = "\
You're an eloquent advocate defending this answer: {answer} to the question: {question}. \
Your opponent defends: {opponent_answer}. Convince the audience your argument is better. \
Use the latest feedback and your opponent's last argument to improve your case.
Latest feedback: {feedback}
Opponent's last argument: {opponent_argument}
Respond in under 80 words.
Your defense:";

const FEEDBACK_TEMPLATE: &str = "\
You're a fair, impartial judge in a debate on: \"{question}\". \
Answer 1: \"{answer1}\". Answer 2: \"{answer2}\".
Your goal is to provide feedback that will help advocates improve and differentiate \
their arguments more clearly.
Current round: {current_round}
Total rounds: {total_rounds}
Previous scores: {previous_scores}

Defense for 1st answer: {defense1}
Defense for 2nd answer: {defense2}

Provide specific, constructive feedback to help each advocate strengthen their unique position. \
Encourage them to address weaknesses and highlight distinctions.
Aim for your feedback to lead to more divergent scores in future rounds.
Give your feedback in under 50 words:";

const SCORING_TEMPLATE: &str = "\
You're a fair, impartial judge scoring a debate on: \"{question}\". \
Answer 1: \"{answer1}\". Answer 2: \"{answer2}\".
Current round: {current_round}
Total rounds: {total_rounds}
Previous scores: {previous_scores}

Last defense for 1st answer: {defense1}
Last defense for 2nd answer: {defense2}

Score each answer between 1 and 20. The stronger argument should get a score closer to 20, \
the weaker closer to 1.
Aim for a greater score difference than in previous rounds, unless one side is clearly dominant.
Return only the score tuple (score1, score2). Example: (18, 9)
Your scores:";

/// The three prompt templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Defense,
    Feedback,
    Scoring,
}

impl Template {
    fn text(self) -> &'static str {
        match self {
            Self::Defense => DEFENSE_TEMPLATE,
            Self::Feedback => FEEDBACK_TEMPLATE,
            Self::Scoring => SCORING_TEMPLATE,
        }
    }

    /// Placeholder names the template requires, in order of first appearance.
    pub fn placeholders(self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for cap in PLACEHOLDER.captures_iter(self.text()) {
            if let Some(m) = cap.get(1) {
                if !names.contains(&m.as_str()) {
                    names.push(m.as_str());
                }
            }
        }
        names
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defense => write!(f, "defense"),
            Self::Feedback => write!(f, "feedback"),
            Self::Scoring => write!(f, "scoring"),
        }
    }
}

/// A required template parameter was not supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("{template} template is missing parameter `{name}`")]
    MissingParameter { template: Template, name: String },
}

/// Named values substituted into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptParams {
    values: BTreeMap<String, String>,
}

impl PromptParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, value: impl ToString) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Render `template`, substituting every placeholder from `params`.
pub fn render(template: Template, params: &PromptParams) -> Result<String, TemplateError> {
    let text = template.text();
    let mut out = String::with_capacity(text.len() + 256);
    let mut last = 0;

    for cap in PLACEHOLDER.captures_iter(text) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let value = params
            .get(name.as_str())
            .ok_or_else(|| TemplateError::MissingParameter {
                template,
                name: name.as_str().to_string(),
            })?;
        out.push_str(&text[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

/// Parameters of an advocate's defense prompt.
#[derive(Debug, Clone, Copy)]
pub struct DefensePrompt<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    pub opponent_answer: &'a str,
    pub opponent_argument: &'a str,
    pub feedback: &'a str,
}

impl DefensePrompt<'_> {
    pub fn params(&self) -> PromptParams {
        PromptParams::new()
            .set("question", self.question)
            .set("answer", self.answer)
            .set("opponent_answer", self.opponent_answer)
            .set("opponent_argument", self.opponent_argument)
            .set("feedback", self.feedback)
    }

    pub fn render(&self) -> Result<String, TemplateError> {
        render(Template::Defense, &self.params())
    }
}

/// Parameters shared by the judge's feedback and the scorer's scoring prompts.
#[derive(Debug, Clone, Copy)]
pub struct RoundPrompt<'a> {
    pub question: &'a str,
    pub answer1: &'a str,
    pub answer2: &'a str,
    pub defense1: &'a str,
    pub defense2: &'a str,
    pub current_round: u32,
    pub total_rounds: u32,
    pub previous_scores: &'a ScoreLedger,
}

impl RoundPrompt<'_> {
    pub fn params(&self) -> PromptParams {
        PromptParams::new()
            .set("question", self.question)
            .set("answer1", self.answer1)
            .set("answer2", self.answer2)
            .set("defense1", self.defense1)
            .set("defense2", self.defense2)
            .set("current_round", self.current_round)
            .set("total_rounds", self.total_rounds)
            .set("previous_scores", self.previous_scores.render())
    }

    pub fn render(&self, template: Template) -> Result<String, TemplateError> {
        render(template, &self.params())
    }
}
