//! Interviewer script and summarizer prompts.
//!
//! The interviewer script is configuration: `PromptTemplate` starts from the
//! built-in script below and can be replaced wholesale by a file on disk.

use std::path::Path;

use anyhow::{Context, Result};

use crate::interview::summary::SessionSummary;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// Built-in interviewer script. Placeholders: `{interviewer_name}`,
/// `{cv_summary}`, `{jd_summary}`.
pub const DEFAULT_INTERVIEWER_SCRIPT: &str = r#"You are "{interviewer_name}," an AI interviewer.

Inputs:
Resume summary: {cv_summary}
Job description summary: {jd_summary}

Opening (say once):
"Hi, I'm {interviewer_name}, your AI interviewer. We'll go one question at a time. Please answer briefly, be specific, and speak clearly."

Language & Multilingual Behavior:
- By default, conduct the interview in English.
- If the candidate explicitly asks you to switch to Hindi (e.g., "ask me in Hindi", "let's switch to Hindi") or starts consistently answering in Hindi, then from that point onwards you MUST:
  • Ask all questions in Hindi.
  • Respond only in natural, simple Hindi, using Devanagari script.
- Stay in Hindi mode until the candidate clearly asks to switch back to English.
- Always respond in the same language as your current question, unless the candidate explicitly asks you to translate or use another language.

Rules:
- Ask ONE short question at a time (1-2 sentences); wait for the answer.
- Don't ask compound questions. If a pair is common (e.g., strengths vs weaknesses), ask in separate turns.
- After each answer, ask ONE brief follow-up (at most 1 sentence) if needed.
- Do NOT repeat questions or parrot the candidate's wording.
- Use brief transitions every 2-3 questions ("Moving on...", "Next up...").
- Always end with a question, except during interruptions.

Interruption / Barge-in (strict):
- If the candidate starts speaking while you're responding: cancel and output NOTHING.
- Wait silently; respond only to the NEXT finalized utterance.
- Treat "stop", "hold on" and "wait" as control signals; stop and wait (no content reply).

Question Flow (10-12 total):
a) Generic (1-2 questions): strengths, weaknesses, a challenging situation and how it was handled.
b) JD-based (4-5 questions): experience with the role's responsibilities, approach to its tasks, proficiency with its tools.
c) Resume-based (2-3 questions): career progression, a project where a listed skill was applied.

Closure:
- Thank the candidate: "Thank you for your time. We'll be in touch with next steps via email."

Tone & Style:
- Professional yet approachable.
- Clear and concise."#;

/// Role framing for the summarizer call. Combined with `JSON_ONLY_SYSTEM`.
const SUMMARY_ROLE: &str = "You are an expert technical recruiter. \
    Condense a candidate resume and a job description into two short summaries \
    an interviewer can work from.";

/// Summarizer user turn. Replace `{cv_text}` and `{jd_text}` before sending.
const SUMMARY_PROMPT_TEMPLATE: &str = r#"Summarize the resume and the job description below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "cvSummary": "5-8 sentences: roles, years of experience, key skills, notable projects",
  "jdSummary": "4-6 sentences: title, seniority, core responsibilities, required tools"
}

Resume:
{cv_text}

Job Description:
{jd_text}"#;

/// The interviewer script with persona name bound.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    interviewer_name: String,
    script: String,
}

impl PromptTemplate {
    pub fn new(interviewer_name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            interviewer_name: interviewer_name.into(),
            script: script.into(),
        }
    }

    /// Built-in script, or the file at `path` when given.
    pub fn load(interviewer_name: &str, path: Option<&Path>) -> Result<Self> {
        let script = match path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read interviewer script {}", path.display()))?,
            None => DEFAULT_INTERVIEWER_SCRIPT.to_string(),
        };
        Ok(Self::new(interviewer_name, script.trim()))
    }

    /// Builds the system prompt for a fresh interview. Pure: identical summaries
    /// always yield byte-identical output.
    pub fn build_system_prompt(&self, summary: &SessionSummary) -> String {
        render_placeholders(
            &self.script,
            &[
                ("interviewer_name", self.interviewer_name.as_str()),
                ("cv_summary", summary.cv_summary.as_str()),
                ("jd_summary", summary.jd_summary.as_str()),
            ],
        )
    }
}

/// System prompt for the summarizer call.
pub fn summary_system_prompt() -> String {
    format!("{SUMMARY_ROLE} {JSON_ONLY_SYSTEM}")
}

/// User turn for the summarizer call.
pub fn summary_user_prompt(cv_text: &str, jd_text: &str) -> String {
    render_placeholders(
        SUMMARY_PROMPT_TEMPLATE,
        &[("cv_text", cv_text), ("jd_text", jd_text)],
    )
}

/// Single-pass `{key}` substitution. Substituted values are never rescanned, so
/// candidate text containing `{jd_summary}` stays literal.
fn render_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let replaced = tail.find('}').and_then(|close| {
            let key = &tail[1..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (close, *v))
        });
        match replaced {
            Some((close, value)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
