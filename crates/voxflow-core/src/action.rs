//! Action & Handler model (§3, §4.7 "Action interception"). An `Action` is
//! a voice command matched against a completed `Transcribed` segment's text;
//! its `Handler`s run sequentially when it matches.

use serde::{Deserialize, Serialize};

/// When an `apply_to_all_segments` handler's side effects run, relative to
/// the AI rewrite step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionTiming {
    BeforeAi,
    AfterAi,
}

/// A single unit of work an action performs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Handler {
    OpenUrl { url_template: String },
    OpenApp { app_name_template: String },
    QuitApp { app_name_template: String },
    ExecuteShell { command_template: String },
    SegmentOp { op: SegmentOp },
    TransformText { find: String, replace: String },
    CleanUrl,
}

/// Segment-store mutations a `SegmentOp` handler can request (§4.3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentOp {
    DeleteLast(u32),
    Clear,
    ReplaceLast(String),
    LowercaseFirstChar,
}

/// A single matching rule plus the handlers it triggers, and the
/// cross-cutting flags that steer the Flow Supervisor's state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub enabled: bool,
    pub match_patterns: Vec<MatchPattern>,
    pub handlers: Vec<HandlerEntry>,
    pub closes_transcription: bool,
    pub skips_transformation: bool,
    pub skips_all_transforms: bool,
    pub apply_to_all_segments: bool,
    pub timing: ActionTiming,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// One handler entry within an action, carrying the two cross-cutting
/// flags described in §3: `apply_to_next_segment` defers execution by
/// enqueueing onto the Segment Store's pending queue instead of running
/// immediately; `stop_on_success` short-circuits the remaining handlers in
/// this action once this one succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerEntry {
    pub handler: Handler,
    #[serde(default)]
    pub apply_to_next_segment: bool,
    #[serde(default)]
    pub stop_on_success: bool,
}

/// How an action's `match_patterns` are tested against segment text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum MatchPattern {
    Equals(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Regex(String),
}

impl MatchPattern {
    fn matches(&self, normalized: &str) -> bool {
        match self {
            MatchPattern::Equals(p) => normalized == p,
            MatchPattern::StartsWith(p) => normalized.starts_with(p.as_str()),
            MatchPattern::EndsWith(p) => normalized.ends_with(p.as_str()),
            MatchPattern::Contains(p) => normalized.contains(p.as_str()),
            MatchPattern::Regex(p) => regex::Regex::new(p)
                .map(|re| re.is_match(normalized))
                .unwrap_or(false),
        }
    }
}

impl Action {
    /// Matching is against `text.trim().lower()` (unless `case_sensitive`)
    /// with punctuation-normalized tokens (§4.7).
    pub fn matches(&self, text: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let normalized = normalize_for_match(text, self.case_sensitive);
        self.match_patterns.iter().any(|p| {
            let pattern_normalized = normalize_pattern(p, self.case_sensitive);
            pattern_normalized.matches(&normalized)
        })
    }
}

fn normalize_pattern(pattern: &MatchPattern, case_sensitive: bool) -> MatchPattern {
    if case_sensitive {
        return pattern.clone();
    }
    match pattern {
        MatchPattern::Equals(p) => MatchPattern::Equals(p.to_lowercase()),
        MatchPattern::StartsWith(p) => MatchPattern::StartsWith(p.to_lowercase()),
        MatchPattern::EndsWith(p) => MatchPattern::EndsWith(p.to_lowercase()),
        MatchPattern::Contains(p) => MatchPattern::Contains(p.to_lowercase()),
        MatchPattern::Regex(p) => MatchPattern::Regex(p.clone()),
    }
}

/// `text.trim().lower()` with punctuation stripped from the edges of each
/// token, unless `case_sensitive` keeps the original case.
pub fn normalize_for_match(text: &str, case_sensitive: bool) -> String {
    let trimmed = text.trim();
    let cased = if case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    };
    cased
        .split_whitespace()
        .map(|tok| tok.trim_matches(|c: char| c.is_ascii_punctuation()))
        .collect::<Vec<_>>()
        .join(" ")
}
