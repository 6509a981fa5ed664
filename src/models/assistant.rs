//! AI assistant request and response types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tone requested for a drafted parent message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    #[default]
    Friendly,
    Concerned,
    Encouraging,
}

impl Tone {
    /// Unknown or missing tones fall back to friendly
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("formal") => Tone::Formal,
            Some("concerned") => Tone::Concerned,
            Some("encouraging") => Tone::Encouraging,
            _ => Tone::Friendly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Friendly => "friendly",
            Tone::Concerned => "concerned",
            Tone::Encouraging => "encouraging",
        }
    }

    pub fn instructions(&self) -> &'static str {
        match self {
            Tone::Formal => "Use professional, formal language appropriate for official school communication.",
            Tone::Friendly => "Use warm, approachable language while maintaining professionalism.",
            Tone::Concerned => "Express genuine concern with empathy, while being clear about issues.",
            Tone::Encouraging => "Focus on positive aspects and growth potential, be uplifting.",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub rubric: String,
    pub student_work: String,
    pub subject: Option<String>,
    pub assignment_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentMessageRequest {
    pub student_name: String,
    pub student_email: String,
    pub tone: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentMessageResponse {
    pub message: String,
}
