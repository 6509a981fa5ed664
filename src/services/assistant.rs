//! Teacher writing assistant backed by the LLM integration

use std::sync::Arc;

use tracing::debug;

use crate::config::FeaturesConfig;
use crate::database::PassStore;
use crate::models::*;
use crate::utils::errors::{Result, TeachersPetError};
use crate::utils::helpers::normalize_email;
use crate::utils::logging::log_api_error;

use super::llm::LlmService;

const RECENT_SESSIONS: i64 = 10;
const MAX_NOTES: usize = 5;

/// Prompt asking for rubric-based feedback on a piece of student work
pub fn feedback_prompt(request: &FeedbackRequest) -> String {
    format!(
        "You are an experienced teacher giving feedback on student work.\n\n\
         Subject: {subject}\n\
         Assignment Type: {kind}\n\n\
         Grading Rubric:\n{rubric}\n\n\
         Student Work Description:\n{work}\n\n\
         Write personalized, constructive feedback that:\n\
         1. Points out specific strengths\n\
         2. Names areas for improvement with actionable suggestions\n\
         3. Is encouraging and supportive\n\
         4. Refers to the rubric criteria\n\
         5. Suits the subject and assignment type\n\n\
         Keep the feedback to 2-3 paragraphs.",
        subject = non_empty(request.subject.as_deref()).unwrap_or("General"),
        kind = non_empty(request.assignment_type.as_deref()).unwrap_or("Assignment"),
        rubric = request.rubric.trim(),
        work = request.student_work.trim(),
    )
}

/// Prompt asking for a parent message, with the student's recent pass history as context
pub fn parent_message_prompt(
    request: &ParentMessageRequest,
    teacher_name: &str,
    recent_passes: usize,
    notes: &[String],
) -> String {
    let tone = Tone::parse_or_default(request.tone.as_deref());
    let notes = if notes.is_empty() {
        "None".to_string()
    } else {
        notes.join("; ")
    };

    format!(
        "You are a teacher drafting a message to a student's parent or guardian.\n\n\
         Student: {student}\n\
         Tone: {tone} - {instructions}\n\n\
         Context provided by the teacher:\n{context}\n\n\
         Student Data:\n\
         - Recent pass usage: {recent_passes} passes in recent history\n\
         - Recent teacher notes: {notes}\n\n\
         Write a parent message that:\n\
         1. Addresses the parent appropriately\n\
         2. Clearly explains the situation\n\
         3. Offers collaboration and support\n\
         4. Keeps the requested tone\n\
         5. Invites further discussion\n\
         6. Signs off from the teacher\n\n\
         Keep it to 3-4 paragraphs. Sign it with the teacher's name \"{teacher_name}\".",
        student = request.student_name.trim(),
        tone = tone,
        instructions = tone.instructions(),
        context = non_empty(request.context.as_deref()).unwrap_or("General update"),
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct AssistantService {
    store: Arc<dyn PassStore>,
    llm: LlmService,
    features: FeaturesConfig,
}

impl AssistantService {
    pub fn new(store: Arc<dyn PassStore>, llm: LlmService, features: FeaturesConfig) -> Self {
        Self { store, llm, features }
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.features.ai_assistant {
            Ok(())
        } else {
            Err(TeachersPetError::ServiceUnavailable("the AI assistant is disabled".to_string()))
        }
    }

    pub async fn grading_feedback(&self, request: FeedbackRequest) -> Result<FeedbackResponse> {
        self.ensure_enabled()?;
        if request.rubric.trim().is_empty() || request.student_work.trim().is_empty() {
            return Err(TeachersPetError::InvalidInput("Rubric and student work are required".to_string()));
        }

        let feedback = self.generate(&feedback_prompt(&request)).await?;
        Ok(FeedbackResponse { feedback })
    }

    pub async fn parent_message(&self, teacher: &User, request: ParentMessageRequest) -> Result<ParentMessageResponse> {
        self.ensure_enabled()?;
        if request.student_name.trim().is_empty() {
            return Err(TeachersPetError::InvalidInput("Student name is required".to_string()));
        }

        let email = normalize_email(&request.student_email);
        let sessions = self.store.list_sessions_for_student(&email, RECENT_SESSIONS).await?;
        let notes: Vec<String> = sessions
            .iter()
            .filter_map(|s| s.teacher_notes.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .take(MAX_NOTES)
            .map(str::to_string)
            .collect();

        let prompt = parent_message_prompt(&request, &teacher.full_name, sessions.len(), &notes);
        let message = self.generate(&prompt).await?;
        Ok(ParentMessageResponse { message })
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(prompt_chars = prompt.len(), "Requesting completion");
        self.llm.complete(prompt).await.map_err(|e| {
            log_api_error("llm", &e.to_string(), None);
            TeachersPetError::Integration(e)
        })
    }
}
