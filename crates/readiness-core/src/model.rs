//! Core data model types for readiness.
//!
//! Learners, modules, progress records, assessments, attempts, alerts, and
//! emergency protocols. Reference data (modules, assessments, protocols) is
//! read-only here; progress and attempt records are owned by the ledger and
//! the governor.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Learners
// ---------------------------------------------------------------------------

/// An authenticated user, as supplied by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Learner {
    /// Opaque stable identifier.
    pub id: String,
    /// Institution the learner belongs to.
    pub institution_id: String,
    /// Role, with role-specific data.
    pub role: Role,
}

impl Learner {
    pub fn new(id: impl Into<String>, institution_id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            institution_id: institution_id.into(),
            role,
        }
    }
}

/// Learner role. Only students carry a grade level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Role {
    Student {
        #[serde(default)]
        grade_level: Option<String>,
    },
    Teacher,
    Admin,
    Coordinator,
}

impl Role {
    /// Build a role from its name and an optional grade. The grade is dropped
    /// for every role except `student`.
    pub fn parse(name: &str, grade_level: Option<String>) -> Result<Self, String> {
        match name.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student { grade_level }),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            "coordinator" => Ok(Role::Coordinator),
            other => Err(format!("unknown role: {other}")),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Student { .. } => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
            Role::Coordinator => "coordinator",
        }
    }

    pub fn is_student(&self) -> bool {
        matches!(self, Role::Student { .. })
    }

    pub fn grade_level(&self) -> Option<&str> {
        match self {
            Role::Student { grade_level } => grade_level.as_deref(),
            _ => None,
        }
    }

    /// Admins and coordinators manage alerts for their institution.
    pub fn manages_alerts(&self) -> bool {
        matches!(self, Role::Admin | Role::Coordinator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

/// Audience a module is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Primary,
    Secondary,
    College,
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Audience::Primary => write!(f, "primary"),
            Audience::Secondary => write!(f, "secondary"),
            Audience::College => write!(f, "college"),
        }
    }
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(Audience::Primary),
            "secondary" => Ok(Audience::Secondary),
            "college" => Ok(Audience::College),
            other => Err(format!("unknown audience: {other}")),
        }
    }
}

/// How a module's content is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    #[default]
    Interactive,
    Quiz,
    Simulation,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Video => write!(f, "video"),
            ContentType::Interactive => write!(f, "interactive"),
            ContentType::Quiz => write!(f, "quiz"),
            ContentType::Simulation => write!(f, "simulation"),
        }
    }
}

/// A unit of educational content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub target_audience: Audience,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Module ids that should be finished first. Informational only.
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress status. The declaration order is the only allowed direction of
/// travel: a record never moves to an earlier variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
    Certified,
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressStatus::NotStarted => write!(f, "not_started"),
            ProgressStatus::InProgress => write!(f, "in_progress"),
            ProgressStatus::Completed => write!(f, "completed"),
            ProgressStatus::Certified => write!(f, "certified"),
        }
    }
}

/// Per-(learner, module) progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub learner_id: String,
    pub module_id: String,
    pub status: ProgressStatus,
    /// Always within [0, 100].
    pub progress_percentage: f64,
    pub time_spent_minutes: u32,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub certification_date: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// The `not_started` state every (learner, module) pair begins in.
    pub fn new(learner_id: impl Into<String>, module_id: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            module_id: module_id.into(),
            status: ProgressStatus::NotStarted,
            progress_percentage: 0.0,
            time_spent_minutes: 0,
            score: None,
            started_at: None,
            completed_at: None,
            certification_date: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Assessments
// ---------------------------------------------------------------------------

/// Kind of question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

/// A question as stored, including its answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// The expected response. Questions without one are never scored correct.
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
}

/// A question as shown to a learner. Has no answer key field at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            prompt: q.prompt.clone(),
            options: q.options.clone(),
            kind: q.kind,
        }
    }
}

/// A graded question set attached to a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    pub module_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Minimum score (0-100) required to pass.
    #[serde(default = "default_passing_score")]
    pub passing_score: f64,
    #[serde(default = "default_time_limit")]
    pub time_limit_minutes: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub is_certification: bool,
}

fn default_passing_score() -> f64 {
    70.0
}

fn default_time_limit() -> u32 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

/// A learner's response to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub response: String,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            response: response.into(),
        }
    }
}

/// One attempt at an assessment. Created when the attempt begins and
/// finalized exactly once on submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Opaque identifier handed to the learner.
    pub id: String,
    pub learner_id: String,
    pub assessment_id: String,
    /// Sequential per (learner, assessment), starting at 1.
    pub attempt_number: u32,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default)]
    pub time_taken_secs: Option<u64>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// High and critical alerts are shown in the client banner.
    pub fn is_urgent(&self) -> bool {
        *self >= Severity::High
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Who an alert is addressed to.
///
/// Serialized as a plain string: `all`, `students`, `teachers`, `staff`, or
/// `grade:<n>`. Any other string is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertAudience {
    #[default]
    All,
    Students,
    Teachers,
    Staff,
    Grade(String),
    Other(String),
}

impl From<String> for AlertAudience {
    fn from(s: String) -> Self {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "all" | "" => AlertAudience::All,
            "students" => AlertAudience::Students,
            "teachers" => AlertAudience::Teachers,
            "staff" => AlertAudience::Staff,
            _ => match normalized.strip_prefix("grade:") {
                Some(grade) => AlertAudience::Grade(grade.trim().to_string()),
                None => AlertAudience::Other(s),
            },
        }
    }
}

impl From<AlertAudience> for String {
    fn from(audience: AlertAudience) -> Self {
        audience.to_string()
    }
}

impl fmt::Display for AlertAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertAudience::All => write!(f, "all"),
            AlertAudience::Students => write!(f, "students"),
            AlertAudience::Teachers => write!(f, "teachers"),
            AlertAudience::Staff => write!(f, "staff"),
            AlertAudience::Grade(grade) => write!(f, "grade:{grade}"),
            AlertAudience::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// A time-bounded safety notice scoped to an institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub institution_id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub severity: Severity,
    #[serde(default)]
    pub audience: AlertAudience,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Emergency protocols
// ---------------------------------------------------------------------------

/// Kind of institution, as reported by the institution directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstitutionType {
    #[default]
    School,
    College,
}

impl fmt::Display for InstitutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstitutionType::School => write!(f, "school"),
            InstitutionType::College => write!(f, "college"),
        }
    }
}

impl FromStr for InstitutionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "school" => Ok(InstitutionType::School),
            "college" => Ok(InstitutionType::College),
            other => Err(format!("unknown institution type: {other}")),
        }
    }
}

/// Which institutions a protocol applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolScope {
    School,
    College,
    Both,
}

impl ProtocolScope {
    pub fn applies_to(&self, institution: InstitutionType) -> bool {
        match self {
            ProtocolScope::Both => true,
            ProtocolScope::School => institution == InstitutionType::School,
            ProtocolScope::College => institution == InstitutionType::College,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolStep {
    pub order: u32,
    pub instruction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvacuationRoute {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyPoint {
    pub name: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// What to do in an emergency, for a given kind of institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyProtocol {
    pub id: String,
    pub title: String,
    pub institution_type: ProtocolScope,
    #[serde(default)]
    pub steps: Vec<ProtocolStep>,
    #[serde(default)]
    pub evacuation_routes: Vec<EvacuationRoute>,
    #[serde(default)]
    pub assembly_points: Vec<AssemblyPoint>,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Reference data supplied by the content collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub assessments: Vec<Assessment>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub protocols: Vec<EmergencyProtocol>,
}

impl Catalog {
    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn assessment(&self, id: &str) -> Option<&Assessment> {
        self.assessments.iter().find(|a| a.id == id)
    }

    /// The first assessment attached to a module.
    pub fn assessment_for_module(&self, module_id: &str) -> Option<&Assessment> {
        self.assessments.iter().find(|a| a.module_id == module_id)
    }

    /// Append another catalog's entries after this one's.
    pub fn merge(&mut self, other: Catalog) {
        self.modules.extend(other.modules);
        self.assessments.extend(other.assessments);
        self.alerts.extend(other.alerts);
        self.protocols.extend(other.protocols);
    }
}
