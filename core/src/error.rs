use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Case '{case_id}' not found")]
    CaseNotFound { case_id: String },

    #[error("No case is currently selected")]
    NoCaseSelected,

    #[error("No assessment loaded for case '{case_id}'")]
    AssessmentNotLoaded { case_id: String },

    #[error("Risk model fetch failed for case '{case_id}': {reason}")]
    AssessmentFetchFailed { case_id: String, reason: String },

    #[error("Override on case '{case_id}' requires a justification note")]
    JustificationRequired { case_id: String },

    #[error("Case '{case_id}' is already resolved")]
    AlreadyResolved { case_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
