use shared::RangeError;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("missing attribute '{attribute}' on '{selector}'")]
    MissingAttribute { selector: String, attribute: String },
    #[error("element '{0}' not found")]
    MissingElement(String),
    #[error("session storage failed: {0}")]
    Storage(String),
    #[error("history update failed: {0}")]
    History(String),
    #[error("DOM operation failed: {0}")]
    Dom(String),
    #[error("invalid view payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Range(#[from] RangeError),
}
