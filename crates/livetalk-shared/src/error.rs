use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed document: expected a JSON object")]
    NotAnObject,
}
