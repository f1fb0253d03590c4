use thiserror::Error;

#[derive(Debug, Error)]
pub enum CfdMeshError {
    #[error("Input error: {0}")]
    Input(String),
    #[error("Geometry error: {0}")]
    Geometry(String),
    #[error("Mesher error: {0}")]
    Mesher(String),
    #[error("Post Processor error: {0}")]
    PostProcessor(String),
}
