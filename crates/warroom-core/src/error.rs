use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarRoomError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("deal not found: {0}")]
    DealNotFound(String),

    #[error("contact not found: {0}")]
    ContactNotFound(String),

    #[error("stale revision: expected {expected}, store is at {actual}")]
    StaleRevision { expected: u64, actual: u64 },

    #[error("unsupported schema version {0}: this build reads up to {max}", max = crate::migrations::CURRENT_SCHEMA_VERSION)]
    UnsupportedSchema(u32),

    #[error("invalid storage key '{0}': must be lowercase alphanumeric with underscores or hyphens")]
    InvalidKey(String),

    #[error("invalid stage: {0}")]
    InvalidStage(String),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    #[error("invalid tier: {0}")]
    InvalidTier(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("home directory not found: set HOME or pass --data-dir")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl WarRoomError {
    /// True for errors raised while writing or reading the backing store,
    /// as opposed to rejections of the caller's input.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            WarRoomError::Storage(_) | WarRoomError::Io(_) | WarRoomError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WarRoomError>;
