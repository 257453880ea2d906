use thiserror::Error;

/// Result type alias using SbError
pub type Result<T> = std::result::Result<T, SbError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and the CLI's exit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SbErrorKind {
    // Input
    InvalidInput,
    MissingConfig,
    NotFound,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    ExternalService,
}

impl SbErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            SbErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            SbErrorKind::MissingConfig => "ERR_MISSING_CONFIG",
            SbErrorKind::NotFound => "ERR_NOT_FOUND",
            SbErrorKind::Io => "ERR_IO",
            SbErrorKind::Serialization => "ERR_SERIALIZATION",
            SbErrorKind::Persistence => "ERR_PERSISTENCE",
            SbErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
        }
    }
}

/// Canonical structured error type
#[derive(Debug, Clone)]
pub struct SbError {
    kind: SbErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    inbox_id: Option<i64>,
    message: String,
}

impl SbError {
    /// Create a new error with the specified kind
    pub fn new(kind: SbErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            inbox_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context (a variable name, a path, a category)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add inbox row context
    pub fn with_inbox_id(mut self, inbox_id: i64) -> Self {
        self.inbox_id = Some(inbox_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> SbErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn inbox_id(&self) -> Option<i64> {
        self.inbox_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for SbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " ({})", entity_id)?;
        }
        if let Some(inbox_id) = self.inbox_id {
            write!(f, " (inbox_id: {})", inbox_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for SbError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for SecondBrain operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SecondBrainError {
    /// A required environment/config variable is unset or empty
    #[error("{var} is not set")]
    EnvUnset { var: String },

    /// A required argument was empty
    #[error("{name} must not be empty")]
    EmptyArgument { name: String },

    /// The home directory could not be determined
    #[error("Cannot determine home directory")]
    HomeDirUnknown,

    /// Config file could not be parsed
    #[error("Invalid config file {path}: {reason}")]
    InvalidConfig { path: String, reason: String },

    /// Alias file could not be parsed
    #[error("Invalid alias file {path}: {reason}")]
    InvalidAliases { path: String, reason: String },

    /// The classifier process failed
    #[error("Classifier failed: {reason}")]
    ClassifierFailed { reason: String },

    /// Install target exists and is not a symlink
    #[error("Refusing to replace {path}: not a symlink")]
    InstallTargetOccupied { path: String },
}

impl From<SecondBrainError> for SbError {
    fn from(err: SecondBrainError) -> Self {
        let message = err.to_string();
        match err {
            SecondBrainError::EnvUnset { var } => SbError::new(SbErrorKind::MissingConfig)
                .with_entity_id(var)
                .with_message(message),

            SecondBrainError::EmptyArgument { name } => SbError::new(SbErrorKind::InvalidInput)
                .with_entity_id(name)
                .with_message(message),

            SecondBrainError::HomeDirUnknown => {
                SbError::new(SbErrorKind::MissingConfig).with_message(message)
            }

            SecondBrainError::InvalidConfig { path, .. } => {
                SbError::new(SbErrorKind::InvalidInput)
                    .with_op("load_config")
                    .with_entity_id(path)
                    .with_message(message)
            }

            SecondBrainError::InvalidAliases { path, .. } => {
                SbError::new(SbErrorKind::Serialization)
                    .with_op("load_aliases")
                    .with_entity_id(path)
                    .with_message(message)
            }

            SecondBrainError::ClassifierFailed { .. } => {
                SbError::new(SbErrorKind::ExternalService)
                    .with_op("classify")
                    .with_message(message)
            }

            SecondBrainError::InstallTargetOccupied { path } => {
                SbError::new(SbErrorKind::InvalidInput)
                    .with_op("install")
                    .with_entity_id(path)
                    .with_message(message)
            }
        }
    }
}
