use thiserror::Error;

pub type Result<T, E = RegistrarError> = std::result::Result<T, E>;

/// Every failure the adapter can report to the host platform.
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error(
        "OpenProvider Registrar module error. Please update configuration parameter \"{parameter}\" at \"Configuration -> Domain registration\""
    )]
    Config { parameter: &'static str },

    #[error("Invalid domain data: {message}")]
    InvalidInput { message: String },

    #[error("{entity} not found in OpenProvider: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("OpenProvider API error: {message}")]
    Api { code: Option<i64>, message: String },

    #[error("OpenProvider API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected response from {endpoint}: {message}")]
    Schema { endpoint: String, message: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<RegistrarError>,
    },
}

impl RegistrarError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn schema(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Wrap this error with a context message, keeping the original as source.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error beneath any context layers.
    pub fn root(&self) -> &RegistrarError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound { .. })
    }
}

/// Attach context to a fallible registrar call, `anyhow`-style.
pub trait ResultExt<T> {
    fn context(self, context: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|e| e.context(context))
    }
}
