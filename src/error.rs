use thiserror::Error;

/// Errors returned by the remote asset store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The asset does not exist
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Credentials were rejected by the store
    #[error("Asset store rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    /// The store asked us to slow down
    #[error("Rate limited by asset store")]
    RateLimited,

    /// Any other non-success response
    #[error("Asset store error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The lookup did not complete within the per-probe timeout
    #[error("Asset lookup timed out after {0} ms")]
    Timeout(u64),

    /// The response body could not be decoded
    #[error("Invalid asset store response: {0}")]
    Parse(String),
}

impl StoreError {
    /// Whether retrying the same request may succeed.
    ///
    /// Confirmed absence and credential failures are final; everything that
    /// looks like a flaky network or an overloaded store is retryable.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::NotFound(_) | StoreError::Unauthorized(_) | StoreError::Parse(_) => false,
            StoreError::RateLimited | StoreError::Connection(_) | StoreError::Timeout(_) => true,
            StoreError::Api { status, .. } => *status >= 500,
        }
    }
}

/// Errors from an entitlement backend.
#[derive(Debug, Clone, Error)]
pub enum EntitlementError {
    #[error("Entitlement backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the gallery service and its HTTP handlers.
#[derive(Debug, Clone, Error)]
pub enum GalleryError {
    /// No candidate path matched after the full search
    #[error("Photo not found")]
    PhotoNotFound,

    /// Redeem body lacks a required field
    #[error("photoId and publicId required")]
    MissingFields,

    /// Request body is not valid JSON for the endpoint
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// `startDateISO` could not be parsed as a date
    #[error("Invalid startDateISO: {0}")]
    InvalidStartDate(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// The photo set's free download has been consumed
    #[error("Free already redeemed")]
    AlreadyRedeemed,

    #[error(transparent)]
    Entitlement(#[from] EntitlementError),
}
