use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError},
    http::{header::ContentType, StatusCode},
    HttpRequest,
    HttpResponse,
};
use log::error;
use petal_order_engine::traits::{
    AddressApiError,
    CartApiError,
    CheckoutError,
    CustomerApiError,
    OrderApiError,
    SequenceError,
};
use thiserror::Error;

static VERBOSE_VALIDATION: AtomicBool = AtomicBool::new(false);

/// Controls whether validation failures echo field-level detail back to the caller. Set once at startup from
/// `PBW_VERBOSE_VALIDATION`; read on every error response.
pub fn set_verbose_validation(verbose: bool) {
    VERBOSE_VALIDATION.store(verbose, Ordering::Relaxed);
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("Authentication failed. {0}")]
    Unauthenticated(String),
    #[error("Insufficient permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Conflict with the current state. {0}")]
    Conflict(String),
}

impl ServerError {
    /// The machine-readable code carried in every error envelope.
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequestBody(_) | Self::InvalidRequestPath(_) | Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Unauthenticated(_) => "UNAUTHORIZED",
            Self::InsufficientPermissions(_) => "FORBIDDEN",
            Self::NoRecordFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InitializeError(_)
            | Self::BackendError(_)
            | Self::IOError(_)
            | Self::ConfigurationError(_)
            | Self::Unspecified(_) => "SERVER_ERROR",
        }
    }

    /// What the caller gets to see. Internal errors are logged in full but never leave the server, and validation
    /// detail is only echoed when the verbose flag is on.
    fn public_message(&self) -> String {
        match self {
            Self::InvalidRequestBody(_) | Self::InvalidRequestPath(_) | Self::ValidationError(_) => {
                if VERBOSE_VALIDATION.load(Ordering::Relaxed) {
                    self.to_string()
                } else {
                    "The request failed validation.".to_string()
                }
            },
            Self::InitializeError(_)
            | Self::BackendError(_)
            | Self::IOError(_)
            | Self::ConfigurationError(_)
            | Self::Unspecified(_) => "An internal error occurred. It has been logged.".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(
            serde_json::json!({ "success": false, "error": self.public_message(), "code": self.code() }).to_string(),
        )
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        let msg = e.to_string();
        match e {
            CheckoutError::DatabaseError(_) => Self::BackendError(msg),
            CheckoutError::EmptyCart | CheckoutError::ValidationError(_) | CheckoutError::NegativePrice(_) => {
                Self::ValidationError(msg)
            },
            CheckoutError::CartNotFound(_)
            | CheckoutError::CustomerNotFound(_)
            | CheckoutError::OrderNotFound(_)
            | CheckoutError::ItemNotFound { .. } => Self::NoRecordFound(msg),
            CheckoutError::CustomerNotApproved(_) => Self::InsufficientPermissions(msg),
            CheckoutError::OrderNumberClash(_) | CheckoutError::InvalidTransition { .. } => Self::Conflict(msg),
            CheckoutError::AddressError(e) => Self::from(e),
            CheckoutError::CartError(e) => Self::from(e),
            CheckoutError::CustomerError(e) => Self::from(e),
            CheckoutError::OrderError(e) => Self::from(e),
            CheckoutError::SequenceError(e) => Self::from(e),
        }
    }
}

impl From<CartApiError> for ServerError {
    fn from(e: CartApiError) -> Self {
        let msg = e.to_string();
        match e {
            CartApiError::DatabaseError(_) => Self::BackendError(msg),
            CartApiError::InvalidQuantity(_) | CartApiError::NegativePrice(_) => Self::ValidationError(msg),
            CartApiError::CartNotFound(_)
            | CartApiError::ItemNotFound(_)
            | CartApiError::ProductNotFound(_)
            | CartApiError::VariantNotFound { .. }
            | CartApiError::CustomerNotFound(_) => Self::NoRecordFound(msg),
        }
    }
}

impl From<AddressApiError> for ServerError {
    fn from(e: AddressApiError) -> Self {
        let msg = e.to_string();
        match e {
            AddressApiError::DatabaseError(_) => Self::BackendError(msg),
            // Covers a missing address and someone else's address alike, so the response must not distinguish them.
            AddressApiError::InvalidAddress => Self::InsufficientPermissions(msg),
            AddressApiError::MissingFields(_) => Self::ValidationError(msg),
        }
    }
}

impl From<CustomerApiError> for ServerError {
    fn from(e: CustomerApiError) -> Self {
        let msg = e.to_string();
        match e {
            CustomerApiError::DatabaseError(_) => Self::BackendError(msg),
            CustomerApiError::CustomerNotFound(_) => Self::NoRecordFound(msg),
            CustomerApiError::CustomerAlreadyExists(_) => Self::Conflict(msg),
            CustomerApiError::MultiplierOutOfRange(_) => Self::ValidationError(msg),
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        let msg = e.to_string();
        match e {
            OrderApiError::DatabaseError(_) => Self::BackendError(msg),
            OrderApiError::OrderNotFound(_) => Self::NoRecordFound(msg),
            OrderApiError::QueryError(_) => Self::ValidationError(msg),
        }
    }
}

impl From<SequenceError> for ServerError {
    fn from(e: SequenceError) -> Self {
        Self::BackendError(e.to_string())
    }
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ServerError::InvalidRequestBody(err.to_string()).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    ServerError::InvalidRequestPath(err.to_string()).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ServerError::InvalidRequestPath(err.to_string()).into()
}
