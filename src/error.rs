use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use log::debug;
use serde::Serialize;
use sled::transaction::TransactionError;
use std::fmt;

#[derive(Debug, PartialEq)]
pub enum Error {
    MissingField(String),
    InvalidValue(String),
    Duplicate(String),
    NotFound(String),
    Internal(String),
}

impl Error {
    pub fn missing_field<S: Into<String>>(description: S) -> Error {
        Error::MissingField(description.into())
    }

    pub fn invalid_value<S: Into<String>>(description: S) -> Error {
        Error::InvalidValue(description.into())
    }

    pub fn duplicate<S: Into<String>>(description: S) -> Error {
        Error::Duplicate(description.into())
    }

    pub fn not_found<S: Into<String>>(description: S) -> Error {
        Error::NotFound(description.into())
    }

    fn summary(&self) -> &'static str {
        match self {
            Error::MissingField(_) => "missing required field",
            Error::InvalidValue(_) => "invalid value",
            Error::Duplicate(_) => "duplicate",
            Error::NotFound(_) => "not found",
            Error::Internal(_) => "server error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::MissingField(_) | Error::InvalidValue(_) => StatusCode::BAD_REQUEST,
            Error::Duplicate(_) => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingField(description)
            | Error::InvalidValue(description)
            | Error::Duplicate(description)
            | Error::NotFound(description)
            | Error::Internal(description) => f.write_str(description),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    description: &'a str,
}

impl actix_web::error::ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        debug!("{:?}", self);
        HttpResponse::build(self.status()).json(ErrorBody {
            error: self.summary(),
            description: &self.to_string(),
        })
    }
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Error {
        Error::Internal(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Error {
        Error::Internal(err.to_string())
    }
}

impl From<TransactionError<Error>> for Error {
    fn from(err: TransactionError<Error>) -> Error {
        match err {
            TransactionError::Abort(err) => err,
            TransactionError::Storage(err) => err.into(),
        }
    }
}
