use crate::error::Error;
use serde::Serialize;

///
/// JSON envelope returned for every command
///
/// Success: `{"success": true, "data": ...}`
/// Failure: `{"success": false, "error": {"message": "...", "status": 400}}`
///
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Envelope<()> {
    ///
    /// Convert an error into a failure envelope.
    ///
    /// Client errors carry their message. Server errors are reported generically
    /// so storage details do not leak to the caller.
    ///
    pub fn error(err: &Error) -> Self {
        let status = err.status_code();
        let message = match err {
            Error::DuplicateCode { .. }
            | Error::NotFound { .. }
            | Error::UnknownBedStatus { .. }
            | Error::CouldNotAllocate { .. } => err.to_string(),
            Error::ConnectionTimeout(_) | Error::DatabaseConnection { .. } => {
                "Database unavailable".to_string()
            }
            _ => "Internal error".to_string(),
        };

        Self {
            success: false,
            data: None,
            error: Some(ErrorBody { message, status }),
        }
    }
}

impl From<&Error> for Envelope<()> {
    fn from(err: &Error) -> Self {
        Envelope::error(err)
    }
}
