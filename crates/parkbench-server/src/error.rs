use sea_orm::DbErr;
use thiserror::Error;

fn is_are(count: usize) -> &'static str {
    if count == 1 {
        "is"
    } else {
        "are"
    }
}

/// Business outcomes of check-in/check-out operations.
///
/// These are expected results the route layer maps to user-facing status
/// codes; storage failures are normalized to `Unknown` at the engine
/// boundary and never leak their detail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckinError {
    /// One or more of the requested visitors already has an active checkin.
    #[error("{} {} already checked in somewhere", .names.join(", "), is_are(.names.len()))]
    AlreadyCheckedIn { names: Vec<String> },

    #[error("{0}")]
    VisitorNotFound(String),

    #[error("{0}")]
    LocationNotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Unknown(String),
}

impl From<DbErr> for CheckinError {
    fn from(err: DbErr) -> Self {
        tracing::error!("storage error: {err}");
        Self::Unknown("An unexpected error occurred".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_checked_in_uses_singular_grammar() {
        let err = CheckinError::AlreadyCheckedIn {
            names: vec!["Ana".to_string()],
        };
        assert_eq!(err.to_string(), "Ana is already checked in somewhere");
    }

    #[test]
    fn already_checked_in_uses_plural_grammar() {
        let err = CheckinError::AlreadyCheckedIn {
            names: vec!["Ana".to_string(), "Bruno".to_string()],
        };
        assert_eq!(err.to_string(), "Ana, Bruno are already checked in somewhere");
    }
}
