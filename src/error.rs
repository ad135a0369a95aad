//! Error types of the optics core.
use std::{error::Error, fmt::Display};

/// Result type of the optics core.
pub type OpticsResult<T> = std::result::Result<T, OpticsError>;

/// Errors that can be returned by the optics core.
///
/// These are caller-side contract violations, never physical states. Total
/// internal reflection is a valid result and is reported through
/// [`RayGeometry`](crate::geometry::RayGeometry), not through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpticsError {
    /// incident angle outside [0, 90), non-finite inputs or a non-positive refractive index
    InvalidInput(String),
    /// a medium name that is not part of the catalog
    UnknownMedium(String),
}

impl Display for OpticsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(m) => write!(f, "InvalidInput:{m}"),
            Self::UnknownMedium(m) => write!(f, "UnknownMedium:{m}"),
        }
    }
}
impl Error for OpticsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            format!("{}", OpticsError::InvalidInput("angle".to_string())),
            "InvalidInput:angle"
        );
        assert_eq!(
            format!("{}", OpticsError::UnknownMedium("lava".to_string())),
            "UnknownMedium:lava"
        );
    }

    #[test]
    fn into_anyhow() {
        let error: anyhow::Error = OpticsError::InvalidInput("n1".to_string()).into();
        assert_eq!(error.to_string(), "InvalidInput:n1");
        assert!(error.downcast_ref::<OpticsError>().is_some());
    }
}
