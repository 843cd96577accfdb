//! Display pipeline errors.

use vellum_config::FallbackPolicy;
use vellum_store::{DocumentReference, StoreError};
use vellum_tree::ParseError;

use crate::collab::{EvaluationError, TransformError};

/// Error returned by the display pipeline.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    /// The requested section does not exist in the resolved content.
    #[error("Section {section} not found in {document}")]
    SectionNotFound {
        /// Serialized document reference.
        document: String,
        /// Requested section id.
        section: String,
    },
    /// Content could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The transformation pass failed.
    #[error(transparent)]
    Transformation(#[from] TransformError),
    /// A title expression could not be evaluated.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    /// The document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A failure raised while rendering inside an isolated context.
    #[error("Failed to render {document}: {source}")]
    Rendering {
        /// Serialized reference of the document made current.
        document: String,
        /// The original failure.
        #[source]
        source: Box<DisplayError>,
    },
}

impl DisplayError {
    /// Whether this error, or the failure it wraps, is a missing section.
    #[must_use]
    pub fn is_section_not_found(&self) -> bool {
        match self {
            Self::SectionNotFound { .. } => true,
            Self::Rendering { source, .. } => source.is_section_not_found(),
            _ => false,
        }
    }
}

/// Apply `policy` to the outcome of a fallback-eligible step.
///
/// Returns `Ok(None)` when a lenient policy swallowed the failure, so the
/// caller moves on to its next fallback.
pub(crate) fn recover<T>(
    policy: FallbackPolicy,
    result: Result<T, DisplayError>,
    step: &str,
    document: &DocumentReference,
) -> Result<Option<T>, DisplayError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if policy.is_strict() => Err(e),
        Err(e) => {
            tracing::warn!(document = %document, error = %e, "{step} failed, falling back");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    fn missing_section() -> DisplayError {
        DisplayError::SectionNotFound {
            document: "main:Space.Page".to_owned(),
            section: "H99".to_owned(),
        }
    }

    #[test]
    fn test_section_not_found_message() {
        assert_eq!(
            missing_section().to_string(),
            "Section H99 not found in main:Space.Page"
        );
    }

    #[test]
    fn test_rendering_keeps_cause() {
        let err = DisplayError::Rendering {
            document: "main:Space.Page".to_owned(),
            source: Box::new(missing_section()),
        };

        assert!(err.is_section_not_found());
        assert!(err.to_string().contains("Section H99 not found"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_recover_lenient_swallows() {
        let reference = DocumentReference::new("main", ["Space"], "Page");
        let result: Result<u8, _> = Err(missing_section());
        let recovered = recover(FallbackPolicy::Lenient, result, "Lookup", &reference).unwrap();
        assert_eq!(recovered, None);
    }

    #[test]
    fn test_recover_strict_propagates() {
        let reference = DocumentReference::new("main", ["Space"], "Page");
        let result: Result<u8, _> = Err(missing_section());
        assert!(recover(FallbackPolicy::Strict, result, "Lookup", &reference).is_err());
        assert_eq!(
            recover(FallbackPolicy::Strict, Ok(3), "Lookup", &reference).unwrap(),
            Some(3)
        );
    }

    #[test]
    fn test_other_errors_are_not_section_not_found() {
        let err = DisplayError::from(TransformError::new("boom"));
        assert!(!err.is_section_not_found());
    }
}
