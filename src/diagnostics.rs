//! Structured diagnostics.
//!
//! Every anomaly the store or the finalize pipeline finds becomes a
//! [`Diagnostic`] and is also emitted through `tracing`, so callers can
//! either inspect the collection or just watch the logs.

use serde::Serialize;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    // Store operations
    DuplicateEntity,
    UnknownEntity,
    UnknownField,
    UnrecognizedEventList,
    EventNotFound,
    MismatchedListLengths,
    TypeCastFailure,
    DuplicateEventId,

    // Hierarchy and entity preparation
    UnresolvedCommander,
    UnresolvedLevel,
    RepeatedName,
    ForceAffiliationCollision,

    // Consistency checks
    MissingDatasetDetail,
    DuplicateUid,
    AffiliationForceConflict,
    UnknownSecondaryEntity,
    NegativeTime,
    LossesExceedComponents,
    InactiveEntity,
    DetailMissingKey,
    DetailMissingValue,
    NegativeComponents,
    AmbiguousLossAttribution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            entity: None,
            event: None,
        }
    }

    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::warning(kind, message)
        }
    }

    pub fn with_entity(mut self, uid: impl Into<String>) -> Self {
        self.entity = Some(uid.into());
        self
    }

    pub fn with_event(mut self, event_id: impl Into<String>) -> Self {
        self.event = Some(event_id.into());
        self
    }
}

impl From<&StoreError> for Diagnostic {
    fn from(err: &StoreError) -> Self {
        Diagnostic {
            severity: Severity::Error,
            kind: err.kind(),
            message: err.to_string(),
            entity: err.entity().map(str::to_string),
            event: err.event().map(str::to_string),
        }
    }
}

/// An append-only collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it at the matching level.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        let entity = diagnostic.entity.as_deref().unwrap_or("-");
        let event = diagnostic.event.as_deref().unwrap_or("-");
        match diagnostic.severity {
            Severity::Warning => tracing::warn!(
                kind = ?diagnostic.kind,
                entity,
                event,
                "{}",
                diagnostic.message
            ),
            Severity::Error => tracing::error!(
                kind = ?diagnostic.kind,
                entity,
                event,
                "{}",
                diagnostic.message
            ),
        }
        self.items.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    /// Append already-logged diagnostics without logging them again.
    pub fn extend_quiet(&mut self, other: &Diagnostics) {
        self.items.extend(other.items.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_become_error_diagnostics() {
        let err = StoreError::EventNotFound("shot-4".into());
        let d = Diagnostic::from(&err);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.kind, DiagnosticKind::EventNotFound);
        assert_eq!(d.event.as_deref(), Some("shot-4"));
        assert!(d.entity.is_none());
    }

    #[test]
    fn counts_by_kind() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning(DiagnosticKind::RepeatedName, "a").with_entity("u1"));
        diags.push(Diagnostic::warning(DiagnosticKind::RepeatedName, "b"));
        assert_eq!(diags.count(DiagnosticKind::RepeatedName), 2);
        assert!(!diags.has_errors());
        diags.push(Diagnostic::error(DiagnosticKind::NegativeTime, "c"));
        assert!(diags.has_errors());
        assert_eq!(diags.len(), 3);
    }

    #[test]
    fn serializes_kind_in_snake_case() {
        let d = Diagnostic::warning(DiagnosticKind::UnresolvedLevel, "level defaulted").with_entity("u9");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "unresolved_level");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["entity"], "u9");
        assert!(json.get("event").is_none());
    }
}
