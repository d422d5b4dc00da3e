use core::fmt;

use crate::resource::ResId;

/// A non-fatal condition encountered while transforming a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub resource: ResId,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// An entry of `field` has no string `name` and was skipped.
    Unnamed { field: &'static str, index: usize },
    /// No override exists for the entry of `field` with override key `key`.
    ImageNotFound { field: &'static str, key: String },
    /// `flag` has an override but is the last argument of `container`, so there is no value to
    /// replace.
    TrailingFlag { container: String, flag: String },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Unnamed { field, index } => {
                write!(f, "unable to get the name of `{field}[{index}]`, skipping")
            }
            DiagnosticKind::ImageNotFound { field, key } => {
                write!(f, "image not found for `{field}` entry `{key}`, skipping")
            }
            DiagnosticKind::TrailingFlag { container, flag } => write!(
                f,
                "flag `{flag}` of container `{container}` has no value to replace, skipping"
            ),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.resource, self.kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, resource: ResId, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic { resource, kind });
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &DiagnosticKind> {
        self.diagnostics.iter().map(|diagnostic| &diagnostic.kind)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Report every diagnostic as an informational event.
    pub fn log(&self) {
        for diagnostic in &self.diagnostics {
            tracing::info!(resource = %diagnostic.resource, "{}", diagnostic.kind);
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}
