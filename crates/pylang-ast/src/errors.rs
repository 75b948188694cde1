//! Diagnostics collected across compiler passes

use super::*;

/// A single diagnostic attached to a source location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename = "CompilerError")]
pub struct CompilerError {
    #[serde(rename = "location")]
    pub span: Span,
    pub message: String,
    /// Reported by the parser rather than by semantic analysis
    #[serde(default)]
    pub syntax: bool,
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

/// Ordered error sink shared by every pass.
///
/// Identical (location, message) pairs are recorded once, so passes that
/// revisit a node may report freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename = "Errors")]
pub struct Errors {
    #[serde(default)]
    pub errors: Vec<CompilerError>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, span: Span, message: impl Into<String>) {
        self.push(CompilerError {
            span,
            message: message.into(),
            syntax: false,
        });
    }

    pub fn push(&mut self, error: CompilerError) {
        let duplicate = self
            .errors
            .iter()
            .any(|e| e.span == error.span && e.message == error.message);
        if !duplicate {
            self.errors.push(error);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompilerError> {
        self.errors.iter()
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.errors.iter().any(|e| e.syntax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_reports_are_recorded_once() {
        let mut errors = Errors::new();
        let span = Span::new(2, 3, 2, 7);
        errors.report(span, "Not a variable: x");
        errors.report(span, "Not a variable: x");
        errors.report(span, "Not a variable: y");
        errors.report(Span::new(4, 1, 4, 2), "Not a variable: x");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn report_order_is_preserved() {
        let mut errors = Errors::new();
        errors.report(Span::new(9, 1, 9, 1), "second line nine");
        errors.report(Span::new(1, 1, 1, 1), "first line one");
        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["second line nine", "first line one"]);
    }

    #[test]
    fn errors_use_compiler_error_shape() {
        let mut errors = Errors::new();
        errors.report(Span::new(1, 1, 1, 5), "bad");
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value["kind"], "Errors");
        assert_eq!(value["errors"][0]["kind"], "CompilerError");
        assert_eq!(value["errors"][0]["syntax"], false);
    }
}
