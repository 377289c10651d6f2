//! Correlation ids and trace contexts
//!
//! A composer cycle logs under one [`CorrelationId`]. Bulk operations open a
//! [`TraceContext`] and hand each chunk a child span, so every cycle of one
//! bulk run shares its trace id and correlation id.

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub operation: &'static str,
    pub correlation_id: CorrelationId,
}

impl TraceContext {
    pub fn new(operation: &'static str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            span_id: Uuid::new_v4().to_string(),
            parent_span_id: None,
            operation,
            correlation_id: CorrelationId::new(),
        }
    }

    /// Span for one chunk of a bulk operation
    pub fn child_span(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: Uuid::new_v4().to_string(),
            parent_span_id: Some(self.span_id.clone()),
            operation: self.operation,
            correlation_id: self.correlation_id.clone(),
        }
    }
}
