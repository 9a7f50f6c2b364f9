use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ValidationError;

/// Query variables as sent to the executor. Caller variables are opaque here.
pub type Variables = serde_json::Map<String, Value>;

/// How the follow-up query learns where the previous page ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pagination {
    /// `variable` receives the number of items fetched so far.
    Offset { variable: String },
    /// `variable` receives the `key` field of the previous page's last item.
    Cursor { variable: String, key: String },
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::Offset {
            variable: "skip".to_string(),
        }
    }
}

/// The first-page and next-page documents of one paginated query.
///
/// Both documents must select the same top-level fields; page responses of
/// either one are merged into the same accumulated result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPair {
    first: String,
    next: String,
    page_size: usize,
    pagination: Pagination,
    page_size_variable: Option<String>,
}

impl QueryPair {
    pub fn new(
        first: impl Into<String>,
        next: impl Into<String>,
        page_size: usize,
        pagination: Pagination,
    ) -> Result<Self, ValidationError> {
        let first = first.into();
        let next = next.into();
        if first.trim().is_empty() {
            return Err(ValidationError::BlankDocument { which: "first" });
        }
        if next.trim().is_empty() {
            return Err(ValidationError::BlankDocument { which: "next" });
        }
        if page_size == 0 {
            return Err(ValidationError::ZeroPageSize);
        }
        Ok(Self {
            first,
            next,
            page_size,
            pagination,
            page_size_variable: None,
        })
    }

    /// One document serving both roles, paginated purely through variables.
    pub fn same(
        document: impl Into<String>,
        page_size: usize,
        pagination: Pagination,
    ) -> Result<Self, ValidationError> {
        let document = document.into();
        Self::new(document.clone(), document, page_size, pagination)
    }

    /// Also send the page size on every request under `variable`.
    pub fn with_page_size_variable(mut self, variable: impl Into<String>) -> Self {
        self.page_size_variable = Some(variable.into());
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn first_request(&self, variables: &Variables) -> QueryRequest {
        QueryRequest {
            document: self.first.clone(),
            variables: self.with_page_size(variables.clone()),
        }
    }

    /// Builds the follow-up request; `position` is the offset or cursor value.
    pub fn next_request(&self, variables: &Variables, position: Value) -> QueryRequest {
        let mut variables = self.with_page_size(variables.clone());
        let name = match &self.pagination {
            Pagination::Offset { variable } => variable,
            Pagination::Cursor { variable, .. } => variable,
        };
        variables.insert(name.clone(), position);
        QueryRequest {
            document: self.next.clone(),
            variables,
        }
    }

    fn with_page_size(&self, mut variables: Variables) -> Variables {
        if let Some(name) = &self.page_size_variable {
            variables.insert(name.clone(), Value::from(self.page_size));
        }
        variables
    }
}

/// One request for the executor: a document plus its variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    #[serde(rename = "query")]
    pub document: String,
    pub variables: Variables,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn vars(value: Value) -> Variables {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn rejects_zero_page_size_and_blank_documents() {
        assert_eq!(
            QueryPair::same("{ funds { id } }", 0, Pagination::default()).unwrap_err(),
            ValidationError::ZeroPageSize
        );
        assert_eq!(
            QueryPair::new("{ funds { id } }", " ", 10, Pagination::default()).unwrap_err(),
            ValidationError::BlankDocument { which: "next" }
        );
    }

    #[test]
    fn offset_request_layers_position_over_caller_variables() {
        let pair = QueryPair::new("first", "next", 100, Pagination::default())
            .unwrap()
            .with_page_size_variable("first");
        let caller = vars(json!({"orderBy": "name", "skip": 7}));

        let first = pair.first_request(&caller);
        assert_eq!(first.document, "first");
        assert_eq!(first.variables, vars(json!({"orderBy": "name", "skip": 7, "first": 100})));

        let next = pair.next_request(&caller, json!(200));
        assert_eq!(next.document, "next");
        assert_eq!(next.variables, vars(json!({"orderBy": "name", "skip": 200, "first": 100})));
    }

    #[test]
    fn request_serializes_as_query_and_variables() {
        let pair = QueryPair::same("{ funds { id } }", 2, Pagination::default()).unwrap();
        let body = serde_json::to_value(pair.first_request(&Variables::new())).unwrap();
        assert_eq!(body, json!({"query": "{ funds { id } }", "variables": {}}));
    }
}
