//! Pipeline input

use serde::{Deserialize, Serialize};

/// A research request for one company
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub company_name: String,
    #[serde(default)]
    pub department_name: String,
    #[serde(default)]
    pub position_name: String,
    #[serde(default)]
    pub job_scope: String,
}

/// Buyer persona that unlocks the hypothesis, matching and hearing stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona<'a> {
    pub department_name: &'a str,
    pub position_name: &'a str,
    pub job_scope: &'a str,
}

impl PipelineRequest {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            ..Self::default()
        }
    }

    pub fn with_persona(
        mut self,
        department_name: impl Into<String>,
        position_name: impl Into<String>,
        job_scope: impl Into<String>,
    ) -> Self {
        self.department_name = department_name.into();
        self.position_name = position_name.into();
        self.job_scope = job_scope.into();
        self
    }

    /// Present only when department and position are both non-blank
    pub fn persona(&self) -> Option<Persona<'_>> {
        if self.department_name.trim().is_empty() || self.position_name.trim().is_empty() {
            return None;
        }
        Some(Persona {
            department_name: &self.department_name,
            position_name: &self.position_name,
            job_scope: &self.job_scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_default_to_empty() {
        let request: PipelineRequest =
            serde_json::from_str(r#"{"company_name": "トヨタ自動車"}"#).unwrap();
        assert_eq!(request, PipelineRequest::new("トヨタ自動車"));
        assert!(request.persona().is_none());
    }

    #[test]
    fn test_persona_requires_department_and_position() {
        let full = PipelineRequest::new("A").with_persona("営業部", "部長", "");
        assert!(full.persona().is_some());

        let blank_position = PipelineRequest::new("A").with_persona("営業部", "  ", "全社");
        assert!(blank_position.persona().is_none());

        let no_department = PipelineRequest::new("A").with_persona("", "部長", "");
        assert!(no_department.persona().is_none());
    }
}
