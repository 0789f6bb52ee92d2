use rmcp::model::ErrorData;

#[derive(Debug, thiserror::Error)]
pub enum ProjectsError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid parameter: {0}")]
    Validation(String),

    #[error("GitHub API error: {0}")]
    Upstream(String),
}

impl ProjectsError {
    /// Stable error kind name reported to MCP clients alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            ProjectsError::Authentication(_) => "AuthenticationError",
            ProjectsError::NotFound(_) => "NotFoundError",
            ProjectsError::Validation(_) => "ValidationError",
            ProjectsError::Upstream(_) => "UpstreamError",
        }
    }

    pub fn to_mcp_error(&self) -> ErrorData {
        let data = Some(serde_json::json!({ "kind": self.kind() }));
        match self {
            ProjectsError::Validation(_) | ProjectsError::NotFound(_) => {
                ErrorData::invalid_params(self.to_string(), data)
            }
            ProjectsError::Authentication(_) => ErrorData::invalid_request(self.to_string(), data),
            ProjectsError::Upstream(_) => ErrorData::internal_error(self.to_string(), data),
        }
    }
}

impl From<octocrab::Error> for ProjectsError {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => {
                ProjectsError::from_status(source.status_code.as_u16(), source.message.clone())
            }
            other => ProjectsError::Upstream(other.to_string()),
        }
    }
}

impl ProjectsError {
    /// Classify a non-2xx response. GitHub answers rate limiting with 403 as
    /// well, which is not a credential problem.
    pub fn from_status(status: u16, message: String) -> Self {
        let rate_limited = message.to_ascii_lowercase().contains("rate limit");
        match status {
            401 => ProjectsError::Authentication(message),
            403 if !rate_limited => ProjectsError::Authentication(message),
            404 => ProjectsError::NotFound(message),
            _ => ProjectsError::Upstream(format!("HTTP {status}: {message}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ProjectsError::Authentication("x".into()).kind(), "AuthenticationError");
        assert_eq!(ProjectsError::NotFound("x".into()).kind(), "NotFoundError");
        assert_eq!(ProjectsError::Validation("x".into()).kind(), "ValidationError");
        assert_eq!(ProjectsError::Upstream("x".into()).kind(), "UpstreamError");
    }

    #[test]
    fn test_validation_maps_to_invalid_params() {
        let err = ProjectsError::Validation("bad value".into()).to_mcp_error();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("bad value"));
        assert_eq!(err.data.unwrap()["kind"], "ValidationError");
    }

    #[test]
    fn test_upstream_maps_to_internal_error() {
        let err = ProjectsError::Upstream("boom".into()).to_mcp_error();
        assert_eq!(err.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
        assert_eq!(err.data.unwrap()["kind"], "UpstreamError");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ProjectsError::from_status(401, "Bad credentials".into()),
            ProjectsError::Authentication(_)
        ));
        assert!(matches!(
            ProjectsError::from_status(403, "Resource not accessible by integration".into()),
            ProjectsError::Authentication(_)
        ));
        assert!(matches!(
            ProjectsError::from_status(404, "Not Found".into()),
            ProjectsError::NotFound(_)
        ));
        assert!(matches!(
            ProjectsError::from_status(502, "Bad gateway".into()),
            ProjectsError::Upstream(_)
        ));
    }

    #[test]
    fn test_rate_limit_is_not_an_authentication_error() {
        let err = ProjectsError::from_status(403, "API rate limit exceeded for user ID 1.".into());
        assert_eq!(err.kind(), "UpstreamError");
        assert!(err.to_string().contains("API rate limit exceeded"));

        let err = ProjectsError::from_status(
            403,
            "You have exceeded a secondary rate limit. Please wait a few minutes.".into(),
        );
        assert_eq!(err.kind(), "UpstreamError");
        assert_eq!(ProjectsError::from_status(429, "slow down".into()).kind(), "UpstreamError");
    }

    #[test]
    fn test_authentication_maps_to_invalid_request() {
        let err = ProjectsError::Authentication("Bad credentials".into()).to_mcp_error();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_REQUEST);
        assert!(err.message.contains("Bad credentials"));
    }
}
