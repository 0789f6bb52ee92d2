use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{schemars, tool, tool_handler, tool_router, ServerHandler};
use serde::Deserialize;

use crate::client::ProjectsClient;
use crate::error::ProjectsError;
use crate::models::{ItemFilter, OwnerType, ProjectSettings};

/// Largest page the GitHub GraphQL API hands out.
const MAX_PAGE: u32 = 100;
const DEFAULT_SEARCH_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct ProjectsServer {
    client: ProjectsClient,
    default_owner: Option<String>,
    max_results: u32,
    tool_router: ToolRouter<Self>,
}

// -- Tool parameter types --

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListProjectsParams {
    #[schemars(description = "GitHub organization or user login")]
    #[serde(default)]
    pub owner: Option<String>,

    #[schemars(description = "Owner kind: organization or user (detected when omitted)")]
    #[serde(default)]
    pub owner_type: Option<OwnerType>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetProjectParams {
    #[schemars(description = "GitHub organization or user login that owns the project")]
    #[serde(default)]
    pub owner: Option<String>,

    #[schemars(description = "Project number as shown in the project URL")]
    pub number: u64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProjectParams {
    #[schemars(description = "Project node ID (e.g. PVT_kwDO...)")]
    pub project_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetItemsParams {
    #[schemars(description = "Project node ID (e.g. PVT_kwDO...)")]
    pub project_id: String,

    #[schemars(description = "Maximum number of items to fetch (default: 20, max: 100)")]
    #[serde(default)]
    pub limit: Option<u32>,

    #[schemars(description = "Only items whose Status field has this value")]
    #[serde(default)]
    pub status: Option<String>,

    #[schemars(description = "Name of a custom single-select field to filter on")]
    #[serde(default)]
    pub field_name: Option<String>,

    #[schemars(description = "Option name the custom field must hold (requires field_name)")]
    #[serde(default)]
    pub field_value: Option<String>,

    #[schemars(description = "Only issues/PRs in this state: OPEN, CLOSED or MERGED. Draft issues never match")]
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchItemsParams {
    #[schemars(description = "Project node ID (e.g. PVT_kwDO...)")]
    pub project_id: String,

    #[schemars(description = "GitHub issue search query, e.g. \"repo:octo-org/app label:bug is:open\"")]
    pub query: String,

    #[schemars(description = "Maximum number of matching items (default: 10, max: 100)")]
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateIssueParams {
    #[schemars(description = "Repository as owner/name")]
    pub repository: String,

    #[schemars(description = "Issue title")]
    pub title: String,

    #[schemars(description = "Issue body (Markdown)")]
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddIssueParams {
    #[schemars(description = "Project node ID (e.g. PVT_kwDO...)")]
    pub project_id: String,

    #[schemars(description = "Node ID of the issue or pull request to add (e.g. I_kwDO...)")]
    pub issue_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFieldParams {
    #[schemars(description = "Project node ID (e.g. PVT_kwDO...)")]
    pub project_id: String,

    #[schemars(description = "Project item ID (e.g. PVTI_...)")]
    pub item_id: String,

    #[schemars(description = "Field ID (see get_project_fields)")]
    pub field_id: String,

    #[schemars(
        description = "New value: text, number, YYYY-MM-DD date, single-select option id or name, or iteration id or title"
    )]
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DraftIssueParams {
    #[schemars(description = "Project node ID (e.g. PVT_kwDO...)")]
    pub project_id: String,

    #[schemars(description = "Draft issue title")]
    pub title: String,

    #[schemars(description = "Draft issue body (Markdown)")]
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ItemParams {
    #[schemars(description = "Project node ID (e.g. PVT_kwDO...)")]
    pub project_id: String,

    #[schemars(description = "Project item ID (e.g. PVTI_...)")]
    pub item_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProjectSettingsParams {
    #[schemars(description = "Project node ID (e.g. PVT_kwDO...)")]
    pub project_id: String,

    #[schemars(description = "New project title")]
    #[serde(default)]
    pub title: Option<String>,

    #[schemars(description = "New short description")]
    #[serde(default)]
    pub description: Option<String>,

    #[schemars(description = "Whether the project is publicly visible")]
    #[serde(default)]
    pub public: Option<bool>,
}

impl ProjectsServer {
    pub fn new(client: ProjectsClient, default_owner: Option<String>, max_results: u32) -> Self {
        Self {
            client,
            default_owner,
            max_results,
            tool_router: Self::tool_router(),
        }
    }

    fn resolve_owner(&self, param: Option<&str>) -> Result<String, ProjectsError> {
        let owner = param
            .map(String::from)
            .or_else(|| self.default_owner.clone())
            .ok_or_else(|| {
                ProjectsError::Validation("owner is required (or set --owner default)".to_string())
            })?;
        validate_login(&owner)?;
        Ok(owner)
    }

    /// Clamp a page size to 1..=100, falling back to `default`.
    fn capped_limit(limit: Option<u32>, default: u32) -> u32 {
        limit.unwrap_or(default).clamp(1, MAX_PAGE)
    }

    fn err(&self, e: ProjectsError) -> ErrorData {
        tracing::debug!(kind = e.kind(), error = %e, "Tool call failed");
        e.to_mcp_error()
    }
}

fn json_result(value: serde_json::Value) -> CallToolResult {
    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    CallToolResult::success(vec![Content::text(text)])
}

fn require(value: &str, field: &str) -> Result<(), ProjectsError> {
    if value.trim().is_empty() {
        return Err(ProjectsError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Validate a GitHub user/organization login.
fn validate_login(login: &str) -> Result<(), ProjectsError> {
    require(login, "owner")?;
    if !login
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(ProjectsError::Validation(format!(
            "owner '{login}' contains invalid characters"
        )));
    }
    Ok(())
}

/// Split `owner/name` into its parts.
fn parse_repository(repository: &str) -> Result<(&str, &str), ProjectsError> {
    match repository.trim().split_once('/') {
        Some((owner, name)) if !name.is_empty() && !name.contains('/') => {
            validate_login(owner)?;
            if name
                .chars()
                .any(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')))
            {
                return Err(ProjectsError::Validation(format!(
                    "repository name '{name}' contains invalid characters"
                )));
            }
            Ok((owner, name))
        }
        _ => Err(ProjectsError::Validation(format!(
            "repository must be in owner/name form, got '{repository}'"
        ))),
    }
}

fn build_filter(params: &GetItemsParams) -> Result<ItemFilter, ProjectsError> {
    let field = match (&params.field_name, &params.field_value) {
        (Some(name), Some(value)) => Some((name.clone(), value.clone())),
        (None, None) => None,
        _ => {
            return Err(ProjectsError::Validation(
                "field_name and field_value must be given together".to_string(),
            ))
        }
    };
    Ok(ItemFilter {
        state: params.state.clone(),
        status: params.status.clone(),
        field,
    })
}

// -- MCP tool handlers --

#[tool_router]
impl ProjectsServer {
    #[tool(
        name = "list_projects",
        description = "List GitHub Projects V2 owned by an organization or user"
    )]
    async fn list_projects(
        &self,
        Parameters(params): Parameters<ListProjectsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let owner = self
            .resolve_owner(params.owner.as_deref())
            .map_err(|e| self.err(e))?;
        let first = Self::capped_limit(None, self.max_results);

        let projects = self
            .client
            .list_projects(&owner, params.owner_type, first)
            .await
            .map_err(|e| self.err(e))?;

        Ok(json_result(serde_json::json!({
            "owner": owner,
            "projects": projects,
            "count": projects.len(),
        })))
    }

    #[tool(
        name = "get_project",
        description = "Look up a project by owner and number to obtain its node ID"
    )]
    async fn get_project(
        &self,
        Parameters(params): Parameters<GetProjectParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let owner = self
            .resolve_owner(params.owner.as_deref())
            .map_err(|e| self.err(e))?;

        let project = self
            .client
            .get_project(&owner, params.number)
            .await
            .map_err(|e| self.err(e))?;

        Ok(json_result(serde_json::json!(project)))
    }

    #[tool(
        name = "get_project_fields",
        description = "List the fields of a project with their types, single-select options, and iterations"
    )]
    async fn get_project_fields(
        &self,
        Parameters(params): Parameters<ProjectParams>,
    ) -> Result<CallToolResult, ErrorData> {
        require(&params.project_id, "project_id").map_err(|e| self.err(e))?;

        let fields = self
            .client
            .project_fields(&params.project_id)
            .await
            .map_err(|e| self.err(e))?;

        Ok(json_result(serde_json::json!({
            "project_id": params.project_id,
            "fields": fields,
            "count": fields.len(),
        })))
    }

    #[tool(
        name = "get_project_items",
        description = "List items in a project, optionally filtered by status, a custom single-select field, or issue/PR state"
    )]
    async fn get_project_items(
        &self,
        Parameters(params): Parameters<GetItemsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        require(&params.project_id, "project_id").map_err(|e| self.err(e))?;
        let filter = build_filter(&params).map_err(|e| self.err(e))?;
        let first = Self::capped_limit(params.limit, self.max_results);

        let items = self
            .client
            .project_items(&params.project_id, first)
            .await
            .map_err(|e| self.err(e))?;
        let fetched = items.len();
        let items: Vec<_> = items.into_iter().filter(|i| filter.matches(i)).collect();

        tracing::debug!(fetched, kept = items.len(), "Filtered project items");

        Ok(json_result(serde_json::json!({
            "project_id": params.project_id,
            "items": items,
            "count": items.len(),
        })))
    }

    #[tool(
        name = "search_project_items",
        description = "Search issues and pull requests with GitHub search syntax, keeping only those on the project (draft issues are not searchable)"
    )]
    async fn search_project_items(
        &self,
        Parameters(params): Parameters<SearchItemsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        require(&params.project_id, "project_id").map_err(|e| self.err(e))?;
        require(&params.query, "query").map_err(|e| self.err(e))?;
        let first = Self::capped_limit(params.limit, DEFAULT_SEARCH_LIMIT);

        let items = self
            .client
            .search_project_items(&params.project_id, &params.query, first)
            .await
            .map_err(|e| self.err(e))?;

        Ok(json_result(serde_json::json!({
            "project_id": params.project_id,
            "query": params.query,
            "items": items,
            "count": items.len(),
        })))
    }

    #[tool(
        name = "create_issue",
        description = "Create a new issue in a repository"
    )]
    async fn create_issue(
        &self,
        Parameters(params): Parameters<CreateIssueParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let (owner, name) = parse_repository(&params.repository).map_err(|e| self.err(e))?;
        require(&params.title, "title").map_err(|e| self.err(e))?;

        let issue = self
            .client
            .create_issue(owner, name, &params.title, params.body.as_deref())
            .await
            .map_err(|e| self.err(e))?;

        tracing::info!(repository = %params.repository, number = issue.number, "Created issue");

        Ok(json_result(serde_json::json!({
            "repository": format!("{}/{}", owner, name),
            "issue": issue,
        })))
    }

    #[tool(
        name = "add_issue_to_project",
        description = "Add an existing issue or pull request to a project by its node ID"
    )]
    async fn add_issue_to_project(
        &self,
        Parameters(params): Parameters<AddIssueParams>,
    ) -> Result<CallToolResult, ErrorData> {
        require(&params.project_id, "project_id").map_err(|e| self.err(e))?;
        require(&params.issue_id, "issue_id").map_err(|e| self.err(e))?;

        let item_id = self
            .client
            .add_item(&params.project_id, &params.issue_id)
            .await
            .map_err(|e| self.err(e))?;

        Ok(json_result(serde_json::json!({
            "project_id": params.project_id,
            "issue_id": params.issue_id,
            "item_id": item_id,
        })))
    }

    #[tool(
        name = "update_project_item_field",
        description = "Set a field value on a project item; the value is checked against the field type before anything is changed"
    )]
    async fn update_project_item_field(
        &self,
        Parameters(params): Parameters<UpdateFieldParams>,
    ) -> Result<CallToolResult, ErrorData> {
        require(&params.project_id, "project_id").map_err(|e| self.err(e))?;
        require(&params.item_id, "item_id").map_err(|e| self.err(e))?;
        require(&params.field_id, "field_id").map_err(|e| self.err(e))?;

        let (item_id, applied) = self
            .client
            .update_item_field(
                &params.project_id,
                &params.item_id,
                &params.field_id,
                &params.value,
            )
            .await
            .map_err(|e| self.err(e))?;

        Ok(json_result(serde_json::json!({
            "updated": true,
            "item_id": item_id,
            "field_id": params.field_id,
            "value": applied,
        })))
    }

    #[tool(
        name = "create_draft_issue",
        description = "Create a draft issue directly in a project"
    )]
    async fn create_draft_issue(
        &self,
        Parameters(params): Parameters<DraftIssueParams>,
    ) -> Result<CallToolResult, ErrorData> {
        require(&params.project_id, "project_id").map_err(|e| self.err(e))?;
        require(&params.title, "title").map_err(|e| self.err(e))?;

        let item_id = self
            .client
            .add_draft_issue(&params.project_id, &params.title, params.body.as_deref())
            .await
            .map_err(|e| self.err(e))?;

        Ok(json_result(serde_json::json!({
            "project_id": params.project_id,
            "item_id": item_id,
            "title": params.title,
        })))
    }

    #[tool(
        name = "delete_project_item",
        description = "Remove an item from a project"
    )]
    async fn delete_project_item(
        &self,
        Parameters(params): Parameters<ItemParams>,
    ) -> Result<CallToolResult, ErrorData> {
        require(&params.project_id, "project_id").map_err(|e| self.err(e))?;
        require(&params.item_id, "item_id").map_err(|e| self.err(e))?;

        let deleted = self
            .client
            .delete_item(&params.project_id, &params.item_id)
            .await
            .map_err(|e| self.err(e))?;

        Ok(json_result(serde_json::json!({
            "deleted": true,
            "item_id": deleted,
        })))
    }

    #[tool(
        name = "update_project_settings",
        description = "Change a project's title, short description, or visibility"
    )]
    async fn update_project_settings(
        &self,
        Parameters(params): Parameters<ProjectSettingsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        require(&params.project_id, "project_id").map_err(|e| self.err(e))?;
        let settings = ProjectSettings {
            title: params.title,
            description: params.description,
            public: params.public,
        };

        let project = self
            .client
            .update_project(&params.project_id, &settings)
            .await
            .map_err(|e| self.err(e))?;

        Ok(json_result(serde_json::json!(project)))
    }
}

#[tool_handler]
impl ServerHandler for ProjectsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-github-projects".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "GitHub Projects V2 server. Use list_projects or get_project to find a project's \
                 node ID, get_project_fields for field IDs and options, get_project_items or \
                 search_project_items to read items, create_issue/add_issue_to_project/\
                 create_draft_issue to add work, update_project_item_field to change values, \
                 delete_project_item to remove items, and update_project_settings to edit the \
                 project itself."
                    .to_string(),
            ),
        }
    }
}
