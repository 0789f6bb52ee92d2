//! GraphQL client for the GitHub Projects V2 API.
//!
//! One `POST /graphql` per upstream call; no retries, no pagination past the
//! first page. The `data`/`errors` envelope is unwrapped here so callers only
//! ever see typed results or a [`ProjectsError`].

use std::sync::Arc;
use std::time::Duration;

use octocrab::service::middleware::retry::RetryConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ProjectsError;
use crate::field_value;
use crate::models::{CreatedIssue, Field, Item, OwnerType, Project, ProjectSettings};
use crate::queries;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Search results fetched per call; project filtering runs on this page.
pub const SEARCH_PAGE: u32 = 100;

#[derive(Clone)]
pub struct ProjectsClient {
    github: Arc<octocrab::Octocrab>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl Envelope {
    fn into_data(self) -> Result<Value, ProjectsError> {
        if !self.errors.is_empty() {
            return Err(classify(&self.errors));
        }
        self.data
            .filter(|d| !d.is_null())
            .ok_or_else(|| {
                ProjectsError::Upstream("GraphQL response contained neither data nor errors".into())
            })
    }

    /// Like [`Envelope::into_data`], but tolerates `NOT_FOUND` errors when
    /// data is present. Owner lookups query `organization` and `user`
    /// together and exactly one of them is expected to miss.
    fn into_partial_data(self) -> Result<Value, ProjectsError> {
        let fatal = self
            .errors
            .iter()
            .any(|e| e.kind.as_deref() != Some("NOT_FOUND"));
        match self.data {
            Some(data) if !data.is_null() && !fatal => Ok(data),
            data => Envelope {
                data,
                errors: self.errors,
            }
            .into_data(),
        }
    }
}

fn classify(errors: &[GraphQlError]) -> ProjectsError {
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let kind_is = |k: &str| errors.iter().any(|e| e.kind.as_deref() == Some(k));
    if kind_is("NOT_FOUND") {
        ProjectsError::NotFound(message)
    } else if kind_is("FORBIDDEN") || kind_is("INSUFFICIENT_SCOPES") {
        ProjectsError::Authentication(message)
    } else {
        ProjectsError::Upstream(message)
    }
}

/// Deserialize the value at `pointer`, or fail with `missing()` when it is
/// absent or null.
fn take<T: DeserializeOwned>(
    data: &Value,
    pointer: &str,
    missing: impl FnOnce() -> ProjectsError,
) -> Result<T, ProjectsError> {
    match data.pointer(pointer) {
        Some(v) if !v.is_null() => serde_json::from_value(v.clone()).map_err(|e| {
            ProjectsError::Upstream(format!("Unexpected response shape at {pointer}: {e}"))
        }),
        _ => Err(missing()),
    }
}

fn nodes_at<'a>(data: &'a Value, pointer: &str) -> Option<&'a [Value]> {
    data.pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

impl ProjectsClient {
    pub fn new(github: octocrab::Octocrab) -> Self {
        Self {
            github: Arc::new(github),
        }
    }

    /// Build a client authenticated with a bearer token against `api_url`.
    pub fn connect(token: &str, api_url: &str, timeout: Duration) -> Result<Self, ProjectsError> {
        if token.trim().is_empty() {
            return Err(ProjectsError::Authentication(
                "a GitHub token is required".to_string(),
            ));
        }
        let github = octocrab::OctocrabBuilder::new()
            .personal_token(token.to_string())
            .base_uri(api_url)
            .map_err(|e| ProjectsError::Validation(format!("invalid API URL {api_url}: {e}")))?
            .add_retry_config(RetryConfig::None)
            .set_connect_timeout(Some(timeout))
            .set_read_timeout(Some(timeout))
            .build()
            .map_err(|e| ProjectsError::Upstream(format!("Failed to create GitHub client: {e}")))?;
        Ok(Self::new(github))
    }

    async fn send(&self, document: &str, variables: Value) -> Result<Envelope, ProjectsError> {
        let operation = queries::operation_name(document);
        tracing::debug!(operation, "Sending GraphQL request");

        let payload = json!({ "query": document, "variables": variables });
        let envelope: Envelope = self
            .github
            .post("/graphql", Some(&payload))
            .await
            .map_err(|e| {
                let err = ProjectsError::from(e);
                tracing::warn!(operation, error = %err, "GraphQL request failed");
                err
            })?;
        Ok(envelope)
    }

    /// Run a document and return its `data` object.
    pub async fn execute(&self, document: &str, variables: Value) -> Result<Value, ProjectsError> {
        let operation = queries::operation_name(document);
        self.send(document, variables).await?.into_data().map_err(|e| {
            tracing::warn!(operation, error = %e, "GraphQL errors in response");
            e
        })
    }

    async fn execute_partial(
        &self,
        document: &str,
        variables: Value,
    ) -> Result<Value, ProjectsError> {
        self.send(document, variables).await?.into_partial_data()
    }

    pub async fn owner_type(&self, login: &str) -> Result<OwnerType, ProjectsError> {
        let data = self
            .execute_partial(queries::OWNER_TYPE, json!({ "login": login }))
            .await?;
        if data.get("organization").is_some_and(|o| !o.is_null()) {
            Ok(OwnerType::Organization)
        } else if data.get("user").is_some_and(|u| !u.is_null()) {
            Ok(OwnerType::User)
        } else {
            Err(ProjectsError::NotFound(format!("owner '{login}' does not exist")))
        }
    }

    pub async fn list_projects(
        &self,
        owner: &str,
        owner_type: Option<OwnerType>,
        first: u32,
    ) -> Result<Vec<Project>, ProjectsError> {
        let owner_type = match owner_type {
            Some(t) => t,
            None => self.owner_type(owner).await?,
        };
        let (document, root) = match owner_type {
            OwnerType::Organization => (queries::ORG_PROJECTS, "organization"),
            OwnerType::User => (queries::USER_PROJECTS, "user"),
        };
        let data = self
            .execute_partial(document, json!({ "login": owner, "first": first }))
            .await?;
        let projects: Vec<Project> = take(&data, &format!("/{root}/projectsV2/nodes"), || {
            ProjectsError::NotFound(format!("{} '{owner}' does not exist", owner_type.as_str()))
        })?;

        Ok(projects
            .into_iter()
            .filter(|p| {
                p.owner
                    .as_deref()
                    .map_or(true, |login| login.eq_ignore_ascii_case(owner))
            })
            .collect())
    }

    /// Resolve a project from its owner and number.
    pub async fn get_project(&self, owner: &str, number: u64) -> Result<Project, ProjectsError> {
        let data = self
            .execute_partial(
                queries::PROJECT_BY_NUMBER,
                json!({ "login": owner, "number": number }),
            )
            .await?;
        for root in ["organization", "user"] {
            let pointer = format!("/{root}/projectV2");
            if data.pointer(&pointer).is_some_and(|p| !p.is_null()) {
                return take(&data, &pointer, || ProjectsError::NotFound(String::new()));
            }
        }
        Err(ProjectsError::NotFound(format!(
            "project #{number} not found for owner '{owner}'"
        )))
    }

    pub async fn project_fields(&self, project_id: &str) -> Result<Vec<Field>, ProjectsError> {
        let data = self
            .execute(queries::PROJECT_FIELDS, json!({ "projectId": project_id }))
            .await?;
        nodes_at(&data, "/node/fields/nodes")
            .map(Field::parse_nodes)
            .ok_or_else(|| ProjectsError::NotFound(format!("project '{project_id}' not found")))
    }

    pub async fn field(&self, field_id: &str) -> Result<Field, ProjectsError> {
        let data = self
            .execute(queries::FIELD_BY_ID, json!({ "fieldId": field_id }))
            .await?;
        match data.get("node") {
            Some(node) if node.get("id").is_some() => Field::parse_nodes(std::slice::from_ref(node))
                .pop()
                .ok_or_else(|| {
                    ProjectsError::Upstream(format!("could not read field '{field_id}'"))
                }),
            _ => Err(ProjectsError::NotFound(format!("field '{field_id}' not found"))),
        }
    }

    pub async fn project_items(
        &self,
        project_id: &str,
        first: u32,
    ) -> Result<Vec<Item>, ProjectsError> {
        let data = self
            .execute(
                queries::PROJECT_ITEMS,
                json!({ "projectId": project_id, "first": first }),
            )
            .await?;
        nodes_at(&data, "/node/items/nodes")
            .map(Item::parse_nodes)
            .ok_or_else(|| ProjectsError::NotFound(format!("project '{project_id}' not found")))
    }

    /// Issue search restricted to items of one project, returning at most
    /// `limit` matches. Draft issues are not searchable and never appear.
    pub async fn search_project_items(
        &self,
        project_id: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Item>, ProjectsError> {
        let data = self
            .execute(
                queries::SEARCH_ITEMS,
                json!({ "query": query, "first": SEARCH_PAGE }),
            )
            .await?;
        let results = nodes_at(&data, "/search/nodes").unwrap_or_default();

        Ok(results
            .iter()
            .filter_map(|r| nodes_at(r, "/projectItems/nodes"))
            .flat_map(Item::parse_nodes)
            .filter(|item| item.project_id.as_deref() == Some(project_id))
            .take(limit as usize)
            .collect())
    }

    pub async fn create_issue(
        &self,
        owner: &str,
        name: &str,
        title: &str,
        body: Option<&str>,
    ) -> Result<CreatedIssue, ProjectsError> {
        let data = self
            .execute(
                queries::REPOSITORY_ID,
                json!({ "owner": owner, "name": name }),
            )
            .await?;
        let repository_id: String = take(&data, "/repository/id", || {
            ProjectsError::NotFound(format!("repository '{owner}/{name}' not found"))
        })?;

        let data = self
            .execute(
                queries::CREATE_ISSUE,
                json!({ "repositoryId": repository_id, "title": title, "body": body }),
            )
            .await?;
        take(&data, "/createIssue/issue", || {
            ProjectsError::Upstream(format!("issue creation in '{owner}/{name}' returned no issue"))
        })
    }

    pub async fn add_item(&self, project_id: &str, content_id: &str) -> Result<String, ProjectsError> {
        let data = self
            .execute(
                queries::ADD_ITEM,
                json!({ "projectId": project_id, "contentId": content_id }),
            )
            .await?;
        take(&data, "/addProjectV2ItemById/item/id", || {
            ProjectsError::Upstream(format!("adding '{content_id}' returned no item"))
        })
    }

    pub async fn add_draft_issue(
        &self,
        project_id: &str,
        title: &str,
        body: Option<&str>,
    ) -> Result<String, ProjectsError> {
        let data = self
            .execute(
                queries::ADD_DRAFT_ISSUE,
                json!({ "projectId": project_id, "title": title, "body": body }),
            )
            .await?;
        take(&data, "/addProjectV2DraftIssue/projectItem/id", || {
            ProjectsError::Upstream("draft issue creation returned no item".to_string())
        })
    }

    /// Set one field of an item. The field is read first and `value` coerced
    /// to its type; a mismatch fails before the mutation is sent.
    /// Returns the item id and the `ProjectV2FieldValue` that was applied.
    pub async fn update_item_field(
        &self,
        project_id: &str,
        item_id: &str,
        field_id: &str,
        value: &Value,
    ) -> Result<(String, Value), ProjectsError> {
        let field = self.field(field_id).await?;
        let input = field_value::coerce(&field, value)?;
        tracing::debug!(field = %field.name, input = %input, "Updating project item field");

        let data = self
            .execute(
                queries::UPDATE_ITEM_FIELD,
                json!({
                    "projectId": project_id,
                    "itemId": item_id,
                    "fieldId": field_id,
                    "value": input,
                }),
            )
            .await?;
        let id = take(&data, "/updateProjectV2ItemFieldValue/projectV2Item/id", || {
            ProjectsError::Upstream(format!("update of item '{item_id}' returned no item"))
        })?;
        Ok((id, input))
    }

    pub async fn delete_item(&self, project_id: &str, item_id: &str) -> Result<String, ProjectsError> {
        let data = self
            .execute(
                queries::DELETE_ITEM,
                json!({ "projectId": project_id, "itemId": item_id }),
            )
            .await?;
        take(&data, "/deleteProjectV2Item/deletedItemId", || {
            ProjectsError::Upstream(format!("deleting item '{item_id}' returned no id"))
        })
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        settings: &ProjectSettings,
    ) -> Result<Project, ProjectsError> {
        if settings.is_empty() {
            return Err(ProjectsError::Validation(
                "at least one of title, description or public must be set".to_string(),
            ));
        }
        let mut input = serde_json::Map::new();
        input.insert("projectId".into(), json!(project_id));
        if let Some(ref title) = settings.title {
            input.insert("title".into(), json!(title));
        }
        if let Some(ref description) = settings.description {
            input.insert("shortDescription".into(), json!(description));
        }
        if let Some(public) = settings.public {
            input.insert("public".into(), json!(public));
        }

        let data = self
            .execute(queries::UPDATE_PROJECT, json!({ "input": input }))
            .await?;
        take(&data, "/updateProjectV2/projectV2", || {
            ProjectsError::Upstream(format!("update of project '{project_id}' returned no project"))
        })
    }
}
