//! Simplified views of GitHub Projects V2 objects.
//!
//! Types deserialize from the camelCase GraphQL payloads and serialize back
//! out in snake_case for tool results. Nothing here is cached; every value is
//! built from a single response and dropped once the tool returns.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Kind of account that owns a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OwnerType {
    Organization,
    User,
}

impl OwnerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerType::Organization => "organization",
            OwnerType::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub number: u64,
    pub title: String,
    #[serde(default, deserialize_with = "owner_login")]
    pub owner: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename(deserialize = "shortDescription"))]
    pub short_description: Option<String>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub public: bool,
}

fn owner_login<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    struct Login {
        login: Option<String>,
    }
    Ok(Option::<Login>::deserialize(d)?.and_then(|l| l.login))
}

/// `ProjectV2FieldType` as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldDataType {
    Assignees,
    Date,
    Iteration,
    Labels,
    LinkedPullRequests,
    Milestone,
    Number,
    ParentIssue,
    Repository,
    Reviewers,
    SingleSelect,
    SubIssuesProgress,
    Text,
    Title,
    TrackedBy,
    Tracks,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    pub id: String,
    pub title: String,
    #[serde(default, rename(deserialize = "startDate"))]
    pub start_date: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(rename(deserialize = "dataType"))]
    pub data_type: FieldDataType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(
        default,
        rename(deserialize = "configuration"),
        deserialize_with = "iterations",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub iterations: Vec<Iteration>,
}

fn iterations<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Iteration>, D::Error> {
    #[derive(Deserialize)]
    struct Configuration {
        #[serde(default)]
        iterations: Vec<Iteration>,
    }
    Ok(Option::<Configuration>::deserialize(d)?
        .map(|c| c.iterations)
        .unwrap_or_default())
}

impl Field {
    /// Parse a `fields.nodes` array. Union members outside the requested
    /// fragments come back as empty objects and are skipped.
    pub fn parse_nodes(nodes: &[Value]) -> Vec<Field> {
        nodes
            .iter()
            .filter(|node| node.get("id").is_some())
            .filter_map(|node| match serde_json::from_value(node.clone()) {
                Ok(field) => Some(field),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unparseable project field");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Issue,
    PullRequest,
    DraftIssue,
    #[serde(other)]
    Other,
}

/// The issue, pull request or draft issue behind a project item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemContent {
    #[serde(rename(deserialize = "__typename"))]
    pub kind: ContentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "name_with_owner",
        skip_serializing_if = "Option::is_none"
    )]
    pub repository: Option<String>,
}

fn name_with_owner<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    struct Repository {
        #[serde(rename = "nameWithOwner")]
        name_with_owner: Option<String>,
    }
    Ok(Option::<Repository>::deserialize(d)?.and_then(|r| r.name_with_owner))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub content: Option<ItemContent>,
    /// Current values keyed by field id.
    pub field_values: BTreeMap<String, FieldValue>,
    #[serde(skip)]
    pub project_id: Option<String>,
}

/// Current value of one field on an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

#[derive(Deserialize)]
struct RawItem {
    id: String,
    #[serde(default, rename = "type")]
    item_type: Option<String>,
    #[serde(default)]
    project: Option<IdRef>,
    #[serde(default, rename = "fieldValues")]
    field_values: Option<Nodes>,
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Deserialize)]
struct IdRef {
    id: String,
}

#[derive(Deserialize)]
struct Nodes {
    #[serde(default)]
    nodes: Vec<Value>,
}

impl Item {
    /// Parse an `items.nodes` array, flattening field values into a map.
    pub fn parse_nodes(nodes: &[Value]) -> Vec<Item> {
        nodes
            .iter()
            .filter_map(|node| match serde_json::from_value::<RawItem>(node.clone()) {
                Ok(raw) => Some(Item::from_raw(raw)),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unparseable project item");
                    None
                }
            })
            .collect()
    }

    /// Look a value up by field name, ignoring ASCII case.
    pub fn field_value(&self, field_name: &str) -> Option<&Value> {
        self.field_values
            .values()
            .find(|fv| fv.name.eq_ignore_ascii_case(field_name))
            .map(|fv| &fv.value)
    }

    fn from_raw(raw: RawItem) -> Self {
        let field_values = raw
            .field_values
            .map(|fv| fv.nodes.iter().filter_map(flatten_field_value).collect())
            .unwrap_or_default();

        // Redacted items and unknown content types have no usable payload.
        let content = raw
            .content
            .filter(|c| !c.is_null())
            .and_then(|c| serde_json::from_value(c).ok());

        Item {
            id: raw.id,
            item_type: raw.item_type.unwrap_or_else(|| "UNKNOWN".to_string()),
            content,
            field_values,
            project_id: raw.project.map(|p| p.id),
        }
    }
}

/// Reduce one `ProjectV2ItemFieldValue` node to `(field id, value)`.
fn flatten_field_value(node: &Value) -> Option<(String, FieldValue)> {
    let id = node.pointer("/field/id")?.as_str()?.to_string();
    let name = node.pointer("/field/name")?.as_str()?.to_string();
    let value = match node.get("__typename")?.as_str()? {
        "ProjectV2ItemFieldTextValue" => node.get("text")?.clone(),
        "ProjectV2ItemFieldDateValue" => node.get("date")?.clone(),
        "ProjectV2ItemFieldNumberValue" => node.get("number")?.clone(),
        "ProjectV2ItemFieldSingleSelectValue" => node.get("name")?.clone(),
        "ProjectV2ItemFieldIterationValue" => {
            let title = node.get("title").and_then(Value::as_str).unwrap_or("N/A");
            match node.get("startDate").and_then(Value::as_str) {
                Some(start) => Value::String(format!("{title} (start: {start})")),
                None => Value::String(title.to_string()),
            }
        }
        _ => return None,
    };
    Some((id, FieldValue { name, value }))
}

/// Client-side filter applied to a fetched page of items.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Content state such as OPEN, CLOSED or MERGED.
    pub state: Option<String>,
    /// Value of the built-in `Status` field.
    pub status: Option<String>,
    /// Custom single-select field name and the option name it must hold.
    pub field: Option<(String, String)>,
}

pub const STATUS_FIELD: &str = "Status";

impl ItemFilter {
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.status.is_none() && self.field.is_none()
    }

    pub fn matches(&self, item: &Item) -> bool {
        if let Some(ref state) = self.state {
            let content_state = item.content.as_ref().and_then(|c| c.state.as_deref());
            match content_state {
                Some(s) if s.eq_ignore_ascii_case(state) => {}
                _ => return false,
            }
        }
        if let Some(ref status) = self.status {
            if !field_equals(item, STATUS_FIELD, status) {
                return false;
            }
        }
        if let Some((ref name, ref value)) = self.field {
            if !field_equals(item, name, value) {
                return false;
            }
        }
        true
    }
}

fn field_equals(item: &Item, field_name: &str, expected: &str) -> bool {
    match item.field_value(field_name) {
        Some(Value::String(s)) => s.eq_ignore_ascii_case(expected),
        Some(Value::Number(n)) => match (n.as_f64(), expected.trim().parse::<f64>()) {
            (Some(actual), Ok(wanted)) => actual == wanted,
            _ => false,
        },
        Some(other) => other.to_string() == expected,
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub url: String,
}

/// Optional settings for `update_project_settings`.
#[derive(Debug, Clone, Default)]
pub struct ProjectSettings {
    pub title: Option<String>,
    pub description: Option<String>,
    pub public: Option<bool>,
}

impl ProjectSettings {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.public.is_none()
    }
}
