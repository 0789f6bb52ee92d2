//! Canned GraphQL documents sent to the GitHub API.
//!
//! Every tool maps to one or two of these; nothing is assembled dynamically
//! apart from the `variables` object sent alongside.

pub const OWNER_TYPE: &str = r#"
query OwnerType($login: String!) {
  organization(login: $login) { id login }
  user(login: $login) { id login }
}
"#;

pub const ORG_PROJECTS: &str = r#"
query OrgProjects($login: String!, $first: Int!) {
  organization(login: $login) {
    projectsV2(first: $first) {
      nodes {
        id number title shortDescription url closed public
        owner { ... on Organization { login } ... on User { login } }
      }
    }
  }
}
"#;

pub const USER_PROJECTS: &str = r#"
query UserProjects($login: String!, $first: Int!) {
  user(login: $login) {
    projectsV2(first: $first) {
      nodes {
        id number title shortDescription url closed public
        owner { ... on Organization { login } ... on User { login } }
      }
    }
  }
}
"#;

pub const PROJECT_BY_NUMBER: &str = r#"
query ProjectByNumber($login: String!, $number: Int!) {
  organization(login: $login) {
    projectV2(number: $number) {
      id number title shortDescription url closed public
      owner { ... on Organization { login } ... on User { login } }
    }
  }
  user(login: $login) {
    projectV2(number: $number) {
      id number title shortDescription url closed public
      owner { ... on Organization { login } ... on User { login } }
    }
  }
}
"#;

pub const PROJECT_FIELDS: &str = r#"
query ProjectFields($projectId: ID!) {
  node(id: $projectId) {
    ... on ProjectV2 {
      fields(first: 50) {
        nodes {
          ... on ProjectV2Field { id name dataType }
          ... on ProjectV2IterationField {
            id name dataType
            configuration { iterations { id title startDate duration } }
          }
          ... on ProjectV2SingleSelectField {
            id name dataType
            options { id name }
          }
        }
      }
    }
  }
}
"#;

pub const FIELD_BY_ID: &str = r#"
query FieldById($fieldId: ID!) {
  node(id: $fieldId) {
    ... on ProjectV2Field { id name dataType }
    ... on ProjectV2IterationField {
      id name dataType
      configuration { iterations { id title startDate duration } }
    }
    ... on ProjectV2SingleSelectField {
      id name dataType
      options { id name }
    }
  }
}
"#;

// Shared selection for project items; spliced into the item queries below.
macro_rules! item_selection {
    () => {
        r#"
        id
        type
        project { id }
        fieldValues(first: 20) {
          nodes {
            __typename
            ... on ProjectV2ItemFieldTextValue {
              text
              field { ... on ProjectV2FieldCommon { id name } }
            }
            ... on ProjectV2ItemFieldDateValue {
              date
              field { ... on ProjectV2FieldCommon { id name } }
            }
            ... on ProjectV2ItemFieldNumberValue {
              number
              field { ... on ProjectV2FieldCommon { id name } }
            }
            ... on ProjectV2ItemFieldSingleSelectValue {
              name
              field { ... on ProjectV2FieldCommon { id name } }
            }
            ... on ProjectV2ItemFieldIterationValue {
              title startDate
              field { ... on ProjectV2FieldCommon { id name } }
            }
          }
        }
        content {
          __typename
          ... on Issue {
            id number title state url
            repository { nameWithOwner }
          }
          ... on PullRequest {
            id number title state url
            repository { nameWithOwner }
          }
          ... on DraftIssue { id title }
        }
        "#
    };
}

pub const PROJECT_ITEMS: &str = concat!(
    r#"
query ProjectItems($projectId: ID!, $first: Int!) {
  node(id: $projectId) {
    ... on ProjectV2 {
      items(first: $first) {
        nodes {"#,
    item_selection!(),
    r#"}
      }
    }
  }
}
"#
);

pub const SEARCH_ITEMS: &str = concat!(
    r#"
query SearchItems($query: String!, $first: Int!) {
  search(query: $query, type: ISSUE, first: $first) {
    nodes {
      ... on Issue {
        projectItems(first: 20) {
          nodes {"#,
    item_selection!(),
    r#"}
        }
      }
      ... on PullRequest {
        projectItems(first: 20) {
          nodes {"#,
    item_selection!(),
    r#"}
        }
      }
    }
  }
}
"#
);

pub const REPOSITORY_ID: &str = r#"
query RepositoryId($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) { id }
}
"#;

pub const CREATE_ISSUE: &str = r#"
mutation CreateIssue($repositoryId: ID!, $title: String!, $body: String) {
  createIssue(input: { repositoryId: $repositoryId, title: $title, body: $body }) {
    issue { id number title url }
  }
}
"#;

pub const ADD_ITEM: &str = r#"
mutation AddItem($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: { projectId: $projectId, contentId: $contentId }) {
    item { id }
  }
}
"#;

pub const ADD_DRAFT_ISSUE: &str = r#"
mutation AddDraftIssue($projectId: ID!, $title: String!, $body: String) {
  addProjectV2DraftIssue(input: { projectId: $projectId, title: $title, body: $body }) {
    projectItem { id }
  }
}
"#;

pub const UPDATE_ITEM_FIELD: &str = r#"
mutation UpdateItemField($projectId: ID!, $itemId: ID!, $fieldId: ID!, $value: ProjectV2FieldValue!) {
  updateProjectV2ItemFieldValue(input: {
    projectId: $projectId, itemId: $itemId, fieldId: $fieldId, value: $value
  }) {
    projectV2Item { id }
  }
}
"#;

pub const DELETE_ITEM: &str = r#"
mutation DeleteItem($projectId: ID!, $itemId: ID!) {
  deleteProjectV2Item(input: { projectId: $projectId, itemId: $itemId }) {
    deletedItemId
  }
}
"#;

pub const UPDATE_PROJECT: &str = r#"
mutation UpdateProject($input: UpdateProjectV2Input!) {
  updateProjectV2(input: $input) {
    projectV2 {
      id number title shortDescription url closed public
      owner { ... on Organization { login } ... on User { login } }
    }
  }
}
"#;

/// Operation name of a document, used for logging.
pub fn operation_name(document: &str) -> &str {
    document
        .split_whitespace()
        .skip_while(|word| *word != "query" && *word != "mutation")
        .nth(1)
        .and_then(|name| name.split('(').next())
        .unwrap_or("anonymous")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_name() {
        assert_eq!(operation_name(OWNER_TYPE), "OwnerType");
        assert_eq!(operation_name(PROJECT_ITEMS), "ProjectItems");
        assert_eq!(operation_name(DELETE_ITEM), "DeleteItem");
        assert_eq!(operation_name("{ viewer { login } }"), "anonymous");
    }

    #[test]
    fn test_item_selection_is_spliced() {
        assert!(PROJECT_ITEMS.contains("fieldValues(first: 20)"));
        assert_eq!(SEARCH_ITEMS.matches("fieldValues(first: 20)").count(), 2);
    }

    #[test]
    fn test_field_values_select_field_id() {
        assert_eq!(PROJECT_ITEMS.matches("ProjectV2FieldCommon { id name }").count(), 5);
    }
}
