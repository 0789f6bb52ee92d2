//! Coercion of caller-supplied values into `ProjectV2FieldValue` inputs.
//!
//! The field definition is always fetched before an update so that a value of
//! the wrong shape is rejected locally and never reaches the mutation.

use serde_json::{json, Value};

use crate::error::ProjectsError;
use crate::models::{Field, FieldDataType};

pub fn coerce(field: &Field, value: &Value) -> Result<Value, ProjectsError> {
    match field.data_type {
        FieldDataType::Text => match value {
            Value::String(s) => Ok(json!({ "text": s })),
            Value::Number(n) => Ok(json!({ "text": n.to_string() })),
            other => Err(mismatch(field, "a string", other)),
        },
        FieldDataType::Number => {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match number {
                Some(n) if n.is_finite() => Ok(json!({ "number": n })),
                _ => Err(mismatch(field, "a number", value)),
            }
        }
        FieldDataType::Date => {
            let s = value
                .as_str()
                .ok_or_else(|| mismatch(field, "a date string (YYYY-MM-DD)", value))?;
            chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| mismatch(field, "a date string (YYYY-MM-DD)", value))?;
            Ok(json!({ "date": s.trim() }))
        }
        FieldDataType::SingleSelect => {
            let s = value
                .as_str()
                .ok_or_else(|| mismatch(field, "an option id or name", value))?;
            let option = field
                .options
                .iter()
                .find(|o| o.id == s)
                .or_else(|| field.options.iter().find(|o| o.name.eq_ignore_ascii_case(s)))
                .ok_or_else(|| {
                    let names: Vec<&str> = field.options.iter().map(|o| o.name.as_str()).collect();
                    ProjectsError::Validation(format!(
                        "'{}' is not an option of field '{}' (options: {})",
                        s,
                        field.name,
                        names.join(", ")
                    ))
                })?;
            Ok(json!({ "singleSelectOptionId": option.id }))
        }
        FieldDataType::Iteration => {
            let s = value
                .as_str()
                .ok_or_else(|| mismatch(field, "an iteration id or title", value))?;
            let iteration = field
                .iterations
                .iter()
                .find(|i| i.id == s)
                .or_else(|| field.iterations.iter().find(|i| i.title.eq_ignore_ascii_case(s)))
                .ok_or_else(|| {
                    ProjectsError::Validation(format!(
                        "'{}' is not an active iteration of field '{}'",
                        s, field.name
                    ))
                })?;
            Ok(json!({ "iterationId": iteration.id }))
        }
        other => Err(ProjectsError::Validation(format!(
            "field '{}' has type {:?} which cannot be set through this tool",
            field.name, other
        ))),
    }
}

fn mismatch(field: &Field, expected: &str, got: &Value) -> ProjectsError {
    ProjectsError::Validation(format!(
        "field '{}' expects {}, got {}",
        field.name, expected, got
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldOption, Iteration};

    fn field(data_type: FieldDataType) -> Field {
        Field {
            id: "F_1".to_string(),
            name: "Test".to_string(),
            data_type,
            options: vec![
                FieldOption { id: "opt1".to_string(), name: "Todo".to_string() },
                FieldOption { id: "opt2".to_string(), name: "Done".to_string() },
            ],
            iterations: vec![Iteration {
                id: "it1".to_string(),
                title: "Sprint 1".to_string(),
                start_date: Some("2024-01-01".to_string()),
                duration: Some(14),
            }],
        }
    }

    fn is_validation(result: Result<Value, ProjectsError>) -> bool {
        matches!(result, Err(ProjectsError::Validation(_)))
    }

    #[test]
    fn test_text() {
        let f = field(FieldDataType::Text);
        assert_eq!(coerce(&f, &json!("hello")).unwrap(), json!({ "text": "hello" }));
        assert_eq!(coerce(&f, &json!(12)).unwrap(), json!({ "text": "12" }));
        assert!(is_validation(coerce(&f, &json!(true))));
    }

    #[test]
    fn test_number() {
        let f = field(FieldDataType::Number);
        assert_eq!(coerce(&f, &json!(3)).unwrap(), json!({ "number": 3.0 }));
        assert_eq!(coerce(&f, &json!(" 2.5 ")).unwrap(), json!({ "number": 2.5 }));
        assert!(is_validation(coerce(&f, &json!("three"))));
        assert!(is_validation(coerce(&f, &json!("NaN"))));
        assert!(is_validation(coerce(&f, &json!(null))));
    }

    #[test]
    fn test_date() {
        let f = field(FieldDataType::Date);
        assert_eq!(coerce(&f, &json!("2024-02-29")).unwrap(), json!({ "date": "2024-02-29" }));
        assert!(is_validation(coerce(&f, &json!("2023-02-29"))));
        assert!(is_validation(coerce(&f, &json!("tomorrow"))));
        assert!(is_validation(coerce(&f, &json!(20240101))));
    }

    #[test]
    fn test_single_select_by_id_or_name() {
        let f = field(FieldDataType::SingleSelect);
        assert_eq!(
            coerce(&f, &json!("opt2")).unwrap(),
            json!({ "singleSelectOptionId": "opt2" })
        );
        assert_eq!(
            coerce(&f, &json!("done")).unwrap(),
            json!({ "singleSelectOptionId": "opt2" })
        );
        assert!(is_validation(coerce(&f, &json!("Blocked"))));
        assert!(is_validation(coerce(&f, &json!(1))));
    }

    #[test]
    fn test_iteration_by_id_or_title() {
        let f = field(FieldDataType::Iteration);
        assert_eq!(coerce(&f, &json!("it1")).unwrap(), json!({ "iterationId": "it1" }));
        assert_eq!(coerce(&f, &json!("sprint 1")).unwrap(), json!({ "iterationId": "it1" }));
        assert!(is_validation(coerce(&f, &json!("Sprint 9"))));
    }

    #[test]
    fn test_unsupported_type() {
        let f = field(FieldDataType::Assignees);
        assert!(is_validation(coerce(&f, &json!("octocat"))));
    }
}
