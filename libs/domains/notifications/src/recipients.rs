//! Turns a trigger's `recipientType` + `recipientConfig` into user ids.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use crate::conditions::{Condition, lookup};
use crate::directory::UserDirectory;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{RecipientType, TenantId, UserId};
use crate::templates::{Variables, variables_from_json};

/// Parsed recipient configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum RecipientSpec {
    AllUsers,
    SpecificUsers(Vec<UserId>),
    Roles(Vec<String>),
    Departments(Vec<String>),
    /// Users named by payload fields, plus users of every rule whose condition holds.
    Conditional {
        user_id_fields: Vec<String>,
        rules: Vec<(Condition, Vec<UserId>)>,
    },
}

fn invalid(message: impl Into<String>) -> NotificationError {
    NotificationError::RecipientResolution(message.into())
}

/// Accepts `9` and `"9"`.
fn user_id(value: &Value) -> Option<UserId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn user_ids(key: &str, value: &Value) -> NotificationResult<Vec<UserId>> {
    value
        .as_array()
        .ok_or_else(|| invalid(format!("`{key}` must be an array of user ids")))?
        .iter()
        .map(|v| user_id(v).ok_or_else(|| invalid(format!("`{key}` contains non-numeric id {v}"))))
        .collect()
}

fn strings(key: &str, value: &Value) -> NotificationResult<Vec<String>> {
    value
        .as_array()
        .ok_or_else(|| invalid(format!("`{key}` must be an array of strings")))?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(format!("`{key}` contains non-string {v}")))
        })
        .collect()
}

/// `{single: ".."}` or `{plural: [..]}`.
fn one_or_many(config: &Map<String, Value>, single: &str, plural: &str) -> NotificationResult<Vec<String>> {
    if let Some(value) = config.get(plural) {
        return strings(plural, value);
    }
    match config.get(single) {
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(other) => Err(invalid(format!("`{single}` must be a string, got {other}"))),
        None => Err(invalid(format!("config needs `{single}` or `{plural}`"))),
    }
}

impl RecipientSpec {
    pub fn parse(recipient_type: RecipientType, config: &Value) -> NotificationResult<Self> {
        let empty = Map::new();
        let config = match config {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(invalid("recipient config must be an object")),
        };

        match recipient_type {
            RecipientType::AllUsers => Ok(Self::AllUsers),
            RecipientType::SpecificUsers => {
                let ids = config
                    .get("userIds")
                    .ok_or_else(|| invalid("specific_users needs `userIds`"))?;
                Ok(Self::SpecificUsers(user_ids("userIds", ids)?))
            }
            RecipientType::RoleBased => Ok(Self::Roles(one_or_many(config, "role", "roles")?)),
            RecipientType::DepartmentBased => Ok(Self::Departments(one_or_many(
                config,
                "department",
                "departments",
            )?)),
            RecipientType::Conditional => {
                let fields = config.get("userIdFields");
                let rules = config.get("rules");
                if fields.is_none() && rules.is_none() {
                    return Err(invalid("conditional needs `userIdFields` or `rules`"));
                }

                let user_id_fields = match fields {
                    Some(value) => strings("userIdFields", value)?,
                    None => Vec::new(),
                };
                let rules = match rules {
                    Some(value) => value
                        .as_array()
                        .ok_or_else(|| invalid("`rules` must be an array"))?
                        .iter()
                        .map(|rule| {
                            let when = rule
                                .get("when")
                                .ok_or_else(|| invalid("rule needs `when`"))?;
                            let condition = Condition::parse(when)
                                .map_err(|e| invalid(format!("rule condition: {e}")))?;
                            let ids = rule
                                .get("userIds")
                                .ok_or_else(|| invalid("rule needs `userIds`"))?;
                            Ok((condition, user_ids("userIds", ids)?))
                        })
                        .collect::<NotificationResult<Vec<_>>>()?,
                    None => Vec::new(),
                };

                Ok(Self::Conditional {
                    user_id_fields,
                    rules,
                })
            }
        }
    }
}

/// Rendering constants from `recipientConfig.variables`.
pub fn trigger_variables(config: &Value) -> Variables {
    config
        .get("variables")
        .map(variables_from_json)
        .unwrap_or_default()
}

/// First-seen order, duplicates dropped.
pub fn dedupe(ids: impl IntoIterator<Item = UserId>) -> Vec<UserId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[derive(Clone)]
pub struct RecipientResolver {
    directory: Arc<dyn UserDirectory>,
}

impl RecipientResolver {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    pub async fn resolve(
        &self,
        tenant_id: TenantId,
        spec: &RecipientSpec,
        payload: &Value,
    ) -> NotificationResult<Vec<UserId>> {
        let ids = match spec {
            RecipientSpec::AllUsers => self.directory.all_users(tenant_id).await?,
            RecipientSpec::SpecificUsers(ids) => ids.clone(),
            RecipientSpec::Roles(roles) => self.directory.users_with_roles(tenant_id, roles).await?,
            RecipientSpec::Departments(departments) => {
                self.directory
                    .users_in_departments(tenant_id, departments)
                    .await?
            }
            RecipientSpec::Conditional {
                user_id_fields,
                rules,
            } => {
                let mut ids = Vec::new();
                for field in user_id_fields {
                    match lookup(payload, field) {
                        Some(Value::Array(items)) => ids.extend(items.iter().filter_map(user_id)),
                        Some(value) => match user_id(value) {
                            Some(id) => ids.push(id),
                            None => warn!(field, "Payload field is not a user id"),
                        },
                        None => {}
                    }
                }
                for (condition, rule_ids) in rules {
                    if condition.evaluate(payload) {
                        ids.extend(rule_ids);
                    }
                }
                ids
            }
        };
        Ok(dedupe(ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{InMemoryUserDirectory, MockUserDirectory};
    use crate::models::DirectoryUser;
    use serde_json::json;

    #[test]
    fn parses_each_shape() {
        assert_eq!(
            RecipientSpec::parse(RecipientType::SpecificUsers, &json!({"userIds": [9, "10"]})).unwrap(),
            RecipientSpec::SpecificUsers(vec![9, 10])
        );
        assert_eq!(
            RecipientSpec::parse(RecipientType::RoleBased, &json!({"role": "accountant"})).unwrap(),
            RecipientSpec::Roles(vec!["accountant".into()])
        );
        assert_eq!(
            RecipientSpec::parse(RecipientType::DepartmentBased, &json!({"departments": ["ops", "it"]}))
                .unwrap(),
            RecipientSpec::Departments(vec!["ops".into(), "it".into()])
        );
        assert_eq!(
            RecipientSpec::parse(RecipientType::AllUsers, &Value::Null).unwrap(),
            RecipientSpec::AllUsers
        );
    }

    #[test]
    fn rejects_missing_or_mistyped_config() {
        for (kind, config) in [
            (RecipientType::SpecificUsers, json!({})),
            (RecipientType::SpecificUsers, json!({"userIds": ["nine"]})),
            (RecipientType::RoleBased, json!({"role": 7})),
            (RecipientType::DepartmentBased, json!({})),
            (RecipientType::Conditional, json!({})),
            (RecipientType::Conditional, json!({"rules": [{"when": "x", "userIds": [1]}]})),
            (RecipientType::AllUsers, json!([1, 2])),
        ] {
            assert!(
                matches!(
                    RecipientSpec::parse(kind, &config),
                    Err(NotificationError::RecipientResolution(_))
                ),
                "{kind} {config} should be rejected"
            );
        }
    }

    #[test]
    fn reads_trigger_variables() {
        let vars = trigger_variables(&json!({"role": "x", "variables": {"company": "Acme"}}));
        assert_eq!(vars["company"], "Acme");
        assert!(trigger_variables(&json!({})).is_empty());
    }

    #[tokio::test]
    async fn conditional_unions_fields_and_rules() {
        let resolver = RecipientResolver::new(Arc::new(MockUserDirectory::new()));
        let spec = RecipientSpec::parse(
            RecipientType::Conditional,
            &json!({
                "userIdFields": ["assigneeId", "watcherIds", "missing"],
                "rules": [
                    {"when": {"field": "amount", "operator": "gt", "value": 1000}, "userIds": [1]},
                    {"when": {"field": "amount", "operator": "lt", "value": 10}, "userIds": [2]}
                ]
            }),
        )
        .unwrap();

        let ids = resolver
            .resolve(5, &spec, &json!({"assigneeId": "7", "watcherIds": [8, 7], "amount": 5000}))
            .await
            .unwrap();
        assert_eq!(ids, vec![7, 8, 1]);
    }

    #[tokio::test]
    async fn role_without_members_is_empty() {
        let directory = InMemoryUserDirectory::new();
        directory.insert(DirectoryUser::new(5, 1, "Alice", "admin")).await;
        let resolver = RecipientResolver::new(Arc::new(directory));

        let ids = resolver
            .resolve(5, &RecipientSpec::Roles(vec!["auditor".into()]), &json!({}))
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn specific_users_are_deduplicated() {
        let resolver = RecipientResolver::new(Arc::new(MockUserDirectory::new()));
        let ids = resolver
            .resolve(5, &RecipientSpec::SpecificUsers(vec![3, 1, 3]), &json!({}))
            .await
            .unwrap();
        assert_eq!(ids, vec![3, 1]);
    }
}
