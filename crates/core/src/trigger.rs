//! Automation trigger matching — pure logic, no database access.
//!
//! A trigger matches when the domain event type equals the rule's event and
//! every condition holds against the ticket's field snapshot (logical AND;
//! an empty condition list fires on the event match alone). A field missing
//! from the snapshot evaluates as `null` for every operator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// TriggerEvent
// ---------------------------------------------------------------------------

/// The ticket-domain event a rule listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    StageChanged,
    FieldUpdated,
    TicketCreated,
    TicketAssigned,
    Overdue,
    CommentAdded,
    DueDateApproaching,
    Completed,
}

impl TriggerEvent {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StageChanged => "stage_changed",
            Self::FieldUpdated => "field_updated",
            Self::TicketCreated => "ticket_created",
            Self::TicketAssigned => "ticket_assigned",
            Self::Overdue => "overdue",
            Self::CommentAdded => "comment_added",
            Self::DueDateApproaching => "due_date_approaching",
            Self::Completed => "completed",
        }
    }

    /// Parse from a wire-format string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "stage_changed" => Ok(Self::StageChanged),
            "field_updated" => Ok(Self::FieldUpdated),
            "ticket_created" => Ok(Self::TicketCreated),
            "ticket_assigned" => Ok(Self::TicketAssigned),
            "overdue" => Ok(Self::Overdue),
            "comment_added" => Ok(Self::CommentAdded),
            "due_date_approaching" => Ok(Self::DueDateApproaching),
            "completed" => Ok(Self::Completed),
            _ => Err(CoreError::Validation(format!(
                "Invalid trigger event: '{s}'"
            ))),
        }
    }
}

impl std::fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// Comparison applied to a single ticket field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
        }
    }
}

/// A single trigger condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub field_id: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    /// Parse a JSON array of conditions, as stored on an automation rule.
    pub fn parse_list(value: &Value) -> Result<Vec<Condition>, CoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Invalid trigger conditions: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// A rule's full trigger definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub event: TriggerEvent,
    pub stage_id: Option<DbId>,
    pub field_id: Option<String>,
    pub conditions: Vec<Condition>,
}

impl Trigger {
    /// Evaluate this trigger against an event and the ticket's field snapshot.
    pub fn matches(&self, event: TriggerEvent, fields: &serde_json::Map<String, Value>) -> bool {
        if event != self.event {
            return false;
        }
        self.conditions
            .iter()
            .all(|c| evaluate_condition(c, fields.get(&c.field_id)))
    }
}

fn evaluate_condition(condition: &Condition, value: Option<&Value>) -> bool {
    match condition.operator {
        ConditionOperator::Equals => text_of(value) == text_of(Some(&condition.value)),
        ConditionOperator::NotEquals => text_of(value) != text_of(Some(&condition.value)),
        ConditionOperator::Contains => value
            .and_then(Value::as_str)
            .is_some_and(|s| s.contains(&text_of(Some(&condition.value)))),
        ConditionOperator::GreaterThan => match (numeric_of(value), numeric_of(Some(&condition.value))) {
            (Some(field), Some(expected)) => field > expected,
            _ => false,
        },
        ConditionOperator::LessThan => match (numeric_of(value), numeric_of(Some(&condition.value))) {
            (Some(field), Some(expected)) => field < expected,
            _ => false,
        },
        ConditionOperator::IsEmpty => is_empty(value),
        ConditionOperator::IsNotEmpty => !is_empty(value),
    }
}

/// Coerce a field value to text so string/number mismatches still compare.
fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
    }
}

/// Numeric view of a value; numbers and numeric strings qualify.
fn numeric_of(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> serde_json::Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn trigger(event: TriggerEvent, conditions: Vec<Condition>) -> Trigger {
        Trigger {
            event,
            stage_id: None,
            field_id: None,
            conditions,
        }
    }

    fn condition(field_id: &str, operator: ConditionOperator, value: Value) -> Condition {
        Condition {
            field_id: field_id.to_string(),
            operator,
            value,
        }
    }

    // -- Event matching -----------------------------------------------------

    #[test]
    fn event_mismatch_never_matches() {
        let t = trigger(TriggerEvent::Overdue, vec![]);
        assert!(!t.matches(TriggerEvent::StageChanged, &fields(&[])));
    }

    #[test]
    fn empty_conditions_fire_on_event_match() {
        let t = trigger(TriggerEvent::TicketCreated, vec![]);
        assert!(t.matches(TriggerEvent::TicketCreated, &fields(&[])));
    }

    #[test]
    fn overdue_high_priority_example() {
        let t = trigger(
            TriggerEvent::Overdue,
            vec![condition("priority", ConditionOperator::Equals, json!("high"))],
        );
        assert!(t.matches(TriggerEvent::Overdue, &fields(&[("priority", json!("high"))])));
        assert!(!t.matches(TriggerEvent::Overdue, &fields(&[("priority", json!("low"))])));
        assert!(!t.matches(
            TriggerEvent::StageChanged,
            &fields(&[("priority", json!("high"))])
        ));
    }

    #[test]
    fn conditions_are_anded() {
        let t = trigger(
            TriggerEvent::Overdue,
            vec![
                condition("priority", ConditionOperator::Equals, json!("high")),
                condition("owner", ConditionOperator::IsNotEmpty, Value::Null),
            ],
        );
        assert!(t.matches(
            TriggerEvent::Overdue,
            &fields(&[("priority", json!("high")), ("owner", json!("ops"))])
        ));
        assert!(!t.matches(
            TriggerEvent::Overdue,
            &fields(&[("priority", json!("high"))])
        ));
    }

    // -- Operators ----------------------------------------------------------

    #[test]
    fn equals_coerces_number_to_string() {
        let c = condition("count", ConditionOperator::Equals, json!("3"));
        assert!(evaluate_condition(&c, Some(&json!(3))));
    }

    #[test]
    fn not_equals_negates() {
        let c = condition("priority", ConditionOperator::NotEquals, json!("high"));
        assert!(evaluate_condition(&c, Some(&json!("low"))));
        assert!(!evaluate_condition(&c, Some(&json!("high"))));
    }

    #[test]
    fn contains_substring_case_sensitive() {
        let c = condition("title", ConditionOperator::Contains, json!("urgent"));
        assert!(evaluate_condition(&c, Some(&json!("an urgent request"))));
        assert!(!evaluate_condition(&c, Some(&json!("an Urgent request"))));
    }

    #[test]
    fn contains_on_non_string_is_false() {
        let c = condition("count", ConditionOperator::Contains, json!("3"));
        assert!(!evaluate_condition(&c, Some(&json!(33))));
    }

    #[test]
    fn greater_than_numeric() {
        let c = condition("amount", ConditionOperator::GreaterThan, json!(100));
        assert!(evaluate_condition(&c, Some(&json!(150))));
        assert!(!evaluate_condition(&c, Some(&json!(50))));
    }

    #[test]
    fn greater_than_parses_numeric_strings() {
        let c = condition("amount", ConditionOperator::GreaterThan, json!("100"));
        assert!(evaluate_condition(&c, Some(&json!("150"))));
    }

    #[test]
    fn ordering_on_non_numeric_is_false_not_error() {
        let c = condition("amount", ConditionOperator::LessThan, json!(10));
        assert!(!evaluate_condition(&c, Some(&json!("not a number"))));
    }

    #[test]
    fn is_empty_on_null_missing_and_blank() {
        let c = condition("owner", ConditionOperator::IsEmpty, Value::Null);
        assert!(evaluate_condition(&c, None));
        assert!(evaluate_condition(&c, Some(&Value::Null)));
        assert!(evaluate_condition(&c, Some(&json!(""))));
        assert!(!evaluate_condition(&c, Some(&json!("ops"))));
    }

    #[test]
    fn is_not_empty_negates() {
        let c = condition("owner", ConditionOperator::IsNotEmpty, Value::Null);
        assert!(evaluate_condition(&c, Some(&json!("ops"))));
        assert!(!evaluate_condition(&c, None));
    }

    #[test]
    fn missing_field_behaves_as_null_for_all_operators() {
        let equals = condition("ghost", ConditionOperator::Equals, json!("x"));
        let greater = condition("ghost", ConditionOperator::GreaterThan, json!(1));
        let contains = condition("ghost", ConditionOperator::Contains, json!("x"));
        let snapshot = fields(&[]);
        assert!(!evaluate_condition(&equals, snapshot.get("ghost")));
        assert!(!evaluate_condition(&greater, snapshot.get("ghost")));
        assert!(!evaluate_condition(&contains, snapshot.get("ghost")));
    }

    // -- Parsing ------------------------------------------------------------

    #[test]
    fn parse_list_roundtrip() {
        let raw = json!([
            {"field_id": "priority", "operator": "equals", "value": "high"}
        ]);
        let parsed = Condition::parse_list(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].field_id, "priority");
        assert_eq!(parsed[0].operator, ConditionOperator::Equals);
    }

    #[test]
    fn parse_list_rejects_unknown_operator() {
        let raw = json!([
            {"field_id": "priority", "operator": "matches_regex", "value": "h.*"}
        ]);
        assert!(Condition::parse_list(&raw).is_err());
    }

    #[test]
    fn trigger_event_all_variants_roundtrip() {
        let names = [
            "stage_changed",
            "field_updated",
            "ticket_created",
            "ticket_assigned",
            "overdue",
            "comment_added",
            "due_date_approaching",
            "completed",
        ];
        for name in names {
            assert_eq!(TriggerEvent::from_str(name).unwrap().as_str(), name);
        }
        assert!(TriggerEvent::from_str("ticket_archived").is_err());
    }
}
