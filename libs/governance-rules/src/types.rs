//! Rule definition type definitions
//!
//! Core types exchanged with the storage layer:
//! - Rule: the unit of governance logic, owning its logic payload
//! - Condition / Action / DecisionRow / CheckRow: value-like payload items
//! - RuleStatistics: observed counters persisted alongside the rule
//! - Record: the typed field map a rule is evaluated against

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Record under evaluation: field name to tagged-union value
pub type Record = Map<String, Value>;

// ============================================================================
// Identifiers and classification
// ============================================================================

/// Identifier of a condition, action or table row (string or number in JSON)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl Default for ItemId {
    fn default() -> Self {
        ItemId::Text(String::new())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{}", n),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId::Text(value.to_string())
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId::Number(value)
    }
}

/// Rule classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleType {
    #[default]
    Validation,
    Business,
    Calculation,
    Data,
}

/// Where a rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleScope {
    #[default]
    Global,
    DataObject,
    Field,
}

/// Rule lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

// ============================================================================
// Rule
// ============================================================================

/// Rule - stored unit of governance logic
///
/// The logic payload fields are not mutually exclusive; every declared
/// strategy runs during evaluation. Sub-arrays are owned by the rule and
/// deep-copied on clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Stable external identifier
    rule_id: String,

    /// Storage identifier assigned by the persistence layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default)]
    pub rule_type: RuleType,

    #[serde(default)]
    pub scope: RuleScope,

    /// Entity the rule applies to (required for dataObject scope)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_object: Option<String>,

    /// Target field for field-scoped rules (used by the regex path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(default)]
    pub status: RuleStatus,

    /// Gate independent of status
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Semantic version string
    #[serde(default = "default_version")]
    pub version: String,

    /// Evaluation priority (lower = earlier)
    #[serde(default)]
    pub priority: i64,

    #[serde(default)]
    conditions: Vec<Condition>,

    #[serde(default)]
    actions: Vec<Action>,

    #[serde(default)]
    decision_table: Vec<DecisionRow>,

    #[serde(default)]
    check_table: Vec<CheckRow>,

    #[serde(
        default,
        deserialize_with = "non_empty_pattern",
        skip_serializing_if = "Option::is_none"
    )]
    regex_pattern: Option<String>,

    /// Failure message for the regex path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Field that receives the check-table result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_field: Option<String>,

    /// Observed statistics (flattened into the rule document)
    #[serde(flatten)]
    pub statistics: RuleStatistics,
}

fn default_enabled() -> bool {
    true
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// Form defaults send `""` for "no pattern"
fn non_empty_pattern<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let pattern = Option::<String>::deserialize(deserializer)?;
    Ok(pattern.filter(|p| !p.is_empty()))
}

/// Replacement logic payload for a whole-rule update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleLogic {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub decision_table: Vec<DecisionRow>,
    #[serde(default)]
    pub check_table: Vec<CheckRow>,
    #[serde(default, deserialize_with = "non_empty_pattern")]
    pub regex_pattern: Option<String>,
}

impl Rule {
    /// Create an empty draft rule
    pub fn new(rule_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            id: None,
            name: name.into(),
            description: None,
            rule_type: RuleType::default(),
            scope: RuleScope::default(),
            data_object: None,
            field: None,
            status: RuleStatus::Draft,
            enabled: true,
            version: default_version(),
            priority: 0,
            conditions: Vec::new(),
            actions: Vec::new(),
            decision_table: Vec::new(),
            check_table: Vec::new(),
            regex_pattern: None,
            error_message: None,
            result_field: None,
            statistics: RuleStatistics::default(),
        }
    }

    /// Attach the storage identifier (only once, at creation)
    pub fn with_storage_id(mut self, id: impl Into<String>) -> Self {
        if self.id.is_none() {
            self.id = Some(id.into());
        }
        self
    }

    /// Builder-style logic assignment used when a rule is first created
    pub fn with_logic(mut self, logic: RuleLogic) -> Self {
        self.update_logic(logic);
        self
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn storage_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn decision_table(&self) -> &[DecisionRow] {
        &self.decision_table
    }

    pub fn check_table(&self) -> &[CheckRow] {
        &self.check_table
    }

    pub fn regex_pattern(&self) -> Option<&str> {
        self.regex_pattern.as_deref()
    }

    /// Replace the whole logic payload (no partial sub-array mutation)
    pub fn update_logic(&mut self, logic: RuleLogic) {
        self.conditions = logic.conditions;
        self.actions = logic.actions;
        self.decision_table = logic.decision_table;
        self.check_table = logic.check_table;
        self.regex_pattern = logic.regex_pattern.filter(|p| !p.is_empty());
    }

    /// Current logic payload as an owned copy
    pub fn logic(&self) -> RuleLogic {
        RuleLogic {
            conditions: self.conditions.clone(),
            actions: self.actions.clone(),
            decision_table: self.decision_table.clone(),
            check_table: self.check_table.clone(),
            regex_pattern: self.regex_pattern.clone(),
        }
    }

    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Complexity score: conditions + actions + 2 x decision rows
    pub fn complexity_score(&self) -> usize {
        self.conditions.len() + self.actions.len() + 2 * self.decision_table.len()
    }

    /// Whether automatic evaluation may run this rule
    pub fn is_eligible(&self) -> bool {
        self.enabled && self.status == RuleStatus::Active
    }

    /// Copy the rule under a new identity
    ///
    /// Payload is deep-copied; the copy starts as a draft without a storage id
    /// and with cleared statistics.
    pub fn duplicate(&self, new_rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: new_rule_id.into(),
            id: None,
            name: format!("{} (copy)", self.name),
            status: RuleStatus::Draft,
            statistics: RuleStatistics::default(),
            ..self.clone()
        }
    }
}

// ============================================================================
// Payload items
// ============================================================================

/// Condition operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
    Regex,
}

impl ConditionOperator {
    /// Symbol used in formatted condition expressions
    pub fn symbol(&self) -> &'static str {
        match self {
            ConditionOperator::Equals => "==",
            ConditionOperator::NotEquals => "!=",
            ConditionOperator::GreaterThan => ">",
            ConditionOperator::LessThan => "<",
            ConditionOperator::GreaterThanOrEqual => ">=",
            ConditionOperator::LessThanOrEqual => "<=",
            ConditionOperator::Contains => "contains",
            ConditionOperator::NotContains => "!contains",
            ConditionOperator::StartsWith => "startsWith",
            ConditionOperator::EndsWith => "endsWith",
            ConditionOperator::IsEmpty => "isEmpty",
            ConditionOperator::IsNotEmpty => "isNotEmpty",
            ConditionOperator::Regex => "~",
        }
    }

    /// Unary operators ignore the condition value
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            ConditionOperator::IsEmpty | ConditionOperator::IsNotEmpty
        )
    }
}

/// Junction between a condition and the one that follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    #[serde(rename = "AND", alias = "and", alias = "&&")]
    And,
    #[serde(rename = "OR", alias = "or", alias = "||")]
    Or,
    #[serde(rename = "NOT", alias = "not")]
    Not,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
            LogicalOperator::Not => "AND NOT",
        }
    }
}

/// Atomic predicate over one record field
///
/// `logical_operator` governs the junction with the *next* condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub id: ItemId,
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub logical_operator: LogicalOperator,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
        Self {
            id: ItemId::default(),
            field: field.into(),
            operator,
            value,
            logical_operator: LogicalOperator::And,
        }
    }

    pub fn then(mut self, logical_operator: LogicalOperator) -> Self {
        self.logical_operator = logical_operator;
        self
    }
}

/// Action type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    SetField,
    ClearField,
    ShowField,
    HideField,
    Validate,
    ShowMessage,
    SetValue,
    Calculate,
}

impl ActionType {
    /// Types that need a `value`
    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            ActionType::SetField | ActionType::SetValue | ActionType::Calculate
        )
    }

    /// Types that need a `message`
    pub fn requires_message(&self) -> bool {
        matches!(self, ActionType::Validate | ActionType::ShowMessage)
    }
}

/// Side effect applied when conditions hold (or flagged when they fail)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(default)]
    pub id: ItemId,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default)]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Action {
    pub fn new(action_type: ActionType, field: impl Into<String>) -> Self {
        Self {
            id: ItemId::default(),
            action_type,
            field: field.into(),
            value: None,
            message: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// One row of a decision table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRow {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

/// Single-field lookup row of a check table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRow {
    #[serde(default)]
    pub id: ItemId,
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
    pub result: Value,
}

impl CheckRow {
    /// View the row's predicate as a plain condition
    pub fn as_condition(&self) -> Condition {
        Condition {
            id: self.id.clone(),
            field: self.field.clone(),
            operator: self.operator,
            value: self.value.clone(),
            logical_operator: LogicalOperator::And,
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Observed usage statistics of a rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleStatistics {
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub execution_count: u64,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failure_count: u64,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub is_effective: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_executed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_from_camel_case_json() {
        let rule: Rule = serde_json::from_value(json!({
            "ruleId": "R-100",
            "name": "Email format",
            "type": "validation",
            "scope": "dataObject",
            "dataObject": "customer",
            "status": "active",
            "priority": 3,
            "conditions": [
                {"id": 1, "field": "email", "operator": "isNotEmpty", "logicalOperator": "AND"},
                {"id": "c2", "field": "email", "operator": "regex", "value": "^.+@.+$"}
            ],
            "actions": [
                {"id": "a1", "type": "validate", "field": "email", "message": "Invalid email"}
            ],
            "usageCount": 4,
            "executionCount": 4,
            "successCount": 3,
            "failureCount": 1
        }))
        .unwrap();

        assert_eq!(rule.rule_id(), "R-100");
        assert_eq!(rule.scope, RuleScope::DataObject);
        assert_eq!(rule.data_object.as_deref(), Some("customer"));
        assert!(rule.enabled);
        assert_eq!(rule.version, "1.0.0");
        assert_eq!(rule.condition_count(), 2);
        assert_eq!(rule.action_count(), 1);
        assert_eq!(rule.conditions()[0].id, ItemId::Number(1));
        assert_eq!(rule.conditions()[1].logical_operator, LogicalOperator::And);
        assert_eq!(rule.statistics.success_count, 3);
        assert!(rule.is_eligible());
    }

    #[test]
    fn test_counts_follow_whole_rule_update() {
        let mut rule = Rule::new("R-1", "counts");
        assert_eq!(rule.condition_count(), 0);
        assert_eq!(rule.complexity_score(), 0);

        rule.update_logic(RuleLogic {
            conditions: vec![
                Condition::new("a", ConditionOperator::IsEmpty, Value::Null),
                Condition::new("b", ConditionOperator::IsEmpty, Value::Null),
            ],
            actions: vec![Action::new(ActionType::ClearField, "c")],
            decision_table: vec![DecisionRow {
                id: ItemId::from(1),
                conditions: vec![],
                actions: vec![],
                priority: None,
            }],
            ..RuleLogic::default()
        });

        assert_eq!(rule.condition_count(), 2);
        assert_eq!(rule.action_count(), 1);
        assert_eq!(rule.complexity_score(), 5);
    }

    #[test]
    fn test_duplicate_copies_payload_and_resets_identity() {
        let mut original = Rule::new("R-1", "Original")
            .with_storage_id("db-1")
            .with_logic(RuleLogic {
                conditions: vec![Condition::new(
                    "x",
                    ConditionOperator::Equals,
                    json!("1"),
                )],
                ..RuleLogic::default()
            });
        original.status = RuleStatus::Active;
        original.statistics.execution_count = 10;

        let mut copy = original.duplicate("R-2");
        assert_eq!(copy.rule_id(), "R-2");
        assert_eq!(copy.storage_id(), None);
        assert_eq!(copy.status, RuleStatus::Draft);
        assert_eq!(copy.statistics, RuleStatistics::default());
        assert_eq!(copy.conditions(), original.conditions());

        copy.update_logic(RuleLogic::default());
        assert_eq!(original.condition_count(), 1);
    }

    #[test]
    fn test_empty_regex_pattern_means_none() {
        let rule: Rule = serde_json::from_value(json!({
            "ruleId": "R-1",
            "regexPattern": "",
            "conditions": [{"field": "a", "operator": "isNotEmpty"}]
        }))
        .unwrap();
        assert_eq!(rule.regex_pattern(), None);
        assert!(serde_json::to_value(&rule).unwrap().get("regexPattern").is_none());

        let logic: RuleLogic = serde_json::from_value(json!({"regexPattern": ""})).unwrap();
        assert_eq!(logic.regex_pattern, None);

        let rule: Rule = serde_json::from_value(json!({"ruleId": "R-2", "regexPattern": null})).unwrap();
        assert_eq!(rule.regex_pattern(), None);
    }

    #[test]
    fn test_storage_id_is_set_once() {
        let rule = Rule::new("R-1", "r").with_storage_id("a").with_storage_id("b");
        assert_eq!(rule.storage_id(), Some("a"));
    }

    #[test]
    fn test_logical_operator_aliases() {
        let ops: Vec<LogicalOperator> = serde_json::from_value(json!(["AND", "or", "NOT", "&&"])).unwrap();
        assert_eq!(
            ops,
            vec![
                LogicalOperator::And,
                LogicalOperator::Or,
                LogicalOperator::Not,
                LogicalOperator::And
            ]
        );
    }
}
