//! Named calculations for `calculate` actions
//!
//! The supported calculations form a closed set. An action names one either
//! as a bare string (`"discountByTier"`) or as an object carrying parameters:
//!
//! ```json
//! {"calculation": "sum", "fields": ["net", "tax"]}
//! {"calculation": "expression", "formula": "price * quantity * (1 - discount)"}
//! ```
//!
//! `expression` formulas are arithmetic only and are evaluated with evalexpr;
//! numeric record fields are bound as variables.

use crate::error::DefinitionError;
use crate::types::{Action, Record};
use crate::value::{as_number, as_text, number_value};
use evalexpr::{eval_number_with_context, ContextWithMutableVariables, HashMapContext};
use serde::Deserialize;
use serde_json::Value;

/// Calculation names accepted in actions
pub const CALCULATIONS: &[&str] = &["discountByTier", "sum", "product", "concat", "expression"];

/// Field read by `discountByTier` when no `tierField` is given
pub const DEFAULT_TIER_FIELD: &str = "customerTier";

/// Discount rate per customer tier (case-insensitive); other tiers get 0
const TIER_DISCOUNTS: &[(&str, f64)] = &[
    ("platinum", 0.20),
    ("gold", 0.15),
    ("silver", 0.10),
    ("bronze", 0.05),
];

/// A supported calculation with its parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "calculation", rename_all = "camelCase")]
pub enum Calculation {
    #[serde(rename_all = "camelCase")]
    DiscountByTier {
        #[serde(default = "default_tier_field")]
        tier_field: String,
    },
    Sum {
        fields: Vec<String>,
    },
    Product {
        fields: Vec<String>,
    },
    Concat {
        fields: Vec<String>,
        #[serde(default = "default_separator")]
        separator: String,
    },
    Expression {
        formula: String,
    },
}

fn default_tier_field() -> String {
    DEFAULT_TIER_FIELD.to_string()
}

fn default_separator() -> String {
    " ".to_string()
}

impl Calculation {
    /// Discount-by-tier reading the default tier field
    pub fn default_discount() -> Self {
        Calculation::DiscountByTier {
            tier_field: default_tier_field(),
        }
    }

    /// Parse the calculation named by a `calculate` action
    pub fn from_action(action: &Action) -> Result<Self, DefinitionError> {
        let action_id = action.id.to_string();
        let value = action.value.as_ref().ok_or_else(|| DefinitionError::MissingValue {
            action_id: action_id.clone(),
            action_type: "calculate".to_string(),
        })?;

        let (name, spec) = match value {
            Value::String(name) => {
                let mut spec = serde_json::Map::new();
                spec.insert("calculation".to_string(), Value::String(name.clone()));
                (name.clone(), Value::Object(spec))
            },
            Value::Object(map) => {
                let name = map
                    .get("calculation")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                (name, value.clone())
            },
            other => {
                return Err(DefinitionError::InvalidCalculation {
                    action_id,
                    reason: format!("expected a name or an object, got {}", other),
                })
            },
        };

        if !CALCULATIONS.contains(&name.as_str()) {
            return Err(DefinitionError::UnknownCalculation { action_id, name });
        }

        let calculation: Calculation =
            serde_json::from_value(spec).map_err(|e| DefinitionError::InvalidCalculation {
                action_id: action_id.clone(),
                reason: e.to_string(),
            })?;

        if let Calculation::Expression { formula } = &calculation {
            evalexpr::build_operator_tree(formula).map_err(|e| {
                DefinitionError::InvalidCalculation {
                    action_id,
                    reason: format!("formula '{}': {}", formula, e),
                }
            })?;
        }

        Ok(calculation)
    }

    /// Compute the result; `None` when the record lacks usable inputs
    pub fn compute(&self, record: &Record) -> Option<Value> {
        match self {
            Calculation::DiscountByTier { tier_field } => {
                let tier = record.get(tier_field).and_then(as_text)?;
                let rate = TIER_DISCOUNTS
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(tier.trim()))
                    .map(|(_, rate)| *rate)
                    .unwrap_or(0.0);
                Some(number_value(rate))
            },
            Calculation::Sum { fields } => {
                let values = numeric_fields(fields, record);
                Some(number_value(values.iter().sum()))
            },
            Calculation::Product { fields } => {
                let values = numeric_fields(fields, record);
                if values.is_empty() {
                    return None;
                }
                Some(number_value(values.iter().product()))
            },
            Calculation::Concat { fields, separator } => {
                let parts: Vec<String> = fields
                    .iter()
                    .filter_map(|f| record.get(f).and_then(as_text))
                    .map(|t| t.into_owned())
                    .collect();
                Some(Value::String(parts.join(separator)))
            },
            Calculation::Expression { formula } => match evaluate_formula(formula, record) {
                Ok(result) => Some(number_value(result)),
                Err(e) => {
                    tracing::debug!("Calc skipped: {}", e);
                    None
                },
            },
        }
    }
}

fn numeric_fields(fields: &[String], record: &Record) -> Vec<f64> {
    fields
        .iter()
        .filter_map(|f| record.get(f).and_then(as_number))
        .collect()
}

/// Evaluate an arithmetic formula with numeric record fields bound as variables
pub fn evaluate_formula(formula: &str, record: &Record) -> Result<f64, String> {
    let mut context = HashMapContext::new();

    for (name, value) in record {
        if let Some(number) = as_number(value) {
            context
                .set_value(name.clone(), evalexpr::Value::Float(number))
                .map_err(|e| format!("Failed to set variable '{}': {}", name, e))?;
        }
    }

    eval_number_with_context(formula, &context)
        .map_err(|e| format!("Formula '{}' evaluation failed: {}", formula, e))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::types::ActionType;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn calc_action(value: Value) -> Action {
        Action::new(ActionType::Calculate, "out").with_value(value)
    }

    #[test]
    fn test_parse_bare_name() {
        let calc = Calculation::from_action(&calc_action(json!("discountByTier"))).unwrap();
        assert_eq!(calc, Calculation::default_discount());
    }

    #[test]
    fn test_parse_unknown_and_invalid() {
        let unknown = Calculation::from_action(&calc_action(json!("taxByRegion")));
        assert!(matches!(unknown, Err(DefinitionError::UnknownCalculation { .. })));

        // sum requires fields
        let invalid = Calculation::from_action(&calc_action(json!("sum")));
        assert!(matches!(invalid, Err(DefinitionError::InvalidCalculation { .. })));

        let bad_formula = Calculation::from_action(&calc_action(
            json!({"calculation": "expression", "formula": "price * (qty"}),
        ));
        assert!(matches!(bad_formula, Err(DefinitionError::InvalidCalculation { .. })));
    }

    #[test]
    fn test_discount_by_tier() {
        let calc = Calculation::from_action(&calc_action(
            json!({"calculation": "discountByTier", "tierField": "tier"}),
        ))
        .unwrap();

        assert_eq!(calc.compute(&record(json!({"tier": "platinum"}))), Some(json!(0.2)));
        assert_eq!(calc.compute(&record(json!({"tier": " SILVER "}))), Some(json!(0.1)));
        assert_eq!(calc.compute(&record(json!({"tier": "wood"}))), Some(json!(0)));
        assert_eq!(calc.compute(&record(json!({}))), None);
    }

    #[test]
    fn test_sum_product_concat() {
        let r = record(json!({"net": 100, "tax": "19.5", "note": "x", "first": "Ada", "last": "Lovelace"}));

        let sum = Calculation::Sum {
            fields: vec!["net".into(), "tax".into(), "note".into()],
        };
        assert_eq!(sum.compute(&r), Some(json!(119.5)));

        let product = Calculation::Product {
            fields: vec!["net".into(), "tax".into()],
        };
        assert_eq!(product.compute(&r), Some(json!(1950)));

        let concat = Calculation::Concat {
            fields: vec!["first".into(), "missing".into(), "last".into()],
            separator: " ".into(),
        };
        assert_eq!(concat.compute(&r), Some(json!("Ada Lovelace")));
    }

    #[test]
    fn test_expression() {
        let calc = Calculation::Expression {
            formula: "price * quantity * (1 - discount)".to_string(),
        };
        let r = record(json!({"price": 20, "quantity": "3", "discount": 0.5}));
        assert_eq!(calc.compute(&r), Some(json!(30)));

        // missing variable degrades to no result
        assert_eq!(calc.compute(&record(json!({"price": 20}))), None);
    }
}
