/// If step: routes each input item to the true port (0) or the false port (1)
///
/// Expected params: { "field": "status", "operator": "==", "value": "active" }
///
/// Comparisons coerce loosely: equality and `contains` compare text renderings,
/// `>`/`<` compare numeric readings (unparseable values never match).

use async_trait::async_trait;
use serde_json::Value;

use crate::runtime::{ExecutionContext, Step, StepDescription, StepError, StepProperty};
use crate::workflow::types::NodeOutput;

const OPERATORS: [&str; 5] = ["==", "!=", ">", "<", "contains"];

pub struct IfStep {
    description: StepDescription,
}

impl IfStep {
    pub fn new() -> Self {
        Self {
            description: StepDescription::new("If", "fa-code-branch")
                .property(
                    StepProperty::new("field", "string")
                        .required()
                        .describe("The property field to check on the incoming items"),
                )
                .property(
                    StepProperty::new("operator", "options")
                        .required()
                        .options(OPERATORS)
                        .describe("The comparison operation"),
                )
                .property(
                    StepProperty::new("value", "string")
                        .required()
                        .describe("The value to compare against"),
                ),
        }
    }
}

impl Default for IfStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step for IfStep {
    fn description(&self) -> &StepDescription {
        &self.description
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<NodeOutput, StepError> {
        let mut true_items = Vec::new();
        let mut false_items = Vec::new();

        for (index, item) in ctx.input_data().iter().enumerate() {
            let field = ctx.parameter_str("field", index, Some(""))?;
            let operator = ctx.parameter_str("operator", index, Some("=="))?;
            let expected = ctx.parameter_str("value", index, Some(""))?;

            let actual = item.json.get(field.as_str());
            if condition_met(actual, &operator, &expected)? {
                true_items.push(item.clone());
            } else {
                false_items.push(item.clone());
            }
        }

        tracing::debug!(
            "🔀 If '{}' routed {} item(s) to true, {} to false",
            ctx.node().id,
            true_items.len(),
            false_items.len()
        );

        Ok(NodeOutput::ports(vec![true_items, false_items]))
    }
}

fn condition_met(actual: Option<&Value>, operator: &str, expected: &str) -> Result<bool, StepError> {
    Ok(match operator {
        "==" => as_text(actual) == expected,
        "!=" => as_text(actual) != expected,
        ">" => as_number(actual) > parse_number(expected),
        "<" => as_number(actual) < parse_number(expected),
        "contains" => as_text(actual).contains(expected),
        other => {
            return Err(StepError::invalid(
                "operator",
                format!("unsupported operator '{other}', expected one of {OPERATORS:?}"),
            ))
        }
    })
}

/// Text rendering of a field; absent fields read as "undefined"
fn as_text(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => as_text(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Numeric reading of a field; NaN when it has none
fn as_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s),
        Some(_) => f64::NAN,
    }
}

fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        0.0
    } else {
        trimmed.parse().unwrap_or(f64::NAN)
    }
}
