use serde_json::{Number, Value};

use super::expressions::{is_truthy, to_number, Evaluator, ExpressionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    NotEquals,
    Equals,
    GreaterThanOrEqual,
    LessThanOrEqual,
    GreaterThan,
    LessThan,
}

// Two-character operators come first so `>=` is never read as `>`.
const OPERATORS: [(&str, ComparisonOperator); 6] = [
    ("!=", ComparisonOperator::NotEquals),
    ("==", ComparisonOperator::Equals),
    (">=", ComparisonOperator::GreaterThanOrEqual),
    ("<=", ComparisonOperator::LessThanOrEqual),
    (">", ComparisonOperator::GreaterThan),
    ("<", ComparisonOperator::LessThan),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Constant(bool),
    Compare {
        left: String,
        operator: ComparisonOperator,
        right: Operand,
    },
    Truthy(String),
}

impl Condition {
    pub fn parse(text: &str) -> Self {
        if text.eq_ignore_ascii_case("true") {
            return Self::Constant(true);
        }
        if text.eq_ignore_ascii_case("false") {
            return Self::Constant(false);
        }

        for (symbol, operator) in OPERATORS {
            if let Some((left, right)) = text.split_once(symbol) {
                return Self::Compare {
                    left: left.trim().to_owned(),
                    operator,
                    right: parse_operand(right.trim()),
                };
            }
        }

        Self::Truthy(text.to_owned())
    }

    pub fn evaluate(&self, evaluator: &Evaluator<'_>) -> Result<bool, ExpressionError> {
        match self {
            Self::Constant(value) => Ok(*value),
            Self::Truthy(expression) => Ok(is_truthy(&evaluator.evaluate(expression)?)),
            Self::Compare {
                left,
                operator,
                right,
            } => {
                let left = evaluator.evaluate(left)?;
                let right = match right {
                    Operand::Literal(value) => value.clone(),
                    Operand::Expression(expression) => evaluator.evaluate(expression)?,
                };
                Ok(compare(&left, *operator, &right))
            }
        }
    }
}

pub fn evaluate_condition(text: &str, evaluator: &Evaluator<'_>) -> Result<bool, ExpressionError> {
    Condition::parse(text).evaluate(evaluator)
}

/// Quoted strings, then booleans, then numbers; anything else is read as
/// another expression.
fn parse_operand(text: &str) -> Operand {
    for quote in ['\'', '"'] {
        if text.starts_with(quote) && text.ends_with(quote) {
            let inner = text.get(1..text.len() - 1).unwrap_or_default();
            return Operand::Literal(Value::String(inner.to_owned()));
        }
    }

    if text.eq_ignore_ascii_case("true") {
        return Operand::Literal(Value::Bool(true));
    }
    if text.eq_ignore_ascii_case("false") {
        return Operand::Literal(Value::Bool(false));
    }

    let number = if text.contains('.') {
        text.parse::<f64>().ok().and_then(Number::from_f64)
    } else {
        text.parse::<i64>()
            .map(Number::from)
            .or_else(|_| text.parse::<u64>().map(Number::from))
            .ok()
    };

    match number {
        Some(number) => Operand::Literal(Value::Number(number)),
        None => Operand::Expression(text.to_owned()),
    }
}

fn compare(left: &Value, operator: ComparisonOperator, right: &Value) -> bool {
    match operator {
        ComparisonOperator::Equals => loosely_equal(left, right),
        ComparisonOperator::NotEquals => !loosely_equal(left, right),
        ordering => {
            let (Some(a), Some(b)) = (to_number(left), to_number(right)) else {
                return false;
            };
            match ordering {
                ComparisonOperator::GreaterThan => a > b,
                ComparisonOperator::GreaterThanOrEqual => a >= b,
                ComparisonOperator::LessThan => a < b,
                ComparisonOperator::LessThanOrEqual => a <= b,
                ComparisonOperator::Equals | ComparisonOperator::NotEquals => false,
            }
        }
    }
}

/// Numbers compare by value, and booleans equal 1/0.
fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Bool(flag), Value::Number(number)) | (Value::Number(number), Value::Bool(flag)) => {
            number.as_f64() == Some(if *flag { 1.0 } else { 0.0 })
        }
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::clock::SystemClock;
    use crate::workflows::expressions::{EvaluationOptions, ExecutionContext};
    use serde_json::json;

    fn context() -> ExecutionContext {
        let mut context = ExecutionContext::new(
            json!({"name": "Ada", "count": "5", "empty": "", "ratio": 0.5})
                .as_object()
                .cloned()
                .expect("object"),
        );
        context.push_outcome(
            json!({"message": "sent", "success": true, "total": 3})
                .as_object()
                .cloned()
                .expect("object"),
        );
        context.push_skipped();
        context
    }

    fn check(condition: &str) -> bool {
        let context = context();
        let clock = SystemClock;
        let evaluator = Evaluator::new(&context, &clock);
        evaluate_condition(condition, &evaluator).expect("condition should evaluate")
    }

    #[test]
    fn literal_true_and_false_ignore_case() {
        assert!(check("TRUE"));
        assert!(check("true"));
        assert!(!check("False"));
    }

    #[test]
    fn operators_are_matched_in_fixed_order() {
        assert_eq!(
            Condition::parse("steps[0].total >= 3"),
            Condition::Compare {
                left: "steps[0].total".to_owned(),
                operator: ComparisonOperator::GreaterThanOrEqual,
                right: Operand::Literal(json!(3)),
            }
        );
        // `!=` is found first even inside the quoted text.
        assert_eq!(
            Condition::parse("input.name == 'a!=b'"),
            Condition::Compare {
                left: "input.name == 'a".to_owned(),
                operator: ComparisonOperator::NotEquals,
                right: Operand::Expression("b'".to_owned()),
            }
        );
    }

    #[test]
    fn right_operand_precedence() {
        assert_eq!(parse_operand("'x'"), Operand::Literal(json!("x")));
        assert_eq!(parse_operand("\"x y\""), Operand::Literal(json!("x y")));
        assert_eq!(parse_operand("''"), Operand::Literal(json!("")));
        assert_eq!(parse_operand("'"), Operand::Literal(json!("")));
        assert_eq!(parse_operand("True"), Operand::Literal(json!(true)));
        assert_eq!(parse_operand("42"), Operand::Literal(json!(42)));
        assert_eq!(parse_operand("-1.5"), Operand::Literal(json!(-1.5)));
        assert_eq!(parse_operand("1e3"), Operand::Expression("1e3".to_owned()));
        assert_eq!(
            parse_operand("input.name"),
            Operand::Expression("input.name".to_owned())
        );
    }

    #[test]
    fn equality_uses_resolved_values() {
        assert!(check("steps[0].success == true"));
        assert!(check("input.name == 'Ada'"));
        assert!(check("input.name != \"Bob\""));
        assert!(check("steps[0].total == 3.0"));
        assert!(check("steps[0].success == 1"));
        // Strings never equal numbers.
        assert!(!check("input.count == 5"));
        assert!(check("input.name == input.name"));
        assert!(check("input.missing == ''"));
    }

    #[test]
    fn ordering_casts_to_float_or_fails_false() {
        assert!(check("input.count > 4"));
        assert!(check("input.count <= 5"));
        assert!(check("input.ratio < 1"));
        assert!(check("steps[0].total >= 3"));
        assert!(!check("input.name > 1"));
        assert!(!check("input.missing < 1"));
        assert!(!check("steps[0] > 1"));
    }

    #[test]
    fn bare_expression_is_a_truthiness_check() {
        assert!(check("input.name"));
        assert!(!check("input.empty"));
        assert!(!check("input.missing"));
        assert!(check("steps[1].skipped"));
        assert!(check("steps[0]"));
        assert!(!check("steps[7]"));
    }

    #[test]
    fn evaluation_errors_surface_to_the_caller() {
        let context = context();
        let clock = SystemClock;
        let evaluator =
            Evaluator::new(&context, &clock).with_options(EvaluationOptions { max_length: 4 });

        assert!(evaluate_condition("input.name == 'Ada'", &evaluator).is_err());
        assert!(evaluate_condition("true", &evaluator).expect("constant"));
    }
}
