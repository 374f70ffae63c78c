//! Column transformers reachable through the transformer class

use std::collections::HashMap;
use std::sync::Arc;
use tessera_core_interface::Value;

/// Per-value transformation: `(input value, extra args) -> output value`.
///
/// An `Err` becomes the engine diagnostic for the call.
pub type Transformer = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, String> + Send + Sync>;

fn number(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        other => other.as_f64().map(Some).map_err(|e| e.to_string()),
    }
}

fn extra_f64(extra: &[Value], index: usize, transformer: &str) -> Result<f64, String> {
    extra
        .get(index)
        .ok_or_else(|| format!("{}: missing parameter {}", transformer, index))?
        .as_f64()
        .map_err(|e| format!("{}: {}", transformer, e))
}

/// Transformers every simulated engine starts with
pub(crate) fn builtin() -> HashMap<String, Transformer> {
    let mut map: HashMap<String, Transformer> = HashMap::new();

    map.insert(
        "scale".to_string(),
        Arc::new(|value: &Value, extra: &[Value]| -> Result<Value, String> {
            let factor = extra_f64(extra, 0, "scale")?;
            Ok(number(value)?.map(|v| Value::Double(v * factor)).unwrap_or(Value::Null))
        }),
    );

    map.insert(
        "add".to_string(),
        Arc::new(|value: &Value, extra: &[Value]| -> Result<Value, String> {
            let offset = extra_f64(extra, 0, "add")?;
            Ok(number(value)?.map(|v| Value::Double(v + offset)).unwrap_or(Value::Null))
        }),
    );

    map.insert(
        "binarizer".to_string(),
        Arc::new(|value: &Value, extra: &[Value]| -> Result<Value, String> {
            let threshold = extra_f64(extra, 0, "binarizer")?;
            Ok(number(value)?
                .map(|v| Value::Double(if v > threshold { 1.0 } else { 0.0 }))
                .unwrap_or(Value::Null))
        }),
    );

    map.insert(
        "upper".to_string(),
        Arc::new(|value: &Value, _: &[Value]| match value {
            Value::Str(s) => Ok(Value::Str(s.to_uppercase())),
            Value::Null => Ok(Value::Null),
            other => Err(format!("upper: expected string, got {}", other.type_name())),
        }),
    );

    map
}
