/*!
 * Ordered column transformation pipelines
 */

use std::collections::HashSet;
use tessera_core_interface::{entry, RemoteHandle, Value};
use tracing::debug;

use crate::error::{Result, TesseraError};
use crate::table::{TableReference, Target};

/// One transformer applied to one input column, producing one output column
#[derive(Debug, Clone, PartialEq)]
pub struct TransformStep {
    transformer: String,
    input: String,
    output: String,
    extra: Vec<Value>,
}

impl TransformStep {
    pub fn new(
        transformer: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            transformer: transformer.into(),
            input: input.into(),
            output: output.into(),
            extra: Vec::new(),
        }
    }

    /// Append a transformer-specific argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.extra.push(value.into());
        self
    }

    pub fn transformer(&self) -> &str {
        &self.transformer
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn extra(&self) -> &[Value] {
        &self.extra
    }

    fn args(&self, table: &RemoteHandle) -> Vec<Value> {
        let mut args = Vec::with_capacity(3 + self.extra.len());
        args.push(Value::from(table));
        args.push(Value::from(self.input.as_str()));
        args.push(Value::from(self.output.as_str()));
        args.extend(self.extra.iter().cloned());
        args
    }
}

fn check_outputs(steps: &[TransformStep]) -> Result<()> {
    let mut seen = HashSet::new();
    for step in steps {
        if step.transformer.trim().is_empty() {
            return Err(TesseraError::invalid("Transformer name must not be empty"));
        }
        if !seen.insert(step.output.as_str()) {
            return Err(TesseraError::invalid(format!(
                "Output column {} is produced by more than one step",
                step.output
            )));
        }
    }
    Ok(())
}

impl TableReference {
    /// Apply `steps` in order and register the final table at `target`.
    ///
    /// The first failing step aborts the pipeline; nothing is registered then.
    pub fn mutate(&self, steps: &[TransformStep], target: impl Into<Target>) -> Result<TableReference> {
        let target = target.into();
        check_outputs(steps)?;

        let connection = self.connection();
        let mut current = self.handle().clone();
        for (index, step) in steps.iter().enumerate() {
            debug!(
                step = index,
                transformer = %step.transformer,
                input = %step.input,
                output = %step.output,
                "Applying transform"
            );
            current = connection
                .invoke_static(entry::TRANSFORMERS_CLASS, &step.transformer, &step.args(&current))?
                .into_handle()?;
        }

        connection.register_result(current, &target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_builder() {
        let step = TransformStep::new("scale", "x", "x2").arg(2.0).arg("extra");
        assert_eq!(step.transformer(), "scale");
        assert_eq!(step.input(), "x");
        assert_eq!(step.output(), "x2");
        assert_eq!(step.extra(), &[Value::Double(2.0), Value::from("extra")]);
    }

    #[test]
    fn test_duplicate_outputs_rejected() {
        let steps = [
            TransformStep::new("scale", "x", "y"),
            TransformStep::new("add", "x", "y"),
        ];
        assert!(matches!(
            check_outputs(&steps),
            Err(TesseraError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_chained_outputs_allowed() {
        let steps = [
            TransformStep::new("scale", "x", "y"),
            TransformStep::new("add", "y", "z"),
        ];
        assert!(check_outputs(&steps).is_ok());
    }
}
