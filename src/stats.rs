/*!
 * Column statistics: approximate quantiles and summaries
 */

use tessera_core_interface::{entry, Value};
use tracing::debug;

use crate::error::{Result, TesseraError};
use crate::table::TableReference;

/// Probabilities to compute quantiles at
#[derive(Debug, Clone, PartialEq)]
pub enum Probabilities {
    /// Labelled by percentage: `0.5` becomes `"50%"`
    Unnamed(Vec<f64>),
    /// Labelled by the caller
    Named(Vec<(String, f64)>),
}

impl Probabilities {
    /// `(label, probability)` in input order
    pub fn labelled(&self) -> Vec<(String, f64)> {
        match self {
            Probabilities::Unnamed(values) => values.iter().map(|&p| (percent_label(p), p)).collect(),
            Probabilities::Named(pairs) => pairs.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        for (label, p) in self.labelled() {
            if !(0.0..=1.0).contains(&p) {
                return Err(TesseraError::invalid(format!(
                    "Probability {} ({}) must lie in [0, 1]",
                    p, label
                )));
            }
        }
        Ok(())
    }
}

impl From<Vec<f64>> for Probabilities {
    fn from(values: Vec<f64>) -> Self {
        Probabilities::Unnamed(values)
    }
}

impl From<&[f64]> for Probabilities {
    fn from(values: &[f64]) -> Self {
        Probabilities::Unnamed(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Probabilities {
    fn from(values: [f64; N]) -> Self {
        Probabilities::Unnamed(values.to_vec())
    }
}

impl<const N: usize> From<[(&str, f64); N]> for Probabilities {
    fn from(pairs: [(&str, f64); N]) -> Self {
        Probabilities::Named(pairs.iter().map(|(l, p)| (l.to_string(), *p)).collect())
    }
}

/// `0.25` -> `"25%"`, `0.125` -> `"12.5%"`
fn percent_label(p: f64) -> String {
    let formatted = format!("{:.6}", p * 100.0);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{}%", trimmed)
}

impl TableReference {
    /// Approximate quantiles of `column`, labelled and in input order.
    ///
    /// `relative_error` of `None` uses the connection's configured value; 0 asks for
    /// exact quantiles. The result is empty when `probabilities` is empty, and also when
    /// the engine finds no numeric values in `column`.
    pub fn quantile(
        &self,
        column: &str,
        probabilities: impl Into<Probabilities>,
        relative_error: Option<f64>,
    ) -> Result<Vec<(String, f64)>> {
        let probabilities = probabilities.into();
        let relative_error =
            relative_error.unwrap_or(self.connection().config().quantile_relative_error);
        if relative_error.is_nan() || relative_error < 0.0 {
            return Err(TesseraError::invalid(format!(
                "Relative error must be >= 0, got {}",
                relative_error
            )));
        }
        probabilities.validate()?;

        self.require_columns(&[column])?;
        let labelled = probabilities.labelled();
        if labelled.is_empty() {
            return Ok(Vec::new());
        }

        let stat = self.invoke_handle(entry::STAT, &[])?;
        let values = self
            .connection()
            .invoke(
                &stat,
                entry::APPROX_QUANTILE,
                &[
                    Value::from(column),
                    Value::Array(labelled.iter().map(|(_, p)| Value::from(*p)).collect()),
                    Value::from(relative_error),
                ],
            )?
            .into_array()?;
        debug!(column, quantiles = values.len(), relative_error, "Quantiles computed");

        if values.is_empty() {
            return Ok(Vec::new());
        }
        if values.len() != labelled.len() {
            return Err(TesseraError::Invocation(format!(
                "approxQuantile returned {} values for {} probabilities",
                values.len(),
                labelled.len()
            )));
        }

        labelled
            .into_iter()
            .zip(values)
            .map(|((label, _), value)| -> Result<(String, f64)> { Ok((label, value.as_f64()?)) })
            .collect()
    }

    /// Summary table (count, mean, stddev, min, max) over `columns`, or every column
    /// when `columns` is empty
    pub fn describe(&self, columns: &[&str]) -> Result<TableReference> {
        self.require_columns(columns)?;
        let handle = self.invoke_handle(entry::DESCRIBE, &[Value::strings(columns.iter().copied())])?;
        self.derived(handle)
    }
}
