use ndarray::{Array2, ArrayView2};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::errors::RadprocError;

/// Labelled two dimensional result, e.g. an R-factor per year and cell or
/// a precipitation sum per depth class and cell
#[derive(Debug, Clone)]
pub struct SummaryTable {
    name: String,
    rows: Vec<String>,
    columns: Vec<String>,
    values: Array2<f32>,
}

impl SummaryTable {
    pub fn new<R, I>(
        name: &str,
        rows: I,
        columns: Vec<String>,
        values: Array2<f32>,
    ) -> Result<Self, RadprocError>
    where
        R: ToString,
        I: IntoIterator<Item = R>,
    {
        let rows: Vec<String> = rows.into_iter().map(|r| r.to_string()).collect();
        if values.dim() != (rows.len(), columns.len()) {
            return Err(format!(
                "table {name}: values of shape {:?} do not match {} rows and {} columns",
                values.dim(),
                rows.len(),
                columns.len()
            )
            .into());
        }
        Ok(Self {
            name: name.to_string(),
            rows,
            columns,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    /// Value for a row label and a column name
    pub fn get<R: ToString>(&self, row: R, column: &str) -> Option<f32> {
        let row = row.to_string();
        let r = self.rows.iter().position(|x| *x == row)?;
        let c = self.columns.iter().position(|x| x == column)?;
        Some(self.values[[r, c]])
    }

    /// Mean of every column over all rows, NaN rows are skipped
    pub fn column_means(&self) -> Vec<f32> {
        self.values
            .columns()
            .into_iter()
            .map(|col| {
                let valid: Vec<f32> = col.iter().copied().filter(|v| !v.is_nan()).collect();
                if valid.is_empty() {
                    f32::NAN
                } else {
                    valid.iter().sum::<f32>() / valid.len() as f32
                }
            })
            .collect()
    }
}

impl Serialize for SummaryTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let values: Vec<Vec<f32>> = self
            .values
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect();

        let mut state = serializer.serialize_struct("SummaryTable", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("rows", &self.rows)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("values", &values)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn get_by_labels() {
        let table = SummaryTable::new(
            "R",
            vec![2010, 2011],
            vec!["a".into(), "b".into()],
            array![[1.0, 2.0], [3.0, f32::NAN]],
        )
        .unwrap();
        assert_eq!(table.get(2011, "a"), Some(3.0));
        assert_eq!(table.get(2012, "a"), None);
        assert_eq!(table.column_means()[0], 2.0);
        assert_eq!(table.column_means()[1], 2.0);
    }

    #[test]
    fn serializes_nan_as_null() {
        let table = SummaryTable::new("N", vec![1], vec!["a".into()], array![[f32::NAN]]).unwrap();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(
            json,
            r#"{"name":"N","rows":["1"],"columns":["a"],"values":[[null]]}"#
        );
    }
}
