//! Signature matrix: `k` rows (hash functions) by one column per item.

use serde::{Deserialize, Serialize};

use crate::config::MinHashError;

/// Dense `k × items` matrix of MinHash values.
///
/// Storage is column-major so that one item's signature is a contiguous
/// slice; banding reads whole columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawSignatureMatrix")]
pub struct SignatureMatrix {
    num_rows: usize,
    num_items: usize,
    values: Vec<u64>,
}

/// Unchecked wire form; deserialization goes through
/// [`SignatureMatrix::from_column_major`].
#[derive(Deserialize)]
struct RawSignatureMatrix {
    num_rows: usize,
    num_items: usize,
    values: Vec<u64>,
}

impl TryFrom<RawSignatureMatrix> for SignatureMatrix {
    type Error = MinHashError;

    fn try_from(raw: RawSignatureMatrix) -> Result<Self, Self::Error> {
        Self::from_column_major(raw.num_rows, raw.num_items, raw.values)
    }
}

impl SignatureMatrix {
    /// Build from column-major data (`values[item * num_rows + row]`).
    pub fn from_column_major(
        num_rows: usize,
        num_items: usize,
        values: Vec<u64>,
    ) -> Result<Self, MinHashError> {
        if num_rows == 0 {
            return Err(MinHashError::InvalidArgument {
                name: "num_rows",
                reason: "signature length must be >= 1".into(),
            });
        }
        let expected = num_rows.checked_mul(num_items).ok_or_else(|| {
            MinHashError::InvalidArgument {
                name: "num_items",
                reason: format!("{num_rows} x {num_items} overflows usize"),
            }
        })?;
        if values.len() != expected {
            return Err(MinHashError::InvalidArgument {
                name: "values",
                reason: format!(
                    "expected {expected} values for {num_rows} x {num_items}, got {}",
                    values.len()
                ),
            });
        }
        Ok(Self {
            num_rows,
            num_items,
            values,
        })
    }

    /// Build from one signature per item. All signatures must have the same
    /// non-zero length.
    pub fn from_columns(columns: Vec<Vec<u64>>) -> Result<Self, MinHashError> {
        let Some(first) = columns.first() else {
            return Err(MinHashError::InvalidArgument {
                name: "columns",
                reason: "at least one signature is required".into(),
            });
        };
        let num_rows = first.len();
        if let Some((item, col)) = columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != num_rows)
        {
            return Err(MinHashError::InvalidArgument {
                name: "columns",
                reason: format!(
                    "signature of item {item} has length {}, expected {num_rows}",
                    col.len()
                ),
            });
        }
        let num_items = columns.len();
        let values = columns.into_iter().flatten().collect();
        Self::from_column_major(num_rows, num_items, values)
    }

    /// Build from rows (one row per hash function, one entry per item), the
    /// layout hosts usually hand over.
    pub fn from_rows(rows: &[Vec<u64>]) -> Result<Self, MinHashError> {
        let Some(first) = rows.first() else {
            return Err(MinHashError::InvalidArgument {
                name: "rows",
                reason: "at least one row is required".into(),
            });
        };
        let num_items = first.len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != num_items) {
            return Err(MinHashError::InvalidArgument {
                name: "rows",
                reason: format!("row {row} has {} entries, expected {num_items}", r.len()),
            });
        }
        let num_rows = rows.len();
        let mut values = vec![0u64; num_rows * num_items];
        for (i, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                values[j * num_rows + i] = v;
            }
        }
        Self::from_column_major(num_rows, num_items, values)
    }

    /// Signature length `k`.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Value for hash function `row` and item `item`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn get(&self, row: usize, item: usize) -> u64 {
        assert!(row < self.num_rows, "row {row} out of bounds");
        self.values[item * self.num_rows + row]
    }

    /// Full signature of one item.
    #[inline]
    pub fn column(&self, item: usize) -> &[u64] {
        let start = item * self.num_rows;
        &self.values[start..start + self.num_rows]
    }

    pub fn columns(&self) -> std::slice::ChunksExact<'_, u64> {
        self.values.chunks_exact(self.num_rows)
    }

    pub fn as_column_major(&self) -> &[u64] {
        &self.values
    }

    /// Fraction of rows on which items `a` and `b` agree, the standard MinHash
    /// estimate of their Jaccard similarity.
    pub fn estimated_jaccard(&self, a: usize, b: usize) -> f64 {
        let matches = self
            .column(a)
            .iter()
            .zip(self.column(b))
            .filter(|(x, y)| x == y)
            .count();
        matches as f64 / self.num_rows as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialization_validates_shape() {
        let m = SignatureMatrix::from_columns(vec![vec![1, 2], vec![3, 4]]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: SignatureMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);

        let short = r#"{"num_rows":4,"num_items":2,"values":[1,2,3]}"#;
        let err = serde_json::from_str::<SignatureMatrix>(short).unwrap_err();
        assert!(err.to_string().contains("expected 8 values"));

        let no_rows = r#"{"num_rows":0,"num_items":0,"values":[]}"#;
        assert!(serde_json::from_str::<SignatureMatrix>(no_rows).is_err());
    }

    #[test]
    fn from_columns_and_from_rows_agree() {
        let by_columns =
            SignatureMatrix::from_columns(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        let by_rows =
            SignatureMatrix::from_rows(&[vec![1, 4], vec![2, 5], vec![3, 6]]).unwrap();

        assert_eq!(by_columns, by_rows);
        assert_eq!(by_rows.num_rows(), 3);
        assert_eq!(by_rows.num_items(), 2);
        assert_eq!(by_rows.get(1, 1), 5);
        assert_eq!(by_rows.column(0), &[1, 2, 3]);
    }

    #[test]
    fn jagged_input_is_rejected() {
        let err = SignatureMatrix::from_columns(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, MinHashError::InvalidArgument { name: "columns", .. }));

        let err = SignatureMatrix::from_rows(&[vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, MinHashError::InvalidArgument { name: "rows", .. }));
    }

    #[test]
    fn column_major_length_is_checked() {
        assert!(SignatureMatrix::from_column_major(2, 2, vec![0; 3]).is_err());
        assert!(SignatureMatrix::from_column_major(0, 0, Vec::new()).is_err());

        let empty = SignatureMatrix::from_column_major(4, 0, Vec::new()).unwrap();
        assert_eq!(empty.num_items(), 0);
        assert_eq!(empty.columns().count(), 0);
    }

    #[test]
    fn estimated_jaccard_counts_agreeing_rows() {
        let m = SignatureMatrix::from_columns(vec![vec![1, 2, 3, 4], vec![1, 9, 3, 9]]).unwrap();
        assert_eq!(m.estimated_jaccard(0, 1), 0.5);
        assert_eq!(m.estimated_jaccard(0, 0), 1.0);
    }
}
