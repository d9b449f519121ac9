use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureMatrixError {
    #[error("indptr must have {expected} entries, found {found}")]
    IndptrLength { expected: usize, found: usize },

    #[error("indptr must start at 0 and never decrease")]
    IndptrOrder,

    #[error("indptr ends at {end} but there are {nnz} stored values")]
    IndptrEnd { end: usize, nnz: usize },

    #[error("indices ({indices}) and data ({data}) lengths differ")]
    LengthMismatch { indices: usize, data: usize },

    #[error("column index {column} is out of range for {cols} columns")]
    ColumnOutOfRange { column: usize, cols: usize },

    #[error("dense row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Item feature matrix, one row per internal item index.
///
/// Stored either densely or in compressed sparse row form; callers only
/// walk rows, so both layouts expose the same non-zero iterator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum ItemFeatureMatrix {
    Dense {
        rows: Vec<Vec<f32>>,
    },
    Csr {
        shape: (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f32>,
    },
}

impl ItemFeatureMatrix {
    /// Identity features: item `i` has only feature `i` set
    pub fn identity(n: usize) -> Self {
        ItemFeatureMatrix::Csr {
            shape: (n, n),
            indptr: (0..=n).collect(),
            indices: (0..n).collect(),
            data: vec![1.0; n],
        }
    }

    pub fn n_rows(&self) -> usize {
        match self {
            ItemFeatureMatrix::Dense { rows } => rows.len(),
            ItemFeatureMatrix::Csr { shape, .. } => shape.0,
        }
    }

    pub fn n_cols(&self) -> usize {
        match self {
            ItemFeatureMatrix::Dense { rows } => rows.first().map_or(0, Vec::len),
            ItemFeatureMatrix::Csr { shape, .. } => shape.1,
        }
    }

    /// Non-zero `(column, value)` pairs of one row, or `None` past the last row
    pub fn row(&self, row: usize) -> Option<Box<dyn Iterator<Item = (usize, f32)> + '_>> {
        match self {
            ItemFeatureMatrix::Dense { rows } => {
                let values = rows.get(row)?;
                Some(Box::new(
                    values
                        .iter()
                        .copied()
                        .enumerate()
                        .filter(|(_, value)| *value != 0.0),
                ))
            }
            ItemFeatureMatrix::Csr {
                shape,
                indptr,
                indices,
                data,
            } => {
                if row >= shape.0 {
                    return None;
                }
                let (start, end) = (indptr[row], indptr[row + 1]);
                Some(Box::new(
                    indices[start..end]
                        .iter()
                        .copied()
                        .zip(data[start..end].iter().copied()),
                ))
            }
        }
    }

    /// Checks structural consistency. Must pass before `row` is used.
    pub fn validate(&self) -> Result<(), FeatureMatrixError> {
        match self {
            ItemFeatureMatrix::Dense { rows } => {
                let expected = self.n_cols();
                for (row, values) in rows.iter().enumerate() {
                    if values.len() != expected {
                        return Err(FeatureMatrixError::RaggedRow {
                            row,
                            expected,
                            found: values.len(),
                        });
                    }
                }
                Ok(())
            }
            ItemFeatureMatrix::Csr {
                shape: (rows, cols),
                indptr,
                indices,
                data,
            } => {
                let expected = rows.checked_add(1);
                if expected != Some(indptr.len()) {
                    return Err(FeatureMatrixError::IndptrLength {
                        expected: expected.unwrap_or(usize::MAX),
                        found: indptr.len(),
                    });
                }
                if indices.len() != data.len() {
                    return Err(FeatureMatrixError::LengthMismatch {
                        indices: indices.len(),
                        data: data.len(),
                    });
                }
                if indptr[0] != 0 || indptr.windows(2).any(|w| w[0] > w[1]) {
                    return Err(FeatureMatrixError::IndptrOrder);
                }
                let end = indptr[*rows];
                if end != data.len() {
                    return Err(FeatureMatrixError::IndptrEnd {
                        end,
                        nnz: data.len(),
                    });
                }
                if let Some(&column) = indices.iter().find(|&&c| c >= *cols) {
                    return Err(FeatureMatrixError::ColumnOutOfRange {
                        column,
                        cols: *cols,
                    });
                }
                Ok(())
            }
        }
    }
}
