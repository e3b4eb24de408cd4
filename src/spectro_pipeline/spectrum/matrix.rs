use crate::spectro_pipeline::common::error::{Result, SpectroError};
use crate::spectro_pipeline::spectrum::resample::resample;

/// Burst of spectral vectors stored as one flat row-major buffer.
///
/// Each row is the spectrum of one frame; every row has `columns` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralMatrix {
    columns: usize,
    data: Vec<f64>,
}

impl SpectralMatrix {
    pub fn new(columns: usize) -> Self {
        Self { columns, data: Vec::new() }
    }

    pub fn with_capacity(columns: usize, rows: usize) -> Self {
        Self { columns, data: Vec::with_capacity(columns * rows) }
    }

    pub fn from_rows<I, R>(columns: usize, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[f64]>,
    {
        let mut matrix = Self::new(columns);
        for row in rows {
            matrix.push_row(row.as_ref())?;
        }
        Ok(matrix)
    }

    pub fn push_row(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.columns {
            return Err(SpectroError::InvalidParameter(format!(
                "spectral row has {} samples, matrix expects {}",
                row.len(),
                self.columns
            )));
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        if self.columns == 0 { 0 } else { self.data.len() / self.columns }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.columns;
        &self.data[start..start + self.columns]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.columns.max(1))
    }

    /// Column-wise mean across all rows; zeros for an empty matrix.
    pub fn mean_row(&self) -> Vec<f64> {
        let mut mean = vec![0.0; self.columns];
        let rows = self.rows();
        if rows == 0 {
            return mean;
        }
        for row in self.iter_rows() {
            for (acc, value) in mean.iter_mut().zip(row) {
                *acc += value;
            }
        }
        let scale = 1.0 / rows as f64;
        mean.iter_mut().for_each(|v| *v *= scale);
        mean
    }

    /// Mean of every sample in the matrix.
    pub fn mean_intensity(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Returns a copy with every row linearly resampled to `columns` samples.
    pub fn resampled(&self, columns: usize) -> Result<Self> {
        if columns == self.columns {
            return Ok(self.clone());
        }
        let mut out = Self::with_capacity(columns, self.rows());
        for row in self.iter_rows() {
            out.push_row(&resample(row, columns)?)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_read_rows() {
        let matrix = SpectralMatrix::from_rows(3, [[1.0, 2.0, 3.0], [3.0, 4.0, 5.0]]).unwrap();
        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.row(1), &[3.0, 4.0, 5.0]);
        assert_eq!(matrix.mean_row(), vec![2.0, 3.0, 4.0]);
        assert_eq!(matrix.mean_intensity(), 3.0);
    }

    #[test]
    fn test_row_length_mismatch_rejected() {
        let mut matrix = SpectralMatrix::new(4);
        let result = matrix.push_row(&[1.0, 2.0]);
        assert!(matches!(result, Err(SpectroError::InvalidParameter(_))));
        assert!(matrix.is_empty());
    }

    #[test]
    fn test_resampled_keeps_row_count() {
        let matrix = SpectralMatrix::from_rows(2, [[0.0, 1.0], [2.0, 4.0]]).unwrap();
        let wide = matrix.resampled(5).unwrap();
        assert_eq!(wide.columns(), 5);
        assert_eq!(wide.rows(), 2);
        assert_eq!(wide.row(1), &[2.0, 2.5, 3.0, 3.5, 4.0]);
    }
}
