use std::{
	error::Error,
	fmt::{Debug, Display},
};

/// Returned when elimination runs into a pivot that is zero for all practical purposes.
///
/// Calibration data is expected to be sane (three or four reference points that aren't collinear), so this almost
/// always means the georeference itself is broken.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct SingularMatrix {
	/// The pivot column that could not be normalised.
	pub column: usize,
}

impl Display for SingularMatrix {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Matrix is singular (no usable pivot in column {})", self.column)
	}
}

impl Debug for SingularMatrix {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result { Display::fmt(self, f) }
}

impl Error for SingularMatrix {}

/// Gauss-Jordan elimination of an augmented matrix, in place.
///
/// `matrix` has `m` rows of `N` columns, with `m <= N`. On success the leading `m`x`m` block is the identity and the
/// trailing `N - m` columns hold the solution of the system. Solving `[A | I]` therefore leaves `[I | A^-1]`.
///
/// Partial pivoting is used: the remaining row with the largest magnitude in the pivot column is swapped in before
/// normalising. A pivot no larger than `f64::EPSILON` times the largest magnitude in the leading block is treated as
/// singular.
pub fn row_reduce<const N: usize>(matrix: &mut [[f64; N]]) -> Result<(), SingularMatrix> {
	let rows = matrix.len();
	assert!(rows <= N, "Augmented matrix must not have more rows than columns");

	let scale = matrix
		.iter()
		.flat_map(|row| row[..rows].iter())
		.fold(0.0f64, |acc, x| acc.max(x.abs()));
	let tolerance = scale * f64::EPSILON;

	for pivot_row in 0..rows {
		let best = (pivot_row..rows)
			.max_by(|&a, &b| {
				matrix[a][pivot_row]
					.abs()
					.partial_cmp(&matrix[b][pivot_row].abs())
					.unwrap_or(std::cmp::Ordering::Equal)
			})
			.unwrap_or(pivot_row);

		let pivot = matrix[best][pivot_row];
		if !(pivot.abs() > tolerance) {
			return Err(SingularMatrix { column: pivot_row });
		}
		matrix.swap(pivot_row, best);

		if pivot != 1.0 {
			for value in matrix[pivot_row][pivot_row..].iter_mut() {
				*value /= pivot;
			}
		}

		let normalised = matrix[pivot_row];
		for (r, row) in matrix.iter_mut().enumerate() {
			if r == pivot_row {
				continue;
			}
			let factor = row[pivot_row];
			if factor != 0.0 {
				for c in pivot_row..N {
					row[c] -= factor * normalised[c];
				}
			}
		}
	}

	Ok(())
}

/// Inverts a 3x3 matrix through [`row_reduce`].
pub fn invert3(m: &[[f64; 3]; 3]) -> Result<[[f64; 3]; 3], SingularMatrix> {
	let mut aug = [[0.0; 6]; 3];
	for r in 0..3 {
		aug[r][..3].copy_from_slice(&m[r]);
		aug[r][3 + r] = 1.0;
	}

	row_reduce(&mut aug)?;

	let mut out = [[0.0; 3]; 3];
	for r in 0..3 {
		out[r].copy_from_slice(&aug[r][3..]);
	}
	Ok(out)
}
