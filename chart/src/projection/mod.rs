//! The three ways a chart can be georeferenced.
//!
//! Every chart owns exactly one [`Projection`], built once from coefficients supplied by the chart catalogue and
//! never mutated afterwards, so projections are freely shared between threads.

use std::{
	error::Error,
	fmt::{Debug, Display},
};

use crate::{row_reduce, LatLon, PixelPoint, SingularMatrix};

mod affine;
pub use affine::*;
mod bilinear;
pub use bilinear::*;
mod lambert;
pub use lambert::*;

pub enum ProjectionError {
	/// The calibration data describes a degenerate transform.
	Singular(SingularMatrix),
	/// A persisted coefficient could not be parsed.
	InvalidCoefficient { index: usize, value: String },
	/// The wrong number of coefficients was supplied.
	CoefficientCount { expected: usize, found: usize },
	/// The Lambert inverse did not settle within its iteration budget.
	NonConvergent { iterations: u32, residual_m: f64 },
}

impl Display for ProjectionError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Singular(x) => write!(f, "Degenerate georeference: {}", x),
			Self::InvalidCoefficient { index, value } => write!(f, "Invalid coefficient #{}: {:?}", index, value),
			Self::CoefficientCount { expected, found } => {
				write!(f, "Expected {} coefficients, found {}", expected, found)
			},
			Self::NonConvergent { iterations, residual_m } => write!(
				f,
				"Latitude did not converge after {} iterations ({:.1}m off)",
				iterations, residual_m
			),
		}
	}
}

impl Debug for ProjectionError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result { Display::fmt(self, f) }
}

impl Error for ProjectionError {}

impl From<SingularMatrix> for ProjectionError {
	fn from(x: SingularMatrix) -> Self { Self::Singular(x) }
}

/// Six-coefficient affine transform, in the row-vector layout used by GIS world files:
///
/// ```text
///              [ a b 0 ]
///  [ u v 1 ] * [ c d 0 ] = [ x y 1 ]
///              [ e f 1 ]
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct WorldFile {
	pub a: f64,
	pub b: f64,
	pub c: f64,
	pub d: f64,
	pub e: f64,
	pub f: f64,
}

impl WorldFile {
	pub fn from_array([a, b, c, d, e, f]: [f64; 6]) -> Self { Self { a, b, c, d, e, f } }

	pub fn to_array(&self) -> [f64; 6] { [self.a, self.b, self.c, self.d, self.e, self.f] }

	pub fn apply(&self, u: f64, v: f64) -> (f64, f64) {
		(
			self.a * u + self.c * v + self.e,
			self.b * u + self.d * v + self.f,
		)
	}

	/// The transform that undoes this one.
	pub fn invert(&self) -> Result<Self, SingularMatrix> {
		let mut mat = [
			[self.a, self.b, 0.0, 1.0, 0.0, 0.0],
			[self.c, self.d, 0.0, 0.0, 1.0, 0.0],
			[self.e, self.f, 1.0, 0.0, 0.0, 1.0],
		];
		row_reduce(&mut mat)?;

		Ok(Self {
			a: mat[0][3],
			b: mat[0][4],
			c: mat[1][3],
			d: mat[1][4],
			e: mat[2][3],
			f: mat[2][4],
		})
	}

	/// Length of one unit step of `v`, measured in the output space.
	pub fn v_step(&self) -> f64 { self.c.hypot(self.d) }

	/// Magnitude of the gradient of the `y` output.
	pub fn y_gradient(&self) -> f64 { self.b.hypot(self.d) }
}

/// A chart's georeference.
#[derive(Clone, Debug)]
pub enum Projection {
	Affine(AffineProjection),
	Bilinear(BilinearProjection),
	Lambert(LambertProjection),
}

impl Projection {
	pub fn lat_lon_to_pixel(&self, pos: LatLon) -> PixelPoint {
		match self {
			Self::Affine(x) => x.lat_lon_to_pixel(pos),
			Self::Bilinear(x) => x.lat_lon_to_pixel(pos),
			Self::Lambert(x) => x.lat_lon_to_pixel(pos),
		}
	}

	pub fn pixel_to_lat_lon(&self, pixel: PixelPoint) -> Result<LatLon, ProjectionError> {
		match self {
			Self::Affine(x) => Ok(x.pixel_to_lat_lon(pixel)),
			Self::Bilinear(x) => Ok(x.pixel_to_lat_lon(pixel)),
			Self::Lambert(x) => x.pixel_to_lat_lon(pixel),
		}
	}
}

impl From<AffineProjection> for Projection {
	fn from(x: AffineProjection) -> Self { Self::Affine(x) }
}

impl From<BilinearProjection> for Projection {
	fn from(x: BilinearProjection) -> Self { Self::Bilinear(x) }
}

impl From<LambertProjection> for Projection {
	fn from(x: LambertProjection) -> Self { Self::Lambert(x) }
}

/// Parses a run of persisted coefficients.
pub(crate) fn parse_coefficients<const N: usize>(fields: &[&str]) -> Result<[f64; N], ProjectionError> {
	if fields.len() != N {
		return Err(ProjectionError::CoefficientCount {
			expected: N,
			found: fields.len(),
		});
	}

	let mut out = [0.0; N];
	for (i, (field, slot)) in fields.iter().zip(out.iter_mut()).enumerate() {
		*slot = field
			.trim()
			.parse()
			.map_err(|_| ProjectionError::InvalidCoefficient {
				index: i,
				value: field.to_string(),
			})?;
	}
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn world_file_inverts() {
		let wf = WorldFile::from_array([42.3, 1.5, -0.7, -42.1, -512_000.0, 310_500.0]);
		let inv = wf.invert().unwrap();
		let (x, y) = wf.apply(1234.0, 5678.0);
		let (u, v) = inv.apply(x, y);
		assert!((u - 1234.0).abs() < 1e-6);
		assert!((v - 5678.0).abs() < 1e-6);
	}

	#[test]
	fn degenerate_world_file() {
		let wf = WorldFile::from_array([1.0, 2.0, 2.0, 4.0, 0.0, 0.0]);
		assert!(wf.invert().is_err());
	}

	#[test]
	fn parses_coefficients() {
		let ok: [f64; 3] = parse_coefficients(&["1.5", " -2", "3e2"]).unwrap();
		assert_eq!(ok, [1.5, -2.0, 300.0]);

		let bad = parse_coefficients::<3>(&["1.5", "x", "3"]);
		assert!(matches!(bad, Err(ProjectionError::InvalidCoefficient { index: 1, .. })));
		let short = parse_coefficients::<3>(&["1.5"]);
		assert!(matches!(short, Err(ProjectionError::CoefficientCount { expected: 3, found: 1 })));
	}
}
