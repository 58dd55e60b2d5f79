use super::{parse_coefficients, ProjectionError};
use crate::{lonlat::normal_lon, LatLon, PixelPoint};

/// Bilinear georeference: an affine transform plus a cross term, for charts whose scans are slightly warped.
///
/// Both directions are fit offline and persisted; the reverse is never derived from the forward coefficients.
#[derive(Clone, Debug)]
pub struct BilinearProjection {
	/// `lon = a*x + c*y + e + g*x*y`, `lat = b*x + d*y + f + h*x*y`
	to_lat_lon: [f64; 8],
	/// `x = a*lon + c*lat + e + g*lon*lat`, `y = b*lon + d*lat + f + h*lon*lat`
	to_pixel: [f64; 8],
}

impl BilinearProjection {
	pub fn new(to_lat_lon: [f64; 8], to_pixel: [f64; 8]) -> Self { Self { to_lat_lon, to_pixel } }

	/// From the sixteen persisted coefficients: pixel -> lat/lon first, then lat/lon -> pixel.
	pub fn from_csv_fields(fields: &[&str]) -> Result<Self, ProjectionError> {
		let all: [f64; 16] = parse_coefficients(fields)?;
		let mut to_lat_lon = [0.0; 8];
		let mut to_pixel = [0.0; 8];
		to_lat_lon.copy_from_slice(&all[..8]);
		to_pixel.copy_from_slice(&all[8..]);
		Ok(Self::new(to_lat_lon, to_pixel))
	}

	pub fn lat_lon_to_pixel(&self, pos: LatLon) -> PixelPoint {
		let (x, y) = Self::eval(&self.to_pixel, pos.lon, pos.lat);
		PixelPoint { x, y }
	}

	pub fn pixel_to_lat_lon(&self, pixel: PixelPoint) -> LatLon {
		let (lon, lat) = Self::eval(&self.to_lat_lon, pixel.x, pixel.y);
		LatLon {
			lat,
			lon: normal_lon(lon),
		}
	}

	fn eval(k: &[f64; 8], u: f64, v: f64) -> (f64, f64) {
		let [a, b, c, d, e, f, g, h] = *k;
		let uv = u * v;
		(a * u + c * v + e + g * uv, b * u + d * v + f + h * uv)
	}
}
