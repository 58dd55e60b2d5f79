use super::{parse_coefficients, ProjectionError, WorldFile};
use crate::{
	lonlat::normal_lon,
	nav::{M_PER_NM, NM_PER_DEG},
	row_reduce,
	LatLon,
	PixelPoint,
};

/// Plain affine georeference, as used by airport diagrams and approach plates.
///
/// The forward transform maps `(lon, lat)` to bitmap pixels; the reverse transform is derived from it once, at
/// construction.
#[derive(Clone, Debug)]
pub struct AffineProjection {
	to_pixel: WorldFile,
	to_lat_lon: WorldFile,
	metres_per_pixel: f64,
}

impl AffineProjection {
	/// From pre-fit `lon/lat -> pixel` coefficients.
	pub fn from_world_file(to_pixel: WorldFile) -> Result<Self, ProjectionError> {
		let to_lat_lon = to_pixel.invert()?;
		Ok(Self {
			to_pixel,
			to_lat_lon,
			metres_per_pixel: NM_PER_DEG * M_PER_NM / to_pixel.v_step(),
		})
	}

	/// From the six persisted coefficients `a..f`.
	pub fn from_csv_fields(fields: &[&str]) -> Result<Self, ProjectionError> {
		Self::from_world_file(WorldFile::from_array(parse_coefficients(fields)?))
	}

	/// Fits a similarity transform (rotation, uniform scale, translation, with pixel rows increasing southwards)
	/// through two reference points.
	///
	/// Longitudes are scaled by the cosine of `ref_lat` to get a local easting, so this is only accurate over the
	/// few tens of miles a plate covers.
	pub fn from_reference_points(
		ref_lat: f64, i: (LatLon, PixelPoint), j: (LatLon, PixelPoint),
	) -> Result<Self, ProjectionError> {
		let lat_cos = ref_lat.to_radians().cos();

		let (i_ll, i_pix) = i;
		let (j_ll, j_pix) = j;
		let (i_north, i_east) = (i_ll.lat, i_ll.lon * lat_cos);
		let (j_north, j_east) = (j_ll.lat, j_ll.lon * lat_cos);

		// Unknowns a' b' c' d' e' f' of the easting/northing -> pixel world file.
		// a' + d' = 0 and b' - c' = 0 restrict it to a similarity with the y axis flipped.
		#[rustfmt::skip]
		let mut mat = [
			[1.0,     0.0,    0.0,     1.0,     0.0, 0.0, 0.0],
			[0.0,    -1.0,    1.0,     0.0,     0.0, 0.0, 0.0],
			[i_east,  0.0,    i_north, 0.0,     1.0, 0.0, i_pix.x],
			[0.0,     i_east, 0.0,     i_north, 0.0, 1.0, i_pix.y],
			[j_east,  0.0,    j_north, 0.0,     1.0, 0.0, j_pix.x],
			[0.0,     j_east, 0.0,     j_north, 0.0, 1.0, j_pix.y],
		];
		row_reduce(&mut mat)?;

		let to_pixel = WorldFile {
			a: mat[0][6] * lat_cos,
			b: mat[1][6] * lat_cos,
			c: mat[2][6],
			d: mat[3][6],
			e: mat[4][6],
			f: mat[5][6],
		};
		Self::from_world_file(to_pixel)
	}

	pub fn lat_lon_to_pixel(&self, pos: LatLon) -> PixelPoint {
		let (x, y) = self.to_pixel.apply(pos.lon, pos.lat);
		PixelPoint { x, y }
	}

	pub fn pixel_to_lat_lon(&self, pixel: PixelPoint) -> LatLon {
		let (lon, lat) = self.to_lat_lon.apply(pixel.x, pixel.y);
		LatLon {
			lat,
			lon: normal_lon(lon),
		}
	}

	pub fn world_file(&self) -> WorldFile { self.to_pixel }

	pub fn metres_per_pixel(&self) -> f64 { self.metres_per_pixel }
}

#[cfg(test)]
mod tests {
	use super::*;

	const SCALE: f64 = 10_000.0;

	fn plate() -> (f64, LatLon, PixelPoint, LatLon, PixelPoint) {
		let ref_lat: f64 = 42.35;
		let cos = ref_lat.to_radians().cos();
		let nw = LatLon::new(42.4, -71.1);
		let se = LatLon::new(42.3, -70.9);
		let se_pix = PixelPoint::new((se.lon - nw.lon) * cos * SCALE, (nw.lat - se.lat) * SCALE);
		(ref_lat, nw, PixelPoint::new(0.0, 0.0), se, se_pix)
	}

	#[test]
	fn reference_points_map_exactly() {
		let (ref_lat, nw, nw_pix, se, se_pix) = plate();
		let proj = AffineProjection::from_reference_points(ref_lat, (nw, nw_pix), (se, se_pix)).unwrap();

		for (ll, pix) in [(nw, nw_pix), (se, se_pix)] {
			let p = proj.lat_lon_to_pixel(ll);
			assert!((p.x - pix.x).abs() < 1e-6 && (p.y - pix.y).abs() < 1e-6, "{:?} -> {:?}", ll, p);
		}

		// North up, no rotation.
		let wf = proj.world_file();
		assert!(wf.b.abs() < 1e-6 && wf.c.abs() < 1e-6);
		assert!(wf.d < 0.0);
		assert!((proj.metres_per_pixel() - 60.0 * 1852.0 / SCALE).abs() < 1e-6);
	}

	#[test]
	fn round_trip() {
		let (ref_lat, nw, nw_pix, se, se_pix) = plate();
		let proj = AffineProjection::from_reference_points(ref_lat, (nw, nw_pix), (se, se_pix)).unwrap();

		for lat in [42.31, 42.33, 42.37, 42.39] {
			for lon in [-71.09, -71.0, -70.95, -70.91] {
				let ll = LatLon::new(lat, lon);
				let back = proj.pixel_to_lat_lon(proj.lat_lon_to_pixel(ll));
				assert!((back.lat - lat).abs() < 1e-6 && (back.lon - lon).abs() < 1e-6);
			}
		}
	}

	#[test]
	fn rotated_world_file_round_trip() {
		let proj = AffineProjection::from_csv_fields(&["5100.2", "-640.1", "-712.4", "-6873.9", "365712.0", "288431.5"])
			.unwrap();
		let ll = LatLon::new(41.25, -70.06);
		let back = proj.pixel_to_lat_lon(proj.lat_lon_to_pixel(ll));
		assert!((back.lat - ll.lat).abs() < 1e-6 && (back.lon - ll.lon).abs() < 1e-6);
	}

	#[test]
	fn coincident_reference_points() {
		let p = LatLon::new(42.0, -71.0);
		let res = AffineProjection::from_reference_points(
			42.0,
			(p, PixelPoint::new(0.0, 0.0)),
			(p, PixelPoint::new(10.0, 10.0)),
		);
		assert!(matches!(res, Err(ProjectionError::Singular(_))));
	}
}
