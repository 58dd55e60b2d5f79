use std::{
	error::Error,
	fmt::{Debug, Display},
};

use crate::{
	invert3,
	lonlat::{avg_lons, eastmost, normal_lon, westmost},
	row_reduce,
	LatLon,
	LatLonBox,
	PixelPoint,
	SingularMatrix,
};

/// Rounding slack when deciding whether a point is on the canvas, in pixels.
const EDGE_PIX: f64 = 1e-9;

pub enum PixelMapperError {
	/// The corners span more than 90 degrees of latitude or longitude.
	ExtentTooLarge { lat_span: f64, lon_span: f64 },
	/// The corners don't describe a quadrilateral (three or more are collinear).
	Singular(SingularMatrix),
}

impl Display for PixelMapperError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::ExtentTooLarge { lat_span, lon_span } => write!(
				f,
				"Canvas covers too much of the earth ({:.1} deg lat, {:.1} deg lon)",
				lat_span, lon_span
			),
			Self::Singular(x) => write!(f, "Degenerate canvas corners: {}", x),
		}
	}
}

impl Debug for PixelMapperError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result { Display::fmt(self, f) }
}

impl Error for PixelMapperError {}

impl From<SingularMatrix> for PixelMapperError {
	fn from(x: SingularMatrix) -> Self { Self::Singular(x) }
}

/// The lat/lons under the four corners of the canvas. The map may be rotated, so `tr` isn't necessarily east of `tl`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Corners {
	pub tl: LatLon,
	pub tr: LatLon,
	pub bl: LatLon,
	pub br: LatLon,
}

impl Corners {
	fn normalised(mut self) -> Self {
		for c in [&mut self.tl, &mut self.tr, &mut self.bl, &mut self.br] {
			c.lon = normal_lon(c.lon);
		}
		self
	}
}

/// Projective mapping between whatever lat/lons are currently displayed and canvas pixels.
///
/// Owned by the rendering thread. [`PixelMapper::setup`] is called every frame and only does work when the canvas or
/// one of its corners moved.
pub struct PixelMapper {
	width: u32,
	height: u32,
	corners: Corners,
	bounds: LatLonBox,
	center: LatLon,
	/// `[x*w, y*w, w] = ll_to_pix * [lat, lon, 1]`
	ll_to_pix: [[f64; 3]; 3],
	pix_to_ll: [[f64; 3]; 3],
	generation: u64,
}

impl Default for PixelMapper {
	fn default() -> Self { Self::new() }
}

impl PixelMapper {
	pub fn new() -> Self {
		Self {
			width: 0,
			height: 0,
			corners: Corners::default(),
			bounds: LatLonBox::new(0.0, 0.0, 0.0, 0.0),
			center: LatLon::default(),
			ll_to_pix: [[0.0; 3]; 3],
			pix_to_ll: [[0.0; 3]; 3],
			generation: 0,
		}
	}

	/// Maps the canvas corners `(0, 0)`, `(width, 0)`, `(0, height)` and `(width, height)` to `corners`.
	///
	/// Returns `Ok(false)` without doing anything if nothing changed since the last call. On error the previous
	/// mapping is kept.
	pub fn setup(&mut self, width: u32, height: u32, corners: Corners) -> Result<bool, PixelMapperError> {
		let corners = corners.normalised();
		if self.generation > 0 && width == self.width && height == self.height && corners == self.corners {
			return Ok(false);
		}

		tracy::zone!("Pixel Mapper Setup");

		// Unwrap longitudes relative to the top left corner so they are continuous across the antimeridian. The
		// corners are assumed to be within 180 degrees of each other.
		let unwrap = |lon: f64| corners.tl.lon + normal_lon(lon - corners.tl.lon);
		let tl = LatLon::new(corners.tl.lat, corners.tl.lon);
		let tr = LatLon::new(corners.tr.lat, unwrap(corners.tr.lon));
		let bl = LatLon::new(corners.bl.lat, unwrap(corners.bl.lon));
		let br = LatLon::new(corners.br.lat, unwrap(corners.br.lon));

		let south = tl.lat.min(tr.lat).min(bl.lat).min(br.lat);
		let north = tl.lat.max(tr.lat).max(bl.lat).max(br.lat);
		let west = westmost(westmost(tl.lon, tr.lon), westmost(bl.lon, br.lon));
		let mut east = eastmost(eastmost(tl.lon, tr.lon), eastmost(bl.lon, br.lon));
		if east < west {
			east += 360.0;
		}

		let (lat_span, lon_span) = (north - south, east - west);
		if lat_span > 90.0 || lon_span > 90.0 {
			return Err(PixelMapperError::ExtentTooLarge { lat_span, lon_span });
		}

		let (w, h) = (width as f64, height as f64);
		let ll_to_pix = Self::solve(&[
			(tl, PixelPoint::new(0.0, 0.0)),
			(tr, PixelPoint::new(w, 0.0)),
			(bl, PixelPoint::new(0.0, h)),
			(br, PixelPoint::new(w, h)),
		])?;
		let pix_to_ll = invert3(&ll_to_pix)?;

		self.width = width;
		self.height = height;
		self.corners = corners;
		self.bounds = LatLonBox::new(south, north, west, east);
		self.center = LatLon::new((north + south) / 2.0, avg_lons(west, east));
		self.ll_to_pix = ll_to_pix;
		self.pix_to_ll = pix_to_ll;
		self.generation += 1;

		log::trace!("Pixel mapper now covers {:?}", self.bounds);

		Ok(true)
	}

	/// Solves for the eight unknowns `a..h` of
	///
	/// ```text
	/// a*lat + b*lon + c - g*x*lat - h*x*lon = x
	/// d*lat + e*lon + f - g*y*lat - h*y*lon = y
	/// ```
	///
	/// which is `[x*w, y*w, w] = [[a b c] [d e f] [g h 1]] * [lat, lon, 1]` with the perspective divide multiplied out.
	fn solve(points: &[(LatLon, PixelPoint); 4]) -> Result<[[f64; 3]; 3], SingularMatrix> {
		let mut mat = [[0.0; 9]; 8];
		for (i, (ll, pix)) in points.iter().enumerate() {
			mat[i] = [
				ll.lat,
				ll.lon,
				1.0,
				0.0,
				0.0,
				0.0,
				-pix.x * ll.lat,
				-pix.x * ll.lon,
				pix.x,
			];
			mat[i + 4] = [
				0.0,
				0.0,
				0.0,
				ll.lat,
				ll.lon,
				1.0,
				-pix.y * ll.lat,
				-pix.y * ll.lon,
				pix.y,
			];
		}
		row_reduce(&mut mat)?;

		let k: Vec<f64> = mat.iter().map(|row| row[8]).collect();
		Ok([[k[0], k[1], k[2]], [k[3], k[4], k[5]], [k[6], k[7], 1.0]])
	}

	pub fn canvas_pix_to_lat_lon(&self, x: f64, y: f64) -> LatLon {
		let m = &self.pix_to_ll;
		let w = m[2][0] * x + m[2][1] * y + m[2][2];
		LatLon {
			lat: (m[0][0] * x + m[0][1] * y + m[0][2]) / w,
			lon: normal_lon((m[1][0] * x + m[1][1] * y + m[1][2]) / w),
		}
	}

	/// Returns the canvas pixel and whether it is on the canvas.
	pub fn lat_lon_to_canvas_pix(&self, lat: f64, lon: f64) -> (PixelPoint, bool) {
		// Same unwrapping as the corners went through.
		let lon = self.corners.tl.lon + normal_lon(lon - self.corners.tl.lon);

		let m = &self.ll_to_pix;
		let w = m[2][0] * lat + m[2][1] * lon + m[2][2];
		let p = PixelPoint {
			x: (m[0][0] * lat + m[0][1] * lon + m[0][2]) / w,
			y: (m[1][0] * lat + m[1][1] * lon + m[1][2]) / w,
		};
		let (w, h) = (self.width as f64, self.height as f64);
		let on_canvas = p.x > -EDGE_PIX && p.x < w - EDGE_PIX && p.y > -EDGE_PIX && p.y < h - EDGE_PIX;
		(p, on_canvas)
	}

	/// Bounding box of the four corners.
	pub fn bounds(&self) -> LatLonBox { self.bounds }

	pub fn center(&self) -> LatLon { self.center }

	pub fn canvas_size(&self) -> (u32, u32) { (self.width, self.height) }

	/// Incremented every time the mapping is actually recomputed.
	pub fn generation(&self) -> u64 { self.generation }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn north_up() -> Corners {
		Corners {
			tl: LatLon::new(42.5, -71.5),
			tr: LatLon::new(42.5, -70.5),
			bl: LatLon::new(41.5, -71.5),
			br: LatLon::new(41.5, -70.5),
		}
	}

	fn rotated() -> Corners {
		// Track-up, heading roughly 30 degrees, with a little perspective.
		Corners {
			tl: LatLon::new(42.40, -71.30),
			tr: LatLon::new(42.10, -70.60),
			bl: LatLon::new(41.80, -71.60),
			br: LatLon::new(41.55, -70.95),
		}
	}

	#[test]
	fn corners_map_to_canvas_corners() {
		let mut pm = PixelMapper::new();
		pm.setup(800, 600, north_up()).unwrap();

		let (p, on) = pm.lat_lon_to_canvas_pix(42.5, -71.5);
		assert!(p.x.abs() < 1e-6 && p.y.abs() < 1e-6 && on);
		let (p, on) = pm.lat_lon_to_canvas_pix(41.5, -70.5);
		assert!((p.x - 800.0).abs() < 1e-6 && (p.y - 600.0).abs() < 1e-6);
		assert!(!on);

		let (p, on) = pm.lat_lon_to_canvas_pix(42.0, -71.0);
		assert!((p.x - 400.0).abs() < 1e-6 && (p.y - 300.0).abs() < 1e-6 && on);

		assert!((pm.center().lat - 42.0).abs() < 1e-9 && (pm.center().lon - -71.0).abs() < 1e-9);
	}

	#[test]
	fn top_left_edge_is_on_canvas() {
		let mut pm = PixelMapper::new();
		pm.setup(800, 600, north_up()).unwrap();

		// The solved corner can land a few ulps outside the canvas.
		let (_, on) = pm.lat_lon_to_canvas_pix(42.5, -71.5);
		assert!(on);
		let (_, on) = pm.lat_lon_to_canvas_pix(42.5, -71.0);
		assert!(on);

		// A thousandth of a pixel out is still off.
		let (p, on) = pm.lat_lon_to_canvas_pix(42.5 + 1e-6, -71.0);
		assert!(p.y < -1e-4 && !on);
		let (_, on) = pm.lat_lon_to_canvas_pix(42.0, -71.5 - 1e-6);
		assert!(!on);
		let (_, on) = pm.lat_lon_to_canvas_pix(41.5, -71.0);
		assert!(!on);
	}

	#[test]
	fn memoizes_identical_setup() {
		let mut pm = PixelMapper::new();
		assert!(pm.setup(800, 600, north_up()).unwrap());
		assert_eq!(pm.generation(), 1);

		assert!(!pm.setup(800, 600, north_up()).unwrap());
		assert_eq!(pm.generation(), 1);

		// Same corners, longitudes written differently.
		let mut wrapped = north_up();
		wrapped.tl.lon += 360.0;
		assert!(!pm.setup(800, 600, wrapped).unwrap());

		assert!(pm.setup(801, 600, north_up()).unwrap());
		assert_eq!(pm.generation(), 2);

		let mut moved = north_up();
		moved.br.lat -= 0.01;
		assert!(pm.setup(801, 600, moved).unwrap());
		assert_eq!(pm.generation(), 3);
	}

	#[test]
	fn round_trip_through_perspective() {
		let mut pm = PixelMapper::new();
		pm.setup(1024, 768, rotated()).unwrap();

		for (x, y) in [(10.0, 10.0), (512.0, 384.0), (1000.0, 20.0), (30.0, 700.0), (900.0, 760.0)] {
			let ll = pm.canvas_pix_to_lat_lon(x, y);
			let (p, on) = pm.lat_lon_to_canvas_pix(ll.lat, ll.lon);
			assert!(on);
			assert!((p.x - x).abs() < 1e-6 && (p.y - y).abs() < 1e-6, "({}, {}) came back as {:?}", x, y, p);

			let back = pm.canvas_pix_to_lat_lon(p.x, p.y);
			assert!((back.lat - ll.lat).abs() < 1e-9 && (back.lon - ll.lon).abs() < 1e-9);
		}
	}

	#[test]
	fn bounds_of_rotated_canvas() {
		let mut pm = PixelMapper::new();
		pm.setup(1024, 768, rotated()).unwrap();
		let b = pm.bounds();
		assert_eq!(b.south, 41.55);
		assert_eq!(b.north, 42.40);
		assert!((b.west - -71.60).abs() < 1e-12);
		assert!((b.east - -70.60).abs() < 1e-12);
	}

	#[test]
	fn straddles_antimeridian() {
		let corners = Corners {
			tl: LatLon::new(1.0, 179.5),
			tr: LatLon::new(1.0, -179.5),
			bl: LatLon::new(-1.0, 179.5),
			br: LatLon::new(-1.0, -179.5),
		};
		let mut pm = PixelMapper::new();
		pm.setup(200, 200, corners).unwrap();

		let b = pm.bounds();
		assert!((b.west - 179.5).abs() < 1e-9);
		assert!((b.east - -179.5).abs() < 1e-9);
		assert!(b.crosses_antimeridian());
		assert!((pm.center().lon.abs() - 180.0).abs() < 1e-9);

		// Both sides of the line are on the canvas.
		let (p, on) = pm.lat_lon_to_canvas_pix(0.0, 179.9);
		assert!(on && (p.x - 80.0).abs() < 1e-6);
		let (p, on) = pm.lat_lon_to_canvas_pix(0.0, -179.9);
		assert!(on && (p.x - 120.0).abs() < 1e-6);
		let (_, on) = pm.lat_lon_to_canvas_pix(0.0, 0.0);
		assert!(!on);

		let ll = pm.canvas_pix_to_lat_lon(150.0, 100.0);
		assert!((ll.lon - -179.75).abs() < 1e-9);
	}

	#[test]
	fn rejects_bad_canvases() {
		let mut pm = PixelMapper::new();
		let huge = Corners {
			tl: LatLon::new(80.0, -100.0),
			tr: LatLon::new(80.0, 0.0),
			bl: LatLon::new(-20.0, -100.0),
			br: LatLon::new(-20.0, 0.0),
		};
		assert!(matches!(
			pm.setup(100, 100, huge),
			Err(PixelMapperError::ExtentTooLarge { .. })
		));

		let p = LatLon::new(42.0, -71.0);
		let collapsed = Corners {
			tl: p,
			tr: p,
			bl: p,
			br: p,
		};
		assert!(matches!(
			pm.setup(100, 100, collapsed),
			Err(PixelMapperError::Singular(_))
		));
		assert_eq!(pm.generation(), 0);
	}
}
