use crate::{nav, LatLon};

/// Normalises a longitude into `-180.0..180.0`.
pub fn normal_lon(lon: f64) -> f64 {
	let lon = (lon + 180.0).rem_euclid(360.0) - 180.0;
	// rem_euclid can round up to exactly 360 for tiny negative inputs.
	if lon >= 180.0 {
		lon - 360.0
	} else {
		lon
	}
}

/// The more westerly of two longitudes, assuming they are less than 180 degrees apart.
pub fn westmost(lon1: f64, lon2: f64) -> f64 {
	let east_of = (lon2 - lon1).rem_euclid(360.0);
	normal_lon(if east_of < 180.0 { lon1 } else { lon2 })
}

/// The more easterly of two longitudes, assuming they are less than 180 degrees apart.
pub fn eastmost(lon1: f64, lon2: f64) -> f64 {
	let east_of = (lon2 - lon1).rem_euclid(360.0);
	normal_lon(if east_of < 180.0 { lon2 } else { lon1 })
}

/// The longitude halfway between two longitudes, along the shorter way round.
pub fn avg_lons(lon1: f64, lon2: f64) -> f64 { normal_lon(lon1 + normal_lon(lon2 - lon1) / 2.0) }

/// A lat/lon bounding box. `east` is less than `west` when the box straddles the antimeridian.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LatLonBox {
	pub south: f64,
	pub north: f64,
	pub west: f64,
	pub east: f64,
}

impl LatLonBox {
	pub fn new(south: f64, north: f64, west: f64, east: f64) -> Self {
		Self {
			south: south.min(north),
			north: south.max(north),
			west: normal_lon(west),
			east: normal_lon(east),
		}
	}

	/// The box reaching `radius_nm` north, south, east and west of `center`.
	pub fn around(center: LatLon, radius_nm: f64) -> Self {
		Self::new(
			nav::lat_hdg_dist_to_lat(center.lat, 180.0, radius_nm),
			nav::lat_hdg_dist_to_lat(center.lat, 0.0, radius_nm),
			nav::lat_lon_hdg_dist_to_lon(center.lat, center.lon, -90.0, radius_nm),
			nav::lat_lon_hdg_dist_to_lon(center.lat, center.lon, 90.0, radius_nm),
		)
	}

	pub fn crosses_antimeridian(&self) -> bool { self.east < self.west }

	/// Width of the box in degrees of longitude, `0.0..360.0`.
	pub fn lon_span(&self) -> f64 { (self.east - self.west).rem_euclid(360.0) }

	pub fn contains_lat(&self, lat: f64) -> bool { lat >= self.south && lat <= self.north }

	pub fn contains_lon(&self, lon: f64) -> bool { (lon - self.west).rem_euclid(360.0) <= self.lon_span() }

	pub fn contains(&self, point: LatLon) -> bool { self.contains_lat(point.lat) && self.contains_lon(point.lon) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalises() {
		assert_eq!(normal_lon(180.0), -180.0);
		assert_eq!(normal_lon(-180.0), -180.0);
		assert!((normal_lon(190.0) - -170.0).abs() < 1e-12);
		assert!((normal_lon(-541.0) - 179.0).abs() < 1e-12);
		assert!((normal_lon(-71.5) - -71.5).abs() < 1e-12);
	}

	#[test]
	fn westmost_eastmost_across_antimeridian() {
		assert_eq!(westmost(179.0, -179.0), 179.0);
		assert_eq!(eastmost(179.0, -179.0), -179.0);
		assert_eq!(westmost(-179.0, 179.0), 179.0);
		assert_eq!(eastmost(-71.0, -72.0), -71.0);
		assert_eq!(westmost(-71.0, -72.0), -72.0);
		assert!((avg_lons(179.0, -179.0).abs() - 180.0).abs() < 1e-9);
	}

	#[test]
	fn box_straddling_antimeridian() {
		let b = LatLonBox::new(-1.0, 1.0, 179.5, -179.5);
		assert!(b.crosses_antimeridian());
		assert!((b.lon_span() - 1.0).abs() < 1e-9);
		assert!(b.contains(LatLon::new(0.0, 179.9)));
		assert!(b.contains(LatLon::new(0.0, -179.9)));
		assert!(b.contains(LatLon::new(0.0, 180.0)));
		assert!(!b.contains(LatLon::new(0.0, 0.0)));
		assert!(!b.contains(LatLon::new(2.0, 179.9)));
	}

	#[test]
	fn box_around_point() {
		let b = LatLonBox::around(LatLon::new(0.0, 179.99), 1.0);
		assert!(b.crosses_antimeridian());
		assert!(b.contains(LatLon::new(0.0, -179.995)));
		assert!(!b.contains(LatLon::new(0.0, -179.98)));
		assert!((b.north - 1.0 / 60.0).abs() < 1e-9);
	}
}
