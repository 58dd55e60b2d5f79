//! Great-circle navigation on a spherical earth, where one degree of arc is sixty nautical miles.

use crate::{lonlat::normal_lon, LatLon};

pub const FT_PER_M: f64 = 3.28084;
pub const KT_PER_MPS: f64 = 1.94384;
pub const NM_PER_DEG: f64 = 60.0;
pub const M_PER_NM: f64 = 1852.0;

/// Great-circle distance between two points, in nautical miles.
pub fn lat_lon_dist(src: LatLon, dst: LatLon) -> f64 { lat_lon_dist_rad(src, dst).to_degrees() * NM_PER_DEG }

/// Great-circle distance between two points, in radians of arc.
pub fn lat_lon_dist_rad(src: LatLon, dst: LatLon) -> f64 {
	let s_lat = src.lat.to_radians();
	let f_lat = dst.lat.to_radians();
	let d_lon = (dst.lon - src.lon).to_radians();

	let t1 = (f_lat.cos() * d_lon.sin()).powi(2);
	let t2 = (s_lat.cos() * f_lat.sin() - s_lat.sin() * f_lat.cos() * d_lon.cos()).powi(2);
	let t3 = s_lat.sin() * f_lat.sin();
	let t4 = s_lat.cos() * f_lat.cos() * d_lon.cos();
	(t1 + t2).sqrt().atan2(t3 + t4)
}

/// Latitude reached by travelling `dist_nm` from latitude `lat` on true heading `hdg`.
pub fn lat_hdg_dist_to_lat(lat: f64, hdg: f64, dist_nm: f64) -> f64 {
	let dist = (dist_nm / NM_PER_DEG).to_radians();
	let lat = lat.to_radians();
	let hdg = hdg.to_radians();

	(lat.sin() * dist.cos() + lat.cos() * dist.sin() * hdg.cos())
		.clamp(-1.0, 1.0)
		.asin()
		.to_degrees()
}

/// Longitude reached by travelling `dist_nm` from `lat`/`lon` on true heading `hdg`.
pub fn lat_lon_hdg_dist_to_lon(lat: f64, lon: f64, hdg: f64, dist_nm: f64) -> f64 {
	let dist = (dist_nm / NM_PER_DEG).to_radians();
	let lat_r = lat.to_radians();
	let hdg = hdg.to_radians();

	let new_lat = lat_hdg_dist_to_lat(lat, hdg.to_degrees(), dist_nm).to_radians();
	let dlon = (hdg.sin() * dist.sin() * lat_r.cos()).atan2(dist.cos() - lat_r.sin() * new_lat.sin());
	normal_lon(dlon.to_degrees() + lon)
}

/// The point `dist_nm` away from `from` on true heading `hdg`.
pub fn project(from: LatLon, hdg: f64, dist_nm: f64) -> LatLon {
	LatLon {
		lat: lat_hdg_dist_to_lat(from.lat, hdg, dist_nm),
		lon: lat_lon_hdg_dist_to_lon(from.lat, from.lon, hdg, dist_nm),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn one_degree_is_sixty_miles() {
		let d = lat_lon_dist(LatLon::new(42.0, -71.0), LatLon::new(43.0, -71.0));
		assert!((d - 60.0).abs() < 1e-9);
	}

	#[test]
	fn project_then_measure() {
		let start = LatLon::new(42.0, -71.0);
		for hdg in [0.0, 45.0, 90.0, 200.0, 270.0] {
			let end = project(start, hdg, 3.0);
			assert!((lat_lon_dist(start, end) - 3.0).abs() < 1e-6, "heading {}", hdg);
		}

		assert!(project(start, 0.0, 3.0).lat > 42.0);
		assert!(project(start, 45.0, 3.0).lon > -71.0);
		assert!(project(start, 200.0, 3.0).lat < 42.0);
	}

	#[test]
	fn west_reduces_longitude() {
		let end = project(LatLon::new(42.0, -71.0), 270.0, 3.0);
		let expected = -71.0 - 3.0 / 60.0 / 42f64.to_radians().cos();
		assert!((end.lon - expected).abs() < 1e-4);
		assert!((end.lat - 42.0).abs() < 1e-3);
	}

	#[test]
	fn crosses_antimeridian() {
		let end = project(LatLon::new(0.0, 179.99), 90.0, 6.0);
		assert!(end.lon < -179.0);
	}
}
