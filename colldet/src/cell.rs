use std::fmt::Display;

use chart::LatLon;

/// An arc-minute cell, packed as `lat_minutes << 16 | (lon_minutes & 0xFFFF)`.
///
/// The packed form is what the display gets handed, so it must stay stable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey(i32);

impl CellKey {
	/// The cell whose centre is nearest to `pos`. Halves round up.
	pub fn nearest(pos: LatLon) -> Self {
		let lat = (pos.lat * 60.0 + 0.5).floor() as i32;
		let lon = (pos.lon * 60.0 + 0.5).floor() as i32;
		Self::from_minutes(lat, lon)
	}

	pub fn from_minutes(lat_minutes: i32, lon_minutes: i32) -> Self { Self((lat_minutes << 16) | (lon_minutes & 0xFFFF)) }

	pub fn from_packed(packed: i32) -> Self { Self(packed) }

	pub fn packed(self) -> i32 { self.0 }

	pub fn lat_minutes(self) -> i32 { self.0 >> 16 }

	pub fn lon_minutes(self) -> i32 { self.0 as i16 as i32 }

	pub fn center(self) -> LatLon { LatLon::new(self.lat_minutes() as f64 / 60.0, self.lon_minutes() as f64 / 60.0) }
}

impl Display for CellKey {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result { write!(f, "{}", self.center()) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn packs_negative_minutes() {
		let key = CellKey::nearest(LatLon::new(42.0, -71.0667));
		assert_eq!(key.lat_minutes(), 2520);
		assert_eq!(key.lon_minutes(), -4264);
		assert_eq!(key.packed(), (2520 << 16) | (-4264 & 0xFFFF));

		let key = CellKey::nearest(LatLon::new(-33.95, 151.18));
		assert_eq!(key.lat_minutes(), -2037);
		assert_eq!(key.lon_minutes(), 9071);
		assert_eq!(CellKey::from_packed(key.packed()), key);
	}

	#[test]
	fn center_is_on_the_minute() {
		let key = CellKey::from_minutes(-2037, -10800);
		let c = key.center();
		assert!((c.lat - -33.95).abs() < 1e-12);
		assert_eq!(c.lon, -180.0);
		assert_eq!(CellKey::nearest(c), key);
	}
}
