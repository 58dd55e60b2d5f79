//! A library for working with the arc-minute topography archives the collision scanner reads.

use std::{
	error::Error,
	fmt::{Debug, Display},
	path::PathBuf,
};

use zip::result::ZipError;

mod archive;
pub use archive::*;
mod builder;
pub use builder::*;
mod store;
pub use store::*;
mod tile;
pub use tile::*;

/// ## Archive layout
/// A data directory holds one zip file per integer latitude, named `{lat}.zip` for `lat` in `-90..=89`. A band with no
/// land may be missing entirely.
///
/// Each archive holds one entry per integer longitude, named `{lat}/{lon}` for `lon` in `-180..=179` (no padding, `-`
/// for south and west). Entries are either stored or deflated. Entries whose name doesn't parse, whose latitude isn't
/// the archive's own, or whose uncompressed size isn't [`TILE_BYTES`] are ignored.
///
/// ## Tile entries
/// * [0..7200]: 60 * 60 `i16`s, little endian, in metres above mean sea level.
///
/// The tile is laid out in row-major order, `[lat minute][lon minute]`. The origin (the degree's lowest latitude and
/// longitude) is the first element, so row 0 is the southern edge. A value of [`INVALID_ELEV`] means no data.
///
/// ## Legacy layout
/// Older data directories kept every tile as a loose file, `{lat}/{lon}`, with the same 7200 bytes of content.
/// `topoc pack` converts those into archives.
pub const TILE_SIDE: usize = 60;

/// Size of one uncompressed tile entry.
pub const TILE_BYTES: usize = TILE_SIDE * TILE_SIDE * 2;

/// Elevation returned for cells without data.
pub const INVALID_ELEV: i16 = i16::MIN;

pub enum LoadError {
	InvalidFileName(PathBuf),
	InvalidEntrySize { name: String, size: u64 },
	Zip(ZipError),
	Io(std::io::Error),
}

impl Display for LoadError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::InvalidFileName(x) => write!(f, "Not a topography archive name: {}", x.display()),
			Self::InvalidEntrySize { name, size } => {
				write!(f, "Entry {} is {} bytes, expected {}", name, size, TILE_BYTES)
			},
			Self::Zip(x) => write!(f, "Zip error: {}", x),
			Self::Io(x) => write!(f, "IO error: {}", x),
		}
	}
}

impl Debug for LoadError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result { Display::fmt(self, f) }
}

impl Error for LoadError {}

impl From<std::io::Error> for LoadError {
	fn from(x: std::io::Error) -> Self { Self::Io(x) }
}

impl From<ZipError> for LoadError {
	fn from(x: ZipError) -> Self { Self::Zip(x) }
}

/// The integer degrees of the tile holding a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
	pub lat: i16,
	pub lon: i16,
}

/// An arc-minute cell, split into its tile and the row and column within that tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MinuteCell {
	pub tile: TileKey,
	pub lat_min: usize,
	pub lon_min: usize,
}

impl MinuteCell {
	/// The cell nearest to a point. Longitude is normalised; a cell rounding up to 180 east lands on 180 west.
	pub fn nearest(lat: f64, lon: f64) -> Self {
		let (lat_deg, lat_min) = split_minutes(lat);
		let (mut lon_deg, lon_min) = split_minutes(lon - ((lon + 180.0) / 360.0).floor() * 360.0);
		if lon_deg >= 180 {
			lon_deg -= 360;
		}

		Self {
			tile: TileKey {
				lat: lat_deg,
				lon: lon_deg,
			},
			lat_min,
			lon_min,
		}
	}
}

/// Rounds degrees to the nearest minute (halves round up) and splits the result into whole degrees and `0..60` minutes,
/// borrowing a degree for negatives.
pub fn split_minutes(deg: f64) -> (i16, usize) {
	let total = (deg * 60.0 + 0.5).floor() as i32;
	(total.div_euclid(60) as i16, total.rem_euclid(60) as usize)
}

pub fn archive_file_name(lat: i16) -> String { format!("{}.zip", lat) }

pub fn entry_name(lat: i16, lon: i16) -> String { format!("{}/{}", lat, lon) }

/// Parses an entry name back into its tile.
pub fn parse_entry_name(name: &str) -> Option<TileKey> {
	let (lat, lon) = name.split_once('/')?;
	let lat: i16 = lat.parse().ok()?;
	let lon: i16 = lon.parse().ok()?;
	((-90..90).contains(&lat) && (-180..180).contains(&lon)).then(|| TileKey { lat, lon })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_negative_minutes() {
		assert_eq!(split_minutes(42.0), (42, 0));
		assert_eq!(split_minutes(42.5), (42, 30));
		assert_eq!(split_minutes(-0.5), (-1, 30));
		assert_eq!(split_minutes(-71.0), (-71, 0));
		assert_eq!(split_minutes(-71.05), (-72, 57));
		assert_eq!(split_minutes(-0.001), (0, 0));
		assert_eq!(split_minutes(-0.01), (-1, 59));
	}

	#[test]
	fn nearest_cell_wraps_longitude() {
		let cell = MinuteCell::nearest(10.0, 179.999);
		assert_eq!(cell.tile, TileKey { lat: 10, lon: -180 });
		assert_eq!(cell.lon_min, 0);

		let cell = MinuteCell::nearest(10.0, 200.0);
		assert_eq!(cell.tile, TileKey { lat: 10, lon: -160 });

		let cell = MinuteCell::nearest(-33.95, -118.4);
		assert_eq!(cell.tile, TileKey { lat: -34, lon: -119 });
		assert_eq!(cell.lat_min, 3);
		assert_eq!(cell.lon_min, 36);
	}

	#[test]
	fn entry_names() {
		assert_eq!(entry_name(-34, -119), "-34/-119");
		assert_eq!(archive_file_name(-34), "-34.zip");
		assert_eq!(parse_entry_name("-34/-119"), Some(TileKey { lat: -34, lon: -119 }));
		assert_eq!(parse_entry_name("42/180"), None);
		assert_eq!(parse_entry_name("42/-71/x"), None);
		assert_eq!(parse_entry_name("readme.txt"), None);
	}
}
