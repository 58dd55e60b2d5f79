use std::{
	collections::HashMap,
	path::{Path, PathBuf},
};

use parking_lot::Mutex;

use crate::{LoadError, MinuteCell, Tile, TileKey, TopoArchive, INVALID_ELEV};

/// Where the [`ElevationStore`] gets its tiles from.
pub trait TileSource: Send {
	/// `None` if there is no data for the degree at all.
	fn load_tile(&mut self, key: TileKey) -> Option<Result<Tile, LoadError>>;

	/// Releases any open files. The next load reopens them.
	fn close(&mut self);
}

/// Reads tiles out of a directory of latitude band archives, keeping only the most recently used band open.
pub struct ZipTileSource {
	dir: PathBuf,
	open: Option<TopoArchive>,
}

impl ZipTileSource {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
			open: None,
		}
	}

	pub fn dir(&self) -> &Path { &self.dir }

	/// The latitude of the archive currently open.
	pub fn open_band(&self) -> Option<i16> { self.open.as_ref().map(|x| x.lat()) }
}

impl TileSource for ZipTileSource {
	fn load_tile(&mut self, key: TileKey) -> Option<Result<Tile, LoadError>> {
		if self.open_band() != Some(key.lat) {
			self.open = None;
			match TopoArchive::open(&self.dir, key.lat)? {
				Ok(archive) => self.open = Some(archive),
				Err(e) => return Some(Err(e)),
			}
		}

		self.open.as_mut()?.read_tile(key.lon)
	}

	fn close(&mut self) { self.open = None; }
}

struct Inner<S> {
	source: S,
	/// `None` for degrees with no data, or that failed to load.
	tiles: HashMap<TileKey, Option<Tile>>,
}

/// Arc-minute elevation lookups, with every tile that has been touched kept in memory until [`ElevationStore::purge`].
pub struct ElevationStore<S = ZipTileSource> {
	inner: Mutex<Inner<S>>,
}

impl ElevationStore<ZipTileSource> {
	/// A store over the archives in `dir`.
	pub fn open(dir: impl Into<PathBuf>) -> Self { Self::new(ZipTileSource::new(dir)) }
}

impl<S: TileSource> ElevationStore<S> {
	pub fn new(source: S) -> Self {
		Self {
			inner: Mutex::new(Inner {
				source,
				tiles: HashMap::new(),
			}),
		}
	}

	/// Elevation of the arc-minute cell nearest to the point, in metres MSL, or [`INVALID_ELEV`].
	pub fn elev_metres(&self, lat: f64, lon: f64) -> i16 {
		let cell = MinuteCell::nearest(lat, lon);

		let mut inner = self.inner.lock();
		let Inner { source, tiles } = &mut *inner;
		let tile = tiles
			.entry(cell.tile)
			.or_insert_with(|| Self::load(source, cell.tile));

		match tile {
			Some(tile) => tile.get(cell.lat_min, cell.lon_min),
			None => INVALID_ELEV,
		}
	}

	fn load(source: &mut S, key: TileKey) -> Option<Tile> {
		tracy::zone!("Load Tile");

		match source.load_tile(key)? {
			Ok(tile) => Some(tile),
			Err(e) => {
				log::error!("Failed to load topography {}/{}: {}", key.lat, key.lon, e);
				None
			},
		}
	}

	/// Forgets every cached tile and closes the open archive.
	pub fn purge(&self) {
		let mut inner = self.inner.lock();
		inner.tiles.clear();
		inner.source.close();
	}

	/// Closes the open archive but keeps the cache.
	pub fn close_archive(&self) { self.inner.lock().source.close(); }

	/// Number of degrees looked up so far, including the ones without data.
	pub fn cached_tiles(&self) -> usize { self.inner.lock().tiles.len() }

	pub fn with_source<R>(&self, f: impl FnOnce(&S) -> R) -> R { f(&self.inner.lock().source) }
}

#[cfg(test)]
mod tests {
	use std::io::{Error, ErrorKind};

	use super::*;

	#[derive(Default)]
	struct Counting {
		loads: Vec<TileKey>,
		closes: usize,
	}

	impl TileSource for Counting {
		fn load_tile(&mut self, key: TileKey) -> Option<Result<Tile, LoadError>> {
			self.loads.push(key);
			match (key.lat, key.lon) {
				(42, -72) => Some(Ok(Tile::from_fn(|lat_min, lon_min| (lat_min * 100 + lon_min) as i16))),
				(-34, -119) => Some(Ok(Tile::from_fn(|lat_min, lon_min| -((lat_min * 100 + lon_min) as i16)))),
				(0, 0) => Some(Err(LoadError::Io(Error::new(ErrorKind::Other, "bad sector")))),
				_ => None,
			}
		}

		fn close(&mut self) { self.closes += 1; }
	}

	#[test]
	fn loads_each_tile_once() {
		let store = ElevationStore::new(Counting::default());

		// 42.5N 71.5W is row 30, column 30 of 42/-72.
		assert_eq!(store.elev_metres(42.5, -71.5), 3030);
		assert_eq!(store.elev_metres(42.5, -71.5), 3030);
		assert_eq!(store.elev_metres(42.0, -72.0), 0);
		assert_eq!(store.elev_metres(42.99, -71.01), 5959);

		store.with_source(|x| assert_eq!(x.loads, vec![TileKey { lat: 42, lon: -72 }]));
		assert_eq!(store.cached_tiles(), 1);
	}

	#[test]
	fn negative_degrees() {
		let store = ElevationStore::new(Counting::default());
		// Row 3, column 36 of -34/-119.
		assert_eq!(store.elev_metres(-33.95, -118.4), -336);
		// Rounds up into the next tile north.
		assert_eq!(store.elev_metres(-34.0 - 0.4 / 60.0, -118.4), -36);
		assert_eq!(store.elev_metres(-33.0 - 0.4 / 60.0, -118.4), INVALID_ELEV);
	}

	#[test]
	fn caches_missing_and_failed_tiles() {
		let store = ElevationStore::new(Counting::default());
		assert_eq!(store.elev_metres(10.0, 10.0), INVALID_ELEV);
		assert_eq!(store.elev_metres(10.2, 10.2), INVALID_ELEV);
		assert_eq!(store.elev_metres(0.5, 0.5), INVALID_ELEV);
		assert_eq!(store.elev_metres(0.5, 0.5), INVALID_ELEV);

		store.with_source(|x| assert_eq!(x.loads.len(), 2));
		assert_eq!(store.cached_tiles(), 2);
	}

	#[test]
	fn purge_forgets_everything() {
		let store = ElevationStore::new(Counting::default());
		store.elev_metres(42.5, -71.5);
		store.close_archive();
		assert_eq!(store.cached_tiles(), 1);
		store.with_source(|x| assert_eq!(x.closes, 1));

		store.purge();
		assert_eq!(store.cached_tiles(), 0);
		assert_eq!(store.elev_metres(42.5, -71.5), 3030);
		store.with_source(|x| {
			assert_eq!(x.closes, 2);
			assert_eq!(x.loads.len(), 2);
		});
	}

	#[test]
	fn wraps_longitude() {
		let store = ElevationStore::new(Counting::default());
		assert_eq!(store.elev_metres(42.5, 288.5), 3030);
		store.with_source(|x| assert_eq!(x.loads, vec![TileKey { lat: 42, lon: -72 }]));
	}
}
