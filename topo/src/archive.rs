use std::{
	collections::BTreeMap,
	fs::File,
	io::{Cursor, Read},
	path::{Path, PathBuf},
};

use memmap2::Mmap;
use zip::ZipArchive;

use crate::{archive_file_name, parse_entry_name, LoadError, Tile, TILE_BYTES};

/// One latitude band of topography, memory-mapped.
pub struct TopoArchive {
	lat: i16,
	path: PathBuf,
	zip: ZipArchive<Cursor<Mmap>>,
	/// Longitude to entry index, for the usable entries only.
	entries: BTreeMap<i16, usize>,
}

impl TopoArchive {
	/// Opens `{dir}/{lat}.zip`, or returns `None` if the band has no archive.
	pub fn open(dir: &Path, lat: i16) -> Option<Result<Self, LoadError>> {
		let path = dir.join(archive_file_name(lat));
		if !path.is_file() {
			return None;
		}
		Some(Self::load(path, lat))
	}

	/// Opens an archive anywhere, taking its latitude from the file name.
	pub fn open_path(path: &Path) -> Result<Self, LoadError> {
		let lat = path
			.file_stem()
			.and_then(|x| x.to_str())
			.and_then(|x| x.parse::<i16>().ok())
			.filter(|x| (-90..90).contains(x))
			.ok_or_else(|| LoadError::InvalidFileName(path.to_path_buf()))?;
		Self::load(path.to_path_buf(), lat)
	}

	fn load(path: PathBuf, lat: i16) -> Result<Self, LoadError> {
		tracy::zone!("Open Archive");

		let file = File::open(&path)?;
		let data = unsafe { Mmap::map(&file)? };
		let mut zip = ZipArchive::new(Cursor::new(data))?;

		let mut entries = BTreeMap::new();
		for i in 0..zip.len() {
			let entry = zip.by_index_raw(i)?;
			match parse_entry_name(entry.name()) {
				Some(key) if key.lat == lat && entry.size() == TILE_BYTES as u64 => {
					entries.insert(key.lon, i);
				},
				_ => log::debug!("Ignoring entry {} in {}", entry.name(), path.display()),
			}
		}

		Ok(Self {
			lat,
			path,
			zip,
			entries,
		})
	}

	pub fn lat(&self) -> i16 { self.lat }

	pub fn path(&self) -> &Path { &self.path }

	pub fn tile_exists(&self, lon: i16) -> bool { self.entries.contains_key(&lon) }

	pub fn tile_count(&self) -> usize { self.entries.len() }

	/// Longitudes that have a tile, west to east.
	pub fn tile_lons(&self) -> impl Iterator<Item = i16> + '_ { self.entries.keys().copied() }

	pub fn read_tile(&mut self, lon: i16) -> Option<Result<Tile, LoadError>> {
		let index = *self.entries.get(&lon)?;
		Some(self.read_index(index))
	}

	fn read_index(&mut self, index: usize) -> Result<Tile, LoadError> {
		tracy::zone!("Read Tile");

		let mut entry = self.zip.by_index(index)?;
		let mut data = Vec::with_capacity(TILE_BYTES);
		entry.read_to_end(&mut data)?;
		Tile::from_le_bytes(entry.name(), &data)
	}
}
