use std::{
	fs::File,
	io::{BufWriter, Write},
	path::{Path, PathBuf},
};

use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{archive_file_name, entry_name, LoadError, Tile};

/// Writes one latitude band archive.
///
/// The archive is written next to its final location and only renamed into place by [`ArchiveBuilder::finish`], so a
/// reader never sees a half-written band.
pub struct ArchiveBuilder {
	lat: i16,
	path: PathBuf,
	partial: PathBuf,
	zip: ZipWriter<BufWriter<File>>,
	compression: CompressionMethod,
	tile_count: usize,
}

impl ArchiveBuilder {
	pub fn new(dir: &Path, lat: i16) -> Result<Self, LoadError> {
		assert!((-90..90).contains(&lat), "Latitude out of range");

		let path = dir.join(archive_file_name(lat));
		let partial = dir.join(format!("{}.partial", archive_file_name(lat)));
		let file = File::create(&partial)?;

		Ok(Self {
			lat,
			path,
			partial,
			zip: ZipWriter::new(BufWriter::new(file)),
			compression: CompressionMethod::Deflated,
			tile_count: 0,
		})
	}

	/// Store tiles added from now on without compressing them.
	pub fn stored(mut self) -> Self {
		self.compression = CompressionMethod::Stored;
		self
	}

	pub fn add_tile(&mut self, lon: i16, tile: &Tile) -> Result<(), LoadError> {
		assert!((-180..180).contains(&lon), "Longitude out of range");

		tracy::zone!("Add Tile");
		let options = SimpleFileOptions::default().compression_method(self.compression);
		self.zip.start_file(entry_name(self.lat, lon), options)?;
		self.zip.write_all(&tile.to_le_bytes())?;
		self.tile_count += 1;

		Ok(())
	}

	pub fn tile_count(&self) -> usize { self.tile_count }

	/// Writes the central directory and moves the archive into place.
	pub fn finish(self) -> Result<PathBuf, LoadError> {
		tracy::zone!("Finish Archive");

		let mut out = self.zip.finish()?;
		out.flush()?;
		drop(out);
		std::fs::rename(&self.partial, &self.path)?;

		Ok(self.path)
	}

	/// Throws away everything written so far.
	pub fn discard(self) -> Result<(), LoadError> {
		drop(self.zip);
		std::fs::remove_file(&self.partial)?;
		Ok(())
	}
}
