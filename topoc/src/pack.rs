use std::path::{Path, PathBuf};

use clap::Args;
use topo::{entry_name, ArchiveBuilder, Tile};

use crate::common::{for_band_in_output, BandError};

#[derive(Args)]
/// Pack a directory of loose `{lat}/{lon}` tiles into one archive per latitude.
pub struct Pack {
	input: PathBuf,
	#[clap(short = 'o', long = "output")]
	output: PathBuf,
}

pub fn pack(pack: Pack) {
	let bands = match numbered_entries(&pack.input, -90..90) {
		Ok(x) => x,
		Err(err) => {
			eprintln!("Could not read {}: {}", pack.input.display(), err);
			return;
		},
	};
	if bands.is_empty() {
		eprintln!("No latitude directories in {}", pack.input.display());
		return;
	}

	let ok = for_band_in_output(&pack.output, bands, |lat, builder| pack_band(&pack.input, lat, builder));
	if !ok {
		eprintln!("Some bands were not packed");
	}
}

fn pack_band(input: &Path, lat: i16, builder: &mut ArchiveBuilder) -> Result<(), BandError> {
	let dir = input.join(lat.to_string());
	for lon in numbered_entries(&dir, -180..180)? {
		let name = entry_name(lat, lon);
		let data = std::fs::read(dir.join(lon.to_string()))?;
		match Tile::from_le_bytes(&name, &data) {
			Ok(tile) => builder.add_tile(lon, &tile)?,
			Err(e) => log::warn!("Skipping {}: {}", name, e),
		}
	}

	Ok(())
}

/// The entries of `dir` whose names are integers in `range`, sorted.
fn numbered_entries(dir: &Path, range: std::ops::Range<i16>) -> Result<Vec<i16>, std::io::Error> {
	let mut out = Vec::new();
	for entry in std::fs::read_dir(dir)? {
		let entry = entry?;
		if let Some(x) = entry.file_name().to_str().and_then(|x| x.parse::<i16>().ok()) {
			if range.contains(&x) {
				out.push(x);
			}
		}
	}
	out.sort_unstable();
	Ok(out)
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;
	use topo::TopoArchive;

	use super::*;

	#[test]
	fn packs_loose_tiles() {
		let raw = TempDir::new().unwrap();
		let out = TempDir::new().unwrap();

		let tile = Tile::from_fn(|lat_min, lon_min| (lat_min + lon_min) as i16);
		std::fs::create_dir_all(raw.path().join("42")).unwrap();
		std::fs::write(raw.path().join("42").join("-71"), tile.to_le_bytes()).unwrap();
		std::fs::write(raw.path().join("42").join("-72"), [0; 10]).unwrap();
		std::fs::write(raw.path().join("42").join("notes"), b"hello").unwrap();
		// Nothing usable, so no archive.
		std::fs::create_dir_all(raw.path().join("-5")).unwrap();

		assert_eq!(numbered_entries(raw.path(), -90..90).unwrap(), vec![-5, 42]);
		assert!(for_band_in_output(out.path(), vec![-5, 42], |lat, builder| pack_band(
			raw.path(),
			lat,
			builder
		)));

		let mut archive = TopoArchive::open(out.path(), 42).unwrap().unwrap();
		assert_eq!(archive.tile_lons().collect::<Vec<_>>(), vec![-71]);
		assert_eq!(archive.read_tile(-71).unwrap().unwrap(), tile);
		assert!(TopoArchive::open(out.path(), -5).is_none());
		assert!(!out.path().join("-5.zip.partial").exists());
	}
}
