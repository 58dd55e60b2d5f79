use std::{fmt::Display, path::PathBuf};

use clap::Args;
use topo::TopoArchive;

#[derive(Args)]
/// Give information about a topography archive.
pub struct Info {
	input: PathBuf,
}

struct Size(u64);

impl Display for Size {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let size = self.0;
		if size < 1000 {
			write!(f, "{} B", size)
		} else if size < 1000 * 1000 {
			write!(f, "{:.2} KB", size as f64 / 1000.0)
		} else {
			write!(f, "{:.2} MB", size as f64 / 1000.0 / 1000.0)
		}
	}
}

pub fn info(info: Info) {
	let mut archive = match TopoArchive::open_path(&info.input) {
		Ok(x) => x,
		Err(err) => {
			eprintln!("archive could not be loaded: {}", err);
			return;
		},
	};

	println!("Archive");
	println!("  Latitude: {}", archive.lat());
	if let Ok(meta) = std::fs::metadata(&info.input) {
		println!("  Size: {}", Size(meta.len()));
	}

	println!();

	let lons: Vec<_> = archive.tile_lons().collect();
	let mut range: Option<(i16, i16)> = None;
	let mut empty = 0;
	for lon in lons {
		match archive.read_tile(lon) {
			Some(Ok(tile)) => match tile.min_max() {
				Some((lo, hi)) => {
					range = Some(range.map_or((lo, hi), |(a, b)| (a.min(lo), b.max(hi))));
				},
				None => empty += 1,
			},
			Some(Err(e)) => eprintln!("  Tile {} could not be read: {}", lon, e),
			None => {},
		}
	}

	println!("Tiles");
	println!("  Tile count: {}", archive.tile_count());
	println!("  Tiles without data: {}", empty);
	if let Some((lo, hi)) = range {
		println!("  Elevation: {}m to {}m", lo, hi);
	}
}
