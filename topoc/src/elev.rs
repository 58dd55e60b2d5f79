use std::path::PathBuf;

use chart::nav::FT_PER_M;
use clap::Args;
use topo::{ElevationStore, MinuteCell, INVALID_ELEV};

#[derive(Args)]
/// Look up the elevation of the arc-minute cell nearest to a point.
pub struct Elev {
	data: PathBuf,
	#[clap(allow_hyphen_values = true)]
	lat: f64,
	#[clap(allow_hyphen_values = true)]
	lon: f64,
}

pub fn elev(elev: Elev) {
	let store = ElevationStore::open(&elev.data);
	let cell = MinuteCell::nearest(elev.lat, elev.lon);

	match store.elev_metres(elev.lat, elev.lon) {
		INVALID_ELEV => println!(
			"No data for {}/{} minute {},{}",
			cell.tile.lat, cell.tile.lon, cell.lat_min, cell.lon_min
		),
		m => println!("{}m ({:.0}ft)", m, m as f64 * FT_PER_M),
	}
}
