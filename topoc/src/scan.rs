use std::{path::PathBuf, sync::Arc, time::SystemTime};

use chart::{
	nav::{FT_PER_M, KT_PER_MPS},
	LatLon,
};
use clap::Args;
use colldet::{AircraftState, ObstructionList, RunwayList, Scanner, ScannerOptions};
use topo::ElevationStore;

#[derive(Args)]
/// Run the collision scan for a single position and print the cells in the way.
pub struct Scan {
	data: PathBuf,
	#[clap(long, allow_hyphen_values = true)]
	lat: f64,
	#[clap(long, allow_hyphen_values = true)]
	lon: f64,
	/// Altitude in feet MSL.
	#[clap(long, allow_hyphen_values = true)]
	alt_ft: f64,
	/// True track in degrees.
	#[clap(long, default_value_t = 0.0)]
	hdg: f64,
	/// Ground speed in knots.
	#[clap(long, default_value_t = 120.0)]
	kt: f64,
	/// CSV of runways, one `begin_lat,begin_lon,end_lat,end_lon` per line.
	#[clap(long)]
	runways: Option<PathBuf>,
	/// CSV of obstructions, one `lat,lon,msl_ft` per line.
	#[clap(long)]
	obstructions: Option<PathBuf>,
	/// Scans to run from the same fix.
	#[clap(short, long, default_value_t = 1)]
	cycles: u32,
}

pub fn scan(scan: Scan) {
	let runways = match scan.runways.as_deref().map(RunwayList::load).transpose() {
		Ok(x) => x.unwrap_or_default(),
		Err(e) => {
			eprintln!("Runways could not be loaded: {}", e);
			return;
		},
	};
	let obstructions = match scan.obstructions.as_deref().map(ObstructionList::load).transpose() {
		Ok(x) => x.unwrap_or_default(),
		Err(e) => {
			eprintln!("Obstructions could not be loaded: {}", e);
			return;
		},
	};
	println!("{} runways, {} obstructions", runways.len(), obstructions.len());

	let options = ScannerOptions::default();
	let period_ms = options.period.as_millis() as i64;
	let store = Arc::new(ElevationStore::open(&scan.data));
	let mut scanner = Scanner::new(options, store, Arc::new(runways), Arc::new(obstructions));

	let start_ms = SystemTime::now()
		.duration_since(SystemTime::UNIX_EPOCH)
		.map(|x| x.as_millis() as i64)
		.unwrap_or(0);
	for cycle in 0..scan.cycles {
		let state = AircraftState {
			position: LatLon::new(scan.lat, scan.lon),
			altitude_m: scan.alt_ft / FT_PER_M,
			heading_deg: scan.hdg,
			speed_mps: scan.kt / KT_PER_MPS,
			timestamp_ms: start_ms + cycle as i64 * period_ms,
		};

		let hazards = match scanner.run_cycle(Some(state), true) {
			Ok(x) => x,
			Err(e) => {
				eprintln!("Scan {} failed: {}", cycle + 1, e);
				continue;
			},
		};

		println!("Scan {}: {} cells", cycle + 1, hazards.len());
		for key in hazards.iter() {
			let center = key.center();
			match scanner.cache().get(key).and_then(|x| x.elevation_m) {
				Some(elev) => println!(
					"  {:08x} {:.4},{:.4} {:.0}m ({:.0}ft)",
					key.packed(),
					center.lat,
					center.lon,
					elev,
					elev * FT_PER_M
				),
				None => println!("  {:08x} {:.4},{:.4}", key.packed(), center.lat, center.lon),
			}
		}
	}
	println!("{} cells cached", scanner.cache().len());
}
