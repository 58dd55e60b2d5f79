use std::{
	collections::BTreeSet,
	error::Error,
	fmt::{Debug, Display},
	panic::{self, AssertUnwindSafe},
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
	thread::JoinHandle,
	time::{Duration, SystemTime, UNIX_EPOCH},
};

use chart::{
	nav::{self, KT_PER_MPS},
	LatLonBox,
};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use topo::{ElevationStore, TileSource, ZipTileSource, INVALID_ELEV};

use crate::{
	AircraftState,
	CellInfo,
	CellKey,
	CollisionCache,
	ObstructionQuery,
	PositionFeed,
	QueryError,
	RunwayQuery,
};

pub struct ScannerOptions {
	/// Time between scans. Scans start on whole multiples of this since the epoch.
	pub period: Duration,
	/// Below this ground speed nothing is scanned.
	pub min_speed_mps: f64,
	/// No scanning within this distance of a runway end.
	pub airport_radius_nm: f64,
	/// Nearest edge of the scanned fan, in seconds of flight.
	pub min_warn_secs: f64,
	/// Farthest edge of the scanned fan, in seconds of flight.
	pub max_warn_secs: f64,
	/// Half width of the fan, in degrees either side of the track.
	pub sweep_degs: f64,
	/// A runway cell within this many degrees of the track means we are landing.
	pub runway_degs: f64,
	/// Clearance required above terrain and obstructions, in metres.
	pub padding_m: f64,
}

impl Default for ScannerOptions {
	fn default() -> Self {
		ScannerOptions {
			period: Duration::from_secs(4),
			min_speed_mps: 3.0,
			airport_radius_nm: 3.0,
			min_warn_secs: 10.0,
			max_warn_secs: 120.0,
			sweep_degs: 30.0,
			runway_degs: 15.0,
			padding_m: 10.0,
		}
	}
}

pub enum ScanError {
	/// The airport proximity check couldn't be made.
	RunwayQuery(QueryError),
}

impl Display for ScanError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::RunwayQuery(x) => write!(f, "Runway lookup failed: {}", x),
		}
	}
}

impl Debug for ScanError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result { Display::fmt(self, f) }
}

impl Error for ScanError {}

/// The cells one scan found to be in the way.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HazardSet {
	cells: BTreeSet<CellKey>,
}

impl HazardSet {
	pub fn new() -> Self { Self::default() }

	pub fn contains(&self, key: CellKey) -> bool { self.cells.contains(&key) }

	pub fn len(&self) -> usize { self.cells.len() }

	pub fn is_empty(&self) -> bool { self.cells.is_empty() }

	pub fn iter(&self) -> impl Iterator<Item = CellKey> + '_ { self.cells.iter().copied() }

	/// The packed keys, in ascending order.
	pub fn packed(&self) -> Vec<i32> { self.cells.iter().map(|x| x.packed()).collect() }
}

impl FromIterator<CellKey> for HazardSet {
	fn from_iter<T: IntoIterator<Item = CellKey>>(iter: T) -> Self {
		Self {
			cells: iter.into_iter().collect(),
		}
	}
}

/// Where the latest [`HazardSet`] is published. Readers get whatever set was complete when they asked.
///
/// The lock is only ever held to copy or swap the `Arc`, never while a set is built or read.
#[derive(Default)]
pub struct HazardBoard {
	latest: RwLock<Arc<HazardSet>>,
}

impl HazardBoard {
	pub fn new() -> Self { Self::default() }

	pub fn latest(&self) -> Arc<HazardSet> { self.latest.read().clone() }

	pub fn publish(&self, set: HazardSet) { *self.latest.write() = Arc::new(set); }

	pub fn clear(&self) { self.publish(HazardSet::new()); }
}

/// The collision scan itself. Owns the per-cell cache and the previous fix, so it must be driven from one thread.
pub struct Scanner<S = ZipTileSource> {
	options: ScannerOptions,
	store: Arc<ElevationStore<S>>,
	runways: Arc<dyn RunwayQuery>,
	obstructions: Arc<dyn ObstructionQuery>,
	cache: CollisionCache,
	previous: Option<AircraftState>,
	/// Whether the aircraft was near an airport, and the cell it was in when that was checked.
	near_airport: Option<(CellKey, bool)>,
}

impl<S: TileSource> Scanner<S> {
	pub fn new(
		options: ScannerOptions, store: Arc<ElevationStore<S>>, runways: Arc<dyn RunwayQuery>,
		obstructions: Arc<dyn ObstructionQuery>,
	) -> Self {
		Self {
			options,
			store,
			runways,
			obstructions,
			cache: CollisionCache::new(),
			previous: None,
			near_airport: None,
		}
	}

	pub fn options(&self) -> &ScannerOptions { &self.options }

	pub fn cache(&self) -> &CollisionCache { &self.cache }

	pub fn store(&self) -> &Arc<ElevationStore<S>> { &self.store }

	/// Runs one scan for `state`, returning the cells that need a warning.
	pub fn run_cycle(&mut self, state: Option<AircraftState>, enabled: bool) -> Result<HazardSet, ScanError> {
		tracy::zone!("Collision Scan");

		let state = match state {
			Some(x) => x,
			None => return Ok(HazardSet::new()),
		};
		let previous = self.previous.replace(state);
		if !enabled || state.speed_mps < self.options.min_speed_mps {
			return Ok(HazardSet::new());
		}

		self.cache.next_cycle();

		let hazards = if self.near_airport(&state)? {
			HazardSet::new()
		} else {
			let climb = Self::climb_rate(&state, previous.as_ref());
			self.sweep(&state, climb)
		};

		let evicted = self.cache.evict_stale();
		log::trace!(
			"Scan {}: {} hazards, {} cells cached, {} evicted",
			self.cache.cycle(),
			hazards.len(),
			self.cache.len(),
			evicted
		);

		Ok(hazards)
	}

	fn near_airport(&mut self, state: &AircraftState) -> Result<bool, ScanError> {
		let here = CellKey::nearest(state.position);
		if let Some((cell, near)) = self.near_airport {
			if cell == here {
				return Ok(near);
			}
		}

		let radius = self.options.airport_radius_nm;
		let runways = self
			.runways
			.runways_within(&LatLonBox::around(state.position, radius))
			.map_err(ScanError::RunwayQuery)?;
		let near = runways.iter().any(|rwy| {
			nav::lat_lon_dist(state.position, rwy.begin) <= radius || nav::lat_lon_dist(state.position, rwy.end) <= radius
		});

		self.near_airport = Some((here, near));
		Ok(near)
	}

	/// Metres per mile, from the last two fixes, or zero if the previous fix is no use.
	fn climb_rate(state: &AircraftState, previous: Option<&AircraftState>) -> f64 {
		let previous = match previous {
			Some(x) if x.timestamp_ms < state.timestamp_ms => x,
			_ => return 0.0,
		};
		let dist = nav::lat_lon_dist(previous.position, state.position);
		if dist > 1e-6 {
			(state.altitude_m - previous.altitude_m) / dist
		} else {
			0.0
		}
	}

	fn sweep(&mut self, state: &AircraftState, climb: f64) -> HazardSet {
		let options = &self.options;
		let kt = state.speed_mps * KT_PER_MPS;
		let min_nm = kt * options.min_warn_secs / 3600.0;
		let max_nm = kt * options.max_warn_secs / 3600.0;

		let mut hazards = BTreeSet::new();
		let mut nm = (min_nm - 0.25).max(0.25);
		'range: while nm < max_nm + 0.25 {
			let alt = state.altitude_m + climb * nm;

			// Step about half a mile across the track.
			let step_deg = (0.5 / nm).to_degrees().min(options.sweep_degs);
			let steps = if step_deg > 0.0 {
				(options.sweep_degs / step_deg).ceil() as i32
			} else {
				0
			};

			for step in -steps..=steps {
				let delta = step_deg * step as f64;
				let key = CellKey::nearest(nav::project(state.position, state.heading_deg + delta, nm));

				let (store, runways, obstructions) = (&self.store, &self.runways, &self.obstructions);
				let info = self
					.cache
					.touch_or_insert_with(key, || Self::read_cell(store, &**runways, &**obstructions, key));

				let elevation = match info.elevation_m {
					Some(x) => x,
					None => continue,
				};
				if alt < elevation + options.padding_m {
					hazards.insert(key);

					if info.has_runway && delta.abs() < options.runway_degs {
						log::debug!("Runway ahead at {}, assuming a landing", key);
						hazards.clear();
						break 'range;
					}
				}
			}

			nm += 0.5;
		}

		HazardSet { cells: hazards }
	}

	/// Highest point within the cell, and whether a runway starts near it.
	fn read_cell(
		store: &ElevationStore<S>, runways: &dyn RunwayQuery, obstructions: &dyn ObstructionQuery, key: CellKey,
	) -> CellInfo {
		tracy::zone!("Read Cell");

		let center = key.center();
		let terrain = store.elev_metres(center.lat, center.lon);
		let mut elevation_m = (terrain != INVALID_ELEV).then(|| terrain as f64);

		let half = 0.5 / 60.0;
		let cell = LatLonBox::new(
			center.lat - half,
			center.lat + half,
			center.lon - half,
			center.lon + half,
		);
		match obstructions.obstructions_within(&cell) {
			Ok(found) => {
				for ob in found {
					if elevation_m.map_or(true, |x| x < ob.msl_m) {
						elevation_m = Some(ob.msl_m);
					}
				}
			},
			Err(e) => log::warn!("Obstruction lookup near {} failed: {}", key, e),
		}

		let area = LatLonBox::around(center, 1.0);
		let has_runway = match runways.runways_within(&area) {
			Ok(found) => found.iter().any(|x| area.contains(x.begin)),
			Err(e) => {
				log::warn!("Runway lookup near {} failed: {}", key, e);
				false
			},
		};

		CellInfo {
			elevation_m,
			has_runway,
		}
	}
}

impl<S: TileSource + 'static> Scanner<S> {
	/// Moves the scanner onto its own thread, scanning wherever `feed` says the aircraft is.
	///
	/// The thread is named but runs at normal priority, std has no portable way to lower it.
	pub fn spawn(
		self, feed: Arc<dyn PositionFeed>, board: Arc<HazardBoard>, enabled: bool,
	) -> std::io::Result<ScannerHandle> {
		let enabled = Arc::new(AtomicBool::new(enabled));
		let (stop, stopped) = channel::bounded(1);

		let thread = {
			let board = board.clone();
			let enabled = enabled.clone();
			std::thread::Builder::new()
				.name("Collision Scanner".to_string())
				.spawn(move || self.run(feed, board, enabled, stopped))?
		};

		Ok(ScannerHandle {
			board,
			enabled,
			stop: Some(stop),
			thread: Some(thread),
		})
	}

	fn run(mut self, feed: Arc<dyn PositionFeed>, board: Arc<HazardBoard>, enabled: Arc<AtomicBool>, stop: Receiver<()>) {
		loop {
			match stop.recv_timeout(until_next_period(SystemTime::now(), self.options.period)) {
				Err(RecvTimeoutError::Timeout) => {},
				Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
			}

			let state = feed.latest();
			let enabled = enabled.load(Ordering::Relaxed);
			match panic::catch_unwind(AssertUnwindSafe(|| self.run_cycle(state, enabled))) {
				Ok(Ok(hazards)) => board.publish(hazards),
				Ok(Err(e)) => {
					log::error!("Collision scan failed: {}", e);
					board.clear();
				},
				Err(_) => {
					log::error!("Collision scan panicked");
					board.clear();
				},
			}
		}

		board.clear();
		self.store.close_archive();
	}
}

/// Time from `now` to the next whole multiple of `period` since the epoch.
pub fn until_next_period(now: SystemTime, period: Duration) -> Duration {
	let period = period.as_nanos().max(1);
	let since = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
	Duration::from_nanos((period - since % period) as u64)
}

/// A scanner running on its own thread. Stops it when dropped.
pub struct ScannerHandle {
	board: Arc<HazardBoard>,
	enabled: Arc<AtomicBool>,
	stop: Option<Sender<()>>,
	thread: Option<JoinHandle<()>>,
}

impl ScannerHandle {
	pub fn board(&self) -> &Arc<HazardBoard> { &self.board }

	pub fn set_enabled(&self, enabled: bool) { self.enabled.store(enabled, Ordering::Relaxed); }

	pub fn is_enabled(&self) -> bool { self.enabled.load(Ordering::Relaxed) }

	/// Stops scanning and waits for the thread to exit. The board is left empty.
	pub fn stop(mut self) { self.shutdown(); }

	fn shutdown(&mut self) {
		if let Some(stop) = self.stop.take() {
			let _ = stop.send(());
		}
		if let Some(thread) = self.thread.take() {
			if thread.join().is_err() {
				log::error!("Collision scanner thread panicked");
			}
		}
		self.board.clear();
	}
}

impl Drop for ScannerHandle {
	fn drop(&mut self) { self.shutdown(); }
}
