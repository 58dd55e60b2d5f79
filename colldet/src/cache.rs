use std::collections::HashMap;

use crate::CellKey;

/// Entries not touched for more than this many cycles are evicted.
pub const MAX_STALE_CYCLES: u64 = 5;

/// What the scanner knows about a cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CellInfo {
	/// Highest of terrain and obstructions, in metres MSL. `None` if there is no data at all.
	pub elevation_m: Option<f64>,
	/// A runway starts within a mile of the cell.
	pub has_runway: bool,
}

#[derive(Copy, Clone, Debug)]
struct Entry {
	cycle: u64,
	info: CellInfo,
}

/// Per-cell lookups, kept for a few cycles so consecutive sweeps over the same ground don't go back to the databases.
#[derive(Default)]
pub struct CollisionCache {
	entries: HashMap<CellKey, Entry>,
	cycle: u64,
}

impl CollisionCache {
	pub fn new() -> Self { Self::default() }

	pub fn cycle(&self) -> u64 { self.cycle }

	/// Starts a new cycle.
	pub fn next_cycle(&mut self) -> u64 {
		self.cycle += 1;
		self.cycle
	}

	/// Returns the cell's info, filling it in with `read` if it isn't cached, and marks it used this cycle.
	pub fn touch_or_insert_with(&mut self, key: CellKey, read: impl FnOnce() -> CellInfo) -> CellInfo {
		let cycle = self.cycle;
		let entry = self.entries.entry(key).or_insert_with(|| Entry { cycle, info: read() });
		entry.cycle = cycle;
		entry.info
	}

	pub fn get(&self, key: CellKey) -> Option<CellInfo> { self.entries.get(&key).map(|x| x.info) }

	/// Drops the entries last used more than [`MAX_STALE_CYCLES`] cycles ago, returning how many went.
	pub fn evict_stale(&mut self) -> usize {
		let before = self.entries.len();
		let cycle = self.cycle;
		self.entries.retain(|_, x| x.cycle + MAX_STALE_CYCLES >= cycle);
		before - self.entries.len()
	}

	pub fn len(&self) -> usize { self.entries.len() }

	pub fn is_empty(&self) -> bool { self.entries.is_empty() }

	pub fn clear(&mut self) { self.entries.clear(); }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn flat(m: f64) -> CellInfo {
		CellInfo {
			elevation_m: Some(m),
			has_runway: false,
		}
	}

	#[test]
	fn reads_once() {
		let mut cache = CollisionCache::new();
		cache.next_cycle();
		let key = CellKey::from_minutes(2520, -4264);

		let mut reads = 0;
		for _ in 0..3 {
			let info = cache.touch_or_insert_with(key, || {
				reads += 1;
				flat(600.0)
			});
			assert_eq!(info, flat(600.0));
		}
		assert_eq!(reads, 1);
	}

	#[test]
	fn evicts_after_five_idle_cycles() {
		let mut cache = CollisionCache::new();
		let old = CellKey::from_minutes(1, 1);
		let busy = CellKey::from_minutes(2, 2);

		cache.next_cycle();
		cache.touch_or_insert_with(old, || flat(1.0));
		for _ in 0..5 {
			cache.next_cycle();
			cache.touch_or_insert_with(busy, || flat(2.0));
			assert_eq!(cache.evict_stale(), 0);
		}
		assert_eq!(cache.len(), 2);

		// Cycle 7: `old` was last used in cycle 1.
		cache.next_cycle();
		cache.touch_or_insert_with(busy, || flat(2.0));
		assert_eq!(cache.evict_stale(), 1);
		assert_eq!(cache.get(old), None);
		assert_eq!(cache.get(busy), Some(flat(2.0)));
	}
}
