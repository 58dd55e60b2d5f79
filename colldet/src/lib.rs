//! Terrain and obstruction collision detection.
//!
//! A [`Scanner`] sweeps a fan of arc-minute cells ahead of the aircraft every few seconds and publishes the cells it
//! would hit to a [`HazardBoard`], which the display reads whenever it likes.

use chart::LatLon;
use parking_lot::RwLock;

mod cache;
pub use cache::*;
mod cell;
pub use cell::*;
mod obstacles;
pub use obstacles::*;
mod scanner;
pub use scanner::*;

/// A position fix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AircraftState {
	pub position: LatLon,
	/// Metres MSL.
	pub altitude_m: f64,
	/// True track, in degrees.
	pub heading_deg: f64,
	/// Ground speed.
	pub speed_mps: f64,
	/// Time of the fix, in milliseconds since the Unix epoch.
	pub timestamp_ms: i64,
}

/// Anything that can report where the aircraft is. Must never block waiting for a new fix.
pub trait PositionFeed: Send + Sync {
	fn latest(&self) -> Option<AircraftState>;
}

/// The most recent fix, written by whoever talks to the GPS.
#[derive(Default)]
pub struct SharedPosition {
	state: RwLock<Option<AircraftState>>,
}

impl SharedPosition {
	pub fn new() -> Self { Self::default() }

	pub fn update(&self, state: AircraftState) { *self.state.write() = Some(state); }

	/// Forget the fix, e.g. when the receiver loses lock.
	pub fn clear(&self) { *self.state.write() = None; }
}

impl PositionFeed for SharedPosition {
	fn latest(&self) -> Option<AircraftState> { *self.state.read() }
}
