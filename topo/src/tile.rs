use std::fmt::Debug;

use crate::{LoadError, INVALID_ELEV, TILE_BYTES, TILE_SIDE};

/// One degree square of elevations, one per arc-minute.
#[derive(Clone, PartialEq, Eq)]
pub struct Tile {
	heights: Box<[i16]>,
}

impl Tile {
	pub fn filled(height: i16) -> Self {
		Self {
			heights: vec![height; TILE_SIDE * TILE_SIDE].into_boxed_slice(),
		}
	}

	/// `f(lat_min, lon_min)` for every cell, southern row first.
	pub fn from_fn(mut f: impl FnMut(usize, usize) -> i16) -> Self {
		let mut heights = Vec::with_capacity(TILE_SIDE * TILE_SIDE);
		for lat_min in 0..TILE_SIDE {
			for lon_min in 0..TILE_SIDE {
				heights.push(f(lat_min, lon_min));
			}
		}
		Self {
			heights: heights.into_boxed_slice(),
		}
	}

	pub fn from_le_bytes(name: &str, bytes: &[u8]) -> Result<Self, LoadError> {
		if bytes.len() != TILE_BYTES {
			return Err(LoadError::InvalidEntrySize {
				name: name.to_string(),
				size: bytes.len() as u64,
			});
		}

		Ok(Self {
			heights: bytes
				.chunks_exact(2)
				.map(|x| i16::from_le_bytes([x[0], x[1]]))
				.collect(),
		})
	}

	pub fn to_le_bytes(&self) -> Vec<u8> { self.heights.iter().flat_map(|x| x.to_le_bytes()).collect() }

	pub fn get(&self, lat_min: usize, lon_min: usize) -> i16 {
		debug_assert!(lat_min < TILE_SIDE && lon_min < TILE_SIDE, "Minute out of range");
		self.heights[lat_min * TILE_SIDE + lon_min]
	}

	pub fn set(&mut self, lat_min: usize, lon_min: usize, height: i16) {
		self.heights[lat_min * TILE_SIDE + lon_min] = height;
	}

	pub fn heights(&self) -> &[i16] { &self.heights }

	/// Lowest and highest valid heights, if there are any.
	pub fn min_max(&self) -> Option<(i16, i16)> {
		self.heights
			.iter()
			.copied()
			.filter(|&x| x != INVALID_ELEV)
			.fold(None, |acc, x| match acc {
				None => Some((x, x)),
				Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
			})
	}
}

impl Debug for Tile {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self.min_max() {
			Some((lo, hi)) => write!(f, "Tile({}..={}m)", lo, hi),
			None => write!(f, "Tile(no data)"),
		}
	}
}
