//! Georeferencing for aeronautical charts.
//!
//! Converts between latitude/longitude and pixel space for the three kinds of georeferenced chart the map knows
//! about (affine world files, bilinear fits and Lambert Conformal Conic sectionals), and between the four visible
//! corners of the display and canvas pixels.
//!
//! ## Conventions
//! * Angles are in degrees unless a name says otherwise.
//! * Longitudes are normalised to `-180.0..180.0` on output. Anything that compares longitudes goes through
//!   [`westmost`], [`eastmost`] or [`LatLonBox`] so that the antimeridian is handled.
//! * Pixel rows increase downwards.

mod linalg;
pub use linalg::*;
mod lonlat;
pub use lonlat::*;
pub mod nav;
mod pixel_mapper;
pub use pixel_mapper::*;
pub mod projection;
pub use projection::{AffineProjection, BilinearProjection, LambertParams, LambertProjection, Projection, WorldFile};

use std::fmt::{Debug, Display};

/// A point on the earth, in degrees.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LatLon {
	pub lat: f64,
	pub lon: f64,
}

impl LatLon {
	pub const fn new(lat: f64, lon: f64) -> Self { Self { lat, lon } }
}

impl Display for LatLon {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let ns = if self.lat < 0.0 { 'S' } else { 'N' };
		let ew = if self.lon < 0.0 { 'W' } else { 'E' };
		write!(f, "{:.6}{} {:.6}{}", self.lat.abs(), ns, self.lon.abs(), ew)
	}
}

/// A point in some raster's pixel space (a chart bitmap, or the canvas).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PixelPoint {
	pub x: f64,
	pub y: f64,
}

impl PixelPoint {
	pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
}
