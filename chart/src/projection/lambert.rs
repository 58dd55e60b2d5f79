use std::f64::consts::{FRAC_PI_2, PI};

use super::{ProjectionError, WorldFile};
use crate::{
	lonlat::normal_lon,
	nav::{M_PER_NM, NM_PER_DEG},
	LatLon,
	PixelPoint,
};

/// Upper bound on latitude refinement steps in [`LambertProjection::pixel_to_lat_lon`]. Real charts settle in three
/// or four.
pub const MAX_ITERATIONS: u32 = 50;

const METRES_PER_RADIAN: f64 = M_PER_NM * NM_PER_DEG * 180.0 / PI;

/// The ellipsoid and cone of a Lambert Conformal Conic chart, in degrees and metres.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LambertParams {
	pub center_lat: f64,
	pub center_lon: f64,
	pub std_parallel_1: f64,
	pub std_parallel_2: f64,
	pub semi_major_m: f64,
	pub semi_minor_m: f64,
}

/// Ellipsoidal Lambert Conformal Conic projection, used by sectionals and other VFR charts.
///
/// Formulae from Snyder, *Map Projections: A Working Manual* (USGS Professional Paper 1395), pp. 107-108.
#[derive(Clone, Debug)]
pub struct LambertProjection {
	e: f64,
	f_a: f64,
	lam0: f64,
	n: f64,
	phi0: f64,
	rho0: f64,
	pixel_to_en: WorldFile,
	en_to_pixel: WorldFile,
	pixel_size_m: f64,
}

impl LambertProjection {
	/// `pixel_to_en` is the chart's world file, mapping image pixels to easting/northing in metres.
	pub fn new(params: LambertParams, pixel_to_en: WorldFile) -> Result<Self, ProjectionError> {
		let en_to_pixel = pixel_to_en.invert()?;

		let lam0 = params.center_lon.to_radians();
		let phi0 = params.center_lat.to_radians();
		let phi1 = params.std_parallel_1.to_radians();
		let phi2 = params.std_parallel_2.to_radians();
		let (a, b) = (params.semi_major_m, params.semi_minor_m);
		let e = (1.0 - (b * b) / (a * a)).sqrt();

		// 14-15
		let m1 = eq14_15(e, phi1);
		let m2 = eq14_15(e, phi2);
		// 15-9a
		let t0 = eq15_9a(e, phi0);
		let t1 = eq15_9a(e, phi1);
		let t2 = eq15_9a(e, phi2);
		// 15-8, or 15-4 for a tangent cone
		let n = if (phi1 - phi2).abs() < 1e-12 {
			phi1.sin()
		} else {
			(m1.ln() - m2.ln()) / (t1.ln() - t2.ln())
		};
		// 15-10
		let f = m1 / (n * t1.powf(n));
		let f_a = f * a;
		// 15-7a
		let rho0 = f_a * t0.powf(n);

		Ok(Self {
			e,
			f_a,
			lam0,
			n,
			phi0,
			rho0,
			pixel_to_en,
			en_to_pixel,
			pixel_size_m: pixel_to_en.y_gradient(),
		})
	}

	pub fn lat_lon_to_pixel(&self, pos: LatLon) -> PixelPoint {
		let (easting, northing) = self.lat_lon_to_en(pos);
		let (x, y) = self.en_to_pixel.apply(easting, northing);
		PixelPoint { x, y }
	}

	/// Iterates on latitude until the northing it implies is within a pixel of the target.
	pub fn pixel_to_lat_lon(&self, pixel: PixelPoint) -> Result<LatLon, ProjectionError> {
		let (easting, northing) = self.pixel_to_en.apply(pixel.x, pixel.y);

		// 14-11, with the signs flipped for a cone opening northwards
		let theta = if self.n >= 0.0 {
			easting.atan2(self.rho0 - northing)
		} else {
			(-easting).atan2(northing - self.rho0)
		};
		let lam = theta / self.n + self.lam0;
		let cos_theta = theta.cos();

		let mut phi = self.phi0;
		let mut residual = f64::NAN;
		for _ in 0..MAX_ITERATIONS {
			let rho = self.f_a * eq15_9a(self.e, phi).powf(self.n);
			residual = northing - (self.rho0 - rho * cos_theta);
			phi += residual / METRES_PER_RADIAN;

			if residual.abs() <= self.pixel_size_m {
				return Ok(LatLon {
					lat: phi.to_degrees(),
					lon: normal_lon(lam.to_degrees()),
				});
			}
		}

		log::debug!(
			"Lambert inverse of ({}, {}) gave up with {}m residual",
			pixel.x,
			pixel.y,
			residual
		);
		Err(ProjectionError::NonConvergent {
			iterations: MAX_ITERATIONS,
			residual_m: residual,
		})
	}

	/// Metres east of the central meridian and north of the origin latitude.
	pub fn lat_lon_to_en(&self, pos: LatLon) -> (f64, f64) {
		let phi = pos.lat.clamp(-90.0, 90.0).to_radians();
		let mut lam = pos.lon.to_radians();
		while lam < self.lam0 - PI {
			lam += 2.0 * PI;
		}
		while lam > self.lam0 + PI {
			lam -= 2.0 * PI;
		}

		// 15-7
		let rho = self.f_a * eq15_9a(self.e, phi).powf(self.n);
		// 14-4
		let theta = self.n * (lam - self.lam0);
		// 14-1, 14-2
		(rho * theta.sin(), self.rho0 - rho * theta.cos())
	}

	/// Ground size of one chart pixel, in metres of northing.
	pub fn pixel_size_m(&self) -> f64 { self.pixel_size_m }

	pub fn cone_constant(&self) -> f64 { self.n }
}

fn eq14_15(e: f64, phi: f64) -> f64 {
	let w = e * phi.sin();
	phi.cos() / (1.0 - w * w).sqrt()
}

fn eq15_9a(e: f64, phi: f64) -> f64 {
	let phi = phi.clamp(-FRAC_PI_2, FRAC_PI_2);
	let sin_phi = phi.sin();
	let u = (1.0 - sin_phi) / (1.0 + sin_phi);
	let v = (1.0 + e * sin_phi) / (1.0 - e * sin_phi);
	(u * v.powf(e)).sqrt()
}
