use chart::{LambertParams, LambertProjection, LatLon, PixelPoint, WorldFile};
use clap::Args;

#[derive(Args)]
/// Convert between a Lambert Conformal Conic chart's pixels and latitude/longitude.
pub struct Lcc {
	#[clap(long, allow_hyphen_values = true)]
	center_lat: f64,
	#[clap(long, allow_hyphen_values = true)]
	center_lon: f64,
	#[clap(long, allow_hyphen_values = true)]
	std_parallel_1: f64,
	#[clap(long, allow_hyphen_values = true)]
	std_parallel_2: f64,
	#[clap(long, default_value_t = 6378137.0)]
	semi_major: f64,
	#[clap(long, default_value_t = 6356752.3142)]
	semi_minor: f64,
	/// The chart's world file, as six comma separated coefficients.
	#[clap(short, long, allow_hyphen_values = true)]
	world: String,
	#[clap(long, allow_hyphen_values = true, requires = "lon", conflicts_with_all = &["x", "y"])]
	lat: Option<f64>,
	#[clap(long, allow_hyphen_values = true, requires = "lat")]
	lon: Option<f64>,
	#[clap(short, allow_hyphen_values = true, requires = "y")]
	x: Option<f64>,
	#[clap(short, allow_hyphen_values = true, requires = "x")]
	y: Option<f64>,
}

pub fn lcc(lcc: Lcc) {
	let world = match parse_world_file(&lcc.world) {
		Some(x) => x,
		None => {
			eprintln!("World file must be six comma separated numbers");
			return;
		},
	};
	let params = LambertParams {
		center_lat: lcc.center_lat,
		center_lon: lcc.center_lon,
		std_parallel_1: lcc.std_parallel_1,
		std_parallel_2: lcc.std_parallel_2,
		semi_major_m: lcc.semi_major,
		semi_minor_m: lcc.semi_minor,
	};
	let proj = match LambertProjection::new(params, world) {
		Ok(x) => x,
		Err(e) => {
			eprintln!("Invalid projection: {}", e);
			return;
		},
	};

	match (lcc.lat, lcc.lon, lcc.x, lcc.y) {
		(Some(lat), Some(lon), ..) => {
			let pixel = proj.lat_lon_to_pixel(LatLon::new(lat, lon));
			println!("{:.3} {:.3}", pixel.x, pixel.y);
		},
		(.., Some(x), Some(y)) => match proj.pixel_to_lat_lon(PixelPoint::new(x, y)) {
			Ok(pos) => println!("{:.6} {:.6}", pos.lat, pos.lon),
			Err(e) => eprintln!("{}", e),
		},
		_ => eprintln!("Give either --lat and --lon, or -x and -y"),
	}
}

fn parse_world_file(s: &str) -> Option<WorldFile> {
	let mut out = [0.0; 6];
	let mut fields = s.split(',');
	for x in out.iter_mut() {
		*x = fields.next()?.trim().parse().ok()?;
	}
	if fields.next().is_some() {
		return None;
	}

	Some(WorldFile::from_array(out))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn world_file_needs_six_numbers() {
		let w = parse_world_file("42.3, 0, 0, -42.3, -360000, 250000").unwrap();
		assert_eq!(w.to_array(), [42.3, 0.0, 0.0, -42.3, -360000.0, 250000.0]);
		assert!(parse_world_file("1,2,3,4,5").is_none());
		assert!(parse_world_file("1,2,3,4,5,6,7").is_none());
		assert!(parse_world_file("1,2,3,four,5,6").is_none());
	}
}
