use std::{
	error::Error,
	fmt::{Debug, Display},
	io::BufRead,
	path::Path,
};

use chart::{nav::FT_PER_M, LatLon, LatLonBox};

/// Whatever went wrong inside a database query.
pub type QueryError = Box<dyn Error + Send + Sync>;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Runway {
	pub begin: LatLon,
	pub end: LatLon,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Obstruction {
	pub position: LatLon,
	/// Height of the top, in metres MSL.
	pub msl_m: f64,
}

/// The waypoint database, as far as collision detection is concerned.
pub trait RunwayQuery: Send + Sync {
	/// Runways with at least one end inside the box.
	fn runways_within(&self, area: &LatLonBox) -> Result<Vec<Runway>, QueryError>;
}

/// The obstruction database.
pub trait ObstructionQuery: Send + Sync {
	fn obstructions_within(&self, area: &LatLonBox) -> Result<Vec<Obstruction>, QueryError>;
}

pub enum CsvError {
	Parse { line: usize, message: String },
	Io(std::io::Error),
}

impl Display for CsvError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Parse { line, message } => write!(f, "Line {}: {}", line, message),
			Self::Io(x) => write!(f, "IO error: {}", x),
		}
	}
}

impl Debug for CsvError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result { Display::fmt(self, f) }
}

impl Error for CsvError {}

impl From<std::io::Error> for CsvError {
	fn from(x: std::io::Error) -> Self { Self::Io(x) }
}

/// Runways held in memory.
#[derive(Clone, Debug, Default)]
pub struct RunwayList {
	runways: Vec<Runway>,
}

impl RunwayList {
	pub fn new(runways: Vec<Runway>) -> Self { Self { runways } }

	/// One runway per line: `begin_lat,begin_lon,end_lat,end_lon`. Blank lines and lines starting with `#` are
	/// skipped.
	pub fn from_csv(reader: impl BufRead) -> Result<Self, CsvError> {
		let runways = parse_csv::<_, 4>(reader, |[begin_lat, begin_lon, end_lat, end_lon]| Runway {
			begin: LatLon::new(begin_lat, begin_lon),
			end: LatLon::new(end_lat, end_lon),
		})?;
		Ok(Self { runways })
	}

	pub fn load(path: &Path) -> Result<Self, CsvError> {
		Self::from_csv(std::io::BufReader::new(std::fs::File::open(path)?))
	}

	pub fn len(&self) -> usize { self.runways.len() }

	pub fn is_empty(&self) -> bool { self.runways.is_empty() }
}

impl RunwayQuery for RunwayList {
	fn runways_within(&self, area: &LatLonBox) -> Result<Vec<Runway>, QueryError> {
		Ok(self
			.runways
			.iter()
			.filter(|x| area.contains(x.begin) || area.contains(x.end))
			.copied()
			.collect())
	}
}

/// Obstructions held in memory.
#[derive(Clone, Debug, Default)]
pub struct ObstructionList {
	obstructions: Vec<Obstruction>,
}

impl ObstructionList {
	pub fn new(obstructions: Vec<Obstruction>) -> Self { Self { obstructions } }

	/// One obstruction per line: `lat,lon,msl_ft`, the way obstruction files publish heights.
	pub fn from_csv(reader: impl BufRead) -> Result<Self, CsvError> {
		let obstructions = parse_csv::<_, 3>(reader, |[lat, lon, msl_ft]| Obstruction {
			position: LatLon::new(lat, lon),
			msl_m: msl_ft / FT_PER_M,
		})?;
		Ok(Self { obstructions })
	}

	pub fn load(path: &Path) -> Result<Self, CsvError> {
		Self::from_csv(std::io::BufReader::new(std::fs::File::open(path)?))
	}

	pub fn len(&self) -> usize { self.obstructions.len() }

	pub fn is_empty(&self) -> bool { self.obstructions.is_empty() }
}

impl ObstructionQuery for ObstructionList {
	fn obstructions_within(&self, area: &LatLonBox) -> Result<Vec<Obstruction>, QueryError> {
		Ok(self
			.obstructions
			.iter()
			.filter(|x| area.contains(x.position))
			.copied()
			.collect())
	}
}

fn parse_csv<T, const N: usize>(reader: impl BufRead, make: impl Fn([f64; N]) -> T) -> Result<Vec<T>, CsvError> {
	let mut out = Vec::new();
	for (i, line) in reader.lines().enumerate() {
		let line = line?;
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}

		let fields: Vec<&str> = line.split(',').map(|x| x.trim()).collect();
		if fields.len() != N {
			return Err(CsvError::Parse {
				line: i + 1,
				message: format!("expected {} fields, found {}", N, fields.len()),
			});
		}

		let mut values = [0.0; N];
		for (value, field) in values.iter_mut().zip(fields) {
			*value = field.parse().map_err(|_| CsvError::Parse {
				line: i + 1,
				message: format!("invalid number {:?}", field),
			})?;
		}
		out.push(make(values));
	}

	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_runways() {
		let csv = "# KBED\n42.4614,-71.2951,42.4737,-71.2804\n\n42.4700, -71.3000, 42.4600, -71.2850\n";
		let list = RunwayList::from_csv(csv.as_bytes()).unwrap();
		assert_eq!(list.len(), 2);

		let area = LatLonBox::around(LatLon::new(42.47, -71.29), 1.0);
		assert_eq!(list.runways_within(&area).unwrap().len(), 2);
		let away = LatLonBox::around(LatLon::new(42.0, -71.0), 1.0);
		assert!(list.runways_within(&away).unwrap().is_empty());
	}

	#[test]
	fn reports_bad_lines() {
		let res = RunwayList::from_csv("42.0,-71.0,42.1\n".as_bytes());
		assert!(matches!(res, Err(CsvError::Parse { line: 1, .. })));
		let res = ObstructionList::from_csv("# header\n42.0,-71.0,tall\n".as_bytes());
		assert!(matches!(res, Err(CsvError::Parse { line: 2, .. })));
	}

	#[test]
	fn obstructions_in_feet_across_antimeridian() {
		let list = ObstructionList::from_csv("-16.5,179.999,1000\n-16.5,-179.999,2000\n-16.5,170,3000\n".as_bytes()).unwrap();
		let area = LatLonBox::new(-17.0, -16.0, 179.99, -179.99);
		let found = list.obstructions_within(&area).unwrap();
		assert_eq!(found.len(), 2);
		assert!((found[0].msl_m - 304.8).abs() < 0.01);
	}
}
