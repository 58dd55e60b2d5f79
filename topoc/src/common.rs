use std::{
	error::Error,
	io::Write,
	path::Path,
	sync::{
		atomic::{AtomicBool, AtomicUsize, Ordering},
		Arc,
	},
	time::Duration,
};

use rayon::prelude::*;
use topo::{archive_file_name, ArchiveBuilder};

pub type BandError = Box<dyn Error + Send + Sync>;

/// Builds one archive per latitude band in `output`, in parallel. Bands whose archive already exists are skipped, so an
/// interrupted run can be continued.
///
/// Returns `false` if any band failed or the run was interrupted.
pub fn for_band_in_output(
	output: &Path, bands: Vec<i16>, exec: impl Fn(i16, &mut ArchiveBuilder) -> Result<(), BandError> + Sync,
) -> bool {
	let was_quit = Arc::new(AtomicBool::new(false));
	let handler_used = was_quit.clone();
	let was_quit = &was_quit;

	let _ = ctrlc::set_handler(move || {
		if handler_used.load(Ordering::Acquire) {
			std::process::exit(1);
		}

		println!("\nFinishing up, press Ctrl + C again to exit immediately");
		handler_used.store(true, Ordering::Release);
	});

	if let Err(e) = std::fs::create_dir_all(output) {
		eprintln!("Could not create {}: {}", output.display(), e);
		return false;
	}

	let (done, todo): (Vec<_>, Vec<_>) = bands
		.into_iter()
		.partition(|&lat| output.join(archive_file_name(lat)).exists());
	if !done.is_empty() {
		println!("Continuing from last execution, {} bands already packed", done.len());
	}

	let bands = todo.len();
	let counter = AtomicUsize::new(0);
	let counter = &counter;
	let finished = AtomicBool::new(false);
	let finished = &finished;
	let had_error = AtomicBool::new(false);
	let had_error = &had_error;

	let _ = crossbeam::scope(move |scope| {
		scope.spawn(move |_| {
			while !finished.load(Ordering::Acquire) {
				print!("\r{}/{}", counter.load(Ordering::Relaxed), bands);
				let _ = std::io::stdout().flush();
				std::thread::sleep(Duration::from_millis(250));
			}
		});

		todo.into_par_iter().for_each(|lat| {
			tracy::zone!("Process band");
			if was_quit.load(Ordering::Acquire) {
				return;
			}

			let result = ArchiveBuilder::new(output, lat)
				.map_err(BandError::from)
				.and_then(|mut builder| {
					exec(lat, &mut builder)?;
					if builder.tile_count() > 0 {
						builder.finish()?;
					} else {
						builder.discard()?;
					}
					Ok(())
				});
			if let Err(e) = result {
				println!("\nError in band {}: {}", lat, e);
				had_error.store(true, Ordering::Release);
			}

			counter.fetch_add(1, Ordering::Relaxed);
		});

		finished.store(true, Ordering::Release);
	});

	println!("\r{}/{}", counter.load(Ordering::Relaxed), bands);
	!had_error.load(Ordering::Relaxed) && !was_quit.load(Ordering::Acquire)
}
