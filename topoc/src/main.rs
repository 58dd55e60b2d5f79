use clap::{Parser, Subcommand};

use crate::{elev::Elev, info::Info, lcc::Lcc, pack::Pack, scan::Scan};

mod common;
mod elev;
mod info;
mod lcc;
mod pack;
mod scan;

#[derive(Parser)]
struct Options {
	#[clap(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	Info(Info),
	Pack(Pack),
	Elev(Elev),
	Lcc(Lcc),
	Scan(Scan),
}

fn main() {
	env_logger::init();

	let opts: Options = Options::parse();
	match opts.command {
		Command::Info(info) => info::info(info),
		Command::Pack(pack) => pack::pack(pack),
		Command::Elev(elev) => elev::elev(elev),
		Command::Lcc(lcc) => lcc::lcc(lcc),
		Command::Scan(scan) => scan::scan(scan),
	}
}
