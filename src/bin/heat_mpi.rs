use halo_heat::cli::*;
use halo_heat::comm::*;
use halo_heat::error::*;
use halo_heat::output::*;
use halo_heat::solver::*;
use std::time::Instant;

/// Returns elapsed seconds on the coordinator, `None` everywhere else.
fn run(comm: &MpiComm, args: &Args) -> HeatResult<Option<f64>> {
    let start = Instant::now();
    let config = args.solver_config(comm.size())?;
    match run_worker(comm, &config)? {
        Some(grid) => {
            write_grid_file(&grid, &config.output)?;
            Ok(Some(start.elapsed().as_secs_f64()))
        }
        None => Ok(None),
    }
}

fn main() {
    let args = Args::cli_setup("heat_mpi");
    let comm = match MpiComm::init() {
        Ok(comm) => comm,
        Err(e) => {
            eprintln!("heat_mpi: {}", e);
            std::process::exit(1);
        }
    };

    match run(&comm, &args) {
        Ok(Some(seconds)) => println!("Time is {:.15}", seconds),
        Ok(None) => {}
        Err(e) => {
            if comm.rank() == 0 {
                eprintln!("heat_mpi: {}", e);
            }
            comm.abort(1);
        }
    }
}
