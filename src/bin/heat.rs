use halo_heat::cli::*;
use halo_heat::error::*;
use halo_heat::output::*;
use halo_heat::solver::*;
use std::time::Instant;

fn run(args: &Args) -> HeatResult<f64> {
    let start = Instant::now();
    let config = args.solver_config(args.workers)?;
    let grid = run_threaded(&config)?;
    write_grid_file(&grid, &config.output)?;
    Ok(start.elapsed().as_secs_f64())
}

fn main() {
    let args = Args::cli_setup("heat");
    match run(&args) {
        Ok(seconds) => println!("Time is {:.15}", seconds),
        Err(e) => {
            eprintln!("heat: {}", e);
            std::process::exit(1);
        }
    }
}
