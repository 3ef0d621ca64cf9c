use crate::build_info;
use crate::error::*;
use crate::solver::*;
use clap::Parser;
use std::path::PathBuf;

/// Explicit 2D heat solver over row bands
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Initial field shape parameter a.
    #[arg(allow_negative_numbers = true, required_unless_present = "build_info")]
    pub alpha: Option<f64>,

    /// Grid size N, the grid is N x N.
    #[arg(required_unless_present = "build_info")]
    pub grid_size: Option<usize>,

    /// Simulated time horizon T.
    #[arg(allow_negative_numbers = true, required_unless_present = "build_info")]
    pub time_horizon: Option<f64>,

    /// Initial field shape parameter b.
    #[arg(allow_negative_numbers = true, required_unless_present = "build_info")]
    pub beta: Option<f64>,

    /// Number of in-process workers, ignored under MPI.
    #[arg(short, long, default_value = "1")]
    pub workers: usize,

    /// Rows per task in the local stencil update.
    #[arg(short, long, default_value = "16")]
    pub chunk_size: usize,

    /// The number of rayon threads to use, rayon picks when unset.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// File the final grid is written to.
    #[arg(short, long, default_value = "heat_result.txt")]
    pub output: PathBuf,

    /// Print build information and quit
    #[arg(long)]
    pub build_info: bool,
}

impl Args {
    pub fn parameters(&self) -> HeatResult<HeatParameters> {
        match (self.alpha, self.grid_size, self.time_horizon, self.beta) {
            (Some(alpha), Some(grid_size), Some(time_horizon), Some(beta)) => {
                Ok(HeatParameters {
                    alpha,
                    beta,
                    grid_size,
                    time_horizon,
                })
            }
            _ => Err(HeatError::invalid(
                "expected four arguments: alpha, grid size, time horizon, beta",
            )),
        }
    }

    /// Config for `workers` workers; the MPI binary passes the world size.
    pub fn solver_config(&self, workers: usize) -> HeatResult<SolverConfig> {
        let mut config = SolverConfig::new(self.parameters()?, workers);
        config.chunk_size = self.chunk_size;
        config.output = self.output.clone();
        config.validate()?;
        Ok(config)
    }

    /// Parse the command line and set up logging, profiling and the rayon pool.
    /// Usage errors exit with status 1; help, version and `--build-info` exit 0.
    pub fn cli_setup(name: &str) -> Self {
        env_logger::init();

        let args = match Args::try_parse() {
            Ok(args) => args,
            Err(e) if e.use_stderr() => {
                let _ = e.print();
                std::process::exit(1);
            }
            Err(e) => e.exit(),
        };

        if args.build_info {
            build_info::print_report(name);
            std::process::exit(0);
        }

        #[cfg(feature = "profile-with-puffin")]
        profiling::puffin::set_scopes_on(true);

        let mut pool = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("rayon_thread_{}", i));
        if let Some(threads) = args.threads {
            pool = pool.num_threads(threads);
        }
        if let Err(e) = pool.build_global() {
            eprintln!("{}: could not start thread pool: {}", name, e);
            std::process::exit(1);
        }
        log::debug!("{} {:?}", name, args);

        args
    }
}
