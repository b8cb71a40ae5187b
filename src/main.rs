use std::io::{ self, BufWriter };
use std::path::PathBuf;
use std::process;

use clap::{ ArgEnum, Parser };
use log::{ error, info, LevelFilter };

use tracer::{ Error, Result };
use tracer::consts::NUM_THREADS_ENV;
use tracer::scene::Scene;
use tracer::parallel;

#[derive(Debug, Clone, Copy, ArgEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Renders a JSON scene description to a PPM image.
#[derive(Parser)]
#[clap(name = "tracer", version, about)]
struct Args {
    /// Scene description (JSON)
    #[clap(parse(from_os_str))]
    scene: PathBuf,

    /// Where to write the PPM image; standard output if omitted
    #[clap(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Number of render threads; defaults to the available parallelism
    #[clap(short = 'n', long, env = NUM_THREADS_ENV)]
    num_threads: Option<usize>,

    /// Override the camera's horizontal size, in pixels
    #[clap(long)]
    width: Option<usize>,

    /// Override the camera's vertical size, in pixels
    #[clap(long)]
    height: Option<usize>,

    /// Logging level
    #[clap(long, arg_enum, default_value = "info")]
    log_level: LogLevel,
}

fn init_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let mut scene = Scene::load(&args.scene)?;

    if args.width.is_some() || args.height.is_some() {
        let width = args.width.unwrap_or(scene.camera.hsize);
        let height = args.height.unwrap_or(scene.camera.vsize);
        if width == 0 || height == 0 {
            return Err(Error::Scene(
                format!("image size must be non-zero, got {}x{}", width, height)
            ));
        }

        scene.camera.set_size(width, height);
    }

    let canvas = parallel::render(&scene.camera, &scene.world, args.num_threads)?;

    match args.output {
        Some(ref path) => {
            canvas.save(path)?;
            info!("saved render to {}", path.display());
        },
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            canvas.write_ppm(&mut out)?;
        },
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logger(args.log_level.into());

    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}
