use std::error::Error;
use std::path::PathBuf;

use log::info;
use structopt::StructOpt;

use mandelpool::coord::{Point, PlaneRect};
use mandelpool::painter::Palette;
use mandelpool::{Action, EngineConfig, Explorer, KernelKind};

/// Renders one Mandelbrot frame to a PNG.
#[derive(Debug, StructOpt)]
#[structopt(name = "mandelpool-imagegen")]
struct Opt {
    /// Image width in pixels
    #[structopt(short, long, default_value = "1280")]
    width: usize,

    /// Image height in pixels
    #[structopt(long, default_value = "720")]
    height: usize,

    /// Iteration cap
    #[structopt(short = "n", long, default_value = "128")]
    cap: u32,

    /// Worker threads [default: logical CPUs]
    #[structopt(short = "t", long)]
    workers: Option<usize>,

    /// Escape-time kernel: simd or scalar
    #[structopt(short, long, default_value = "simd")]
    kernel: KernelKind,

    /// Real part of the image center
    #[structopt(long, default_value = "-0.5", allow_hyphen_values = true)]
    center_re: f64,

    /// Imaginary part of the image center
    #[structopt(long, default_value = "0.0", allow_hyphen_values = true)]
    center_im: f64,

    /// Width of the plane window before zooming
    #[structopt(long, default_value = "3.0")]
    span: f64,

    /// Magnification applied at the image center
    #[structopt(short, long, default_value = "1.0")]
    zoom: f64,

    /// Color palette: sinusoidal or greyscale
    #[structopt(short, long, default_value = "sinusoidal")]
    palette: Palette,

    #[structopt(short, long, parse(from_os_str), default_value = "out.png")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let opt = Opt::from_args();

    let aspect = opt.height as f64 / opt.width.max(1) as f64;
    let plane = PlaneRect::from_box(opt.center_re, opt.center_im, opt.span, opt.span * aspect);
    let mut config = EngineConfig::new(opt.width, opt.height)
        .with_kernel(opt.kernel)
        .with_plane(plane)
        .with_iteration_cap(opt.cap);
    if let Some(workers) = opt.workers {
        config = config.with_workers(workers);
    }

    let mut explorer = Explorer::new(&config)?;
    if opt.zoom != 1.0 {
        let center = Point::new(opt.width as f64 / 2.0, opt.height as f64 / 2.0);
        explorer.apply(Action::Zoom {
            cursor: center,
            factor: opt.zoom,
        })?;
    }

    let stats = explorer.frame()?;
    let img = explorer.paint(opt.palette);
    img.save(&opt.output)?;
    info!("wrote {}", opt.output.display());
    println!(
        "{}x{} at cap {} on {} workers in {:?}",
        opt.width, opt.height, stats.iteration_cap, stats.workers, stats.duration
    );
    explorer.shutdown();
    Ok(())
}
