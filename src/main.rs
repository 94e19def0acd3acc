use crossbeam::channel::{unbounded, Receiver};
use pathtrace::{DenoiseMode, Frame, RenderSession, RenderSettings, Scene};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use structopt::StructOpt;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, StructOpt)]
#[structopt(name = "pathtrace", about = "Wavefront Monte Carlo path tracer")]
struct Opt {
    /// Scene description (JSON)
    #[structopt(parse(from_os_str))]
    scene: PathBuf,

    /// Final image path, overriding the scene's FILE
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    #[structopt(short, long)]
    iterations: Option<u32>,

    /// Maximum bounces per path
    #[structopt(short, long)]
    depth: Option<u32>,

    /// Shade paths in generation order instead of grouping them by material
    #[structopt(long)]
    no_sort: bool,

    /// Skip back faces of opaque meshes
    #[structopt(long)]
    cull_back_faces: bool,

    #[structopt(long, possible_values = &["off", "final", "every"])]
    denoise: Option<DenoiseMode>,

    /// Worker threads (default: one per core)
    #[structopt(short = "j", long)]
    threads: Option<usize>,

    /// Write a preview image every N iterations
    #[structopt(long)]
    preview_every: Option<u32>,

    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    #[structopt(short, long)]
    quiet: bool,
}

impl Opt {
    fn apply(&self, settings: &mut RenderSettings) {
        if let Some(iterations) = self.iterations {
            settings.iterations = iterations;
        }
        if let Some(depth) = self.depth {
            settings.max_depth = depth;
        }
        settings.sort_materials = !self.no_sort;
        settings.cull_back_faces = self.cull_back_faces;
        if let Some(mode) = self.denoise {
            settings.denoise = mode;
        }
        if self.threads.is_some() {
            settings.threads = self.threads;
        }
        if self.preview_every.is_some() {
            settings.preview_every = self.preview_every;
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn preview_path(output: &Path, iteration: u32) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    output.with_file_name(format!("{}.{:05}.png", stem, iteration))
}

fn save_previews(rx: Receiver<(u32, Frame)>, output: &Path) {
    for (iteration, frame) in rx {
        let path = preview_path(output, iteration);
        match frame.save_png(&path) {
            Ok(()) => info!(path = %path.display(), "preview saved"),
            Err(e) => warn!(path = %path.display(), "failed to save preview: {}", e),
        }
    }
}

fn main() {
    let opt = Opt::from_args();
    init_logging(opt.verbose, opt.quiet);
    let start_time = Instant::now();

    let scene = match Scene::from_file(&opt.scene) {
        Ok(scene) => scene,
        Err(e) => {
            error!(scene = %opt.scene.display(), "failed to load scene: {}", e);
            process::exit(1);
        }
    };
    let mut settings = scene.settings.clone();
    opt.apply(&mut settings);
    if let Err(reason) = settings.check() {
        error!("invalid render settings: {}", reason);
        process::exit(2);
    }
    let output = opt.output.clone().unwrap_or_else(|| scene.output.clone());
    info!(
        scene = %opt.scene.display(),
        output = %output.display(),
        iterations = settings.iterations,
        depth = settings.max_depth,
        sort = settings.sort_materials,
        denoise = %settings.denoise,
        "scene constructed in {:.3} secs",
        start_time.elapsed().as_secs_f32()
    );

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(settings.threads.unwrap_or(0))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            error!(threads = ?settings.threads, "failed to start the worker pool: {}", e);
            process::exit(1);
        }
    };

    let iterations = settings.iterations;
    let rendered = crossbeam::scope(|scope| {
        let (tx, rx) = unbounded::<(u32, Frame)>();
        let saver = scope.spawn(|_| save_previews(rx, &output));
        let mut session = RenderSession::new(scene, settings);
        let frame = pool.install(|| {
            session.render(|report| {
                let completed = report.iteration + 1;
                if let Some(frame) = &report.frame {
                    // the last frame is written below under the final name
                    if completed < iterations && tx.send((completed, frame.clone())).is_err() {
                        warn!("preview saver is gone, dropping preview");
                    }
                }
            })
        });
        drop(tx);
        if saver.join().is_err() {
            warn!("preview saver thread panicked");
        }
        frame
    });
    let frame = match rendered {
        Ok(frame) => frame,
        Err(_) => {
            error!("render thread panicked");
            process::exit(1);
        }
    };

    if let Err(e) = frame.save_png(&output) {
        error!(path = %output.display(), "failed to save image: {}", e);
        process::exit(1);
    }
    info!(
        path = %output.display(),
        denoised = frame.denoised,
        "completed in {:.3} secs",
        start_time.elapsed().as_secs_f32()
    );
}
