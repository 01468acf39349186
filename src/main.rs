// main.rs — `tonemap` viewer and batch tool.
//
// Usage:
//   tonemap input.exr                       # interactive window
//   tonemap input.hdr out.png --gamma 0.4   # window, W writes out.png
//   tonemap input.hdr out.png --headless    # map once, write, exit
//   tonemap input.exr --mode direct --kernel sharpen.txt
//
// Controls:
//   T      — tone-map the original image
//   C      — convolve (blur) the image currently shown
//   R      — restore the original image
//   W      — write the image currently shown to OUTPUT
//   Q/Esc  — quit
//
// Logging goes through tracing; set RUST_LOG=debug for per-stage timings.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hdr_tonemap::convert::render_framebuffer;
use hdr_tonemap::io::{load_pixel_field, save_pixel_field};
use hdr_tonemap::kernel::DEFAULT_KERNEL_SIZE;
use hdr_tonemap::{Error, Kernel, Request, Result, Session, ToneMapConfig, ToneMode};

#[derive(Parser, Debug)]
#[command(name = "tonemap")]
#[command(version, about = "Tone-map an HDR image for display", long_about = None)]
struct Cli {
    /// Input image (.exr, .hdr, or any 3/4 channel format the image crate reads)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output image; the extension picks the encoding
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Tone curve exponent
    #[arg(short, long, value_name = "FLOAT", default_value = "0.5", allow_hyphen_values = true)]
    gamma: f32,

    /// Tone curve mode
    #[arg(short, long, value_enum, default_value = "decomposition")]
    mode: ModeArg,

    /// Kernel file: N followed by N*N weights, row-major
    #[arg(short, long, value_name = "FILE")]
    kernel: Option<PathBuf>,

    /// Side of the box kernel used when no kernel file is given (odd)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_KERNEL_SIZE)]
    kernel_size: usize,

    /// Tone-map once, write OUTPUT and exit without opening a window
    #[arg(long)]
    headless: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// LD = LW^gamma
    Direct,
    /// Gamma on the low-pass log-luminance, detail preserved
    Decomposition,
}

impl From<ModeArg> for ToneMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Direct => ToneMode::Direct,
            ModeArg::Decomposition => ToneMode::Decomposition,
        }
    }
}

impl Cli {
    /// Kernel file if given, otherwise a box filter of `kernel_size`.
    fn kernel(&self) -> Result<Kernel> {
        match &self.kernel {
            Some(path) => Kernel::from_file(path),
            None => Kernel::box_filter(self.kernel_size),
        }
    }

    fn config(&self) -> Result<ToneMapConfig> {
        Ok(ToneMapConfig {
            gamma: self.gamma,
            mode: self.mode.into(),
            kernel: self.kernel()?,
        })
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.config()?;
    let pixels = load_pixel_field(&cli.input)?;
    info!(
        gamma = config.gamma,
        mode = ?config.mode,
        kernel = config.kernel.size(),
        "configuration"
    );

    let mut session = Session::new(pixels, config);

    if cli.headless {
        let output = cli.output.as_ref().ok_or(Error::MissingOutput)?;
        let mapped = session.handle(Request::ToneMap);
        return save_pixel_field(output, mapped);
    }

    session.handle(Request::ToneMap);
    view(&mut session, cli.output.as_ref())
}

/// Interactive loop. Every key press is one synchronous request.
fn view(session: &mut Session, output: Option<&PathBuf>) -> Result<()> {
    let (w, h) = session.current().dimensions();
    let mut window = Window::new(
        "tonemap — T tone-map, C blur, R restore, W write, Q quit",
        w,
        h,
        WindowOptions {
            resize: false,
            ..WindowOptions::default()
        },
    )
    .map_err(|e| Error::Window(e.to_string()))?;
    window.set_target_fps(60);

    let mut fb = vec![0u32; w * h];
    render_framebuffer(session.current(), &mut fb);

    println!("\nControls: T=tone-map, C=convolve, R=restore, W=write, Q/Esc=quit\n");

    while window.is_open() && !window.is_key_down(Key::Escape) && !window.is_key_down(Key::Q) {
        let request = if window.is_key_pressed(Key::T, KeyRepeat::No) {
            Some(Request::ToneMap)
        } else if window.is_key_pressed(Key::C, KeyRepeat::No) {
            Some(Request::Convolve)
        } else if window.is_key_pressed(Key::R, KeyRepeat::No) {
            Some(Request::Restore)
        } else {
            None
        };

        if let Some(request) = request {
            render_framebuffer(session.handle(request), &mut fb);
        }

        if window.is_key_pressed(Key::W, KeyRepeat::No) {
            // Write failures are reported, the session keeps running.
            match output {
                Some(path) => match save_pixel_field(path, session.current()) {
                    Ok(()) => println!("Image written to {}", path.display()),
                    Err(e) => warn!("write failed: {e}"),
                },
                None => warn!("{}", Error::MissingOutput),
            }
        }

        window
            .update_with_buffer(&fb, w, h)
            .map_err(|e| Error::Window(e.to_string()))?;
    }

    println!("\nProgram terminated.");
    Ok(())
}
