use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::{CommandFactory, Parser, error::ErrorKind};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use goes16::{
    Deadline, Fetcher, Goes16Result, HttpTransport, ImageSource, PipelineConfig,
    SingleImageSource, Watchdog,
};

#[derive(Parser, Debug)]
#[command(
    name = "goes16-background",
    version,
    about = "set (near-realtime) picture of Earth as your desktop background",
    after_help = "http://github.com/cameronleger/goes16-background"
)]
struct Cli {
    /// Image size in pixels: 678, 1356, 2712, 5424 or 10848. Larger sizes download more tiles.
    #[arg(short, long, default_value_t = goes16::DEFAULT_SIZE)]
    size: u32,

    /// Deadline in minutes to download the image, 0 disables it.
    #[arg(short, long, default_value_t = 6)]
    deadline: u64,

    /// Deadline in seconds, overrides --deadline.
    #[arg(long, hide = true)]
    deadline_secs: Option<u64>,

    /// Do nothing while running on battery.
    #[arg(long)]
    save_battery: bool,

    /// Directory to save the background image in [default: user cache dir].
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Image to composite the picture of Earth over.
    #[arg(long)]
    composite_over: Option<PathBuf>,

    /// Only download the file, do not set the background.
    #[arg(long, alias = "no_set_bg")]
    no_set_bg: bool,

    /// Root of the imagery data server.
    #[arg(long, default_value = goes16::BASE_URL)]
    base_url: String,

    /// Fetch one pre-rendered image linked from this HTML page instead of tiles.
    #[arg(long)]
    single_image_page: Option<String>,

    /// Title marker of the link to pick on the single-image page.
    #[arg(long, default_value = "Full Disk")]
    product_marker: String,

    /// Log every download attempt.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn deadline(&self) -> Deadline {
        match self.deadline_secs {
            Some(secs) => Deadline::after(Duration::from_secs(secs)),
            None => Deadline::from_minutes(self.deadline),
        }
    }

    fn into_config(self) -> PipelineConfig {
        let source = match self.single_image_page {
            Some(page_url) => ImageSource::SingleImage(SingleImageSource {
                page_url,
                product_marker: self.product_marker,
            }),
            None => ImageSource::Tiles,
        };
        PipelineConfig {
            base_url: self.base_url,
            size: self.size,
            output_dir: self.output_dir.unwrap_or_else(goes16::default_output_dir),
            composite_over: self.composite_over,
            set_background: !self.no_set_bg,
            source,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Runs `job` under the watchdog; a timeout or a failed run is an error.
fn supervise<T, F>(deadline: Deadline, job: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Goes16Result<T> + Send + 'static,
{
    let mut watchdog = Watchdog::new(deadline);
    let value = watchdog
        .run(job)?
        .into_result()?
        .context("goes16-background failed")?;
    Ok(value)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.single_image_page.is_none() && !goes16::VALID_SIZES.contains(&cli.size) {
        Cli::command()
            .error(
                ErrorKind::InvalidValue,
                format!(
                    "invalid size {}; possible values are {:?}",
                    cli.size,
                    goes16::VALID_SIZES
                ),
            )
            .exit();
    }

    init_tracing(cli.verbose);
    info!("goes16-background {}", env!("CARGO_PKG_VERSION"));

    if cli.save_battery && goes16::is_discharging() {
        anyhow::bail!("Discharging!");
    }

    let deadline = cli.deadline();
    let config = cli.into_config();
    let fetcher = Fetcher::new(HttpTransport::new()?);

    let output = supervise(deadline, move || goes16::run_pipeline(&config, &fetcher))?;

    info!("Done: {} ({}x{}).", output.path.display(), output.width, output.height);
    Ok(())
}
