mod logger;

use acrylic_sheet::{
    BatchStatistics, CardRequest, FontLabelRenderer, KnockoutPattern, KnockoutStrength,
    LabelRenderer, NoLabels, SheetOptions, SheetSize,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use logger::CliLogger;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "acsheet", about = "Layered acrylic card sheet generator", version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render card sheets from a list of card requests
    Render(RenderArgs),

    /// Write the default configuration as JSON
    InitConfig {
        /// Destination file
        path: PathBuf,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// JSON file with the card requests
    #[arg(short, long, required_unless_present = "images_json", conflicts_with = "images_json")]
    images: Option<PathBuf>,

    /// Card requests as an inline JSON array
    #[arg(long)]
    images_json: Option<String>,

    /// Base configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sheet size in millimetres, e.g. 280x580
    #[arg(long)]
    sheet: Option<String>,

    /// File name prefix for every layer
    #[arg(long)]
    prefix: Option<String>,

    /// Directory receiving one sub-directory per page
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Put every card on a single sheet and fail if they do not fit
    #[arg(long)]
    one_page: bool,

    /// Knockout erosion in millimetres (0 disables erosion)
    #[arg(long)]
    knockout_shrink: Option<f32>,

    /// Knockout threshold preset
    #[arg(long, value_enum)]
    knockout_mode: Option<StrengthArg>,

    /// Knockout alpha threshold (overrides --knockout-mode)
    #[arg(long)]
    knockout_threshold: Option<u8>,

    /// Knockout transfer function
    #[arg(long, value_enum)]
    knockout_pattern: Option<PatternArg>,

    /// Render worker count
    #[arg(long)]
    workers: Option<usize>,

    /// Image loading worker count
    #[arg(long)]
    load_workers: Option<usize>,

    /// Run loading and rendering on a single thread
    #[arg(long)]
    serial: bool,

    /// TTF/OTF font for the name labels; labels are skipped without one
    #[arg(long)]
    font: Option<PathBuf>,

    /// Show statistics only, don't render
    #[arg(long)]
    stats_only: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrengthArg {
    Normal,
    Aggressive,
    Minimal,
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternArg {
    Binary,
    Gradient,
    Steep,
}

impl From<StrengthArg> for KnockoutStrength {
    fn from(arg: StrengthArg) -> Self {
        match arg {
            StrengthArg::Normal => Self::Normal,
            StrengthArg::Aggressive => Self::Aggressive,
            StrengthArg::Minimal => Self::Minimal,
        }
    }
}

impl From<PatternArg> for KnockoutPattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Binary => Self::Binary,
            PatternArg::Gradient => Self::Gradient,
            PatternArg::Steep => Self::SteepGradient,
        }
    }
}

impl RenderArgs {
    /// Configuration file (or defaults) with the command-line overrides applied
    async fn options(&self) -> Result<SheetOptions> {
        let mut options = match &self.config {
            Some(path) => SheetOptions::load(path)
                .await
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SheetOptions::default(),
        };

        if let Some(sheet) = &self.sheet {
            options.sheet_size = SheetSize::parse(sheet)?;
        }
        if let Some(prefix) = &self.prefix {
            options.output_prefix = prefix.clone();
        }
        if self.one_page {
            options.single_page = true;
        }
        if let Some(shrink) = self.knockout_shrink {
            options.knockout.shrink_mm = shrink;
        }
        if let Some(mode) = self.knockout_mode {
            options.knockout = options.knockout.with_strength(mode.into());
        }
        if let Some(threshold) = self.knockout_threshold {
            options.knockout.threshold = threshold;
        }
        if let Some(pattern) = self.knockout_pattern {
            options.knockout.pattern = pattern.into();
        }
        if let Some(workers) = self.workers {
            options.render_workers = Some(workers);
        }
        if let Some(workers) = self.load_workers {
            options.load_workers = Some(workers);
        }
        if self.serial {
            options.parallel = false;
        }
        if let Some(font) = &self.font {
            options.label_font = Some(font.clone());
        }

        options.validate()?;
        Ok(options)
    }

    async fn requests(&self) -> Result<Vec<CardRequest>> {
        match (&self.images, &self.images_json) {
            (Some(path), _) => acrylic_sheet::load_requests(path)
                .await
                .with_context(|| format!("reading card list {}", path.display())),
            (None, Some(json)) => Ok(acrylic_sheet::io::parse_requests(json.as_bytes())?),
            (None, None) => anyhow::bail!("either --images or --images-json is required"),
        }
    }
}

fn label_renderer(options: &SheetOptions) -> Result<Arc<dyn LabelRenderer>> {
    match &options.label_font {
        Some(path) => {
            let renderer = FontLabelRenderer::from_file(path)
                .with_context(|| format!("loading label font {}", path.display()))?;
            Ok(Arc::new(renderer))
        }
        None => {
            log::info!("No label font given; labels layer will be omitted");
            Ok(Arc::new(NoLabels))
        }
    }
}

fn print_statistics(stats: &BatchStatistics) {
    println!("Sheet Statistics:");
    println!("  Items: {}", stats.items);
    println!("  Cards: {}", stats.cards);
    println!("  Grid: {} rows x {} cols", stats.rows, stats.cols);
    println!("  Cards per sheet: {}", stats.capacity);
    println!("  Sheets: {}", stats.pages);
}

async fn render(args: RenderArgs) -> Result<()> {
    let options = args.options().await?;
    let requests = args.requests().await?;

    let stats = acrylic_sheet::calculate_statistics(&requests, &options)?;
    print_statistics(&stats);
    if args.stats_only {
        return Ok(());
    }

    let labels = label_renderer(&options)?;
    let report = acrylic_sheet::run_batch(requests, &options, &args.output_dir, labels).await?;

    for failure in &report.load_failures {
        eprintln!("skipped: {}", failure);
    }
    for warning in &report.load_warnings {
        eprintln!("warning: {}", warning);
    }
    for failure in &report.render_failures {
        eprintln!("failed: {}", failure);
    }

    for page in &report.pages {
        println!("Page {} → {}", page.number, page.dir.display());
    }
    println!(
        "Loaded in {:.2}s, rendered in {:.2}s",
        report.load_time.as_secs_f64(),
        report.render_time.as_secs_f64()
    );

    if !report.render_failures.is_empty() {
        anyhow::bail!(
            "{} of {} pages failed to render",
            report.render_failures.len(),
            report.render_failures.len() + report.pages.len()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    CliLogger::new(CliLogger::level_for(cli.verbose, cli.quiet)).init()?;

    match cli.command {
        Commands::Render(args) => render(args).await?,

        Commands::InitConfig { path } => {
            SheetOptions::default().save(&path).await?;
            println!("Wrote default configuration → {}", path.display());
        }
    }

    Ok(())
}
