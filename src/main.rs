use std::error::Error;
use std::path::PathBuf;
use std::process;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tide_rs::io::{format_prediction, parse_timestamp};
use tide_rs::{
    ConstituentFitA, ConstituentFitB, IntervalUnit, Latitude, LoaderOptions, Pipeline,
    PipelineConfig, PredictionFormat, PredictionWindow, Result, SamplingInterval, Separator,
    Strategy, StrategyKind, TTideConfig, UTideConfig,
};

#[derive(Parser)]
#[command(name = "tide")]
#[command(about = "Tidal harmonic analysis and prediction from water-level observations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an observation file and print a summary
    Inspect(InputArgs),
    /// Fit a harmonic model and print or write the report
    Analyse(AnalyseArgs),
    /// Fit, reconstruct over a window and write report and prediction
    Predict(PredictArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Observation file
    file: PathBuf,

    #[arg(long, default_value = "Time", help = "Name of the timestamp column")]
    time_column: String,

    #[arg(long, default_value = "Depth", help = "Name of the depth column")]
    depth_column: String,

    #[arg(long, default_value = "tab", help = "Field separator (tab|comma|space|semicolon)")]
    separator: Separator,

    #[arg(long, help = "Read numeric dates as day/month instead of month/day")]
    day_first: bool,
}

impl InputArgs {
    fn loader_options(&self) -> LoaderOptions {
        LoaderOptions::new(&self.time_column, &self.depth_column)
            .with_separator(self.separator)
            .with_day_first(self.day_first)
    }
}

#[derive(Args)]
struct ModelArgs {
    #[arg(long, default_value = "utide", help = "Analysis method (ttide|utide)")]
    method: StrategyKind,

    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Gauge latitude in degrees, enables nodal corrections"
    )]
    latitude: Option<f64>,

    #[arg(short, long, help = "Base path for output files")]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = 0.0, help = "SNR threshold for T Tide synthesis")]
    synth: f64,

    #[arg(long, default_value_t = 0.0, help = "Minimum SNR for U Tide reconstruction")]
    min_snr: f64,
}

impl ModelArgs {
    fn strategy(&self) -> Strategy {
        match self.method {
            StrategyKind::ConstituentFitA => {
                ConstituentFitA::new(TTideConfig::default().with_synth(self.synth)).into()
            }
            StrategyKind::ConstituentFitB => {
                ConstituentFitB::new(UTideConfig::default().with_min_snr(self.min_snr)).into()
            }
        }
    }

    fn config(&self, input: &InputArgs) -> Result<PipelineConfig> {
        let latitude = self.latitude.map(Latitude::new).transpose()?;
        let mut config = PipelineConfig::default()
            .with_input(input.loader_options())
            .with_latitude(latitude)
            .with_strategy(self.strategy());
        if let Some(base) = &self.output {
            config = config.with_output(base);
        }
        Ok(config)
    }
}

#[derive(Args)]
struct AnalyseArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args)]
struct PredictArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    model: ModelArgs,

    #[arg(long, value_parser = parse_window_time, help = "Window start (YYYY-MM-DD [HH:MM[:SS]])")]
    start: NaiveDateTime,

    #[arg(long, value_parser = parse_window_time, help = "Window end (YYYY-MM-DD [HH:MM[:SS]])")]
    end: NaiveDateTime,

    #[arg(long, default_value_t = 1, help = "Prediction interval")]
    interval: u32,

    #[arg(long, default_value = "hours", help = "Interval unit (hours|minutes)")]
    unit: IntervalUnit,

    #[arg(long, help = "Write a Time/Depth header row in the prediction file")]
    header: bool,
}

fn parse_window_time(s: &str) -> std::result::Result<NaiveDateTime, String> {
    parse_timestamp(s, false).ok_or_else(|| format!("'{s}' is not a date or date-time"))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Inspect(input) => {
            let config = PipelineConfig::default().with_input(input.loader_options());
            let pipeline = Pipeline::new(config);
            let summary = pipeline.inspect(&input.file)?;
            println!("file:      {}", input.file.display());
            println!("samples:   {} ({} missing)", summary.samples, summary.missing);
            if let (Some(start), Some(end)) = (summary.start, summary.end) {
                println!("start:     {start}");
                println!("end:       {end}");
            }
            if let Some(dt) = summary.interval {
                println!("interval:  {} s", dt.num_seconds());
            }
            println!("mean:      {:.4}", summary.mean);
            println!("min / max: {:.4} / {:.4}", summary.min, summary.max);
        }
        Commands::Analyse(args) => {
            let pipeline = Pipeline::new(args.model.config(&args.input)?);
            let outcome = pipeline.analyse(&args.input.file)?;
            match outcome.report_path {
                Some(path) => println!("{}", path.display()),
                None => print!("{}", outcome.report),
            }
        }
        Commands::Predict(args) => {
            let interval = SamplingInterval::new(args.interval, args.unit)?;
            let window = PredictionWindow::new(args.start, args.end, interval)?;
            let config = args
                .model
                .config(&args.input)?
                .with_format(PredictionFormat::default().with_header(args.header));
            let format = config.format;

            let outcome = Pipeline::new(config).predict(&args.input.file, &window)?;
            match outcome.paths {
                Some(paths) => {
                    println!("{}", paths.report.display());
                    println!("{}", paths.prediction.display());
                }
                None => print!("{}", format_prediction(&outcome.prediction, &format)),
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }
}
