use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use needle_matrix_core::{
    timeline::frame_interval_ms, AppConfig, Content, GlyphTable, NeedleMatrix, PlaybackClock,
};
use tracing_subscriber::EnvFilter;

mod svg;

use svg::SvgSurface;

/// Digits, `:` and `-`; always available underneath a user-supplied table.
const BUILTIN_GLYPHS: &str = include_str!("../assets/digits.json");

fn main() -> needle_matrix_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let glyphs = load_glyphs(cli.glyphs.as_deref())?;
    let mut display = NeedleMatrix::new(&config, glyphs)?;
    let mut run = Simulation::new(&cli.output);

    match cli.command {
        Commands::Patterns => {
            for (index, pattern) in display.patterns().iter().enumerate() {
                println!("{index:>2}  {:<14} {}", pattern.key, pattern.name);
            }
            Ok(())
        }
        Commands::Text { text } => {
            let report = display.show_text(&text, run.now());
            if !report.skipped.is_empty() {
                tracing::warn!(skipped = ?report.skipped, "no glyph for some characters");
            }
            run.settle(&mut display, cli.output.duration_ms)?;
            run.finish(&mut display)
        }
        Commands::Clock => {
            let text = chrono::Local::now().format("%H:%M").to_string();
            tracing::info!(%text, "showing local time");
            display.show_text(&text, run.now());
            run.settle(&mut display, cli.output.duration_ms)?;
            run.finish(&mut display)
        }
        Commands::Pattern { key, auto_cycle } => {
            display.set_auto_cycle(auto_cycle);
            if !display.play_pattern(&key, run.now()) {
                return Err(format!("unknown pattern `{key}`; see the `patterns` command").into());
            }
            run.settle(&mut display, cli.output.duration_ms)?;
            run.finish(&mut display)
        }
        Commands::Play => {
            let playlist = if config.sequence.playlist.is_empty() {
                default_playlist(&display)
            } else {
                config.sequence.playlist.clone()
            };
            tracing::info!(entries = playlist.len(), "starting sequence");
            display.start_sequence(playlist, run.now());
            run.settle(&mut display, cli.output.duration_ms)?;
            if let Some(content) = display.current_content() {
                tracing::info!(?content, "showing at end of run");
            }
            run.finish(&mut display)
        }
        Commands::Export { text, file } => {
            display.show_text(&text, run.now());
            run.settle(&mut display, cli.output.duration_ms)?;
            let dump = display.export_debug();
            match file {
                Some(path) => {
                    std::fs::write(&path, &dump)?;
                    let marks = display.marks().len();
                    tracing::info!(
                        path = %path.display(),
                        marks,
                        "debug grid exported"
                    );
                }
                None => print!("{dump}"),
            }
            run.write_svg(&mut display)
        }
        Commands::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let applied = display.import_debug(&text);
            let marks = display.marks().len();
            tracing::info!(applied, marks, "debug grid imported");
            run.settle(&mut display, cli.output.duration_ms)?;
            run.finish(&mut display)
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_glyphs(path: Option<&Path>) -> needle_matrix_core::Result<GlyphTable> {
    let builtin = GlyphTable::from_json_str(BUILTIN_GLYPHS)?;
    match path {
        Some(path) => Ok(GlyphTable::from_path(path)?.with_fallback(builtin)),
        None => Ok(builtin),
    }
}

/// Every pattern, then every glyph as a single-character string.
fn default_playlist(display: &NeedleMatrix) -> Vec<Content> {
    let patterns = display.patterns().keys().map(Content::pattern);
    let glyphs = display.glyphs().chars().map(Content::text);
    patterns.chain(glyphs).collect()
}

/// Drives the display on a virtual clock at a fixed frame rate.
struct Simulation {
    clock: PlaybackClock,
    interval_ms: f64,
    svg: Option<PathBuf>,
    frames: u64,
}

impl Simulation {
    fn new(output: &OutputArgs) -> Self {
        Self {
            clock: PlaybackClock::default(),
            interval_ms: frame_interval_ms(output.fps),
            svg: output.svg.clone(),
            frames: 0,
        }
    }

    fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Ticks for `duration_ms` of virtual time, drawing every frame that needs it.
    fn settle(
        &mut self,
        display: &mut NeedleMatrix,
        duration_ms: f64,
    ) -> needle_matrix_core::Result<()> {
        let end = self.clock.now() + duration_ms.max(0.0);
        let mut surface = SvgSurface::new();
        loop {
            let now = self.clock.now();
            if display.tick(now) {
                display.draw(&mut surface)?;
                self.frames += 1;
            }
            if now >= end {
                break;
            }
            if self.clock.advance(self.interval_ms) > end {
                self.clock = PlaybackClock::new(end);
            }
        }
        let settled = display.is_settled();
        tracing::debug!(
            frames = self.frames,
            elapsed_ms = self.clock.now(),
            settled,
            "simulation finished"
        );
        Ok(())
    }

    /// Prints the final debug grid and writes the SVG frame if one was requested.
    fn finish(&self, display: &mut NeedleMatrix) -> needle_matrix_core::Result<()> {
        print!("{}", display.export_debug());
        self.write_svg(display)
    }

    fn write_svg(&self, display: &mut NeedleMatrix) -> needle_matrix_core::Result<()> {
        let Some(path) = &self.svg else {
            return Ok(());
        };
        let mut surface = SvgSurface::new();
        display.draw(&mut surface)?;
        surface.save(path)
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Dual-needle dial matrix display", long_about = None)]
struct Cli {
    /// JSON configuration file; missing fields use defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Extra glyph table layered over the built-in digits.
    #[arg(short, long, global = true)]
    glyphs: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Virtual time to simulate before the final frame, in milliseconds.
    #[arg(long, global = true, default_value_t = 2_000.0)]
    duration_ms: f64,

    /// Simulated frame rate.
    #[arg(long, global = true, default_value_t = 60)]
    fps: u32,

    /// Write the final frame as SVG.
    #[arg(long, global = true)]
    svg: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the registered patterns.
    Patterns,
    /// Spell out a string.
    Text {
        text: String,
    },
    /// Show the local time as HH:MM.
    Clock,
    /// Play one pattern.
    Pattern {
        key: String,
        /// Move on to the next pattern after every period.
        #[arg(long)]
        auto_cycle: bool,
    },
    /// Cycle through the configured playlist, or every pattern and glyph.
    Play,
    /// Show a string and dump the resulting debug grid.
    Export {
        text: String,
        /// Destination file; stdout when omitted.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Load a debug grid dump.
    Import {
        file: PathBuf,
    },
}
