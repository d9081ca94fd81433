//! 三元相图命令行入口
//!
//! 每个修改类子命令都是 加载 -> 修改 -> 原子保存。

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ternary_core::entity::Uid;
use ternary_core::properties::{Color, LineStroke, LineType, MarkerSymbol, PointStyle};
use ternary_file::{Diagram, DiagramConfig};

/// Ternary composition diagram tool
#[derive(Parser)]
#[command(name = "ternary")]
#[command(about = "Build and analyze ternary composition diagrams")]
#[command(version)]
struct Args {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty diagram file
    New {
        file: PathBuf,
        /// Three component names
        #[arg(long, num_args = 3, value_names = ["A", "B", "C"])]
        components: Option<Vec<String>>,
        /// Put component C at the bottom
        #[arg(long)]
        inverted: bool,
        #[arg(long)]
        grid_step: Option<f64>,
        #[arg(long)]
        grid_visible: bool,
        /// JSON file with default diagram settings
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a summary of the diagram
    Info { file: PathBuf },
    /// Add a composition point
    AddPoint {
        file: PathBuf,
        name: String,
        a: f64,
        b: f64,
        c: f64,
        #[arg(long)]
        color: Option<Color>,
        #[arg(long)]
        size: Option<f64>,
        #[arg(long)]
        marker: Option<MarkerSymbol>,
    },
    /// Connect two points with a line
    AddLine {
        file: PathBuf,
        start: String,
        end: String,
        #[arg(long)]
        color: Option<Color>,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        style: Option<LineType>,
    },
    /// Remove a point and every line attached to it
    RemovePoint { file: PathBuf, uid: String },
    RemoveLine { file: PathBuf, uid: String },
    /// Intersect two lines
    Intersect { file: PathBuf, line1: String, line2: String },
    /// Apply the lever rule to a point on a tie line
    Lever { file: PathBuf, line: String, point: String },
    /// Smallest integer ratio of a point's composition
    Ratio { file: PathBuf, point: String },
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(&args.log_level);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::New {
            file,
            components,
            inverted,
            grid_step,
            grid_visible,
            config,
        } => {
            let mut config = match config {
                Some(path) => DiagramConfig::load(&path)
                    .with_context(|| format!("failed to read config {}", path.display()))?,
                None => DiagramConfig::default(),
            };
            if let Some(components) = components {
                config.components = components;
            }
            if let Some(step) = grid_step {
                config.grid_step = step;
            }
            config.inverted |= inverted;
            config.grid_visible |= grid_visible;

            let mut diagram = Diagram::with_config(&config)?;
            save(&mut diagram, &file)?;
            println!("{}", diagram);
        }
        Command::Info { file } => {
            let diagram = load(&file)?;
            println!("{}", diagram);
            println!(
                "orientation: {}, grid: {} (step {})",
                if diagram.inverted() { "inverted" } else { "upright" },
                if diagram.grid_visible() { "visible" } else { "hidden" },
                diagram.grid_step()
            );
            for point in diagram.list_points() {
                println!(
                    "point {} {:?} a={:.4} b={:.4} c={:.4}",
                    point.uid, point.name, point.a, point.b, point.c
                );
            }
            for line in diagram.list_lines() {
                println!("line {} {} -> {}", line.uid, line.start_uid, line.end_uid);
            }
        }
        Command::AddPoint {
            file,
            name,
            a,
            b,
            c,
            color,
            size,
            marker,
        } => {
            let mut diagram = load(&file)?;
            let mut style = PointStyle::default();
            if let Some(color) = color {
                style = style.with_color(color);
            }
            if let Some(size) = size {
                style = style.with_size(size);
            }
            if let Some(marker) = marker {
                style = style.with_marker(marker);
            }
            let uid = diagram.add_point_styled(name, a, b, c, style)?;
            save(&mut diagram, &file)?;
            println!("{}", uid);
        }
        Command::AddLine {
            file,
            start,
            end,
            color,
            width,
            style,
        } => {
            let mut diagram = load(&file)?;
            let mut stroke = LineStroke::default();
            if let Some(color) = color {
                stroke = stroke.with_color(color);
            }
            if let Some(width) = width {
                stroke = stroke.with_width(width);
            }
            if let Some(style) = style {
                stroke = stroke.with_style(style);
            }
            let uid = diagram.add_line_styled(&Uid::from(start), &Uid::from(end), stroke)?;
            save(&mut diagram, &file)?;
            println!("{}", uid);
        }
        Command::RemovePoint { file, uid } => {
            let mut diagram = load(&file)?;
            let removed = diagram.remove_point(&Uid::from(uid))?;
            save(&mut diagram, &file)?;
            println!("removed point and {} line(s)", removed.len());
        }
        Command::RemoveLine { file, uid } => {
            let mut diagram = load(&file)?;
            diagram.remove_line(&Uid::from(uid))?;
            save(&mut diagram, &file)?;
        }
        Command::Intersect { file, line1, line2 } => {
            let diagram = load(&file)?;
            let info = diagram.intersect(&Uid::from(line1), &Uid::from(line2))?;
            match info.composition() {
                Some(comp) => println!(
                    "{}: a={:.6} b={:.6} c={:.6}",
                    info.message, comp.a, comp.b, comp.c
                ),
                None => println!("{}", info.message),
            }
        }
        Command::Lever { file, line, point } => {
            let diagram = load(&file)?;
            let info = diagram.lever_rule(&Uid::from(line), &Uid::from(point))?;
            if !info.valid {
                bail!("{}", info.message);
            }
            println!("{}", info.message);
        }
        Command::Ratio { file, point } => {
            let diagram = load(&file)?;
            let ratio = diagram.point_ratio(&Uid::from(point))?;
            let parts: Vec<String> = ratio.iter().map(|v| v.to_string()).collect();
            println!("{}", parts.join(":"));
        }
    }
    Ok(())
}

fn load(path: &Path) -> Result<Diagram> {
    Diagram::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn save(diagram: &mut Diagram, path: &Path) -> Result<()> {
    diagram
        .save(path)
        .with_context(|| format!("failed to save {}", path.display()))
}
