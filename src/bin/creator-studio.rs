use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use creator_studio::{
    Background, CanvasSettings, ColorReplaceParams, DirBitmapStore, LayerPatch, MoveDirection,
    Session, SessionOpts, Settings, Size, WORKSPACE_ENV, parse_color, read_image,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "creator-studio", version, about = "Non-destructive layered image editing")]
struct Cli {
    /// Workspace root (falls back to ./workspace).
    #[arg(long, global = true, env = WORKSPACE_ENV)]
    workspace: Option<PathBuf>,

    /// Project directory, relative to the workspace.
    #[arg(short, long)]
    project: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty project.
    New(NewArgs),
    /// Import an image as a new top layer.
    Import(ImportArgs),
    /// List layers, top first.
    Layers,
    /// List the operation history.
    Ops,
    /// Show project summary.
    Info,
    /// Check for missing bitmaps and excluded operations.
    Check,
    /// Replace one color with another on a layer.
    ColorReplace(ColorReplaceArgs),
    /// Step the history cursor back.
    Undo,
    /// Step the history cursor forward.
    Redo,
    /// Delete an operation by id or prefix.
    DeleteOp {
        /// Operation id or unique prefix (at least 6 characters).
        id: String,
    },
    /// Delete a layer and every operation targeting it.
    DeleteLayer {
        /// Layer id or unique prefix (at least 6 characters).
        id: String,
    },
    /// Move a layer one step up or down the stack.
    MoveLayer {
        /// Layer id or unique prefix.
        id: String,
        /// Direction.
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Change layer properties.
    SetLayer(SetLayerArgs),
    /// Drop the whole operation history, keeping layers.
    Reset,
    /// Render the composite to a PNG file.
    Export {
        /// Output PNG path.
        out: PathBuf,
    },
}

#[derive(Parser, Debug)]
struct NewArgs {
    /// Display name (defaults to the directory name).
    #[arg(long)]
    name: Option<String>,
    /// Canvas width; taken from the first imported layer when omitted.
    #[arg(long, requires = "height")]
    width: Option<u32>,
    /// Canvas height.
    #[arg(long, requires = "width")]
    height: Option<u32>,
    /// Background: `transparent`, `#RRGGBB` or `R,G,B`.
    #[arg(long, default_value = "transparent")]
    background: String,
    /// Print resolution metadata.
    #[arg(long)]
    dpi: Option<u32>,
}

#[derive(Parser, Debug)]
struct ImportArgs {
    /// Image file (PNG, JPEG, BMP, GIF, WebP).
    path: PathBuf,
    /// Layer name.
    #[arg(long)]
    name: Option<String>,
}

#[derive(Parser, Debug)]
struct ColorReplaceArgs {
    /// Color to replace.
    #[arg(long)]
    target: String,
    /// Replacement color.
    #[arg(long = "to")]
    replacement: String,
    /// Maximum RGB distance (0-255).
    #[arg(long, default_value_t = 0)]
    tolerance: i32,
    /// Force replaced pixels fully opaque.
    #[arg(long)]
    no_preserve_alpha: bool,
    /// Target layer (defaults to the active layer).
    #[arg(long)]
    layer: Option<String>,
    /// Only report how many pixels would change.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Parser, Debug)]
struct SetLayerArgs {
    /// Layer id or unique prefix.
    id: String,
    /// Show (`true`) or hide (`false`).
    #[arg(long)]
    visible: Option<bool>,
    /// Opacity in [0, 1].
    #[arg(long)]
    opacity: Option<f64>,
    /// Horizontal canvas offset.
    #[arg(long, allow_hyphen_values = true)]
    x: Option<i32>,
    /// Vertical canvas offset.
    #[arg(long, allow_hyphen_values = true)]
    y: Option<i32>,
    /// New display name.
    #[arg(long)]
    name: Option<String>,
    /// Advisory lock flag.
    #[arg(long)]
    locked: Option<bool>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Direction {
    Up,
    Down,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let settings = cli
        .workspace
        .clone()
        .map(Settings::with_workspace)
        .unwrap_or_default();
    let dir = settings.project_dir(&cli.project);

    match cli.cmd {
        Command::New(args) => cmd_new(&dir, args),
        Command::Layers => cmd_layers(&open(&dir)?),
        Command::Ops => cmd_ops(&open(&dir)?),
        Command::Info => cmd_info(&open(&dir)?),
        Command::Check => {
            open(&dir)?.health()?;
            println!("ok");
            Ok(())
        }
        Command::Export { out } => {
            open(&dir)?.export_png(&out)?;
            eprintln!("wrote {}", out.display());
            Ok(())
        }
        Command::ColorReplace(args) if args.dry_run => {
            let session = open(&dir)?;
            let params = color_replace_params(&args)?;
            let n = session.preview_color_replace(args.layer.as_deref(), &params)?;
            println!("{n} pixels would change: {}", params.describe());
            Ok(())
        }
        cmd => mutate(&dir, cmd),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cli_opts() -> SessionOpts {
    SessionOpts {
        render_on_mutation: false,
        collect_garbage: false,
        ..SessionOpts::default()
    }
}

fn open(dir: &Path) -> anyhow::Result<Session<DirBitmapStore>> {
    let session = Session::open_dir(dir, cli_opts())
        .with_context(|| format!("open project '{}'", dir.display()))?;
    for r in session.repairs().repairs() {
        eprintln!("repaired: {r}");
    }
    Ok(session)
}

fn cmd_new(dir: &Path, args: NewArgs) -> anyhow::Result<()> {
    let name = args.name.unwrap_or_else(|| {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_owned())
    });
    let size = match (args.width, args.height) {
        (Some(w), Some(h)) => Some(Size::new(w, h)?),
        _ => None,
    };
    let canvas = CanvasSettings {
        size,
        background: Background::try_from(args.background)?,
        dpi: args.dpi,
    };
    Session::create_dir(dir, name, canvas, cli_opts())?.store_composite()?;
    eprintln!("created {}", dir.display());
    Ok(())
}

fn color_replace_params(args: &ColorReplaceArgs) -> anyhow::Result<ColorReplaceParams> {
    let params = ColorReplaceParams::new(parse_color(&args.target)?, parse_color(&args.replacement)?)
        .tolerance(args.tolerance)
        .preserve_alpha(!args.no_preserve_alpha);
    params.validate()?;
    Ok(params)
}

fn mutate(dir: &Path, cmd: Command) -> anyhow::Result<()> {
    let mut session = open(dir)?;
    match cmd {
        Command::Import(args) => {
            let bitmap = read_image(&args.path)?;
            let id = session.import_layer(bitmap, args.name.as_deref())?;
            println!("{id}");
        }
        Command::ColorReplace(args) => {
            let params = color_replace_params(&args)?;
            let record = session.apply_color_replace(args.layer.as_deref(), params)?;
            println!("{} {}", record.id(), record.note().unwrap_or_default());
        }
        Command::Undo => {
            let cursor = session.undo()?;
            println!("cursor {cursor}");
        }
        Command::Redo => {
            let cursor = session.redo()?;
            println!("cursor {cursor}");
        }
        Command::DeleteOp { id } => {
            let record = session.delete_operation(&id)?;
            println!("deleted {}", record.id());
        }
        Command::DeleteLayer { id } => {
            let layer = session.delete_layer(&id)?;
            println!("deleted {}", layer.id());
        }
        Command::MoveLayer { id, direction } => {
            let dir = match direction {
                Direction::Up => MoveDirection::Up,
                Direction::Down => MoveDirection::Down,
            };
            if !session.move_layer(&id, dir)? {
                println!("already at the boundary");
            }
        }
        Command::SetLayer(args) => set_layer(&mut session, args)?,
        Command::Reset => {
            let n = session.reset_history()?;
            println!("removed {n} operations");
        }
        other => anyhow::bail!("command {other:?} does not modify the project (bug)"),
    }
    session.save()?;
    session.store_composite()?;
    session.collect_garbage();
    Ok(())
}

fn set_layer(session: &mut Session<DirBitmapStore>, args: SetLayerArgs) -> anyhow::Result<()> {
    let patch = LayerPatch {
        visible: args.visible,
        opacity: args.opacity,
        x: args.x,
        y: args.y,
        name: args.name,
        locked: args.locked,
    };
    session.update_layer(&args.id, &patch)?;
    Ok(())
}

fn cmd_layers(session: &Session<DirBitmapStore>) -> anyhow::Result<()> {
    let project = session.project();
    for layer in project.layers().iter().rev() {
        println!(
            "{:>2} {} {:<20} {} opacity={:.2} at=({},{}) {}x{}{}",
            layer.order(),
            layer.id().short(),
            layer.name(),
            if layer.visible() { "visible" } else { "hidden " },
            layer.opacity(),
            layer.position().x,
            layer.position().y,
            layer.size().width,
            layer.size().height,
            if layer.locked() { " locked" } else { "" },
        );
    }
    Ok(())
}

fn cmd_ops(session: &Session<DirBitmapStore>) -> anyhow::Result<()> {
    let project = session.project();
    let cursor = project.history().cursor();
    for (i, r) in project.history().records().iter().enumerate() {
        let marker = if i as isize == cursor { '>' } else { ' ' };
        let excluded = if project.is_excluded(r.id()) {
            " [excluded]"
        } else {
            ""
        };
        let target = r.target().map_or("(project)", |t| t.short());
        println!(
            "{marker}{i:>3} {} {} {} {}{excluded}",
            r.id().short(),
            r.created_at().format("%Y-%m-%d %H:%M:%S"),
            target,
            r.note().map_or_else(|| r.operation().describe(), str::to_owned),
        );
    }
    Ok(())
}

fn cmd_info(session: &Session<DirBitmapStore>) -> anyhow::Result<()> {
    let project = session.project();
    println!("name: {}", project.name());
    match project.canvas().size {
        Some(s) => println!("canvas: {}x{}", s.width, s.height),
        None => println!("canvas: (unset)"),
    }
    println!("background: {}", String::from(project.canvas().background));
    println!("layers: {}", project.layers().len());
    println!(
        "operations: {} (cursor {})",
        project.history().len(),
        project.history().cursor()
    );
    println!("updated: {}", project.updated_at().to_rfc3339());
    if project.canvas().size.is_some() && !project.layers().is_empty() {
        let composite = session.render()?;
        println!("composite: {:016x}", composite.fingerprint());
    }
    Ok(())
}
