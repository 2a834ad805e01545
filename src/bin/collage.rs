use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use collage::{
    Engine, EngineConfig, RenderRequest, RenderVariant, TemplateFamily, TemplateVariant,
};

#[derive(Parser, Debug)]
#[command(name = "collage", version)]
struct Cli {
    /// Engine config JSON (defaults apply when omitted).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hexagon template directory (overrides the config).
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    /// Log pipeline steps to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the slot layout for a member count as JSON.
    Layout(LayoutArgs),
    /// List template variants available for a member count.
    Templates(TemplatesArgs),
    /// Render a collage PNG from a members JSON file.
    Render(RenderArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Family {
    Grid,
    Hexagon,
}

impl From<Family> for TemplateFamily {
    fn from(f: Family) -> Self {
        match f {
            Family::Grid => TemplateFamily::Grid,
            Family::Hexagon => TemplateFamily::Hexagon,
        }
    }
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// Border member count.
    #[arg(long)]
    count: u32,

    #[arg(long, value_enum, default_value_t = Family::Grid)]
    family: Family,
}

#[derive(Parser, Debug)]
struct TemplatesArgs {
    /// Border member count.
    #[arg(long)]
    count: u32,

    /// Family to pre-select.
    #[arg(long, value_enum)]
    prefer: Option<Family>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input JSON: `{"members": [...], "centerMemberId": "..."}`.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path. With `--all`, the variant id is appended to the file stem.
    #[arg(long)]
    out: PathBuf,

    /// Template family; defaults to the first available one.
    #[arg(long, value_enum)]
    family: Option<Family>,

    /// Override the center member from the input file. Several comma separated ids render
    /// one set of variants per candidate center.
    #[arg(long, value_delimiter = ',')]
    center: Vec<String>,

    /// Render every available variant concurrently.
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = cli.templates {
        config.templates_dir = Some(dir);
    }

    match cli.cmd {
        Command::Layout(args) => cmd_layout(config, args),
        Command::Templates(args) => cmd_templates(config, args),
        Command::Render(args) => cmd_render(config, args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn cmd_layout(config: EngineConfig, args: LayoutArgs) -> anyhow::Result<()> {
    let json = match args.family {
        Family::Grid => {
            let layout = collage::template::grid::generate(args.count)?;
            let view_box = layout.view_box(&config.grid);
            serde_json::json!({ "viewBox": view_box, "layout": layout })
        }
        Family::Hexagon => {
            let engine = Engine::new(config)?;
            let handle = engine.registry().resolve(args.count)?;
            let template = collage::template::registry::extract(&handle)?;
            serde_json::to_value(&template)?
        }
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn cmd_templates(config: EngineConfig, args: TemplatesArgs) -> anyhow::Result<()> {
    let engine = Engine::new(config)?;
    let templates = engine.available_templates(args.count);
    let initial = engine.initial_variant_index(&templates, args.prefer.map(Into::into));
    let json = serde_json::json!({ "templates": templates, "initialIndex": initial });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn cmd_render(mut config: EngineConfig, args: RenderArgs) -> anyhow::Result<()> {
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    let f = std::fs::File::open(&args.in_path)
        .with_context(|| format!("open members JSON '{}'", args.in_path.display()))?;
    let mut request: RenderRequest = serde_json::from_reader(std::io::BufReader::new(f))
        .with_context(|| "parse members JSON")?;
    if let [only] = args.center.as_slice() {
        request.center_member_id = Some(only.clone());
    }

    let engine = Engine::new(config)?;
    if args.center.len() > 1 {
        let variants = engine.variants_for_centers(&request, &args.center);
        let variants: Vec<RenderVariant> = match args.family.map(TemplateFamily::from) {
            Some(family) => variants
                .into_iter()
                .filter(|v| v.variant().family == family)
                .collect(),
            None => variants,
        };
        if variants.is_empty() {
            anyhow::bail!("no template fits any of the candidate centers");
        }
        return write_variants(&engine, &variants, &args.out);
    }

    let available = engine.available_templates(request.border_count());
    if available.is_empty() {
        anyhow::bail!(
            "no template supports {} border members",
            request.border_count()
        );
    }

    let chosen: Vec<TemplateVariant> = if args.all {
        available
    } else {
        let preferred = args.family.map(TemplateFamily::from);
        if let Some(family) = preferred
            && !available.iter().any(|t| t.family == family)
        {
            anyhow::bail!(
                "no {family} template for {} border members",
                request.border_count()
            );
        }
        let idx = engine
            .initial_variant_index(&available, preferred)
            .unwrap_or(0);
        vec![available[idx]]
    };

    let request = Arc::new(request);
    let variants: Vec<RenderVariant> = chosen
        .into_iter()
        .map(|v| RenderVariant::new(v, Arc::clone(&request)))
        .collect();
    write_variants(&engine, &variants, &args.out)
}

fn write_variants(engine: &Engine, variants: &[RenderVariant], out: &Path) -> anyhow::Result<()> {
    let rendered = engine.render_variants(variants);

    let mut failed = 0usize;
    for r in rendered {
        let Some(png) = &r.output_image else {
            eprintln!("variant {} failed", r.variant_id);
            failed += 1;
            continue;
        };
        let path = if variants.len() > 1 {
            suffixed(out, &r.variant_id)
        } else {
            out.to_path_buf()
        };
        write_output(&path, png)?;
        eprintln!("wrote {}", path.display());
    }
    if failed > 0 {
        anyhow::bail!("{failed} variant(s) failed to render");
    }
    Ok(())
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "collage".to_owned());
    path.with_file_name(format!("{stem}-{suffix}.png"))
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))
}
