use anyhow::{bail, Context, Result}; // Use anyhow for easy error handling in the binary
use arboard::Clipboard;
use clap::{Args, Parser, Subcommand};
use log::{debug, info, warn, LevelFilter};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use superprompt_lib::{
    build_super_prompt, build_tree, file_values, render_tree, validate_root, PromptRequest,
    PromptResult, ScanConfig,
};

mod config_loader;

use config_loader::{build_run_settings, RunSettings};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Pick files from a directory tree and stitch them into one prompt for an LLM chat.",
    long_about = "superprompt shows a filtered, depth-limited tree of a project and assembles selected files into a single Markdown text (a \"super prompt\"), prefixed by your instruction, ready to paste into an LLM chat.\n\nSettings are read from the user config directory (superprompt/config.toml), then <ROOT>/.superprompt.toml, then --config, then command-line flags."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct GlobalArgs {
    /// Enable verbose output. Use -v for info, -vv for debug, -vvv for trace.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read settings from this TOML file (applied after the global and local config files).
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config_path: Option<PathBuf>,

    /// Ignore all config files.
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the filtered directory tree.
    Tree(TreeArgs),
    /// Assemble the selected files into a super prompt.
    Build(BuildArgs),
}

/// Settings shared by every command that scans the tree.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct ScanArgs {
    /// Root folder of the project. Defaults to the current working directory.
    #[arg(index = 1)]
    pub root: Option<PathBuf>,

    /// Tree max depth (0 lists only the root's own entries).
    #[arg(short = 'd', long = "depth", value_name = "N", allow_negative_numbers = true)]
    pub max_depth: Option<i64>,

    /// Directory name to hide wherever it appears. Can be repeated or comma-separated.
    #[arg(long = "ignore-dir", value_name = "NAME")]
    pub ignore_dirs: Vec<String>,

    /// File extension (without the dot) to hide. Can be repeated or comma-separated.
    #[arg(long = "ignore-ext", value_name = "EXT")]
    pub ignore_exts: Vec<String>,

    /// Drop directories that have no children, even above the depth limit.
    #[arg(long)]
    pub omit_empty_dirs: bool,

    /// Do not hide the built-in directories ("assets", "secret").
    #[arg(long)]
    pub no_default_ignores: bool,
}

#[derive(Args, Debug)]
struct TreeArgs {
    #[command(flatten)]
    scan: ScanArgs,

    /// Print the tree as JSON nodes ({label, value, children, icon}).
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[command(flatten)]
    scan: ScanArgs,

    /// Files to include, relative to ROOT. Order is kept.
    #[arg(index = 2, value_name = "FILES", num_args = 0..)]
    files: Vec<String>,

    /// Read selected paths from a file, one per line ('#' starts a comment, '-' reads stdin).
    #[arg(long, value_name = "FILE")]
    files_from: Option<PathBuf>,

    /// Select every file shown by the tree, in tree order.
    #[arg(short = 'a', long)]
    all: bool,

    /// Instruction placed before the files.
    #[arg(short = 'p', long, conflicts_with = "prompt_file")]
    prompt: Option<String>,

    /// Read the instruction from a file.
    #[arg(long, value_name = "FILE")]
    prompt_file: Option<PathBuf>,

    /// Refuse to build when more than this many files are selected.
    #[arg(short = 't', long = "threshold", value_name = "N", allow_negative_numbers = true)]
    abort_threshold: Option<i64>,

    /// Write output to a file instead of stdout.
    #[arg(short = 'o', long, conflicts_with = "clipboard")]
    output: Option<PathBuf>,

    /// Copy output to the system clipboard instead of stdout or a file.
    #[arg(short = 'c', long, conflicts_with = "output")]
    clipboard: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // --- Initialize Logging ---
    let log_level = match cli.global.verbose {
        0 => LevelFilter::Warn,  // Default: Show warnings and errors
        1 => LevelFilter::Info,  // -v: Show info, warnings, errors
        2 => LevelFilter::Debug, // -vv: Show debug, info, warnings, errors
        _ => LevelFilter::Trace, // -vvv and more: Show everything
    };

    env_logger::Builder::new().filter_level(log_level).init();

    info!("Log level set to: {}", log_level);
    debug!("Parsed arguments: {:?}", cli);

    match &cli.command {
        Command::Tree(args) => run_tree(&cli.global, args),
        Command::Build(args) => run_build(&cli.global, args),
    }
}

fn resolve_settings(
    global: &GlobalArgs,
    scan: &ScanArgs,
    threshold: Option<i64>,
) -> Result<RunSettings> {
    let root = match scan.root.as_ref() {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to get current working directory")?,
    };
    let root = validate_root(&root).context("Invalid base folder")?;
    info!("Root folder determined as: {:?}", root);

    let settings = build_run_settings(global, scan, threshold, &root)?;
    debug!("Run settings: {:?}", settings);
    Ok(settings)
}

fn run_tree(global: &GlobalArgs, args: &TreeArgs) -> Result<()> {
    let settings = resolve_settings(global, &args.scan, None)?;
    let tree = build_tree(&settings.scan);
    if tree.is_empty() {
        warn!("No entries to show under {:?}", settings.scan.root_path);
    }

    let rendered = if args.json {
        let mut json = serde_json::to_string_pretty(&tree).context("Failed to serialize tree")?;
        json.push('\n');
        json
    } else {
        render_tree(&tree)
    };

    let mut stdout = io::stdout();
    stdout
        .write_all(rendered.as_bytes())
        .context("Failed to write tree to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn run_build(global: &GlobalArgs, args: &BuildArgs) -> Result<()> {
    let settings = resolve_settings(global, &args.scan, args.abort_threshold)?;
    let selected = collect_selection(args, &settings.scan)?;
    if selected.is_empty() {
        info!("No files selected; nothing to build.");
        return Ok(());
    }
    info!("{} entries selected", selected.len());

    let user_prompt = match (&args.prompt, &args.prompt_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read prompt file: {:?}", path))?,
        ),
        (None, None) => None,
    };

    let request = PromptRequest::from_raw(
        selected,
        &settings.scan.root_path,
        user_prompt.as_deref(),
        settings.abort_threshold,
    )
    .context("Invalid prompt settings")?;

    let super_prompt = match build_super_prompt(&request) {
        PromptResult::Assembled(text) => text,
        too_many @ PromptResult::TooManyFiles { .. } => bail!("{}", too_many),
    };

    write_output(args, super_prompt)
}

/// Selected paths from `FILES`, `--files-from` and `--all`, in that order,
/// without duplicates.
fn collect_selection(args: &BuildArgs, scan: &ScanConfig) -> Result<Vec<String>> {
    let mut selected: Vec<String> = Vec::new();
    let mut push = |path: String| {
        if !selected.contains(&path) {
            selected.push(path);
        }
    };

    for path in &args.files {
        push(normalize_selected(path));
    }

    if let Some(list_path) = args.files_from.as_ref() {
        let contents = if list_path == Path::new("-") {
            io::read_to_string(io::stdin()).context("Failed to read selection from stdin")?
        } else {
            fs::read_to_string(list_path)
                .with_context(|| format!("Failed to read selection file: {:?}", list_path))?
        };
        for path in parse_selection_list(&contents) {
            push(path);
        }
    }

    if args.all {
        for path in file_values(&build_tree(scan)) {
            push(path);
        }
    }

    Ok(selected)
}

fn parse_selection_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_selected)
        .collect()
}

// Tree values are '/'-joined and relative; accept "./x" and Windows separators too.
fn normalize_selected(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    unified
        .strip_prefix("./")
        .unwrap_or(&unified)
        .to_string()
}

fn write_output(args: &BuildArgs, content: String) -> Result<()> {
    if args.clipboard {
        info!("Copying output to clipboard...");
        let mut clipboard = Clipboard::new().context("Failed to initialize clipboard")?;
        clipboard
            .set_text(content)
            .context("Failed to copy content to clipboard")?;
        info!("Successfully copied content to clipboard.");
    } else if let Some(output_path) = args.output.as_ref() {
        info!("Writing output to file: {:?}", output_path);
        let mut file = File::create(output_path)
            .with_context(|| format!("Failed to create output file: {:?}", output_path))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write content to file: {:?}", output_path))?;
        info!("Successfully wrote content to {:?}", output_path);
    } else {
        debug!("Writing output to stdout...");
        let mut stdout = io::stdout();
        stdout
            .write_all(content.as_bytes())
            .context("Failed to write content to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
        debug!("Finished writing to stdout.");
    }

    Ok(())
}
