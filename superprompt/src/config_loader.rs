use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use log::debug;
use serde::Deserialize;

use superprompt_lib::{
    normalize_extension, normalize_ignore_dir, EmptyDirPolicy, ScanConfig,
    DEFAULT_ABORT_THRESHOLD, DEFAULT_IGNORE_DIRS, DEFAULT_MAX_DEPTH,
};

use crate::{GlobalArgs, ScanArgs};

pub const LOCAL_CONFIG_FILE: &str = ".superprompt.toml";

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub scan: ScanConfig,
    /// Left unvalidated here; `PromptRequest::from_raw` rejects values below 1.
    pub abort_threshold: i64,
}

pub fn build_run_settings(
    global: &GlobalArgs,
    scan_args: &ScanArgs,
    threshold: Option<i64>,
    root: &Path,
) -> Result<RunSettings> {
    let mut acc = SettingsAccum::default();

    if !global.no_config {
        if let Some(base_dirs) = BaseDirs::new() {
            let global_config_path = base_dirs
                .config_dir()
                .join("superprompt")
                .join("config.toml");
            apply_config_file(&global_config_path, &mut acc)?;
        } else {
            debug!("No base directories available; skipping global config search");
        }

        apply_config_file(&root.join(LOCAL_CONFIG_FILE), &mut acc)?;

        if let Some(explicit_path) = global.config_path.as_ref() {
            if !explicit_path.exists() {
                bail!("Config file {:?} does not exist", explicit_path);
            }
            apply_config_file(explicit_path, &mut acc)?;
        }
    } else if let Some(explicit_path) = global.config_path.as_ref() {
        debug!(
            "--no-config specified; skipping explicitly requested config file {:?}",
            explicit_path
        );
    }

    // CLI overrides (highest precedence)
    if let Some(depth) = scan_args.max_depth {
        acc.max_depth = Some(depth);
    }
    if let Some(value) = threshold {
        acc.abort_threshold = Some(value);
    }
    if scan_args.omit_empty_dirs {
        acc.omit_empty_dirs = Some(true);
    }
    if scan_args.no_default_ignores {
        acc.default_ignores = Some(false);
    }
    // Support comma-separated values (e.g. --ignore-dir "target,node_modules")
    for raw in &scan_args.ignore_dirs {
        acc.ignore_dirs.push_list(raw);
    }
    for raw in &scan_args.ignore_exts {
        acc.ignore_exts.push_list(raw);
    }

    let mut ignore_dirs = EntryAccumulator::new(EntryKind::Dir);
    if acc.default_ignores.unwrap_or(true) {
        ignore_dirs.merge(DEFAULT_IGNORE_DIRS.iter().copied());
    }
    ignore_dirs.merge(acc.ignore_dirs.into_vec());

    let max_depth = acc.max_depth.unwrap_or(DEFAULT_MAX_DEPTH as i64);
    let scan = ScanConfig::from_raw(
        root,
        max_depth,
        ignore_dirs.into_vec(),
        acc.ignore_exts.into_vec(),
    )
    .context("Invalid tree settings")?
    .with_empty_dirs(if acc.omit_empty_dirs.unwrap_or(false) {
        EmptyDirPolicy::Omit
    } else {
        EmptyDirPolicy::KeepWithinDepth
    });

    Ok(RunSettings {
        scan,
        abort_threshold: acc
            .abort_threshold
            .unwrap_or(DEFAULT_ABORT_THRESHOLD as i64),
    })
}

#[derive(Debug)]
struct SettingsAccum {
    max_depth: Option<i64>,
    abort_threshold: Option<i64>,
    omit_empty_dirs: Option<bool>,
    default_ignores: Option<bool>,
    ignore_dirs: EntryAccumulator,
    ignore_exts: EntryAccumulator,
}

impl Default for SettingsAccum {
    fn default() -> Self {
        Self {
            max_depth: None,
            abort_threshold: None,
            omit_empty_dirs: None,
            default_ignores: None,
            ignore_dirs: EntryAccumulator::new(EntryKind::Dir),
            ignore_exts: EntryAccumulator::new(EntryKind::Ext),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum EntryKind {
    Dir,
    Ext,
}

#[derive(Debug)]
struct EntryAccumulator {
    kind: EntryKind,
    entries: Vec<String>,
    seen: HashSet<String>,
}

impl EntryAccumulator {
    fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn push<S: AsRef<str>>(&mut self, entry: S) {
        let normalized = match self.kind {
            EntryKind::Dir => normalize_ignore_dir(entry.as_ref()),
            EntryKind::Ext => normalize_extension(entry.as_ref()),
        };
        let Some(normalized) = normalized else {
            return;
        };
        if self.seen.insert(normalized.clone()) {
            debug!("Adding ignore {:?} entry: {}", self.kind, normalized);
            self.entries.push(normalized);
        } else {
            debug!("Skipping duplicate ignore {:?} entry: {}", self.kind, normalized);
        }
    }

    fn push_list(&mut self, raw: &str) {
        for part in raw.split(',') {
            self.push(part);
        }
    }

    fn merge<I>(&mut self, iter: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for item in iter {
            self.push(item);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.entries
    }
}

fn apply_config_file(path: &Path, acc: &mut SettingsAccum) -> Result<()> {
    if !path.exists() {
        debug!("Config file {:?} not found; skipping", path);
        return Ok(());
    }

    debug!("Loading config from {:?}", path);
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;

    let parsed: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;

    if let Some(tree_section) = parsed.tree {
        apply_tree_section(tree_section, acc);
    }
    if let Some(prompt_section) = parsed.prompt {
        if let Some(value) = prompt_section.abort_threshold {
            acc.abort_threshold = Some(value);
        }
    }

    Ok(())
}

fn apply_tree_section(section: TreeSection, acc: &mut SettingsAccum) {
    if let Some(value) = section.max_depth {
        acc.max_depth = Some(value);
    }
    if let Some(values) = section.ignore_dirs {
        acc.ignore_dirs.merge(values);
    }
    if let Some(values) = section.ignore_exts {
        acc.ignore_exts.merge(values);
    }
    if let Some(value) = section.omit_empty_dirs {
        acc.omit_empty_dirs = Some(value);
    }
    if let Some(value) = section.default_ignores {
        acc.default_ignores = Some(value);
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    tree: Option<TreeSection>,
    #[serde(default)]
    prompt: Option<PromptSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TreeSection {
    max_depth: Option<i64>,
    ignore_dirs: Option<Vec<String>>,
    ignore_exts: Option<Vec<String>>,
    omit_empty_dirs: Option<bool>,
    default_ignores: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PromptSection {
    abort_threshold: Option<i64>,
}
