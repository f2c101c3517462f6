// --- FILE: superprompt-lib/src/tree.rs ---

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::{EmptyDirPolicy, ScanConfig};
use crate::errors::{CoreError, CoreResult};
use crate::listing::list_dir_sorted;
use crate::utils::extension_of;

/// Whether a [`TreeNode`] stands for a directory or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

impl NodeKind {
    /// Icon name used by tree widgets.
    pub fn icon(self) -> &'static str {
        match self {
            NodeKind::Directory => "folder",
            NodeKind::File => "file",
        }
    }
}

/// One entry of the filtered directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// The entry's own name.
    pub label: String,
    /// Path relative to the scan root, joined with `/`.
    pub value: String,
    pub kind: NodeKind,
    /// Always empty for files.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn file(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    pub fn directory(
        label: impl Into<String>,
        value: impl Into<String>,
        children: Vec<TreeNode>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            kind: NodeKind::Directory,
            children,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Values of every file at or below this node, in traversal order.
    pub fn file_values(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_file_values(std::slice::from_ref(self), &mut out);
        out
    }
}

// Serialises to the node shape tree widgets expect: `children` only on
// directories, plus an `icon` hint.
impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.is_dir() { 4 } else { 3 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("label", &self.label)?;
        map.serialize_entry("value", &self.value)?;
        if self.is_dir() {
            map.serialize_entry("children", &self.children)?;
        }
        map.serialize_entry("icon", self.kind.icon())?;
        map.end()
    }
}

/// Values of every file in `nodes`, depth first, in sibling order.
///
/// This is the order a "select all" in a tree view produces, so the result
/// can be passed straight to the prompt assembler.
pub fn file_values(nodes: &[TreeNode]) -> Vec<String> {
    let mut out = Vec::new();
    collect_file_values(nodes, &mut out);
    out
}

fn collect_file_values(nodes: &[TreeNode], out: &mut Vec<String>) {
    for node in nodes {
        match node.kind {
            NodeKind::File => out.push(node.value.clone()),
            NodeKind::Directory => collect_file_values(&node.children, out),
        }
    }
}

/// Builds the filtered, depth-limited tree below `config.root_path`.
///
/// Entries are visited depth first and siblings come out in ordinal name
/// order, directories and files interleaved. See [`ScanConfig`] for the
/// ignore rules and [`EmptyDirPolicy`] for how empty directories are treated.
///
/// This never fails. A sub-directory that cannot be listed because of
/// permissions or because it vanished is logged and treated as empty. Any
/// other error, including failure to list the root itself, is logged and
/// yields an empty tree.
///
/// # Examples
///
/// ```no_run
/// use superprompt_lib::{build_tree, ScanConfig};
///
/// let config = ScanConfig::new("./my_project", 2).with_ignore_dirs(["target", ".git"]);
/// for node in build_tree(&config) {
///     println!("{}", node.value);
/// }
/// ```
pub fn build_tree(config: &ScanConfig) -> Vec<TreeNode> {
    info!(
        "Building tree for {:?} (max depth {})",
        config.root_path, config.max_depth
    );
    let walker = TreeWalker { config };
    match walker.walk(&config.root_path, 0, "") {
        Ok(nodes) => {
            debug!("Tree built with {} top-level entries", nodes.len());
            nodes
        }
        Err(e) => {
            error!("Failed to build directory tree: {}", e);
            Vec::new()
        }
    }
}

/// Positional form of [`build_tree`] for callers holding the settings as
/// separate values.
pub fn build_tree_from<D, E>(
    root_path: &Path,
    max_depth: usize,
    ignore_dirs: D,
    ignore_exts: E,
) -> Vec<TreeNode>
where
    D: IntoIterator,
    D::Item: AsRef<str>,
    E: IntoIterator,
    E::Item: AsRef<str>,
{
    let config = ScanConfig::new(root_path, max_depth)
        .with_ignore_dirs(ignore_dirs)
        .with_ignore_exts(ignore_exts);
    build_tree(&config)
}

struct TreeWalker<'a> {
    config: &'a ScanConfig,
}

impl TreeWalker<'_> {
    fn walk(&self, dir: &Path, depth: usize, rel_prefix: &str) -> CoreResult<Vec<TreeNode>> {
        if depth > self.config.max_depth {
            return Ok(Vec::new());
        }

        let entries = match list_dir_sorted(dir) {
            Ok(entries) => entries,
            Err(e) if depth > 0 && e.is_branch_local() => {
                warn!("Error accessing {:?}: {}", dir, e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let rel_path = if rel_prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", rel_prefix, entry.name)
            };

            if entry.is_dir {
                if !self.include_dir(&rel_path) {
                    debug!("Ignoring directory: {}", rel_path);
                    continue;
                }
                let children = self.walk(&entry.path, depth + 1, &rel_path)?;
                if self.keep_dir(&children, depth) {
                    items.push(TreeNode::directory(entry.name, rel_path, children));
                } else {
                    debug!("Dropping empty directory at depth {}: {}", depth, rel_path);
                }
            } else if self.include_file(&entry.path) {
                items.push(TreeNode::file(entry.name, rel_path));
            } else {
                debug!("Ignoring file by extension: {}", rel_path);
            }
        }

        Ok(items)
    }

    fn include_dir(&self, rel_path: &str) -> bool {
        !has_ignored_segment(rel_path, &self.config.ignore_dirs)
    }

    fn include_file(&self, path: &Path) -> bool {
        match extension_of(path) {
            Some(ext) => !self.config.ignore_exts.contains(&*ext),
            None => true,
        }
    }

    fn keep_dir(&self, children: &[TreeNode], depth: usize) -> bool {
        if !children.is_empty() {
            return true;
        }
        match self.config.empty_dirs {
            EmptyDirPolicy::KeepWithinDepth => depth < self.config.max_depth,
            EmptyDirPolicy::Omit => false,
        }
    }
}

fn has_ignored_segment(rel_path: &str, ignore_dirs: &BTreeSet<String>) -> bool {
    !ignore_dirs.is_empty() && rel_path.split('/').any(|seg| ignore_dirs.contains(seg))
}

/// Renders nodes as an indented list, two spaces per level, directories
/// suffixed with `/`.
pub fn render_tree(nodes: &[TreeNode]) -> String {
    let mut out = String::new();
    render_level(nodes, 0, &mut out);
    out
}

fn render_level(nodes: &[TreeNode], level: usize, out: &mut String) {
    for node in nodes {
        out.push_str(&"  ".repeat(level));
        out.push_str("- ");
        out.push_str(&node.label);
        if node.is_dir() {
            out.push('/');
        }
        out.push('\n');
        render_level(&node.children, level + 1, out);
    }
}

/// Checks that `root` exists and is a directory, returning its canonical form.
///
/// The tree builder assumes a valid root; callers run this first.
pub fn validate_root(root: &Path) -> CoreResult<PathBuf> {
    let canonical = root.canonicalize().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CoreError::InvalidRoot(root.to_path_buf())
        } else {
            CoreError::IoError {
                path: root.to_path_buf(),
                source: e,
            }
        }
    })?;
    if !canonical.is_dir() {
        return Err(CoreError::InvalidRoot(root.to_path_buf()));
    }
    debug!("Validated root: {:?}", canonical);
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    // root/
    //   README
    //   a.txt
    //   assets/logo.png
    //   empty/
    //   src/main.rs
    //   src/data.json
    //   src/secret/key.pem
    //   src/nested/deeper/leaf.rs
    fn setup_test_dir() -> Result<(TempDir, PathBuf)> {
        let dir = tempdir()?;
        let path = dir.path().to_path_buf();

        fs::write(path.join("README"), "readme")?;
        fs::write(path.join("a.txt"), "hi")?;
        fs::create_dir(path.join("assets"))?;
        fs::write(path.join("assets").join("logo.png"), [0u8, 1, 2])?;
        fs::create_dir(path.join("empty"))?;
        fs::create_dir_all(path.join("src").join("secret"))?;
        fs::write(path.join("src").join("main.rs"), "fn main() {}")?;
        fs::write(path.join("src").join("data.json"), "{}")?;
        fs::write(path.join("src").join("secret").join("key.pem"), "---")?;
        fs::create_dir_all(path.join("src").join("nested").join("deeper"))?;
        fs::write(
            path.join("src").join("nested").join("deeper").join("leaf.rs"),
            "// leaf",
        )?;

        Ok((dir, path))
    }

    fn all_values(nodes: &[TreeNode]) -> Vec<String> {
        let mut out = Vec::new();
        fn walk(nodes: &[TreeNode], out: &mut Vec<String>) {
            for n in nodes {
                out.push(n.value.clone());
                walk(&n.children, out);
            }
        }
        walk(nodes, &mut out);
        out
    }

    #[test]
    fn depth_zero_lists_only_top_level() -> Result<()> {
        let (_dir, path) = setup_test_dir()?;
        let tree = build_tree(&ScanConfig::new(&path, 0));

        // Directories at the boundary are never expanded, so they end up
        // empty and are dropped.
        assert_eq!(all_values(&tree), vec!["README", "a.txt"]);
        Ok(())
    }

    #[test]
    fn empty_dirs_within_depth_are_kept_by_default() -> Result<()> {
        let (_dir, path) = setup_test_dir()?;
        let tree = build_tree(&ScanConfig::new(&path, 1));

        let empty = tree.iter().find(|n| n.label == "empty").unwrap();
        assert!(empty.is_dir());
        assert!(empty.children.is_empty());

        // src/nested and src/secret sit at the boundary: not expanded, dropped.
        let values = all_values(&tree);
        assert!(values.contains(&"src/main.rs".to_string()));
        assert!(!values.contains(&"src/nested".to_string()), "{values:?}");
        assert!(!values.contains(&"src/secret".to_string()), "{values:?}");
        Ok(())
    }

    #[test]
    fn omit_policy_drops_every_empty_dir() -> Result<()> {
        let (_dir, path) = setup_test_dir()?;
        let config = ScanConfig::new(&path, 1).with_empty_dirs(EmptyDirPolicy::Omit);
        let values = all_values(&build_tree(&config));
        assert!(!values.contains(&"empty".to_string()));
        assert!(values.contains(&"src/main.rs".to_string()));
        Ok(())
    }

    #[test]
    fn ignore_dirs_match_any_segment() -> Result<()> {
        let (_dir, path) = setup_test_dir()?;
        let config = ScanConfig::new(&path, 5).with_ignore_dirs(["secret", "assets"]);
        let values = all_values(&build_tree(&config));

        assert!(values.iter().all(|v| !v.split('/').any(|s| s == "secret")));
        assert!(values.iter().all(|v| !v.starts_with("assets")));
        assert!(values.contains(&"src/nested/deeper/leaf.rs".to_string()));
        Ok(())
    }

    #[test]
    fn ignore_dirs_do_not_apply_to_files_or_substrings() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        fs::write(root.join("secret"), "a file named like an ignored dir")?;
        fs::create_dir(root.join("secrets"))?;
        fs::write(root.join("secrets").join("x.txt"), "x")?;

        let config = ScanConfig::new(root, 2).with_ignore_dirs(["secret"]);
        let values = all_values(&build_tree(&config));
        assert_eq!(values, vec!["secret", "secrets", "secrets/x.txt"]);
        Ok(())
    }

    #[test]
    fn ignore_exts_skip_files_but_not_extensionless_ones() -> Result<()> {
        let (_dir, path) = setup_test_dir()?;
        let dotfile_root = path.join("src");
        fs::write(dotfile_root.join(".json"), "dotfile without extension")?;

        let config = ScanConfig::new(&path, 3).with_ignore_exts(["json", "rs", ""]);
        let values = all_values(&build_tree(&config));

        assert!(values.contains(&"README".to_string()));
        assert!(values.contains(&"src/.json".to_string()));
        assert!(!values.contains(&"src/data.json".to_string()));
        assert!(values.iter().all(|v| !v.ends_with(".rs")));
        Ok(())
    }

    #[test]
    fn leading_dots_never_form_an_extension() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("..bashrc"), "")?;
        fs::write(dir.path().join("..env.bashrc"), "")?;

        let config = ScanConfig::new(dir.path(), 0).with_ignore_exts(["bashrc"]);
        let values = all_values(&build_tree(&config));
        assert_eq!(values, vec!["..bashrc"]);
        Ok(())
    }

    #[test]
    fn extension_matching_is_case_sensitive() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("upper.JSON"), "{}")?;
        fs::write(dir.path().join("lower.json"), "{}")?;

        let config = ScanConfig::new(dir.path(), 0).with_ignore_exts(["json"]);
        let values = all_values(&build_tree(&config));
        assert_eq!(values, vec!["upper.JSON"]);
        Ok(())
    }

    #[test]
    fn no_value_is_deeper_than_max_depth_plus_one() -> Result<()> {
        let (_dir, path) = setup_test_dir()?;
        for max_depth in 0..5 {
            let values = all_values(&build_tree(&ScanConfig::new(&path, max_depth)));
            for v in &values {
                assert!(
                    v.split('/').count() <= max_depth + 1,
                    "{v} too deep for max depth {max_depth}"
                );
            }
        }
        Ok(())
    }

    #[test]
    fn values_join_ancestor_labels() -> Result<()> {
        let (_dir, path) = setup_test_dir()?;
        fn check(nodes: &[TreeNode], prefix: &str) {
            for n in nodes {
                let expected = if prefix.is_empty() {
                    n.label.clone()
                } else {
                    format!("{}/{}", prefix, n.label)
                };
                assert_eq!(n.value, expected);
                if !n.is_dir() {
                    assert!(n.children.is_empty());
                }
                check(&n.children, &n.value);
            }
        }
        check(&build_tree(&ScanConfig::new(&path, 4)), "");
        Ok(())
    }

    #[test]
    fn repeated_scans_are_identical() -> Result<()> {
        let (_dir, path) = setup_test_dir()?;
        let config = ScanConfig::new(&path, 3).with_ignore_exts(["png"]);
        assert_eq!(build_tree(&config), build_tree(&config));
        Ok(())
    }

    #[test]
    fn missing_root_yields_empty_tree() {
        let dir = tempdir().unwrap();
        let tree = build_tree(&ScanConfig::new(dir.path().join("missing"), 2));
        assert!(tree.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_treated_as_empty() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let root = dir.path();
        let locked = root.join("locked");
        fs::create_dir(&locked)?;
        fs::write(locked.join("hidden.txt"), "x")?;
        fs::write(root.join("open.txt"), "y")?;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

        // Running as root ignores permission bits; nothing to check then.
        let readable_anyway = fs::read_dir(&locked).is_ok();
        let tree = build_tree(&ScanConfig::new(root, 2));

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

        let values = all_values(&tree);
        assert!(values.contains(&"open.txt".to_string()));
        if !readable_anyway {
            assert!(!values.contains(&"locked/hidden.txt".to_string()));
            // Still within depth, so the directory stays as an empty node.
            assert!(values.contains(&"locked".to_string()));
        }
        Ok(())
    }

    #[test]
    fn file_values_follow_traversal_order() {
        let tree = vec![
            TreeNode::file("a.txt", "a.txt"),
            TreeNode::directory(
                "b",
                "b",
                vec![
                    TreeNode::file("c.py", "b/c.py"),
                    TreeNode::directory("d", "b/d", vec![TreeNode::file("e", "b/d/e")]),
                ],
            ),
            TreeNode::file("z", "z"),
        ];
        assert_eq!(file_values(&tree), vec!["a.txt", "b/c.py", "b/d/e", "z"]);
        assert_eq!(tree[1].file_values(), vec!["b/c.py", "b/d/e"]);
    }

    #[test]
    fn render_tree_indents_by_level() {
        let tree = vec![
            TreeNode::file("a.txt", "a.txt"),
            TreeNode::directory("b", "b", vec![TreeNode::file("c.py", "b/c.py")]),
        ];
        assert_eq!(render_tree(&tree), "- a.txt\n- b/\n  - c.py\n");
    }

    #[test]
    fn serializes_to_widget_shape() -> Result<()> {
        let tree = vec![
            TreeNode::file("a.txt", "a.txt"),
            TreeNode::directory("b", "b", vec![]),
        ];
        let json = serde_json::to_value(&tree)?;
        assert_eq!(
            json,
            serde_json::json!([
                {"label": "a.txt", "value": "a.txt", "icon": "file"},
                {"label": "b", "value": "b", "children": [], "icon": "folder"}
            ])
        );
        Ok(())
    }

    #[test]
    fn validate_root_rejects_missing_and_files() -> Result<()> {
        let (_dir, path) = setup_test_dir()?;
        assert!(validate_root(&path).is_ok());
        assert!(matches!(
            validate_root(&path.join("nope")),
            Err(CoreError::InvalidRoot(_))
        ));
        assert!(matches!(
            validate_root(&path.join("a.txt")),
            Err(CoreError::InvalidRoot(_))
        ));
        Ok(())
    }
}
