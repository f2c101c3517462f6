// --- FILE: superprompt-lib/src/processing.rs ---

use std::fmt;
use std::path::Path;

use log::{debug, info, warn};

use crate::config::PromptRequest;
use crate::utils::{extension_of, read_text_with, FileSource, OsFiles};

/// Fence tag used for files without an extension.
const FALLBACK_LANGUAGE: &str = "text";

/// Outcome of assembling a super prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    /// The finished prompt text.
    Assembled(String),
    /// More entries were selected than the abort threshold allows. No file
    /// was read.
    TooManyFiles { selected: usize, threshold: usize },
}

impl PromptResult {
    pub fn is_assembled(&self) -> bool {
        matches!(self, PromptResult::Assembled(_))
    }

    /// The prompt text, or the user-facing threshold message.
    pub fn into_text(self) -> String {
        match self {
            PromptResult::Assembled(text) => text,
            too_many => too_many.to_string(),
        }
    }
}

impl fmt::Display for PromptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptResult::Assembled(text) => f.write_str(text),
            PromptResult::TooManyFiles {
                selected,
                threshold,
            } => write!(
                f,
                "Error: Too many files selected ({}). The maximum is {}. Please select fewer files.",
                selected, threshold
            ),
        }
    }
}

/// Assembles the user prompt and the selected files into one Markdown text.
///
/// If more entries are selected than `abort_threshold`, nothing is read and
/// [`PromptResult::TooManyFiles`] is returned. Otherwise the prompt (when not
/// empty) comes first, followed by one fenced block per selected file in the
/// order given:
///
/// ````text
/// `src/main.rs`:
/// ```rs
/// fn main() {}
/// ```
///
/// ````
///
/// Selected paths that do not exist or are not regular files (directories,
/// for example) are skipped silently. Unreadable files are included with an
/// error message as their content; see [`crate::read_file_safely`].
///
/// # Examples
///
/// ```no_run
/// use superprompt_lib::{build_super_prompt, PromptRequest};
///
/// let request = PromptRequest::new(
///     vec!["src/main.rs".to_string()],
///     "./my_project",
///     "Explain this code",
///     50,
/// )?;
/// println!("{}", build_super_prompt(&request));
/// # Ok::<(), superprompt_lib::CoreError>(())
/// ```
pub fn build_super_prompt(request: &PromptRequest) -> PromptResult {
    build_super_prompt_with(request, &OsFiles)
}

/// [`build_super_prompt`] reading through a custom [`FileSource`].
pub fn build_super_prompt_with<F: FileSource + ?Sized>(
    request: &PromptRequest,
    files: &F,
) -> PromptResult {
    let selected = request.selected_files.len();
    if selected > request.abort_threshold {
        warn!(
            "Refusing to build prompt: {} files selected, threshold is {}",
            selected, request.abort_threshold
        );
        return PromptResult::TooManyFiles {
            selected,
            threshold: request.abort_threshold,
        };
    }

    info!(
        "Building super prompt from {} selected entries under {:?}",
        selected, request.root_path
    );
    let mut super_prompt = String::with_capacity(request.user_prompt.len() + selected * 1024);

    if !request.user_prompt.is_empty() {
        super_prompt.push_str(&request.user_prompt);
        super_prompt.push_str("\n\n");
    }

    let mut included = 0usize;
    for rel_path in &request.selected_files {
        let file_path = request.root_path.join(rel_path);
        if !files.is_file(&file_path) {
            debug!("Skipping {:?}: missing or not a regular file", file_path);
            continue;
        }

        let content = read_text_with(files, &file_path);
        push_file_block(&mut super_prompt, rel_path, &content);
        included += 1;
    }

    debug!(
        "Super prompt assembled: {} of {} entries included, {} bytes",
        included,
        selected,
        super_prompt.len()
    );
    PromptResult::Assembled(super_prompt)
}

/// Positional form of [`build_super_prompt`] returning the text directly.
///
/// A zero threshold is rejected like in [`PromptRequest::new`]: nothing is
/// read and the returned text is an `Error: ...` message.
pub fn super_prompt_text<S: AsRef<str>>(
    selected_files: &[S],
    root_path: &Path,
    user_prompt: &str,
    abort_threshold: usize,
) -> String {
    let selected = selected_files
        .iter()
        .map(|s| s.as_ref().to_string())
        .collect();
    match PromptRequest::new(selected, root_path, user_prompt, abort_threshold) {
        Ok(request) => build_super_prompt(&request).into_text(),
        Err(e) => {
            warn!("Not building super prompt: {}", e);
            format!("Error: {}.", e)
        }
    }
}

fn push_file_block(out: &mut String, rel_path: &str, content: &str) {
    let language = extension_of(Path::new(rel_path));
    let language = language.as_deref().unwrap_or(FALLBACK_LANGUAGE);
    out.push('`');
    out.push_str(rel_path);
    out.push_str("`:\n```");
    out.push_str(language);
    out.push('\n');
    out.push_str(content);
    out.push_str("\n```\n\n");
}
