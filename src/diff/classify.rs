use crate::config::FileExtensionsConfig;
use crate::devops::Change;

/// Decides which changed files take part in line counting.
#[derive(Debug, Clone)]
pub struct FileFilter {
    /// Extensions without the leading dot, compared case-sensitively
    extensions: Vec<String>,
    /// Lowercased generated-file basenames
    excluded_names: Vec<String>,
}

impl FileFilter {
    pub fn new(extensions: &[String], excluded_names: &[String]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
            excluded_names: excluded_names
                .iter()
                .map(|name| name.to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &FileExtensionsConfig) -> Self {
        Self::new(&config.admissible, &config.excluded_files)
    }

    /// Real files with an admissible extension that are not generated.
    pub fn is_admissible(&self, change: &Change) -> bool {
        if change.item.is_folder {
            return false;
        }

        let name = file_name(&change.item.path);
        if self.excluded_names.contains(&name.to_lowercase()) {
            return false;
        }

        match extension(name) {
            Some(ext) => self.extensions.iter().any(|allowed| allowed == ext),
            None => false,
        }
    }

    /// Keep admissible changes, preserving their order.
    pub fn classify<'c>(&self, changes: &'c [Change]) -> Vec<&'c Change> {
        changes
            .iter()
            .filter(|change| self.is_admissible(change))
            .collect()
    }
}

/// Last segment of a repository path.
fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Extension of a file name, without the dot. Dotfiles such as ".editorconfig"
/// have no extension.
fn extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(0) | None => None,
        Some(dot) if dot + 1 == name.len() => None,
        Some(dot) => Some(&name[dot + 1..]),
    }
}
