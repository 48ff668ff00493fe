use crate::lexer::Keywords;
use crate::parser::DEFAULT_MAX_DEPTH;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// What the runner prints for each source it processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emit {
    Tokens,
    Ast,
    #[default]
    Value,
}

impl FromStr for Emit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tokens" => Ok(Emit::Tokens),
            "ast" => Ok(Emit::Ast),
            "value" => Ok(Emit::Value),
            other => Err(format!("unknown emit mode '{}' (expected tokens, ast or value)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub keywords: Keywords,
    pub max_depth: usize,
    pub emit: Emit,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keywords: Keywords::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            emit: Emit::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read keyword file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected 'name = spelling'")]
    Malformed { line: usize },
    #[error("line {line}: '{name}' is not a keyword")]
    UnknownKeyword { line: usize, name: String },
    #[error("line {line}: '{spelling}' cannot be spelled as an identifier")]
    InvalidSpelling { line: usize, spelling: String },
}

impl Config {
    /// Replaces keyword spellings with the ones listed in the file at `path`.
    pub fn load_keywords(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.keywords = parse_keyword_file(&text)?;
        tracing::debug!(path = %path.display(), "loaded keyword spellings");
        Ok(())
    }
}

/// Reads `name = spelling` lines on top of the default spellings. Blank
/// lines and lines starting with `#` or `!` are skipped.
pub fn parse_keyword_file(text: &str) -> Result<Keywords, ConfigError> {
    let mut keywords = Keywords::default();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let entry = raw.trim();
        if entry.is_empty() || entry.starts_with('#') || entry.starts_with('!') {
            continue;
        }

        let Some((name, spelling)) = entry.split_once('=') else {
            return Err(ConfigError::Malformed { line });
        };
        let (name, spelling) = (name.trim(), spelling.trim());

        if !is_identifier(spelling) {
            return Err(ConfigError::InvalidSpelling {
                line,
                spelling: spelling.to_string(),
            });
        }
        if !keywords.set_spelling(name, spelling) {
            return Err(ConfigError::UnknownKeyword {
                line,
                name: name.to_string(),
            });
        }
    }

    Ok(keywords)
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}
