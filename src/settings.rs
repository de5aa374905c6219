use crate::compiler_messages::compiler_errors::{CompilerError, ProgramLocation};
use crate::return_config_error;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "patternc.toml";

pub const DEFAULT_CLASS_NAME: &str = "SnowballStemmer";
pub const DEFAULT_PARENT_CLASS_NAME: &str = "SnowballProgram";
pub const DEFAULT_HEADER_COMMENT: &str = "Generated by patternc. Don't edit by hand.";

// Output size guess per routine, just to avoid regrowing the buffer a few times
pub const ROUTINE_OUTPUT_CAPACITY: usize = 1024;

/// Settings for one generated class.
///
/// Loaded from `patternc.toml` when present, then overridden by command line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub class_name: String,
    pub parent_class_name: String,

    /// Emit a `// keyword, line N` comment before each translated node
    pub comments: bool,

    pub header_comment: String,

    /// Recompute the cursor predicates instead of trusting the input
    pub infer_cursor_usage: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            class_name: String::from(DEFAULT_CLASS_NAME),
            parent_class_name: String::from(DEFAULT_PARENT_CLASS_NAME),
            comments: false,
            header_comment: String::from(DEFAULT_HEADER_COMMENT),
            infer_cursor_usage: false,
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml(source: &str) -> Result<GeneratorConfig, CompilerError> {
        let config: GeneratorConfig = toml::from_str(source)
            .map_err(|e| CompilerError::config_error(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<GeneratorConfig, CompilerError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CompilerError::file_error(path, e.to_string()))?;

        GeneratorConfig::from_toml(&source).map_err(|e| {
            let location = e.location.clone();
            e.with_location(ProgramLocation {
                file: Some(path.to_path_buf()),
                ..location
            })
        })
    }

    /// Class names end up verbatim in the output, so they have to be PHP identifiers.
    pub fn check(&self) -> Result<(), CompilerError> {
        for (setting, value) in [
            ("class_name", &self.class_name),
            ("parent_class_name", &self.parent_class_name),
        ] {
            if !is_php_identifier(value) {
                return_config_error!("{} '{}' is not a valid PHP class name", setting, value);
            }
        }

        if self.header_comment.contains('\n') {
            return_config_error!("header_comment must be a single line");
        }

        Ok(())
    }
}

pub fn is_php_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first == '_' || first.is_ascii_alphabetic())
        && chars.all(|ch| ch == '_' || ch.is_ascii_alphanumeric())
}
