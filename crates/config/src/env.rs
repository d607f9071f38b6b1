use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Overlay of process environment variables plus an optional `.env`-style
/// file, used to resolve `${VAR}` placeholders in a job file before it is
/// parsed as YAML/JSON.
#[derive(Debug, Clone)]
pub struct EnvOverlay {
    vars: HashMap<String, String>,
}

impl EnvOverlay {
    /// Starts from the process environment.
    pub fn from_process() -> Self {
        EnvOverlay {
            vars: std::env::vars().collect(),
        }
    }

    /// Loads an `.env`-style file on top of the process environment. Values
    /// in the file take precedence over the process environment.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadEnvFile {
            path: path.display().to_string(),
            source,
        })?;
        self.parse_env_content(&content)
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), ConfigError> {
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(eq_pos) = line.find('=') else {
                return Err(ConfigError::MalformedEnvFile(format!(
                    "line {} is not KEY=VALUE",
                    line_num + 1
                )));
            };

            let key = line[..eq_pos].trim();
            let value = line[eq_pos + 1..].trim();
            if key.is_empty() {
                return Err(ConfigError::MalformedEnvFile(format!(
                    "line {} has an empty key",
                    line_num + 1
                )));
            }

            self.vars.insert(key.to_string(), Self::unquote(value));
        }
        Ok(())
    }

    fn unquote(value: &str) -> String {
        let value = value.trim();
        if value.len() >= 2 {
            let bytes = value.as_bytes();
            let quoted = (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
                || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'');
            if quoted {
                return value[1..value.len() - 1].to_string();
            }
        }
        value.to_string()
    }

    /// Replaces every `${VAR}` occurrence in `text` with the overlay's
    /// value for `VAR`. An unresolved placeholder is an error, never a
    /// silent empty string.
    pub fn resolve(&self, text: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };
            let name = &after[..end];
            let value = self
                .vars
                .get(name)
                .ok_or_else(|| ConfigError::UnresolvedPlaceholder(name.to_string()))?;
            out.push_str(value);
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl Default for EnvOverlay {
    fn default() -> Self {
        Self::from_process()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_substitutes_known_placeholder() {
        let mut overlay = EnvOverlay {
            vars: HashMap::new(),
        };
        overlay.vars.insert("HOST".into(), "db.internal".into());
        let out = overlay.resolve("mysql://${HOST}:3306/app").unwrap();
        assert_eq!(out, "mysql://db.internal:3306/app");
    }

    #[test]
    fn resolve_rejects_unknown_placeholder() {
        let overlay = EnvOverlay {
            vars: HashMap::new(),
        };
        let err = overlay.resolve("${MISSING}").unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedPlaceholder(name) if name == "MISSING"));
    }

    #[test]
    fn parse_env_content_unquotes_values() {
        let mut overlay = EnvOverlay {
            vars: HashMap::new(),
        };
        overlay
            .parse_env_content("ARCHIVE_SOURCE_URL=\"mysql://user:pw@localhost/app\"\n")
            .unwrap();
        assert_eq!(
            overlay.vars.get("ARCHIVE_SOURCE_URL").unwrap(),
            "mysql://user:pw@localhost/app"
        );
    }

    #[test]
    fn parse_env_content_rejects_malformed_line() {
        let mut overlay = EnvOverlay {
            vars: HashMap::new(),
        };
        let err = overlay.parse_env_content("NOT_KEY_VALUE").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedEnvFile(_)));
    }
}
