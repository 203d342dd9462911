// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini CLI installation for contexto
//!
//! Adds `CONTEXTO_GEMINI.md` to `contextFileName` in `.gemini/settings.json`
//! and writes that context file at the project root.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{
    print_install_success, print_uninstall_success, remove_file_if_present, usage_description,
    write_file_if_changed,
};

pub const GEMINI_CONTEXT_FILE_NAME: &str = "GEMINI.md";
pub const CONTEXTO_GEMINI_FILE_NAME: &str = "CONTEXTO_GEMINI.md";

/// `contextFileName` accepts a single name or a list of names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextFileName {
    Single(String),
    Many(Vec<String>),
}

impl ContextFileName {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(name) => vec![name],
            Self::Many(names) => names,
        }
    }
}

/// The parts of `.gemini/settings.json` we touch; other keys pass through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiSettings {
    #[serde(rename = "contextFileName", default, skip_serializing_if = "Option::is_none")]
    pub context_file_name: Option<ContextFileName>,

    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(".gemini").join("settings.json")
}

pub fn context_file_path(root: &Path) -> PathBuf {
    root.join(CONTEXTO_GEMINI_FILE_NAME)
}

fn load_settings(path: &Path) -> Result<Option<GeminiSettings>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    let settings = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(settings))
}

fn save_settings(path: &Path, settings: &GeminiSettings) -> Result<bool> {
    let mut json = serde_json::to_string_pretty(settings)?;
    json.push('\n');
    write_file_if_changed(path, &json)
}

/// Ensure the settings list our context file.
///
/// A new settings file keeps Gemini's default `GEMINI.md` alongside ours.
pub fn register_context_file(root: &Path) -> Result<bool> {
    let path = settings_path(root);
    let settings = match load_settings(&path)? {
        Some(mut settings) => {
            let mut names = settings
                .context_file_name
                .take()
                .map(ContextFileName::into_vec)
                .unwrap_or_default();
            if !names.iter().any(|n| n == CONTEXTO_GEMINI_FILE_NAME) {
                names.push(CONTEXTO_GEMINI_FILE_NAME.to_string());
            }
            settings.context_file_name = Some(ContextFileName::Many(names));
            settings
        }
        None => GeminiSettings {
            context_file_name: Some(ContextFileName::Many(vec![
                GEMINI_CONTEXT_FILE_NAME.to_string(),
                CONTEXTO_GEMINI_FILE_NAME.to_string(),
            ])),
            other: serde_json::Map::new(),
        },
    };
    save_settings(&path, &settings)
}

/// Drop our context file from the settings, leaving everything else.
pub fn unregister_context_file(root: &Path) -> Result<bool> {
    let path = settings_path(root);
    let Some(mut settings) = load_settings(&path)? else {
        return Ok(false);
    };

    let Some(current) = settings.context_file_name.take() else {
        return Ok(false);
    };
    let mut names = current.into_vec();
    let before = names.len();
    names.retain(|n| n != CONTEXTO_GEMINI_FILE_NAME);
    if names.len() == before {
        return Ok(false);
    }

    settings.context_file_name = if names.is_empty() {
        None
    } else {
        Some(ContextFileName::Many(names))
    };
    save_settings(&path, &settings)
}

pub fn install(root: &Path, docs_dir: &str) -> Result<()> {
    let settings_changed = register_context_file(root)?;
    let path = context_file_path(root);
    let file_changed = write_file_if_changed(&path, &usage_description(docs_dir))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    if settings_changed || file_changed {
        print_install_success("Gemini", &path);
    } else {
        println!("contexto is already installed for Gemini");
    }
    Ok(())
}

pub fn uninstall(root: &Path) -> Result<()> {
    let settings_changed = unregister_context_file(root)?;
    let file_removed = remove_file_if_present(&context_file_path(root))?;

    if settings_changed || file_removed {
        print_uninstall_success("Gemini");
    } else {
        println!("contexto is not installed for Gemini");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn read_settings(root: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(settings_path(root)).unwrap()).unwrap()
    }

    fn write_settings(root: &Path, value: Value) {
        fs::create_dir_all(root.join(".gemini")).unwrap();
        fs::write(settings_path(root), value.to_string()).unwrap();
    }

    #[test]
    fn creates_settings_with_default_context_file() {
        let dir = TempDir::new().unwrap();
        assert!(register_context_file(dir.path()).unwrap());
        assert_eq!(
            read_settings(dir.path()),
            json!({ "contextFileName": ["GEMINI.md", "CONTEXTO_GEMINI.md"] })
        );
    }

    #[test]
    fn single_string_is_normalized_to_list() {
        let dir = TempDir::new().unwrap();
        write_settings(dir.path(), json!({ "contextFileName": "AGENTS.md", "theme": "dark" }));

        register_context_file(dir.path()).unwrap();
        assert_eq!(
            read_settings(dir.path()),
            json!({ "contextFileName": ["AGENTS.md", "CONTEXTO_GEMINI.md"], "theme": "dark" })
        );
    }

    #[test]
    fn missing_field_gets_only_our_file() {
        let dir = TempDir::new().unwrap();
        write_settings(dir.path(), json!({ "theme": "dark" }));

        register_context_file(dir.path()).unwrap();
        assert_eq!(
            read_settings(dir.path())["contextFileName"],
            json!(["CONTEXTO_GEMINI.md"])
        );
    }

    #[test]
    fn existing_entry_is_not_duplicated() {
        let dir = TempDir::new().unwrap();
        write_settings(
            dir.path(),
            json!({ "contextFileName": ["GEMINI.md", "CONTEXTO_GEMINI.md"] }),
        );

        register_context_file(dir.path()).unwrap();
        register_context_file(dir.path()).unwrap();
        assert_eq!(
            read_settings(dir.path())["contextFileName"],
            json!(["GEMINI.md", "CONTEXTO_GEMINI.md"])
        );
    }

    #[test]
    fn invalid_settings_are_reported() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".gemini")).unwrap();
        fs::write(settings_path(dir.path()), "{ not json").unwrap();
        assert!(register_context_file(dir.path()).is_err());
    }

    #[test]
    fn install_then_uninstall_restores_settings() {
        let dir = TempDir::new().unwrap();
        write_settings(dir.path(), json!({ "contextFileName": "GEMINI.md", "theme": "dark" }));

        install(dir.path(), "docs").unwrap();
        assert!(context_file_path(dir.path()).exists());

        uninstall(dir.path()).unwrap();
        assert!(!context_file_path(dir.path()).exists());
        assert_eq!(
            read_settings(dir.path()),
            json!({ "contextFileName": ["GEMINI.md"], "theme": "dark" })
        );
    }
}
