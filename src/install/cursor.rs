// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cursor installation for contexto
//!
//! Writes an always-applied project rule to `.cursor/rules/mcp-contexto.mdc`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{
    print_install_success, print_uninstall_success, remove_file_if_present, usage_description,
    write_file_if_changed,
};

pub const RULE_FILE_NAME: &str = "mcp-contexto.mdc";

pub fn rule_path(root: &Path) -> PathBuf {
    root.join(".cursor").join("rules").join(RULE_FILE_NAME)
}

fn rule_content(docs_dir: &str) -> String {
    format!("---\nalwaysApply: true\n---\n{}", usage_description(docs_dir))
}

/// Write the rule file; returns false if it was already up to date.
pub fn write_rule(root: &Path, docs_dir: &str) -> Result<bool> {
    let path = rule_path(root);
    write_file_if_changed(&path, &rule_content(docs_dir))
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub fn install(root: &Path, docs_dir: &str) -> Result<()> {
    if write_rule(root, docs_dir)? {
        print_install_success("Cursor", &rule_path(root));
    } else {
        println!("contexto is already installed for Cursor");
    }
    Ok(())
}

pub fn uninstall(root: &Path) -> Result<()> {
    if remove_file_if_present(&rule_path(root))? {
        print_uninstall_success("Cursor");
    } else {
        println!("contexto is not installed for Cursor");
    }
    Ok(())
}
