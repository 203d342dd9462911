// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent rule installation module for contexto
//!
//! Writes project-local rule files that tell AI coding agents to consult
//! the documentation index.

pub mod cursor;
pub mod gemini;

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Usage description shared by every agent rule file
pub fn usage_description(docs_dir: &str) -> String {
    format!(
        r#"
# CONTEXTO

You MUST use the `contexto` tool kit to retrieve the project's up-to-date documentation, best practices,
code examples, folder structure, project architecture,
and other relevant information that might be useful for fulfilling the user's request.

You should ALWAYS consult the `contexto` documentation when you are unsure or have a question about the project's architecture, best practices, or other relevant information.

```bash
contexto search "authentication flow"    # semantic search over the docs
contexto read docs/auth.md               # print a document
contexto create auth --content "..."     # add or replace a document
contexto index                           # resync after manual edits
```

Assume {docs_dir} is the folder where the documentation is stored, unless the user specifies otherwise.
You MUST generate a new index of the documentation every time you create, modify, or delete a file in the {docs_dir} folder.
"#
    )
}

/// Helper to write a file only if the content differs from existing
pub fn write_file_if_changed(path: &Path, content: &str) -> Result<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    if path.exists() {
        let existing = fs::read_to_string(path)?;
        if existing == content {
            return Ok(false);
        }
    }

    fs::write(path, content)?;
    Ok(true)
}

/// Helper to remove a file; returns false if it did not exist
pub fn remove_file_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Print success message for installation
pub fn print_install_success(agent: &str, path: &Path) {
    println!("✓ Successfully installed contexto rules for {}", agent);
    println!("  {}", path.display());
    println!();
    println!(
        "  To uninstall: contexto uninstall {}",
        agent.to_lowercase().replace(' ', "-")
    );
}

/// Print success message for uninstallation
pub fn print_uninstall_success(agent: &str) {
    println!("✓ Successfully uninstalled contexto rules from {}", agent);
}
