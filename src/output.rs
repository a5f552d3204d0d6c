use crate::content::FileContent;
use crate::engine::SelectedFile;
use crate::tree::TreeNode;
use crate::tree_builder::{TreeLine, tree_lines};
use crate::{clipboard, utils};
use anyhow::Result;
use std::collections::BTreeSet;

const NOTHING_SELECTED: &str = "(No files selected or matched criteria)";

/// Tree of the selected files (with their ancestors) followed by each file's content.
pub fn compose_output(tree: &TreeNode, files: &[SelectedFile]) -> String {
    if files.is_empty() {
        return format!("./\n\n{}\n", NOTHING_SELECTED);
    }

    let chosen: BTreeSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
    let keep = |node: &TreeNode| {
        if node.is_dir() {
            node.descendant_files()
                .iter()
                .any(|file| chosen.contains(file.path.as_str()))
        } else {
            chosen.contains(node.path.as_str())
        }
    };
    let mut output_string_parts: Vec<String> = tree_lines(tree, &keep, &|_| true)
        .iter()
        .map(TreeLine::label)
        .collect();
    output_string_parts.push(String::new()); // blank line after tree

    for file in files {
        match &file.content {
            FileContent::Loaded(contents) => {
                output_string_parts.push(format!("---\nFile: {}\n---", file.path));
                output_string_parts.push(String::new());
                output_string_parts.push(contents.trim_end().to_string());
            }
            FileContent::Failed(e) => {
                output_string_parts.push(format!(
                    "---\nFile: {} (Error reading file: {})\n---",
                    file.path, e
                ));
                output_string_parts.push(String::new());
                output_string_parts.push("[Content not available]".to_string());
            }
            FileContent::Pending => {
                output_string_parts.push(format!("---\nFile: {} (Content still loading)\n---", file.path));
                output_string_parts.push(String::new());
                output_string_parts.push("[Content not available]".to_string());
            }
        }
        output_string_parts.push(String::new());
    }

    let mut final_output_string = output_string_parts.join("\n");
    // exactly one trailing newline
    final_output_string = final_output_string.trim_end_matches('\n').to_string();
    final_output_string.push('\n');
    final_output_string
}

/// Prints the payload on a dry run, otherwise copies it to the clipboard.
pub fn deliver(output_string: &str, file_count: usize, dry_run: bool) -> Result<()> {
    let tokens = utils::approx_tokens(output_string);
    if dry_run {
        print!("{}", output_string);
        println!(
            "(Dry run: Would copy {} files (≈ {} tokens). Clipboard not affected.)",
            file_count, tokens
        );
    } else if file_count == 0 {
        println!("No files were selected to copy.");
    } else {
        clipboard::copy_text_to_clipboard(output_string.to_string())?;
        tracing::info!(files = file_count, tokens, "copied selection to clipboard");
        println!(
            "✅ Copied {} files (≈ {} tokens) to the clipboard.",
            file_count, tokens
        );
    }
    Ok(())
}
