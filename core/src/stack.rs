//! The context stack: an ordered sequence of attachments prepended to every
//! outgoing prompt (spec §4.B).

use std::path::{Component, Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::SynergyError;

/// A file reference or a captured command output living on the stack.
#[derive(Debug, Clone)]
pub enum AttachmentItem {
    File { path: PathBuf },
    Capture { cmd: String, stdout: String, status: i32 },
}

/// Ordered 0 (bottom/oldest) to N-1 (top/newest). Insertion only at the top.
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    items: Vec<AttachmentItem>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[AttachmentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolves `path` to absolute form (lexically; the file need not exist
    /// yet) and appends a File item. Does not read the file.
    pub fn push_file(&mut self, path: &Path) {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map(|cwd| cwd.join(path)).unwrap_or_else(|_| path.to_path_buf())
        };
        self.items.push(AttachmentItem::File { path: lexically_normalize(&absolute) });
    }

    /// Pushes a File item whose path is already resolved, e.g. from a
    /// session load. Bypasses the cwd-relative resolution in [`push_file`].
    pub fn push_file_raw(&mut self, path: PathBuf) {
        self.items.push(AttachmentItem::File { path });
    }

    pub fn push_capture(&mut self, cmd: String, stdout: String, status: i32) {
        self.items.push(AttachmentItem::Capture { cmd, stdout, status });
    }

    pub fn drop_top(&mut self) -> String {
        if self.items.pop().is_some() {
            "Dropped top item".to_string()
        } else {
            "Stack is empty, nothing to drop".to_string()
        }
    }

    pub fn drop_at(&mut self, index: usize) -> Result<String, SynergyError> {
        if index >= self.items.len() {
            return Err(SynergyError::IndexOutOfRange(index));
        }
        self.items.remove(index);
        Ok(format!("Dropped item [{index}]"))
    }

    pub fn swap(&mut self) -> String {
        let n = self.items.len();
        if n < 2 {
            "Stack has fewer than 2 items, nothing to swap".to_string()
        } else {
            self.items.swap(n - 1, n - 2);
            "Swapped top two items".to_string()
        }
    }

    /// Moves the bottom item (index 0) to the top; no-op on empty.
    pub fn rot(&mut self) -> String {
        if self.items.is_empty() {
            "Stack is empty, nothing to rotate".to_string()
        } else {
            let bottom = self.items.remove(0);
            self.items.push(bottom);
            "Rotated bottom item to top".to_string()
        }
    }

    pub fn reset(&mut self) {
        self.items.clear();
    }

    /// One line per item, bottom-first, top starred, with a content preview.
    pub fn render_display(&self) -> String {
        if self.items.is_empty() {
            return "Stack is empty".to_string();
        }

        let top = self.items.len() - 1;
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let marker = if i == top { "*" } else { " " };
                let (label, preview) = match item {
                    AttachmentItem::File { path } => {
                        let preview = match std::fs::read_to_string(path) {
                            Ok(body) => synergy_common::text::preview(&body, synergy_common::text::STACK_PREVIEW_CHARS),
                            Err(err) => format!("<unreadable: {err}>"),
                        };
                        (path.display().to_string(), preview)
                    }
                    AttachmentItem::Capture { cmd, stdout, .. } => {
                        (cmd.clone(), synergy_common::text::preview(stdout, synergy_common::text::STACK_PREVIEW_CHARS))
                    }
                };
                format!("[{i}]{marker} {label} - contents: {preview}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renders the attachment block inlined into the outgoing prompt. Only
    /// file bodies honor `base64`; capture output is always verbatim.
    pub fn render_payload(&self, base64: bool) -> String {
        let mut out = String::new();
        for item in &self.items {
            match item {
                AttachmentItem::File { path } => {
                    out.push_str(&format!("[FILE: {}]\n", path.display()));
                    match std::fs::read(path) {
                        Ok(bytes) => {
                            if base64 {
                                out.push_str(&BASE64.encode(&bytes));
                            } else {
                                out.push_str(&String::from_utf8_lossy(&bytes));
                            }
                        }
                        Err(err) => out.push_str(&format!("WARNING: unable to read file: {err}")),
                    }
                    out.push_str("\n[/FILE]\n");
                }
                AttachmentItem::Capture { cmd, stdout, .. } => {
                    out.push_str(&format!("[CMD: {cmd}]\n{stdout}\n[/CMD]\n"));
                }
            }
        }
        out
    }
}

fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn swap_twice_is_identity() {
        let mut stack = ContextStack::new();
        stack.push_capture("a".into(), "a-out".into(), 0);
        stack.push_capture("b".into(), "b-out".into(), 0);
        let before = stack.render_display();
        stack.swap();
        stack.swap();
        assert_eq!(stack.render_display(), before);
    }

    #[test]
    fn rot_n_times_is_identity_for_size_n() {
        let mut stack = ContextStack::new();
        for i in 0..5 {
            stack.push_capture(format!("cmd{i}"), format!("out{i}"), 0);
        }
        let before = stack.render_display();
        for _ in 0..5 {
            stack.rot();
        }
        assert_eq!(stack.render_display(), before);
    }

    #[test]
    fn drop_top_reports_when_empty() {
        let mut stack = ContextStack::new();
        assert_eq!(stack.drop_top(), "Stack is empty, nothing to drop");
    }

    #[test]
    fn drop_at_out_of_range_is_an_error() {
        let mut stack = ContextStack::new();
        stack.push_capture("a".into(), "out".into(), 0);
        let err = stack.drop_at(5).unwrap_err();
        assert!(matches!(err, SynergyError::IndexOutOfRange(5)));
    }

    #[test]
    fn drop_at_shifts_indices() {
        let mut stack = ContextStack::new();
        for i in 0..5 {
            stack.push_capture(format!("cmd{i}"), format!("out{i}"), 0);
        }
        stack.drop_at(2).expect("valid index");
        assert_eq!(stack.len(), 4);
        assert!(!stack.render_display().contains("cmd2"));
    }

    #[test]
    fn pushed_file_preview_collapses_newlines() {
        let dir = TempDir::new().expect("tmp");
        let file = dir.path().join("foo.txt");
        std::fs::write(&file, "Test file content.\nLine 2.\n").expect("write");

        let mut stack = ContextStack::new();
        stack.push_file(&file);
        assert!(stack.render_display().contains("contents: Test file content. Line 2."));
    }

    #[test]
    fn rot_on_empty_is_a_no_op() {
        let mut stack = ContextStack::new();
        assert_eq!(stack.rot(), "Stack is empty, nothing to rotate");
    }
}
