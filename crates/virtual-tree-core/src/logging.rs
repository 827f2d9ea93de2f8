//! Logging and debugging facilities for virtual-tree.
//!
//! This module provides:
//! - Target and span names for the `tracing` instrumentation used across the
//!   workspace
//! - A text formatter for hierarchical debug dumps
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! virtual-tree uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("virtual_tree=debug")
//!     .init();
//! ```

/// Span names used throughout virtual-tree for tracing.
pub mod span_names {
    /// Performance span wrapping expensive projector operations.
    pub const PERF: &str = "virtual_tree::perf";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core primitives target, used by [`vtree_debug!`](crate::vtree_debug).
    pub const CORE: &str = "virtual_tree_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "virtual_tree_core::signal";
    /// Observable collection target.
    pub const COLLECTION: &str = "virtual_tree_core::collection";
    /// Flat projector target.
    pub const FLAT: &str = "virtual_tree::flat";
    /// Shadow node tree target.
    pub const NODE: &str = "virtual_tree::node";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to annotate rows with their flat index.
    pub show_indices: bool,
    /// Whether to annotate rows with cached subtree size and child offset.
    pub show_sizes: bool,
    /// Whether to mark expanded and collapsed rows.
    pub show_state: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_indices: true,
            show_sizes: false,
            show_state: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_sizes: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_indices: false,
            show_sizes: false,
            show_state: false,
            ..Default::default()
        }
    }
}

/// Renders any hierarchy as indented text.
///
/// The hierarchy is described by closures, so the printer works for the flat
/// projector's shadow tree as well as for plain source data.
#[derive(Debug, Clone, Default)]
pub struct TreePrinter {
    options: TreeFormatOptions,
}

impl TreePrinter {
    /// Create a printer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a printer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// The options this printer was built with.
    pub fn options(&self) -> &TreeFormatOptions {
        &self.options
    }

    /// Format every root and its descendants, one line per node.
    pub fn format<N, C, L>(&self, roots: &[N], children: C, label: L) -> String
    where
        N: Copy,
        C: Fn(N) -> Vec<N>,
        L: Fn(N) -> String,
    {
        let mut output = String::new();
        let mut open_levels = Vec::new();
        let count = roots.len();
        for (i, &root) in roots.iter().enumerate() {
            self.format_subtree_into(
                root,
                0,
                i + 1 == count,
                &mut open_levels,
                &children,
                &label,
                &mut output,
            );
        }
        output
    }

    /// `open_levels[i]` records whether the ancestor at depth `i + 1` still
    /// has siblings below it.
    #[allow(clippy::too_many_arguments)]
    fn format_subtree_into<N, C, L>(
        &self,
        node: N,
        depth: usize,
        is_last: bool,
        open_levels: &mut Vec<bool>,
        children: &C,
        label: &L,
        output: &mut String,
    ) where
        N: Copy,
        C: Fn(N) -> Vec<N>,
        L: Fn(N) -> String,
    {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        output.push_str(&self.build_prefix(open_levels, depth, is_last));
        output.push_str(&label(node));
        output.push('\n');

        if depth > 0 {
            open_levels.push(!is_last);
        }
        let kids = children(node);
        let count = kids.len();
        for (i, child) in kids.into_iter().enumerate() {
            self.format_subtree_into(
                child,
                depth + 1,
                i + 1 == count,
                open_levels,
                children,
                label,
                output,
            );
        }
        if depth > 0 {
            open_levels.pop();
        }
    }

    /// Build the prefix string for a tree node.
    fn build_prefix(&self, open_levels: &[bool], depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => (
                "\u{2502}",
                "\u{251c}\u{2500}\u{2500}",
                "\u{2514}\u{2500}\u{2500}",
            ),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for &open in open_levels {
            if open {
                prefix.push_str(branch);
            } else {
                prefix.extend(std::iter::repeat_n(' ', branch.chars().count()));
            }
            prefix.extend(std::iter::repeat_n(' ', self.options.indent_size));
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: span_names::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Debug-level event on the core target.
#[macro_export]
macro_rules! vtree_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_children(n: u32) -> Vec<u32> {
        match n {
            1 => vec![2, 3],
            2 => vec![6],
            3 => vec![4],
            _ => vec![],
        }
    }

    #[test]
    fn test_tree_format_hierarchy() {
        let printer = TreePrinter::with_options(TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..Default::default()
        });
        let output = printer.format(&[1, 5], sample_children, |n| format!("n{n}"));

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec!["n1", "+-- n2", "|  `-- n6", "`-- n3", "   `-- n4", "n5"]
        );
    }

    #[test]
    fn test_tree_format_max_depth() {
        let printer = TreePrinter::with_options(TreeFormatOptions {
            max_depth: Some(1),
            ..TreeFormatOptions::minimal()
        });
        let output = printer.format(&[1], sample_children, |n| format!("n{n}"));

        assert!(output.contains("n3"));
        assert!(!output.contains("n4"));
        assert!(!output.contains("n6"));
    }

    #[test]
    fn test_tree_format_empty() {
        let printer = TreePrinter::new();
        let output = printer.format(&[] as &[u32], sample_children, |n| n.to_string());
        assert!(output.is_empty());
    }

    #[test]
    fn test_perf_span() {
        // Just ensure it doesn't panic without a subscriber
        let _span = PerfSpan::new("test_operation");
    }
}
