//! Text dumps of the node tree.

use virtual_tree_core::{TreeFormatOptions, TreePrinter};

use crate::node::{NodeKey, NodeTree};

/// Render the visible nodes of `tree`, one line per row.
pub(crate) fn format_tree<T, L>(tree: &NodeTree<T>, options: TreeFormatOptions, label: L) -> String
where
    T: Send + Sync + 'static,
    L: Fn(&T) -> String,
{
    let printer = TreePrinter::with_options(options);
    let options = printer.options();
    printer.format(
        tree.children(tree.root()),
        |key| tree.children(key).to_vec(),
        |key| describe(tree, key, options, &label),
    )
}

fn describe<T, L>(tree: &NodeTree<T>, key: NodeKey, options: &TreeFormatOptions, label: &L) -> String
where
    T: Send + Sync + 'static,
    L: Fn(&T) -> String,
{
    let Some(node) = tree.get(key) else {
        return String::from("<detached>");
    };

    let mut line = String::new();
    if options.show_state {
        line.push_str(if node.is_expanded { "[-] " } else { "[+] " });
    }
    if let Some(item) = &node.item {
        line.push_str(&label(&**item));
    }
    if options.show_indices
        && let Some(row) = tree.flat_index(key)
    {
        line.push_str(&format!(" #{row}"));
    }
    if options.show_sizes {
        line.push_str(&format!(" (size {}, offset {})", node.size, node.child_offset));
    }
    line
}
