//! Normalization of collection change notifications.
//!
//! Observable collections report five kinds of change. The projector only
//! needs three primitive edits, so every [`CollectionChange`] is first reduced
//! to a sequence of [`ChangeOp`]s:
//!
//! | change    | ops                                             |
//! |-----------|-------------------------------------------------|
//! | `Add`     | `Insert`                                        |
//! | `Remove`  | `Remove`                                        |
//! | `Replace` | `Remove` of the old items, `Insert` of the new  |
//! | `Move`    | rejected, or `Remove` then `Insert` (policy)    |
//! | `Reset`   | `Reset`                                         |

use virtual_tree_core::CollectionChange;

use crate::config::MovePolicy;
use crate::error::{FlatError, Result};

/// A primitive edit of one node's children.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeOp<E> {
    /// Insert `items` so that the first one becomes child `index`.
    Insert { index: usize, items: Vec<E> },
    /// Remove `items`, which start at child `index`.
    Remove { index: usize, items: Vec<E> },
    /// Discard the children and read them again from the source.
    Reset,
}

/// Reduce `change` to primitive edits, applied in order.
pub fn normalize<E: Clone>(change: &CollectionChange<E>, policy: MovePolicy) -> Result<Vec<ChangeOp<E>>> {
    let ops = match change {
        CollectionChange::Add { index, items } => vec![ChangeOp::Insert {
            index: *index,
            items: items.clone(),
        }],
        CollectionChange::Remove { index, items } => vec![ChangeOp::Remove {
            index: *index,
            items: items.clone(),
        }],
        CollectionChange::Replace {
            index,
            old_items,
            new_items,
        } => vec![
            ChangeOp::Remove {
                index: *index,
                items: old_items.clone(),
            },
            ChangeOp::Insert {
                index: *index,
                items: new_items.clone(),
            },
        ],
        CollectionChange::Move {
            old_index,
            new_index,
            items,
        } => match policy {
            MovePolicy::Reject => return Err(FlatError::UnsupportedMove),
            MovePolicy::RemoveInsert => vec![
                ChangeOp::Remove {
                    index: *old_index,
                    items: items.clone(),
                },
                ChangeOp::Insert {
                    index: *new_index,
                    items: items.clone(),
                },
            ],
        },
        CollectionChange::Reset => vec![ChangeOp::Reset],
    };

    Ok(ops
        .into_iter()
        .filter(|op| match op {
            ChangeOp::Insert { items, .. } | ChangeOp::Remove { items, .. } => !items.is_empty(),
            ChangeOp::Reset => true,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove() {
        let add = CollectionChange::Add {
            index: 2,
            items: vec!['x', 'y'],
        };
        assert_eq!(
            normalize(&add, MovePolicy::Reject).unwrap(),
            vec![ChangeOp::Insert {
                index: 2,
                items: vec!['x', 'y']
            }]
        );

        let remove = CollectionChange::Remove {
            index: 4,
            items: vec!['x'],
        };
        assert_eq!(
            normalize(&remove, MovePolicy::Reject).unwrap(),
            vec![ChangeOp::Remove {
                index: 4,
                items: vec!['x']
            }]
        );
    }

    #[test]
    fn test_replace_is_remove_then_insert() {
        let replace = CollectionChange::Replace {
            index: 1,
            old_items: vec![10],
            new_items: vec![11, 12],
        };
        assert_eq!(
            normalize(&replace, MovePolicy::Reject).unwrap(),
            vec![
                ChangeOp::Remove {
                    index: 1,
                    items: vec![10]
                },
                ChangeOp::Insert {
                    index: 1,
                    items: vec![11, 12]
                },
            ]
        );
    }

    #[test]
    fn test_move_policy() {
        let mv = CollectionChange::Move {
            old_index: 0,
            new_index: 3,
            items: vec!["m"],
        };
        assert_eq!(
            normalize(&mv, MovePolicy::Reject),
            Err(FlatError::UnsupportedMove)
        );
        assert_eq!(
            normalize(&mv, MovePolicy::RemoveInsert).unwrap(),
            vec![
                ChangeOp::Remove {
                    index: 0,
                    items: vec!["m"]
                },
                ChangeOp::Insert {
                    index: 3,
                    items: vec!["m"]
                },
            ]
        );
    }

    #[test]
    fn test_reset_and_empty_runs() {
        assert_eq!(
            normalize::<u8>(&CollectionChange::Reset, MovePolicy::Reject).unwrap(),
            vec![ChangeOp::Reset]
        );
        let empty = CollectionChange::<u8>::Add {
            index: 0,
            items: vec![],
        };
        assert!(normalize(&empty, MovePolicy::Reject).unwrap().is_empty());
    }
}
