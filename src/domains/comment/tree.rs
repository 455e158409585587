// Comment Tree Builder - rebuilds reply trees from flat comment rows
//
// Rows are held in an arena (a Vec indexed by position) and linked by index,
// so nothing ever points back at its parent. Building runs bottom-up over a
// pre-order listing and never recurses. The resulting CommentNode is still a
// nested value that serializes and drops recursively, so thread depth is
// capped when comments are written (LimitsConfig::max_comment_depth).

use std::collections::HashMap;

use tracing::warn;

use super::{Comment, CommentNode, CommentWithAuthor};
use crate::core::strong_types::{CommentId, EchoId};

/// Depth and materialized path for a new comment.
///
/// Roots sit at depth 0 with the owning echo's id as their path; a reply sits
/// one level below its parent with `parent.path + "." + parent.id`.
pub fn materialize_position(post_id: EchoId, parent: Option<&Comment>) -> (u32, String) {
    match parent {
        None => (0, post_id.to_string()),
        Some(parent) => (
            parent.depth.saturating_add(1),
            format!("{}.{}", parent.path, parent.id),
        ),
    }
}

/// Prefix shared by the paths of every descendant of `comment`
pub fn descendant_path_prefix(comment: &Comment) -> String {
    format!("{}.{}", comment.path, comment.id)
}

/// Build the reply forest for a set of comments.
///
/// Sibling order follows input order, so rows fetched newest-first come out
/// newest-first at every level. A comment whose parent is missing from the
/// input is kept as a root and flagged `orphaned`; every input row appears
/// exactly once in the output.
pub fn build_forest(rows: Vec<CommentWithAuthor>) -> Vec<CommentNode> {
    assemble(rows, |_| false)
}

/// Build the subtree rooted at `root_id` from that comment plus its
/// descendants. Returns `None` when the root is not among the rows.
pub fn build_thread(root_id: CommentId, rows: Vec<CommentWithAuthor>) -> Option<CommentNode> {
    let mut forest = assemble(rows, |comment| comment.id == root_id);
    let position = forest.iter().position(|node| node.comment.id == root_id)?;
    if forest.len() > 1 {
        warn!(
            root_id = %root_id,
            detached = forest.len() - 1,
            "Thread contains comments not reachable from its root"
        );
    }
    Some(forest.swap_remove(position))
}

fn assemble<F>(rows: Vec<CommentWithAuthor>, expected_root: F) -> Vec<CommentNode>
where
    F: Fn(&Comment) -> bool,
{
    let index: HashMap<CommentId, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.comment.id, i))
        .collect();

    // Children in input order, plus the natural roots
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    let mut roots: Vec<usize> = Vec::new();
    let mut orphaned = vec![false; rows.len()];

    for (i, row) in rows.iter().enumerate() {
        let comment = &row.comment;
        match comment.parent_comment_id.and_then(|p| index.get(&p)) {
            Some(&parent) if !expected_root(comment) => children[parent].push(i),
            _ => {
                if comment.parent_comment_id.is_some() && !expected_root(comment) {
                    orphaned[i] = true;
                }
                roots.push(i);
            }
        }
    }

    // Walk from the roots. Anything left unvisited sits on a parent cycle;
    // promote the first such row to an orphaned root and keep walking.
    let mut walk = Walk {
        children: &children,
        visited: vec![false; rows.len()],
        tree_children: vec![Vec::new(); rows.len()],
        preorder: Vec::with_capacity(rows.len()),
    };
    for &root in &roots {
        walk.visit_from(root);
    }
    for i in 0..rows.len() {
        if !walk.visited[i] {
            warn!(
                comment_id = %rows[i].comment.id,
                "Comment is part of a parent cycle, promoting to root"
            );
            orphaned[i] = true;
            roots.push(i);
            walk.visit_from(i);
        }
    }
    let Walk {
        tree_children,
        preorder,
        ..
    } = walk;

    // Bottom-up: every descendant follows its ancestor in pre-order
    let mut slots: Vec<Option<CommentWithAuthor>> = rows.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode>> = Vec::new();
    built.resize_with(slots.len(), || None);

    for &i in preorder.iter().rev() {
        let Some(row) = slots[i].take() else { continue };
        let replies = tree_children[i]
            .iter()
            .filter_map(|c| built[*c].take())
            .collect();
        built[i] = Some(CommentNode {
            comment: row.comment,
            author: row.author,
            orphaned: orphaned[i],
            replies,
        });
    }

    for &i in &roots {
        if orphaned[i] {
            if let Some(node) = &built[i] {
                warn!(
                    comment_id = %node.comment.id,
                    parent_id = ?node.comment.parent_comment_id,
                    "Orphaned comment surfaced as root"
                );
            }
        }
    }

    roots.iter().filter_map(|i| built[*i].take()).collect()
}

struct Walk<'a> {
    children: &'a [Vec<usize>],
    visited: Vec<bool>,
    tree_children: Vec<Vec<usize>>,
    preorder: Vec<usize>,
}

impl Walk<'_> {
    /// Iterative pre-order walk. A child is adopted by the first node that
    /// reaches it, which is its real parent except on a cycle's back edge.
    fn visit_from(&mut self, start: usize) {
        let children = self.children;
        let mut stack = vec![start];
        self.visited[start] = true;
        while let Some(node) = stack.pop() {
            self.preorder.push(node);
            let adopted: Vec<usize> = children[node]
                .iter()
                .copied()
                .filter(|&child| !std::mem::replace(&mut self.visited[child], true))
                .collect();
            stack.extend(adopted.iter().rev());
            self.tree_children[node] = adopted;
        }
    }
}
