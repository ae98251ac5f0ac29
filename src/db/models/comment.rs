//! Discussion comments with one level of threading.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: String,
    pub startup_id: String,
    pub author_id: String,
    pub parent_id: Option<String>,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Comment with author details for list views
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommentWithAuthor {
    pub id: String,
    pub startup_id: String,
    pub author_id: String,
    pub parent_id: Option<String>,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
    pub author_name: String,
}

/// A root comment with its replies, oldest first on both levels
#[derive(Debug, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub root: CommentWithAuthor,
    pub replies: Vec<CommentWithAuthor>,
}

/// Partition a flat, created_at-ascending comment list into threads.
/// Every comment with a parent id lands under exactly the matching root;
/// replies whose parent is missing from the slice are dropped rather than
/// surfaced as orphan roots.
pub fn partition_threads(comments: Vec<CommentWithAuthor>) -> Vec<CommentThread> {
    let mut threads: Vec<CommentThread> = Vec::new();

    for comment in &comments {
        if comment.parent_id.is_none() {
            threads.push(CommentThread {
                root: comment.clone(),
                replies: Vec::new(),
            });
        }
    }

    for comment in comments {
        if let Some(parent_id) = &comment.parent_id {
            if let Some(thread) = threads.iter_mut().find(|t| &t.root.id == parent_id) {
                thread.replies.push(comment);
            }
        }
    }

    threads
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
    /// Reply target; must be a root comment on the same startup
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, parent: Option<&str>, created: &str) -> CommentWithAuthor {
        CommentWithAuthor {
            id: id.into(),
            startup_id: "s".into(),
            author_id: "u".into(),
            parent_id: parent.map(|p| p.to_string()),
            body: format!("comment {}", id),
            created_at: created.into(),
            updated_at: created.into(),
            author_name: "Author".into(),
        }
    }

    #[test]
    fn test_roots_are_null_parent_comments() {
        let threads = partition_threads(vec![
            comment("a", None, "1"),
            comment("b", Some("a"), "2"),
            comment("c", None, "3"),
        ]);
        let root_ids: Vec<&str> = threads.iter().map(|t| t.root.id.as_str()).collect();
        assert_eq!(root_ids, vec!["a", "c"]);
    }

    #[test]
    fn test_every_reply_lands_under_its_parent_only() {
        let threads = partition_threads(vec![
            comment("a", None, "1"),
            comment("b", None, "2"),
            comment("r1", Some("a"), "3"),
            comment("r2", Some("b"), "4"),
            comment("r3", Some("a"), "5"),
        ]);

        let a = threads.iter().find(|t| t.root.id == "a").unwrap();
        let b = threads.iter().find(|t| t.root.id == "b").unwrap();
        let a_replies: Vec<&str> = a.replies.iter().map(|r| r.id.as_str()).collect();
        let b_replies: Vec<&str> = b.replies.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(a_replies, vec!["r1", "r3"]);
        assert_eq!(b_replies, vec!["r2"]);
    }

    #[test]
    fn test_reply_ordering_preserved_within_thread() {
        let threads = partition_threads(vec![
            comment("a", None, "1"),
            comment("late", Some("a"), "9"),
            comment("early", Some("a"), "2"),
        ]);
        // Input order (created_at ascending from the query) is preserved
        let replies: Vec<&str> = threads[0].replies.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(replies, vec!["late", "early"]);
    }

    #[test]
    fn test_orphan_reply_is_dropped() {
        let threads = partition_threads(vec![
            comment("a", None, "1"),
            comment("orphan", Some("deleted"), "2"),
        ]);
        assert_eq!(threads.len(), 1);
        assert!(threads[0].replies.is_empty());
    }
}
