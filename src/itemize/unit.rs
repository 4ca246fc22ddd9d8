use crate::timeline::Post;
use std::sync::Arc;

/// One link to be itemized, tagged with its place in the output.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    /// 0-based index into the final item list
    pub position: usize,
    /// Link target to fetch
    pub url: String,
    /// Post the link came from, shared read-only with the worker
    pub post: Arc<Post>,
}

/// Fans posts out into work units.
///
/// Positions are dense and assigned in encounter order: posts in input
/// order, then each post's links in listed order.
pub fn expand_units(posts: Vec<Post>) -> Vec<WorkUnit> {
    let mut units = Vec::new();
    for post in posts {
        let post = Arc::new(post);
        for url in post.links() {
            units.push(WorkUnit {
                position: units.len(),
                url: url.to_owned(),
                post: Arc::clone(&post),
            });
        }
    }
    units
}
