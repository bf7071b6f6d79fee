//! Shared graph handle for concurrent pipeline workers
//!
//! Structural mutation takes the write lock, so inserts and removals are
//! serialized. Ordering and read queries take the read lock and may run
//! concurrently with each other but never alongside a mutation.

use crate::errors::Result;
use crate::graph::dag::DependencyGraph;
use crate::graph::types::{Node, NodeId};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable single-writer / multi-reader handle to a `DependencyGraph`
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<DependencyGraph>>,
}

impl SharedGraph {
    /// Create a handle around an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing graph
    pub fn from_graph(graph: DependencyGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    /// Shared read view
    pub async fn read(&self) -> RwLockReadGuard<'_, DependencyGraph> {
        self.inner.read().await
    }

    /// Exclusive view for structural mutation
    pub async fn write(&self) -> RwLockWriteGuard<'_, DependencyGraph> {
        self.inner.write().await
    }

    /// Insert under the write lock
    pub async fn insert_node(&self, node: Node) -> Result<()> {
        self.inner.write().await.insert_node(node)
    }

    /// Insert a batch under the write lock
    pub async fn insert_batch(&self, nodes: Vec<Node>) -> Result<()> {
        self.inner.write().await.insert_batch(nodes)
    }

    /// Remove under the write lock
    pub async fn remove_node(&self, id: &str) -> Result<Node> {
        self.inner.write().await.remove_node(id)
    }

    /// Topological order under the read lock
    pub async fn topological_order(&self, root: &str) -> Result<Vec<NodeId>> {
        self.inner.read().await.topological_order(root)
    }

    /// Number of nodes
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_readers() {
        let graph = SharedGraph::new();
        graph.insert_node(Node::new("a", "x")).await.unwrap();
        graph
            .insert_node(Node::new("b", "x").with_deps(["a"]))
            .await
            .unwrap();

        let mut handles = vec![];
        for _ in 0..8 {
            let g = graph.clone();
            handles.push(tokio::spawn(async move { g.topological_order("b").await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), vec!["a", "b"]);
        }
    }

    #[tokio::test]
    async fn test_concurrent_writers_serialize() {
        let graph = SharedGraph::new();
        let mut handles = vec![];
        for i in 0..16 {
            let g = graph.clone();
            handles.push(tokio::spawn(async move {
                g.insert_node(Node::new(format!("n{i:02}"), "x")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(graph.len().await, 16);
    }

    #[test]
    fn test_rejected_batch_visible_to_no_reader() {
        tokio_test::block_on(async {
            let graph = SharedGraph::new();
            graph.insert_node(Node::new("a", "x")).await.unwrap();

            let err = graph
                .insert_batch(vec![
                    Node::new("b", "x").with_deps(["a", "c"]),
                    Node::new("c", "x").with_deps(["b"]),
                ])
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "cycle");
            assert_eq!(graph.read().await.ids(), vec!["a"]);

            let removed = graph.remove_node("a").await.unwrap();
            assert_eq!(removed.id, "a");
            assert_eq!(graph.len().await, 0);
        });
    }
}
