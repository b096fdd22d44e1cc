//! Render graph: pass ordering from declared resource usage.
//!
//! Passes cannot see each other's memory hazards — the forward pass has no
//! way to detect a prepass that has not finished writing. The graph makes
//! the dependency explicit as data: each node declares how it uses each
//! resource, and every writer of a resource is ordered before every reader.
//! Encoding in that order into one command encoder gives wgpu the
//! information it needs to insert the barrier between the passes.

use wgpu::CommandEncoder;

use crate::camera::CameraState;
use crate::resources::FrameResources;
use crate::MeshDraw;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceUsage {
    Read,
    Write,
    ReadWrite,
}

impl ResourceUsage {
    pub fn is_write(&self) -> bool {
        matches!(self, ResourceUsage::Write | ResourceUsage::ReadWrite)
    }
    pub fn is_read(&self) -> bool {
        matches!(self, ResourceUsage::Read | ResourceUsage::ReadWrite)
    }
}

/// Everything a node needs to encode one frame's work.
pub struct FrameContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub frame: &'a FrameResources,
    pub camera: CameraState,
    pub draws: &'a [MeshDraw],
}

pub trait RenderGraphNode: Send + Sync {
    fn label(&self) -> &str;
    fn encode(&self, encoder: &mut CommandEncoder, ctx: &FrameContext<'_>) -> Result<(), String>;
}

#[derive(Default)]
pub struct RenderGraph {
    nodes: Vec<Box<dyn RenderGraphNode>>,
    node_usage: Vec<Vec<(ResourceId, ResourceUsage)>>,
    edges: Vec<(NodeId, NodeId)>,
    next_resource_id: usize,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a logical resource the graph orders access around. The
    /// graph itself holds no GPU handle; nodes reach textures through the
    /// frame context.
    pub fn declare_resource(&mut self) -> ResourceId {
        let id = ResourceId(self.next_resource_id);
        self.next_resource_id += 1;
        id
    }

    pub fn add_node(
        &mut self,
        node: Box<dyn RenderGraphNode>,
        usage: Vec<(ResourceId, ResourceUsage)>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.node_usage.push(usage);
        id
    }

    /// Explicit ordering edge, for dependencies not expressible as resource
    /// usage (e.g. present after the forward pass's swapchain-agnostic work).
    pub fn add_edge(&mut self, before: NodeId, after: NodeId) {
        self.edges.push((before, after));
    }

    /// Edges derived from declared usage: writer before reader, per resource.
    fn derived_edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for resource in 0..self.next_resource_id {
            let resource = ResourceId(resource);
            for (writer, usage) in self.node_usage.iter().enumerate() {
                if !usage.iter().any(|&(r, u)| r == resource && u.is_write()) {
                    continue;
                }
                for (reader, usage) in self.node_usage.iter().enumerate() {
                    if reader != writer
                        && usage.iter().any(|&(r, u)| r == resource && u.is_read())
                    {
                        edges.push((writer, reader));
                    }
                }
            }
        }
        edges
    }

    /// Topological execution order over explicit and derived edges.
    /// A cycle (e.g. two passes both claiming to write and read each
    /// other's output) is a setup error.
    pub fn execution_order(&self) -> Result<Vec<NodeId>, String> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        let mut out_edges: Vec<Vec<usize>> = vec![Vec::new(); n];
        let all_edges = self
            .edges
            .iter()
            .map(|&(NodeId(a), NodeId(b))| (a, b))
            .chain(self.derived_edges());
        for (a, b) in all_edges {
            if a < n && b < n {
                in_degree[b] += 1;
                out_edges[a].push(b);
            }
        }
        let mut stack: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(u) = stack.pop() {
            order.push(NodeId(u));
            for &v in &out_edges[u] {
                in_degree[v] -= 1;
                if in_degree[v] == 0 {
                    stack.push(v);
                }
            }
        }
        if order.len() != n {
            return Err("render graph has a cycle".to_string());
        }
        Ok(order)
    }

    /// Encode all nodes in dependency order into one command buffer.
    pub fn execute(
        &self,
        device: &wgpu::Device,
        ctx: &FrameContext<'_>,
    ) -> Result<wgpu::CommandBuffer, String> {
        let order = self.execution_order()?;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("glint_render_graph"),
        });
        for NodeId(index) in order {
            self.nodes[index]
                .encode(&mut encoder, ctx)
                .map_err(|e| format!("at node {}: {e}", self.nodes[index].label()))?;
        }
        Ok(encoder.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl RenderGraphNode for Named {
        fn label(&self) -> &str {
            self.0
        }
        fn encode(
            &self,
            _encoder: &mut CommandEncoder,
            _ctx: &FrameContext<'_>,
        ) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn writer_precedes_reader_even_when_added_later() {
        let mut graph = RenderGraph::new();
        let target = graph.declare_resource();
        // Consumer registered first; derived edge must still flip the order.
        let consumer = graph.add_node(Box::new(Named("consumer")), vec![(target, ResourceUsage::Read)]);
        let producer = graph.add_node(Box::new(Named("producer")), vec![(target, ResourceUsage::Write)]);
        let order = graph.execution_order().unwrap();
        let pos = |id: NodeId| order.iter().position(|&n| n == id).unwrap();
        assert!(pos(producer) < pos(consumer));
    }

    #[test]
    fn explicit_edges_are_honored() {
        let mut graph = RenderGraph::new();
        let a = graph.add_node(Box::new(Named("a")), vec![]);
        let b = graph.add_node(Box::new(Named("b")), vec![]);
        graph.add_edge(b, a);
        let order = graph.execution_order().unwrap();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn mutual_dependency_is_a_cycle() {
        let mut graph = RenderGraph::new();
        let r0 = graph.declare_resource();
        let r1 = graph.declare_resource();
        graph.add_node(
            Box::new(Named("a")),
            vec![(r0, ResourceUsage::Write), (r1, ResourceUsage::Read)],
        );
        graph.add_node(
            Box::new(Named("b")),
            vec![(r1, ResourceUsage::Write), (r0, ResourceUsage::Read)],
        );
        assert!(graph.execution_order().is_err());
    }

    #[test]
    fn read_write_orders_after_plain_writer() {
        let mut graph = RenderGraph::new();
        let target = graph.declare_resource();
        let rw = graph.add_node(Box::new(Named("rw")), vec![(target, ResourceUsage::ReadWrite)]);
        let w = graph.add_node(Box::new(Named("w")), vec![(target, ResourceUsage::Write)]);
        // Both write; rw also reads, so w -> rw is derived. rw -> w is not
        // (w never reads), keeping the graph acyclic.
        let order = graph.execution_order().unwrap();
        assert_eq!(order, vec![w, rw]);
    }
}
