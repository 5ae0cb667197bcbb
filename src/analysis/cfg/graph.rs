//! Control flow graph construction.
//!
//! The builder partitions a decoded instruction sequence into [`BasicBlock`]s and connects
//! them with typed [`CfgEdge`]s. A new block starts at:
//!
//! - offset 0
//! - every branch, `leave` and switch target
//! - the instruction after any block-ending instruction (branches, returns, throws,
//!   `endfinally`, `endfilter`)
//! - every try, filter and handler boundary of the exception region table
//!
//! Blocks inside a protected range additionally get an exceptional edge to the entry of each
//! of the range's handlers (and to the filter block of filter clauses).
//!
//! Derived analyses (dominators, post-dominators, natural loops) are computed on first
//! use and cached.

use std::sync::OnceLock;

use crate::{
    analysis::{
        cfg::{detect_loops, BasicBlock, CfgEdge, CfgEdgeKind, NaturalLoop},
        exceptions::ExceptionRegionTable,
    },
    disassembler::{FlowType, Instruction},
    utils::graph::{
        algorithms::{compute_dominators, DominatorTree},
        DirectedGraph, GraphBase, NodeId, Predecessors, RootedGraph, Successors,
    },
    Error, Result,
};

/// Post-dominator tree of a control flow graph.
///
/// Computed on the reversed normal-flow graph rooted at a virtual exit node that every
/// exiting block (return, throw, end of handler) flows into. Blocks that cannot reach an
/// exit, such as the blocks of an infinite loop, have no post-dominator.
#[derive(Debug, Clone)]
pub struct PostDominatorTree {
    tree: DominatorTree,
    exit: NodeId,
}

impl PostDominatorTree {
    /// The closest block that every path from `node` to an exit passes through
    #[must_use]
    pub fn immediate_post_dominator(&self, node: NodeId) -> Option<NodeId> {
        self.tree
            .immediate_dominator(node)
            .filter(|&ipdom| ipdom != self.exit)
    }

    /// Checks if every path from `b` to an exit passes through `a`
    #[must_use]
    pub fn post_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != self.exit && self.tree.dominates(a, b)
    }

    /// Returns `true` if some path leads from `node` to an exit
    #[must_use]
    pub fn reaches_exit(&self, node: NodeId) -> bool {
        self.tree.is_reachable(node)
    }
}

/// The control flow graph of one method body.
///
/// Node ids equal block ids, and blocks are numbered in ascending offset order. The graph
/// owns the blocks and the exception region table it was built from; it is immutable once
/// built.
///
/// # Examples
///
/// ```rust
/// use ilscope::{
///     analysis::{ControlFlowGraph, ExceptionRegionTable},
///     disassembler::decode_stream,
///     metadata::resolver::NullResolver,
/// };
///
/// // ldarg.0; brfalse.s +1; nop; ret
/// let code = [0x02, 0x2C, 0x01, 0x00, 0x2A];
/// let instructions = decode_stream(&code, &NullResolver)?;
/// let cfg = ControlFlowGraph::build(instructions, ExceptionRegionTable::default())?;
///
/// assert_eq!(cfg.block_count(), 3);
/// assert_eq!(cfg.exits().len(), 1);
/// # Ok::<(), ilscope::Error>(())
/// ```
#[derive(Debug)]
pub struct ControlFlowGraph {
    graph: DirectedGraph<BasicBlock, CfgEdge>,
    entry: NodeId,
    exits: Vec<NodeId>,
    regions: ExceptionRegionTable,
    dominators: OnceLock<DominatorTree>,
    post_dominators: OnceLock<PostDominatorTree>,
    loops: OnceLock<Vec<NaturalLoop>>,
}

impl ControlFlowGraph {
    /// Builds the graph of a decoded method body.
    ///
    /// `instructions` must be the complete, offset-ordered output of the decoder for one
    /// code section.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnresolvedBranchTarget`] if a branch or switch target is not
    /// an instruction boundary, and [`crate::Error::MalformedExceptionTable`] if a region
    /// boundary is not an instruction boundary.
    pub fn build(instructions: Vec<Instruction>, regions: ExceptionRegionTable) -> Result<Self> {
        let leaders = Self::find_leaders(&instructions, &regions)?;

        let mut blocks: Vec<BasicBlock> = Vec::new();
        let mut current = Vec::new();
        for (index, instruction) in instructions.into_iter().enumerate() {
            if leaders[index] && !current.is_empty() {
                blocks.push(BasicBlock::new(blocks.len(), std::mem::take(&mut current)));
            }
            current.push(instruction);
        }
        if !current.is_empty() {
            blocks.push(BasicBlock::new(blocks.len(), current));
        }

        let edges = Self::collect_edges(&blocks, &regions);
        for &(source, edge) in &edges {
            let target = edge.target();
            if edge.kind().is_exceptional() {
                if !blocks[source].handler_successors.contains(&target) {
                    blocks[source].handler_successors.push(target);
                }
            } else {
                blocks[source].successors.push(target);
            }

            if !blocks[target].predecessors.contains(&source) {
                blocks[target].predecessors.push(source);
            }
        }
        for block in &mut blocks {
            block.exceptions = regions.enclosing(block.offset).collect();
        }

        let mut graph = DirectedGraph::with_capacity(blocks.len(), edges.len());
        for block in blocks {
            graph.add_node(block);
        }
        for (source, edge) in edges {
            graph.add_edge(NodeId::new(source), NodeId::new(edge.target()), edge)?;
        }

        let exits = graph
            .nodes()
            .filter(|(_, block)| block.is_exit())
            .map(|(id, _)| id)
            .collect();

        log::trace!(
            "built control flow graph with {} blocks, {} edges and {} exception regions",
            graph.node_count(),
            graph.edge_count(),
            regions.len()
        );

        Ok(ControlFlowGraph {
            graph,
            entry: NodeId::new(0),
            exits,
            regions,
            dominators: OnceLock::new(),
            post_dominators: OnceLock::new(),
            loops: OnceLock::new(),
        })
    }

    fn find_leaders(instructions: &[Instruction], regions: &ExceptionRegionTable) -> Result<Vec<bool>> {
        let code_size = instructions.last().map_or(0, Instruction::next_offset);
        let mut leaders = vec![false; instructions.len()];
        if let Some(first) = leaders.first_mut() {
            *first = true;
        }

        for (index, instruction) in instructions.iter().enumerate() {
            for &target in &instruction.branch_targets {
                let position = instruction_at(instructions, target).ok_or(
                    Error::UnresolvedBranchTarget {
                        offset: instruction.offset,
                        target,
                    },
                )?;
                leaders[position] = true;
            }

            if instruction.flow_type.ends_block() && index + 1 < instructions.len() {
                leaders[index + 1] = true;
            }
        }

        for region in regions.regions() {
            for boundary in region.boundaries() {
                if boundary == code_size {
                    continue;
                }

                let position = instruction_at(instructions, i64::from(boundary)).ok_or_else(|| {
                    eh_table_error!(
                        "boundary IL_{:04x} of clause {} is not an instruction boundary",
                        boundary,
                        region.index
                    )
                })?;
                leaders[position] = true;
            }
        }

        Ok(leaders)
    }

    fn collect_edges(blocks: &[BasicBlock], regions: &ExceptionRegionTable) -> Vec<(usize, CfgEdge)> {
        let block_at = |offset: i64| -> Option<usize> {
            let offset = u32::try_from(offset).ok()?;
            blocks.binary_search_by_key(&offset, |block| block.offset).ok()
        };

        let mut edges = Vec::new();
        for block in blocks {
            let Some(terminator) = block.terminator() else {
                continue;
            };

            let next = (block.id + 1 < blocks.len()).then_some(block.id + 1);
            let targets = terminator
                .branch_targets
                .iter()
                .filter_map(|&target| block_at(target));
            let mut push = |target: usize, kind: CfgEdgeKind| {
                edges.push((block.id, CfgEdge::new(target, kind)));
            };

            match terminator.flow_type {
                FlowType::ConditionalBranch => {
                    targets.for_each(|target| push(target, CfgEdgeKind::ConditionalTrue));
                    if let Some(next) = next {
                        push(next, CfgEdgeKind::ConditionalFalse);
                    }
                }
                FlowType::UnconditionalBranch => {
                    targets.for_each(|target| push(target, CfgEdgeKind::Unconditional));
                }
                FlowType::Leave => targets.for_each(|target| push(target, CfgEdgeKind::Leave)),
                FlowType::Switch => {
                    for (case, target) in (0_u32..).zip(targets) {
                        push(
                            target,
                            CfgEdgeKind::Switch {
                                case_value: Some(case),
                            },
                        );
                    }
                    if let Some(next) = next {
                        push(next, CfgEdgeKind::Switch { case_value: None });
                    }
                }
                FlowType::Sequential | FlowType::Call => {
                    if let Some(next) = next {
                        push(next, CfgEdgeKind::Unconditional);
                    }
                }
                FlowType::Return | FlowType::Throw | FlowType::EndFinally | FlowType::EndFilter => {}
            }
        }

        for (position, region) in regions.regions().iter().enumerate() {
            let mut entries = vec![region.handler_entry()];
            if region.filter_range().is_some() {
                entries.push(region.handler_start);
            }
            let handler_blocks: Vec<usize> = entries
                .into_iter()
                .filter_map(|offset| block_at(i64::from(offset)))
                .collect();

            for block in blocks.iter().filter(|block| region.protects(block.offset)) {
                for &handler in &handler_blocks {
                    edges.push((
                        block.id,
                        CfgEdge::new(handler, CfgEdgeKind::ExceptionHandler { region: position }),
                    ));
                }
            }
        }

        edges
    }

    /// The entry block
    #[must_use]
    pub const fn entry(&self) -> NodeId {
        self.entry
    }

    /// Blocks without normal successors
    #[must_use]
    pub fn exits(&self) -> &[NodeId] {
        &self.exits
    }

    /// Number of blocks
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The block with id `node`
    #[must_use]
    pub fn block(&self, node: NodeId) -> Option<&BasicBlock> {
        self.graph.node(node)
    }

    /// All blocks in offset order
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> + '_ {
        self.graph.nodes().map(|(_, block)| block)
    }

    /// The block starting at `offset`
    #[must_use]
    pub fn block_at_offset(&self, offset: u32) -> Option<NodeId> {
        let mut low = 0;
        let mut high = self.graph.node_count();
        while low < high {
            let mid = (low + high) / 2;
            let block_offset = self.graph.node(NodeId::new(mid)).map_or(0, |b| b.offset);
            match block_offset.cmp(&offset) {
                std::cmp::Ordering::Equal => return Some(NodeId::new(mid)),
                std::cmp::Ordering::Less => low = mid + 1,
                std::cmp::Ordering::Greater => high = mid,
            }
        }
        None
    }

    /// The exception regions the graph was built with
    #[must_use]
    pub fn regions(&self) -> &ExceptionRegionTable {
        &self.regions
    }

    /// Outgoing edges of `node` with their target and kind
    pub fn edges(&self, node: NodeId) -> impl Iterator<Item = (NodeId, CfgEdgeKind)> + '_ {
        self.graph
            .outgoing_edges(node)
            .map(|(target, edge)| (target, edge.kind()))
    }

    /// The instructions of all blocks, in offset order
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.blocks().flat_map(|block| block.instructions.iter())
    }

    /// A view of the graph without exceptional edges
    #[must_use]
    pub fn normal_flow(&self) -> NormalFlow<'_> {
        NormalFlow { cfg: self }
    }

    /// The dominator tree over all edges, computed on first use
    #[must_use]
    pub fn dominators(&self) -> &DominatorTree {
        self.dominators
            .get_or_init(|| compute_dominators(&self.graph, self.entry))
    }

    /// The post-dominator tree over normal edges, computed on first use
    pub fn post_dominators(&self) -> &PostDominatorTree {
        self.post_dominators.get_or_init(|| {
            let mut reversed = self.graph.reversed(|edge| {
                (!edge.kind().is_exceptional()).then_some(())
            });
            let exit = reversed.add_node(());
            for &node in &self.exits {
                // Both endpoints exist in the reversed graph
                let _ = reversed.add_edge(exit, node, ());
            }

            PostDominatorTree {
                tree: compute_dominators(&reversed, exit),
                exit,
            }
        })
    }

    /// The natural loops over normal edges, sorted by header, computed on first use
    pub fn loops(&self) -> &[NaturalLoop] {
        self.loops.get_or_init(|| {
            let loops = detect_loops(&self.normal_flow(), self.dominators());
            log::trace!("found {} natural loops", loops.len());
            loops
        })
    }
}

/// Offset-ordered lookup of the instruction starting at `offset`.
fn instruction_at(instructions: &[Instruction], offset: i64) -> Option<usize> {
    let offset = u32::try_from(offset).ok()?;
    instructions
        .binary_search_by_key(&offset, |instruction| instruction.offset)
        .ok()
}

impl GraphBase for ControlFlowGraph {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.graph.node_ids()
    }
}

impl Successors for ControlFlowGraph {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.successors(node)
    }
}

impl Predecessors for ControlFlowGraph {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.predecessors(node)
    }
}

impl RootedGraph for ControlFlowGraph {
    fn entry(&self) -> NodeId {
        self.entry
    }
}

/// The control flow graph restricted to normal (non-exceptional) edges.
#[derive(Clone, Copy)]
pub struct NormalFlow<'a> {
    cfg: &'a ControlFlowGraph,
}

impl GraphBase for NormalFlow<'_> {
    fn node_count(&self) -> usize {
        self.cfg.graph.node_count()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.cfg.graph.node_ids()
    }
}

impl Successors for NormalFlow<'_> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.cfg
            .graph
            .outgoing_edges(node)
            .filter(|(_, edge)| !edge.kind().is_exceptional())
            .map(|(target, _)| target)
    }
}

impl Predecessors for NormalFlow<'_> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.cfg
            .graph
            .incoming_edges(node)
            .filter(|(_, edge)| !edge.kind().is_exceptional())
            .map(|(source, _)| source)
    }
}
