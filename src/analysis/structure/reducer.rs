//! Reduction of a control flow graph into nested regions.
//!
//! The reducer works on half-open ranges of block indices. Because blocks are numbered in
//! offset order, a range is a contiguous slice of the method body, and a tree of nested
//! ranges renders in the original instruction order.
//!
//! Reduction happens in two phases:
//!
//! 1. **Candidates**: try groups and natural loops become constructs when they are laid out
//!    contiguously. Non-contiguous layouts, retreating edges outside any natural loop and
//!    constructs crossing each other become irreducible spans. Spans absorb every construct
//!    they partially overlap until the remaining constructs and spans nest cleanly.
//! 2. **Descent**: each range is walked in offset order. At every block the widest
//!    construct or span starting there is taken; otherwise a two-way branch becomes a
//!    conditional when its arms are single-entry and reconverge; anything else is a plain
//!    block.

use std::cmp::Reverse;

use crate::{
    analysis::{
        cfg::ControlFlowGraph,
        exceptions::ExceptionRegion,
        structure::{HandlerRegion, IrreducibleRegionWarning, Region, RegionTree},
    },
    disassembler::FlowType,
    utils::graph::{NodeId, Predecessors, Successors},
};

/// Half-open range of block indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    lo: usize,
    hi: usize,
}

impl Span {
    fn new(lo: usize, hi: usize) -> Self {
        Span { lo, hi }
    }

    fn contains(self, index: usize) -> bool {
        self.lo <= index && index < self.hi
    }

    fn contains_span(self, other: Span) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }

    fn intersects(self, other: Span) -> bool {
        self.lo < other.hi && other.lo < self.hi
    }

    fn union(self, other: Span) -> Span {
        Span::new(self.lo.min(other.lo), self.hi.max(other.hi))
    }
}

#[derive(Debug)]
struct HandlerLayout {
    clause: ExceptionRegion,
    filter: Option<Span>,
    body: Span,
}

#[derive(Debug)]
enum ConstructKind {
    Loop { header: NodeId },
    Try { body: Span, handlers: Vec<HandlerLayout> },
}

impl ConstructKind {
    fn rank(&self) -> u8 {
        match self {
            ConstructKind::Loop { .. } => 0,
            ConstructKind::Try { .. } => 1,
        }
    }
}

#[derive(Debug)]
struct Construct {
    span: Span,
    /// Sub-ranges that are structured independently; they tile `span`
    parts: Vec<Span>,
    kind: ConstructKind,
}

impl Construct {
    /// Returns `true` if `span` lies entirely within one part
    fn nests(&self, span: Span) -> bool {
        self.parts.iter().any(|part| part.contains_span(span))
    }
}

#[derive(Debug)]
struct Unreduced {
    span: Span,
    reason: String,
}

/// Reduces `cfg` into a tree of nested regions.
///
/// The tree covers every block exactly once. Spans whose control flow has no nested form
/// become [`Region::Fallback`] nodes, each reported as an [`IrreducibleRegionWarning`]
/// and logged at warn level.
///
/// # Examples
///
/// ```rust
/// use ilscope::{
///     analysis::{reduce, ControlFlowGraph, ExceptionRegionTable, Region},
///     disassembler::decode_stream,
///     metadata::resolver::NullResolver,
/// };
///
/// // 0: nop; 1: ldarg.0; 2: brfalse.s +3; 4: nop; 5: br.s -6; 7: ret
/// let code = [0x00, 0x02, 0x2C, 0x03, 0x00, 0x2B, 0xFA, 0x2A];
/// let cfg = ControlFlowGraph::build(decode_stream(&code, &NullResolver)?, ExceptionRegionTable::default())?;
/// let tree = reduce(&cfg);
///
/// let Region::Sequence(children) = &tree.root else { unreachable!() };
/// assert!(matches!(children[1], Region::Loop { .. }));
/// # Ok::<(), ilscope::Error>(())
/// ```
#[must_use]
pub fn reduce(cfg: &ControlFlowGraph) -> RegionTree {
    let mut reducer = Reducer::new(cfg);
    let root = Region::Sequence(reducer.structure_range(Span::new(0, cfg.block_count())));

    log::trace!(
        "reduced {} blocks to depth {} with {} irreducible spans",
        cfg.block_count(),
        root.depth(),
        reducer.warnings.len()
    );

    RegionTree {
        root,
        warnings: reducer.warnings,
    }
}

struct Reducer<'a> {
    cfg: &'a ControlFlowGraph,
    constructs: Vec<Construct>,
    consumed: Vec<bool>,
    unreduced: Vec<Unreduced>,
    loop_headers: Vec<usize>,
    warnings: Vec<IrreducibleRegionWarning>,
}

impl<'a> Reducer<'a> {
    fn new(cfg: &'a ControlFlowGraph) -> Self {
        let offsets: Vec<u32> = cfg.blocks().map(|block| block.offset).collect();
        let block_index = |offset: u32| offsets.partition_point(|&o| o < offset);

        let mut constructs = Vec::new();
        let mut unreduced = Vec::new();

        for group in cfg.regions().groups() {
            let body = Span::new(block_index(group.try_start), block_index(group.try_end));
            let mut parts = vec![body];
            let mut handlers = Vec::with_capacity(group.handlers.len());
            let mut cursor = group.try_end;
            let mut contiguous = true;

            for clause in &group.handlers {
                let full = clause.full_handler_range();
                contiguous &= full.start == cursor;
                cursor = full.end;

                let filter = clause
                    .filter_range()
                    .map(|range| Span::new(block_index(range.start), block_index(range.end)));
                let handler = Span::new(
                    block_index(clause.handler_start),
                    block_index(clause.handler_end),
                );
                parts.extend(filter);
                parts.push(handler);
                handlers.push(HandlerLayout {
                    clause: (*clause).clone(),
                    filter,
                    body: handler,
                });
            }

            let lo = parts.iter().map(|p| p.lo).min().unwrap_or(body.lo);
            let hi = parts.iter().map(|p| p.hi).max().unwrap_or(body.hi);
            let span = Span::new(lo, hi);

            if !contiguous {
                unreduced.push(Unreduced {
                    span,
                    reason: format!(
                        "handlers of the protected range at IL_{:04x} are not laid out after it",
                        group.try_start
                    ),
                });
                continue;
            }

            if let Some((source, target)) = Self::side_entry(cfg, span) {
                unreduced.push(Unreduced {
                    span: span.union(Span::new(source, source + 1)),
                    reason: format!(
                        "branch from IL_{:04x} into the protected range at IL_{:04x}",
                        offsets[source], offsets[target]
                    ),
                });
                continue;
            }

            constructs.push(Construct {
                span,
                parts,
                kind: ConstructKind::Try { body, handlers },
            });
        }

        for natural_loop in cfg.loops() {
            let (first, last) = natural_loop.span();
            let span = Span::new(first, last + 1);

            if natural_loop.is_contiguous() {
                constructs.push(Construct {
                    span,
                    parts: vec![span],
                    kind: ConstructKind::Loop {
                        header: natural_loop.header,
                    },
                });
            } else {
                unreduced.push(Unreduced {
                    span,
                    reason: format!(
                        "loop at IL_{:04x} is not laid out contiguously",
                        offsets[natural_loop.header.index()]
                    ),
                });
            }
        }

        let flow = cfg.normal_flow();
        for source in 0..cfg.block_count() {
            for target in flow.successors(NodeId::new(source)) {
                let target = target.index();
                if target > source {
                    continue;
                }

                let in_loop = cfg.loops().iter().any(|l| {
                    l.contains(NodeId::new(source)) && l.contains(NodeId::new(target))
                });
                if !in_loop {
                    unreduced.push(Unreduced {
                        span: Span::new(target, source + 1),
                        reason: format!(
                            "branch from IL_{:04x} back to IL_{:04x} outside a loop",
                            offsets[source], offsets[target]
                        ),
                    });
                }
            }
        }

        let unreduced = Self::resolve(&mut constructs, unreduced);
        constructs.sort_by_key(|c| (c.span.lo, Reverse(c.span.hi), c.kind.rank()));

        Reducer {
            cfg,
            consumed: vec![false; constructs.len()],
            constructs,
            unreduced,
            loop_headers: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A normal edge from outside `span` into any block but its first
    fn side_entry(cfg: &ControlFlowGraph, span: Span) -> Option<(usize, usize)> {
        let flow = cfg.normal_flow();
        (span.lo + 1..span.hi).find_map(|target| {
            flow.predecessors(NodeId::new(target))
                .map(NodeId::index)
                .find(|&source| !span.contains(source))
                .map(|source| (source, target))
        })
    }

    /// Grows irreducible spans until constructs and spans form a properly nested family.
    fn resolve(constructs: &mut Vec<Construct>, mut unreduced: Vec<Unreduced>) -> Vec<Unreduced> {
        loop {
            unreduced.sort_by_key(|u| (u.span.lo, Reverse(u.span.hi)));
            let mut merged: Vec<Unreduced> = Vec::with_capacity(unreduced.len());
            for span in unreduced {
                match merged.last_mut() {
                    Some(last) if last.span.intersects(span.span) => {
                        last.span = last.span.union(span.span);
                    }
                    _ => merged.push(span),
                }
            }
            unreduced = merged;

            let mut changed = false;
            constructs.retain(|construct| {
                for span in &mut unreduced {
                    if !construct.span.intersects(span.span) || construct.nests(span.span) {
                        continue;
                    }
                    if !span.span.contains_span(construct.span) {
                        span.span = span.span.union(construct.span);
                        changed = true;
                    }
                    return false;
                }
                true
            });

            for (i, outer) in constructs.iter().enumerate() {
                for inner in &constructs[i + 1..] {
                    if !outer.span.intersects(inner.span)
                        || outer.nests(inner.span)
                        || inner.nests(outer.span)
                    {
                        continue;
                    }

                    unreduced.push(Unreduced {
                        span: outer.span.union(inner.span),
                        reason: "loop and protected range cross each other".to_string(),
                    });
                    changed = true;
                }
            }

            if !changed {
                return unreduced;
            }
        }
    }

    fn structure_range(&mut self, range: Span) -> Vec<Region> {
        let mut children = Vec::new();
        let mut index = range.lo;

        while index < range.hi {
            if let Some(position) = self.construct_at(index, range) {
                self.consumed[position] = true;
                let span = self.constructs[position].span;
                children.push(self.build_construct(position));
                index = span.hi;
                continue;
            }

            if let Some(position) = self
                .unreduced
                .iter()
                .position(|u| u.span.lo == index && u.span.hi <= range.hi)
            {
                let span = self.unreduced[position].span;
                children.push(self.fallback(position));
                index = span.hi;
                continue;
            }

            if let Some((conditional, next)) = self.conditional(index, range) {
                children.push(conditional);
                index = next;
                continue;
            }

            children.push(Region::Block(NodeId::new(index)));
            index += 1;
        }

        children
    }

    fn construct_at(&self, index: usize, range: Span) -> Option<usize> {
        self.constructs.iter().enumerate().position(|(position, c)| {
            !self.consumed[position] && c.span.lo == index && c.span.hi <= range.hi
        })
    }

    fn build_construct(&mut self, position: usize) -> Region {
        let span = self.constructs[position].span;
        match &self.constructs[position].kind {
            ConstructKind::Loop { header } => {
                let header = *header;
                self.loop_headers.push(header.index());
                let body = self.structure_range(span);
                self.loop_headers.pop();

                Region::Loop {
                    header,
                    body: Box::new(Region::sequence(body)),
                }
            }
            ConstructKind::Try { body, handlers } => {
                let body = *body;
                let layouts: Vec<(ExceptionRegion, Option<Span>, Span)> = handlers
                    .iter()
                    .map(|h| (h.clause.clone(), h.filter, h.body))
                    .collect();

                let try_body = Region::sequence(self.structure_range(body));
                let handlers = layouts
                    .into_iter()
                    .map(|(clause, filter, body)| HandlerRegion {
                        clause,
                        filter: filter.map(|span| Region::sequence(self.structure_range(span))),
                        body: Region::sequence(self.structure_range(body)),
                    })
                    .collect();

                Region::TryHandler {
                    try_body: Box::new(try_body),
                    handlers,
                }
            }
        }
    }

    fn fallback(&mut self, position: usize) -> Region {
        let unreduced = &self.unreduced[position];
        let span = unreduced.span;
        let start_offset = self.block_offset(span.lo);
        let end_offset = self
            .cfg
            .block(NodeId::new(span.hi - 1))
            .map_or(start_offset, |block| block.end_offset());

        let warning = IrreducibleRegionWarning {
            start_offset,
            end_offset,
            reason: unreduced.reason.clone(),
        };
        log::warn!("{warning}");
        self.warnings.push(warning.clone());

        Region::Fallback {
            blocks: (span.lo..span.hi).map(NodeId::new).collect(),
            warning,
        }
    }

    fn block_offset(&self, index: usize) -> u32 {
        self.cfg.block(NodeId::new(index)).map_or(0, |block| block.offset)
    }

    /// Recognizes `index` as the head of an if or if-else.
    ///
    /// The fall-through arm runs from the next block to the branch target. If it ends with an
    /// unconditional forward branch past the target, the blocks in between form the else arm.
    fn conditional(&mut self, index: usize, range: Span) -> Option<(Region, usize)> {
        let block = self.cfg.block(NodeId::new(index))?;
        if block.flow_type() != FlowType::ConditionalBranch {
            return None;
        }
        let &[taken, fallthrough] = block.successors.as_slice() else {
            return None;
        };
        if fallthrough != index + 1 || taken <= fallthrough || taken > range.hi {
            return None;
        }

        let then_span = Span::new(fallthrough, taken);
        if let Some(join) = self.jump_over(then_span, range) {
            let else_span = Span::new(taken, join);
            if self.accepts(index, &[then_span, else_span], join, range) {
                let then_branch = Region::sequence(self.structure_range(then_span));
                let else_branch = Region::sequence(self.structure_range(else_span));
                return Some((
                    Region::Conditional {
                        condition: NodeId::new(index),
                        then_branch: Box::new(then_branch),
                        else_branch: Some(Box::new(else_branch)),
                    },
                    join,
                ));
            }
        }

        if self.accepts(index, &[then_span], taken, range) {
            let then_branch = Region::sequence(self.structure_range(then_span));
            return Some((
                Region::Conditional {
                    condition: NodeId::new(index),
                    then_branch: Box::new(then_branch),
                    else_branch: None,
                },
                taken,
            ));
        }

        None
    }

    fn jump_over(&self, arm: Span, range: Span) -> Option<usize> {
        let last = self.cfg.block(NodeId::new(arm.hi - 1))?;
        if last.flow_type() != FlowType::UnconditionalBranch {
            return None;
        }
        match last.successors.as_slice() {
            &[target] if target > arm.hi && target <= range.hi => Some(target),
            _ => None,
        }
    }

    fn accepts(&self, condition: usize, arms: &[Span], join: usize, range: Span) -> bool {
        if !arms.iter().all(|&arm| self.is_closed(condition, arm, join, range)) {
            return false;
        }

        let ipdom = self
            .cfg
            .post_dominators()
            .immediate_post_dominator(NodeId::new(condition));
        if ipdom == Some(NodeId::new(join)) {
            return true;
        }

        // Arms that only return, throw, break or continue never reach the join
        let flow = self.cfg.normal_flow();
        arms.iter().all(|&arm| {
            (arm.lo..arm.hi).all(|block| {
                flow.successors(NodeId::new(block))
                    .map(NodeId::index)
                    .all(|target| {
                        arm.contains(target) || (target != join && self.leaves(target, range))
                    })
            })
        })
    }

    /// Single entry, no edges into other arms, and no construct crossing the arm boundary
    fn is_closed(&self, condition: usize, arm: Span, join: usize, range: Span) -> bool {
        let flow = self.cfg.normal_flow();
        for block in arm.lo..arm.hi {
            let node = NodeId::new(block);
            let entered = flow
                .predecessors(node)
                .map(NodeId::index)
                .all(|source| arm.contains(source) || (block == arm.lo && source == condition));
            let exits = flow
                .successors(node)
                .map(NodeId::index)
                .all(|target| arm.contains(target) || target == join || self.leaves(target, range));
            if !entered || !exits {
                return false;
            }
        }

        let constructs = self
            .constructs
            .iter()
            .enumerate()
            .filter(|(position, _)| !self.consumed[*position])
            .map(|(_, c)| c.span);
        let spans = self.unreduced.iter().map(|u| u.span);
        constructs
            .chain(spans)
            .filter(|span| span.intersects(arm))
            .all(|span| arm.contains_span(span))
    }

    /// Targets outside the range being structured, or the header of an enclosing loop
    fn leaves(&self, target: usize, range: Span) -> bool {
        !range.contains(target) || self.loop_headers.contains(&target)
    }
}
