//! Normalized exception handling regions.
//!
//! Raw clauses parsed from a method body's data sections are validated and turned into
//! [`ExceptionRegion`]s with half-open offset ranges. The [`ExceptionRegionTable`] keeps them
//! sorted by `try_start`, narrowest try range first for equal starts, and by declaration
//! order after that, which is the order in which nested `.try` blocks open in the output.

use std::ops::Range;

use crate::{
    metadata::{
        method::{ExceptionHandler, ExceptionHandlerFlags},
        resolver::{TypeRef, TokenResolver},
    },
    Result,
};

/// What kind of handler protects a try range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    /// Typed handler, catching exceptions assignable to the given type
    Catch(TypeRef),
    /// Filtered handler; the filter block runs from `filter_start` up to the handler start
    Filter {
        /// First offset of the filter block
        filter_start: u32,
    },
    /// Runs whenever the try range is left
    Finally,
    /// Runs only when the try range is left by an exception
    Fault,
}

impl HandlerKind {
    /// The IL keyword introducing this handler
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            HandlerKind::Catch(_) => "catch",
            HandlerKind::Filter { .. } => "filter",
            HandlerKind::Finally => "finally",
            HandlerKind::Fault => "fault",
        }
    }
}

/// A validated exception handling clause.
///
/// All ranges are half-open. `try_start < try_end <= handler_start < handler_end` holds,
/// and for filters additionally `try_end <= filter_start < handler_start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRegion {
    /// First offset of the protected range
    pub try_start: u32,
    /// End of the protected range (exclusive)
    pub try_end: u32,
    /// First offset of the handler
    pub handler_start: u32,
    /// End of the handler (exclusive)
    pub handler_end: u32,
    /// Handler kind
    pub kind: HandlerKind,
    /// Position of the clause in the method's declaration order
    pub index: usize,
}

impl ExceptionRegion {
    /// The protected range
    #[must_use]
    pub fn try_range(&self) -> Range<u32> {
        self.try_start..self.try_end
    }

    /// The handler range, excluding any filter block
    #[must_use]
    pub fn handler_range(&self) -> Range<u32> {
        self.handler_start..self.handler_end
    }

    /// The filter block of a filter clause
    #[must_use]
    pub fn filter_range(&self) -> Option<Range<u32>> {
        match self.kind {
            HandlerKind::Filter { filter_start } => Some(filter_start..self.handler_start),
            _ => None,
        }
    }

    /// The first offset of the handler side: the filter block for filters, the handler otherwise
    #[must_use]
    pub fn handler_entry(&self) -> u32 {
        match self.kind {
            HandlerKind::Filter { filter_start } => filter_start,
            _ => self.handler_start,
        }
    }

    /// The handler side including the filter block
    #[must_use]
    pub fn full_handler_range(&self) -> Range<u32> {
        self.handler_entry()..self.handler_end
    }

    /// Returns `true` if `offset` lies in the protected range
    #[must_use]
    pub fn protects(&self, offset: u32) -> bool {
        self.try_range().contains(&offset)
    }

    /// Every range boundary of this clause, ends included
    pub fn boundaries(&self) -> impl Iterator<Item = u32> {
        let filter = match self.kind {
            HandlerKind::Filter { filter_start } => Some(filter_start),
            _ => None,
        };

        [self.try_start, self.try_end, self.handler_start, self.handler_end]
            .into_iter()
            .chain(filter)
    }
}

/// All clauses sharing a single try range, in declaration order.
#[derive(Debug, Clone)]
pub struct RegionGroup<'a> {
    /// First offset of the shared protected range
    pub try_start: u32,
    /// End of the shared protected range (exclusive)
    pub try_end: u32,
    /// The handlers, in declaration order
    pub handlers: Vec<&'a ExceptionRegion>,
}

impl RegionGroup<'_> {
    /// The shared protected range
    #[must_use]
    pub fn try_range(&self) -> Range<u32> {
        self.try_start..self.try_end
    }

    /// First offset covered by the group's handler side
    #[must_use]
    pub fn handlers_start(&self) -> u32 {
        self.handlers
            .iter()
            .map(|region| region.handler_entry())
            .min()
            .unwrap_or(self.try_end)
    }

    /// End of the group's handler side (exclusive)
    #[must_use]
    pub fn handlers_end(&self) -> u32 {
        self.handlers
            .iter()
            .map(|region| region.handler_end)
            .max()
            .unwrap_or(self.try_end)
    }
}

/// The validated and sorted exception regions of one method body.
///
/// # Examples
///
/// ```rust
/// use ilscope::{
///     analysis::{ExceptionRegionTable, HandlerKind},
///     metadata::{method::{ExceptionHandler, ExceptionHandlerFlags}, resolver::MapResolver},
/// };
///
/// let clause = ExceptionHandler {
///     flags: ExceptionHandlerFlags::FINALLY,
///     try_offset: 0,
///     try_length: 10,
///     handler_offset: 10,
///     handler_length: 4,
///     filter_offset: 0,
/// };
///
/// let table = ExceptionRegionTable::build(&[clause], 14, &MapResolver::new())?;
/// assert_eq!(table.regions()[0].kind, HandlerKind::Finally);
/// assert_eq!(table.groups().len(), 1);
/// # Ok::<(), ilscope::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExceptionRegionTable {
    regions: Vec<ExceptionRegion>,
}

impl ExceptionRegionTable {
    /// Validates `clauses` against a code section of `code_size` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedExceptionTable`] if a clause has an unknown kind,
    /// violates the range ordering, exceeds the code size, partially overlaps another clause
    /// or names a catch type the `resolver` cannot resolve.
    pub fn build(
        clauses: &[ExceptionHandler],
        code_size: u32,
        resolver: &dyn TokenResolver,
    ) -> Result<Self> {
        let mut regions = Vec::with_capacity(clauses.len());
        for (index, clause) in clauses.iter().enumerate() {
            regions.push(Self::normalize(index, clause, code_size, resolver)?);
        }

        Self::check_nesting(&regions)?;

        regions.sort_by_key(|region| (region.try_start, region.try_end, region.index));
        Ok(ExceptionRegionTable { regions })
    }

    fn normalize(
        index: usize,
        clause: &ExceptionHandler,
        code_size: u32,
        resolver: &dyn TokenResolver,
    ) -> Result<ExceptionRegion> {
        let try_end = clause
            .try_offset
            .checked_add(clause.try_length)
            .ok_or_else(|| eh_table_error!("clause {} - try range overflows", index))?;
        let handler_end = clause
            .handler_offset
            .checked_add(clause.handler_length)
            .ok_or_else(|| eh_table_error!("clause {} - handler range overflows", index))?;

        let flags = clause.flags;
        let kind = if flags == ExceptionHandlerFlags::EXCEPTION {
            let token = clause.class_token();
            let catch_type = resolver.resolve_type(token).ok_or_else(|| {
                eh_table_error!("clause {} - unresolved catch type {}", index, token)
            })?;
            HandlerKind::Catch(catch_type)
        } else if flags == ExceptionHandlerFlags::FILTER {
            HandlerKind::Filter {
                filter_start: clause.filter_offset,
            }
        } else if flags == ExceptionHandlerFlags::FINALLY {
            HandlerKind::Finally
        } else if flags == ExceptionHandlerFlags::FAULT {
            HandlerKind::Fault
        } else {
            return Err(eh_table_error!(
                "clause {} - unknown clause kind {:#x}",
                index,
                flags.bits()
            ));
        };

        let region = ExceptionRegion {
            try_start: clause.try_offset,
            try_end,
            handler_start: clause.handler_offset,
            handler_end,
            kind,
            index,
        };

        if region.try_start >= region.try_end {
            return Err(eh_table_error!("clause {} - empty try range", index));
        }
        if region.handler_start >= region.handler_end {
            return Err(eh_table_error!("clause {} - empty handler range", index));
        }
        if region.try_end > region.handler_start {
            return Err(eh_table_error!(
                "clause {} - handler IL_{:04x} starts inside or before its try range ending at IL_{:04x}",
                index,
                region.handler_start,
                region.try_end
            ));
        }
        if let Some(filter) = region.filter_range() {
            if filter.start < region.try_end || filter.start >= filter.end {
                return Err(eh_table_error!(
                    "clause {} - filter IL_{:04x} is not between the try range and the handler",
                    index,
                    filter.start
                ));
            }
        }
        if region.handler_end > code_size {
            return Err(eh_table_error!(
                "clause {} - handler ends at IL_{:04x}, past the code size {:#x}",
                index,
                region.handler_end,
                code_size
            ));
        }

        Ok(region)
    }

    /// Protected and handler ranges of different clauses must nest or be disjoint.
    fn check_nesting(regions: &[ExceptionRegion]) -> Result<()> {
        let ranges: Vec<(usize, Range<u32>)> = regions
            .iter()
            .flat_map(|region| {
                [
                    (region.index, region.try_range()),
                    (region.index, region.full_handler_range()),
                ]
            })
            .collect();

        for (i, (left_index, left)) in ranges.iter().enumerate() {
            for (right_index, right) in &ranges[i + 1..] {
                let disjoint = left.end <= right.start || right.end <= left.start;
                let nested = (left.start <= right.start && right.end <= left.end)
                    || (right.start <= left.start && left.end <= right.end);

                if !disjoint && !nested {
                    return Err(eh_table_error!(
                        "clauses {} and {} partially overlap at IL_{:04x}..IL_{:04x} and IL_{:04x}..IL_{:04x}",
                        left_index,
                        right_index,
                        left.start,
                        left.end,
                        right.start,
                        right.end
                    ));
                }
            }
        }

        Ok(())
    }

    /// All regions in table order
    #[must_use]
    pub fn regions(&self) -> &[ExceptionRegion] {
        &self.regions
    }

    /// Number of regions
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if the method has no exception handling
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions sharing a try range, merged into one ordered handler list each.
    ///
    /// Groups are returned in table order.
    #[must_use]
    pub fn groups(&self) -> Vec<RegionGroup<'_>> {
        let mut groups: Vec<RegionGroup<'_>> = Vec::new();
        for region in &self.regions {
            match groups.last_mut() {
                Some(group) if group.try_range() == region.try_range() => {
                    group.handlers.push(region);
                }
                _ => groups.push(RegionGroup {
                    try_start: region.try_start,
                    try_end: region.try_end,
                    handlers: vec![region],
                }),
            }
        }

        for group in &mut groups {
            group.handlers.sort_by_key(|region| region.index);
        }

        groups
    }

    /// Table positions of the regions whose try range contains `offset`, outermost first
    pub fn enclosing(&self, offset: u32) -> impl Iterator<Item = usize> + '_ {
        let mut positions: Vec<usize> = self
            .regions
            .iter()
            .enumerate()
            .filter(|(_, region)| region.protects(offset))
            .map(|(position, _)| position)
            .collect();

        positions.sort_by_key(|&position| {
            let region = &self.regions[position];
            (u32::MAX - (region.try_end - region.try_start), region.index)
        });
        positions.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{resolver::MapResolver, token::Token},
        Error,
    };

    fn clause(flags: ExceptionHandlerFlags, t: (u32, u32), h: (u32, u32), extra: u32) -> ExceptionHandler {
        ExceptionHandler {
            flags,
            try_offset: t.0,
            try_length: t.1 - t.0,
            handler_offset: h.0,
            handler_length: h.1 - h.0,
            filter_offset: extra,
        }
    }

    fn resolver() -> MapResolver {
        MapResolver::new()
            .with_type(Token::new(0x0100_0001), "[mscorlib]System.Exception")
            .with_type(Token::new(0x0100_0002), "[mscorlib]System.IO.IOException")
    }

    #[test]
    fn single_catch() {
        let clauses = [clause(ExceptionHandlerFlags::EXCEPTION, (0, 10), (10, 20), 0x0100_0001)];
        let table = ExceptionRegionTable::build(&clauses, 20, &resolver()).unwrap();

        let region = &table.regions()[0];
        assert_eq!(region.try_range(), 0..10);
        assert_eq!(region.handler_range(), 10..20);
        assert!(matches!(&region.kind, HandlerKind::Catch(t) if t.name.ends_with("Exception")));
        assert_eq!(region.kind.keyword(), "catch");
    }

    #[test]
    fn sorted_narrowest_first() {
        let clauses = [
            clause(ExceptionHandlerFlags::FINALLY, (0, 30), (30, 35), 0),
            clause(ExceptionHandlerFlags::EXCEPTION, (0, 10), (10, 20), 0x0100_0001),
            clause(ExceptionHandlerFlags::FAULT, (12, 14), (14, 16), 0),
        ];
        let table = ExceptionRegionTable::build(&clauses, 35, &resolver()).unwrap();

        let order: Vec<usize> = table.regions().iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 0, 2]);

        let enclosing: Vec<usize> = table.enclosing(5).collect();
        assert_eq!(enclosing, vec![1, 0]);
    }

    #[test]
    fn shared_try_range_groups() {
        let clauses = [
            clause(ExceptionHandlerFlags::EXCEPTION, (0, 10), (10, 15), 0x0100_0002),
            clause(ExceptionHandlerFlags::EXCEPTION, (0, 10), (15, 20), 0x0100_0001),
        ];
        let table = ExceptionRegionTable::build(&clauses, 20, &resolver()).unwrap();
        let groups = table.groups();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].handlers.len(), 2);
        assert_eq!(groups[0].handlers[0].index, 0);
        assert_eq!(groups[0].handlers_start(), 10);
        assert_eq!(groups[0].handlers_end(), 20);
    }

    #[test]
    fn filter_clause() {
        let clauses = [clause(ExceptionHandlerFlags::FILTER, (0, 8), (12, 20), 8)];
        let table = ExceptionRegionTable::build(&clauses, 20, &resolver()).unwrap();

        let region = &table.regions()[0];
        assert_eq!(region.filter_range(), Some(8..12));
        assert_eq!(region.handler_entry(), 8);
        assert_eq!(region.boundaries().collect::<Vec<_>>(), vec![0, 8, 12, 20, 8]);
    }

    #[test]
    fn rejects_filter_outside_clause() {
        let clauses = [clause(ExceptionHandlerFlags::FILTER, (0, 8), (12, 20), 4)];
        assert!(matches!(
            ExceptionRegionTable::build(&clauses, 20, &resolver()),
            Err(Error::MalformedExceptionTable(_))
        ));
    }

    #[test]
    fn rejects_handler_before_try() {
        let clauses = [clause(ExceptionHandlerFlags::FINALLY, (10, 20), (0, 10), 0)];
        assert!(matches!(
            ExceptionRegionTable::build(&clauses, 20, &resolver()),
            Err(Error::MalformedExceptionTable(_))
        ));
    }

    #[test]
    fn rejects_out_of_bounds() {
        let clauses = [clause(ExceptionHandlerFlags::FINALLY, (0, 10), (10, 30), 0)];
        assert!(matches!(
            ExceptionRegionTable::build(&clauses, 20, &resolver()),
            Err(Error::MalformedExceptionTable(_))
        ));
    }

    #[test]
    fn rejects_partial_overlap() {
        let clauses = [
            clause(ExceptionHandlerFlags::FINALLY, (0, 10), (20, 25), 0),
            clause(ExceptionHandlerFlags::FINALLY, (5, 15), (25, 30), 0),
        ];
        let error = ExceptionRegionTable::build(&clauses, 30, &resolver()).unwrap_err();
        assert!(error.to_string().contains("partially overlap"));
    }

    #[test]
    fn rejects_unresolved_catch_type() {
        let clauses = [clause(ExceptionHandlerFlags::EXCEPTION, (0, 10), (10, 20), 0x0100_0099)];
        assert!(matches!(
            ExceptionRegionTable::build(&clauses, 20, &resolver()),
            Err(Error::MalformedExceptionTable(_))
        ));
    }

    #[test]
    fn rejects_unknown_kind() {
        let mut raw = clause(ExceptionHandlerFlags::FINALLY, (0, 10), (10, 20), 0);
        raw.flags = ExceptionHandlerFlags::from_bits_retain(0x0003);
        assert!(ExceptionRegionTable::build(&[raw], 20, &resolver()).is_err());
    }
}
