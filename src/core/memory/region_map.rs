// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sub-region bookkeeping for the reserved fastmem range
//!
//! The reservation is described by an ordered list of [`SubRegion`]s that are
//! disjoint and together cover `[0, size)` exactly. Mapping a view splits the
//! entries at both ends of the target and collapses the covered span into one
//! mapped entry. Unmapping does the same but marks the span free and then
//! merges it with free neighbours, so a fully unmapped reservation always
//! ends up as a single free entry again.
//!
//! The map is purely arithmetic. [`MemArena`](super::arena::MemArena) performs
//! the actual OS calls and only updates the bookkeeping once they succeed.

/// One contiguous piece of the reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubRegion {
    /// Offset from the reservation base
    pub start: usize,

    /// Length in bytes
    pub size: usize,

    /// Whether a view of the backing segment is mapped here
    pub mapped: bool,
}

impl SubRegion {
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.size
    }

    #[inline]
    fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }
}

/// Ordered, covering list of sub-regions
#[derive(Debug, Clone)]
pub struct RegionMap {
    size: usize,
    regions: Vec<SubRegion>,
}

impl RegionMap {
    /// Create a map for a reservation of `size` bytes, entirely free
    pub fn new(size: usize) -> Self {
        let regions = if size == 0 {
            Vec::new()
        } else {
            vec![SubRegion {
                start: 0,
                size,
                mapped: false,
            }]
        };
        Self { size, regions }
    }

    /// Total size of the reservation
    pub fn size(&self) -> usize {
        self.size
    }

    /// Current sub-regions, ordered by offset
    pub fn regions(&self) -> &[SubRegion] {
        &self.regions
    }

    /// Whether `[offset, offset + size)` lies inside the reservation
    pub fn in_bounds(&self, offset: usize, size: usize) -> bool {
        size != 0
            && offset
                .checked_add(size)
                .is_some_and(|end| end <= self.size)
    }

    /// Find the sub-region that contains `offset`
    pub fn lookup(&self, offset: usize) -> Option<SubRegion> {
        let index = self.index_of(offset)?;
        Some(self.regions[index])
    }

    /// Whether every byte of the range is covered by mapped sub-regions
    pub fn is_mapped(&self, offset: usize, size: usize) -> bool {
        if !self.in_bounds(offset, size) {
            return false;
        }
        self.regions
            .iter()
            .filter(|r| r.end() > offset && r.start < offset + size)
            .all(|r| r.mapped)
    }

    /// Record a mapping over `[offset, offset + size)`
    ///
    /// Whatever was there before is replaced. Returns `false` without
    /// touching the map when the range falls outside the reservation.
    pub fn map(&mut self, offset: usize, size: usize) -> bool {
        self.replace_span(offset, size, true)
    }

    /// Record that `[offset, offset + size)` is free again
    ///
    /// The freed span is merged with adjacent free entries.
    pub fn unmap(&mut self, offset: usize, size: usize) -> bool {
        if !self.replace_span(offset, size, false) {
            return false;
        }
        self.merge_free();
        true
    }

    fn replace_span(&mut self, offset: usize, size: usize, mapped: bool) -> bool {
        if !self.in_bounds(offset, size) {
            return false;
        }
        let end = offset + size;
        self.split_at(offset);
        self.split_at(end);

        let first = self.regions.partition_point(|r| r.start < offset);
        let last = self.regions.partition_point(|r| r.start < end);
        self.regions.splice(
            first..last,
            std::iter::once(SubRegion {
                start: offset,
                size,
                mapped,
            }),
        );
        true
    }

    /// Split the entry containing `offset` so that an entry starts there
    fn split_at(&mut self, offset: usize) {
        let Some(index) = self.index_of(offset) else {
            return;
        };
        let region = self.regions[index];
        if region.start == offset {
            return;
        }
        let head = offset - region.start;
        self.regions[index].size = head;
        self.regions.insert(
            index + 1,
            SubRegion {
                start: offset,
                size: region.size - head,
                mapped: region.mapped,
            },
        );
    }

    fn merge_free(&mut self) {
        let mut merged: Vec<SubRegion> = Vec::with_capacity(self.regions.len());
        for region in self.regions.drain(..) {
            match merged.last_mut() {
                Some(prev) if !prev.mapped && !region.mapped => prev.size += region.size,
                _ => merged.push(region),
            }
        }
        self.regions = merged;
    }

    fn index_of(&self, offset: usize) -> Option<usize> {
        let index = self.regions.partition_point(|r| r.end() <= offset);
        self.regions
            .get(index)
            .filter(|r| r.contains(offset))
            .map(|_| index)
    }
}
