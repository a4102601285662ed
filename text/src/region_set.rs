//! Ordered, merge-on-overlap collections of [`Region`]s.
//!
//! Used for multi-cursor selections and for batches of edits. The set is kept sorted by
//! [`Region::begin`] and never holds two regions that overlap or contain one another.
//! Edits that change offsets should walk the set back-to-front (`iter().rev()`) so each
//! edit leaves the offsets of the regions still to be processed untouched.

use crate::region::Region;
use std::slice;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region, merging it with any region it overlaps.
    pub fn add(&mut self, region: Region) {
        if let Some(existing) = self.regions.iter_mut().find(|r| should_merge(**r, region)) {
            *existing = existing.cover(region);
        } else {
            self.regions.push(region);
        }
        self.flush();
    }

    pub fn add_all(&mut self, regions: impl IntoIterator<Item = Region>) {
        for region in regions {
            self.add(region);
        }
    }

    /// Remove every part of the set covered by `region`.
    pub fn subtract(&mut self, region: Region) {
        *self = self.cut(region);
    }

    /// A new set holding the parts of this set not covered by `region`.
    pub fn cut(&self, region: Region) -> RegionSet {
        let mut ret = RegionSet::new();
        for r in &self.regions {
            ret.add_all(r.cut(region));
        }
        ret
    }

    /// Shift every region after an edit, then merge any regions the edit collapsed together.
    pub fn adjust(&mut self, position: usize, delta: isize) {
        for region in &mut self.regions {
            region.adjust(position, delta);
        }
        self.flush();
    }

    /// Check if some region in the set equals or covers `region`.
    pub fn contains(&self, region: Region) -> bool {
        self.regions.iter().any(|r| *r == region || r.covers(region))
    }

    pub fn get(&self, index: usize) -> Option<Region> {
        self.regions.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Iterate in ascending order. The iterator is double ended.
    pub fn iter(&self) -> slice::Iter<'_, Region> {
        self.regions.iter()
    }

    /// Whether any region in the set is a caret
    pub fn has_empty(&self) -> bool {
        self.regions.iter().any(Region::is_empty)
    }

    /// Whether any region in the set spans at least one code point
    pub fn has_non_empty(&self) -> bool {
        self.regions.iter().any(|r| !r.is_empty())
    }

    fn flush(&mut self) {
        self.regions.sort_by_key(|r| (r.begin(), r.end()));
        let mut i = 1;
        while i < self.regions.len() {
            let (prev, cur) = (self.regions[i - 1], self.regions[i]);
            if should_merge(prev, cur) {
                self.regions[i - 1] = prev.cover(cur);
                self.regions.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

fn should_merge(existing: Region, incoming: Region) -> bool {
    existing.intersects(incoming) || existing.covers(incoming) || incoming.covers(existing)
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a Region;
    type IntoIter = slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Region> for RegionSet {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        let mut set = RegionSet::new();
        set.add_all(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_regions_sorted() {
        let set: RegionSet = [Region::new(20, 25), Region::new(0, 5), Region::new(10, 12)]
            .into_iter()
            .collect();

        assert_eq!(
            set.regions(),
            &[Region::new(0, 5), Region::new(10, 12), Region::new(20, 25)]
        );
    }

    #[test]
    fn add_merges_overlapping_regions() {
        let mut set = RegionSet::new();
        set.add(Region::new(0, 5));
        set.add(Region::new(10, 15));
        set.add(Region::new(4, 11));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0), Some(Region::new(0, 15)));
    }

    #[test]
    fn touching_regions_stay_separate() {
        let mut set = RegionSet::new();
        set.add(Region::new(0, 5));
        set.add(Region::new(5, 9));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn caret_inside_selection_merges() {
        let mut set = RegionSet::new();
        set.add(Region::new(2, 8));
        set.add(Region::caret(4));
        assert_eq!(set.regions(), &[Region::new(2, 8)]);
    }

    #[test]
    fn duplicate_carets_collapse() {
        let mut set = RegionSet::new();
        set.add(Region::caret(3));
        set.add(Region::caret(3));
        set.add(Region::caret(7));
        assert_eq!(set.regions(), &[Region::caret(3), Region::caret(7)]);
        assert!(set.has_empty());
        assert!(!set.has_non_empty());
    }

    #[test]
    fn subtract_splits_regions() {
        let mut set = RegionSet::new();
        set.add(Region::new(0, 10));
        set.add(Region::new(20, 30));
        set.subtract(Region::new(5, 25));

        assert_eq!(set.regions(), &[Region::new(0, 5), Region::new(25, 30)]);
        assert!(set.has_non_empty());
        assert!(!set.has_empty());
    }

    #[test]
    fn adjust_merges_collapsed_regions() {
        let mut set = RegionSet::new();
        set.add(Region::new(0, 1));
        set.add(Region::new(2, 3));
        set.add(Region::new(4, 6));
        set.add(Region::new(10, 12));

        // Erasing [2, 5) collapses (2, 3) into a caret that (4, 6) now covers
        set.adjust(5, -3);
        assert_eq!(
            set.regions(),
            &[Region::new(0, 1), Region::new(2, 3), Region::new(7, 9)]
        );
    }

    #[test]
    fn reverse_iteration() {
        let set: RegionSet = [Region::caret(1), Region::caret(5), Region::caret(9)]
            .into_iter()
            .collect();
        let offsets: Vec<usize> = set.iter().rev().map(|r| r.a).collect();
        assert_eq!(offsets, vec![9, 5, 1]);
    }

    #[test]
    fn contains_and_clear() {
        let mut set = RegionSet::new();
        set.add(Region::new(3, 9));
        assert!(set.contains(Region::new(4, 6)));
        assert!(set.contains(Region::new(9, 3)));
        assert!(!set.contains(Region::new(8, 12)));

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.get(0), None);
    }
}
