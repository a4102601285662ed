//! Directed text regions.
//!
//! A [`Region`] is two code-point offsets `a` and `b`. Geometric queries only look at
//! [`Region::begin`] and [`Region::end`]; the order of `a` and `b` records which way a
//! cursor or selection travelled (`b` is the moving end).

use std::{fmt, ops::Range};

/// A possibly reversed, half-open interval of code-point offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub a: usize,
    pub b: usize,
}

impl Region {
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    /// Create an empty region (a caret) at the given offset
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn begin(&self) -> usize {
        self.a.min(self.b)
    }

    pub fn end(&self) -> usize {
        self.a.max(self.b)
    }

    pub fn size(&self) -> usize {
        self.end() - self.begin()
    }

    pub fn is_empty(&self) -> bool {
        self.a == self.b
    }

    /// Whether `b` comes before `a`.
    pub fn is_reversed(&self) -> bool {
        self.b < self.a
    }

    /// Check if `point` lies within the region. Both ends are inclusive, so a caret
    /// contains its own offset.
    pub fn contains(&self, point: usize) -> bool {
        self.begin() <= point && point <= self.end()
    }

    /// Check if `other` lies entirely within this region
    pub fn covers(&self, other: Region) -> bool {
        self.contains(other.begin()) && self.contains(other.end())
    }

    /// The overlapping part of the two regions, or the empty default region when they
    /// only touch or do not meet at all.
    pub fn intersection(&self, other: Region) -> Region {
        if self.contains(other.begin()) || other.contains(self.begin()) {
            let overlap = Region::new(
                self.begin().max(other.begin()),
                self.end().min(other.end()),
            );
            if overlap.size() != 0 {
                return overlap;
            }
        }
        Region::default()
    }

    /// Check if the regions are equal or share at least one code point
    pub fn intersects(&self, other: Region) -> bool {
        *self == other || self.intersection(other).size() > 0
    }

    /// The smallest region spanning both regions, keeping this region's direction.
    pub fn cover(&self, other: Region) -> Region {
        let begin = self.begin().min(other.begin());
        let end = self.end().max(other.end());
        if self.is_reversed() {
            Region::new(end, begin)
        } else {
            Region::new(begin, end)
        }
    }

    /// Remove the part of this region that `other` overlaps at one of its edges.
    ///
    /// The region is returned unchanged when `other` covers it entirely or lies strictly
    /// inside it, since neither case leaves a single contiguous remainder.
    pub fn clip(&self, other: Region) -> Region {
        if other.covers(*self) || self.intersection(other).is_empty() {
            return *self;
        }
        let (begin, end) = (self.begin(), self.end());
        let clipped = if other.begin() <= begin {
            Region::new(other.end(), end)
        } else if other.end() >= end {
            Region::new(begin, other.begin())
        } else {
            return *self;
        };
        if self.is_reversed() {
            Region::new(clipped.b, clipped.a)
        } else {
            clipped
        }
    }

    /// Split this region into the parts not covered by `other`.
    ///
    /// Returns zero, one or two regions in ascending order.
    pub fn cut(&self, other: Region) -> Vec<Region> {
        let mut parts = Vec::with_capacity(2);
        if self.contains(other.begin()) && other.begin() != self.begin() {
            parts.push(Region::new(self.begin(), other.begin()));
        }
        if self.contains(other.end()) && other.end() != self.end() {
            parts.push(Region::new(other.end(), self.end()));
        }
        if parts.is_empty() && !other.covers(*self) {
            parts.push(*self);
        }
        parts
    }

    /// Shift the region after an edit of `delta` code points at `position`.
    ///
    /// Offsets at or after `position` move by `delta`. Offsets before it only move when a
    /// deletion swallowed them, in which case they land on `position + delta`.
    pub fn adjust(&mut self, position: usize, delta: isize) {
        self.a = adjust_offset(self.a, position, delta);
        self.b = adjust_offset(self.b, position, delta);
    }

    pub fn to_range(&self) -> Range<usize> {
        self.begin()..self.end()
    }
}

fn adjust_offset(offset: usize, position: usize, delta: isize) -> usize {
    if offset >= position {
        offset.saturating_add_signed(delta)
    } else {
        offset.min(position.saturating_add_signed(delta))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

impl From<Range<usize>> for Region {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<Region> for Range<usize> {
    fn from(region: Region) -> Self {
        region.to_range()
    }
}
