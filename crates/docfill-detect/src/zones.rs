//! Zone restriction for detectors.
//!
//! Legal contracts carry their fill-in fields in the header (parties) and in
//! the signature block. The long body in between is narrative text where a
//! stray dot run usually belongs to a sentence, not to a form. A body line is
//! only considered when it sits in a cluster of blank lines, i.e. when a
//! neighbouring line also carries a blank marker.

use docfill_core::ZoneConfig;

use crate::markers::has_marker;

/// Per-line zone lookup for one document.
pub struct ZoneMap {
    markers: Vec<bool>,
    config: ZoneConfig,
}

impl ZoneMap {
    pub fn new<S: AsRef<str>>(lines: &[S], config: ZoneConfig) -> Self {
        Self {
            markers: lines.iter().map(|l| has_marker(l.as_ref())).collect(),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn has_marker(&self, index: usize) -> bool {
        self.markers.get(index).copied().unwrap_or(false)
    }

    /// Header or signature zone.
    pub fn in_fixed_zone(&self, index: usize) -> bool {
        let n = self.markers.len();
        index < self.config.header_lines || index >= n.saturating_sub(self.config.signature_lines)
    }

    /// The line directly above or below carries a blank marker.
    pub fn neighbour_has_marker(&self, index: usize) -> bool {
        (index > 0 && self.has_marker(index - 1)) || self.has_marker(index + 1)
    }

    /// Whether the blank detector may inspect this line.
    pub fn blank_eligible(&self, index: usize) -> bool {
        self.has_marker(index) && (self.in_fixed_zone(index) || self.neighbour_has_marker(index))
    }

    /// Whether the pattern detector may inspect this line: any line with its
    /// own marker, plus "label:\n......" layouts where only a neighbour has one.
    pub fn pattern_eligible(&self, index: usize) -> bool {
        index < self.markers.len()
            && (self.in_fixed_zone(index) || self.has_marker(index) || self.neighbour_has_marker(index))
    }
}
