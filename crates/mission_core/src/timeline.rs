use std::collections::VecDeque;

use crate::{MissionTick, TimelinePage};

/// Capped, append-only mission log. The oldest entries are evicted first.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<MissionTick>,
    capacity: usize,
    evicted: u64,
    next_sequence: u64,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(256)),
            capacity: capacity.max(1),
            evicted: 0,
            next_sequence: 1,
        }
    }

    /// Sequence number the next appended entry must carry.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn push(&mut self, tick: MissionTick) {
        debug_assert_eq!(tick.sequence, self.next_sequence);
        self.next_sequence = tick.sequence + 1;
        self.entries.push_back(tick);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn last(&self) -> Option<&MissionTick> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MissionTick> {
        self.entries.iter()
    }

    /// One-based page over the log as it stands now. Zero page or size fall
    /// back to page 1 and `default_size`.
    pub fn page(&self, page: u32, page_size: u32, default_size: u32) -> TimelinePage {
        let page = page.max(1);
        let page_size = if page_size == 0 { default_size } else { page_size };
        let skip = (page as usize - 1).saturating_mul(page_size as usize);
        TimelinePage {
            page,
            page_size,
            total_count: self.entries.len(),
            evicted: self.evicted,
            items: self
                .entries
                .iter()
                .skip(skip)
                .take(page_size as usize)
                .cloned()
                .collect(),
        }
    }
}
