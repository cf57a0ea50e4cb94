/// High-water mark of processed post ids. Never moves backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedCursor {
    last_seen_id: u64,
}

impl FeedCursor {
    pub fn new(last_seen_id: u64) -> Self {
        Self { last_seen_id }
    }

    /// Move to `id` if it is newer. Returns true if the cursor moved.
    pub fn advance(&mut self, id: u64) -> bool {
        if id <= self.last_seen_id {
            return false;
        }
        self.last_seen_id = id;
        true
    }

    pub fn value(&self) -> u64 {
        self.last_seen_id
    }
}
