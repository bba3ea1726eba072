//! Deterministic round-robin split of an input batch into shards

use shared::{InputFile, Shard, Task};

/// Splits input files across at most `max_shards` shards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPartitioner {
    max_shards: usize,
}

impl WorkPartitioner {
    /// A zero `max_shards` is treated as one
    pub fn new(max_shards: usize) -> Self {
        Self {
            max_shards: max_shards.max(1),
        }
    }

    /// Number of shards used for `file_count` files
    pub fn shard_count(&self, file_count: usize) -> usize {
        self.max_shards.min(file_count)
    }

    /// File `i` goes to shard `i mod shard_count`, keeping input order inside each shard
    pub fn partition(&self, files: Vec<InputFile>) -> Vec<Shard> {
        let shard_count = self.shard_count(files.len());
        let mut shards: Vec<Shard> = (0..shard_count).map(Shard::new).collect();

        for (index, file) in files.into_iter().enumerate() {
            let shard = index % shard_count;
            shards[shard].tasks.push(Task { index, shard, file });
        }

        shards
    }
}
