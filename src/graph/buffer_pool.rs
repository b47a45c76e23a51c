use std::collections::HashSet;

/// Pre-allocated block buffers shared by every node port in a graph.
///
/// Buffers are handed out by index and returned on node removal, so
/// start/stop/switch cycles do not allocate in the processing path once
/// the pool has grown to its working size.
pub struct AudioBufferPool {
    buffers: Vec<Vec<f32>>,
    available: Vec<usize>,
    in_use: HashSet<usize>,
}

impl AudioBufferPool {
    pub fn new(buffer_size: usize, initial_capacity: usize) -> Self {
        let mut buffers = Vec::with_capacity(initial_capacity);
        let mut available = Vec::with_capacity(initial_capacity);
        for i in 0..initial_capacity {
            buffers.push(vec![0.0; buffer_size]);
            available.push(i);
        }

        Self {
            buffers,
            available,
            in_use: HashSet::with_capacity(initial_capacity),
        }
    }

    pub fn acquire(&mut self, buffer_size: usize) -> usize {
        let index = if let Some(index) = self.available.pop() {
            index
        } else {
            let index = self.buffers.len();
            self.buffers.push(vec![0.0; buffer_size]);
            index
        };
        self.in_use.insert(index);
        index
    }

    /// Returns a buffer to the pool. Releasing an index that is not in use
    /// is a no-op, which keeps node teardown idempotent.
    pub fn release(&mut self, index: usize) {
        if self.in_use.remove(&index) {
            self.available.push(index);
        }
    }

    pub fn copy_out(&self, index: usize) -> &[f32] {
        &self.buffers[index]
    }

    pub fn clear(&mut self, index: usize) {
        self.buffers[index].fill(0.0);
    }

    /// Mutable access to several distinct buffers at once, for a node's
    /// output ports.
    pub fn get_multiple_buffers_mut(&mut self, indices: &[usize]) -> Vec<(usize, &mut [f32])> {
        let mut requested = HashSet::new();
        for &idx in indices {
            assert!(
                idx < self.buffers.len(),
                "buffer index {idx} out of bounds ({} buffers)",
                self.buffers.len()
            );
            assert!(requested.insert(idx), "duplicate buffer index {idx}");
        }

        let mut result = Vec::with_capacity(indices.len());
        let base = self.buffers.as_mut_ptr();
        for &idx in indices {
            // Safety: indices are bounds-checked and pairwise distinct above.
            unsafe {
                let buffer = &mut *base.add(idx);
                result.push((idx, buffer.as_mut_slice()));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_buffers_are_reused() {
        let mut pool = AudioBufferPool::new(64, 2);
        let a = pool.acquire(64);
        let b = pool.acquire(64);
        assert_ne!(a, b);

        pool.release(a);
        let c = pool.acquire(64);
        assert_eq!(a, c);
    }

    #[test]
    fn double_release_is_a_no_op() {
        let mut pool = AudioBufferPool::new(64, 1);
        let a = pool.acquire(64);
        pool.release(a);
        pool.release(a);
        let b = pool.acquire(64);
        let c = pool.acquire(64);
        assert_ne!(b, c);
    }
}
