use thiserror::Error;

/// Anything the heap can order by frequency.
pub trait Weighted {
    fn weight(&self) -> u64;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapErr {
    #[error("heap capacity of {capacity} exceeded")]
    HeapCapacityExceeded { capacity: usize },
    #[error("pop from an empty heap")]
    HeapUnderflow,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    item: T,
    seq: u64,
}

impl<T: Weighted> Slot<T> {
    fn key(&self) -> (u64, u64) {
        (self.item.weight(), self.seq)
    }
}

/// Fixed-capacity binary min-heap keyed by weight.
///
/// Items of equal weight come out in the order they were pushed.
#[derive(Debug, Clone)]
pub struct MinHeap<T> {
    elements: Vec<Slot<T>>,
    capacity: usize,
    next_seq: u64,
}

impl<T> MinHeap<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        MinHeap {
            elements: Vec::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    pub fn heap_size(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn parent(i: usize) -> usize {
        (i - 1) / 2
    }

    fn left(i: usize) -> usize {
        2 * i + 1
    }

    fn right(i: usize) -> usize {
        2 * i + 2
    }

    /// Current items in heap order (not sorted).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter().map(|slot| &slot.item)
    }
}

impl<T: Weighted> MinHeap<T> {
    pub fn push(&mut self, value: T) -> Result<(), HeapErr> {
        if self.elements.len() >= self.capacity {
            return Err(HeapErr::HeapCapacityExceeded {
                capacity: self.capacity,
            });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.elements.push(Slot { item: value, seq });
        self.sift_up(self.elements.len() - 1);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<T, HeapErr> {
        if self.elements.is_empty() {
            return Err(HeapErr::HeapUnderflow);
        }
        let result = self.elements.swap_remove(0);
        if !self.elements.is_empty() {
            self.sift_down(0);
        }
        Ok(result.item)
    }

    pub fn peek(&self) -> Option<&T> {
        self.elements.first().map(|slot| &slot.item)
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let p = Self::parent(i);
            if self.elements[p].key() <= self.elements[i].key() {
                break;
            }
            self.elements.swap(p, i);
            i = p;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.elements.len();
        loop {
            let l = Self::left(i);
            let r = Self::right(i);
            let mut smallest = i;

            if l < n && self.elements[l].key() < self.elements[smallest].key() {
                smallest = l;
            }
            if r < n && self.elements[r].key() < self.elements[smallest].key() {
                smallest = r;
            }
            if smallest == i {
                break;
            }
            self.elements.swap(i, smallest);
            i = smallest;
        }
    }

    #[cfg(test)]
    fn valid_min_heap(&self) -> bool {
        (1..self.elements.len())
            .all(|i| self.elements[Self::parent(i)].key() <= self.elements[i].key())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(u64, &'static str);

    impl Weighted for Item {
        fn weight(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn test_pop_order() {
        let mut heap = MinHeap::with_capacity(8);
        for w in [5, 3, 8, 1, 9, 2] {
            heap.push(Item(w, "")).unwrap();
            assert!(heap.valid_min_heap());
        }
        let mut out = Vec::new();
        while let Ok(item) = heap.pop() {
            assert!(heap.valid_min_heap());
            out.push(item.0);
        }
        assert_eq!(out, vec![1, 2, 3, 5, 8, 9]);
    }

    #[test]
    fn test_equal_weights_are_fifo() {
        let mut heap = MinHeap::with_capacity(4);
        heap.push(Item(2, "a")).unwrap();
        heap.push(Item(2, "b")).unwrap();
        heap.push(Item(1, "c")).unwrap();
        heap.push(Item(2, "d")).unwrap();
        let names: Vec<_> = std::iter::from_fn(|| heap.pop().ok()).map(|i| i.1).collect();
        assert_eq!(names, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut heap = MinHeap::with_capacity(1);
        heap.push(Item(1, "")).unwrap();
        assert_eq!(
            heap.push(Item(2, "")),
            Err(HeapErr::HeapCapacityExceeded { capacity: 1 })
        );
        assert_eq!(heap.heap_size(), 1);
    }

    #[test]
    fn test_underflow() {
        let mut heap: MinHeap<Item> = MinHeap::with_capacity(2);
        assert_eq!(heap.pop(), Err(HeapErr::HeapUnderflow));
        assert!(heap.peek().is_none());
    }
}
