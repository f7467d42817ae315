/// The owner of the items a [`PriorityQueue`] orders.
///
/// The queue only stores handles. It asks the owner to compare them and
/// reports every position change back, so the owner can find an item's slot
/// in O(1) for later [`fix`](PriorityQueue::fix) or
/// [`remove`](PriorityQueue::remove) calls.
pub(crate) trait HeapSlots {
  type Slot: Copy;

  /// Strict weak ordering; the smallest item sits at the root.
  fn less(&self, a: Self::Slot, b: Self::Slot) -> bool;

  fn set_position(&mut self, slot: Self::Slot, position: usize);
}

/// An indexed binary min-heap supporting removal and re-keying at arbitrary
/// positions in O(log n).
#[derive(Debug)]
pub(crate) struct PriorityQueue<T> {
  items: Vec<T>,
}

impl<T: Copy> PriorityQueue<T> {
  pub fn new() -> Self {
    Self { items: Vec::new() }
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn peek(&self) -> Option<T> {
    self.items.first().copied()
  }

  pub fn push<S: HeapSlots<Slot = T>>(&mut self, slot: T, slots: &mut S) {
    let position = self.items.len();
    self.items.push(slot);
    slots.set_position(slot, position);
    self.sift_up(position, slots);
  }

  #[cfg(test)]
  pub fn pop<S: HeapSlots<Slot = T>>(&mut self, slots: &mut S) -> Option<T> {
    if self.items.is_empty() {
      None
    } else {
      Some(self.remove(0, slots))
    }
  }

  /// Restores heap order after the item at `position` changed its key.
  pub fn fix<S: HeapSlots<Slot = T>>(&mut self, position: usize, slots: &mut S) {
    if position >= self.items.len() {
      return;
    }
    if !self.sift_down(position, slots) {
      self.sift_up(position, slots);
    }
  }

  /// Removes and returns the item at `position`.
  ///
  /// # Panics
  ///
  /// Panics if `position` is out of bounds.
  pub fn remove<S: HeapSlots<Slot = T>>(&mut self, position: usize, slots: &mut S) -> T {
    let last = self.items.len() - 1;
    if position != last {
      self.swap(position, last, slots);
    }
    let removed = self.items.swap_remove(last);
    if position != last && !self.sift_down(position, slots) {
      self.sift_up(position, slots);
    }
    removed
  }

  pub fn clear(&mut self) {
    self.items.clear();
  }

  fn swap<S: HeapSlots<Slot = T>>(&mut self, i: usize, j: usize, slots: &mut S) {
    self.items.swap(i, j);
    slots.set_position(self.items[i], i);
    slots.set_position(self.items[j], j);
  }

  fn sift_up<S: HeapSlots<Slot = T>>(&mut self, mut position: usize, slots: &mut S) {
    while position > 0 {
      let parent = (position - 1) / 2;
      if !slots.less(self.items[position], self.items[parent]) {
        break;
      }
      self.swap(position, parent, slots);
      position = parent;
    }
  }

  // Returns whether the item moved.
  fn sift_down<S: HeapSlots<Slot = T>>(&mut self, start: usize, slots: &mut S) -> bool {
    let len = self.items.len();
    let mut position = start;
    loop {
      let left = 2 * position + 1;
      if left >= len {
        break;
      }
      let mut child = left;
      let right = left + 1;
      if right < len && slots.less(self.items[right], self.items[left]) {
        child = right;
      }
      if !slots.less(self.items[child], self.items[position]) {
        break;
      }
      self.swap(position, child, slots);
      position = child;
    }
    position > start
  }

  /// Checks the heap property for every parent/child pair.
  #[cfg(test)]
  pub(crate) fn is_heap<S: HeapSlots<Slot = T>>(&self, slots: &S) -> bool {
    (1..self.items.len()).all(|i| !slots.less(self.items[i], self.items[(i - 1) / 2]))
  }

  #[cfg(test)]
  pub(crate) fn items(&self) -> &[T] {
    &self.items
  }
}
