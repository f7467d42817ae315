use generational_arena::{Arena, Index};

#[derive(Debug)]
struct Node<T> {
  value: T,
  next: Option<Index>,
  prev: Option<Index>,
}

/// A doubly-linked list whose nodes live in an arena.
///
/// The head is the most-recently-used (or newest) end, the tail the
/// least-recently-used (or oldest) end. Callers keep the `Index` returned by
/// [`push_front`](Self::push_front) and use it for O(1) reordering and removal.
#[derive(Debug)]
pub(crate) struct RecencyList<T> {
  // Arena stores all nodes contiguously.
  nodes: Arena<Node<T>>,
  head: Option<Index>,
  tail: Option<Index>,
}

impl<T: Copy> RecencyList<T> {
  pub fn new() -> Self {
    Self {
      nodes: Arena::new(),
      head: None,
      tail: None,
    }
  }

  // Detaches a node from its neighbours without freeing it.
  fn unlink(&mut self, index: Index) {
    let (prev, next) = match self.nodes.get(index) {
      Some(node) => (node.prev, node.next),
      None => return,
    };

    if let Some(prev_idx) = prev {
      self.nodes[prev_idx].next = next;
    } else {
      // We are unlinking the head of the list.
      self.head = next;
    }

    if let Some(next_idx) = next {
      self.nodes[next_idx].prev = prev;
    } else {
      // We are unlinking the tail of the list.
      self.tail = prev;
    }
  }

  // Links an already allocated node in as the new head.
  fn link_front(&mut self, index: Index) {
    let old_head = self.head;
    self.nodes[index].next = old_head;
    self.nodes[index].prev = None;
    self.head = Some(index);

    if let Some(old_head) = old_head {
      self.nodes[old_head].prev = Some(index);
    }

    if self.tail.is_none() {
      self.tail = Some(index);
    }
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  /// Inserts `value` at the head and returns its node handle.
  pub fn push_front(&mut self, value: T) -> Index {
    let index = self.nodes.insert(Node {
      value,
      next: None,
      prev: None,
    });
    self.link_front(index);
    index
  }

  pub fn move_to_front(&mut self, index: Index) {
    if self.head != Some(index) && self.nodes.contains(index) {
      self.unlink(index);
      self.link_front(index);
    }
  }

  /// The value at the tail, without removing it.
  pub fn back(&self) -> Option<T> {
    self.tail.map(|index| self.nodes[index].value)
  }

  #[cfg(test)]
  pub fn pop_back(&mut self) -> Option<T> {
    let tail = self.tail?;
    self.remove(tail)
  }

  /// Removes a node, returning its value. Stale handles are ignored.
  pub fn remove(&mut self, index: Index) -> Option<T> {
    if !self.nodes.contains(index) {
      return None;
    }
    self.unlink(index);
    self.nodes.remove(index).map(|node| node.value)
  }

  pub fn clear(&mut self) {
    self.nodes.clear();
    self.head = None;
    self.tail = None;
  }

  /// Walks head to tail and returns `(node, value)` pairs, checking that
  /// every `prev` mirrors the `next` that led to it and that the walk reaches
  /// each node exactly once.
  #[cfg(test)]
  pub(crate) fn linked_nodes(&self) -> Result<Vec<(Index, T)>, String> {
    let mut linked = Vec::with_capacity(self.nodes.len());
    let mut previous = None;
    let mut current = self.head;
    while let Some(index) = current {
      if linked.len() == self.nodes.len() {
        return Err("walk from head is longer than the node count".to_string());
      }
      let node = self
        .nodes
        .get(index)
        .ok_or_else(|| format!("list links freed node {:?}", index))?;
      if node.prev != previous {
        return Err(format!("node {:?} has a stale prev link", index));
      }
      linked.push((index, node.value));
      previous = Some(index);
      current = node.next;
    }
    if self.tail != previous {
      return Err("tail is not the last node reached from head".to_string());
    }
    if linked.len() != self.nodes.len() {
      return Err(format!(
        "{} of {} nodes are reachable from head",
        linked.len(),
        self.nodes.len()
      ));
    }
    Ok(linked)
  }

  /// Values from head to tail.
  #[cfg(test)]
  pub(crate) fn values_as_vec(&self) -> Vec<T> {
    let mut values = Vec::with_capacity(self.nodes.len());
    let mut current = self.head;
    while let Some(index) = current {
      values.push(self.nodes[index].value);
      current = self.nodes[index].next;
    }
    values
  }
}
