//! Arena-backed red-black tree ordered by position.
//!
//! Lines are stored in an arena and addressed by a stable [`LineId`]. The
//! red-black links live next to the value but are never exposed; every node
//! also carries its subtree size, so "the n-th line" and "which line number
//! is this" are both O(log n) and line numbers never need rewriting when a
//! line is inserted or removed.

use std::fmt;

/// Stable handle to a line. Survives insertions and deletions of other lines.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(u32);

impl LineId {
    const fn index(self) -> usize {
        self.0 as usize
    }

    /// Handle that never names a live line; replaced before first use.
    pub(crate) const fn placeholder() -> Self {
        Self(u32::MAX)
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineId({})", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeColor {
    Red,
    Black,
}

#[derive(Clone, Debug)]
struct Node<T> {
    value: Option<T>,
    left: Option<LineId>,
    right: Option<LineId>,
    parent: Option<LineId>,
    color: NodeColor,
    size: usize,
}

/// Position-ordered red-black tree.
#[derive(Clone, Debug)]
pub struct LineTree<T> {
    nodes: Vec<Node<T>>,
    free: Vec<LineId>,
    root: Option<LineId>,
}

impl<T> Default for LineTree<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }
}

impl<T> LineTree<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size(self.root)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
    }

    /// Whether `id` names a live node.
    #[must_use]
    pub fn contains(&self, id: LineId) -> bool {
        self.nodes
            .get(id.index())
            .is_some_and(|node| node.value.is_some())
    }

    #[must_use]
    pub fn get(&self, id: LineId) -> Option<&T> {
        self.nodes.get(id.index()).and_then(|n| n.value.as_ref())
    }

    pub fn get_mut(&mut self, id: LineId) -> Option<&mut T> {
        self.nodes.get_mut(id.index()).and_then(|n| n.value.as_mut())
    }

    /// Node at 0-based position `index`.
    #[must_use]
    pub fn nth(&self, mut index: usize) -> Option<LineId> {
        let mut cur = self.root;
        while let Some(id) = cur {
            let left = self.size(self.node(id).left);
            match index.cmp(&left) {
                std::cmp::Ordering::Less => cur = self.node(id).left,
                std::cmp::Ordering::Equal => return Some(id),
                std::cmp::Ordering::Greater => {
                    index -= left + 1;
                    cur = self.node(id).right;
                }
            }
        }
        None
    }

    /// 0-based position of `id`.
    #[must_use]
    pub fn rank(&self, id: LineId) -> usize {
        let mut rank = self.size(self.node(id).left);
        let mut cur = id;
        while let Some(parent) = self.node(cur).parent {
            if self.node(parent).right == Some(cur) {
                rank += self.size(self.node(parent).left) + 1;
            }
            cur = parent;
        }
        rank
    }

    #[must_use]
    pub fn first(&self) -> Option<LineId> {
        self.root.map(|r| self.minimum(r))
    }

    #[must_use]
    pub fn last(&self) -> Option<LineId> {
        let mut cur = self.root?;
        while let Some(right) = self.node(cur).right {
            cur = right;
        }
        Some(cur)
    }

    /// In-order successor.
    #[must_use]
    pub fn next(&self, id: LineId) -> Option<LineId> {
        if let Some(right) = self.node(id).right {
            return Some(self.minimum(right));
        }
        let mut cur = id;
        let mut parent = self.node(cur).parent;
        while let Some(p) = parent {
            if self.node(p).left == Some(cur) {
                return Some(p);
            }
            cur = p;
            parent = self.node(p).parent;
        }
        None
    }

    /// In-order predecessor.
    #[must_use]
    pub fn prev(&self, id: LineId) -> Option<LineId> {
        if let Some(mut cur) = self.node(id).left {
            while let Some(right) = self.node(cur).right {
                cur = right;
            }
            return Some(cur);
        }
        let mut cur = id;
        let mut parent = self.node(cur).parent;
        while let Some(p) = parent {
            if self.node(p).right == Some(cur) {
                return Some(p);
            }
            cur = p;
            parent = self.node(p).parent;
        }
        None
    }

    /// Iterate handles in order.
    pub fn ids(&self) -> impl Iterator<Item = LineId> + '_ {
        std::iter::successors(self.first(), move |&id| self.next(id))
    }

    /// Insert `value` so that it ends up at 0-based position `index`
    /// (clamped to `len()`).
    pub fn insert_at(&mut self, index: usize, value: T) -> LineId {
        let index = index.min(self.len());
        let id = self.alloc(value);

        match self.root {
            None => {
                self.root = Some(id);
            }
            Some(_) => {
                let (parent, as_left) = match self.nth(index) {
                    Some(at) => match self.node(at).left {
                        None => (at, true),
                        Some(left) => {
                            let mut cur = left;
                            while let Some(right) = self.node(cur).right {
                                cur = right;
                            }
                            (cur, false)
                        }
                    },
                    None => match self.last() {
                        Some(last) => (last, false),
                        None => unreachable!("non-empty tree has a last node"),
                    },
                };
                self.node_mut(id).parent = Some(parent);
                if as_left {
                    self.node_mut(parent).left = Some(id);
                } else {
                    self.node_mut(parent).right = Some(id);
                }
                let mut cur = Some(parent);
                while let Some(n) = cur {
                    self.node_mut(n).size += 1;
                    cur = self.node(n).parent;
                }
            }
        }

        self.insert_fixup(id);
        id
    }

    /// Unlink `id` and return its value.
    pub fn remove(&mut self, z: LineId) -> Option<T> {
        if !self.contains(z) {
            return None;
        }

        let mut removed_color = self.node(z).color;
        let x;
        let x_parent;

        match (self.node(z).left, self.node(z).right) {
            (None, right) => {
                x = right;
                x_parent = self.node(z).parent;
                self.transplant(z, right);
            }
            (left, None) => {
                x = left;
                x_parent = self.node(z).parent;
                self.transplant(z, left);
            }
            (Some(left), Some(right)) => {
                let y = self.minimum(right);
                removed_color = self.node(y).color;
                x = self.node(y).right;
                if self.node(y).parent == Some(z) {
                    x_parent = Some(y);
                } else {
                    x_parent = self.node(y).parent;
                    self.transplant(y, x);
                    self.node_mut(y).right = Some(right);
                    self.node_mut(right).parent = Some(y);
                }
                self.transplant(z, Some(y));
                self.node_mut(y).left = Some(left);
                self.node_mut(left).parent = Some(y);
                self.node_mut(y).color = self.node(z).color;
                self.node_mut(y).size = self.node(z).size;
            }
        }

        let mut cur = x_parent;
        while let Some(n) = cur {
            self.node_mut(n).size -= 1;
            cur = self.node(n).parent;
        }

        if removed_color == NodeColor::Black {
            self.delete_fixup(x, x_parent);
        }

        let node = self.node_mut(z);
        node.left = None;
        node.right = None;
        node.parent = None;
        node.size = 0;
        let value = node.value.take();
        self.free.push(z);
        value
    }

    /// Check red-black and size invariants; returns a description of the
    /// first violation found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(root) = self.root {
            if self.node(root).color != NodeColor::Black {
                return Err("root is red".into());
            }
            if self.node(root).parent.is_some() {
                return Err("root has a parent".into());
            }
        }
        self.validate_subtree(self.root).map(|_| ())
    }

    fn validate_subtree(&self, id: Option<LineId>) -> std::result::Result<usize, String> {
        let Some(id) = id else {
            return Ok(1);
        };
        let node = self.node(id);
        if node.value.is_none() {
            return Err(format!("{id:?} is linked but freed"));
        }
        for child in [node.left, node.right].into_iter().flatten() {
            if self.node(child).parent != Some(id) {
                return Err(format!("{child:?} has wrong parent"));
            }
            if node.color == NodeColor::Red && self.node(child).color == NodeColor::Red {
                return Err(format!("red {id:?} has red child"));
            }
        }
        if node.size != self.size(node.left) + self.size(node.right) + 1 {
            return Err(format!("{id:?} has stale subtree size"));
        }
        let left = self.validate_subtree(node.left)?;
        let right = self.validate_subtree(node.right)?;
        if left != right {
            return Err(format!("black height mismatch under {id:?}"));
        }
        Ok(left + usize::from(node.color == NodeColor::Black))
    }

    fn alloc(&mut self, value: T) -> LineId {
        let node = Node {
            value: Some(value),
            left: None,
            right: None,
            parent: None,
            color: NodeColor::Red,
            size: 1,
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            id
        } else {
            let id = LineId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
            self.nodes.push(node);
            id
        }
    }

    fn node(&self, id: LineId) -> &Node<T> {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: LineId) -> &mut Node<T> {
        &mut self.nodes[id.index()]
    }

    fn size(&self, id: Option<LineId>) -> usize {
        id.map_or(0, |id| self.node(id).size)
    }

    fn color(&self, id: Option<LineId>) -> NodeColor {
        id.map_or(NodeColor::Black, |id| self.node(id).color)
    }

    fn set_color(&mut self, id: Option<LineId>, color: NodeColor) {
        if let Some(id) = id {
            self.node_mut(id).color = color;
        }
    }

    fn minimum(&self, mut id: LineId) -> LineId {
        while let Some(left) = self.node(id).left {
            id = left;
        }
        id
    }

    fn transplant(&mut self, u: LineId, v: Option<LineId>) {
        let parent = self.node(u).parent;
        match parent {
            None => self.root = v,
            Some(p) => {
                if self.node(p).left == Some(u) {
                    self.node_mut(p).left = v;
                } else {
                    self.node_mut(p).right = v;
                }
            }
        }
        if let Some(v) = v {
            self.node_mut(v).parent = parent;
        }
    }

    fn rotate_left(&mut self, x: LineId) {
        let Some(y) = self.node(x).right else {
            return;
        };
        let y_left = self.node(y).left;
        self.node_mut(x).right = y_left;
        if let Some(b) = y_left {
            self.node_mut(b).parent = Some(x);
        }
        self.transplant(x, Some(y));
        self.node_mut(y).left = Some(x);
        self.node_mut(x).parent = Some(y);
        self.node_mut(y).size = self.node(x).size;
        self.node_mut(x).size = self.size(self.node(x).left) + self.size(self.node(x).right) + 1;
    }

    fn rotate_right(&mut self, x: LineId) {
        let Some(y) = self.node(x).left else {
            return;
        };
        let y_right = self.node(y).right;
        self.node_mut(x).left = y_right;
        if let Some(b) = y_right {
            self.node_mut(b).parent = Some(x);
        }
        self.transplant(x, Some(y));
        self.node_mut(y).right = Some(x);
        self.node_mut(x).parent = Some(y);
        self.node_mut(y).size = self.node(x).size;
        self.node_mut(x).size = self.size(self.node(x).left) + self.size(self.node(x).right) + 1;
    }

    fn insert_fixup(&mut self, mut z: LineId) {
        while let Some(p) = self.node(z).parent {
            if self.node(p).color != NodeColor::Red {
                break;
            }
            // A red node is never the root, so the grandparent exists.
            let Some(g) = self.node(p).parent else {
                break;
            };
            if self.node(g).left == Some(p) {
                let uncle = self.node(g).right;
                if self.color(uncle) == NodeColor::Red {
                    self.set_color(Some(p), NodeColor::Black);
                    self.set_color(uncle, NodeColor::Black);
                    self.set_color(Some(g), NodeColor::Red);
                    z = g;
                } else {
                    let mut p = p;
                    if self.node(p).right == Some(z) {
                        z = p;
                        self.rotate_left(z);
                        p = self.node(z).parent.unwrap_or(g);
                    }
                    self.set_color(Some(p), NodeColor::Black);
                    self.set_color(Some(g), NodeColor::Red);
                    self.rotate_right(g);
                }
            } else {
                let uncle = self.node(g).left;
                if self.color(uncle) == NodeColor::Red {
                    self.set_color(Some(p), NodeColor::Black);
                    self.set_color(uncle, NodeColor::Black);
                    self.set_color(Some(g), NodeColor::Red);
                    z = g;
                } else {
                    let mut p = p;
                    if self.node(p).left == Some(z) {
                        z = p;
                        self.rotate_right(z);
                        p = self.node(z).parent.unwrap_or(g);
                    }
                    self.set_color(Some(p), NodeColor::Black);
                    self.set_color(Some(g), NodeColor::Red);
                    self.rotate_left(g);
                }
            }
        }
        self.set_color(self.root, NodeColor::Black);
    }

    fn delete_fixup(&mut self, mut x: Option<LineId>, mut x_parent: Option<LineId>) {
        while x != self.root && self.color(x) == NodeColor::Black {
            let Some(p) = x_parent else {
                break;
            };
            if self.node(p).left == x {
                let Some(mut w) = self.node(p).right else {
                    break;
                };
                if self.node(w).color == NodeColor::Red {
                    self.set_color(Some(w), NodeColor::Black);
                    self.set_color(Some(p), NodeColor::Red);
                    self.rotate_left(p);
                    let Some(sibling) = self.node(p).right else {
                        break;
                    };
                    w = sibling;
                }
                if self.color(self.node(w).left) == NodeColor::Black
                    && self.color(self.node(w).right) == NodeColor::Black
                {
                    self.set_color(Some(w), NodeColor::Red);
                    x = Some(p);
                    x_parent = self.node(p).parent;
                } else {
                    if self.color(self.node(w).right) == NodeColor::Black {
                        self.set_color(self.node(w).left, NodeColor::Black);
                        self.set_color(Some(w), NodeColor::Red);
                        self.rotate_right(w);
                        let Some(sibling) = self.node(p).right else {
                            break;
                        };
                        w = sibling;
                    }
                    self.set_color(Some(w), self.node(p).color);
                    self.set_color(Some(p), NodeColor::Black);
                    self.set_color(self.node(w).right, NodeColor::Black);
                    self.rotate_left(p);
                    x = self.root;
                    x_parent = None;
                }
            } else {
                let Some(mut w) = self.node(p).left else {
                    break;
                };
                if self.node(w).color == NodeColor::Red {
                    self.set_color(Some(w), NodeColor::Black);
                    self.set_color(Some(p), NodeColor::Red);
                    self.rotate_right(p);
                    let Some(sibling) = self.node(p).left else {
                        break;
                    };
                    w = sibling;
                }
                if self.color(self.node(w).left) == NodeColor::Black
                    && self.color(self.node(w).right) == NodeColor::Black
                {
                    self.set_color(Some(w), NodeColor::Red);
                    x = Some(p);
                    x_parent = self.node(p).parent;
                } else {
                    if self.color(self.node(w).left) == NodeColor::Black {
                        self.set_color(self.node(w).right, NodeColor::Black);
                        self.set_color(Some(w), NodeColor::Red);
                        self.rotate_left(w);
                        let Some(sibling) = self.node(p).left else {
                            break;
                        };
                        w = sibling;
                    }
                    self.set_color(Some(w), self.node(p).color);
                    self.set_color(Some(p), NodeColor::Black);
                    self.set_color(self.node(w).left, NodeColor::Black);
                    self.rotate_right(p);
                    x = self.root;
                    x_parent = None;
                }
            }
        }
        self.set_color(x, NodeColor::Black);
    }
}
