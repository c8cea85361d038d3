use super::{BlockId, Document};

/// Walks content blocks in document order, skipping containers.
///
/// Containers without any content descendants are passed over entirely.
#[derive(Clone, Copy)]
pub struct BlockTreeWalker<'a> {
    doc: &'a Document,
}

impl<'a> BlockTreeWalker<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    /// The content block following `block`, or `None` after the last one.
    pub fn next_non_container(&self, block: BlockId) -> Option<BlockId> {
        let mut current = block;
        loop {
            let parent = self.doc.parent(current)?;
            let index = self.doc.index_in_parent(current)?;
            let found = self.doc.children(parent)[index + 1..]
                .iter()
                .find_map(|&sibling| self.first_leaf(sibling));
            if found.is_some() {
                return found;
            }
            current = parent;
        }
    }

    /// The content block preceding `block`, or `None` before the first one.
    pub fn previous_non_container(&self, block: BlockId) -> Option<BlockId> {
        let mut current = block;
        loop {
            let parent = self.doc.parent(current)?;
            let index = self.doc.index_in_parent(current)?;
            let found = self.doc.children(parent)[..index]
                .iter()
                .rev()
                .find_map(|&sibling| self.last_leaf(sibling));
            if found.is_some() {
                return found;
            }
            current = parent;
        }
    }

    /// `block` itself when it holds content, otherwise its first content descendant.
    pub fn first_leaf(&self, block: BlockId) -> Option<BlockId> {
        let node = self.doc.block(block)?;
        if !node.is_container() {
            return Some(block);
        }
        node.children()
            .iter()
            .find_map(|&child| self.first_leaf(child))
    }

    pub fn last_leaf(&self, block: BlockId) -> Option<BlockId> {
        let node = self.doc.block(block)?;
        if !node.is_container() {
            return Some(block);
        }
        node.children()
            .iter()
            .rev()
            .find_map(|&child| self.last_leaf(child))
    }

    pub fn first(&self) -> Option<BlockId> {
        self.first_leaf(self.doc.root())
    }

    pub fn last(&self) -> Option<BlockId> {
        self.last_leaf(self.doc.root())
    }

    /// Iterates content blocks from `start` onwards (inclusive).
    pub fn iter_from(self, start: BlockId) -> impl Iterator<Item = BlockId> + 'a {
        std::iter::successors(self.first_leaf(start), move |&id| self.next_non_container(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockContent, BlockKind};
    use crate::tests::{leaf_named, nested_fixture};

    fn names(doc: &Document, ids: impl IntoIterator<Item = BlockId>) -> String {
        ids.into_iter()
            .filter_map(|id| doc.text(id))
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn forward_walk_visits_leaves_in_order() {
        let doc = nested_fixture();
        let walker = BlockTreeWalker::new(&doc);
        let first = walker.first().unwrap();
        insta::assert_snapshot!(names(&doc, walker.iter_from(first)), @"a11,a12,a13,b111,b12,c");
    }

    #[test]
    fn walk_ends_are_none() {
        let doc = nested_fixture();
        let walker = BlockTreeWalker::new(&doc);
        assert_eq!(walker.next_non_container(leaf_named(&doc, "c")), None);
        assert_eq!(walker.previous_non_container(leaf_named(&doc, "a11")), None);
        assert_eq!(walker.next_non_container(doc.root()), None);
    }

    #[test]
    fn backward_walk_reverses_forward_walk() {
        let doc = nested_fixture();
        let walker = BlockTreeWalker::new(&doc);
        let forward: Vec<_> = walker.iter_from(walker.first().unwrap()).collect();
        let backward: Vec<_> = std::iter::successors(walker.last(), |&id| {
            walker.previous_non_container(id)
        })
        .collect();
        let mut reversed = backward.clone();
        reversed.reverse();
        assert_eq!(forward, reversed);
        assert_eq!(forward, doc.leaves());
    }

    #[test]
    fn empty_containers_are_skipped() {
        let mut doc = nested_fixture();
        let root = doc.root();
        // An empty container can only be forced in through the raw node API.
        doc.insert_node(root, 1, BlockKind::List, BlockContent::Children(Vec::new()))
            .unwrap();
        let walker = BlockTreeWalker::new(&doc);
        assert_eq!(
            walker.next_non_container(leaf_named(&doc, "a13")),
            Some(leaf_named(&doc, "b111"))
        );
        assert_eq!(
            walker.previous_non_container(leaf_named(&doc, "b111")),
            Some(leaf_named(&doc, "a13"))
        );
    }
}
