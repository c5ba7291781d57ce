//! Chunk tree parser.

use std::sync::Arc;

use hitrun_common::ByteCursor;
use zerocopy::IntoBytes;

use crate::{ChunkHeader, ChunkType, Error, Result};

/// Nesting limit; each level costs a stack frame while parsing.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy)]
struct ChunkNode {
    chunk_type: ChunkType,
    offset: usize,
    payload_size: u32,
    total_size: u32,
    parent: Option<usize>,
    first_child: usize,
    child_count: usize,
}

/// A parsed Pure3D container.
///
/// Nodes live in a flat arena in pre-order; children are referenced through
/// an index table. The source buffer is kept alive so payloads are borrowed
/// rather than copied.
#[derive(Debug, Clone)]
pub struct ChunkTree {
    data: Arc<[u8]>,
    nodes: Vec<ChunkNode>,
    child_indices: Vec<usize>,
}

impl ChunkTree {
    /// Check if data starts with the Pure3D root signature.
    pub fn is_p3d(data: &[u8]) -> bool {
        data.len() >= 4 && data[..4] == ChunkType::ROOT.0.to_le_bytes()
    }

    /// Parse a container.
    ///
    /// Fails with [`Error::UnsupportedFormat`] if the root is not a Pure3D
    /// signature chunk, and with [`Error::MalformedChunk`] on any size
    /// inconsistency. No partial tree is returned.
    pub fn parse(data: impl Into<Arc<[u8]>>) -> Result<Self> {
        let data: Arc<[u8]> = data.into();
        let mut cursor = ByteCursor::new(&data);

        let signature = cursor.peek_u32().map_err(|_| Error::MalformedChunk {
            offset: 0,
            reason: format!("truncated chunk header ({} bytes)", data.len()),
        })?;
        if signature != ChunkType::ROOT.0 {
            return Err(Error::UnsupportedFormat { signature });
        }

        let mut parser = Parser::default();
        parser.parse_chunk(&mut cursor, None, data.len(), 0)?;
        let consumed = cursor.position();

        let Parser {
            nodes,
            child_indices,
        } = parser;

        if consumed < data.len() {
            tracing::warn!(
                trailing = data.len() - consumed,
                "trailing bytes after root chunk"
            );
        }
        tracing::debug!(chunks = nodes.len(), bytes = consumed, "parsed chunk tree");

        Ok(Self {
            data,
            nodes,
            child_indices,
        })
    }

    /// The root chunk.
    pub fn root(&self) -> ChunkRef<'_> {
        ChunkRef {
            tree: self,
            index: 0,
        }
    }

    /// Get a chunk by arena index.
    pub fn get(&self, index: usize) -> Option<ChunkRef<'_>> {
        (index < self.nodes.len()).then_some(ChunkRef { tree: self, index })
    }

    /// Number of chunks in the tree, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a parsed tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All chunks in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = ChunkRef<'_>> {
        (0..self.nodes.len()).map(move |index| ChunkRef { tree: self, index })
    }

    /// The source buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes occupied by the root chunk.
    pub fn consumed(&self) -> usize {
        self.nodes[0].total_size as usize
    }

    /// Bytes after the root chunk that no chunk accounts for.
    pub fn trailing_bytes(&self) -> usize {
        self.data.len() - self.consumed()
    }

    /// Re-encode the tree from its arena.
    ///
    /// Headers are rebuilt from the stored sizes, so the output matches the
    /// consumed part of the source byte for byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.consumed());
        self.write_node(0, &mut out);
        out
    }

    fn write_node(&self, index: usize, out: &mut Vec<u8>) {
        let node = &self.nodes[index];
        let header = ChunkHeader::new(node.chunk_type, node.payload_size, node.total_size);
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(ChunkRef { tree: self, index }.payload());
        for &child in self.children_indices(node) {
            self.write_node(child, out);
        }
    }

    fn children_indices(&self, node: &ChunkNode) -> &[usize] {
        &self.child_indices[node.first_child..node.first_child + node.child_count]
    }
}

#[derive(Default)]
struct Parser {
    nodes: Vec<ChunkNode>,
    child_indices: Vec<usize>,
}

impl Parser {
    fn parse_chunk(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        parent: Option<usize>,
        limit: usize,
        depth: usize,
    ) -> Result<usize> {
        let offset = cursor.position();
        if depth > MAX_DEPTH {
            return Err(malformed(offset, format!("nesting deeper than {MAX_DEPTH} levels")));
        }

        let header: ChunkHeader = cursor.read_struct().map_err(|_| {
            malformed(
                offset,
                format!("truncated chunk header ({} bytes left)", cursor.remaining()),
            )
        })?;
        let chunk_type = header.chunk_type;
        let payload_size = header.payload_size as usize;
        let total_size = header.total_size as usize;

        if payload_size < ChunkHeader::SIZE {
            return Err(malformed(
                offset,
                format!("{chunk_type} payload size {payload_size} is smaller than its header"),
            ));
        }
        if total_size < payload_size {
            return Err(malformed(
                offset,
                format!("{chunk_type} total size {total_size} is smaller than payload size {payload_size}"),
            ));
        }
        let end = offset + total_size;
        if end > limit {
            return Err(malformed(
                offset,
                format!("{chunk_type} ends at {end}, past its container boundary {limit}"),
            ));
        }

        cursor
            .skip(payload_size - ChunkHeader::SIZE)
            .map_err(|e| malformed(offset, e.to_string()))?;

        let index = self.nodes.len();
        self.nodes.push(ChunkNode {
            chunk_type,
            offset,
            payload_size: header.payload_size,
            total_size: header.total_size,
            parent,
            first_child: 0,
            child_count: 0,
        });

        let mut children = Vec::new();
        while cursor.position() < end {
            children.push(self.parse_chunk(cursor, Some(index), end, depth + 1)?);
        }

        let node = &mut self.nodes[index];
        node.first_child = self.child_indices.len();
        node.child_count = children.len();
        self.child_indices.extend(children);

        Ok(index)
    }
}

fn malformed(offset: usize, reason: String) -> Error {
    Error::MalformedChunk { offset, reason }
}

/// A borrowed view of one chunk in a [`ChunkTree`].
#[derive(Clone, Copy)]
pub struct ChunkRef<'a> {
    tree: &'a ChunkTree,
    index: usize,
}

impl<'a> ChunkRef<'a> {
    #[inline]
    fn node(&self) -> &'a ChunkNode {
        &self.tree.nodes[self.index]
    }

    /// Arena index of this chunk.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The tree this chunk belongs to.
    pub fn tree(&self) -> &'a ChunkTree {
        self.tree
    }

    pub fn chunk_type(&self) -> ChunkType {
        self.node().chunk_type
    }

    /// Offset of the chunk header in the source buffer.
    pub fn offset(&self) -> usize {
        self.node().offset
    }

    pub fn payload_size(&self) -> u32 {
        self.node().payload_size
    }

    pub fn total_size(&self) -> u32 {
        self.node().total_size
    }

    /// Bytes occupied by the children.
    pub fn children_size(&self) -> u32 {
        self.node().total_size - self.node().payload_size
    }

    /// Payload bytes, excluding the header.
    pub fn payload(&self) -> &'a [u8] {
        let node = self.node();
        let start = node.offset + ChunkHeader::SIZE;
        &self.tree.data[start..node.offset + node.payload_size as usize]
    }

    /// A cursor over the payload.
    pub fn cursor(&self) -> ByteCursor<'a> {
        ByteCursor::new(self.payload())
    }

    /// The chunk's full byte range, header and children included.
    pub fn raw(&self) -> &'a [u8] {
        let node = self.node();
        &self.tree.data[node.offset..node.offset + node.total_size as usize]
    }

    pub fn is_leaf(&self) -> bool {
        self.node().child_count == 0
    }

    pub fn child_count(&self) -> usize {
        self.node().child_count
    }

    /// Immediate children in file order.
    pub fn children(&self) -> impl Iterator<Item = ChunkRef<'a>> + 'a {
        let tree = self.tree;
        tree.children_indices(self.node())
            .iter()
            .map(move |&index| ChunkRef { tree, index })
    }

    /// Immediate children of one type.
    pub fn children_of_type(&self, chunk_type: ChunkType) -> impl Iterator<Item = ChunkRef<'a>> + 'a {
        self.children().filter(move |c| c.chunk_type() == chunk_type)
    }

    pub fn first_child_of_type(&self, chunk_type: ChunkType) -> Option<ChunkRef<'a>> {
        self.children_of_type(chunk_type).next()
    }

    pub fn parent(&self) -> Option<ChunkRef<'a>> {
        self.node().parent.map(|index| ChunkRef {
            tree: self.tree,
            index,
        })
    }

    /// Other children of this chunk's parent, in file order.
    pub fn siblings(&self) -> impl Iterator<Item = ChunkRef<'a>> + 'a {
        let own = self.index;
        self.parent()
            .into_iter()
            .flat_map(|p| p.children())
            .filter(move |c| c.index != own)
    }

    /// All descendants of one type, depth first.
    pub fn descendants_of_type(&self, chunk_type: ChunkType) -> Vec<ChunkRef<'a>> {
        let mut found = Vec::new();
        let mut stack: Vec<ChunkRef<'a>> = self.children().collect();
        stack.reverse();
        while let Some(chunk) = stack.pop() {
            if chunk.chunk_type() == chunk_type {
                found.push(chunk);
            }
            let mut children: Vec<_> = chunk.children().collect();
            children.reverse();
            stack.extend(children);
        }
        found
    }
}

impl std::fmt::Debug for ChunkRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkRef")
            .field("chunk_type", &self.chunk_type())
            .field("offset", &self.offset())
            .field("payload_size", &self.payload_size())
            .field("total_size", &self.total_size())
            .field("children", &self.child_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChunkBuilder;
    use proptest::prelude::*;

    fn header(chunk_type: u32, payload_size: u32, total_size: u32) -> Vec<u8> {
        ChunkHeader::new(ChunkType(chunk_type), payload_size, total_size)
            .as_bytes()
            .to_vec()
    }

    #[test]
    fn test_root_with_two_leaves() {
        let mut data = header(ChunkType::ROOT.0, 16, 40);
        data.extend_from_slice(&[0xAA; 4]);
        data.extend(header(0x1000, 12, 12));
        data.extend(header(0x2000, 12, 12));
        assert_eq!(data.len(), 40);

        let tree = ChunkTree::parse(data).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.consumed(), 40);
        assert_eq!(tree.trailing_bytes(), 0);

        let root = tree.root();
        assert_eq!(root.payload(), &[0xAA; 4]);
        assert_eq!(root.children_size(), 24);

        let children: Vec<_> = root.children().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].chunk_type(), ChunkType(0x1000));
        assert_eq!(children[0].offset(), 16);
        assert_eq!(children[1].offset(), 28);
        assert!(children.iter().all(|c| c.is_leaf() && c.payload().is_empty()));
        assert_eq!(children[1].siblings().next().unwrap().index(), children[0].index());
        assert_eq!(children[0].parent().unwrap().index(), 0);
    }

    #[test]
    fn test_wrong_signature_is_unsupported() {
        let data = header(0x1234_5678, 12, 12);
        assert!(matches!(
            ChunkTree::parse(data),
            Err(Error::UnsupportedFormat {
                signature: 0x1234_5678
            })
        ));
    }

    #[test]
    fn test_total_smaller_than_payload_is_malformed() {
        let mut data = header(ChunkType::ROOT.0, 20, 16);
        data.extend_from_slice(&[0; 8]);
        assert!(matches!(
            ChunkTree::parse(data),
            Err(Error::MalformedChunk { offset: 0, .. })
        ));
    }

    #[test]
    fn test_payload_smaller_than_header_is_malformed() {
        let data = header(ChunkType::ROOT.0, 8, 12);
        assert!(matches!(
            ChunkTree::parse(data),
            Err(Error::MalformedChunk { .. })
        ));
    }

    #[test]
    fn test_child_overshooting_parent_is_malformed() {
        // Root claims 12 bytes of children; the child claims 16.
        let mut data = header(ChunkType::ROOT.0, 12, 24);
        data.extend(header(0x1000, 16, 16));
        data.extend_from_slice(&[0; 4]);
        assert!(matches!(
            ChunkTree::parse(data),
            Err(Error::MalformedChunk { offset: 12, .. })
        ));
    }

    #[test]
    fn test_truncated_buffer_is_malformed() {
        let mut data = header(ChunkType::ROOT.0, 12, 40);
        data.extend(header(0x1000, 12, 12));
        assert!(matches!(
            ChunkTree::parse(data),
            Err(Error::MalformedChunk { .. })
        ));
    }

    #[test]
    fn test_children_gap_is_malformed() {
        // 16 bytes of children: one 12-byte leaf and 4 stray bytes.
        let mut data = header(ChunkType::ROOT.0, 12, 28);
        data.extend(header(0x1000, 12, 12));
        data.extend_from_slice(&[0; 4]);
        assert!(matches!(
            ChunkTree::parse(data),
            Err(Error::MalformedChunk { offset: 24, .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_are_reported() {
        let mut data = ChunkBuilder::new(ChunkType::ROOT).to_bytes();
        data.extend_from_slice(&[0; 5]);
        let tree = ChunkTree::parse(data).unwrap();
        assert_eq!(tree.trailing_bytes(), 5);
    }

    #[test]
    fn test_nested_lookup() {
        let bytes = ChunkBuilder::new(ChunkType::ROOT)
            .child(
                ChunkBuilder::new(ChunkType::MESH)
                    .child(ChunkBuilder::new(ChunkType::PRIM_GROUP))
                    .child(ChunkBuilder::new(ChunkType::PRIM_GROUP)),
            )
            .child(ChunkBuilder::new(ChunkType::PRIM_GROUP))
            .to_bytes();
        let tree = ChunkTree::parse(bytes).unwrap();

        let root = tree.root();
        assert_eq!(root.descendants_of_type(ChunkType::PRIM_GROUP).len(), 3);
        let mesh = root.first_child_of_type(ChunkType::MESH).unwrap();
        assert_eq!(mesh.children_of_type(ChunkType::PRIM_GROUP).count(), 2);
        assert_eq!(tree.iter().count(), 5);
    }

    fn arb_builder() -> impl Strategy<Value = ChunkBuilder> {
        let leaf = (1u32..0x1000, proptest::collection::vec(any::<u8>(), 0..24))
            .prop_map(|(t, payload)| ChunkBuilder::new(ChunkType(t)).payload(payload));
        leaf.prop_recursive(4, 32, 4, |inner| {
            (
                1u32..0x1000,
                proptest::collection::vec(any::<u8>(), 0..16),
                proptest::collection::vec(inner, 0..4),
            )
                .prop_map(|(t, payload, children)| {
                    ChunkBuilder::new(ChunkType(t)).payload(payload).children(children)
                })
        })
    }

    proptest! {
        #[test]
        fn prop_children_fill_parent_and_reencode(children in proptest::collection::vec(arb_builder(), 0..4)) {
            let bytes = ChunkBuilder::new(ChunkType::ROOT).children(children).to_bytes();
            let tree = ChunkTree::parse(bytes.clone()).unwrap();

            for chunk in tree.iter() {
                prop_assert!(chunk.total_size() >= chunk.payload_size());
                let sum: u32 = chunk.children().map(|c| c.total_size()).sum();
                prop_assert_eq!(sum, chunk.children_size());
            }
            prop_assert_eq!(tree.consumed(), bytes.len());
            prop_assert_eq!(tree.to_bytes(), bytes);
        }
    }
}
