// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document adapter: parse, page copy/append/delete, metadata and
// serialisation for paginated documents, implemented over `lopdf`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use imagewhiz_core::error::{Result, WhizError};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use tracing::{debug, info, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Identifies the document a copied page came from, so that objects shared by
/// several pages of one source are appended once.
static NEXT_SOURCE_TAG: AtomicU64 = AtomicU64::new(1);

/// Fields of the document information dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Title,
    Author,
    Subject,
    Keywords,
    Producer,
    Creator,
}

impl MetadataField {
    pub const ALL: [MetadataField; 6] = [
        Self::Title,
        Self::Author,
        Self::Subject,
        Self::Keywords,
        Self::Producer,
        Self::Creator,
    ];

    /// Key in the /Info dictionary.
    pub fn key(&self) -> &'static [u8] {
        match self {
            Self::Title => b"Title",
            Self::Author => b"Author",
            Self::Subject => b"Subject",
            Self::Keywords => b"Keywords",
            Self::Producer => b"Producer",
            Self::Creator => b"Creator",
        }
    }
}

/// Page-level document capability consumed by the document operators.
///
/// Pages are addressed by zero-based index.
pub trait DocumentAdapter: Send + Sync {
    /// An opened document.
    type Handle: Clone + Send + 'static;
    /// A page copied out of one document, ready to append to another.
    type PageRef: Send;

    /// Parse document bytes. Corrupt or protected input fails with
    /// [`WhizError::Parse`].
    fn parse(&self, bytes: &[u8]) -> Result<Self::Handle>;

    /// A new document with no pages.
    fn create(&self) -> Self::Handle;

    fn page_count(&self, handle: &Self::Handle) -> usize;

    /// Copy the pages at `indices`, in the order given.
    fn copy_pages(&self, source: &Self::Handle, indices: &[usize]) -> Result<Vec<Self::PageRef>>;

    /// Append copied pages to the end of `dest`, in order.
    fn append_pages(&self, dest: &mut Self::Handle, pages: Vec<Self::PageRef>) -> Result<()>;

    /// Delete the pages at `indices`.
    fn delete_pages(&self, handle: &mut Self::Handle, indices: &[usize]) -> Result<()>;

    /// Set or clear (`None`) one metadata field.
    fn set_metadata_field(
        &self,
        handle: &mut Self::Handle,
        field: MetadataField,
        value: Option<&str>,
    ) -> Result<()>;

    fn metadata_field(&self, handle: &Self::Handle, field: MetadataField) -> Option<String>;

    /// Serialise the whole document. Unreferenced objects are dropped.
    fn serialize(&self, handle: &mut Self::Handle) -> Result<Vec<u8>>;
}

/// An opened `lopdf` document.
#[derive(Debug, Clone)]
pub struct PdfHandle {
    document: Document,
    source_tag: u64,
}

impl PdfHandle {
    fn new(document: Document) -> Self {
        Self {
            document,
            source_tag: NEXT_SOURCE_TAG.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Borrow the underlying lopdf document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Object ids of the pages in reading order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        self.document.get_pages().into_values().collect()
    }
}

/// A page copied out of a [`PdfHandle`]: the page dictionary plus every object
/// it transitively references, keyed by their ids in the source document.
#[derive(Debug)]
pub struct CopiedPage {
    source_tag: u64,
    page_id: ObjectId,
    objects: BTreeMap<ObjectId, Object>,
}

/// [`DocumentAdapter`] backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfAdapter;

impl DocumentAdapter for LopdfAdapter {
    type Handle = PdfHandle;
    type PageRef = CopiedPage;

    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    fn parse(&self, bytes: &[u8]) -> Result<PdfHandle> {
        let document = Document::load_mem(bytes)
            .map_err(|err| WhizError::Parse(format!("failed to load PDF from memory: {}", err)))?;
        if document.is_encrypted() {
            return Err(WhizError::Parse("document is password protected".into()));
        }
        document
            .catalog()
            .map_err(|err| WhizError::Parse(format!("no catalog: {}", err)))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(PdfHandle::new(document))
    }

    fn create(&self) -> PdfHandle {
        let mut document = Document::with_version("1.7");

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(Vec::new()));
        pages.set("Count", Object::Integer(0));
        let pages_id = document.add_object(pages);

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = document.add_object(catalog);

        document.trailer.set("Root", Object::Reference(catalog_id));
        PdfHandle::new(document)
    }

    fn page_count(&self, handle: &PdfHandle) -> usize {
        handle.document.get_pages().len()
    }

    #[instrument(skip(self, source), fields(source_pages = self.page_count(source)))]
    fn copy_pages(&self, source: &PdfHandle, indices: &[usize]) -> Result<Vec<CopiedPage>> {
        let page_ids = source.page_ids();
        indices
            .iter()
            .map(|&index| {
                let page_id = *page_ids.get(index).ok_or_else(|| {
                    WhizError::InputRejected(format!(
                        "page {} out of range (document has {} pages)",
                        index + 1,
                        page_ids.len()
                    ))
                })?;
                copy_page(&source.document, page_id, source.source_tag)
            })
            .collect()
    }

    #[instrument(skip_all, fields(count = pages.len()))]
    fn append_pages(&self, dest: &mut PdfHandle, pages: Vec<CopiedPage>) -> Result<()> {
        let document = &mut dest.document;
        let pages_root = page_tree_root(document)?;

        // Allocate every id up front so forward references can be rewritten.
        let mut mapping: HashMap<(u64, ObjectId), ObjectId> = HashMap::new();
        for page in &pages {
            for old_id in page.objects.keys() {
                mapping
                    .entry((page.source_tag, *old_id))
                    .or_insert_with(|| document.new_object_id());
            }
        }

        let mut appended = Vec::with_capacity(pages.len());
        let mut inserted: HashSet<ObjectId> = HashSet::new();
        for page in pages {
            let tag = page.source_tag;
            let page_new_id = mapping
                .get(&(tag, page.page_id))
                .copied()
                .ok_or_else(|| WhizError::Unexpected("copied page is missing its own object".into()))?;

            for (old_id, mut object) in page.objects {
                let Some(&new_id) = mapping.get(&(tag, old_id)) else {
                    continue;
                };
                if !inserted.insert(new_id) {
                    continue;
                }
                remap_references(&mut object, tag, &mapping);
                document.objects.insert(new_id, object);
            }

            if let Ok(Object::Dictionary(page_dict)) = document.get_object_mut(page_new_id) {
                page_dict.set("Parent", Object::Reference(pages_root));
            }
            appended.push(page_new_id);
        }

        let root = document
            .get_object_mut(pages_root)
            .and_then(Object::as_dict_mut)
            .map_err(|err| WhizError::Unexpected(format!("page tree root unusable: {}", err)))?;
        let count = root.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        match root.get_mut(b"Kids") {
            Ok(Object::Array(kids)) => {
                kids.extend(appended.iter().map(|id| Object::Reference(*id)));
            }
            _ => {
                root.set(
                    "Kids",
                    Object::Array(appended.iter().map(|id| Object::Reference(*id)).collect()),
                );
            }
        }
        root.set("Count", Object::Integer(count + appended.len() as i64));

        debug!(appended = appended.len(), total = document.get_pages().len(), "Pages appended");
        Ok(())
    }

    #[instrument(skip(self, handle))]
    fn delete_pages(&self, handle: &mut PdfHandle, indices: &[usize]) -> Result<()> {
        let total = self.page_count(handle);
        if let Some(&bad) = indices.iter().find(|&&index| index >= total) {
            return Err(WhizError::InputRejected(format!(
                "page {} out of range (document has {} pages)",
                bad + 1,
                total
            )));
        }
        // lopdf pages are keyed by 1-indexed page number.
        let page_numbers: Vec<u32> = indices.iter().map(|&index| index as u32 + 1).collect();
        handle.document.delete_pages(&page_numbers);
        info!(deleted = page_numbers.len(), remaining = self.page_count(handle), "Pages deleted");
        Ok(())
    }

    fn set_metadata_field(
        &self,
        handle: &mut PdfHandle,
        field: MetadataField,
        value: Option<&str>,
    ) -> Result<()> {
        let document = &mut handle.document;
        let info_ref = document.trailer.get(b"Info").ok().cloned();

        let info = match info_ref {
            Some(Object::Reference(id)) => document
                .get_object_mut(id)
                .and_then(Object::as_dict_mut)
                .map_err(|err| WhizError::Parse(format!("/Info is not a dictionary: {}", err)))?,
            Some(Object::Dictionary(_)) => document
                .trailer
                .get_mut(b"Info")
                .and_then(Object::as_dict_mut)
                .map_err(|err| WhizError::Parse(format!("/Info is not a dictionary: {}", err)))?,
            _ => {
                // Nothing to clear.
                if value.is_none() {
                    return Ok(());
                }
                let id = document.add_object(Dictionary::new());
                document.trailer.set("Info", Object::Reference(id));
                document
                    .get_object_mut(id)
                    .and_then(Object::as_dict_mut)
                    .map_err(|err| WhizError::Unexpected(format!("new /Info unusable: {}", err)))?
            }
        };

        match value {
            Some(text) => info.set(
                field.key(),
                Object::String(text.as_bytes().to_vec(), StringFormat::Literal),
            ),
            None => {
                info.remove(field.key());
            }
        }
        Ok(())
    }

    fn metadata_field(&self, handle: &PdfHandle, field: MetadataField) -> Option<String> {
        let document = &handle.document;
        let info = match document.trailer.get(b"Info").ok()? {
            Object::Reference(id) => document.get_dictionary(*id).ok()?,
            Object::Dictionary(dict) => dict,
            _ => return None,
        };
        match info.get(field.key()).ok()? {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            _ => None,
        }
    }

    #[instrument(skip_all, fields(pages = self.page_count(handle)))]
    fn serialize(&self, handle: &mut PdfHandle) -> Result<Vec<u8>> {
        let pruned = handle.document.prune_objects();
        let mut output = Vec::new();
        handle
            .document
            .save_to(&mut output)
            .map_err(|err| WhizError::Unexpected(format!("failed to serialise PDF: {}", err)))?;
        debug!(pruned = pruned.len(), output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }
}

/// Object id of the catalog's /Pages node.
fn page_tree_root(document: &Document) -> Result<ObjectId> {
    document
        .catalog()
        .map_err(|err| WhizError::Parse(format!("no catalog: {}", err)))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|err| WhizError::Parse(format!("no /Pages reference: {}", err)))
}

/// Copy one page and the closure of objects it references, resolving
/// inherited attributes so the page stands alone outside its page tree.
fn copy_page(source: &Document, page_id: ObjectId, source_tag: u64) -> Result<CopiedPage> {
    let mut page = source
        .get_dictionary(page_id)
        .map_err(|err| WhizError::Parse(format!("cannot read page object {:?}: {}", page_id, err)))?
        .clone();

    for key in INHERITABLE {
        if page.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(source, &page, key) {
            page.set(key, value);
        }
    }
    page.remove(b"Parent");
    let page = Object::Dictionary(page);

    let mut objects = BTreeMap::new();
    let mut pending = Vec::new();
    collect_references(&page, &mut pending);
    objects.insert(page_id, page);

    while let Some(id) = pending.pop() {
        if objects.contains_key(&id) {
            continue;
        }
        match source.get_object(id) {
            // Other pages and the page tree stay behind; references to them
            // become Null on append.
            Ok(object) if is_page_tree_node(object) => {
                debug!(?id, "Reference into the source page tree left out");
            }
            Ok(object) => {
                collect_references(object, &mut pending);
                objects.insert(id, object.clone());
            }
            Err(err) => warn!(?id, %err, "Cannot resolve reference, using Null"),
        }
    }

    Ok(CopiedPage {
        source_tag,
        page_id,
        objects,
    })
}

/// Walk up the /Parent chain looking for `key`.
fn inherited_attribute(source: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut seen = HashSet::new();
    while let Some(id) = parent {
        if !seen.insert(id) {
            break;
        }
        let node = source.get_dictionary(id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// A /Page or /Pages dictionary.
fn is_page_tree_node(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => matches!(
            dict.get(b"Type"),
            Ok(Object::Name(name)) if name.as_slice() == b"Page" || name.as_slice() == b"Pages"
        ),
        _ => false,
    }
}

/// Push every object id directly referenced from within `object`.
fn collect_references(object: &Object, into: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => into.push(*id),
        Object::Array(items) => items.iter().for_each(|item| collect_references(item, into)),
        Object::Dictionary(dict) => dict.iter().for_each(|(_, value)| collect_references(value, into)),
        Object::Stream(stream) => stream
            .dict
            .iter()
            .for_each(|(_, value)| collect_references(value, into)),
        _ => {}
    }
}

/// Rewrite references from source ids to destination ids. References that
/// were never copied become `Null`.
fn remap_references(object: &mut Object, tag: u64, mapping: &HashMap<(u64, ObjectId), ObjectId>) {
    match object {
        Object::Reference(id) => {
            *object = match mapping.get(&(tag, *id)) {
                Some(new_id) => Object::Reference(*new_id),
                None => Object::Null,
            };
        }
        Object::Array(items) => items
            .iter_mut()
            .for_each(|item| remap_references(item, tag, mapping)),
        Object::Dictionary(dict) => dict
            .iter_mut()
            .for_each(|(_, value)| remap_references(value, tag, mapping)),
        Object::Stream(stream) => stream
            .dict
            .iter_mut()
            .for_each(|(_, value)| remap_references(value, tag, mapping)),
        _ => {}
    }
}

/// Decode a PDF text string: UTF-16BE with a byte-order mark, otherwise bytes
/// read as UTF-8 (lossily).
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::Stream;

    /// Build a PDF whose page `i` has the content stream `"{label}-{i}"`.
    /// Resources and MediaBox live on the page tree root so copying has to
    /// resolve inheritance.
    pub(crate) fn labelled_pdf(label: &str, pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
        let font_id = doc.add_object(font);
        let mut fonts = Dictionary::new();
        fonts.set("F1", Object::Reference(font_id));
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));
        let resources_id = doc.add_object(resources);

        let mut kids = Vec::new();
        for index in 0..pages {
            let content = format!("% {label}-{index}\n").into_bytes();
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set("Contents", Object::Reference(content_id));
            kids.push(Object::Reference(doc.add_object(page)));
        }

        let mut tree = Dictionary::new();
        tree.set("Type", Object::Name(b"Pages".to_vec()));
        tree.set("Count", Object::Integer(pages as i64));
        tree.set("Kids", Object::Array(kids));
        tree.set("Resources", Object::Reference(resources_id));
        tree.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ]),
        );
        doc.objects.insert(pages_id, Object::Dictionary(tree));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut info = Dictionary::new();
        info.set("Title", Object::string_literal(format!("Document {label}")));
        info.set("Author", Object::string_literal("Fixture Author"));
        info.set("Producer", Object::string_literal("fixture"));
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", Object::Reference(info_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save fixture");
        bytes
    }

    /// Content stream of every page, in order.
    pub(crate) fn page_labels(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).expect("reload");
        doc.get_pages()
            .into_values()
            .map(|id| {
                let content = doc.get_page_content(id).expect("page content");
                String::from_utf8_lossy(&content).trim().trim_start_matches("% ").to_string()
            })
            .collect()
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = LopdfAdapter.parse(b"not a pdf at all").expect_err("garbage");
        assert!(matches!(err, WhizError::Parse(_)));
    }

    #[test]
    fn created_document_accepts_pages() {
        let adapter = LopdfAdapter;
        let source = adapter.parse(&labelled_pdf("A", 2)).expect("parse");
        let mut dest = adapter.create();
        assert_eq!(adapter.page_count(&dest), 0);

        let pages = adapter.copy_pages(&source, &[1, 0]).expect("copy");
        adapter.append_pages(&mut dest, pages).expect("append");
        let bytes = adapter.serialize(&mut dest).expect("serialize");
        assert_eq!(page_labels(&bytes), vec!["A-1", "A-0"]);
    }

    #[test]
    fn copied_pages_carry_inherited_attributes() {
        let adapter = LopdfAdapter;
        let source = adapter.parse(&labelled_pdf("A", 1)).expect("parse");
        let mut dest = adapter.create();
        let pages = adapter.copy_pages(&source, &[0]).expect("copy");
        adapter.append_pages(&mut dest, pages).expect("append");

        let page_id = dest.page_ids()[0];
        let page = dest.document().get_dictionary(page_id).expect("page dict");
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
    }

    #[test]
    fn copy_out_of_range_is_rejected() {
        let adapter = LopdfAdapter;
        let source = adapter.parse(&labelled_pdf("A", 2)).expect("parse");
        assert!(matches!(
            adapter.copy_pages(&source, &[2]),
            Err(WhizError::InputRejected(_))
        ));
    }

    #[test]
    fn metadata_can_be_read_set_and_cleared() {
        let adapter = LopdfAdapter;
        let mut handle = adapter.parse(&labelled_pdf("M", 1)).expect("parse");
        assert_eq!(
            adapter.metadata_field(&handle, MetadataField::Title).as_deref(),
            Some("Document M")
        );

        adapter
            .set_metadata_field(&mut handle, MetadataField::Subject, Some("Quarterly"))
            .expect("set");
        adapter
            .set_metadata_field(&mut handle, MetadataField::Title, None)
            .expect("clear");
        assert_eq!(adapter.metadata_field(&handle, MetadataField::Title), None);
        assert_eq!(
            adapter.metadata_field(&handle, MetadataField::Subject).as_deref(),
            Some("Quarterly")
        );
    }

    #[test]
    fn delete_pages_keeps_the_rest_in_order() {
        let adapter = LopdfAdapter;
        let mut handle = adapter.parse(&labelled_pdf("D", 4)).expect("parse");
        adapter.delete_pages(&mut handle, &[1, 2]).expect("delete");
        let bytes = adapter.serialize(&mut handle).expect("serialize");
        assert_eq!(page_labels(&bytes), vec!["D-0", "D-3"]);
    }

    /// One page carrying a text annotation whose popup points back at it.
    fn annotated_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();
        let markup_id = doc.new_object_id();
        let popup_id = doc.new_object_id();

        let mut popup = Dictionary::new();
        popup.set("Type", Object::Name(b"Annot".to_vec()));
        popup.set("Subtype", Object::Name(b"Popup".to_vec()));
        popup.set("Parent", Object::Reference(markup_id));
        popup.set("P", Object::Reference(page_id));
        doc.objects.insert(popup_id, Object::Dictionary(popup));

        let mut markup = Dictionary::new();
        markup.set("Type", Object::Name(b"Annot".to_vec()));
        markup.set("Subtype", Object::Name(b"Text".to_vec()));
        markup.set("Contents", Object::string_literal("Check this figure"));
        markup.set("Popup", Object::Reference(popup_id));
        markup.set("P", Object::Reference(page_id));
        doc.objects.insert(markup_id, Object::Dictionary(markup));

        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"% N-0\n".to_vec()));
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        page.set(
            "Annots",
            Object::Array(vec![Object::Reference(markup_id), Object::Reference(popup_id)]),
        );
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(200),
                Object::Integer(200),
            ]),
        );
        doc.objects.insert(page_id, Object::Dictionary(page));

        let mut tree = Dictionary::new();
        tree.set("Type", Object::Name(b"Pages".to_vec()));
        tree.set("Count", Object::Integer(1));
        tree.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        doc.objects.insert(pages_id, Object::Dictionary(tree));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save fixture");
        bytes
    }

    #[test]
    fn annotation_popups_keep_their_parent_link() {
        let adapter = LopdfAdapter;
        let first = adapter.parse(&labelled_pdf("A", 1)).expect("parse");
        let annotated = adapter.parse(&annotated_pdf()).expect("parse");
        let mut dest = adapter.create();
        for source in [&first, &annotated] {
            let pages = adapter.copy_pages(source, &[0]).expect("copy");
            adapter.append_pages(&mut dest, pages).expect("append");
        }
        let bytes = adapter.serialize(&mut dest).expect("serialize");
        assert_eq!(page_labels(&bytes), vec!["A-0", "N-0"]);

        let doc = Document::load_mem(&bytes).expect("reload");
        let page_id = doc.get_pages()[&2];
        let page = doc.get_dictionary(page_id).expect("page dict");
        let annots = page.get(b"Annots").and_then(Object::as_array).expect("annots");
        let markup_id = annots[0].as_reference().expect("markup ref");
        let markup = doc.get_dictionary(markup_id).expect("markup");
        let popup_id = markup.get(b"Popup").and_then(Object::as_reference).expect("popup ref");
        let popup = doc.get_dictionary(popup_id).expect("popup");

        assert_eq!(popup.get(b"Parent").and_then(Object::as_reference).expect("parent"), markup_id);
        assert_eq!(popup.get(b"P").and_then(Object::as_reference).expect("page ref"), page_id);
        let parent = doc.get_dictionary(markup_id).expect("parent resolves");
        assert_eq!(parent.get(b"Subtype").and_then(Object::as_name).expect("subtype"), b"Text");
    }

    #[test]
    fn copying_never_drags_in_other_pages() {
        let adapter = LopdfAdapter;
        let source = adapter.parse(&labelled_pdf("S", 3)).expect("parse");
        let mut dest = adapter.create();
        let pages = adapter.copy_pages(&source, &[1]).expect("copy");
        adapter.append_pages(&mut dest, pages).expect("append");
        let bytes = adapter.serialize(&mut dest).expect("serialize");

        let doc = Document::load_mem(&bytes).expect("reload");
        let page_objects = doc
            .objects
            .values()
            .filter(|object| match object {
                Object::Dictionary(dict) => dict
                    .get(b"Type")
                    .and_then(Object::as_name)
                    .map(|name| name == b"Page")
                    .unwrap_or(false),
                _ => false,
            })
            .count();
        assert_eq!(page_objects, 1);
    }

    #[test]
    fn utf16_text_strings_decode() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_string(&bytes), "Hi");
    }
}
