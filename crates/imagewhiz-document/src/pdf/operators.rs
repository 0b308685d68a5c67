// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document operators: merge ordered sources, extract a page subset, strip
// metadata, and remove pages. Each serialises exactly once and never returns
// partial output.

use std::collections::BTreeSet;

use imagewhiz_core::error::{Result, WhizError};
use tracing::{info, instrument};

use super::adapter::{DocumentAdapter, MetadataField};

/// Fewest sources a merge accepts.
pub const MIN_MERGE_SOURCES: usize = 2;

/// Concatenate every page of every source, in list order.
#[instrument(skip_all, fields(sources = sources.len()))]
pub fn merge<A: DocumentAdapter>(adapter: &A, sources: &[A::Handle]) -> Result<Vec<u8>> {
    if sources.len() < MIN_MERGE_SOURCES {
        return Err(WhizError::InsufficientInput {
            required: MIN_MERGE_SOURCES,
            supplied: sources.len(),
        });
    }

    let mut merged = adapter.create();
    for source in sources {
        let all: Vec<usize> = (0..adapter.page_count(source)).collect();
        let pages = adapter.copy_pages(source, &all)?;
        adapter.append_pages(&mut merged, pages)?;
    }

    let total = adapter.page_count(&merged);
    let output = adapter.serialize(&mut merged)?;
    info!(pages = total, output_bytes = output.len(), "Merge complete");
    Ok(output)
}

/// Copy the selected pages, in ascending index order, into a new document.
#[instrument(skip_all)]
pub fn split<A: DocumentAdapter>(
    adapter: &A,
    source: &A::Handle,
    pages: impl IntoIterator<Item = usize>,
) -> Result<Vec<u8>> {
    let selected: Vec<usize> = checked_selection(adapter.page_count(source), pages)?
        .into_iter()
        .collect();

    let mut extracted = adapter.create();
    let copied = adapter.copy_pages(source, &selected)?;
    adapter.append_pages(&mut extracted, copied)?;

    let output = adapter.serialize(&mut extracted)?;
    info!(pages = selected.len(), output_bytes = output.len(), "Split complete");
    Ok(output)
}

/// Clear every metadata field and re-serialise. Page content is untouched;
/// any size reduction comes from unreferenced objects being dropped.
#[instrument(skip_all)]
pub fn strip_metadata<A: DocumentAdapter>(adapter: &A, mut document: A::Handle) -> Result<Vec<u8>> {
    for field in MetadataField::ALL {
        adapter.set_metadata_field(&mut document, field, None)?;
    }
    let output = adapter.serialize(&mut document)?;
    info!(output_bytes = output.len(), "Metadata stripped");
    Ok(output)
}

/// Delete the selected pages. At least one page must remain.
#[instrument(skip_all)]
pub fn remove_pages<A: DocumentAdapter>(
    adapter: &A,
    mut document: A::Handle,
    pages: impl IntoIterator<Item = usize>,
) -> Result<Vec<u8>> {
    let total = adapter.page_count(&document);
    let selected = checked_selection(total, pages)?;
    if selected.len() == total {
        return Err(WhizError::InputRejected(
            "cannot remove every page of the document".into(),
        ));
    }

    let indices: Vec<usize> = selected.into_iter().collect();
    adapter.delete_pages(&mut document, &indices)?;
    let output = adapter.serialize(&mut document)?;
    info!(removed = indices.len(), remaining = total - indices.len(), "Pages removed");
    Ok(output)
}

/// Sort and de-duplicate a page selection, rejecting empty or out-of-range
/// input.
fn checked_selection(total: usize, pages: impl IntoIterator<Item = usize>) -> Result<BTreeSet<usize>> {
    let selected: BTreeSet<usize> = pages.into_iter().collect();
    if selected.is_empty() {
        return Err(WhizError::NoSelection);
    }
    if let Some(&last) = selected.last() {
        if last >= total {
            return Err(WhizError::InputRejected(format!(
                "page {} out of range (document has {} pages)",
                last + 1,
                total
            )));
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::adapter::LopdfAdapter;
    use crate::pdf::adapter::tests::{labelled_pdf, page_labels};

    fn open(label: &str, pages: usize) -> crate::pdf::adapter::PdfHandle {
        LopdfAdapter.parse(&labelled_pdf(label, pages)).expect("parse fixture")
    }

    #[test]
    fn merge_concatenates_in_source_order() {
        let merged = merge(&LopdfAdapter, &[open("A", 3), open("B", 2)]).expect("merge");
        assert_eq!(page_labels(&merged), vec!["A-0", "A-1", "A-2", "B-0", "B-1"]);
    }

    #[test]
    fn merge_page_count_is_the_sum() {
        let merged = merge(&LopdfAdapter, &[open("A", 1), open("B", 4), open("C", 2)]).expect("merge");
        assert_eq!(page_labels(&merged).len(), 7);
    }

    #[test]
    fn merge_same_document_twice_keeps_both_copies() {
        let source = open("S", 2);
        let merged = merge(&LopdfAdapter, &[source.clone(), source]).expect("merge");
        assert_eq!(page_labels(&merged), vec!["S-0", "S-1", "S-0", "S-1"]);
    }

    #[test]
    fn merge_needs_two_sources() {
        let err = merge(&LopdfAdapter, &[open("A", 3)]).expect_err("one source");
        assert!(matches!(
            err,
            WhizError::InsufficientInput {
                required: 2,
                supplied: 1
            }
        ));
    }

    #[test]
    fn split_ignores_selection_order() {
        let source = open("P", 3);
        let forward = split(&LopdfAdapter, &source, [0, 2]).expect("split");
        let reverse = split(&LopdfAdapter, &source, [2, 0]).expect("split");
        assert_eq!(page_labels(&forward), vec!["P-0", "P-2"]);
        assert_eq!(page_labels(&reverse), page_labels(&forward));
    }

    #[test]
    fn split_with_nothing_selected_fails() {
        let err = split(&LopdfAdapter, &open("P", 3), []).expect_err("empty");
        assert!(matches!(err, WhizError::NoSelection));
    }

    #[test]
    fn split_out_of_range_is_rejected() {
        let err = split(&LopdfAdapter, &open("P", 3), [3]).expect_err("range");
        assert!(matches!(err, WhizError::InputRejected(_)));
    }

    #[test]
    fn strip_metadata_clears_fields_and_keeps_pages() {
        let stripped = strip_metadata(&LopdfAdapter, open("M", 2)).expect("strip");
        let reopened = LopdfAdapter.parse(&stripped).expect("reparse");
        for field in MetadataField::ALL {
            assert_eq!(LopdfAdapter.metadata_field(&reopened, field), None, "{field:?}");
        }
        assert_eq!(page_labels(&stripped), vec!["M-0", "M-1"]);
    }

    #[test]
    fn remove_pages_keeps_the_rest() {
        let trimmed = remove_pages(&LopdfAdapter, open("R", 4), [3, 0]).expect("remove");
        assert_eq!(page_labels(&trimmed), vec!["R-1", "R-2"]);
    }

    #[test]
    fn remove_every_page_is_rejected() {
        let err = remove_pages(&LopdfAdapter, open("R", 2), [0, 1]).expect_err("all pages");
        assert!(matches!(err, WhizError::InputRejected(_)));
    }
}
