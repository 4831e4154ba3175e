//! Fixed-size page slicing over an ordered sequence.

/// Number of pages needed for `len` items; 0 when the sequence is
/// empty or the page size is 0.
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 { 0 } else { len.div_ceil(page_size) }
}

/// The 1-based `page_index`th page. Out-of-range pages yield an empty
/// sequence rather than failing.
pub fn paginate<T: Clone>(items: &[T], page_index: usize, page_size: usize) -> Vec<T> {
    if page_index == 0 || page_size == 0 {
        return Vec::new();
    }
    let start = (page_index - 1) * page_size;
    if start >= items.len() {
        return Vec::new();
    }
    let end = (start + page_size).min(items.len());
    items[start..end].to_vec()
}
