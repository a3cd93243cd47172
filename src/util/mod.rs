//! Small helpers shared across the router/subscriber composition fabric.

// Layer 1: Standard library imports
// (none)

/// Joins two dot-segmented prefixes, skipping the join when either side is empty
/// and deduplicating a leading run of `child` segments that already match the
/// trailing segments of `parent` (see SPEC_FULL.md §9, "Prefix dedupe during
/// propagation").
pub fn join_prefix(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        return child.to_string();
    }
    if child.is_empty() {
        return parent.to_string();
    }

    let parent_segments: Vec<&str> = parent.split('.').collect();
    let mut child_segments: Vec<&str> = child.split('.').collect();

    // Strip a leading run of child segments that duplicates the tail of parent.
    let mut overlap = 0;
    while overlap < child_segments.len()
        && overlap < parent_segments.len()
        && child_segments[overlap] == parent_segments[parent_segments.len() - overlap - 1]
    {
        overlap += 1;
    }
    // Only treat it as a dedupe-able overlap if it runs from the very start of
    // child and reaches the very end of parent (a genuine double-prefixing),
    // not an incidental match on a single inner segment.
    if overlap > 0 && overlap == parent_segments.len().min(child_segments.len()) {
        child_segments.drain(0..overlap);
    }

    if child_segments.is_empty() {
        parent.to_string()
    } else {
        format!("{parent}.{}", child_segments.join("."))
    }
}

/// Validates a router prefix against `^[A-Za-z0-9]([A-Za-z0-9_./]*[A-Za-z0-9])?$`.
pub fn is_valid_prefix(prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }

    let bytes = prefix.as_bytes();
    let is_alnum = |b: u8| b.is_ascii_alphanumeric();
    let is_body = |b: u8| is_alnum(b) || matches!(b, b'_' | b'.' | b'/');

    if !is_alnum(bytes[0]) {
        return false;
    }
    if bytes.len() == 1 {
        return true;
    }
    if !is_alnum(bytes[bytes.len() - 1]) {
        return false;
    }
    bytes[1..bytes.len() - 1].iter().all(|b| is_body(*b))
}
