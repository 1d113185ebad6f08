// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_note_content(entries: usize) -> String {
    let mut content = String::new();
    for entry in 0..entries {
        content.push_str(&format!(
            "## Entry {entry}\n\n- todo: review the draft\n- todo: reply to comments\n\nSome paragraph text for entry {entry}.\n\n"
        ));
    }
    content
}

/// Offset (in characters) of the `nth` occurrence of `needle`
#[allow(dead_code)]
pub fn nth_occurrence(content: &str, needle: &str, nth: usize) -> usize {
    let byte_start = content
        .match_indices(needle)
        .nth(nth)
        .map(|(start, _)| start)
        .unwrap();
    content[..byte_start].chars().count()
}
