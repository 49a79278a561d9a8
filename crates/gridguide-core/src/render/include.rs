//! Splicing sections of an external XMLTV file.

/// Lines from the first line containing `start_tag` up to, not including,
/// the next line containing `end_tag`. Later sections are appended too.
#[must_use]
pub fn splice_section(source: &str, start_tag: &str, end_tag: &str) -> String {
    let mut out = String::new();
    let mut inside = false;
    for line in source.split_inclusive('\n') {
        if line.contains(start_tag) {
            inside = true;
        }
        if line.contains(end_tag) {
            inside = false;
        } else if inside {
            out.push_str(line);
            if !line.ends_with('\n') {
                out.push('\n');
            }
        }
    }
    out
}
