/// Render a `###` heading followed by one code-formatted bullet per item.
pub fn code_list<S: AsRef<str>>(heading: &str, items: &[S]) -> String {
    let mut output = format!("### {}\n", heading);
    for item in items {
        output.push_str(&format!("- `{}`\n", item.as_ref()));
    }
    output
}

/// Render a bold label with a code-formatted value, e.g. ``**ID:** `abc` ``.
pub fn field(label: &str, value: &str) -> String {
    format!("**{}:** `{}`", label, value)
}
