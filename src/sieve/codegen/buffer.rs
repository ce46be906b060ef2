use std::fmt;

/// Append-only output buffer for generated JavaScript.
pub(crate) struct Buffer {
    inner: Vec<String>,
}

impl Buffer {
    pub(crate) fn new() -> Buffer {
        Buffer { inner: vec![] }
    }

    pub(crate) fn write(&mut self, v: &str) {
        self.inner.push(v.to_owned());
    }

    pub(crate) fn newline(&mut self) {
        self.inner.push("\n".to_owned());
    }

    /// Write `v` followed by a newline.
    pub(crate) fn line(&mut self, v: &str) {
        self.write(v);
        self.newline();
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for chunk in &self.inner {
            write!(f, "{}", chunk)?;
        }

        Ok(())
    }
}

/// Quote `v` as a JavaScript string literal.
pub(crate) fn js_string(v: &str) -> String {
    let mut out = String::with_capacity(v.len() + 2);
    out.push('"');
    for c in v.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
