/// One segment of a state path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Numeric index into a list.
    Index(usize),
    /// `@`: the end of a list, resolved to its length at write time.
    Append,
    /// A named map field.
    Field(String),
}

/// A parsed state path: `"a.b.2"` → `[Field("a"), Field("b"), Index(2)]`.
///
/// All-digit segments parse as indices and a lone `@` as append; anything
/// else is a field name. Parsing is total. A path may also be built from a
/// pre-split key sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path(Vec<Key>);

impl Path {
    pub fn parse(spec: &str) -> Self {
        let keys = spec
            .split('.')
            .map(|seg| {
                if seg == "@" {
                    Key::Append
                } else if !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()) {
                    match seg.parse::<usize>() {
                        Ok(i) => Key::Index(i),
                        Err(_) => Key::Field(seg.to_string()),
                    }
                } else {
                    Key::Field(seg.to_string())
                }
            })
            .collect();
        Path(keys)
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }
}

impl From<&str> for Path {
    fn from(spec: &str) -> Self {
        Path::parse(spec)
    }
}

impl From<String> for Path {
    fn from(spec: String) -> Self {
        Path::parse(&spec)
    }
}

impl From<Vec<Key>> for Path {
    fn from(keys: Vec<Key>) -> Self {
        Path(keys)
    }
}
