/// A dotted namespace path naming a variable, e.g. `@it.score`.
///
/// The first segment selects a binding (a comprehension name or a root
/// variable), the remaining segments walk into the bound value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariablePath {
    name: String,
    segments: Vec<String>,
}

impl VariablePath {
    /// Create a path from the reference text without its sigil.
    ///
    /// Returns `None` when the text is empty or contains a blank segment.
    pub fn parse(name: &str, separator: char) -> Option<Self> {
        let segments: Vec<String> = name.split(separator).map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return None;
        }
        Some(VariablePath {
            name: name.to_string(),
            segments,
        })
    }

    /// The reference text as written, without the sigil
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// Every segment after the first
    pub fn rest(&self) -> &[String] {
        &self.segments[1..]
    }
}

impl std::fmt::Display for VariablePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_separator() {
        let path = VariablePath::parse("it.score", '.').unwrap();
        assert_eq!(path.first(), "it");
        assert_eq!(path.rest(), ["score".to_string()]);
    }

    #[test]
    fn rejects_blank_segments() {
        assert!(VariablePath::parse("", '.').is_none());
        assert!(VariablePath::parse("a..b", '.').is_none());
        assert!(VariablePath::parse("a.", '.').is_none());
    }
}
