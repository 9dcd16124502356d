//! Endpoint path templates with `:name` placeholders.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped in a substituted path segment.
///
/// Unreserved characters (`- . _ ~`) and alphanumerics pass through; anything
/// that would change the shape of the path (`/`, `?`, `#`, ...) is encoded.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// An endpoint path such as `/apps/:app_id/app_versions/:id`.
///
/// A placeholder is a `:` followed by one or more ASCII word characters
/// (`[A-Za-z0-9_]`). A `:` not followed by a word character is literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathTemplate<'a>(&'a str);

impl<'a> PathTemplate<'a> {
    /// Create a new path template.
    #[must_use]
    pub const fn new(template: &'a str) -> Self {
        Self(template)
    }

    /// Get the template string.
    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.0
    }

    /// Placeholder names, in order of appearance.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&'a str> {
        self.segments()
            .filter_map(|segment| match segment {
                Segment::Placeholder(name) => Some(name),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute every placeholder with the percent-encoded value returned
    /// by `value`.
    ///
    /// # Errors
    ///
    /// Returns the name of the first placeholder for which `value` returns
    /// `None`.
    pub fn render<F>(&self, mut value: F) -> Result<String, &'a str>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut path = String::with_capacity(self.0.len());
        for segment in self.segments() {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder(name) => {
                    let raw = value(name).ok_or(name)?;
                    path.extend(utf8_percent_encode(&raw, PATH_SEGMENT_ENCODE_SET));
                }
            }
        }
        Ok(path)
    }

    fn segments(&self) -> Segments<'a> {
        Segments { rest: self.0 }
    }
}

impl fmt::Display for PathTemplate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        if let Some(after_colon) = self.rest.strip_prefix(':') {
            let len = after_colon
                .find(|c: char| !is_word_char(c))
                .unwrap_or(after_colon.len());
            if len > 0 {
                let (name, rest) = after_colon.split_at(len);
                self.rest = rest;
                return Some(Segment::Placeholder(name));
            }
        }

        // Literal run up to the next colon that starts a placeholder
        let mut end = self.rest.len();
        for (index, _) in self.rest.match_indices(':').filter(|(index, _)| *index > 0) {
            if self
                .rest
                .get(index + 1..)
                .is_some_and(|after| after.starts_with(is_word_char))
            {
                end = index;
                break;
            }
        }
        let (literal, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(Segment::Literal(literal))
    }
}

const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn path_template_placeholders() {
        let template = PathTemplate::new("/apps/:app_id/app_versions/:id");
        assert_eq!(template.placeholders(), vec!["app_id", "id"]);
        assert_eq!(template.as_str(), "/apps/:app_id/app_versions/:id");
    }

    #[test]
    fn path_template_without_placeholders() {
        let template = PathTemplate::new("/auth_tokens");
        assert!(template.placeholders().is_empty());
        assert_eq!(
            template.render(|_| None).expect("no placeholder"),
            "/auth_tokens"
        );
    }

    #[test]
    fn path_template_render() {
        let values = HashMap::from([("app_id", "1234abcd"), ("id", "7")]);
        let template = PathTemplate::new("/apps/:app_id/app_versions/:id");
        let path = template
            .render(|name| values.get(name).map(ToString::to_string))
            .expect("render");
        assert_eq!(path, "/apps/1234abcd/app_versions/7");
    }

    #[test]
    fn path_template_render_encodes_segment() {
        let template = PathTemplate::new("/files/:name");
        let path = template
            .render(|_| Some("a b/c?d".to_string()))
            .expect("render");
        assert_eq!(path, "/files/a%20b%2Fc%3Fd");
    }

    #[test]
    fn path_template_render_missing_value() {
        let template = PathTemplate::new("/items/:id/:rev");
        let missing = template
            .render(|name| (name == "id").then(|| "42".to_string()))
            .expect_err("rev is missing");
        assert_eq!(missing, "rev");
    }

    #[test]
    fn path_template_literal_colons() {
        let template = PathTemplate::new("/v1:batch/:id:cancel/: x");
        assert_eq!(template.placeholders(), vec!["batch", "id", "cancel"]);

        let template = PathTemplate::new("/time/12:/:");
        assert!(template.placeholders().is_empty());
        assert_eq!(template.render(|_| None).expect("literal"), "/time/12:/:");
    }
}
