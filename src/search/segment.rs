use super::{source_from_url, SearchResult};

const BULLETS: [&str; 4] = ["- ", "* ", "• ", "– "];

/// Characters trimmed from a title once the URL is cut out of its line.
const TITLE_SEPARATORS: &[char] = &['-', '–', '—', ':', '|', '(', ')', '[', ']', '*', '.', ',', ' '];

/// Cuts free-form provider text into search results.
///
/// A line that starts with a list marker or carries a URL opens a new result;
/// any other non-blank line extends the current snippet. Text without a single
/// marker comes back whole as one result.
pub fn segment_into_results(text: &str) -> Vec<SearchResult> {
    let mut results = Vec::new();
    let mut current: Option<Draft> = None;
    let mut saw_marker = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(body) = marker_body(line) {
            saw_marker = true;
            if let Some(draft) = current.take() {
                results.extend(draft.finish());
            }
            current = Some(Draft::start(body));
        } else {
            current.get_or_insert_with(Draft::default).push(line);
        }
    }

    if !saw_marker {
        let full = text.trim();
        if full.is_empty() {
            return Vec::new();
        }
        return vec![SearchResult::from_snippet(full)];
    }

    if let Some(draft) = current {
        results.extend(draft.finish());
    }
    results
}

#[derive(Debug, Default)]
struct Draft {
    title: Option<String>,
    url: Option<String>,
    snippet: String,
}

impl Draft {
    fn start(body: &str) -> Self {
        match find_url(body) {
            Some((start, end)) => {
                let title = format!("{} {}", &body[..start], &body[end..]);
                let title = title.trim_matches(TITLE_SEPARATORS).trim();
                Self {
                    title: (!title.is_empty()).then(|| title.to_string()),
                    url: Some(body[start..end].to_string()),
                    snippet: String::new(),
                }
            }
            None => Self {
                snippet: body.to_string(),
                ..Self::default()
            },
        }
    }

    fn push(&mut self, line: &str) {
        if !self.snippet.is_empty() {
            self.snippet.push(' ');
        }
        self.snippet.push_str(line);
    }

    fn finish(self) -> Option<SearchResult> {
        let snippet = if self.snippet.is_empty() {
            self.title.clone().or_else(|| self.url.clone())?
        } else {
            self.snippet
        };
        let source = self.url.as_deref().and_then(source_from_url);

        Some(SearchResult {
            title: self.title,
            url: self.url,
            snippet,
            source,
        })
    }
}

/// The text after a list marker, or the whole line if it carries a URL.
fn marker_body(line: &str) -> Option<&str> {
    strip_list_marker(line).or_else(|| find_url(line).map(|_| line))
}

fn strip_list_marker(line: &str) -> Option<&str> {
    for bullet in BULLETS {
        if let Some(rest) = line.strip_prefix(bullet) {
            return Some(rest.trim_start());
        }
    }

    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if (1..=3).contains(&digits) {
        let rest = &line[digits..];
        if let Some(after) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if after.starts_with(char::is_whitespace) {
                return Some(after.trim_start());
            }
        }
    }
    None
}

/// Byte range of the first http(s) URL in `line`.
fn find_url(line: &str) -> Option<(usize, usize)> {
    let start = match (line.find("https://"), line.find("http://")) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b)?,
    };
    let tail = &line[start..];
    let len = tail
        .find(|c: char| c.is_whitespace() || matches!(c, ')' | ']' | '>' | '"' | '\''))
        .unwrap_or(tail.len());
    let url = tail[..len].trim_end_matches(['.', ',', ';', ':']);
    Some((start, start + url.len()))
}
