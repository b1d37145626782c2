//! Keyword heuristics that route queries and mark plan steps.
//!
//! Plain case-insensitive substring checks; keywords are word stems so that
//! inflected forms match.

/// A user query containing any of these skips planning and searches directly.
pub const DIRECT_SEARCH_KEYWORDS: &[&str] = &["найди", "поиск", "узнай"];

/// A plan line containing any of these needs a web search.
pub const PLAN_SEARCH_KEYWORDS: &[&str] = &["поиск", "найти", "найди", "информац"];

pub fn is_direct_search(query: &str) -> bool {
    contains_any(query, DIRECT_SEARCH_KEYWORDS)
}

pub fn classify_needs_search(line: &str) -> bool {
    contains_any(line, PLAN_SEARCH_KEYWORDS)
}

/// Sub-query of a search step: the words after the first run of keyword
/// words, with a leading colon dropped. A keyword glued to its argument with a
/// colon (`Поиск:коты`) ends the run there and the argument starts the query.
/// Falls back to the whole line when nothing meaningful follows the keywords.
pub fn extract_search_query(line: &str) -> String {
    let words: Vec<&str> = line.split_whitespace().collect();
    let is_keyword = |word: &str| contains_any(word, PLAN_SEARCH_KEYWORDS);

    let Some(first) = words.iter().position(|w| is_keyword(w)) else {
        return line.trim().to_string();
    };

    let mut rest = &words[first..];
    let mut glued = None;
    while let Some((&word, tail)) = rest.split_first() {
        if !is_keyword(word) {
            break;
        }
        rest = tail;
        if let Some((_, after)) = word.split_once(':') {
            if after.chars().any(char::is_alphanumeric) {
                glued = Some(after);
                break;
            }
        }
    }

    let rest = glued
        .into_iter()
        .chain(rest.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    let rest = rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
    if rest.chars().any(char::is_alphanumeric) {
        rest.to_string()
    } else {
        line.trim().to_string()
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|keyword| lower.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_search_is_detected_case_insensitively() {
        assert!(is_direct_search("Найди рецепт борща"));
        assert!(is_direct_search("ПОИСК: погода в Москве"));
        assert!(is_direct_search("узнай курс евро"));
        assert!(!is_direct_search("Как приготовить борщ?"));
        assert!(!is_direct_search(""));
    }

    #[test]
    fn plan_lines_are_classified_by_stem() {
        assert!(classify_needs_search("Найди информацию о котах"));
        assert!(classify_needs_search("2. Выполнить поиск статей"));
        assert!(classify_needs_search("Собрать информацию"));
        assert!(!classify_needs_search("Ответь вежливо"));
    }

    #[test]
    fn query_follows_the_keyword_run() {
        assert_eq!(extract_search_query("Найди информацию о котах"), "о котах");
        assert_eq!(extract_search_query("Поиск: лучшие книги 2024"), "лучшие книги 2024");
        assert_eq!(extract_search_query("1. Выполнить поиск  :  рецепты   пиццы"), "рецепты пиццы");
    }

    #[test]
    fn keyword_glued_to_its_argument_keeps_the_whole_argument() {
        assert_eq!(extract_search_query("1. Найти:рецепт борща"), "рецепт борща");
        assert_eq!(extract_search_query("Поиск:коты"), "коты");
        assert_eq!(extract_search_query("Найти информацию:погода в Казани"), "погода в Казани");
    }

    #[test]
    fn query_falls_back_to_the_line() {
        assert_eq!(extract_search_query("  Найти информацию:  "), "Найти информацию:");
        assert_eq!(extract_search_query("Ответь вежливо"), "Ответь вежливо");
    }
}
