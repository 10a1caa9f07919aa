//! Text normalization for minutes extracted from PDF

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Page markers inserted during extraction, e.g. "--- 페이지 3 ---"
    static ref PAGE_MARKER: Regex = Regex::new(r"-{3}\s*페이지\s*\d+\s*-{3}")
        .expect("Failed to compile PAGE_MARKER regex - this is a bug in the hardcoded pattern");

    /// Anything other than Hangul, ASCII alphanumerics, '.', '%' and whitespace
    static ref NON_TEXT: Regex = Regex::new(r"[^가-힣A-Za-z0-9.%\s]")
        .expect("Failed to compile NON_TEXT regex - this is a bug in the hardcoded pattern");

    static ref WHITESPACE: Regex = Regex::new(r"\s+")
        .expect("Failed to compile WHITESPACE regex - this is a bug in the hardcoded pattern");

    /// Sentence terminator followed by whitespace or end of text
    static ref SENTENCE_END: Regex = Regex::new(r"[.?!]+(?:\s+|$)")
        .expect("Failed to compile SENTENCE_END regex - this is a bug in the hardcoded pattern");
}

const MIN_SENTENCE_CHARS: usize = 5;

#[derive(Debug, Default, Clone, Copy)]
pub struct TextPreprocessor;

impl TextPreprocessor {
    pub fn new() -> Self {
        Self
    }

    pub fn strip_page_markers(&self, text: &str) -> String {
        PAGE_MARKER.replace_all(text, " ").into_owned()
    }

    /// Remove page markers and symbols, collapse whitespace
    pub fn clean(&self, text: &str) -> String {
        let without_markers = self.strip_page_markers(text);
        let text_only = NON_TEXT.replace_all(&without_markers, " ");
        WHITESPACE.replace_all(&text_only, " ").trim().to_string()
    }

    /// Split into cleaned sentences, dropping fragments shorter than 5 chars
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        let without_markers = self.strip_page_markers(text);
        SENTENCE_END
            .split(&without_markers)
            .map(|sentence| self.clean(sentence))
            .filter(|sentence| sentence.chars().count() >= MIN_SENTENCE_CHARS)
            .collect()
    }

    /// Drop all whitespace so "물가 상승" matches the compound "물가상승"
    pub fn compact(&self, text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    pub fn tokens<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_whitespace().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_markers_and_symbols() {
        let pre = TextPreprocessor::new();
        let cleaned = pre.clean("--- 페이지 1 ---\n  □ 물가상승률은 「2.1%」로\n\t둔화*");
        assert_eq!(cleaned, "물가상승률은 2.1% 로 둔화");
    }

    #[test]
    fn test_split_sentences_keeps_decimals() {
        let pre = TextPreprocessor::new();
        let text = "성장률은 1.9%로 전망되었다. 물가는\n안정세를 보였다! 끝. 가계부채가 증가하였다";
        let sentences = pre.split_sentences(text);
        assert_eq!(
            sentences,
            vec![
                "성장률은 1.9%로 전망되었다".to_string(),
                "물가는 안정세를 보였다".to_string(),
                "가계부채가 증가하였다".to_string(),
            ]
        );
    }

    #[test]
    fn test_compact_and_tokens() {
        let pre = TextPreprocessor::new();
        assert_eq!(pre.compact("물가 상승 압력"), "물가상승압력");
        assert_eq!(pre.tokens(" 대외 여건  불확실성 "), vec!["대외", "여건", "불확실성"]);
    }
}
