//! BOK Tone Index
//!
//! Every sentence is scored against the sentiment dictionary and labelled
//! hawkish, dovish or neutral. The document tone is
//! `(hawkish - dovish) / (hawkish + dovish)` over labelled sentences, in [-1, 1].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::dictionary::{Polarity, SentimentDictionary, NGRAM_WEIGHT};
use super::preprocessor::TextPreprocessor;

/// Number of strongest terms reported per document
const TOP_TERMS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceTone {
    pub hawkish_score: f64,
    pub dovish_score: f64,
    pub label: Polarity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneResult {
    /// Sentence-count tone index in [-1, 1]
    pub tone_index: f64,
    /// Weight-based tone index in [-1, 1]
    pub weighted_tone: f64,
    pub hawkish_score: f64,
    pub dovish_score: f64,
    pub hawkish_sentences: usize,
    pub dovish_sentences: usize,
    pub neutral_sentences: usize,
    /// Strongest contributors; hawkish weights positive, dovish negative
    pub top_terms: Vec<(String, f64)>,
}

impl ToneResult {
    pub fn sentence_count(&self) -> usize {
        self.hawkish_sentences + self.dovish_sentences + self.neutral_sentences
    }

    pub fn stance(&self) -> &'static str {
        interpret_tone(self.tone_index)
    }
}

/// Human-readable reading of a tone index
pub fn interpret_tone(tone: f64) -> &'static str {
    if tone > 0.3 {
        "Hawkish"
    } else if tone > 0.1 {
        "Slightly Hawkish"
    } else if tone >= -0.1 {
        "Neutral"
    } else if tone >= -0.3 {
        "Slightly Dovish"
    } else {
        "Dovish"
    }
}

/// `(a - b) / (a + b)`, 0 when both are zero
fn balance(a: f64, b: f64) -> f64 {
    let total = a + b;
    if total <= 0.0 {
        0.0
    } else {
        (a - b) / total
    }
}

pub struct ToneAnalyzer {
    dictionary: SentimentDictionary,
    preprocessor: TextPreprocessor,
}

impl Default for ToneAnalyzer {
    fn default() -> Self {
        Self::new(SentimentDictionary::new())
    }
}

impl ToneAnalyzer {
    pub fn new(dictionary: SentimentDictionary) -> Self {
        Self {
            dictionary,
            preprocessor: TextPreprocessor::new(),
        }
    }

    pub fn dictionary(&self) -> &SentimentDictionary {
        &self.dictionary
    }

    /// Score a single cleaned sentence, accumulating term weights into `terms`
    fn score_sentence(&self, sentence: &str, terms: &mut HashMap<String, f64>) -> SentenceTone {
        let compacted = self.preprocessor.compact(sentence);
        let matches = self.dictionary.match_in_text(&compacted);

        let mut hawkish_score = matches.hawkish_score();
        let mut dovish_score = matches.dovish_score();

        for m in &matches.hawkish {
            *terms.entry(m.term.clone()).or_default() += m.weight;
        }
        for m in &matches.dovish {
            *terms.entry(m.term.clone()).or_default() -= m.weight;
        }

        let tokens = self.preprocessor.tokens(sentence);
        for ngram in self.dictionary.match_ngrams(&tokens) {
            match ngram.polarity {
                Polarity::Hawkish => {
                    hawkish_score += NGRAM_WEIGHT;
                    *terms.entry(ngram.phrase()).or_default() += NGRAM_WEIGHT;
                }
                Polarity::Dovish => {
                    dovish_score += NGRAM_WEIGHT;
                    *terms.entry(ngram.phrase()).or_default() -= NGRAM_WEIGHT;
                }
                Polarity::Neutral => {}
            }
        }

        let label = if hawkish_score > dovish_score {
            Polarity::Hawkish
        } else if dovish_score > hawkish_score {
            Polarity::Dovish
        } else {
            Polarity::Neutral
        };

        SentenceTone {
            hawkish_score,
            dovish_score,
            label,
        }
    }

    pub fn analyze_sentence(&self, sentence: &str) -> SentenceTone {
        let cleaned = self.preprocessor.clean(sentence);
        self.score_sentence(&cleaned, &mut HashMap::new())
    }

    pub fn analyze_document(&self, text: &str) -> ToneResult {
        let mut terms: HashMap<String, f64> = HashMap::new();
        let mut hawkish_score = 0.0;
        let mut dovish_score = 0.0;
        let (mut hawkish_sentences, mut dovish_sentences, mut neutral_sentences) = (0, 0, 0);

        for sentence in self.preprocessor.split_sentences(text) {
            let tone = self.score_sentence(&sentence, &mut terms);
            hawkish_score += tone.hawkish_score;
            dovish_score += tone.dovish_score;
            match tone.label {
                Polarity::Hawkish => hawkish_sentences += 1,
                Polarity::Dovish => dovish_sentences += 1,
                Polarity::Neutral => neutral_sentences += 1,
            }
        }

        let mut top_terms: Vec<(String, f64)> = terms.into_iter().filter(|(_, w)| *w != 0.0).collect();
        top_terms.sort_by(|a, b| {
            b.1.abs()
                .total_cmp(&a.1.abs())
                .then_with(|| a.0.cmp(&b.0))
        });
        top_terms.truncate(TOP_TERMS);

        ToneResult {
            tone_index: balance(hawkish_sentences as f64, dovish_sentences as f64),
            weighted_tone: balance(hawkish_score, dovish_score),
            hawkish_score,
            dovish_score,
            hawkish_sentences,
            dovish_sentences,
            neutral_sentences,
            top_terms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "위원들은 물가상승 압력이 예상보다 높은 수준을 지속하고 있으며,
        가계부채 증가와 금융불균형 누증에 대한 우려를 표명하였다.
        다만 대외 불확실성이 높은 상황에서 경기 회복세 둔화 가능성도
        염두에 둘 필요가 있다는 의견도 제시되었다.";

    #[test]
    fn test_sentence_labels() {
        let analyzer = ToneAnalyzer::default();
        assert_eq!(analyzer.analyze_sentence("추가 인상 필요성과 긴축 기조 유지").label, Polarity::Hawkish);
        assert_eq!(analyzer.analyze_sentence("경기 침체와 수요 부진 우려").label, Polarity::Dovish);
        assert_eq!(analyzer.analyze_sentence("위원회는 회의를 개최하였다").label, Polarity::Neutral);
    }

    #[test]
    fn test_spaced_compounds_match() {
        let analyzer = ToneAnalyzer::default();
        let tone = analyzer.analyze_sentence("물가 불안 지속");
        assert!((tone.hawkish_score - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_sample_document() {
        let analyzer = ToneAnalyzer::default();
        let result = analyzer.analyze_document(SAMPLE);

        assert_eq!(result.sentence_count(), 2);
        assert_eq!(result.hawkish_sentences, 1);
        assert_eq!(result.dovish_sentences, 1);
        assert_eq!(result.tone_index, 0.0);
        assert!(result.weighted_tone > -1.0 && result.weighted_tone < 1.0);
        assert!(result.top_terms.len() <= TOP_TERMS);
        assert!(result.top_terms.iter().any(|(term, w)| term == "금융불균형" && *w > 0.0));
        assert!(result.top_terms.iter().any(|(_, w)| *w < 0.0));
    }

    #[test]
    fn test_empty_document_is_neutral() {
        let result = ToneAnalyzer::default().analyze_document("");
        assert_eq!(result.tone_index, 0.0);
        assert_eq!(result.weighted_tone, 0.0);
        assert_eq!(result.sentence_count(), 0);
        assert!(result.top_terms.is_empty());
    }

    #[test]
    fn test_one_sided_document() {
        let text = "금리 인상이 필요하다. 긴축 기조를 강화해야 한다. 회의는 오전에 열렸다.";
        let result = ToneAnalyzer::default().analyze_document(text);
        assert_eq!(result.hawkish_sentences, 2);
        assert_eq!(result.neutral_sentences, 1);
        assert_eq!(result.tone_index, 1.0);
        assert_eq!(result.stance(), "Hawkish");
    }

    #[test]
    fn test_interpret_tone_bands() {
        assert_eq!(interpret_tone(0.5), "Hawkish");
        assert_eq!(interpret_tone(0.2), "Slightly Hawkish");
        assert_eq!(interpret_tone(0.0), "Neutral");
        assert_eq!(interpret_tone(-0.2), "Slightly Dovish");
        assert_eq!(interpret_tone(-0.9), "Dovish");
    }
}
