//! Hawkish / dovish sentiment dictionary for BOK monetary policy text
//!
//! Hawkish terms signal a preference for tightening: inflation pressure,
//! financial imbalances, overheating, hints of rate hikes. Dovish terms signal
//! easing: slowing growth, disinflation, downside risks, hints of cuts or holds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::data::DataResult;

/// Weight given to a matched n-gram phrase
pub const NGRAM_WEIGHT: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Hawkish,
    Dovish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentEntry {
    pub term: String,
    pub polarity: Polarity,
    pub weight: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

impl SentimentEntry {
    pub fn new(term: &str, polarity: Polarity, weight: f64, category: &str, description: &str) -> Self {
        Self {
            term: term.to_string(),
            polarity,
            weight,
            category: category.to_string(),
            description: description.to_string(),
        }
    }
}

/// Dictionary hit: total weight is `entry.weight * count`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermMatch {
    pub term: String,
    pub count: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matches {
    pub hawkish: Vec<TermMatch>,
    pub dovish: Vec<TermMatch>,
}

impl Matches {
    pub fn hawkish_score(&self) -> f64 {
        self.hawkish.iter().map(|m| m.weight).sum()
    }

    pub fn dovish_score(&self) -> f64 {
        self.dovish.iter().map(|m| m.weight).sum()
    }
}

/// Multi-word expression; matches when its tokens occur in order within a sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NGram {
    pub tokens: Vec<String>,
    pub polarity: Polarity,
}

impl NGram {
    fn new(tokens: &[&str], polarity: Polarity) -> Self {
        Self {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            polarity,
        }
    }

    pub fn phrase(&self) -> String {
        self.tokens.join(" ")
    }

    /// Each n-gram token must be contained in a later sentence token than the previous one,
    /// so particles attached to a noun ("물가가") still match ("물가")
    pub fn matches(&self, sentence_tokens: &[&str]) -> bool {
        let mut remaining = sentence_tokens.iter();
        self.tokens
            .iter()
            .all(|wanted| remaining.any(|token| token.contains(wanted.as_str())))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryStats {
    pub total_hawkish: usize,
    pub total_dovish: usize,
    pub total_ngrams: usize,
    pub hawkish_by_category: BTreeMap<String, Vec<String>>,
    pub dovish_by_category: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    hawkish: Vec<SentimentEntry>,
    #[serde(default)]
    dovish: Vec<SentimentEntry>,
}

#[derive(Debug, Clone)]
pub struct SentimentDictionary {
    hawkish_terms: BTreeMap<String, SentimentEntry>,
    dovish_terms: BTreeMap<String, SentimentEntry>,
    ngrams: Vec<NGram>,
}

impl Default for SentimentDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentDictionary {
    /// Dictionary preloaded with the built-in lexicon
    pub fn new() -> Self {
        let mut dictionary = Self::empty();
        dictionary.build_default_dictionary();
        dictionary
    }

    pub fn empty() -> Self {
        Self {
            hawkish_terms: BTreeMap::new(),
            dovish_terms: BTreeMap::new(),
            ngrams: Vec::new(),
        }
    }

    fn build_default_dictionary(&mut self) {
        use Polarity::{Dovish, Hawkish};

        let hawkish_keywords = [
            // Core policy language
            SentimentEntry::new("인상", Hawkish, 2.0, "policy", "금리 인상"),
            SentimentEntry::new("긴축", Hawkish, 2.0, "policy", "긴축 정책"),
            SentimentEntry::new("정상화", Hawkish, 1.5, "policy", "통화정책 정상화"),
            SentimentEntry::new("선제적", Hawkish, 1.2, "policy", "선제적 대응"),
            // Inflation
            SentimentEntry::new("물가상승", Hawkish, 1.8, "inflation", "물가 상승 압력"),
            SentimentEntry::new("상방압력", Hawkish, 1.8, "inflation", "물가 상방 압력"),
            SentimentEntry::new("상방위험", Hawkish, 1.7, "inflation", "상방 위험"),
            SentimentEntry::new("상방리스크", Hawkish, 1.7, "inflation", "상방 리스크"),
            SentimentEntry::new("인플레이션", Hawkish, 1.2, "inflation", "인플레이션 압력"),
            SentimentEntry::new("기대인플레이션", Hawkish, 1.5, "inflation", "기대인플레이션 상승"),
            SentimentEntry::new("물가불안", Hawkish, 1.6, "inflation", "물가 불안정"),
            SentimentEntry::new("물가오름세", Hawkish, 1.5, "inflation", "물가 오름세"),
            // Overheating
            SentimentEntry::new("과열", Hawkish, 1.8, "growth", "경기 과열"),
            SentimentEntry::new("견조", Hawkish, 1.3, "growth", "견조한 성장"),
            SentimentEntry::new("호조", Hawkish, 1.2, "growth", "호조세"),
            SentimentEntry::new("확대", Hawkish, 0.8, "growth", "확대 기조"),
            SentimentEntry::new("개선", Hawkish, 0.7, "growth", "경기 개선"),
            // Financial imbalances
            SentimentEntry::new("금융불균형", Hawkish, 2.0, "financial_stability", "금융 불균형"),
            SentimentEntry::new("가계부채", Hawkish, 1.8, "financial_stability", "가계부채 우려"),
            SentimentEntry::new("부채증가", Hawkish, 1.7, "financial_stability", "부채 증가"),
            SentimentEntry::new("부채누증", Hawkish, 1.8, "financial_stability", "부채 누증"),
            SentimentEntry::new("주택가격", Hawkish, 1.3, "financial_stability", "주택가격 상승"),
            SentimentEntry::new("부동산", Hawkish, 1.0, "financial_stability", "부동산 가격"),
            SentimentEntry::new("레버리지", Hawkish, 1.5, "financial_stability", "레버리지 확대"),
            SentimentEntry::new("자산가격", Hawkish, 1.2, "financial_stability", "자산가격 상승"),
            // Liquidity
            SentimentEntry::new("유동성축소", Hawkish, 1.6, "liquidity", "유동성 축소"),
            SentimentEntry::new("유동성과잉", Hawkish, 1.5, "liquidity", "유동성 과잉"),
            SentimentEntry::new("완화축소", Hawkish, 1.8, "liquidity", "완화 정도 축소"),
            // Strong signals
            SentimentEntry::new("빅스텝", Hawkish, 2.5, "policy", "50bp 인상"),
            SentimentEntry::new("추가인상", Hawkish, 2.2, "policy", "추가 금리 인상"),
        ];

        let dovish_keywords = [
            // Core policy language
            SentimentEntry::new("인하", Dovish, 2.0, "policy", "금리 인하"),
            SentimentEntry::new("완화", Dovish, 1.8, "policy", "완화 기조"),
            SentimentEntry::new("동결", Dovish, 1.2, "policy", "금리 동결"),
            SentimentEntry::new("유지", Dovish, 0.8, "policy", "금리 유지"),
            SentimentEntry::new("지지", Dovish, 1.0, "policy", "경기 지지"),
            // Slowdown
            SentimentEntry::new("둔화", Dovish, 1.8, "growth", "경기 둔화"),
            SentimentEntry::new("부진", Dovish, 1.7, "growth", "경기 부진"),
            SentimentEntry::new("위축", Dovish, 1.8, "growth", "경기 위축"),
            SentimentEntry::new("침체", Dovish, 2.0, "growth", "경기 침체"),
            SentimentEntry::new("하락", Dovish, 1.3, "growth", "성장 하락"),
            SentimentEntry::new("감소", Dovish, 1.2, "growth", "성장 감소"),
            SentimentEntry::new("약화", Dovish, 1.5, "growth", "성장세 약화"),
            SentimentEntry::new("미약", Dovish, 1.4, "growth", "미약한 성장"),
            SentimentEntry::new("저조", Dovish, 1.4, "growth", "저조한 성장"),
            // Downside risks
            SentimentEntry::new("하방위험", Dovish, 1.8, "risk", "하방 위험"),
            SentimentEntry::new("하방리스크", Dovish, 1.8, "risk", "하방 리스크"),
            SentimentEntry::new("하방압력", Dovish, 1.7, "risk", "하방 압력"),
            SentimentEntry::new("하회", Dovish, 1.3, "risk", "목표 하회"),
            // Uncertainty
            SentimentEntry::new("불확실성", Dovish, 1.5, "risk", "불확실성"),
            SentimentEntry::new("불확실", Dovish, 1.4, "risk", "불확실"),
            SentimentEntry::new("리스크", Dovish, 1.0, "risk", "리스크"),
            SentimentEntry::new("우려", Dovish, 1.2, "risk", "우려"),
            SentimentEntry::new("변동성", Dovish, 1.1, "risk", "변동성"),
            // Price stability
            SentimentEntry::new("물가안정", Dovish, 1.5, "inflation", "물가 안정"),
            SentimentEntry::new("안정세", Dovish, 1.3, "inflation", "물가 안정세"),
            SentimentEntry::new("둔화세", Dovish, 1.4, "inflation", "물가 둔화세"),
            // Weak demand
            SentimentEntry::new("수요부진", Dovish, 1.6, "demand", "수요 부진"),
            SentimentEntry::new("소비부진", Dovish, 1.5, "demand", "소비 부진"),
            SentimentEntry::new("투자부진", Dovish, 1.5, "demand", "투자 부진"),
            SentimentEntry::new("수출부진", Dovish, 1.4, "demand", "수출 부진"),
            // External conditions
            SentimentEntry::new("대외불확실성", Dovish, 1.6, "external", "대외 불확실성"),
            SentimentEntry::new("대외여건", Dovish, 1.0, "external", "대외 여건"),
            SentimentEntry::new("글로벌불확실성", Dovish, 1.5, "external", "글로벌 불확실성"),
            // Delayed recovery
            SentimentEntry::new("회복지연", Dovish, 1.7, "growth", "회복 지연"),
            SentimentEntry::new("지연", Dovish, 1.2, "growth", "지연"),
        ];

        for entry in hawkish_keywords {
            self.hawkish_terms.insert(entry.term.clone(), entry);
        }
        for entry in dovish_keywords {
            self.dovish_terms.insert(entry.term.clone(), entry);
        }

        let hawkish_ngrams: [&[&str]; 10] = [
            &["물가", "상승", "압력"],
            &["물가", "상방", "압력"],
            &["금융", "불균형", "누증"],
            &["가계", "부채", "증가"],
            &["통화정책", "완화", "정도", "축소"],
            &["주택", "가격", "상승"],
            &["자산", "가격", "상승"],
            &["기대", "인플레이션", "상승"],
            &["수요", "압력", "확대"],
            &["경기", "과열", "우려"],
        ];
        let dovish_ngrams: [&[&str]; 10] = [
            &["성장", "경로", "하방", "리스크"],
            &["수요", "압력", "약화"],
            &["경기", "회복세", "둔화"],
            &["대외", "여건", "불확실성"],
            &["물가", "안정", "목표", "하회"],
            &["소비", "심리", "위축"],
            &["투자", "심리", "위축"],
            &["수출", "증가세", "둔화"],
            &["성장", "모멘텀", "약화"],
            &["고용", "상황", "악화"],
        ];

        self.ngrams = hawkish_ngrams
            .iter()
            .map(|tokens| NGram::new(tokens, Hawkish))
            .chain(dovish_ngrams.iter().map(|tokens| NGram::new(tokens, Dovish)))
            .collect();

        info!(
            "Loaded default sentiment dictionary: {} hawkish, {} dovish, {} n-grams",
            self.hawkish_terms.len(),
            self.dovish_terms.len(),
            self.ngrams.len()
        );
    }

    pub fn add_hawkish_term(&mut self, term: &str, weight: f64, category: &str, description: &str) {
        let entry = SentimentEntry::new(term, Polarity::Hawkish, weight, category, description);
        self.hawkish_terms.insert(term.to_string(), entry);
    }

    pub fn add_dovish_term(&mut self, term: &str, weight: f64, category: &str, description: &str) {
        let entry = SentimentEntry::new(term, Polarity::Dovish, weight, category, description);
        self.dovish_terms.insert(term.to_string(), entry);
    }

    pub fn hawkish_terms(&self) -> Vec<&str> {
        self.hawkish_terms.keys().map(String::as_str).collect()
    }

    pub fn dovish_terms(&self) -> Vec<&str> {
        self.dovish_terms.keys().map(String::as_str).collect()
    }

    pub fn ngrams(&self) -> &[NGram] {
        &self.ngrams
    }

    /// Polarity and weight of `term`; `(Neutral, 0.0)` when unknown
    pub fn get_weight(&self, term: &str) -> (Polarity, f64) {
        if let Some(entry) = self.hawkish_terms.get(term) {
            (Polarity::Hawkish, entry.weight)
        } else if let Some(entry) = self.dovish_terms.get(term) {
            (Polarity::Dovish, entry.weight)
        } else {
            (Polarity::Neutral, 0.0)
        }
    }

    /// Count non-overlapping occurrences of every term in `text`
    pub fn match_in_text(&self, text: &str) -> Matches {
        let collect = |terms: &BTreeMap<String, SentimentEntry>| {
            terms
                .values()
                .filter_map(|entry| {
                    let count = text.matches(entry.term.as_str()).count();
                    (count > 0).then(|| TermMatch {
                        term: entry.term.clone(),
                        count,
                        weight: entry.weight * count as f64,
                    })
                })
                .collect::<Vec<_>>()
        };

        Matches {
            hawkish: collect(&self.hawkish_terms),
            dovish: collect(&self.dovish_terms),
        }
    }

    /// N-grams present in one sentence's token sequence
    pub fn match_ngrams(&self, sentence_tokens: &[&str]) -> Vec<&NGram> {
        self.ngrams
            .iter()
            .filter(|ngram| ngram.matches(sentence_tokens))
            .collect()
    }

    /// Export to JSON: `{ "hawkish": [...], "dovish": [...] }`
    pub fn save(&self, path: &Path) -> DataResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = DictionaryFile {
            hawkish: self.hawkish_terms.values().cloned().collect(),
            dovish: self.dovish_terms.values().cloned().collect(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;

        info!("Saved sentiment dictionary to {}", path.display());
        Ok(())
    }

    /// Replace the term lists with the contents of `path`. A missing file
    /// leaves the dictionary untouched. N-grams are kept.
    pub fn load(&mut self, path: &Path) -> DataResult<()> {
        if !path.exists() {
            warn!("Sentiment dictionary file not found: {}", path.display());
            return Ok(());
        }

        let file: DictionaryFile = serde_json::from_str(&fs::read_to_string(path)?)?;

        self.hawkish_terms = file
            .hawkish
            .into_iter()
            .map(|mut e| {
                e.polarity = Polarity::Hawkish;
                (e.term.clone(), e)
            })
            .collect();
        self.dovish_terms = file
            .dovish
            .into_iter()
            .map(|mut e| {
                e.polarity = Polarity::Dovish;
                (e.term.clone(), e)
            })
            .collect();

        info!(
            "Loaded sentiment dictionary: {} hawkish, {} dovish",
            self.hawkish_terms.len(),
            self.dovish_terms.len()
        );
        Ok(())
    }

    pub fn statistics(&self) -> DictionaryStats {
        let by_category = |terms: &BTreeMap<String, SentimentEntry>| {
            let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for entry in terms.values() {
                let category = if entry.category.is_empty() { "기타" } else { entry.category.as_str() };
                grouped.entry(category.to_string()).or_default().push(entry.term.clone());
            }
            grouped
        };

        DictionaryStats {
            total_hawkish: self.hawkish_terms.len(),
            total_dovish: self.dovish_terms.len(),
            total_ngrams: self.ngrams.len(),
            hawkish_by_category: by_category(&self.hawkish_terms),
            dovish_by_category: by_category(&self.dovish_terms),
        }
    }
}
