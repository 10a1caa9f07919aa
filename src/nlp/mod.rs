pub mod dictionary;
pub mod preprocessor;
pub mod tone;

pub use dictionary::{DictionaryStats, Polarity, SentimentDictionary, NGRAM_WEIGHT};
pub use preprocessor::TextPreprocessor;
pub use tone::{interpret_tone, SentenceTone, ToneAnalyzer, ToneResult};
