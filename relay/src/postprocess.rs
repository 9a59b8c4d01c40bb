//! Post-processing of model output
//!
//! Model text goes through a chain of [`TextTransform`] stages before it is
//! returned: segmentation (currently the identity) and then the literal
//! correction table. Knowledge base and cache answers never pass through here.

/// A deterministic, infallible text rewrite
pub trait TextTransform: Send + Sync {
    fn transform(&self, text: &str) -> String;
}

/// Common misspellings and their corrected forms. Applied top to bottom.
const DEFAULT_CORRECTIONS: &[(&str, &str)] = &[
    ("الذى", "الذي"),
    ("فى", "في"),
    ("هذة", "هذه"),
    ("هاذا", "هذا"),
    ("لاكن", "لكن"),
    ("إنشاء الله", "إن شاء الله"),
    ("مسؤل", "مسؤول"),
    ("إستخدام", "استخدام"),
];

/// Ordered literal substring replacement.
///
/// Each rule replaces every occurrence of its pattern in one pass, and sees
/// the output of the rules before it.
#[derive(Debug, Clone)]
pub struct Corrector {
    rules: Vec<(String, String)>,
}

impl Corrector {
    pub fn new(rules: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .filter(|(from, _)| !from.is_empty())
                .collect(),
        }
    }

    pub fn rules(&self) -> &[(String, String)] {
        &self.rules
    }
}

impl Default for Corrector {
    fn default() -> Self {
        Self::new(
            DEFAULT_CORRECTIONS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string())),
        )
    }
}

impl TextTransform for Corrector {
    fn transform(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, (from, to)| acc.replace(from.as_str(), to))
    }
}

/// Language segmentation stage. No segmentation is performed yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter;

impl TextTransform for Segmenter {
    fn transform(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Chain of transforms applied to model output in order
pub struct PostProcessor {
    stages: Vec<Box<dyn TextTransform>>,
}

impl PostProcessor {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage to the chain
    pub fn with_stage(mut self, stage: impl TextTransform + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Default for PostProcessor {
    /// Segmentation followed by the default correction table
    fn default() -> Self {
        Self::new()
            .with_stage(Segmenter)
            .with_stage(Corrector::default())
    }
}

impl TextTransform for PostProcessor {
    fn transform(&self, text: &str) -> String {
        self.stages
            .iter()
            .fold(text.to_string(), |acc, stage| stage.transform(&acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(pairs: &[(&str, &str)]) -> Corrector {
        Corrector::new(pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())))
    }

    #[test]
    fn test_default_table_corrects_multiple_typos() {
        let corrector = Corrector::default();
        assert_eq!(corrector.transform("فى الذى هذة"), "في الذي هذه");
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let corrector = Corrector::default();
        assert_eq!(corrector.transform("فى البيت فى المدرسة"), "في البيت في المدرسة");
    }

    #[test]
    fn test_rule_order_is_significant() {
        // Rule 2 sees the output of rule 1.
        let forward = rules(&[("ab", "b"), ("bb", "c")]);
        assert_eq!(forward.transform("abb"), "c");

        let reversed = rules(&[("bb", "c"), ("ab", "b")]);
        assert_eq!(reversed.transform("abb"), "ac");
    }

    #[test]
    fn test_text_without_typos_is_unchanged() {
        let corrector = Corrector::default();
        let clean = "Rust is a systems language. في الذي هذه";
        assert_eq!(corrector.transform(clean), clean);
    }

    #[test]
    fn test_empty_pattern_rules_are_dropped() {
        let corrector = rules(&[("", "x"), ("a", "b")]);
        assert_eq!(corrector.rules().len(), 1);
        assert_eq!(corrector.transform("aa"), "bb");
    }

    #[test]
    fn test_segmenter_is_identity() {
        assert_eq!(Segmenter.transform("  مرحبا  بك "), "  مرحبا  بك ");
    }

    #[test]
    fn test_default_post_processor_chain() {
        let post = PostProcessor::default();
        assert_eq!(post.len(), 2);
        assert_eq!(post.transform("إنشاء الله فى الغد"), "إن شاء الله في الغد");
    }

    #[test]
    fn test_custom_stage_is_pluggable() {
        struct Upper;
        impl TextTransform for Upper {
            fn transform(&self, text: &str) -> String {
                text.to_uppercase()
            }
        }

        let post = PostProcessor::new()
            .with_stage(rules(&[("teh", "the")]))
            .with_stage(Upper);
        assert_eq!(post.transform("teh end"), "THE END");
        assert!(PostProcessor::new().is_empty());
    }
}
