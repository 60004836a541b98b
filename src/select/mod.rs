use crate::source::TranscriptVariant;
use crate::{Result, YtxError};

/// One entry of the auto-selection preference table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecedenceRule {
    pub is_generated: bool,
    pub language_prefix: &'static str,
}

impl PrecedenceRule {
    const fn new(is_generated: bool, language_prefix: &'static str) -> Self {
        Self {
            is_generated,
            language_prefix,
        }
    }

    /// Prefix match on the language code, so `en` also accepts `en-US`.
    pub fn matches(&self, variant: &TranscriptVariant) -> bool {
        variant.is_generated == self.is_generated
            && variant.language_code.starts_with(self.language_prefix)
    }
}

/// Auto-selection order, most preferred first
pub const PRECEDENCE: &[PrecedenceRule] = &[
    PrecedenceRule::new(false, "pl"),
    PrecedenceRule::new(false, "en"),
    PrecedenceRule::new(true, "pl"),
    PrecedenceRule::new(true, "en"),
];

/// Pick the variant at a zero-based position in listing order
pub fn select_by_index(variants: &[TranscriptVariant], index: i64) -> Result<&TranscriptVariant> {
    usize::try_from(index)
        .ok()
        .and_then(|i| variants.get(i))
        .ok_or(YtxError::OutOfRange {
            index,
            max: variants.len().saturating_sub(1),
        })
}

/// Pick the first variant matching the earliest rule of [`PRECEDENCE`].
///
/// Within one rule, listing order decides.
pub fn select_by_precedence(variants: &[TranscriptVariant]) -> Option<&TranscriptVariant> {
    select_with_rules(variants, PRECEDENCE)
}

fn select_with_rules<'a>(
    variants: &'a [TranscriptVariant],
    rules: &[PrecedenceRule],
) -> Option<&'a TranscriptVariant> {
    rules
        .iter()
        .find_map(|rule| variants.iter().find(|variant| rule.matches(variant)))
}
