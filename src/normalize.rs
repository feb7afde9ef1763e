//! Identity normalization for free-text store, facility, and channel labels.
//!
//! The two ledgers are maintained by hand in spreadsheets, so the same store
//! shows up with combining-form kana, stray half-width spaces, or ideographic
//! spaces depending on who typed it. `canonical_key` collapses all of those
//! variants onto one comparison key; `ChannelRules` then maps the key onto a
//! small closed set of booking channels, falling through to the key itself
//! for labels the business has not tagged yet.

use unicode_normalization::UnicodeNormalization;

/// Produces the canonical comparison key for a raw label: NFC composition,
/// then removal of every whitespace character (including U+3000).
///
/// Idempotent: feeding a canonical key back in returns it unchanged.
pub fn canonical_key(raw: &str) -> String {
    raw.nfc().filter(|c| !c.is_whitespace()).collect()
}

/// One classification rule: if the canonical key contains any of the marker
/// substrings, the label belongs to `canonical`.
#[derive(Debug, Clone)]
pub struct ChannelRule {
    pub markers: Vec<String>,
    pub canonical: String,
}

/// Ordered first-match-wins channel classifier.
///
/// The rule list is evaluated top to bottom; an unmatched label classifies as
/// its own canonical key (open class). The first rule's canonical name is the
/// primary in-house channel, which the aggregator treats as authoritative for
/// the partial current month.
#[derive(Debug, Clone)]
pub struct ChannelRules {
    rules: Vec<ChannelRule>,
}

impl Default for ChannelRules {
    fn default() -> Self {
        let rule = |markers: &[&str], canonical: &str| ChannelRule {
            markers: markers.iter().map(|m| m.to_string()).collect(),
            canonical: canonical.to_string(),
        };
        Self {
            rules: vec![
                rule(&["roomly", "meeting room"], "Roomly"),
                rule(&["insta"], "Instabase"),
                rule(&["spacee"], "Spacee"),
                rule(&["spacemarket", "spacemkt"], "SpaceMarket"),
            ],
        }
    }
}

impl ChannelRules {
    pub fn new(rules: Vec<ChannelRule>) -> Self {
        Self { rules }
    }

    /// The authoritative in-house booking channel.
    pub fn primary(&self) -> &str {
        &self.rules[0].canonical
    }

    /// The closed set of channels that get their own column in event-mode
    /// aggregation, in presentation order.
    pub fn canonical_channels(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.canonical.clone()).collect()
    }

    /// Maps a raw channel label to its canonical channel name.
    ///
    /// Matching is case-insensitive substring containment over the canonical
    /// key; the first rule that matches wins. Unrecognized labels pass
    /// through as their own canonical key, never an error.
    pub fn classify(&self, raw: &str) -> String {
        let key = canonical_key(raw);
        let haystack = key.to_lowercase();
        for rule in &self.rules {
            for marker in &rule.markers {
                if haystack.contains(&canonical_key(marker).to_lowercase()) {
                    return rule.canonical.clone();
                }
            }
        }
        key
    }

    pub fn is_primary(&self, channel: &str) -> bool {
        channel == self.primary()
    }
}
