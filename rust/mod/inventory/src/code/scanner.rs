//! Keyboard-wedge scan classifier.
//!
//! Barcode and QR scanners present themselves as keyboards. The only way
//! to tell a scan from a person typing into the same input is timing: a
//! scanner delivers its characters in a burst, a few milliseconds apart,
//! then presses Enter. [`ScanClassifier`] buffers characters while they
//! keep arriving within the burst gap, throws the buffer away when a gap
//! is too long, and classifies the buffer when Enter arrives.
//!
//! Each classifier owns its buffer and clock, so independent scanning
//! contexts (two packing stations on one host, say) never see each
//! other's keystrokes.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ident::{CODE_PREFIX, ORDER_PREFIX, RACK_PREFIX};
use super::payload::{self, ScanEvent, ScanKind};

/// Buffers shorter than this never produce a scan, whatever the config says.
pub const MIN_SCAN_LEN: usize = 3;

/// Longest burst gap a config may set. Past this, ordinary typing reads as a scan.
pub const MAX_BURST_GAP_MS: u64 = 1000;

/// Timing and length thresholds for a classifier.
///
/// Deserializing checks the values, so a config file cannot lower the
/// length floor below [`MIN_SCAN_LEN`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawScannerConfig")]
pub struct ScannerConfig {
    /// Longest pause between two keystrokes of the same scan burst.
    pub burst_gap_ms: u64,

    /// Shortest buffer Enter turns into a scan. Shorter buffers are
    /// stray Enter presses.
    pub min_scan_len: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            burst_gap_ms: 100,
            min_scan_len: 3,
        }
    }
}

impl ScannerConfig {
    pub fn burst_gap(&self) -> Duration {
        Duration::from_millis(self.burst_gap_ms)
    }

    /// Length floor actually applied. Never below [`MIN_SCAN_LEN`], even for
    /// a config built in code without [`validate`](Self::validate).
    pub fn min_len(&self) -> usize {
        self.min_scan_len.max(MIN_SCAN_LEN)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_scan_len < MIN_SCAN_LEN {
            return Err(format!(
                "min_scan_len must be at least {MIN_SCAN_LEN}, got {}",
                self.min_scan_len
            ));
        }
        if self.burst_gap_ms == 0 || self.burst_gap_ms > MAX_BURST_GAP_MS {
            return Err(format!(
                "burst_gap_ms must be between 1 and {MAX_BURST_GAP_MS}, got {}",
                self.burst_gap_ms
            ));
        }
        Ok(())
    }
}

/// Unchecked wire form of [`ScannerConfig`].
#[derive(Deserialize)]
#[serde(default)]
struct RawScannerConfig {
    burst_gap_ms: u64,
    min_scan_len: usize,
}

impl Default for RawScannerConfig {
    fn default() -> Self {
        let ScannerConfig {
            burst_gap_ms,
            min_scan_len,
        } = ScannerConfig::default();
        Self {
            burst_gap_ms,
            min_scan_len,
        }
    }
}

impl TryFrom<RawScannerConfig> for ScannerConfig {
    type Error = String;

    fn try_from(raw: RawScannerConfig) -> Result<Self, Self::Error> {
        let config = ScannerConfig {
            burst_gap_ms: raw.burst_gap_ms,
            min_scan_len: raw.min_scan_len,
        };
        config.validate()?;
        Ok(config)
    }
}

/// A raw key event as delivered by the host's keyboard hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A key producing one character.
    Char(char),
    /// The scan terminator.
    Enter,
    /// Arrows, modifiers, function keys: anything else.
    Other,
}

/// Per-context scan state machine.
///
/// Idle while the buffer is empty, accumulating otherwise.
#[derive(Debug)]
pub struct ScanClassifier {
    config: ScannerConfig,
    buffer: String,
    last_key_at: Option<Instant>,
}

impl Default for ScanClassifier {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}

impl ScanClassifier {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            buffer: String::new(),
            last_key_at: None,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// True when no partial scan is buffered.
    pub fn is_idle(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Characters currently buffered.
    pub fn pending_len(&self) -> usize {
        self.buffer.chars().count()
    }

    /// Feed one key event observed at `at`.
    ///
    /// Returns the classified scan when `key` is Enter and the buffer is
    /// long enough. At most one event per Enter.
    pub fn handle_key(&mut self, key: Key, at: Instant) -> Option<ScanEvent> {
        match key {
            Key::Char(ch) if !ch.is_control() => {
                self.push_char(ch, at);
                None
            }
            Key::Enter => self.finish(),
            Key::Char(_) | Key::Other => None,
        }
    }

    /// Feed a whole line as one burst at `at`, then Enter.
    ///
    /// For line-buffered sources (a scanner attached to a terminal) where
    /// per-key timing is not observable.
    pub fn feed_line(&mut self, line: &str, at: Instant) -> Option<ScanEvent> {
        for ch in line.trim_end_matches(['\r', '\n']).chars() {
            self.handle_key(Key::Char(ch), at);
        }
        self.handle_key(Key::Enter, at)
    }

    /// Drop any partial scan. Call when the scanning context goes away so
    /// a half-read burst cannot complete after reactivation.
    pub fn deactivate(&mut self) {
        if !self.buffer.is_empty() {
            debug!(pending = self.pending_len(), "scanner deactivated with partial buffer");
        }
        self.buffer.clear();
        self.last_key_at = None;
    }

    fn push_char(&mut self, ch: char, at: Instant) {
        if let Some(last) = self.last_key_at {
            let gap = at.saturating_duration_since(last);
            if !self.buffer.is_empty() && gap > self.config.burst_gap() {
                debug!(
                    discarded = self.pending_len(),
                    gap_ms = gap.as_millis() as u64,
                    "keystroke gap exceeds burst window, treating buffer as typing"
                );
                self.buffer.clear();
            }
        }
        self.buffer.push(ch);
        self.last_key_at = Some(at);
    }

    fn finish(&mut self) -> Option<ScanEvent> {
        let buffered = std::mem::take(&mut self.buffer);
        if buffered.chars().count() < self.config.min_len() {
            return None;
        }
        classify(&buffered)
    }
}

/// Classify one completed scan buffer.
///
/// Prefixes are matched on the trimmed, upper-cased text; anything
/// carrying braces is tried as a QR payload with its case intact. Text
/// that matches nothing is a legacy barcode and counts as a product.
/// Blank input is not a scan.
pub fn classify(raw: &str) -> Option<ScanEvent> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = trimmed.to_uppercase();

    if value.starts_with(RACK_PREFIX) {
        return Some(ScanEvent::new(ScanKind::Rack, value));
    }
    if value.starts_with(ORDER_PREFIX) {
        return Some(ScanEvent::new(ScanKind::Order, value));
    }
    if value.starts_with(CODE_PREFIX) {
        return Some(ScanEvent::new(ScanKind::Product, value));
    }

    if trimmed.contains('{') && trimmed.contains('}') {
        let decoded = payload::decode(trimmed);
        if decoded.is_none() {
            warn!(payload = %trimmed, "dropping QR payload without a recognized identifier");
        }
        return decoded;
    }

    Some(ScanEvent::new(ScanKind::Product, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_GAP: Duration = Duration::from_millis(8);

    /// Type `text` as a scanner burst starting at `start`, then Enter.
    fn scan(classifier: &mut ScanClassifier, text: &str, start: Instant) -> Option<ScanEvent> {
        let mut at = start;
        for ch in text.chars() {
            assert_eq!(classifier.handle_key(Key::Char(ch), at), None);
            at += KEY_GAP;
        }
        classifier.handle_key(Key::Enter, at)
    }

    fn scan_fresh(text: &str) -> Option<ScanEvent> {
        scan(&mut ScanClassifier::default(), text, Instant::now())
    }

    #[test]
    fn rack_label() {
        assert_eq!(scan_fresh("RACK-A3"), Some(ScanEvent::new(ScanKind::Rack, "RACK-A3")));
    }

    #[test]
    fn lower_case_product_code_is_upper_cased() {
        assert_eq!(
            scan_fresh("gg-bk-gita-00101"),
            Some(ScanEvent::new(ScanKind::Product, "GG-BK-GITA-00101"))
        );
    }

    #[test]
    fn order_label() {
        assert_eq!(scan_fresh("ord-55"), Some(ScanEvent::new(ScanKind::Order, "ORD-55")));
    }

    #[test]
    fn qr_json_payload() {
        assert_eq!(
            scan_fresh(r#"{"rackId":"RACK-B1"}"#),
            Some(ScanEvent::new(ScanKind::Rack, "RACK-B1"))
        );
    }

    #[test]
    fn short_buffer_emits_nothing() {
        let mut classifier = ScanClassifier::default();
        assert_eq!(scan(&mut classifier, "ab", Instant::now()), None);
        assert!(classifier.is_idle());
    }

    #[test]
    fn bare_ean_defaults_to_product() {
        assert_eq!(
            scan_fresh("9780131103627"),
            Some(ScanEvent::new(ScanKind::Product, "9780131103627"))
        );
    }

    #[test]
    fn three_chars_is_enough() {
        assert_eq!(scan_fresh("abc"), Some(ScanEvent::new(ScanKind::Product, "ABC")));
    }

    #[test]
    fn bare_enter_emits_nothing() {
        let mut classifier = ScanClassifier::default();
        assert_eq!(classifier.handle_key(Key::Enter, Instant::now()), None);
    }

    #[test]
    fn slow_gap_discards_stale_typing() {
        let mut classifier = ScanClassifier::default();
        let t0 = Instant::now();

        // Someone types "xy" slowly into the same field...
        classifier.handle_key(Key::Char('x'), t0);
        classifier.handle_key(Key::Char('y'), t0 + Duration::from_millis(300));
        assert_eq!(classifier.pending_len(), 1, "y started a fresh buffer");

        // ...then a scanner fires well after the last keystroke.
        let burst = t0 + Duration::from_millis(900);
        assert_eq!(
            scan(&mut classifier, "RACK-A3", burst),
            Some(ScanEvent::new(ScanKind::Rack, "RACK-A3"))
        );
    }

    #[test]
    fn gap_equal_to_threshold_keeps_buffer() {
        let mut classifier = ScanClassifier::default();
        let t0 = Instant::now();
        classifier.handle_key(Key::Char('o'), t0);
        classifier.handle_key(Key::Char('r'), t0 + Duration::from_millis(100));
        classifier.handle_key(Key::Char('d'), t0 + Duration::from_millis(200));
        assert_eq!(classifier.pending_len(), 3);
    }

    #[test]
    fn gap_over_threshold_resets_to_new_key() {
        let mut classifier = ScanClassifier::default();
        let t0 = Instant::now();
        classifier.handle_key(Key::Char('o'), t0);
        classifier.handle_key(Key::Char('r'), t0 + Duration::from_millis(101));
        assert_eq!(classifier.pending_len(), 1);
    }

    #[test]
    fn non_printable_keys_are_ignored() {
        let mut classifier = ScanClassifier::default();
        let t0 = Instant::now();
        classifier.handle_key(Key::Char('o'), t0);
        classifier.handle_key(Key::Char('r'), t0 + KEY_GAP);
        // Modifier presses long after the burst must not move the clock...
        classifier.handle_key(Key::Other, t0 + Duration::from_millis(500));
        classifier.handle_key(Key::Char('\t'), t0 + Duration::from_millis(500));
        assert_eq!(classifier.pending_len(), 2);
        // ...so the next char, only 50ms after 'r', continues the burst.
        classifier.handle_key(Key::Char('d'), t0 + KEY_GAP + Duration::from_millis(50));
        assert_eq!(classifier.pending_len(), 3);
    }

    #[test]
    fn enter_always_clears() {
        let mut classifier = ScanClassifier::default();
        let t0 = Instant::now();
        scan(&mut classifier, "ab", t0);
        assert!(classifier.is_idle());
        // Next burst is classified on its own, no "ab" carried over.
        assert_eq!(
            scan(&mut classifier, "ord-7", t0 + Duration::from_millis(20)),
            Some(ScanEvent::new(ScanKind::Order, "ORD-7"))
        );
    }

    #[test]
    fn malformed_qr_json_is_dropped() {
        let mut classifier = ScanClassifier::default();
        assert_eq!(scan(&mut classifier, r#"{"rackId":"RACK-B1",}"#, Instant::now()), None);
        assert_eq!(scan_fresh(r#"{"sku":"RACK-B1"}"#), None);
        assert_eq!(scan_fresh(r#"{not json}"#), None);
        assert!(classifier.is_idle());
    }

    #[test]
    fn deactivate_drops_partial_scan() {
        let mut classifier = ScanClassifier::default();
        let t0 = Instant::now();
        for (i, ch) in "RACK-".chars().enumerate() {
            classifier.handle_key(Key::Char(ch), t0 + KEY_GAP * i as u32);
        }
        classifier.deactivate();
        assert!(classifier.is_idle());

        // Reactivated: the rest of the old burst plus Enter is too short.
        let t1 = t0 + Duration::from_millis(60);
        classifier.handle_key(Key::Char('A'), t1);
        classifier.handle_key(Key::Char('3'), t1 + KEY_GAP);
        assert_eq!(classifier.handle_key(Key::Enter, t1 + KEY_GAP * 2), None);
    }

    #[test]
    fn classifiers_do_not_share_state() {
        let mut station_a = ScanClassifier::default();
        let mut station_b = ScanClassifier::default();
        let t0 = Instant::now();

        station_a.handle_key(Key::Char('R'), t0);
        station_b.handle_key(Key::Char('O'), t0);
        station_a.handle_key(Key::Char('A'), t0 + KEY_GAP);
        station_b.handle_key(Key::Char('R'), t0 + KEY_GAP);

        assert_eq!(station_a.pending_len(), 2);
        assert_eq!(station_b.pending_len(), 2);
        assert_eq!(station_b.handle_key(Key::Enter, t0 + KEY_GAP * 2), None);
        assert_eq!(station_a.pending_len(), 2);
    }

    #[test]
    fn custom_thresholds() {
        let mut classifier = ScanClassifier::new(ScannerConfig {
            burst_gap_ms: 20,
            min_scan_len: 5,
        });
        let t0 = Instant::now();
        assert_eq!(scan(&mut classifier, "ord-", t0), None);
        classifier.handle_key(Key::Char('x'), t0 + Duration::from_secs(1));
        classifier.handle_key(Key::Char('y'), t0 + Duration::from_secs(1) + Duration::from_millis(25));
        assert_eq!(classifier.pending_len(), 1);
    }

    #[test]
    fn feed_line_strips_line_endings() {
        let mut classifier = ScanClassifier::default();
        assert_eq!(
            classifier.feed_line("rack-c9\r\n", Instant::now()),
            Some(ScanEvent::new(ScanKind::Rack, "RACK-C9"))
        );
        assert!(classifier.is_idle());
    }

    #[test]
    fn classify_trims_surrounding_whitespace() {
        assert_eq!(classify("  gg-ot-diya-00002 "), Some(ScanEvent::new(ScanKind::Product, "GG-OT-DIYA-00002")));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: ScannerConfig = serde_json::from_str(r#"{"burst_gap_ms": 50}"#).unwrap();
        assert_eq!(config.burst_gap(), Duration::from_millis(50));
        assert_eq!(config.min_scan_len, 3);

        let config: ScannerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ScannerConfig::default());
    }

    #[test]
    fn config_rejects_length_floor_below_three() {
        for bad in [r#"{"min_scan_len": 0}"#, r#"{"min_scan_len": 1}"#, r#"{"min_scan_len": 2}"#] {
            let err = serde_json::from_str::<ScannerConfig>(bad).unwrap_err();
            assert!(err.to_string().contains("min_scan_len"), "{bad}: {err}");
        }
        assert!(serde_json::from_str::<ScannerConfig>(r#"{"burst_gap_ms": 0}"#).is_err());
        assert!(serde_json::from_str::<ScannerConfig>(r#"{"burst_gap_ms": 5000}"#).is_err());
    }

    #[test]
    fn hand_built_config_cannot_shorten_scans() {
        let mut classifier = ScanClassifier::new(ScannerConfig {
            burst_gap_ms: 100,
            min_scan_len: 1,
        });
        assert_eq!(scan(&mut classifier, "ab", Instant::now()), None);
        assert!(classifier.is_idle());
    }

    #[test]
    fn blank_buffer_is_not_a_scan() {
        assert_eq!(scan_fresh("   "), None);
        assert_eq!(classify(" \t "), None);
        assert_eq!(classify(""), None);
    }
}
