// Voice Selection - deterministic fallback chain over engine voices

use crate::domain::VoiceCandidate;

/// Locale every announcement targets
pub const PREFERRED_LANGUAGE: &str = "id-ID";

/// Vendor markers probed when no exact voice is configured, in
/// preference order
const VENDOR_MARKERS: [&str; 2] = ["Google", "Microsoft"];

/// True when `tag` names the preferred locale, at any precision.
///
/// Engines report tags of varying shape: `id-ID`, `id_ID`, plain `id`.
/// The bare primary subtag counts as a match; an unrelated language
/// never does.
pub fn language_matches(tag: &str, preferred: &str) -> bool {
    let tag = tag.replace('_', "-");
    if tag.eq_ignore_ascii_case(preferred) {
        return true;
    }
    let primary = preferred.split('-').next().unwrap_or(preferred);
    tag.eq_ignore_ascii_case(primary)
        || tag
            .to_ascii_lowercase()
            .starts_with(&format!("{}-", primary.to_ascii_lowercase()))
}

/// Resolve the configured voice against the candidate list.
///
/// Chain, first match wins:
/// 1. exact id match, when an id is configured;
/// 2. preferred-locale candidate with a "Google" name marker;
/// 3. preferred-locale candidate with a "Microsoft" name marker;
/// 4. any preferred-locale candidate;
/// 5. `None` - the engine default speaks (degraded, not an error).
///
/// Deterministic: for a fixed list and id the same candidate comes
/// back every time (list order breaks ties).
pub fn select_voice<'a>(
    configured_id: &str,
    candidates: &'a [VoiceCandidate],
) -> Option<&'a VoiceCandidate> {
    if !configured_id.is_empty() {
        if let Some(exact) = candidates.iter().find(|v| v.id == configured_id) {
            return Some(exact);
        }
    }
    for marker in VENDOR_MARKERS {
        if let Some(preferred) = candidates
            .iter()
            .find(|v| language_matches(&v.language, PREFERRED_LANGUAGE) && v.name.contains(marker))
        {
            return Some(preferred);
        }
    }
    candidates
        .iter()
        .find(|v| language_matches(&v.language, PREFERRED_LANGUAGE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<VoiceCandidate> {
        vec![
            VoiceCandidate::new("en-us-1", "Microsoft Zira", "en-US"),
            VoiceCandidate::new("id-plain", "Damayanti", "id-ID"),
            VoiceCandidate::new("id-ms", "Microsoft Andika", "id-ID"),
            VoiceCandidate::new("id-google", "Google Bahasa Indonesia", "id-ID"),
        ]
    }

    #[test]
    fn exact_id_wins_over_everything() {
        let list = candidates();
        let v = select_voice("id-plain", &list).unwrap();
        assert_eq!(v.id, "id-plain");
    }

    #[test]
    fn unknown_id_falls_through_to_google() {
        let list = candidates();
        let v = select_voice("does-not-exist", &list).unwrap();
        assert_eq!(v.id, "id-google");
    }

    #[test]
    fn google_preferred_when_nothing_configured() {
        let list = candidates();
        let v = select_voice("", &list).unwrap();
        assert_eq!(v.id, "id-google");
    }

    #[test]
    fn microsoft_when_no_google() {
        let list: Vec<_> = candidates()
            .into_iter()
            .filter(|v| !v.name.contains("Google"))
            .collect();
        let v = select_voice("", &list).unwrap();
        assert_eq!(v.id, "id-ms");
    }

    #[test]
    fn any_locale_voice_when_no_vendor_marker() {
        let list = vec![
            VoiceCandidate::new("en-us-1", "Microsoft Zira", "en-US"),
            VoiceCandidate::new("id-plain", "Damayanti", "id-ID"),
        ];
        let v = select_voice("", &list).unwrap();
        assert_eq!(v.id, "id-plain");
    }

    #[test]
    fn none_when_no_locale_match() {
        let list = vec![VoiceCandidate::new("en-us-1", "Microsoft Zira", "en-US")];
        assert!(select_voice("", &list).is_none());
        assert!(select_voice("", &[]).is_none());
    }

    #[test]
    fn wrong_locale_vendor_marker_never_matches() {
        // A Google en-US voice must not beat a plain id-ID voice
        let list = vec![
            VoiceCandidate::new("en-google", "Google US English", "en-US"),
            VoiceCandidate::new("id-plain", "Damayanti", "id-ID"),
        ];
        let v = select_voice("", &list).unwrap();
        assert_eq!(v.id, "id-plain");
    }

    #[test]
    fn resolution_is_deterministic() {
        let list = candidates();
        let first = select_voice("", &list).map(|v| v.id.clone());
        for _ in 0..10 {
            assert_eq!(select_voice("", &list).map(|v| v.id.clone()), first);
        }
    }

    #[test]
    fn bare_primary_subtag_matches() {
        assert!(language_matches("id", PREFERRED_LANGUAGE));
        assert!(language_matches("id-ID", PREFERRED_LANGUAGE));
        assert!(language_matches("id_ID", PREFERRED_LANGUAGE));
        assert!(language_matches("ID", PREFERRED_LANGUAGE));
        assert!(!language_matches("en-US", PREFERRED_LANGUAGE));
        // Icelandic is a different language, not a precision variant
        assert!(!language_matches("is-IS", PREFERRED_LANGUAGE));
    }
}
