/// Key layout for the profile store backend.
///
/// ```text
/// voice:{name}   → JSON VoiceProfile
/// ```
///
/// Profile names must not contain the ':' separator; the orchestrator
/// rejects such names before they reach the store.
/// Backend key for a voice profile. Format: "voice:{name}"
pub fn voice_key(name: &str) -> String {
    format!("voice:{name}")
}

/// Prefix for listing all voice profiles.
pub fn voice_prefix() -> &'static str {
    "voice:"
}

/// Extracts the profile name back out of a backend key.
pub fn voice_name_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(voice_prefix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_key_format() {
        assert_eq!(voice_key("alice"), "voice:alice");
    }

    #[test]
    fn test_voice_name_from_key() {
        assert_eq!(voice_name_from_key("voice:alice"), Some("alice"));
        assert_eq!(voice_name_from_key("other:alice"), None);
    }
}
