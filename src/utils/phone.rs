/// Normalizes a phone number to digits plus an optional leading `+`.
///
/// Providers report the same number in different shapes
/// (`+44 7700 900123`, `whatsapp:+447700900123`, `(555) 123-4567`);
/// candidate lookups must treat them all as the same key.
pub fn normalize_phone(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, ch) in raw.trim().chars().enumerate() {
        if ch.is_ascii_digit() || (ch == '+' && i == 0) {
            out.push(ch);
        } else if ch == '+' && out.is_empty() {
            // `whatsapp:+44...` puts the plus mid-string
            out.push(ch);
        }
    }
    out
}

/// Strips a `whatsapp:` prefix if present, leaving the bare number.
pub fn strip_whatsapp_prefix(raw: &str) -> &str {
    raw.strip_prefix("whatsapp:").unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_invariant_across_formats() {
        assert_eq!(normalize_phone("+44 7700 900123"), "+447700900123");
        assert_eq!(normalize_phone("+447700900123"), "+447700900123");
        assert_eq!(normalize_phone("(555) 123-4567"), "5551234567");
    }

    #[test]
    fn whatsapp_prefixed_numbers_normalize_to_bare_e164() {
        assert_eq!(
            normalize_phone(strip_whatsapp_prefix("whatsapp:+15551234567")),
            "+15551234567"
        );
    }

    #[test]
    fn plus_is_only_kept_in_the_leading_position() {
        assert_eq!(normalize_phone("+44+7700"), "+447700");
        assert_eq!(normalize_phone("44+7700"), "447700");
    }
}
