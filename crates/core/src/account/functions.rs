/// Masks an identifier for display and logging, keeping the last four characters.
///
/// Identifiers shorter than four characters are fully masked.
///
/// # Examples
///
/// ```
/// use officemate_core::account::mask_identifier;
///
/// assert_eq!(mask_identifier("+919876543210"), "****3210");
/// assert_eq!(mask_identifier("12"), "****");
/// ```
pub fn mask_identifier(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    if chars.len() < 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_identifier_keeps_last_four() {
        assert_eq!(mask_identifier("+919876543210"), "****3210");
        assert_eq!(mask_identifier("abcd"), "****abcd");
    }

    #[test]
    fn mask_identifier_hides_short_values() {
        assert_eq!(mask_identifier(""), "****");
        assert_eq!(mask_identifier("abc"), "****");
    }
}
