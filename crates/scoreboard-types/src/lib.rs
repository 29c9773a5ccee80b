pub mod api;
pub mod models;

/// Normalised form of a username used for every uniqueness check and lookup.
/// "Ann", "ann" and " ANN " all share the key `ann`.
pub fn username_key(username: &str) -> String {
    username.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ignores_case_and_padding() {
        assert_eq!(username_key("Ann"), "ann");
        assert_eq!(username_key("  ANN "), "ann");
        assert_eq!(username_key("ann"), username_key("aNn"));
    }

    #[test]
    fn key_lowercases_non_ascii() {
        assert_eq!(username_key("ÉLODIE"), "élodie");
    }
}
