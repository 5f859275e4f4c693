use rand::Rng;

/// Issue a new technical token: a 128-bit random integer rendered in decimal.
pub fn generate_technical_token() -> String {
    let value: u128 = rand::rng().random();
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_decimal() {
        let token = generate_technical_token();
        assert!(!token.is_empty());
        assert!(token.chars().all(|c| c.is_ascii_digit()));
        assert!(token.parse::<u128>().is_ok());
    }

    #[test]
    fn tokens_are_distinct() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_technical_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }
}
