/// Rough estimate: GPT-style token ≈ 4 chars (good enough for UI)
pub fn approx_tokens(s: &str) -> usize {
    s.chars().count() / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(approx_tokens("abcdefgh"), 2);
        assert_eq!(approx_tokens("├─├─"), 1);
    }
}
