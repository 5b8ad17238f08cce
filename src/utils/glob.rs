/// Shell style wildcard match: `*` spans any run of characters, `?` one character.
pub fn matches(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();

    let (mut p, mut c) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while c < candidate.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, c));
                p += 1;
            }
            Some(&expected) if expected == '?' || expected == candidate[c] => {
                p += 1;
                c += 1;
            }
            _ => match backtrack {
                Some((star, consumed)) => {
                    p = star + 1;
                    c = consumed + 1;
                    backtrack = Some((star, consumed + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&rest| rest == '*')
}

pub fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

pub fn matches_any<'a>(patterns: impl IntoIterator<Item = &'a String>, candidate: &str) -> bool {
    patterns.into_iter().any(|pattern| matches(pattern, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards() {
        assert!(matches("*.tmp", "cache.tmp"));
        assert!(matches("*.tmp", ".tmp"));
        assert!(!matches("*.tmp", "cache.tmp.bak"));
        assert!(matches("log_?", "log_1"));
        assert!(!matches("log_?", "log_12"));
        assert!(matches("audit_*_old", "audit_2024_01_old"));
        assert!(matches("*", ""));
        assert!(!matches("a", ""));
    }

    #[test]
    fn literal_patterns_match_exactly() {
        assert!(matches("sessions", "sessions"));
        assert!(!matches("sessions", "sessions_archive"));
        assert!(!has_wildcard("sessions"));
        assert!(has_wildcard("session?"));
    }
}
