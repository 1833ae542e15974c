/// Checks if a candidate matches a wildcard pattern
///
/// `*` matches any run of characters (including none) and `?` matches exactly
/// one character. Everything else matches literally.
///
/// # Examples
///
/// ```
/// use tidewalk::location::matches_pattern;
///
/// assert!(matches_pattern("*.html", "/products/123456.html"));
/// assert!(matches_pattern("/p/*/detail", "/p/42/detail"));
/// assert!(!matches_pattern("*.html", "/products/"));
/// ```
pub fn matches_pattern(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();

    let (mut p, mut c) = (0, 0);
    // Position of the last `*` seen and the candidate index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while c < candidate.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == candidate[c]) {
            p += 1;
            c += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, c));
            p += 1;
        } else if let Some((star, tried)) = backtrack {
            p = star + 1;
            c = tried + 1;
            backtrack = Some((star, tried + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&ch| ch == '*')
}
