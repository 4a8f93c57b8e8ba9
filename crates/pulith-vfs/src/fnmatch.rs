//! Shell-style wildcard matching.
//!
//! - `*` matches any run of characters, including `/`
//! - `?` matches exactly one character
//! - `[seq]` / `[!seq]` match one character in / not in `seq`, with `a-z`
//!   ranges; an unterminated `[` is a literal

/// Match `text` against `pattern` in full.
pub fn fnmatch(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position after the last `*` and the text index it is currently absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    backtrack = Some((p + 1, t));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    t += 1;
                    continue;
                }
                '[' => {
                    if let Some((matched, next)) = match_class(&pattern, p, text[t]) {
                        if matched {
                            p = next;
                            t += 1;
                            continue;
                        }
                    } else if text[t] == '[' {
                        p += 1;
                        t += 1;
                        continue;
                    }
                }
                c if c == text[t] => {
                    p += 1;
                    t += 1;
                    continue;
                }
                _ => {}
            }
        }
        match backtrack {
            Some((star_p, star_t)) => {
                p = star_p;
                t = star_t + 1;
                backtrack = Some((star_p, star_t + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Evaluate the class starting at `pattern[start] == '['` against `c`.
///
/// Returns whether it matched and the index after the closing `]`, or
/// `None` if the class is unterminated.
fn match_class(pattern: &[char], start: usize, c: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negated = matches!(pattern.get(i), Some('!'));
    if negated {
        i += 1;
    }
    let mut matched = false;
    let mut first = true;
    loop {
        let &lo = pattern.get(i)?;
        if lo == ']' && !first {
            return Some((matched != negated, i + 1));
        }
        first = false;
        if pattern.get(i + 1) == Some(&'-') && pattern.get(i + 2).is_some_and(|&hi| hi != ']') {
            let hi = pattern[i + 2];
            if lo <= c && c <= hi {
                matched = true;
            }
            i += 3;
        } else {
            if lo == c {
                matched = true;
            }
            i += 1;
        }
    }
}

/// Right-anchored path match.
///
/// The pattern is split on `/`; it matches when it has no more segments than
/// `path` and every pattern segment matches the corresponding trailing path
/// segment. A leading `/` anchors the pattern to the whole path.
pub fn match_path(path: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    let anchored = pattern.starts_with('/');
    let pattern_parts: Vec<&str> = pattern
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_parts.len() > path_parts.len() {
        return false;
    }
    if anchored && pattern_parts.len() != path_parts.len() {
        return false;
    }
    pattern_parts
        .iter()
        .rev()
        .zip(path_parts.iter().rev())
        .all(|(pat, part)| fnmatch(pat, part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_wildcards() {
        assert!(fnmatch("b.txt", "b.txt"));
        assert!(!fnmatch("b.txt", "b.txtx"));
        assert!(fnmatch("*.json", "comments.json"));
        assert!(fnmatch("file?.dat", "file1.dat"));
        assert!(!fnmatch("file?.dat", "file.dat"));
        assert!(fnmatch("*", ""));
        assert!(!fnmatch("?", ""));
    }

    #[test]
    fn star_crosses_separators() {
        assert!(fnmatch("c/*", "c/hello"));
        assert!(fnmatch("*hello", "c/hello"));
        assert!(!fnmatch("h*", "c/hello"));
    }

    #[test]
    fn star_backtracks() {
        assert!(fnmatch("*a*b", "xaxxab"));
        assert!(fnmatch("a*b*c", "abbbc"));
        assert!(!fnmatch("a*b*c", "abbb"));
    }

    #[test]
    fn character_classes() {
        assert!(fnmatch("[abc].txt", "b.txt"));
        assert!(!fnmatch("[abc].txt", "d.txt"));
        assert!(fnmatch("[!abc].txt", "d.txt"));
        assert!(fnmatch("file[0-9]", "file7"));
        assert!(!fnmatch("file[0-9]", "filex"));
        assert!(fnmatch("[]]", "]"));
        assert!(fnmatch("a[", "a["));
    }

    #[test]
    fn path_match_is_right_anchored() {
        assert!(match_path("gdpr_export/comments/comments.json", "*.json"));
        assert!(match_path("gdpr_export/messages", "mes*"));
        assert!(!match_path("gdpr_export/messages/index.csv", "mes*"));
        assert!(match_path("a/b/c", "b/c"));
        assert!(!match_path("a/b/c", "a/c"));
        assert!(!match_path("c", "b/c"));
    }

    #[test]
    fn anchored_path_match() {
        assert!(match_path("a/b", "/a/b"));
        assert!(!match_path("x/a/b", "/a/b"));
    }

    #[test]
    fn empty_pattern_matches_nothing() {
        assert!(!match_path("a", ""));
    }
}
