use once_cell::sync::Lazy;
use regex::Regex;

// Compiled regexes for page text parsing
static COOKIE_PAIR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|;)\s*([^=;\s]+)\s*=\s*([^;]*)").unwrap());
static LEADING_COUNT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d[\d,\s\u{a0}\u{202f}]*)").unwrap());
static PERCENT_ESCAPE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"%([0-9A-Fa-f]{2})").unwrap());

/// Value of cookie `name` in a `document.cookie` string, percent-decoded.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    COOKIE_PAIR_REGEX
        .captures_iter(cookies)
        .find(|c| &c[1] == name)
        .map(|c| percent_decode(c[2].trim()))
}

/// The CSRF token from the cookie jar, falling back to the hidden form field.
pub fn csrf_token(cookies: &str, form_field: Option<&str>) -> Option<String> {
    cookie_value(cookies, "csrftoken")
        .filter(|t| !t.is_empty())
        .or_else(|| form_field.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string))
}

fn percent_decode(input: &str) -> String {
    let bytes: Vec<u8> = {
        let mut out = Vec::with_capacity(input.len());
        let mut last = 0;
        for c in PERCENT_ESCAPE_REGEX.captures_iter(input) {
            let m = c.get(0).map_or(0..0, |m| m.range());
            out.extend_from_slice(input[last..m.start].as_bytes());
            // two hex digits always fit a byte
            out.push(u8::from_str_radix(&c[1], 16).unwrap_or(b'?'));
            last = m.end;
        }
        out.extend_from_slice(input[last..].as_bytes());
        out
    };
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Escape everything outside the RFC 3986 unreserved set, for query values
/// and path segments.
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Read a counter the server rendered as text. Grouping separators are
/// skipped and trailing units ("5/сек") ignored.
pub fn parse_counter(text: &str) -> Option<u64> {
    let captures = LEADING_COUNT_REGEX.captures(text)?;
    let digits: String = captures[1].chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Group thousands with commas: `1234567` → `"1,234,567"`.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Escape text for interpolation into `innerHTML`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cookie_among_others() {
        let jar = "sessionid=abc; csrftoken=tok%2B1; theme=dark";
        assert_eq!(cookie_value(jar, "csrftoken").as_deref(), Some("tok+1"));
        assert_eq!(cookie_value(jar, "theme").as_deref(), Some("dark"));
        assert_eq!(cookie_value(jar, "missing"), None);
    }

    #[test]
    fn similar_cookie_names_do_not_match() {
        assert_eq!(cookie_value("xcsrftoken=bad", "csrftoken"), None);
    }

    #[test]
    fn csrf_falls_back_to_form_field() {
        assert_eq!(csrf_token("", Some(" field ")).as_deref(), Some("field"));
        assert_eq!(csrf_token("csrftoken=c", Some("field")).as_deref(), Some("c"));
        assert_eq!(csrf_token("csrftoken=", None), None);
    }

    #[test]
    fn encodes_reserved_and_non_ascii_bytes() {
        assert_eq!(percent_encode("d41d8cd9-_.~"), "d41d8cd9-_.~");
        assert_eq!(percent_encode("a b/?#"), "a%20b%2F%3F%23");
        assert_eq!(percent_encode("é"), "%C3%A9");
        assert_eq!(percent_decode(&percent_encode("x=1&y=2")), "x=1&y=2");
    }

    #[test]
    fn parses_rendered_counters() {
        assert_eq!(parse_counter("1,234"), Some(1234));
        assert_eq!(parse_counter(" 12\u{a0}500 "), Some(12500));
        assert_eq!(parse_counter("5/сек"), Some(5));
        assert_eq!(parse_counter("—"), None);
        assert_eq!(parse_counter(""), None);
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<b class="x">Tom & 'Jerry'</b>"#), "&lt;b class=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }
}
