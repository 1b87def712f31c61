use percent_encoding::percent_decode_str;

pub const CSRF_COOKIE_NAME: &str = "csrftoken";

/// Source of the anti-forgery token. Asked again on every lookup; nothing
/// is cached.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Reads a named cookie out of a whole `document.cookie`-style string.
pub struct CookieJar {
    cookies: String,
    name: String,
}

impl CookieJar {
    pub fn new(cookies: impl Into<String>) -> CookieJar {
        CookieJar {
            cookies: cookies.into(),
            name: CSRF_COOKIE_NAME.to_string(),
        }
    }
}

impl TokenProvider for CookieJar {
    fn token(&self) -> Option<String> {
        get_cookie(&self.cookies, &self.name)
    }
}

/// First entry named `name`, percent-decoded. Invalid UTF-8 after decoding
/// is replaced rather than rejected.
pub fn get_cookie(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .map(str::trim)
        .filter_map(|cookie| {
            let rest = cookie.strip_prefix(name)?;
            rest.strip_prefix('=')
        })
        .next()
        .map(|value| percent_decode_str(value).decode_utf8_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_token_among_other_cookies() {
        let jar = CookieJar::new("csrftoken=abc123; other=x");
        assert_eq!(jar.token(), Some("abc123".to_string()));
    }

    #[test]
    fn token_not_first() {
        assert_eq!(
            get_cookie("sessionid=s1;  csrftoken=tok", "csrftoken"),
            Some("tok".to_string())
        );
    }

    #[test]
    fn value_is_percent_decoded() {
        assert_eq!(
            get_cookie("csrftoken=a%20b%3Dc", "csrftoken"),
            Some("a b=c".to_string())
        );
    }

    #[test]
    fn prefix_of_another_name_does_not_match() {
        assert_eq!(get_cookie("csrftokenx=1; xcsrftoken=2", "csrftoken"), None);
    }

    #[test]
    fn missing_or_empty_jar() {
        assert_eq!(CookieJar::new("").token(), None);
        assert_eq!(CookieJar::new("other=x").token(), None);
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(
            get_cookie("csrftoken=one; csrftoken=two", "csrftoken"),
            Some("one".to_string())
        );
    }
}
