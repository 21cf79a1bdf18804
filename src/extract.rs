use std::sync::LazyLock;

use regex::Regex;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("valid regex"));

/// Ordered product-id matchers. The bare digit-run pattern is a broad
/// catch-all and must stay last.
static ID_MATCHERS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"/item/(\d+)\.html").expect("valid regex"),
        Regex::new(r"productIds=(\d+)").expect("valid regex"),
        Regex::new(r"(\d{13,})").expect("valid regex"),
    ]
});

/// First `http(s)://` or `www.` token in the message text, if any.
pub fn first_link(text: &str) -> Option<&str> {
    LINK_RE.find(text).map(|m| m.as_str())
}

/// Numeric product identifier from a resolved URL: `/item/<digits>.html`,
/// then `productIds=<digits>`, then a bare run of 13+ digits. First match
/// wins; `None` is the pipeline's terminal failure.
pub fn product_id(link: &str) -> Option<&str> {
    ID_MATCHERS
        .iter()
        .find_map(|re| re.captures(link).and_then(|c| c.get(1)).map(|m| m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_link_only() {
        let text = "check https://a.example/x and also https://b.example/y";
        assert_eq!(first_link(text), Some("https://a.example/x"));
    }

    #[test]
    fn extracts_www_prefixed_link() {
        assert_eq!(
            first_link("go to www.aliexpress.com/item/1.html now"),
            Some("www.aliexpress.com/item/1.html")
        );
    }

    #[test]
    fn no_link_in_plain_text() {
        assert_eq!(first_link("مرحبا، أريد تخفيضا"), None);
    }

    #[test]
    fn item_path_pattern_wins() {
        let link = "https://www.aliexpress.com/item/1234567890123.html?spm=a2g0o";
        assert_eq!(product_id(link), Some("1234567890123"));
    }

    #[test]
    fn product_ids_query_without_item_path() {
        let link = "https://m.aliexpress.com/p/coin-index/index.html?productIds=987654321";
        assert_eq!(product_id(link), Some("987654321"));
    }

    #[test]
    fn bare_long_digit_run_as_fallback() {
        let link = "https://a.aliexpress.com/_m0abcdef/9876543210123?src=share";
        assert_eq!(product_id(link), Some("9876543210123"));
    }

    #[test]
    fn item_path_beats_digit_run_elsewhere() {
        // A 13-digit tracking value must not shadow the item path.
        let link = "https://www.aliexpress.com/item/4000123.html?track=9999999999999";
        assert_eq!(product_id(link), Some("4000123"));
    }

    #[test]
    fn no_identifier_anywhere() {
        assert_eq!(product_id("https://www.aliexpress.com/p/shoppingcart/index.html"), None);
    }
}
