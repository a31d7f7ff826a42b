use scraper::Html;
use serde::Serialize;

use super::{element_text, first_text, nested_text, selector};
use crate::error::ParseError;

/// Optional fields scraped from a profile page. Real pages routinely omit
/// elements, so every field may be absent; absence is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileFields {
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub link: Option<String>,
    pub followers: Option<i64>,
    pub following: Option<i64>,
    pub star_count: i64,
}

/// Extract every field independently. One missing element never blocks
/// the others.
pub fn extract(doc: &Html) -> ProfileFields {
    let (followers, following) = follower_counts(doc);
    ProfileFields {
        full_name: first_text(doc, r#"span[itemprop="name"]"#)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        company: nested_text(doc, r#"li[itemprop="worksFor"]"#, "span"),
        location: nested_text(doc, r#"li[itemprop="homeLocation"]"#, "span"),
        email: nested_text(doc, r#"li[itemprop="email"]"#, "a"),
        link: nested_text(doc, r#"li[itemprop="url"]"#, "a"),
        followers,
        following,
        star_count: star_count(doc),
    }
}

/// The first two bold counters on the page are followers then following.
/// A counter that fails number conversion is dropped, not fatal.
fn follower_counts(doc: &Html) -> (Option<i64>, Option<i64>) {
    let sel = selector("span.text-bold.color-fg-default");
    let mut counters = doc.select(&sel).map(element_text);
    let followers = counters
        .next()
        .and_then(|t| convert_number_string(&t).ok());
    let following = counters
        .next()
        .and_then(|t| convert_number_string(&t).ok());
    (followers, following)
}

/// Starred-repository count from the stars tab badge; 0 when the badge is
/// missing or does not parse.
fn star_count(doc: &Html) -> i64 {
    let tab = selector(r#"a[data-tab-item="stars"]"#);
    let counter = selector("span.Counter");
    doc.select(&tab)
        .next()
        .and_then(|el| el.select(&counter).next())
        .and_then(|el| element_text(el).trim().parse().ok())
        .unwrap_or(0)
}

/// Convert a count like "2.7k" to 2700. Plain integers pass through and
/// thousands separators are stripped first. Anything non-numeric after
/// that is a ParseError.
pub fn convert_number_string(raw: &str) -> Result<i64, ParseError> {
    let s = raw.trim().replace(',', "");
    match s.strip_suffix('k') {
        Some(stripped) => {
            let value: f64 = stripped.parse().map_err(|_| ParseError(raw.to_string()))?;
            Ok((value * 1000.0) as i64)
        }
        None => s.parse().map_err(|_| ParseError(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(fixture: &str) -> Html {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", fixture)).unwrap();
        Html::parse_document(&html)
    }

    #[test]
    fn convert_plain_and_thousands() {
        assert_eq!(convert_number_string("2.7k"), Ok(2700));
        assert_eq!(convert_number_string("150"), Ok(150));
        assert_eq!(convert_number_string("1k"), Ok(1000));
        assert_eq!(convert_number_string(" 42 "), Ok(42));
        assert_eq!(convert_number_string("1,234"), Ok(1234));
    }

    #[test]
    fn convert_rejects_non_numeric() {
        assert_eq!(
            convert_number_string("abc"),
            Err(ParseError("abc".to_string()))
        );
        assert_eq!(convert_number_string("k"), Err(ParseError("k".to_string())));
        assert!(convert_number_string("").is_err());
    }

    #[test]
    fn full_profile_page() {
        let doc = parse("profile");
        let f = extract(&doc);
        assert_eq!(f.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(f.company.as_deref(), Some("Acme Corp"));
        assert_eq!(f.location.as_deref(), Some("Oslo, Norway"));
        assert_eq!(f.email.as_deref(), Some("jane@example.com"));
        assert_eq!(f.link.as_deref(), Some("https://janedoe.dev"));
        assert_eq!(f.followers, Some(2700));
        assert_eq!(f.following, Some(150));
        assert_eq!(f.star_count, 42);
    }

    #[test]
    fn empty_page_yields_all_absent() {
        let doc = Html::parse_document("<html><body><p>404</p></body></html>");
        let f = extract(&doc);
        assert_eq!(f, ProfileFields::default());
        assert_eq!(f.star_count, 0);
    }

    #[test]
    fn unparsable_counter_is_absent() {
        let doc = Html::parse_document(
            r#"<span class="text-bold color-fg-default">lots</span>
               <span class="text-bold color-fg-default">7</span>"#,
        );
        let f = extract(&doc);
        assert_eq!(f.followers, None);
        assert_eq!(f.following, Some(7));
    }
}
