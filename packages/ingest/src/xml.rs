//! XML property source.
//!
//! The document is a flat list of `<property>` elements, each carrying
//! `<property_id>`, `<lat>`, `<lng>` and `<addr_street>` children. Every
//! value is text; coercion happens in the merger. Each `<property>` block is
//! read on its own, so a block missing a tag yields a record with that field
//! [`RawField::Missing`](property_map_property_models::RawField::Missing)
//! and leaves its neighbours intact.

use std::sync::LazyLock;

use property_map_property_models::RawPropertyRecord;
use regex::Regex;

static PROPERTY_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("property"));
static ID_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("property_id"));
static LAT_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("lat"));
static LNG_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("lng"));
static ADDR_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("addr_street"));

fn tag_regex(tag: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{tag}>(.*?)</{tag}>")).expect("valid regex")
}

/// First occurrence of a tag within a block.
fn capture(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| unescape(m.as_str().trim()))
}

/// Replaces the five predefined XML entities.
fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Parses tagged property records out of an XML document, one per
/// `<property>` block in document order.
#[must_use]
pub fn parse(text: &str) -> Vec<RawPropertyRecord> {
    PROPERTY_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|block| {
            let block = block.as_str();
            RawPropertyRecord {
                property_id: capture(&ID_RE, block).into(),
                lat: capture(&LAT_RE, block).into(),
                lng: capture(&LNG_RE, block).into(),
                addr_street: capture(&ADDR_RE, block).into(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use property_map_property_models::RawField;

    const DOC: &str = r"<root>
<property>
  <property_id>1</property_id>
  <lat>-37.8</lat>
  <lng>144.9</lng>
  <addr_street>10 Smith &amp; Co Lane</addr_street>
</property>
<property>
  <property_id>2</property_id>
  <lat>-37.9</lat>
  <lng>145.0</lng>
  <addr_street>12 High Street</addr_street>
</property>
</root>";

    #[test]
    fn parses_records_in_document_order() {
        let records = parse(DOC);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].property_id, RawField::Text("1".to_string()));
        assert_eq!(
            records[0].addr_street,
            RawField::Text("10 Smith & Co Lane".to_string())
        );
        assert_eq!(records[1].lng, RawField::Text("145.0".to_string()));
    }

    #[test]
    fn lat_tag_does_not_match_lng() {
        let records = parse(DOC);
        assert_eq!(records[0].lat, RawField::Text("-37.8".to_string()));
    }

    #[test]
    fn block_missing_a_tag_only_affects_that_record() {
        let doc = r"<root>
<property><property_id>1</property_id><lng>144.9</lng><addr_street>a</addr_street></property>
<property><property_id>2</property_id><lat>-37.9</lat><addr_street>b</addr_street></property>
<property><property_id>3</property_id><lat>-37.7</lat><lng>145.1</lng><addr_street>c</addr_street></property>
</root>";
        let records = parse(doc);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].lat, RawField::Missing);
        assert_eq!(records[0].lng, RawField::Text("144.9".to_string()));
        assert_eq!(records[1].lat, RawField::Text("-37.9".to_string()));
        assert_eq!(records[1].lng, RawField::Missing);
        assert_eq!(records[2].property_id, RawField::Text("3".to_string()));
    }

    #[test]
    fn text_outside_property_blocks_is_ignored() {
        assert!(parse("<property_id>1</property_id><lat>1</lat><lng>2</lng>").is_empty());
    }
}
