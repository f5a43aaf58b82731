//! AJAX crawling scheme URL rewriting

use kodegen_tools_linkpreview::escaped_fragment::to_escaped_fragment_url;
use url::Url;

fn escaped(input: &str) -> String {
    to_escaped_fragment_url(&Url::parse(input).unwrap())
        .unwrap()
        .to_string()
}

#[test]
fn hash_bang_payload_moves_into_the_query() {
    assert_eq!(
        escaped("http://x.com/#!foo bar"),
        "http://x.com/?_escaped_fragment_=foo%20bar"
    );
}

#[test]
fn existing_query_uses_ampersand() {
    assert_eq!(
        escaped("http://x.com/?a=1#!foo"),
        "http://x.com/?a=1&_escaped_fragment_=foo"
    );
}

#[test]
fn missing_marker_appends_empty_parameter() {
    assert_eq!(escaped("http://x.com/page"), "http://x.com/page?_escaped_fragment_=");
    assert_eq!(
        escaped("http://x.com/page?a=1"),
        "http://x.com/page?a=1&_escaped_fragment_="
    );
}

#[test]
fn unsafe_payload_bytes_are_percent_encoded() {
    assert_eq!(
        escaped("http://x.com/#!k=a&b+c"),
        "http://x.com/?_escaped_fragment_=k=a%26b%2Bc"
    );
}

#[test]
fn percent_encoded_input_is_decoded_first() {
    assert_eq!(
        escaped("http://x.com/#!path%2Fto"),
        "http://x.com/?_escaped_fragment_=path/to"
    );
}
