// Simple email address syntax check
//
// Local part and domain structure only, this is not an RFC 5322 parser.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SIMPLE_EMAIL: Regex = Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#
    )
    .expect("email pattern is valid");
}

/// Returns true when `address` looks like `user@domain.tld`
pub fn is_valid_email(address: &str) -> bool {
    SIMPLE_EMAIL.is_match(address)
}
