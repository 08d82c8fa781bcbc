//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Indian mobile number in E.164 form
static INDIA_MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+91[6-9]\d{9}$").unwrap()
});

// International phone number regex (E.164 format)
static INTERNATIONAL_PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{6,14}$").unwrap()
});

/// Which numbers the gate accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneRegion {
    /// Indian mobile numbers only (`+91` followed by 6-9 and nine digits)
    #[default]
    India,
    /// Any E.164 number
    International,
}

impl PhoneRegion {
    /// Human-readable description used in validation errors
    pub fn format_hint(&self) -> &'static str {
        match self {
            PhoneRegion::India => {
                "Must be a valid Indian mobile number starting with +91"
            }
            PhoneRegion::International => {
                "Must be in E.164 format, e.g. +14155552671"
            }
        }
    }
}

impl FromStr for PhoneRegion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "india" | "in" | "+91" => Ok(PhoneRegion::India),
            "international" | "e164" | "any" => Ok(PhoneRegion::International),
            _ => Err(format!("Invalid phone region: {}", s)),
        }
    }
}

impl fmt::Display for PhoneRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhoneRegion::India => write!(f, "india"),
            PhoneRegion::International => write!(f, "international"),
        }
    }
}

/// Normalize a phone number by removing common formatting characters
pub fn normalize_phone_number(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect()
}

/// Check if a normalized phone number is a valid Indian mobile number
pub fn is_valid_indian_mobile(phone: &str) -> bool {
    INDIA_MOBILE_REGEX.is_match(phone)
}

/// Check if a normalized phone number is valid E.164
pub fn is_valid_international_phone(phone: &str) -> bool {
    INTERNATIONAL_PHONE_REGEX.is_match(phone)
}

/// Check a normalized phone number against a region's rules
pub fn is_valid_phone(phone: &str, region: PhoneRegion) -> bool {
    match region {
        PhoneRegion::India => is_valid_indian_mobile(phone),
        PhoneRegion::International => is_valid_international_phone(phone),
    }
}

/// Mask a phone number for logs (e.g., +91****3210)
pub fn mask_phone_number(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() >= 7 {
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}****{}", head, tail)
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(normalize_phone_number("+91 98765-43210"), "+919876543210");
        assert_eq!(normalize_phone_number(" (+91) 98765 43210 "), "+919876543210");
        assert_eq!(normalize_phone_number("+1.415.555.2671"), "+14155552671");
    }

    #[test]
    fn test_is_valid_indian_mobile() {
        assert!(is_valid_indian_mobile("+919876543210"));
        assert!(is_valid_indian_mobile("+916123456789"));
        assert!(!is_valid_indian_mobile("+915876543210")); // Invalid leading digit
        assert!(!is_valid_indian_mobile("+91987654321"));  // Too short
        assert!(!is_valid_indian_mobile("9876543210"));    // Missing country code
        assert!(!is_valid_indian_mobile("+14155552671"));
    }

    #[test]
    fn test_is_valid_international_phone() {
        assert!(is_valid_international_phone("+919876543210"));
        assert!(is_valid_international_phone("+14155552671"));
        assert!(is_valid_international_phone("+442071838750"));
        assert!(!is_valid_international_phone("14155552671")); // Missing +
        assert!(!is_valid_international_phone("+0123456789")); // Invalid country code
        assert!(!is_valid_international_phone("+12345"));      // Too short
    }

    #[test]
    fn test_region_dispatch() {
        assert!(is_valid_phone("+14155552671", PhoneRegion::International));
        assert!(!is_valid_phone("+14155552671", PhoneRegion::India));
    }

    #[test]
    fn test_region_parsing() {
        assert_eq!("India".parse::<PhoneRegion>(), Ok(PhoneRegion::India));
        assert_eq!("e164".parse::<PhoneRegion>(), Ok(PhoneRegion::International));
        assert!("mars".parse::<PhoneRegion>().is_err());
    }

    #[test]
    fn test_mask_phone_number() {
        assert_eq!(mask_phone_number("+919876543210"), "+91****3210");
        assert_eq!(mask_phone_number("+14155552671"), "+14****2671");
        assert_eq!(mask_phone_number("12345"), "****");
    }
}
