//! Byte patterns with wildcards for searching module images.
//!
//! Patterns are written the way disassemblers print them: hex byte tokens
//! separated by whitespace, with `?` or `??` for a byte that may be anything.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A byte pattern where `None` matches any byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    tokens: Vec<Option<u8>>,
}

impl Pattern {
    /// Parse a pattern string such as `"48 8B 05 ?? ?? ?? ?? 48 8B D9"`.
    ///
    /// # Example
    ///
    /// ```
    /// use galymap_core::process::pattern::Pattern;
    ///
    /// let pattern = Pattern::parse("40 84 ed ?? 94").unwrap();
    /// assert_eq!(pattern.len(), 5);
    /// assert_eq!(pattern.find_in(&[0, 0x40, 0x84, 0xED, 0x0F, 0x94]), Some(1));
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = text
            .split_whitespace()
            .map(|token| match token {
                "?" | "??" => Ok(None),
                hex if hex.len() == 2 => u8::from_str_radix(hex, 16).map(Some).map_err(|_| {
                    Error::InvalidPattern(format!("'{}' is not a hex byte in \"{}\"", hex, text))
                }),
                other => Err(Error::InvalidPattern(format!(
                    "'{}' is not a byte token in \"{}\"",
                    other, text
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        if tokens.is_empty() {
            return Err(Error::InvalidPattern("pattern is empty".to_string()));
        }
        Ok(Self { tokens })
    }

    pub fn from_tokens(tokens: Vec<Option<u8>>) -> Self {
        Self { tokens }
    }

    /// Exact pattern with no wildcards.
    pub fn exact(bytes: &[u8]) -> Self {
        Self {
            tokens: bytes.iter().copied().map(Some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Option<u8>] {
        &self.tokens
    }

    pub fn matches_at(&self, haystack: &[u8], offset: usize) -> bool {
        let Some(window) = haystack.get(offset..offset + self.tokens.len()) else {
            return false;
        };
        self.tokens
            .iter()
            .zip(window)
            .all(|(token, byte)| token.is_none_or(|expected| expected == *byte))
    }

    /// Lowest offset at which the pattern matches.
    ///
    /// Candidates are found with `memchr` on the first concrete byte, then
    /// verified in full.
    pub fn find_in(&self, haystack: &[u8]) -> Option<usize> {
        self.candidates(haystack)
            .find(|&offset| self.matches_at(haystack, offset))
    }

    /// Every offset at which the pattern matches, in ascending order.
    pub fn find_all_in(&self, haystack: &[u8]) -> Vec<usize> {
        self.candidates(haystack)
            .filter(|&offset| self.matches_at(haystack, offset))
            .collect()
    }

    fn candidates<'h>(&self, haystack: &'h [u8]) -> Box<dyn Iterator<Item = usize> + 'h> {
        if self.tokens.is_empty() || self.tokens.len() > haystack.len() {
            return Box::new(std::iter::empty());
        }
        let last_start = haystack.len() - self.tokens.len();

        match self
            .tokens
            .iter()
            .enumerate()
            .find_map(|(i, token)| token.map(|byte| (i, byte)))
        {
            Some((lead, byte)) => {
                let region = &haystack[lead..=last_start + lead];
                Box::new(memchr::memchr_iter(byte, region))
            }
            None => Box::new(0..=last_start),
        }
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .tokens
            .iter()
            .map(|token| match token {
                Some(byte) => format!("{:02X}", byte),
                None => "??".to_string(),
            })
            .collect();
        f.write_str(&parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        let pattern = Pattern::parse("48 8B 05 ?? ? 0f").unwrap();
        assert_eq!(
            pattern.tokens(),
            &[Some(0x48), Some(0x8B), Some(0x05), None, None, Some(0x0F)]
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Pattern::parse("48 GG"),
            Err(Error::InvalidPattern(_))
        ));
        assert!(matches!(
            Pattern::parse("488B"),
            Err(Error::InvalidPattern(_))
        ));
        assert!(matches!(Pattern::parse("   "), Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn test_display_round_trip() {
        let text = "C6 84 C2 ?? ?? ?? ?? ?? 48 8B 74 24 ??";
        assert_eq!(Pattern::parse(text).unwrap().to_string(), text);
    }

    #[test]
    fn test_find_first_of_many() {
        let buffer = [1, 2, 3, 4, 5, 1, 2, 3];
        assert_eq!(Pattern::exact(&[1, 2, 3]).find_in(&buffer), Some(0));
        assert_eq!(Pattern::exact(&[1, 2, 3]).find_all_in(&buffer), vec![0, 5]);
    }

    #[test]
    fn test_find_with_wildcards() {
        let buffer = [9, 1, 2, 3, 1, 9, 3, 1, 5, 3];
        let pattern = Pattern::parse("01 ?? 03").unwrap();
        assert_eq!(pattern.find_in(&buffer), Some(1));
        assert_eq!(pattern.find_all_in(&buffer), vec![1, 4, 7]);
    }

    #[test]
    fn test_leading_wildcard() {
        let buffer = [0xAA, 0x10, 0x20, 0xBB, 0x10, 0x20];
        let pattern = Pattern::parse("?? 10 20").unwrap();
        assert_eq!(pattern.find_all_in(&buffer), vec![0, 3]);
    }

    #[test]
    fn test_all_wildcards_match_everywhere() {
        let buffer = [1, 2, 3, 4, 5];
        let pattern = Pattern::parse("?? ??").unwrap();
        assert_eq!(pattern.find_all_in(&buffer), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_match_at_end_of_buffer() {
        let buffer = [0, 0, 0, 0x48, 0x03];
        assert_eq!(Pattern::exact(&[0x48, 0x03]).find_in(&buffer), Some(3));
    }

    #[test]
    fn test_no_match() {
        let buffer = [1, 2, 3, 4, 5];
        assert_eq!(Pattern::exact(&[6, 7, 8]).find_in(&buffer), None);
        assert_eq!(Pattern::exact(&[1, 2, 3, 4, 5, 6]).find_in(&buffer), None);
    }
}
