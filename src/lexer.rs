use arrayvec::ArrayVec;

use std::str::{self, FromStr};

/// Number of fields an XGPS sentence must carry after its tag.
pub const FIELD_COUNT: usize = 5;

/// The tag every XGPS sentence begins with.
pub const TAG: &str = "XGPS";

/// The numeric fields of a sentence, in wire order.
pub type Fields = ArrayVec<[f64; FIELD_COUNT]>;

/// Splits the part of a sentence after the tag into comma separated tokens.
pub struct Tokenizer<'a> {
    rest: Option<&'a str>,
}

impl<'a> Tokenizer<'a> {
    /// `body` is everything after the first comma of the sentence.
    pub fn new(body: &'a str) -> Self {
        Tokenizer { rest: Some(body) }
    }

    /// Collect up to `FIELD_COUNT` fields, parsing each leniently.
    /// Fields beyond that are never looked at.
    pub fn fields(self) -> Fields {
        self.take(FIELD_COUNT).map(lenient_f64).collect()
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest?;
        match rest.find(',') {
            Some(i) => {
                self.rest = Some(&rest[i + 1..]);
                Some(&rest[..i])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// A field that is not a decimal number reads as `0.0`.
#[inline]
pub fn lenient_f64(token: &str) -> f64 {
    f64::from_str(token.trim()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_every_comma() {
        let tokens: Vec<_> = Tokenizer::new("1,,3,").collect();
        assert_eq!(tokens, vec!["1", "", "3", ""]);
    }

    #[test]
    fn empty_body_is_one_empty_token() {
        let tokens: Vec<_> = Tokenizer::new("").collect();
        assert_eq!(tokens, vec![""]);
    }

    #[test]
    fn fields_stop_at_field_count() {
        let fields = Tokenizer::new("1,2,3,4,5,6,7").fields();
        assert_eq!(&fields[..], &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn garbage_reads_as_zero() {
        assert_eq!(lenient_f64("abc"), 0.0);
        assert_eq!(lenient_f64(""), 0.0);
        assert_eq!(lenient_f64("12.5x"), 0.0);
        assert_eq!(lenient_f64("-122.4194"), -122.4194);
        assert_eq!(lenient_f64(" 7 "), 7.0);
    }
}
