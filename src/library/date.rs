/// Byte offsets of the fields inside a date directory name such as
/// `2024051114`. The device emits fixed-width digit strings, so plain
/// slicing is enough; no numeric validation is performed.
const YEAR: std::ops::Range<usize> = 0..4;
const MONTH: std::ops::Range<usize> = 4..6;
const DAY: std::ops::Range<usize> = 6..8;
const HOUR: std::ops::Range<usize> = 8..10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParts {
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
}

impl DateParts {
    pub fn formatted(&self) -> String {
        format!("{}-{}-{} {}:00", self.year, self.month, self.day, self.hour)
    }
}

pub fn parse_date_string(date_str: &str) -> DateParts {
    let slice = |range: std::ops::Range<usize>| date_str.get(range).unwrap_or("").to_string();

    DateParts {
        year: slice(YEAR),
        month: slice(MONTH),
        day: slice(DAY),
        hour: slice(HOUR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_fixed_width_fields() {
        let parts = parse_date_string("2024051114");
        assert_eq!(parts.year, "2024");
        assert_eq!(parts.month, "05");
        assert_eq!(parts.day, "11");
        assert_eq!(parts.hour, "14");
        assert_eq!(parts.formatted(), "2024-05-11 14:00");
    }

    #[test]
    fn short_strings_produce_empty_fields() {
        let parts = parse_date_string("2024");
        assert_eq!(parts.year, "2024");
        assert_eq!(parts.month, "");
        assert_eq!(parts.formatted(), "2024-- :00");
    }
}
