// GitHub DateTime (RFC 3339) to UTC. Every timestamp entering the domain goes
// through here, so comparisons downstream never mix offsets.

use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

pub fn parse_github_datetime(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s.trim(), &Rfc3339)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zulu_and_fractional_seconds() {
        let dt = parse_github_datetime("2024-01-02T03:04:05Z").unwrap();
        assert_eq!(dt.unix_timestamp(), 1_704_164_645);
        let frac = parse_github_datetime("2024-01-02T03:04:05.123Z").unwrap();
        assert_eq!(frac.unix_timestamp(), 1_704_164_645);
    }

    #[test]
    fn normalises_offsets_to_utc() {
        let dt = parse_github_datetime("2024-01-02T12:04:05+09:00").unwrap();
        assert_eq!(dt.offset(), UtcOffset::UTC);
        assert_eq!(dt, parse_github_datetime("2024-01-02T03:04:05Z").unwrap());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_github_datetime("2024-01-02 03:04:05").is_none());
        assert!(parse_github_datetime("").is_none());
    }
}
