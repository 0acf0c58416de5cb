/// Parses a compact ISO 8601 duration token into whole seconds.
///
/// Accepts the forms the catalog emits: `PT4M33S`, `PT1H2M10S`, `PT45S`,
/// `P1DT2H`, `P0D`. Anything malformed yields 0, which the duration filter
/// then rejects.
pub fn parse_duration(token: &str) -> u32 {
    parse_components(token.trim()).unwrap_or(0)
}

fn parse_components(token: &str) -> Option<u32> {
    let rest = token.strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => {
            if time.is_empty() {
                return None;
            }
            (date, Some(time))
        }
        None => (rest, None),
    };

    let mut total: u64 = 0;

    for (value, unit) in components(date_part)? {
        let scale = match unit {
            'D' => 86_400,
            'W' => 604_800,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(scale)?)?;
    }

    if let Some(time) = time_part {
        for (value, unit) in components(time)? {
            let scale = match unit {
                'H' => 3_600,
                'M' => 60,
                'S' => 1,
                _ => return None,
            };
            total = total.checked_add(value.checked_mul(scale)?)?;
        }
    }

    u32::try_from(total).ok()
}

/// Splits `4M33S` into `[(4, 'M'), (33, 'S')]`
fn components(part: &str) -> Option<Vec<(u64, char)>> {
    let mut out = Vec::new();
    let mut digits = String::new();

    for c in part.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else {
            if digits.is_empty() {
                return None;
            }
            out.push((digits.parse().ok()?, c));
            digits.clear();
        }
    }

    if !digits.is_empty() {
        return None;
    }

    Some(out)
}

/// Formats seconds as `M:SS`
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes_seconds() {
        assert_eq!(parse_duration("PT4M33S"), 273);
    }

    #[test]
    fn test_parse_hours_minutes_seconds() {
        assert_eq!(parse_duration("PT1H2M10S"), 3730);
    }

    #[test]
    fn test_parse_partial_components() {
        assert_eq!(parse_duration("PT45S"), 45);
        assert_eq!(parse_duration("PT5M"), 300);
        assert_eq!(parse_duration("PT2H"), 7200);
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_duration("P1DT2H"), 93_600);
    }

    #[test]
    fn test_live_stream_is_zero() {
        assert_eq!(parse_duration("P0D"), 0);
    }

    #[test]
    fn test_malformed_is_zero() {
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("4M33S"), 0);
        assert_eq!(parse_duration("PT"), 0);
        assert_eq!(parse_duration("PTM"), 0);
        assert_eq!(parse_duration("PT4X"), 0);
        assert_eq!(parse_duration("PT12"), 0);
    }

    #[test]
    fn test_oversized_components_are_zero() {
        assert_eq!(parse_duration("P99999999999999999D"), 0);
        assert_eq!(parse_duration("PT18446744073709551615H"), 0);
        assert_eq!(parse_duration("PT18446744073709551615S18446744073709551615S"), 0);
        // Past u32 seconds but within u64
        assert_eq!(parse_duration("PT4294967296S"), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(273), "4:33");
        assert_eq!(format_duration(3730), "62:10");
    }
}
