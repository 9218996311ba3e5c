//! 5字段cron表达式求值。
//!
//! 支持 `*`、字面量、`a-b` 闭区间、`a-b/step` 与 `*/step`。
//! 字段间为AND，字段内逗号分隔的token间为OR。
//! 纯函数，不依赖任何外部状态。

use crate::constants::cron::CRON_FIELDS_COUNT;
use chrono::{DateTime, Datelike, Timelike, Utc};

/// 表达式在给定时刻是否命中。
///
/// 字段顺序：分 时 日 月 周（周日=0）。
/// 字段数不等于5的表达式永不命中，也不会报错。
pub fn cron_match(expr: &str, t: DateTime<Utc>) -> bool {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != CRON_FIELDS_COUNT {
        return false;
    }

    let now_values = [
        t.minute(),
        t.hour(),
        t.day(),
        t.month(),
        t.weekday().num_days_from_sunday(),
    ];

    fields
        .iter()
        .zip(now_values)
        .all(|(field, now)| field_matches(field, now))
}

/// 单个字段：token的逗号OR
fn field_matches(field: &str, now: u32) -> bool {
    if field == "*" {
        return true;
    }

    field.split(',').any(|token| token_matches(token, now))
}

fn token_matches(token: &str, now: u32) -> bool {
    // 步进:  */5  或  10-30/2
    if let Some((range, step)) = token.split_once('/') {
        let Ok(step) = step.parse::<u32>() else {
            return false;
        };
        if step == 0 {
            return false;
        }
        // 与原有行为一致：`*` 的步进基准固定为 0-59，不随字段单位变化
        let (a, b) = if range == "*" {
            (0, 59)
        } else {
            match parse_range(range) {
                Some(bounds) => bounds,
                None => return false,
            }
        };
        return now >= a && now <= b && (now - a) % step == 0;
    }

    // 闭区间:  10-18
    if token.contains('-') {
        return match parse_range(token) {
            Some((a, b)) => now >= a && now <= b,
            None => false,
        };
    }

    // 字面量:  0  15
    token.parse::<u32>().map(|v| v == now).unwrap_or(false)
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    let (a, b) = range.split_once('-')?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_daily_literal() {
        assert!(cron_match("0 2 * * *", at(2024, 1, 1, 2, 0)));
        assert!(!cron_match("0 2 * * *", at(2024, 1, 1, 2, 1)));
        assert!(!cron_match("0 2 * * *", at(2024, 1, 1, 3, 0)));
    }

    #[test]
    fn test_step() {
        for minute in 0..60 {
            let hit = cron_match("*/15 * * * *", at(2024, 6, 1, 10, minute));
            assert_eq!(hit, minute % 15 == 0, "minute={minute}");
        }
    }

    #[test]
    fn test_range() {
        for hour in 0..24 {
            let hit = cron_match("* 10-18 * * *", at(2024, 6, 1, hour, 30));
            assert_eq!(hit, (10..=18).contains(&hour), "hour={hour}");
        }
    }

    #[test]
    fn test_stepped_range() {
        // 10-30/2: 区间内且与基准10同奇偶
        assert!(cron_match("10-30/2 * * * *", at(2024, 6, 1, 0, 12)));
        assert!(!cron_match("10-30/2 * * * *", at(2024, 6, 1, 0, 13)));
        assert!(!cron_match("10-30/2 * * * *", at(2024, 6, 1, 0, 32)));
    }

    #[test]
    fn test_comma_list() {
        assert!(cron_match("0,30 * * * *", at(2024, 6, 1, 5, 30)));
        assert!(cron_match("0,30 * * * *", at(2024, 6, 1, 5, 0)));
        assert!(!cron_match("0,30 * * * *", at(2024, 6, 1, 5, 15)));
    }

    #[test]
    fn test_day_of_week() {
        // 2024-01-07 是周日
        assert!(cron_match("* * * * 0", at(2024, 1, 7, 12, 0)));
        assert!(!cron_match("* * * * 0", at(2024, 1, 8, 12, 0)));
        // 工作日区间
        assert!(cron_match("* * * * 1-5", at(2024, 1, 8, 12, 0)));
    }

    #[test]
    fn test_malformed_never_matches() {
        let t = at(2024, 1, 1, 2, 0);
        assert!(!cron_match("0 2 * *", t)); // 4个字段
        assert!(!cron_match("0 2 * * * *", t)); // 6个字段
        assert!(!cron_match("", t));
        assert!(!cron_match("a b c d e", t));
        assert!(!cron_match("*/0 * * * *", t)); // 步长为0
        assert!(!cron_match("1-x * * * *", t));
    }
}
