//! CSV import for transactions, wellbeing check-ins and income
//!
//! Columns are found by header name, so column order does not matter and
//! extra columns are ignored. Accepted layouts:
//!
//! - transactions: `date,category,amount`
//! - wellbeing: `date,overall,sleep,activity,social,diet,stress` (the full
//!   metric names such as `overall_wellbeing` also work)
//! - income: `date,amount`

use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{IncomeRecord, Transaction, WellbeingMetric, WellbeingRecord};

/// Parse spending transactions
pub fn parse_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    let date_col = column(&headers, &["date", "transaction date"])?;
    let category_col = column(&headers, &["category"])?;
    let amount_col = column(&headers, &["amount"])?;

    let mut transactions = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let line = line_of(&record, idx);

        let date = parse_date(field(&record, date_col, line)?)
            .map_err(|e| at_line(line, e))?;
        let category = field(&record, category_col, line)?;
        if category.is_empty() {
            return Err(Error::InvalidData(format!("line {}: empty category", line)));
        }
        let amount = parse_amount(field(&record, amount_col, line)?)
            .map_err(|e| at_line(line, e))?;
        if amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "line {}: negative amount {}",
                line, amount
            )));
        }

        transactions.push(Transaction::new(date, category, amount));
    }

    debug!(count = transactions.len(), "Parsed transactions");
    Ok(transactions)
}

/// Parse daily wellbeing check-ins. Every metric must be in `[1, 10]`.
pub fn parse_wellbeing<R: Read>(reader: R) -> Result<Vec<WellbeingRecord>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    let date_col = column(&headers, &["date"])?;
    let metric_cols = WellbeingMetric::all()
        .iter()
        .map(|&metric| Ok((metric, column(&headers, &metric_aliases(metric))?)))
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let line = line_of(&record, idx);

        let date = parse_date(field(&record, date_col, line)?)
            .map_err(|e| at_line(line, e))?;

        let mut check_in = WellbeingRecord {
            date,
            overall_wellbeing: 0,
            sleep_quality: 0,
            physical_activity: 0,
            social_time: 0,
            diet_quality: 0,
            stress_level: 0,
        };
        for &(metric, col) in &metric_cols {
            let value = parse_rating(field(&record, col, line)?, metric, line)?;
            match metric {
                WellbeingMetric::OverallWellbeing => check_in.overall_wellbeing = value,
                WellbeingMetric::SleepQuality => check_in.sleep_quality = value,
                WellbeingMetric::PhysicalActivity => check_in.physical_activity = value,
                WellbeingMetric::SocialTime => check_in.social_time = value,
                WellbeingMetric::DietQuality => check_in.diet_quality = value,
                WellbeingMetric::StressLevel => check_in.stress_level = value,
            }
        }

        records.push(check_in);
    }

    debug!(count = records.len(), "Parsed wellbeing check-ins");
    Ok(records)
}

/// Parse income entries
pub fn parse_income<R: Read>(reader: R) -> Result<Vec<IncomeRecord>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    let date_col = column(&headers, &["date"])?;
    let amount_col = column(&headers, &["amount", "income"])?;

    let mut income = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let line = line_of(&record, idx);

        let date = parse_date(field(&record, date_col, line)?)
            .map_err(|e| at_line(line, e))?;
        let amount = parse_amount(field(&record, amount_col, line)?)
            .map_err(|e| at_line(line, e))?;
        if amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "line {}: negative income {}",
                line, amount
            )));
        }

        income.push(IncomeRecord { date, amount });
    }

    debug!(count = income.len(), "Parsed income records");
    Ok(income)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
}

/// Index of the first header matching one of `names`, case-insensitively
fn column(headers: &StringRecord, names: &[&str]) -> Result<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        .ok_or_else(|| Error::Import(format!("Missing column: {}", names[0])))
}

fn field(record: &StringRecord, col: usize, line: usize) -> Result<&str> {
    record
        .get(col)
        .ok_or_else(|| Error::Import(format!("line {}: missing column {}", line, col + 1)))
}

fn metric_aliases(metric: WellbeingMetric) -> [&'static str; 2] {
    let short = match metric {
        WellbeingMetric::OverallWellbeing => "overall",
        WellbeingMetric::SleepQuality => "sleep",
        WellbeingMetric::PhysicalActivity => "activity",
        WellbeingMetric::SocialTime => "social",
        WellbeingMetric::DietQuality => "diet",
        WellbeingMetric::StressLevel => "stress",
    };
    [short, metric.as_str()]
}

/// Physical line a record starts on. Falls back to counting records after
/// the header when the reader has no position.
fn line_of(record: &StringRecord, idx: usize) -> usize {
    record
        .position()
        .map_or(idx + 2, |pos| pos.line() as usize)
}

fn at_line(line: usize, err: Error) -> Error {
    match err {
        Error::Import(msg) => Error::Import(format!("line {}: {}", line, msg)),
        other => other,
    }
}

/// Parse a date in ISO or US format
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and commas
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned = s.trim().replace(['$', ',', ' '], "");

    let amount = cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))?;
    if amount.is_finite() {
        Ok(amount)
    } else {
        Err(Error::Import(format!("Unable to parse amount: {}", s)))
    }
}

fn parse_rating(s: &str, metric: WellbeingMetric, line: usize) -> Result<u8> {
    let value: u8 = s.trim().parse().map_err(|_| {
        Error::InvalidData(format!("line {}: {} is not a rating: {}", line, metric, s))
    })?;
    if !(1..=10).contains(&value) {
        return Err(Error::InvalidData(format!(
            "line {}: {} must be between 1 and 10, got {}",
            line, metric, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("01/15/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(parse_date("15.01.2024").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount(" 42 ").unwrap(), 42.0);
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("lots").is_err());
    }

    #[test]
    fn test_parse_transactions() {
        let csv = "date,category,amount
2024-01-15,Entertainment,$15.99
01/16/2024,food,\"1,020.00\"";

        let transactions = parse_transactions(csv.as_bytes()).unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].category, "Entertainment");
        assert_eq!(transactions[0].amount, 15.99);
        assert_eq!(transactions[1].amount, 1020.0);
        assert_eq!(
            transactions[1].date,
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );
    }

    #[test]
    fn test_columns_found_by_header() {
        let csv = "Amount,Note,Category,Date
12.50,movie night,entertainment,2024-02-01";

        let transactions = parse_transactions(csv.as_bytes()).unwrap();
        assert_eq!(transactions[0].category, "entertainment");
        assert_eq!(transactions[0].amount, 12.5);
    }

    #[test]
    fn test_negative_amount_reports_line() {
        let csv = "date,category,amount
2024-01-15,food,10.00
2024-01-16,food,-4.00";

        match parse_transactions(csv.as_bytes()) {
            Err(Error::InvalidData(msg)) => assert!(msg.contains("line 3"), "{}", msg),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_error_line_skips_blank_and_multiline_rows() {
        let csv = "date,category,amount

2024-01-15,\"food
and drink\",10.00
2024-01-16,food,-4.00";

        match parse_transactions(csv.as_bytes()) {
            Err(Error::InvalidData(msg)) => assert!(msg.contains("line 5"), "{}", msg),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_column() {
        let csv = "date,amount\n2024-01-15,10.00";
        assert!(matches!(
            parse_transactions(csv.as_bytes()),
            Err(Error::Import(_))
        ));
    }

    #[test]
    fn test_parse_wellbeing() {
        let csv = "date,overall,sleep,activity,social,diet,stress
2024-01-15,7,6,5,8,6,3
2024-01-16,8,7,4,6,7,2";

        let records = parse_wellbeing(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].overall_wellbeing, 7);
        assert_eq!(records[0].social_time, 8);
        assert_eq!(records[1].stress_level, 2);
    }

    #[test]
    fn test_wellbeing_full_metric_names() {
        let csv = "date,overall_wellbeing,sleep_quality,physical_activity,social_time,diet_quality,stress_level
2024-01-15,7,6,5,8,6,3";

        let records = parse_wellbeing(csv.as_bytes()).unwrap();
        assert_eq!(records[0].value(WellbeingMetric::DietQuality), 6);
    }

    #[test]
    fn test_wellbeing_out_of_range() {
        let csv = "date,overall,sleep,activity,social,diet,stress
2024-01-15,7,6,5,8,6,3
2024-01-16,7,11,5,8,6,3";

        match parse_wellbeing(csv.as_bytes()) {
            Err(Error::InvalidData(msg)) => {
                assert!(msg.contains("line 3"), "{}", msg);
                assert!(msg.contains("sleep_quality"), "{}", msg);
            }
            other => panic!("unexpected: {:?}", other),
        }

        let zero = "date,overall,sleep,activity,social,diet,stress\n2024-01-15,0,6,5,8,6,3";
        assert!(matches!(
            parse_wellbeing(zero.as_bytes()),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_parse_income() {
        let csv = "date,amount
2024-01-01,\"$2,500.00\"
2024-01-15,2500";

        let income = parse_income(csv.as_bytes()).unwrap();
        assert_eq!(income.len(), 2);
        assert_eq!(income[0].amount, 2500.0);

        let negative = "date,amount\n2024-01-01,-10";
        assert!(matches!(
            parse_income(negative.as_bytes()),
            Err(Error::InvalidData(_))
        ));
    }
}
