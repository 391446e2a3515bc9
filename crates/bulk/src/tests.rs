use super::*;
use anyhow::Result;
use block::Score;
use std::fs;
use std::io::Cursor;
use tempfile::tempdir;

// -------------------- Helpers --------------------

fn s(v: i64) -> Score {
    Score::new(v).unwrap()
}

fn set(addr: u32, v: i64) -> BulkRecord {
    BulkRecord {
        addr,
        change: Change::Set(s(v)),
    }
}

fn adjust(addr: u32, v: i64) -> BulkRecord {
    BulkRecord {
        addr,
        change: Change::Adjust(s(v)),
    }
}

fn replay_bytes(data: &[u8]) -> (Vec<BulkRecord>, BulkStats) {
    let mut recs = Vec::new();
    let stats = BulkReader::from_bytes(data)
        .replay(|r| recs.push(r))
        .unwrap();
    (recs, stats)
}

// -------------------- Line grammar --------------------

#[test]
fn plain_number_is_absolute_set() {
    assert_eq!(parse_line("1.2.3.4,100"), Ok(Some(set(0x0102_0304, 100))));
}

#[test]
fn bare_negative_is_absolute_set() {
    assert_eq!(parse_line("1.2.3.4,-25"), Ok(Some(set(0x0102_0304, -25))));
}

#[test]
fn plus_prefix_is_relative() {
    assert_eq!(parse_line("1.2.3.4,+10"), Ok(Some(adjust(0x0102_0304, 10))));
    assert_eq!(parse_line("1.2.3.4,+-10"), Ok(Some(adjust(0x0102_0304, -10))));
}

#[test]
fn whitespace_around_fields_is_allowed() {
    assert_eq!(
        parse_line("  \t10.0.0.1 ,\t +5  \r\n"),
        Ok(Some(adjust(0x0A00_0001, 5)))
    );
}

#[test]
fn trailing_comment_is_ignored() {
    assert_eq!(
        parse_line("10.0.0.1,42 # from feed A"),
        Ok(Some(set(0x0A00_0001, 42)))
    );
    assert_eq!(
        parse_line("10.0.0.1,42#tight"),
        Ok(Some(set(0x0A00_0001, 42)))
    );
}

#[test]
fn blank_and_comment_lines_yield_nothing() {
    assert_eq!(parse_line(""), Ok(None));
    assert_eq!(parse_line("   \t\r\n"), Ok(None));
    assert_eq!(parse_line("# header"), Ok(None));
    assert_eq!(parse_line("   # indented"), Ok(None));
}

#[test]
fn magnitudes_saturate() {
    assert_eq!(parse_line("1.1.1.1,99999"), Ok(Some(set(0x0101_0101, 32767))));
    assert_eq!(parse_line("1.1.1.1,-99999"), Ok(Some(set(0x0101_0101, -32767))));
    assert_eq!(
        parse_line("1.1.1.1,+-123456789012345678901234567890"),
        Ok(Some(adjust(0x0101_0101, -32767)))
    );
}

#[test]
fn malformed_lines_are_errors() {
    assert_eq!(parse_line("1.2.3.4"), Err(ParseError::MissingComma));
    assert_eq!(parse_line("1.2.3.4,"), Err(ParseError::EmptyChange));
    assert_eq!(parse_line("1.2.3.4, # nothing"), Err(ParseError::EmptyChange));
    assert!(matches!(parse_line("1.2.3,5"), Err(ParseError::Address(_))));
    assert!(matches!(parse_line("1.2.3.400,5"), Err(ParseError::Address(_))));
    assert!(matches!(parse_line(",5"), Err(ParseError::Address(_))));

    for bad in ["+", "-", "+-", "--5", "-+5", "5x", "1 2", "1,2", "++5"] {
        let line = format!("1.2.3.4,{bad}");
        assert!(
            matches!(parse_line(&line), Err(ParseError::InvalidChange(_))),
            "{line:?} should be rejected"
        );
    }
}

// -------------------- Replay & stats --------------------

#[test]
fn replay_applies_in_order_and_counts() {
    let feed = b"# comment\n\
                 10.0.0.1,100\n\
                 \n\
                 10.0.0.2,+5\n\
                 10.0.0.1,+-30\n\
                 garbage\n\
                 10.0.0.3,-7\n";
    let (recs, stats) = replay_bytes(feed);

    assert_eq!(
        recs,
        vec![
            set(0x0A00_0001, 100),
            adjust(0x0A00_0002, 5),
            adjust(0x0A00_0001, -30),
            set(0x0A00_0003, -7),
        ]
    );
    assert_eq!(stats.lines_processed, 5);
    assert_eq!(stats.lines_skipped, 2);
    assert_eq!(stats.sets, 2);
    assert_eq!(stats.updates, 2);
    assert_eq!(stats.parse_errors, 1);
}

#[test]
fn crlf_and_missing_final_newline() {
    let (recs, stats) = replay_bytes(b"1.1.1.1,1\r\n2.2.2.2,+2");
    assert_eq!(recs, vec![set(0x0101_0101, 1), adjust(0x0202_0202, 2)]);
    assert_eq!(stats.lines_processed, 2);
    assert_eq!(stats.parse_errors, 0);
}

#[test]
fn invalid_utf8_line_is_a_parse_error() {
    let (recs, stats) = replay_bytes(b"1.1.1.1,1\n\xff\xfe,3\n2.2.2.2,2\n");
    assert_eq!(recs.len(), 2);
    assert_eq!(stats.parse_errors, 1);
    assert_eq!(stats.lines_processed, 3);
}

#[test]
fn empty_input_yields_zero_stats() {
    let (recs, stats) = replay_bytes(b"");
    assert!(recs.is_empty());
    assert_eq!(stats.lines_processed, 0);
    assert_eq!(stats.lines_skipped, 0);
    assert_eq!(stats.lines_per_second, 0.0);
}

#[test]
fn lines_per_second_is_consistent_with_elapsed() {
    let feed = "9.9.9.9,+1\n".repeat(10_000);
    let (_, stats) = replay_bytes(feed.as_bytes());
    assert_eq!(stats.lines_processed, 10_000);
    assert!(stats.elapsed_seconds >= 0.0);
    if stats.elapsed_seconds > 0.0 {
        let expected = stats.lines_processed as f64 / stats.elapsed_seconds;
        assert!((stats.lines_per_second - expected).abs() < 1e-6 * expected);
    }
}

#[test]
fn from_reader_accepts_any_bufread() {
    let mut recs = Vec::new();
    let stats = BulkReader::from_reader(Cursor::new(b"3.3.3.3,3\n".to_vec()))
        .replay(|r| recs.push(r))
        .unwrap();
    assert_eq!(recs, vec![set(0x0303_0303, 3)]);
    assert_eq!(stats.sets, 1);
}

// -------------------- Files --------------------

#[test]
fn open_and_replay_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("feed.csv");
    fs::write(&path, "# nightly\n192.0.2.1,+100\n198.51.100.7,-50\n")?;

    let mut recs = Vec::new();
    let stats = BulkReader::open(&path)?.replay(|r| recs.push(r))?;

    assert_eq!(recs, vec![adjust(0xC000_0201, 100), set(0xC633_6407, -50)]);
    assert_eq!(stats.lines_skipped, 1);
    Ok(())
}

#[test]
fn open_missing_file_fails() {
    let dir = tempdir().unwrap();
    assert!(BulkReader::open(dir.path().join("missing.csv")).is_err());
}
