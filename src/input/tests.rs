use std::io::Write as _;

use tempfile::NamedTempFile;

use super::distribute;
use crate::error::{AppError, AppResult, InputError};

fn fixture(lines: &[&str]) -> AppResult<NamedTempFile> {
    let mut file = NamedTempFile::new().map_err(|err| AppError::Io { source: err })?;
    for line in lines {
        writeln!(file, "{line}").map_err(|err| AppError::Io { source: err })?;
    }
    Ok(file)
}

fn tab_rows(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("env{i}\tvisitor{i}")).collect()
}

#[test]
fn shard_lengths_sum_to_min_of_lines_and_requested() -> AppResult<()> {
    for &(line_count, requested, shards) in &[
        (10_usize, 10_u64, 1_usize),
        (10, 10, 3),
        (10, 4, 2),
        (3, 10, 4),
        (37, 25, 7),
        (1, 1, 1),
        (50, 50, 50),
    ] {
        let rows = tab_rows(line_count);
        let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let file = fixture(&row_refs)?;
        let (built, summary) = distribute(file.path(), requested, shards, '\t', 2)?;

        let expected = requested.min(u64::try_from(line_count).unwrap_or(u64::MAX));
        assert_eq!(summary.enqueued, expected, "L={line_count} N={requested} C={shards}");
        let total: usize = summary.shard_lengths.iter().sum();
        assert_eq!(u64::try_from(total).unwrap_or(u64::MAX), expected);
        assert_eq!(built.len(), shards);

        let ceiling = requested
            .checked_add(u64::try_from(shards).unwrap_or(1).saturating_sub(1))
            .and_then(|padded| padded.checked_div(u64::try_from(shards).unwrap_or(1)))
            .unwrap_or(requested);
        for &len in &summary.shard_lengths {
            assert!(u64::try_from(len).unwrap_or(u64::MAX) <= ceiling);
        }
    }
    Ok(())
}

#[test]
fn full_shards_rotate_instead_of_dropping() -> AppResult<()> {
    // 9 rows over 3 shards of capacity 3: every row must land somewhere.
    let rows = tab_rows(9);
    let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = fixture(&row_refs)?;
    let (_shards, summary) = distribute(file.path(), 9, 3, '\t', 2)?;
    assert_eq!(summary.shard_lengths, vec![3, 3, 3]);
    assert_eq!(summary.enqueued, 9);
    Ok(())
}

#[test]
fn extra_lines_beyond_requested_are_left_unread() -> AppResult<()> {
    let rows = tab_rows(20);
    let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = fixture(&row_refs)?;
    let (_shards, summary) = distribute(file.path(), 5, 2, '\t', 2)?;
    assert_eq!(summary.enqueued, 5);
    assert!(summary.truncated);
    Ok(())
}

#[test]
fn short_input_is_not_an_error() -> AppResult<()> {
    let rows = tab_rows(3);
    let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = fixture(&row_refs)?;
    let (shards, summary) = distribute(file.path(), 100, 4, '\t', 2)?;
    assert_eq!(summary.enqueued, 3);
    assert!(!summary.truncated);
    // Later shards stay empty; every shard still exists for its connection.
    assert_eq!(shards.len(), 4);
    assert_eq!(summary.shard_lengths, vec![3, 0, 0, 0]);
    Ok(())
}

#[test]
fn malformed_rows_are_skipped_and_counted() -> AppResult<()> {
    let file = fixture(&[
        "env0\tvisitor0",
        "no-delimiter-here",
        "",
        "env1\tvisitor1",
    ])?;
    let (_shards, summary) = distribute(file.path(), 10, 1, '\t', 2)?;
    assert_eq!(summary.enqueued, 2);
    assert_eq!(summary.malformed, 2);
    Ok(())
}

#[test]
fn custom_delimiter_splits_fields() -> AppResult<()> {
    let file = fixture(&["env0,visitor0", "env1,visitor1"])?;
    let (shards, summary) = distribute(file.path(), 2, 1, ',', 2)?;
    assert_eq!(summary.enqueued, 2);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|err| AppError::Io { source: err })?;
    runtime.block_on(async {
        let first = shards.first();
        assert!(first.is_some());
        if let Some(shard) = first {
            let row = shard.pop().await;
            let fields: Vec<String> = row.map(|line| line.fields().to_vec()).unwrap_or_default();
            assert_eq!(fields, ["env0".to_owned(), "visitor0".to_owned()]);
        }
    });
    Ok(())
}

#[test]
fn empty_file_is_fatal() -> AppResult<()> {
    let file = fixture(&[])?;
    let result = distribute(file.path(), 10, 1, '\t', 2);
    assert!(matches!(result, Err(InputError::Empty { .. })));
    Ok(())
}

#[test]
fn shards_drain_to_none_once_exhausted() -> AppResult<()> {
    let rows = tab_rows(4);
    let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = fixture(&row_refs)?;
    let (shards, _summary) = distribute(file.path(), 4, 2, '\t', 2)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|err| AppError::Io { source: err })?;
    runtime.block_on(async {
        let mut drained = 0usize;
        for shard in &shards {
            while shard.pop().await.is_some() {
                drained = drained.saturating_add(1);
            }
            // A closed, empty shard keeps returning None.
            assert!(shard.pop().await.is_none());
        }
        assert_eq!(drained, 4);
    });
    Ok(())
}
