//! Small conversions shared by the Diesel repositories.

use pagination::PageRequest;

/// `(offset, limit)` of a page request as SQL `BIGINT`s.
pub(crate) fn page_bounds(page: &PageRequest) -> (i64, i64) {
    (
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
        i64::from(page.limit()),
    )
}

/// SQL `COUNT(*)` as an unsigned tally.
pub(crate) fn tally(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// Collect row conversions, mapping the first failure through `map_err`.
pub(crate) fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagination::Cursor;
    use rstest::rstest;

    #[rstest]
    fn page_bounds_follow_the_cursor() {
        let page = PageRequest::new(Some(25), Some(Cursor::at(50)));
        assert_eq!(page_bounds(&page), (50, 25));
    }

    #[rstest]
    #[case(3, 3)]
    #[case(-1, 0)]
    fn tallies_are_never_negative(#[case] count: i64, #[case] expected: u64) {
        assert_eq!(tally(count), expected);
    }

    #[rstest]
    fn first_conversion_failure_wins() {
        let rows = vec![Ok(1), Err("bad".to_owned()), Err("worse".to_owned())];
        let err = collect_rows(rows.into_iter(), |msg| msg).expect_err("failure");
        assert_eq!(err, "bad");
    }
}
