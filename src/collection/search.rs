//! Selecting tests by free-text query and tag expression.

use super::types::Test;
use crate::tag_expression::TagMatcher;
use std::borrow::Borrow;
use std::fmt;
use std::iter::FusedIterator;

/// Signal that a [`TestSearch`] has no further tests to give.
///
/// Returned by [`TestSearch::try_next`]; a search with zero matches returns
/// it on the very first call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted;

impl fmt::Display for Exhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no more matching tests")
    }
}

impl std::error::Error for Exhausted {}

/// Filter `tests` down to those matching `query` and `tag_expr`.
///
/// Either filter may be omitted; with neither, every test is yielded.
/// When both are given a test must satisfy both. Input order is kept, and
/// tests are examined one at a time as the result is consumed.
pub fn search_generally<'q, I>(
    tests: I,
    query: Option<&'q str>,
    tag_expr: Option<&'q dyn TagMatcher>,
) -> TestSearch<'q, I::IntoIter>
where
    I: IntoIterator,
    I::Item: Borrow<Test>,
{
    TestSearch {
        tests: tests.into_iter(),
        criteria: Criteria {
            query: query.filter(|q| !q.is_empty()),
            tag_expr,
        },
        finished: false,
    }
}

#[derive(Debug, Clone, Copy)]
struct Criteria<'q> {
    query: Option<&'q str>,
    tag_expr: Option<&'q dyn TagMatcher>,
}

impl Criteria<'_> {
    fn is_selected(&self, test: &Test) -> bool {
        self.passes_tags(test) && self.passes_query(test)
    }

    fn passes_tags(&self, test: &Test) -> bool {
        match self.tag_expr {
            None => true,
            Some(expr) if expr.matches_everything() => true,
            Some(expr) => !test.tags().is_empty() && expr.evaluate(test.tags()),
        }
    }

    fn passes_query(&self, test: &Test) -> bool {
        match self.query {
            None => true,
            Some(query) => matches_query(test, query),
        }
    }
}

/// Lazy, single-pass result of [`search_generally`].
pub struct TestSearch<'q, I> {
    tests: I,
    criteria: Criteria<'q>,
    finished: bool,
}

impl<I> TestSearch<'_, I>
where
    I: Iterator,
    I::Item: Borrow<Test>,
{
    /// Advance to the next matching test, or report [`Exhausted`].
    ///
    /// Once exhausted, every later call reports [`Exhausted`] again.
    pub fn try_next(&mut self) -> Result<I::Item, Exhausted> {
        self.next().ok_or(Exhausted)
    }
}

impl<I> Iterator for TestSearch<'_, I>
where
    I: Iterator,
    I::Item: Borrow<Test>,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let criteria = self.criteria;
        let found = self
            .tests
            .find(|test| criteria.is_selected(Borrow::<Test>::borrow(test)));
        self.finished = found.is_none();
        found
    }
}

impl<I> FusedIterator for TestSearch<'_, I>
where
    I: Iterator,
    I::Item: Borrow<Test>,
{
}

impl<I> fmt::Debug for TestSearch<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSearch")
            .field("criteria", &self.criteria)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Case-sensitive substring match against the test's names, description
/// and source text.
fn matches_query(test: &Test, query: &str) -> bool {
    test.qualified_name().contains(query)
        || test.name().contains(query)
        || test.description().is_some_and(|d| d.contains(query))
        || test.function().source().contains(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::types::TestFunction;
    use crate::tag_expression::TagExpression;
    use std::collections::BTreeSet;

    fn named() -> TestFunction {
        TestFunction::new("named", "def named():\n    assert \"fox\" == \"fox\"\n")
    }

    fn named_test() -> Test {
        Test::new(named(), "my_module")
    }

    fn tagged(module_name: &str, tags: &[&str]) -> Test {
        Test::new(named(), module_name).with_tags(tags.iter().copied())
    }

    fn parse(text: &str) -> TagExpression {
        TagExpression::from_text(text).unwrap()
    }

    fn by_tags(tests: &[Test], expr: &str) -> Vec<Test> {
        let expr = parse(expr);
        search_generally(tests, None, Some(&expr)).cloned().collect()
    }

    #[test]
    fn test_matches_on_qualified_test_name() {
        let tests = vec![named_test()];
        let results: Vec<&Test> = search_generally(&tests, Some("my_module.named"), None).collect();
        assert_eq!(results, vec![&tests[0]]);
    }

    #[test]
    fn test_matches_on_test_name_alone() {
        let tests = vec![named_test()];
        let results: Vec<&Test> = search_generally(&tests, Some("named"), None).collect();
        assert_eq!(results, vec![&tests[0]]);
    }

    #[test]
    fn test_matches_on_body_text() {
        let tests = vec![named_test()];
        let results: Vec<&Test> = search_generally(&tests, Some("fox"), None).collect();
        assert_eq!(results, vec![&tests[0]]);
    }

    #[test]
    fn test_matches_on_description() {
        let tests = vec![named_test().with_description("checks the hound")];
        assert_eq!(search_generally(&tests, Some("hound"), None).count(), 1);
    }

    #[test]
    fn test_query_is_case_sensitive() {
        let tests = vec![named_test()];
        assert_eq!(search_generally(&tests, Some("FOX"), None).count(), 0);
    }

    #[test]
    fn test_no_match_signals_exhaustion_immediately() {
        let tests = vec![named_test()];
        let mut results = search_generally(&tests, Some("92qj3f9i"), None);
        assert_eq!(results.try_next(), Err(Exhausted));
    }

    #[test]
    fn test_exhaustion_after_last_match_is_sticky() {
        let tests = vec![named_test()];
        let mut results = search_generally(&tests, Some("fox"), None);
        assert_eq!(results.try_next(), Ok(&tests[0]));
        assert_eq!(results.try_next(), Err(Exhausted));
        assert_eq!(results.try_next(), Err(Exhausted));
        assert!(results.next().is_none());
    }

    #[test]
    fn test_no_filters_yields_everything_in_order() {
        let tests = vec![tagged("one", &[]), tagged("two", &["x"]), tagged("three", &[])];
        let results: Vec<Test> = search_generally(&tests, None, None).cloned().collect();
        assert_eq!(results, tests);
    }

    #[test]
    fn test_empty_query_yields_everything() {
        let tests = vec![tagged("one", &[]), tagged("two", &[])];
        assert_eq!(search_generally(&tests, Some(""), None).count(), 2);
    }

    #[test]
    fn test_simple_tag_expression() {
        let apples = tagged("", &["apples"]);
        let bananas = tagged("", &["bananas"]);
        let tests = vec![apples.clone(), bananas];
        assert_eq!(by_tags(&tests, "apples"), vec![apples]);
    }

    #[test]
    fn test_complex_tag_expression() {
        let one = tagged("", &["apples", "bananas"]);
        let two = tagged("", &["bananas", "carrots"]);
        let three = tagged("", &["bananas"]);
        let tests = vec![one.clone(), two, three.clone()];
        assert_eq!(
            by_tags(&tests, "apples or bananas and not carrots"),
            vec![one, three]
        );
    }

    #[test]
    fn test_query_and_tag_expression_combine() {
        let one = tagged("one", &["apples"]);
        let two = tagged("two", &["apples"]);
        let tests = vec![one, two.clone()];
        let expr = parse("apples");
        let results: Vec<Test> = search_generally(&tests, Some("two"), Some(&expr))
            .cloned()
            .collect();
        assert_eq!(results, vec![two]);
    }

    #[test]
    fn test_untagged_test_never_matches_a_tag_expression() {
        let tests = vec![tagged("", &[])];
        assert!(by_tags(&tests, "apples").is_empty());
        assert!(by_tags(&tests, "not apples").is_empty());
    }

    #[test]
    fn test_empty_tag_expression_matches_everything() {
        let tests = vec![tagged("", &["apples"]), tagged("", &[])];
        assert_eq!(by_tags(&tests, ""), tests);
    }

    #[test]
    fn test_tag_expression_matching_nothing() {
        let tests = vec![tagged("one", &["apples"]), tagged("two", &["bananas"])];
        assert!(by_tags(&tests, "carrots").is_empty());
    }

    #[test]
    fn test_owned_tests_are_yielded_by_value() {
        let tests = vec![tagged("one", &["a"]), tagged("two", &["b"])];
        let expr = parse("b");
        let results: Vec<Test> = search_generally(tests, None, Some(&expr)).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].module_name(), "two");
    }

    #[test]
    fn test_custom_matcher() {
        #[derive(Debug)]
        struct HasTwoTags;

        impl TagMatcher for HasTwoTags {
            fn evaluate(&self, tags: &BTreeSet<String>) -> bool {
                tags.len() == 2
            }
        }

        let tests = vec![tagged("one", &["a"]), tagged("two", &["a", "b"])];
        let results: Vec<&Test> = search_generally(&tests, None, Some(&HasTwoTags)).collect();
        assert_eq!(results, vec![&tests[1]]);
    }

    #[test]
    fn test_only_consumes_what_is_requested() {
        let tests = vec![tagged("one", &[]), tagged("two", &[])];
        let mut seen = 0;
        let mut results = search_generally(
            tests.iter().inspect(|_| seen += 1),
            None,
            None,
        );
        assert!(results.next().is_some());
        drop(results);
        assert_eq!(seen, 1);
    }
}
