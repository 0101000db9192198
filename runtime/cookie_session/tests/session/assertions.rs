use googletest::matcher::{self, Matcher, MatcherBase};

/// Check if a `Set-Cookie` header asks the client to delete the cookie, thus invalidating the session.
pub fn is_removal_cookie() -> RemovalCookieMatcher {
    RemovalCookieMatcher
}

#[derive(Clone, Copy, matcher::MatcherBase)]
pub struct RemovalCookieMatcher;

impl Matcher<&str> for RemovalCookieMatcher {
    fn matches(&self, actual: &str) -> matcher::MatcherResult {
        let Some((pair, attributes)) = actual.split_once(';') else {
            return matcher::MatcherResult::NoMatch;
        };
        let empty_value = pair.trim().ends_with('=');
        let expired = attributes
            .split(';')
            .map(str::trim)
            .any(|attribute| attribute == "Expires=Thu, 01 Jan 1970 00:00:00 GMT");
        (empty_value && expired).into()
    }

    fn describe(
        &self,
        matcher_result: matcher::MatcherResult,
    ) -> googletest::description::Description {
        match matcher_result {
            matcher::MatcherResult::Match => "is a removal cookie",
            matcher::MatcherResult::NoMatch => "isn't a removal cookie",
        }
        .into()
    }
}
