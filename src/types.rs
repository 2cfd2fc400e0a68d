/// Outcome of evaluating one request, borrowing names from the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'m> {
    /// The request URL has no usable host
    NoHost,
    /// The host is not listed in any enabled category
    NotListed,
    /// Listed, but the request and the current page belong to the same entity
    FirstParty { category: &'m str, entity: &'m str },
    /// Listed tracker request
    Blocked { category: &'m str },
}

impl<'m> Verdict<'m> {
    /// True when the request should be cancelled
    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Blocked { .. })
    }

    /// Category that listed the host, if any
    pub fn category(&self) -> Option<&'m str> {
        match *self {
            Verdict::FirstParty { category, .. } | Verdict::Blocked { category } => Some(category),
            Verdict::NoHost | Verdict::NotListed => None,
        }
    }
}
