use model::Address;

/// The three broadcast topic families (§4.6, §6 "WebSocket topics").
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Price(String),
    Pool(String),
    User(Address),
}

impl Topic {
    /// Parses a raw `price.<symbol>` / `pool.<poolId>` / `user.<address>`
    /// topic string. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(symbol) = raw.strip_prefix("price.") {
            return (!symbol.is_empty()).then(|| Topic::Price(symbol.to_string()));
        }
        if let Some(pool_id) = raw.strip_prefix("pool.") {
            return (!pool_id.is_empty()).then(|| Topic::Pool(pool_id.to_string()));
        }
        if let Some(address) = raw.strip_prefix("user.") {
            return address.parse().ok().map(Topic::User);
        }
        None
    }

    /// `user.<address>` topics require the subscriber to be authenticated as
    /// that exact address (§4.6 "authenticated topics").
    pub fn requires_auth(&self) -> bool {
        matches!(self, Topic::User(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_topic_family() {
        assert_eq!(Topic::parse("price.ETH"), Some(Topic::Price("ETH".into())));
        assert_eq!(Topic::parse("pool.abcd"), Some(Topic::Pool("abcd".into())));
        assert!(matches!(
            Topic::parse("user.0x0000000000000000000000000000000000dead"),
            Some(Topic::User(_))
        ));
    }

    #[test]
    fn rejects_unknown_or_malformed_topics() {
        assert_eq!(Topic::parse("price."), None);
        assert_eq!(Topic::parse("unknown.thing"), None);
        assert_eq!(Topic::parse("user.not-an-address"), None);
    }

    #[test]
    fn only_user_topics_require_auth() {
        assert!(!Topic::parse("price.ETH").unwrap().requires_auth());
        assert!(!Topic::parse("pool.abcd").unwrap().requires_auth());
        assert!(Topic::parse("user.0x0000000000000000000000000000000000dead")
            .unwrap()
            .requires_auth());
    }
}
