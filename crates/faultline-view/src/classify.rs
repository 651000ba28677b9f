use facet::Facet;

/// Coarse service category inferred from the display name; picks the icon.
#[derive(Facet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[facet(rename_all = "snake_case")]
pub enum ServiceKind {
    Server,
    Database,
    Mobile,
    Web,
}

impl ServiceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Database => "database",
            Self::Mobile => "mobile",
            Self::Web => "web",
        }
    }
}

struct KindRule {
    kind: ServiceKind,
    fragments: &'static [&'static str],
}

/// Highest priority first.
const RULES: &[KindRule] = &[
    KindRule {
        kind: ServiceKind::Web,
        fragments: &["frontend", "web"],
    },
    KindRule {
        kind: ServiceKind::Mobile,
        fragments: &["mobile", "ios"],
    },
    KindRule {
        kind: ServiceKind::Database,
        fragments: &["db", "redis"],
    },
];

pub fn classify(service_name: &str) -> ServiceKind {
    let name = service_name.to_ascii_lowercase();
    RULES
        .iter()
        .find(|rule| rule.fragments.iter().any(|fragment| name.contains(fragment)))
        .map_or(ServiceKind::Server, |rule| rule.kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_fragments_pick_a_kind() {
        assert_eq!(classify("web-frontend"), ServiceKind::Web);
        assert_eq!(classify("mobile-api"), ServiceKind::Mobile);
        assert_eq!(classify("ios-app"), ServiceKind::Mobile);
        assert_eq!(classify("redis-cache"), ServiceKind::Database);
        assert_eq!(classify("orders-db"), ServiceKind::Database);
        assert_eq!(classify("postgres-primary"), ServiceKind::Server);
        assert_eq!(classify(""), ServiceKind::Server);
    }

    #[test]
    fn priority_and_case() {
        assert_eq!(classify("mobile-web"), ServiceKind::Web);
        assert_eq!(classify("ios-db-sync"), ServiceKind::Mobile);
        assert_eq!(classify("Redis-Cache"), ServiceKind::Database);
        assert_eq!(classify("WebGateway"), ServiceKind::Web);
    }
}
