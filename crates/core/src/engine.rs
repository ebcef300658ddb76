use std::fmt;
use std::str::FromStr;

/// One of the RDBMS dialects this crate knows how to migrate between.
///
/// Case-sensitive by design (spec §3): `"Oracle"` and `"oracle"` are distinct
/// inputs, and only the lowercase spelling is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Engine {
    Oracle,
    Postgres,
    SqlServer,
    Mysql,
}

impl Engine {
    pub const ALL: [Engine; 4] = [Engine::Oracle, Engine::Postgres, Engine::SqlServer, Engine::Mysql];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Oracle => "oracle",
            Engine::Postgres => "postgres",
            Engine::SqlServer => "sqlserver",
            Engine::Mysql => "mysql",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oracle" => Ok(Engine::Oracle),
            "postgres" => Ok(Engine::Postgres),
            "sqlserver" => Ok(Engine::SqlServer),
            "mysql" => Ok(Engine::Mysql),
            _ => Err(()),
        }
    }
}

/// Currently certified source→target migration pairs (spec §4.C).
///
/// Only `oracle → postgres` is certified today; any other pair is allowed to
/// *run* only when the caller explicitly overrides `PairUncertified`.
#[must_use]
pub fn is_certified_pair(source: Engine, target: Engine) -> bool {
    matches!((source, target), (Engine::Oracle, Engine::Postgres))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_engines_case_sensitively() {
        assert_eq!("oracle".parse::<Engine>(), Ok(Engine::Oracle));
        assert!("Oracle".parse::<Engine>().is_err());
        assert!("ORACLE".parse::<Engine>().is_err());
    }

    #[test]
    fn only_oracle_to_postgres_is_certified() {
        assert!(is_certified_pair(Engine::Oracle, Engine::Postgres));
        assert!(!is_certified_pair(Engine::Postgres, Engine::Oracle));
        assert!(!is_certified_pair(Engine::Oracle, Engine::SqlServer));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for engine in Engine::ALL {
            assert_eq!(engine.to_string().parse::<Engine>(), Ok(engine));
        }
    }
}
