use std::str::FromStr;

/// A line typed at the prompt.
///
/// Anything that is not a recognised keyword is treated as a move candidate
/// and checked against the legal moves of the current position; the prompt
/// reports an invalid command if it matches none of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(String),
    Search,
    Stop,
    Best,
    Perft(usize),
    Load(String),
    Save,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(());
        }

        let (keyword, rest) = match s.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (s, ""),
        };

        match (keyword.to_ascii_lowercase().as_str(), rest) {
            ("search", "") => Ok(Command::Search),
            ("stop", "") => Ok(Command::Stop),
            ("best", "") => Ok(Command::Best),
            ("save", "") => Ok(Command::Save),
            ("help" | "?", "") => Ok(Command::Help),
            ("quit" | "exit", "") => Ok(Command::Quit),
            ("perft", depth) => depth.parse().map(Command::Perft).map_err(|_| ()),
            ("load", "") => Err(()),
            ("load", source) => Ok(Command::Load(source.to_owned())),
            _ if rest.is_empty() => Ok(Command::Move(s.to_owned())),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keywords_parse_case_insensitively() {
        assert_eq!("search".parse(), Ok(Command::Search));
        assert_eq!("SEARCH".parse(), Ok(Command::Search));
        assert_eq!(" stop ".parse(), Ok(Command::Stop));
        assert_eq!("best".parse(), Ok(Command::Best));
        assert_eq!("save".parse(), Ok(Command::Save));
        assert_eq!("help".parse(), Ok(Command::Help));
        assert_eq!("?".parse(), Ok(Command::Help));
        assert_eq!("quit".parse(), Ok(Command::Quit));
        assert_eq!("exit".parse(), Ok(Command::Quit));
    }

    #[test]
    fn perft_takes_a_depth() {
        assert_eq!("perft 3".parse(), Ok(Command::Perft(3)));
        assert_eq!("perft  5".parse(), Ok(Command::Perft(5)));
        assert_eq!("perft".parse::<Command>(), Err(()));
        assert_eq!("perft x".parse::<Command>(), Err(()));
    }

    #[test]
    fn load_takes_a_source() {
        assert_eq!(
            "load kiwipete".parse(),
            Ok(Command::Load("kiwipete".to_owned()))
        );
        assert_eq!(
            "load 8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1".parse(),
            Ok(Command::Load("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1".to_owned()))
        );
        assert_eq!("load".parse::<Command>(), Err(()));
    }

    #[test]
    fn bare_words_become_move_candidates() {
        assert_eq!("e2e4".parse(), Ok(Command::Move("e2e4".to_owned())));
        assert_eq!("Ng1f3".parse(), Ok(Command::Move("Ng1f3".to_owned())));
        assert_eq!("e7e8Q".parse(), Ok(Command::Move("e7e8Q".to_owned())));
        assert_eq!("".parse::<Command>(), Err(()));
        assert_eq!("two words".parse::<Command>(), Err(()));
    }
}
