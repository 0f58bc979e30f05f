//! Command parser for the : command system

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Rows
    Add {
        address: Option<String>,
        label: Option<String>,
    },
    Import(Option<String>),
    ImportText(Option<String>),
    Delete,
    Copy,
    Export,

    // Queries
    Query,
    Stop,
    Refresh,
    Stats,

    // Table settings
    Title(String),
    PageSize(Option<usize>),
    Page(usize),

    Help,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match cmd.to_lowercase().as_str() {
        // Rows
        "add" | "a" => {
            let mut words = args.as_deref().unwrap_or("").split_whitespace();
            let address = words.next().map(str::to_string);
            let label = words.collect::<Vec<_>>().join(" ");
            Command::Add {
                address,
                label: Some(label).filter(|l| !l.is_empty()),
            }
        }
        "import" | "imp" | "load" => Command::Import(args),
        "import-text" | "paste" => Command::ImportText(args),
        "delete" | "del" | "rm" => Command::Delete,
        "copy" | "yank" => Command::Copy,
        "export" | "csv" => Command::Export,

        // Queries
        "query" | "q!" | "run" => Command::Query,
        "stop" | "cancel" => Command::Stop,
        "refresh" | "r" => Command::Refresh,
        "stats" => Command::Stats,

        // Table settings
        "title" => Command::Title(args.unwrap_or_default()),
        "pagesize" | "ps" => match args {
            None => Command::PageSize(None),
            Some(n) => match n.parse() {
                Ok(size) => Command::PageSize(Some(size)),
                Err(_) => Command::Unknown(input.to_string()),
            },
        },
        "page" | "p" => match args.and_then(|n| n.parse().ok()) {
            Some(page) => Command::Page(page),
            None => Command::Unknown(input.to_string()),
        },

        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,

        _ => Command::Unknown(input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        assert_eq!(
            parse_command("add"),
            Command::Add {
                address: None,
                label: None
            }
        );
        assert_eq!(
            parse_command("add 0x1234 cold  wallet"),
            Command::Add {
                address: Some("0x1234".to_string()),
                label: Some("cold wallet".to_string())
            }
        );
    }

    #[test]
    fn test_parse_import_commands() {
        assert_eq!(
            parse_command("import ~/wallets.xlsx"),
            Command::Import(Some("~/wallets.xlsx".to_string()))
        );
        assert_eq!(parse_command("import"), Command::Import(None));
        assert_eq!(
            parse_command("import-text 0xa, 0xb"),
            Command::ImportText(Some("0xa, 0xb".to_string()))
        );
    }

    #[test]
    fn test_parse_table_settings() {
        assert_eq!(parse_command("pagesize"), Command::PageSize(None));
        assert_eq!(parse_command("ps 50"), Command::PageSize(Some(50)));
        assert_eq!(parse_command("page 3"), Command::Page(3));
        assert_eq!(
            parse_command("title  Cold storage "),
            Command::Title("Cold storage".to_string())
        );
        assert_eq!(parse_command("title"), Command::Title(String::new()));
    }

    #[test]
    fn test_parse_queries() {
        assert_eq!(parse_command("query"), Command::Query);
        assert_eq!(parse_command("STOP"), Command::Stop);
        assert_eq!(parse_command("q"), Command::Quit);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse_command("notacommand"),
            Command::Unknown("notacommand".to_string())
        );
        assert_eq!(parse_command("page x"), Command::Unknown("page x".to_string()));
        assert_eq!(
            parse_command("pagesize big"),
            Command::Unknown("pagesize big".to_string())
        );
    }
}
