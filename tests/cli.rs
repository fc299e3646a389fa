use clap::Parser;
use tempmail::cli::{AccountCommand, Cli, Command};
use tempmail::export::ExportFormat;

#[test]
fn parses_account_login() {
    let cli = Cli::try_parse_from([
        "tempmail",
        "account",
        "login",
        "--address",
        "bob@dom.test",
        "--password",
        "secret",
    ])
    .expect("cli parse should work");
    match cli.command {
        Command::Account(account) => match account.command {
            AccountCommand::Login(login) => {
                assert_eq!(login.address, "bob@dom.test");
                assert_eq!(login.password.as_deref(), Some("secret"));
            }
            _ => panic!("expected login"),
        },
        _ => panic!("expected account command"),
    }
}

#[test]
fn parses_account_logout_all() {
    let cli = Cli::try_parse_from(["tempmail", "account", "logout", "--all"])
        .expect("cli parse should work");
    match cli.command {
        Command::Account(account) => {
            assert!(matches!(account.command, AccountCommand::Logout(args) if args.all));
        }
        _ => panic!("expected account command"),
    }
}

#[test]
fn parses_get_with_peek() {
    let cli = Cli::try_parse_from(["tempmail", "get", "abc123", "--peek"])
        .expect("cli parse should work");
    match cli.command {
        Command::Get(get) => {
            assert_eq!(get.id, "abc123");
            assert!(get.peek);
        }
        _ => panic!("expected get command"),
    }
}

#[test]
fn parses_list_with_globals() {
    let cli = Cli::try_parse_from([
        "tempmail", "list", "--page", "2", "--limit", "5", "--q", "invoice", "--json", "-vv",
        "--profile", "work",
    ])
    .expect("cli parse should work");
    assert!(cli.json);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.profile, "work");
    match cli.command {
        Command::List(list) => {
            assert_eq!(list.page, 2);
            assert_eq!(list.limit, Some(5));
            assert_eq!(list.q.as_deref(), Some("invoice"));
        }
        _ => panic!("expected list command"),
    }
}

#[test]
fn list_defaults_to_first_page() {
    let cli = Cli::try_parse_from(["tempmail", "list"]).expect("cli parse should work");
    assert_eq!(cli.profile, "default");
    match cli.command {
        Command::List(list) => {
            assert_eq!(list.page, 1);
            assert!(list.limit.is_none());
        }
        _ => panic!("expected list command"),
    }
}

#[test]
fn parses_export_format() {
    let cli = Cli::try_parse_from([
        "tempmail", "export", "--format", "markdown", "--output", "out.md",
    ])
    .expect("cli parse should work");
    match cli.command {
        Command::Export(export) => {
            assert_eq!(export.format, ExportFormat::Markdown);
            assert_eq!(export.output.as_deref(), Some(std::path::Path::new("out.md")));
        }
        _ => panic!("expected export command"),
    }
}

#[test]
fn rejects_unknown_export_format() {
    assert!(Cli::try_parse_from(["tempmail", "export", "--format", "pdf"]).is_err());
}

#[test]
fn parses_watch_interval() {
    let cli = Cli::try_parse_from(["tempmail", "watch", "--interval", "10"])
        .expect("cli parse should work");
    match cli.command {
        Command::Watch(watch) => assert_eq!(watch.interval, Some(10)),
        _ => panic!("expected watch command"),
    }
}
