use clap::{CommandFactory, Parser};
use mediagrid::tooling::cli::{CacheCommands, Cli, Commands};

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["mediagrid", "home"],
        vec!["mediagrid", "home", "--format", "json"],
        vec!["mediagrid", "list", "/videos", "--extra"],
        vec!["mediagrid", "thumbnail", "/videos/ep1.mkv"],
        vec!["mediagrid", "done", "/videos/ep1.mkv", "true"],
        vec!["mediagrid", "open", "/videos/ep1.mkv"],
        vec!["mediagrid", "dir-config", "/videos", "--sort", "size", "--item-size", "large"],
        vec!["mediagrid", "probe", "/videos/ep1.mkv", "--format", "json"],
        vec!["mediagrid", "cache", "clear", "videoInfo", "--yes"],
        vec!["mediagrid", "config", "check"],
        vec!["mediagrid", "watch", "--debounce-ms", "500"],
        vec!["mediagrid", "--data-dir", "/tmp/mg", "--log-level", "debug", "home"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_missing_arguments() {
    assert!(Cli::try_parse_from(["mediagrid", "list"]).is_err());
    assert!(Cli::try_parse_from(["mediagrid", "done", "/videos/ep1.mkv"]).is_err());
    assert!(Cli::try_parse_from(["mediagrid", "cache", "clear"]).is_err());
}

#[test]
fn cache_clear_defaults_to_confirming() {
    let cli = Cli::try_parse_from(["mediagrid", "cache", "clear", "done"]).unwrap();
    match cli.command {
        Commands::Cache {
            command: CacheCommands::Clear { namespace, yes },
        } => {
            assert_eq!(namespace, "done");
            assert!(!yes);
        }
        _ => panic!("expected cache clear"),
    }
}

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}
