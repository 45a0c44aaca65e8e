use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scopetui")]
#[command(about = "Reconcile plugin install scopes across user, project and local settings", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Project directory whose settings are read (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the merged plugin list
    List,
    /// Print the enabled flags found in each settings file
    Scopes,
    /// Write the installed plugins to a JSON file
    Export {
        file: PathBuf,
    },
    /// Install the plugins listed in an export file
    Import {
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_import_with_global_dir() {
        let cli = Cli::parse_from(["scopetui", "import", "plugins.json", "--yes", "--dir", "/work"]);
        assert_eq!(cli.dir, Some(PathBuf::from("/work")));
        match cli.command {
            Some(Commands::Import { file, yes }) => {
                assert_eq!(file, PathBuf::from("plugins.json"));
                assert!(yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_subcommand_runs_tui() {
        let cli = Cli::parse_from(["scopetui"]);
        assert!(cli.command.is_none());
        assert!(cli.dir.is_none());
    }
}
