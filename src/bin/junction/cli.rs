use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use junction::{MessageTypeFilter, RouteSettings, Transpose};

#[derive(Parser, Debug)]
#[command(name = "junction")]
#[command(about = "Route MIDI between ports with per-route filtering and transposition")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
    /// Route file (defaults to <config dir>/junction/routes.json)
    #[arg(short, long, value_name = "PATH", global = true)]
    pub store: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List MIDI input and output ports
    Ports,
    /// List routes
    Routes,
    #[command(flatten)]
    Route(RouteCommand),
    /// Route messages, taking route commands from standard input
    Run,
    /// List the transpose options
    Transposes,
    /// List the message types a route can filter on
    Types,
}

/// Route edits, accepted both as subcommands and while running.
#[derive(Subcommand, Debug)]
pub enum RouteCommand {
    /// Add a route from IN to OUT
    Add {
        /// Input port id or name fragment (first input if omitted)
        input: Option<String>,
        /// Output port id or name fragment (first output if omitted)
        output: Option<String>,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Change a route's settings, keeping whatever isn't given
    Edit {
        index: usize,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Remove a route
    Remove { index: usize },
}

/// One line typed while `run` is routing.
#[derive(Parser, Debug)]
#[command(name = "junction", no_binary_name = true, disable_version_flag = true)]
pub struct LiveLine {
    #[command(subcommand)]
    pub command: LiveCommand,
}

#[derive(Subcommand, Debug)]
pub enum LiveCommand {
    #[command(flatten)]
    Route(RouteCommand),
    /// List routes
    Routes,
    /// List MIDI input and output ports
    Ports,
    /// Show message counts per port
    Activity,
    /// Stop routing
    #[command(alias = "exit")]
    Quit,
}

impl LiveLine {
    /// Parse a typed line. `Ok(None)` for a blank line.
    pub fn parse_line(line: &str) -> Result<Option<Self>, clap::Error> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Ok(None);
        }
        Self::try_parse_from(words).map(Some)
    }
}

#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Semitones to shift note and key pressure messages by
    #[arg(short, long, allow_negative_numbers = true,
          value_parser = clap::value_parser!(i32).range(-12..=12))]
    pub transpose: Option<i32>,

    /// Only pass these message types (e.g. 8,9)
    #[arg(long, value_delimiter = ',', conflicts_with = "all_types",
          value_parser = clap::value_parser!(u8).range(8..=14))]
    pub types: Option<Vec<u8>>,

    /// Pass every message type
    #[arg(long)]
    pub all_types: bool,

    /// Forward active sense messages
    #[arg(long, overrides_with = "no_active_sense")]
    pub active_sense: bool,

    /// Drop active sense messages
    #[arg(long, overrides_with = "active_sense")]
    pub no_active_sense: bool,
}

impl SettingsArgs {
    /// Overlay the given flags on `base`.
    pub fn apply(&self, mut base: RouteSettings) -> junction::Result<RouteSettings> {
        if let Some(semitones) = self.transpose {
            base.transpose = Transpose::new(semitones)?;
        }
        if let Some(types) = &self.types {
            base.message_types = MessageTypeFilter::only(types.iter().copied());
        }
        if self.all_types {
            base.message_types = MessageTypeFilter::All;
        }
        if self.active_sense {
            base.active_sense = true;
        }
        if self.no_active_sense {
            base.active_sense = false;
        }
        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("junction").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_add_args() {
        let cli = parse(&["add", "keys", "synth", "--transpose", "-3", "--types", "8,9"]);
        let Command::Route(RouteCommand::Add {
            input,
            output,
            settings,
        }) = cli.command
        else {
            panic!("expected add");
        };
        assert_eq!(input.as_deref(), Some("keys"));
        assert_eq!(output.as_deref(), Some("synth"));

        let settings = settings.apply(RouteSettings::default()).unwrap();
        assert_eq!(settings.transpose.semitones(), -3);
        assert!(settings.message_types.allows(8));
        assert!(!settings.message_types.allows(11));
        assert!(!settings.active_sense);
    }

    #[test]
    fn test_edit_keeps_unset() {
        let cli = parse(&["edit", "2", "--no-active-sense"]);
        let Command::Route(RouteCommand::Edit { index, settings }) = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(index, 2);

        let base = RouteSettings {
            transpose: Transpose::new(5).unwrap(),
            message_types: MessageTypeFilter::only([9]),
            active_sense: true,
        };
        let settings = settings.apply(base).unwrap();
        assert_eq!(settings.transpose.semitones(), 5);
        assert!(settings.message_types.is_restricted());
        assert!(!settings.active_sense);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let args = ["junction", "add", "--transpose", "13"];
        assert!(Cli::try_parse_from(args).is_err());

        let args = ["junction", "add", "--types", "15"];
        assert!(Cli::try_parse_from(args).is_err());

        let args = ["junction", "add", "--types", "9", "--all-types"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    fn live(line: &str) -> LiveCommand {
        LiveLine::parse_line(line).unwrap().unwrap().command
    }

    #[test]
    fn test_live_lines() {
        assert!(LiveLine::parse_line("   ").unwrap().is_none());
        assert!(matches!(live("quit"), LiveCommand::Quit));
        assert!(matches!(live("exit"), LiveCommand::Quit));
        assert!(matches!(live("routes"), LiveCommand::Routes));
        assert!(matches!(live("activity"), LiveCommand::Activity));
        assert!(matches!(
            live("remove 1"),
            LiveCommand::Route(RouteCommand::Remove { index: 1 })
        ));

        let LiveCommand::Route(RouteCommand::Edit { index, settings }) =
            live("edit 0  --transpose -12 --all-types")
        else {
            panic!("expected edit");
        };
        assert_eq!(index, 0);
        assert_eq!(settings.transpose, Some(-12));
        assert!(settings.all_types);
    }

    #[test]
    fn test_live_rejects_other_commands() {
        assert!(LiveLine::parse_line("run").is_err());
        assert!(LiveLine::parse_line("edit").is_err());
        assert!(LiveLine::parse_line("play 60").is_err());
    }
}
