use crate::commands::{
    run_batch, run_diagnose, run_questions, run_validate, BatchArgs, DefinitionArgs, DiagnoseArgs,
    QuestionsArgs, ValidateArgs,
};
use crate::server;
use aura_diagnosis::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Aura Skin Diagnosis",
    about = "Serve and run the aura skin diagnosis quiz from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Classify one answer sheet and print the result
    Diagnose(DiagnoseArgs),
    /// Load and validate a quiz definition
    Validate(ValidateArgs),
    /// Classify every respondent in a CSV answer file
    Batch(BatchArgs),
    /// Print the quiz questions with numbered options
    Questions(QuestionsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) definition: DefinitionArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Diagnose(args) => run_diagnose(args).await,
        Command::Validate(args) => run_validate(args),
        Command::Batch(args) => run_batch(args),
        Command::Questions(args) => run_questions(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["aura-diagnosis-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn diagnose_parses_one_based_answers() {
        let cli = Cli::try_parse_from([
            "aura-diagnosis-api",
            "diagnose",
            "--answers",
            "1,2,3,4",
            "--definition",
            "quiz.json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Diagnose(args)) => {
                assert_eq!(args.answers, vec![0, 1, 2, 3]);
                assert_eq!(
                    args.definition.definition.as_deref(),
                    Some(std::path::Path::new("quiz.json"))
                );
                assert!(!args.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn diagnose_rejects_option_zero() {
        let result = Cli::try_parse_from(["aura-diagnosis-api", "diagnose", "--answers", "1,0"]);
        assert!(result.is_err());
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
