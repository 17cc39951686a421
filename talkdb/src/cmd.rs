use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use common::agent::QueryPipeline;
use common::config::{DatabaseConfig, GenerationConfig, PipelineConfig, Provider};
use common::db::MySqlDatabase;
use common::llm::ChatCompletionClient;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "talkdb")]
#[command(about = "ask a mysql database questions in plain language", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(flatten)]
    generation: GenerationArgs,

    /// Seconds allowed for one question, generation and query included
    #[arg(long, env = "TALKDB_TIMEOUT_SECS", default_value = "60", global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DatabaseArgs {
    /// MySQL host
    #[arg(long, env = "DB_HOST", default_value = "localhost", global = true)]
    db_host: String,

    /// MySQL port
    #[arg(long, env = "DB_PORT", default_value = "3306", global = true)]
    db_port: u16,

    /// MySQL user (ideally one with read-only grants)
    #[arg(long, env = "DB_USER", global = true)]
    db_user: Option<String>,

    /// MySQL password
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true, global = true)]
    db_password: Option<String>,

    /// Database to introspect and query
    #[arg(long, env = "DB_NAME", global = true)]
    db_name: Option<String>,
}

#[derive(Args)]
struct GenerationArgs {
    /// Chat completions provider (groq or openai)
    #[arg(long, env = "TALKDB_PROVIDER", default_value = "groq", global = true)]
    provider: Provider,

    /// Model name (default depends on provider)
    #[arg(long, env = "TALKDB_MODEL", global = true)]
    model: Option<String>,

    /// Override the provider's API base URL
    #[arg(long, env = "TALKDB_BASE_URL", global = true)]
    base_url: Option<String>,

    /// API key (default: GROQ_API_KEY or OPENAI_API_KEY)
    #[arg(long, hide_env_values = true, global = true)]
    api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "TALKDB_BIND", default_value = "127.0.0.1:5000")]
        bind: String,
    },
    /// Ask questions interactively until `exit`
    Shell,
    /// Ask a single question and print the answer
    Ask {
        /// The question, in plain language
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Print the schema text sent to the model
    Schema,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let guard = common::tracing::init_tracing("talkdb")?;

        let pipeline = Arc::new(self.build_pipeline()?);

        let succeeded = match self.command {
            Commands::Serve { bind } => {
                common::http::serve(&bind, pipeline).await?;
                true
            }
            Commands::Shell => {
                crate::shell::run_shell(&pipeline).await?;
                true
            }
            Commands::Ask { question } => {
                let result = pipeline.run(&question.join(" ")).await;
                crate::shell::print_outcome(&result)
            }
            Commands::Schema => {
                let schema = pipeline.schema().await?;
                println!("{}", schema.text);
                true
            }
        };

        if !succeeded {
            // flush spans before the non-zero exit skips destructors
            drop(guard);
            std::process::exit(1);
        }

        Ok(())
    }

    fn build_pipeline(&self) -> Result<QueryPipeline> {
        let database = DatabaseConfig {
            host: self.database.db_host.clone(),
            port: self.database.db_port,
            user: self.database.db_user.clone(),
            password: self.database.db_password.clone(),
            name: self.database.db_name.clone(),
        };

        let generation = GenerationConfig {
            provider: self.generation.provider,
            model: self.generation.model.clone(),
            base_url: self.generation.base_url.clone(),
            api_key: self.generation.api_key.clone(),
        };

        tracing::debug!(
            provider = %generation.provider,
            model = %generation.model(),
            timeout_secs = self.timeout_secs,
            "building pipeline"
        );

        let config = PipelineConfig {
            timeout: Duration::from_secs(self.timeout_secs),
        };
        let db = Arc::new(MySqlDatabase::new(database));
        let generator = Arc::new(ChatCompletionClient::new(generation, config.timeout)?);

        Ok(QueryPipeline::new(db, generator, config))
    }
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
    fn test_ask_joins_words() {
        let cli = Cli::try_parse_from(["talkdb", "ask", "how", "many", "riders"]).unwrap();
        match cli.command {
            Commands::Ask { question } => assert_eq!(question.join(" "), "how many riders"),
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_provider_flag_parses() {
        let cli = Cli::try_parse_from(["talkdb", "--provider", "openai", "shell"]).unwrap();
        assert_eq!(cli.generation.provider, Provider::OpenAi);
        assert!(Cli::try_parse_from(["talkdb", "--provider", "bard", "shell"]).is_err());
    }
}
