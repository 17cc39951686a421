use anyhow::Result;
use common::agent::{QueryOutcome, QueryPipeline};
use common::render::render_table;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::Instrument;

const PROMPT: &str = "\nAsk your DB (or type 'exit'): ";
const EXIT_SENTINEL: &str = "exit";

/// print the sql and rows, or the error; true on success
pub fn print_outcome(result: &common::Result<QueryOutcome>) -> bool {
    match result {
        Ok(outcome) => {
            println!("\nGenerated SQL:\n{}", outcome.sql);
            println!("\nResults:");
            if outcome.results.is_empty() {
                println!("(No rows found)");
            } else {
                println!("{}", render_table(&outcome.results));
            }
            true
        }
        Err(e) => {
            println!("Error: {}", e);
            false
        }
    }
}

fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_SENTINEL)
}

pub async fn run_shell(pipeline: &QueryPipeline) -> Result<()> {
    println!("\nLoading database schema...");

    // a catalog failure here is reported, later questions retry the load
    match pipeline.schema().await {
        Ok(schema) => {
            println!("\nAvailable tables:");
            for table in schema.description.table_names() {
                println!(" - {}", table);
            }
        }
        Err(e) => println!("Error: {}", e),
    }

    let mut editor = DefaultEditor::new()?;

    loop {
        let line = tokio::task::block_in_place(|| editor.readline(PROMPT));

        let line = match line {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let question = line.trim();
        if is_exit(question) {
            break;
        }
        if question.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(question);

        let span = tracing::info_span!("shell_question", question_len = question.len());
        let result = pipeline.run(question).instrument(span).await;
        print_outcome(&result);
    }

    println!("Exiting talkdb");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TalkDbError;

    #[test]
    fn test_exit_sentinel() {
        assert!(is_exit("exit"));
        assert!(is_exit("  EXIT "));
        assert!(!is_exit("exit now"));
        assert!(!is_exit(""));
    }

    #[test]
    fn test_print_outcome_reports_failure() {
        let result: common::Result<QueryOutcome> =
            Err(TalkDbError::NoSqlFound("model output did not contain a sql statement".into()));
        assert!(!print_outcome(&result));
    }
}
