use solace_cli::{CliError, CliOptions, ReplyPrinter, SolaceConfig, init_tracing, usage};
use solace_transport_http::HttpTransport;
use solace_turn::{TurnController, TurnOutcome};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

type Controller = TurnController<HttpTransport>;

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("solace error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), CliError> {
    let options = CliOptions::parse(std::env::args().skip(1))?;
    if options.help {
        println!("{}", usage());
        return Ok(());
    }
    init_tracing();

    let mut config = SolaceConfig::load(options.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    options.apply(&mut config);
    tracing::debug!(base_url = %config.base_url, user = %config.user_id, "solace.cli.config");

    let controller = TurnController::new(config.transport(), config.turn_config());
    match options.message {
        Some(message) => {
            let outcome = chat(&controller, message).await?;
            if matches!(outcome, TurnOutcome::Completed { .. }) {
                Ok(())
            } else {
                Err(CliError::NoReply)
            }
        }
        None => repl(&controller).await,
    }
}

async fn repl(controller: &Controller) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt().await?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            return Ok(());
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => return Ok(()),
            "/reset" => {
                controller.reset_session();
                eprintln!("(new session)");
            }
            "/clear" => controller.clear_error(),
            text => {
                chat(controller, text.to_string()).await?;
            }
        }
    }
}

/// Run one turn, streaming the reply to stdout. Ctrl-C cancels the turn.
async fn chat(controller: &Controller, text: String) -> Result<TurnOutcome, CliError> {
    let mut updates = controller.subscribe();
    let mut printer = ReplyPrinter::default();
    let mut stdout = tokio::io::stdout();
    let mut handle = controller.send_message(text)?;

    let outcome = loop {
        tokio::select! {
            joined = &mut handle => break joined?,
            Ok(()) = updates.changed() => {
                let snapshot = updates.borrow_and_update().clone();
                if let Some(chunk) = printer.observe(&snapshot) {
                    stdout.write_all(chunk.as_bytes()).await?;
                    stdout.flush().await?;
                }
            }
            _ = tokio::signal::ctrl_c() => controller.cancel_streaming(),
        }
    };

    if let Some(chunk) = printer.observe(&controller.state()) {
        stdout.write_all(chunk.as_bytes()).await?;
    }
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;

    match &outcome {
        TurnOutcome::Completed { .. } => {}
        TurnOutcome::QuotaExceeded | TurnOutcome::Failed(_) => {
            if let Some(error) = controller.state().error {
                eprintln!("! {error}");
            }
        }
        TurnOutcome::Cancelled => eprintln!("(cancelled)"),
    }
    Ok(outcome)
}

async fn prompt() -> Result<(), CliError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;
    Ok(())
}
