//! Two agents playing taboo: a hinter describes the target word without the
//! forbidden words and a guesser answers. Each agent is its own flow with a
//! self-loop; both run concurrently and talk through queues kept in the
//! shared context.
//!
//! Pass `--offline` to play with canned replies.

use std::sync::Arc;

use simpleflow_llm::prelude::*;
use tokio::sync::{Mutex, mpsc};

const MAX_GUESSES: usize = 5;

const HINT_PROMPT: &str = "\
Generate hint for '{{ target }}'
Forbidden words: {{ forbidden }}
{% if past_guesses %}Previous wrong guesses: {{ past_guesses }}
Make hint more specific.
{% endif %}Use at most 5 words.";

const GUESS_PROMPT: &str = "Given hint: {{ hint }}, past wrong guesses: {{ past_guesses }}, \
make a new guess. Directly reply a single word:";

enum ToHinter {
    Guess(String),
    GameOver,
}

#[derive(Serialize)]
struct Board {
    target: String,
    forbidden: Vec<String>,
    past_guesses: Vec<String>,
}

struct Table {
    board: Mutex<Board>,
    to_hinter: mpsc::UnboundedSender<ToHinter>,
    hinter_inbox: Mutex<mpsc::UnboundedReceiver<ToHinter>>,
    to_guesser: mpsc::UnboundedSender<String>,
    guesser_inbox: Mutex<mpsc::UnboundedReceiver<String>>,
}

fn table_closed() -> FlowError {
    FlowError::execution("the other player left the table")
}

#[derive(Debug)]
struct Hinter {
    prompt: TemplateInput,
    provider: Arc<dyn CompletionProvider>,
}

#[async_trait]
impl Node for Hinter {
    async fn execute(&self, context: Context) -> Result<(Context, Action)> {
        let table = context.require_shared::<Table>()?;
        let message = table.hinter_inbox.lock().await.recv().await;
        let Some(ToHinter::Guess(_)) = message else {
            return Ok((context, Action::new("end")));
        };

        let prompt = self.prompt.render(&*table.board.lock().await)?;
        let hint = self.provider.complete(&prompt).await?;
        println!("\nHinter: Here's your hint - {}", hint.trim());

        table.to_guesser.send(hint).map_err(|_| table_closed())?;
        Ok((context, Action::new("continue")))
    }

    fn name(&self) -> String {
        "hinter".to_string()
    }
}

#[derive(Debug)]
struct Guesser {
    prompt: TemplateInput,
    provider: Arc<dyn CompletionProvider>,
}

#[async_trait]
impl Node for Guesser {
    async fn execute(&self, context: Context) -> Result<(Context, Action)> {
        let table = context.require_shared::<Table>()?;
        let Some(hint) = table.guesser_inbox.lock().await.recv().await else {
            return Ok((context, Action::new("end")));
        };

        let past_guesses = table.board.lock().await.past_guesses.clone();
        let prompt = self.prompt.render(serde_json::json!({
            "hint": hint.trim(),
            "past_guesses": past_guesses,
        }))?;
        let guess = self.provider.complete(&prompt).await?.trim().to_string();
        println!("Guesser: I guess it's - {guess}");

        let message = {
            let mut board = table.board.lock().await;
            if guess.eq_ignore_ascii_case(&board.target) {
                println!("Game Over - Correct guess!");
                None
            } else {
                board.past_guesses.push(guess.clone());
                if board.past_guesses.len() >= MAX_GUESSES {
                    println!("Game Over - out of guesses, it was '{}'", board.target);
                    None
                } else {
                    Some(ToHinter::Guess(guess))
                }
            }
        };

        let Some(message) = message else {
            table.to_hinter.send(ToHinter::GameOver).map_err(|_| table_closed())?;
            return Ok((context, Action::new("end")));
        };
        table.to_hinter.send(message).map_err(|_| table_closed())?;
        Ok((context, Action::new("continue")))
    }

    fn name(&self) -> String {
        "guesser".to_string()
    }
}

fn agent_flow(name: &str, agent: impl Node + 'static) -> Result<Flow> {
    let mut graph = Graph::new();
    let turn = graph.add_node(agent);
    graph.begin_conditional(turn, "continue").connect(turn);
    Flow::builder(graph).name(name).start(turn).build()
}

type Providers = (Arc<dyn CompletionProvider>, Arc<dyn CompletionProvider>);

fn providers(offline: bool) -> Result<Providers> {
    if offline {
        let hints = ScriptedProvider::new([
            "Sweet ache for bygone days",
            "Wistful fondness for old times",
        ]);
        let guesses = ScriptedProvider::new(["homesickness", "nostalgia"]);
        return Ok((Arc::new(hints), Arc::new(guesses)));
    }
    let shared: Arc<dyn CompletionProvider> = Arc::new(ChatCompletionProvider::from_env()?);
    Ok((shared.clone(), shared))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simpleflow_core=info".into()),
        )
        .init();

    let offline = std::env::args().any(|arg| arg == "--offline");
    let (hint_provider, guess_provider) = providers(offline)?;

    let board = Board {
        target: "nostalgia".to_string(),
        forbidden: ["memory", "past", "remember", "feeling", "longing"]
            .map(String::from)
            .to_vec(),
        past_guesses: Vec::new(),
    };
    println!("Game starting!");
    println!("Target word: {}", board.target);
    println!("Forbidden words: {:?}", board.forbidden);

    let (to_hinter, hinter_inbox) = mpsc::unbounded_channel();
    let (to_guesser, guesser_inbox) = mpsc::unbounded_channel();
    // The hinter opens with an empty guess.
    to_hinter
        .send(ToHinter::Guess(String::new()))
        .map_err(|_| table_closed())?;

    let context = ContextBuilder::new()
        .with_shared(Table {
            board: Mutex::new(board),
            to_hinter,
            hinter_inbox: Mutex::new(hinter_inbox),
            to_guesser,
            guesser_inbox: Mutex::new(guesser_inbox),
        })
        .build();

    let hinter = agent_flow(
        "hinter",
        Hinter {
            prompt: TemplateInput::new(HINT_PROMPT)?,
            provider: hint_provider,
        },
    )?;
    let guesser = agent_flow(
        "guesser",
        Guesser {
            prompt: TemplateInput::new(GUESS_PROMPT)?,
            provider: guess_provider,
        },
    )?;

    let (hinter_run, guesser_run) =
        tokio::join!(hinter.run(context.clone()), guesser.run(context));
    hinter_run?;
    guesser_run?;
    Ok(())
}
