//! Two independent flows running concurrently and handing a counter back
//! and forth through queues stored in a shared context.

use simpleflow_core::prelude::*;
use tokio::sync::{Mutex, mpsc};

const ROUNDS: u32 = 6;

struct Inbox(Mutex<mpsc::UnboundedReceiver<u32>>);
struct Outbox(mpsc::UnboundedSender<u32>);

#[derive(Debug)]
struct Player {
    name: &'static str,
}

#[async_trait]
impl Node for Player {
    async fn execute(&self, context: Context) -> Result<(Context, Action)> {
        let inbox = context.require_shared::<Inbox>()?;
        let Some(ball) = inbox.0.lock().await.recv().await else {
            return Ok((context, Action::new("end")));
        };
        println!("{}: {ball}", self.name);

        if ball >= ROUNDS {
            return Ok((context, Action::new("end")));
        }
        context
            .require_shared::<Outbox>()?
            .0
            .send(ball + 1)
            .map_err(|_| FlowError::execution("partner left the game"))?;

        let action = if ball + 1 >= ROUNDS { "end" } else { "continue" };
        Ok((context, Action::new(action)))
    }

    fn name(&self) -> String {
        self.name.to_string()
    }
}

fn player(name: &'static str) -> Result<Flow> {
    let mut graph = Graph::new();
    let turn = graph.add_node(Player { name });
    graph.begin_conditional(turn, "continue").connect(turn);
    Flow::builder(graph).name(name).start(turn).build()
}

#[tokio::main]
async fn main() -> Result<()> {
    let (to_ping, ping_rx) = mpsc::unbounded_channel();
    let (to_pong, pong_rx) = mpsc::unbounded_channel();

    // Each player gets its own context: inbox and outbox are crossed.
    let ping_ctx = ContextBuilder::new()
        .with_shared(Inbox(Mutex::new(ping_rx)))
        .with_shared(Outbox(to_pong))
        .build();
    let pong_ctx = ContextBuilder::new()
        .with_shared(Inbox(Mutex::new(pong_rx)))
        .with_shared(Outbox(to_ping.clone()))
        .build();

    to_ping
        .send(0)
        .map_err(|_| FlowError::execution("ping is not listening"))?;

    let ping = player("ping")?;
    let pong = player("pong")?;
    let (ping, pong) = tokio::join!(ping.run(ping_ctx), pong.run(pong_ctx));
    ping?;
    pong?;

    println!("🏁 done after {ROUNDS} passes");
    Ok(())
}
