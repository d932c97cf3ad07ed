//! Document knowledge pipeline: copy the source document, then chain three
//! model calls (detailed summary, atomic facts, extractive summary).
//!
//! Talks to the endpoint configured through `SIMPLEFLOW_LLM_*` variables
//! (a local Ollama server by default). Pass `--offline` to use canned
//! replies instead.

use std::sync::Arc;

use simpleflow_llm::prelude::*;

const DOCUMENT: &str = "\
# Advantage Plus Banking

## Account Information

- Opening Deposit: $100 or more
- Monthly Maintenance Fee: $12.00 each month. It is waived with one qualifying
  direct deposit of $250 or more, or a minimum daily balance of $1,500.

## ATM Fees

- In-network ATMs: no fee
- Out-of-network ATMs: $2.50 in the U.S., $5.00 outside the U.S.

## Overdraft Item Fee

- $10.00 per item, at most 2 per day
- Not charged when the account is overdrawn by $1 or less
";

fn provider(offline: bool) -> Result<Arc<dyn CompletionProvider>> {
    if offline {
        return Ok(Arc::new(ScriptedProvider::new([
            "The account needs a $100 opening deposit and costs $12 a month unless a \
             qualifying deposit or balance waives it. Out-of-network ATMs cost $2.50 \
             domestically and $5.00 abroad. Overdrafts cost $10 per item, twice a day at most.",
            "1. The opening deposit is $100 or more.\n\
             2. The monthly maintenance fee is $12.00.\n\
             3. The overdraft item fee is $10.00 per item.",
            "Monthly Maintenance Fee: $12.00 each month. Overdraft Item Fee: $10.00 per item.",
        ])));
    }
    Ok(Arc::new(ChatCompletionProvider::from_env()?))
}

fn build_pipeline(provider: Arc<dyn CompletionProvider>) -> Result<Flow> {
    let mut graph = Graph::new();

    let duplicate = graph.add_node(helpers::fn_node("duplicate", |mut ctx: Context| async move {
        let document = ctx.get_raw("document").cloned().unwrap_or_default();
        ctx.set("base_document", document)?;
        Ok((ctx, Action::default()))
    }));
    let detailed = graph.add_node(LlmNode::simple(
        "detailed_summary",
        prompts::DETAILED_SUMMARY,
        "summary_detailed",
        provider.clone(),
    )?);
    let facts = graph.add_node(
        LlmNode::builder("atomic_facts")
            .input(TemplateInput::new(prompts::ATOMIC_FACTS)?.strict())
            .provider(provider.clone())
            .output(VerbatimOutput::new("summary_atomic_facts"))
            .build()?,
    );
    let extractive = graph.add_node(LlmNode::simple(
        "extractive_summary",
        prompts::EXTRACTIVE_SUMMARY,
        "summary_extractive",
        provider,
    )?);
    let rejected = graph.add_node(helpers::fn_node("rejected", |ctx: Context| async move {
        println!("⚠️  the atomic facts prompt needs a 'domain' field");
        Ok((ctx, Action::new("end")))
    }));

    graph.connect_default(duplicate, detailed);
    graph.connect_default(detailed, facts);
    graph.connect_default(facts, extractive);
    graph.begin_conditional(facts, INVALID_INPUT).connect(rejected);

    Flow::builder(graph)
        .name("knowledge_pipeline")
        .start(duplicate)
        .build()
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simpleflow_core=info,simpleflow_llm=debug".into()),
        )
        .init();

    let offline = std::env::args().any(|arg| arg == "--offline");
    let pipeline = build_pipeline(provider(offline)?)?;

    let context = ContextBuilder::new()
        .with_json("document", DOCUMENT)?
        .with_json("domain", "retail banking")?
        .build();

    let run = pipeline.run_traced(context).await?;

    println!("Visited: {:?}\n", run.visited());
    for field in ["summary_detailed", "summary_atomic_facts", "summary_extractive"] {
        if let Some(text) = run.context.get::<String>(field)? {
            println!("== {field} ==\n{text}\n");
        }
    }
    Ok(())
}
