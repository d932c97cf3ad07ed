//! A flow used as a single step of another flow.

use simpleflow_core::prelude::*;

fn step(name: &'static str) -> impl Node {
    helpers::fn_node(name, move |mut ctx: Context| async move {
        println!("  ▶ {name}");
        ctx.push("log", name)?;
        Ok((ctx, Action::default()))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simpleflow_core=debug".into()),
        )
        .init();

    let mut cleaning = Graph::new();
    let trim = cleaning.add_node(step("trim"));
    let dedupe = cleaning.add_node(step("dedupe"));
    cleaning.connect_default(trim, dedupe);
    let cleaning = Flow::builder(cleaning)
        .name("cleaning")
        .start(trim)
        .build()?;

    let mut pipeline = Graph::new();
    let load = pipeline.add_node(step("load"));
    let clean = pipeline.add_node(cleaning);
    let store = pipeline.add_node(step("store"));
    pipeline.connect_default(load, clean);
    pipeline.connect_default(clean, store);

    let pipeline = Flow::builder(pipeline)
        .name("pipeline")
        .start(load)
        .build()?;

    let run = pipeline.run_traced(Context::new()).await?;

    println!("\nOuter steps: {:?}", run.visited());
    println!("Inner log:   {:?}", run.context.get::<Vec<String>>("log")?);
    Ok(())
}
