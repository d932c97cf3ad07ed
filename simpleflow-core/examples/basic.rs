//! Basic usage example of SimpleFlow: a validating pipeline with a
//! sentinel edge for bad input.

use simpleflow_core::prelude::*;

// Parses the raw input, or asks for the `invalid_input` edge.
#[derive(Debug)]
struct ParseNode;

#[async_trait]
impl Node for ParseNode {
    async fn execute(&self, mut context: Context) -> Result<(Context, Action)> {
        println!("🔄 Parsing input");

        let input: String = context.get("input")?.unwrap_or_default();
        match input.trim().parse::<i64>() {
            Ok(value) => {
                context.set("value", value)?;
                Ok((context, Action::default()))
            }
            Err(_) => {
                context.set("error", format!("not a number: {input:?}"))?;
                Ok((context, Action::new("invalid_input")))
            }
        }
    }

    fn name(&self) -> String {
        "parse".to_string()
    }
}

// Routes on the sign of the parsed value.
#[derive(Debug)]
struct ClassifyNode;

#[async_trait]
impl Node for ClassifyNode {
    async fn execute(&self, context: Context) -> Result<(Context, Action)> {
        let value: i64 = context.get("value")?.unwrap_or_default();
        println!("✅ Classifying {value}");

        let action = if value > 0 { "positive" } else { "non_positive" };
        Ok((context, Action::new(action)))
    }

    fn name(&self) -> String {
        "classify".to_string()
    }
}

fn build_flow() -> Result<Flow> {
    let mut graph = Graph::new();

    let parse = graph.add_node(ParseNode);
    let classify = graph.add_node(ClassifyNode);
    let positive = graph.add_node(helpers::fn_node("positive", |mut ctx: Context| async move {
        ctx.set("verdict", "positive")?;
        Ok((ctx, Action::default()))
    }));
    let non_positive = graph.add_node(helpers::fn_node(
        "non_positive",
        |mut ctx: Context| async move {
            ctx.set("verdict", "zero or negative")?;
            Ok((ctx, Action::default()))
        },
    ));
    let report_error = graph.add_node(helpers::fn_node("report_error", |ctx: Context| async move {
        let error: String = ctx.get("error")?.unwrap_or_default();
        println!("⚠️  {error}");
        Ok((ctx, Action::new("end")))
    }));

    graph.connect_default(parse, classify);
    graph.begin_conditional(parse, "invalid_input").connect(report_error);
    graph.begin_conditional(classify, "positive").connect(positive);
    graph.begin_conditional(classify, "non_positive").connect(non_positive);

    Flow::builder(graph).name("basic").start(parse).build()
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("🚀 Starting SimpleFlow Basic Example");

    let flow = build_flow()?;

    for input in ["42", "-7", "forty-two"] {
        let context = ContextBuilder::new().with_json("input", input)?.build();

        println!("\n🏃 Running with input {input:?}");
        let run = flow.run_traced(context).await?;

        println!("Visited: {:?}", run.visited());
        println!("Duration: {:?}", run.duration);
        if let Some(verdict) = run.context.get::<String>("verdict")? {
            println!("Verdict: {verdict}");
        }
    }

    println!("\n✅ Basic example completed successfully!");
    Ok(())
}
