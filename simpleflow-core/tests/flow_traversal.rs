use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use pretty_assertions::assert_eq;
use simpleflow_core::prelude::*;
use tokio::sync::{Mutex, mpsc};
use tokio_test::{assert_err, assert_ok};

/// Appends its name to the `visited` list and returns a fixed action.
fn visit(name: &'static str, action: &'static str) -> impl Node {
    helpers::fn_node(name, move |mut ctx: Context| async move {
        ctx.push("visited", name)?;
        Ok((ctx, Action::new(action)))
    })
}

fn visited(context: &Context) -> Vec<String> {
    context.get("visited").unwrap().unwrap_or_default()
}

fn routing_flow() -> Flow {
    let mut graph = Graph::new();
    let n = graph.add_node(helpers::fn_node("N", |mut ctx: Context| async move {
        ctx.push("visited", "N")?;
        let x: i64 = ctx.get("x")?.unwrap_or_default();
        let action = if x > 0 { "route_a" } else { "route_b" };
        Ok((ctx, Action::new(action)))
    }));
    let a = graph.add_node(visit("A", ""));
    let b = graph.add_node(visit("B", ""));
    graph.begin_conditional(n, "route_a").connect(a);
    graph.begin_conditional(n, "route_b").connect(b);
    Flow::new(graph, n).unwrap()
}

#[tokio::test]
async fn routes_on_returned_action() {
    let flow = routing_flow();

    let mut context = Context::new();
    context.set("x", 1).unwrap();
    let context = flow.run(context).await.unwrap();
    assert_eq!(visited(&context), vec!["N", "A"]);

    let mut context = Context::new();
    context.set("x", -1).unwrap();
    let context = flow.run(context).await.unwrap();
    assert_eq!(visited(&context), vec!["N", "B"]);
}

#[tokio::test]
async fn routing_holds_for_random_inputs() {
    let flow = routing_flow();

    for _ in 0..50 {
        let x = fastrand::i64(-1_000..1_000);
        let mut context = Context::new();
        context.set("x", x).unwrap();

        let run = flow.run_traced(context).await.unwrap();

        let expected = if x > 0 { "A" } else { "B" };
        assert_eq!(run.visited(), vec!["N", expected], "x = {x}");
    }
}

#[tokio::test]
async fn dead_end_returns_context_untouched_by_other_nodes() {
    let sink = RecordingSink::new();
    let mut graph = Graph::with_diagnostics(sink.clone());
    let start = graph.add_node(helpers::fn_node("start", |mut ctx: Context| async move {
        ctx.set("stamp", 42)?;
        Ok((ctx, Action::new("nowhere")))
    }));
    let never = graph.add_node(helpers::fn_node("never", |mut ctx: Context| async move {
        ctx.set("stamp", 0)?;
        Ok((ctx, Action::default()))
    }));
    graph.connect_default(start, never);

    let mut context = Context::new();
    context.set("input", "kept").unwrap();
    let context = Flow::new(graph, start)
        .unwrap()
        .run(context)
        .await
        .unwrap();

    assert_eq!(context.get::<i64>("stamp").unwrap(), Some(42));
    assert_eq!(
        context.get::<String>("input").unwrap(),
        Some("kept".to_string())
    );
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), DiagnosticKind::Traversal);
    assert!(matches!(
        &events[0],
        Diagnostic::DeadEnd { action, defined, .. }
            if action == "nowhere" && defined == &vec!["default".to_string()]
    ));
}

#[tokio::test]
async fn last_registration_wins() {
    let sink = RecordingSink::new();
    let mut graph = Graph::with_diagnostics(sink.clone());
    let n = graph.add_node(visit("n", "go"));
    let first = graph.add_node(visit("first", ""));
    let second = graph.add_node(visit("second", ""));
    graph.begin_conditional(n, "go").connect(first);
    graph.begin_conditional(n, "go").connect(second);

    let context = Flow::new(graph, n)
        .unwrap()
        .run(Context::new())
        .await
        .unwrap();

    assert_eq!(visited(&context), vec!["n", "second"]);
    assert_eq!(sink.events().len(), 1);
    assert_eq!(sink.events()[0].kind(), DiagnosticKind::Construction);
}

#[test]
fn flow_refuses_edges_into_another_graph() {
    let mut other = Graph::new();
    other.add_node(visit("o0", ""));
    let foreign = other.add_node(visit("o1", ""));

    let mut graph = Graph::new();
    let start = graph.add_node(visit("start", ""));
    graph.add_node(visit("local_1", ""));
    graph.connect_default(start, foreign);

    let err = assert_err!(Flow::new(graph, start));
    assert!(matches!(err, FlowError::Construction(_)));
}

#[tokio::test]
async fn single_node_flow_returns_that_nodes_context() {
    let mut graph = Graph::new();
    let only = graph.add_node(helpers::fn_node("only", |ctx: Context| async move {
        let mut produced = Context::new();
        produced.set("from", "only")?;
        produced.merge(&ctx);
        Ok((produced, Action::new("ignored")))
    }));

    let mut input = Context::new();
    input.set("seed", 7).unwrap();
    let run = Flow::new(graph, only)
        .unwrap()
        .run_traced(input)
        .await
        .unwrap();

    assert_eq!(run.steps(), 1);
    assert_eq!(
        run.context.to_json(),
        serde_json::json!({"from": "only", "seed": 7})
    );
}

#[tokio::test]
async fn empty_action_follows_default_edge() {
    let mut graph = Graph::new();
    let silent = graph.add_node(visit("silent", ""));
    let next = graph.add_node(visit("next", ""));
    graph.connect_default(silent, next);

    let context = Flow::new(graph, silent)
        .unwrap()
        .run(Context::new())
        .await
        .unwrap();

    assert_eq!(visited(&context), vec!["silent", "next"]);
}

#[tokio::test]
async fn literal_default_and_empty_label_are_equivalent() {
    let mut graph = Graph::new();
    let explicit = graph.add_node(visit("explicit", "default"));
    let tail = graph.add_node(visit("tail", ""));
    graph.add_successor(explicit, tail, "");

    let context = Flow::new(graph, explicit)
        .unwrap()
        .run(Context::new())
        .await
        .unwrap();

    assert_eq!(visited(&context), vec!["explicit", "tail"]);
}

#[tokio::test]
async fn self_loop_runs_until_condition_changes() {
    const ROUNDS: i64 = 4;

    let mut graph = Graph::new();
    let counter = graph.add_node(helpers::fn_node("counter", |mut ctx: Context| async move {
        let count: i64 = ctx.get("count")?.unwrap_or_default();
        ctx.set("count", count + 1)?;
        let action = if count + 1 < ROUNDS { "continue" } else { "done" };
        Ok((ctx, Action::new(action)))
    }));
    graph.begin_conditional(counter, "continue").connect(counter);

    let flow = Flow::builder(graph)
        .start(counter)
        .max_steps(100)
        .build()
        .unwrap();
    let run = flow.run_traced(Context::new()).await.unwrap();

    assert_eq!(run.context.get::<i64>("count").unwrap(), Some(ROUNDS));
    assert_eq!(run.steps(), ROUNDS as usize);
    assert_eq!(run.last_action, "done");
}

#[tokio::test]
async fn two_node_cycle_bounded_by_external_condition() {
    let budget = Arc::new(AtomicUsize::new(6));

    let mut graph = Graph::new();
    let tick = {
        let budget = budget.clone();
        graph.add_node(helpers::fn_node("tick", move |mut ctx: Context| {
            let budget = budget.clone();
            async move {
                ctx.push("visited", "tick")?;
                let left = budget.fetch_sub(1, Ordering::SeqCst);
                Ok((ctx, Action::new(if left > 1 { "continue" } else { "stop" })))
            }
        }))
    };
    let tock = graph.add_node(visit("tock", "continue"));
    graph.begin_conditional(tick, "continue").connect(tock);
    graph.begin_conditional(tock, "continue").connect(tick);

    let context = Flow::builder(graph)
        .start(tick)
        .max_steps(50)
        .build()
        .unwrap()
        .run(Context::new())
        .await
        .unwrap();

    assert_eq!(visited(&context).len(), 11);
    assert_eq!(budget.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn nested_flow_finishes_before_outer_edge() {
    let mut inner_graph = Graph::new();
    let i1 = inner_graph.add_node(visit("inner_1", ""));
    let i2 = inner_graph.add_node(visit("inner_2", "inner_done"));
    inner_graph.connect_default(i1, i2);
    let inner = Flow::builder(inner_graph)
        .name("sub_flow")
        .start(i1)
        .build()
        .unwrap();

    let mut outer_graph = Graph::new();
    let step1 = outer_graph.add_node(visit("step1", "step2"));
    let sub = outer_graph.add_node(inner);
    let step3 = outer_graph.add_node(visit("step3", ""));
    outer_graph.begin_conditional(step1, "step2").connect(sub);
    outer_graph.connect_default(sub, step3);

    let run = Flow::new(outer_graph, step1)
        .unwrap()
        .run_traced(Context::new())
        .await
        .unwrap();

    assert_eq!(
        visited(&run.context),
        vec!["step1", "inner_1", "inner_2", "step3"]
    );
    assert_eq!(run.visited(), vec!["step1", "sub_flow", "step3"]);
    assert!(run.trace[1].action.is_default());
}

#[tokio::test]
async fn nested_flow_can_propagate_its_last_action() {
    let mut inner_graph = Graph::new();
    let check = inner_graph.add_node(visit("check", "invalid"));
    let inner = Flow::builder(inner_graph)
        .start(check)
        .exit_action(ExitAction::Propagate)
        .build()
        .unwrap();

    let mut outer = Graph::new();
    let sub = outer.add_node(inner);
    let ok = outer.add_node(visit("ok", ""));
    let handler = outer.add_node(visit("handler", ""));
    outer.connect_default(sub, ok);
    outer.begin_conditional(sub, "invalid").connect(handler);

    let context = Flow::new(outer, sub)
        .unwrap()
        .run(Context::new())
        .await
        .unwrap();

    assert_eq!(visited(&context), vec!["check", "handler"]);
}

#[tokio::test]
async fn sentinel_action_routes_to_handler() {
    let mut graph = Graph::new();
    let parse = graph.add_node(helpers::fn_node("parse", |mut ctx: Context| async move {
        let raw: Option<String> = ctx.get("raw")?;
        match raw.and_then(|raw| raw.parse::<i64>().ok()) {
            Some(value) => {
                ctx.set("value", value)?;
                Ok((ctx, Action::default()))
            }
            None => Ok((ctx, Action::new("invalid_input"))),
        }
    }));
    let use_value = graph.add_node(visit("use_value", ""));
    let report = graph.add_node(visit("report", "end"));
    graph.connect_default(parse, use_value);
    graph.begin_conditional(parse, "invalid_input").connect(report);
    let flow = Flow::new(graph, parse).unwrap();

    let mut context = Context::new();
    context.set("raw", "12").unwrap();
    assert_eq!(
        visited(&flow.run(context).await.unwrap()),
        vec!["use_value"]
    );

    let mut context = Context::new();
    context.set("raw", "twelve").unwrap();
    assert_eq!(visited(&flow.run(context).await.unwrap()), vec!["report"]);
}

#[derive(Debug, thiserror::Error)]
#[error("upstream unavailable")]
struct Upstream;

#[tokio::test]
async fn faults_abort_the_run_and_propagate_unchanged() {
    let reached = Arc::new(AtomicUsize::new(0));

    let mut inner_graph = Graph::new();
    let failing = inner_graph.add_node(helpers::fn_node("failing", |_ctx: Context| async move {
        Err::<(Context, Action), _>(FlowError::node(Upstream))
    }));
    let inner = Flow::new(inner_graph, failing).unwrap();

    let mut graph = Graph::new();
    let first = graph.add_node(visit("first", ""));
    let sub = graph.add_node(inner);
    let after = {
        let reached = reached.clone();
        graph.add_node(helpers::fn_node("after", move |ctx: Context| {
            let reached = reached.clone();
            async move {
                reached.fetch_add(1, Ordering::SeqCst);
                Ok((ctx, Action::default()))
            }
        }))
    };
    graph.connect_default(first, sub);
    graph.connect_default(sub, after);

    let result = Flow::new(graph, first).unwrap().run(Context::new()).await;

    let err = assert_err!(result);
    match err {
        FlowError::Node(report) => assert!(report.downcast_ref::<Upstream>().is_some()),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(reached.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn one_topology_serves_concurrent_runs() {
    let flow = routing_flow();

    let runs: Vec<_> = (0..8)
        .map(|i| {
            let flow = flow.clone();
            tokio::spawn(async move {
                let mut context = Context::new();
                context.set("x", if i % 2 == 0 { 1 } else { -1 }).unwrap();
                (i, flow.run(context).await)
            })
        })
        .collect();

    for handle in runs {
        let (i, result) = handle.await.unwrap();
        let context = assert_ok!(result);
        let expected = if i % 2 == 0 { "A" } else { "B" };
        assert_eq!(visited(&context), vec!["N", expected]);
    }
}

struct PingInbox(Mutex<mpsc::UnboundedReceiver<u32>>);
struct PongInbox(Mutex<mpsc::UnboundedReceiver<u32>>);
struct ToPing(mpsc::UnboundedSender<u32>);
struct ToPong(mpsc::UnboundedSender<u32>);

#[tokio::test]
async fn concurrent_flows_rendezvous_through_context_queues() {
    const LAST: u32 = 5;

    let (to_ping, ping_rx) = mpsc::unbounded_channel();
    let (to_pong, pong_rx) = mpsc::unbounded_channel();

    let shared = ContextBuilder::new()
        .with_shared(PingInbox(Mutex::new(ping_rx)))
        .with_shared(PongInbox(Mutex::new(pong_rx)))
        .with_shared(ToPing(to_ping.clone()))
        .with_shared(ToPong(to_pong))
        .build();

    let mut ping_graph = Graph::new();
    let ping = ping_graph.add_node(helpers::fn_node("ping", |mut ctx: Context| async move {
        let inbox = ctx.require_shared::<PingInbox>()?;
        let ball = inbox
            .0
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| FlowError::execution("pong hung up"))?;
        ctx.push("ping_saw", ball)?;
        let out = ctx.require_shared::<ToPong>()?;
        out.0
            .send(ball + 1)
            .map_err(|_| FlowError::execution("pong gone"))?;
        let action = if ball + 1 >= LAST { "end" } else { "continue" };
        Ok((ctx, Action::new(action)))
    }));
    ping_graph.begin_conditional(ping, "continue").connect(ping);

    let mut pong_graph = Graph::new();
    let pong = pong_graph.add_node(helpers::fn_node("pong", |mut ctx: Context| async move {
        let inbox = ctx.require_shared::<PongInbox>()?;
        let ball = inbox
            .0
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| FlowError::execution("ping hung up"))?;
        ctx.push("pong_saw", ball)?;
        if ball >= LAST {
            return Ok((ctx, Action::new("end")));
        }
        let out = ctx.require_shared::<ToPing>()?;
        out.0
            .send(ball + 1)
            .map_err(|_| FlowError::execution("ping gone"))?;
        Ok((ctx, Action::new("continue")))
    }));
    pong_graph.begin_conditional(pong, "continue").connect(pong);

    let ping_flow = Flow::builder(ping_graph)
        .start(ping)
        .max_steps(20)
        .build()
        .unwrap();
    let pong_flow = Flow::builder(pong_graph)
        .start(pong)
        .max_steps(20)
        .build()
        .unwrap();

    to_ping.send(0).unwrap();
    let (ping_ctx, pong_ctx) = tokio::join!(
        ping_flow.run(shared.clone()),
        pong_flow.run(shared.clone())
    );

    let ping_saw: Vec<u32> = ping_ctx.unwrap().get("ping_saw").unwrap().unwrap();
    let pong_saw: Vec<u32> = pong_ctx.unwrap().get("pong_saw").unwrap().unwrap();
    assert_eq!(ping_saw, vec![0, 2, 4]);
    assert_eq!(pong_saw, vec![1, 3, 5]);
}

#[tokio::test]
async fn standalone_run_ignores_edges_and_warns() {
    let sink = RecordingSink::new();
    let mut graph = Graph::with_diagnostics(sink.clone());
    let a = graph.add_node(visit("a", ""));
    let b = graph.add_node(visit("b", ""));
    graph.connect_default(a, b);
    let flow = Flow::new(graph, a).unwrap();

    let context = flow.graph().run_node(a, Context::new()).await.unwrap();

    assert_eq!(visited(&context), vec!["a"]);
    assert!(matches!(
        sink.events().as_slice(),
        [Diagnostic::SuccessorsIgnored { node, .. }] if node == "a"
    ));
}
