//! Counter demo - mounts a button on an in-memory host and clicks it.
//!
//! Run with:
//! ```bash
//! RUST_LOG=spark_cycle=debug cargo run --example counter
//! ```

use std::rc::Rc;

use spark_cycle::{
    mount, App, Drivers, MemoryHost, Node, Runtime, Sinks, Sources, StoreDriver, TraceDriver,
    Value, VIEW_DRIVER,
};
use tracing_subscriber::EnvFilter;

fn count(sources: &Sources) -> i64 {
    sources.get("data").and_then(Value::as_number).unwrap_or(0.0) as i64
}

fn view(count: i64) -> Node {
    Node::element("div")
        .prop("id", "app")
        .child(
            Node::element("button")
                .on("click", increment())
                .style([("padding", "4px")])
                .child(Node::text("+1"))
                .build(),
        )
        .child(
            Node::element("span")
                .class(if count % 2 == 0 { "even" } else { "odd" })
                .child(Node::text(format!("count: {count}")))
                .build(),
        )
        .build()
}

fn increment() -> App {
    App::new(|sources: &Sources| {
        let next = count(sources) + 1;
        Sinks::from([
            ("data".to_string(), Value::from(next as f64)),
            ("log".to_string(), Value::from(format!("incremented to {next}"))),
            (VIEW_DRIVER.to_string(), Value::Node(view(next))),
        ])
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let runtime = Runtime::from_env()?;
    let host = Rc::new(MemoryHost::new());
    let root = host.create_with_attributes("div", &[("id", "app")]);
    let log = TraceDriver::new();

    let app = App::new(|sources: &Sources| {
        Sinks::from([(VIEW_DRIVER.to_string(), Value::Node(view(count(sources))))])
    });
    let handle = mount(
        &runtime,
        host.clone(),
        "app",
        Drivers::new()
            .with("data", StoreDriver::new(0))
            .with("log", log.clone()),
        &app,
    )?;

    println!("initial: {:?}", host.text_content(root));

    let button = handle.view().root().children()[0].resource();
    for _ in 0..3 {
        host.clear_ops();
        host.click(button);
        println!("after click: {:?} ({} host ops)", host.text_content(root), host.op_count());
    }

    println!("log: {:?}", log.history());
    for diagnostic in runtime.take_diagnostics() {
        println!("diagnostic: {diagnostic}");
    }

    handle.unmount();
    Ok(())
}
