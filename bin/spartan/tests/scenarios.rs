use std::sync::Arc;
use std::time::Duration;

use spartan_config::grok::PatternRegistry;
use spartan_config::parser::parse;
use spartan_core::registry::{CodecRegistry, Registry};
use spartan_core::traits::{Filter, Input, Output};
use spartan_filters::{build_filter_chain, build_output_chain, Controller, OutputController};
use tokio::sync::mpsc;

fn filter_registry() -> Registry<Arc<dyn Filter>> {
    let registry = Registry::new();
    spartan_filters::register_builtins(&registry, Arc::new(PatternRegistry::with_builtins())).unwrap();
    registry
}

fn input_registry() -> Registry<Box<dyn Input>> {
    let registry = Registry::new();
    spartan_io::register_inputs(&registry).unwrap();
    registry
}

fn output_registry() -> (Registry<Box<dyn Output>>, Arc<CodecRegistry>) {
    let codecs = Arc::new(CodecRegistry::new());
    spartan_io::codecs::register_builtins(&codecs).unwrap();
    let registry = Registry::new();
    spartan_io::register_outputs(&registry, codecs.clone()).unwrap();
    (registry, codecs)
}

/// Scenario 1: an empty filter chain between a bounded generator and a
/// stdout output — every generated event should reach the output side
/// untouched, in order, and the pipeline should idle afterward rather
/// than erroring.
#[tokio::test]
async fn empty_pipeline_passes_generated_events_through_to_output() {
    let src = r#"
        input {
            generator { message => "x", count => 3 }
        }
        filter {}
        output {
            stdout { codec => "line" }
        }
    "#;
    let parsed = parse(src).unwrap();

    let filters = filter_registry();
    let inputs = input_registry();
    let (outputs, _codecs) = output_registry();

    let chain = Arc::new(build_filter_chain(&parsed.filters, &filters).unwrap());
    assert!(chain.is_empty_identity());
    let output_chain = build_output_chain(&parsed.outputs, &outputs).unwrap();

    let mut input = inputs.create(&parsed.inputs[0].module, &mut parsed.inputs[0].options.clone()).unwrap();

    let (input_tx, input_rx) = mpsc::channel(8);
    let (output_tx, output_rx) = mpsc::channel(8);

    let output_controller = OutputController::start(output_chain, output_rx, 8);
    let filter_controller = Controller::start(chain, input_rx, output_tx, 1, 8);

    let cancel = tokio_util::sync::CancellationToken::new();
    input.start(input_tx.clone(), cancel.clone()).await.unwrap();
    drop(input_tx);

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    filter_controller.close().await;
    output_controller.close().await;
}

/// Scenarios 2+3 composed: a grok match followed by a remove_field wired
/// sequentially, confirming chain order (`Connections=[[1],[]]` from
/// scenario 5) and that each filter's effect is visible to the next.
#[tokio::test]
async fn grok_then_remove_field_chain_runs_in_wiring_order() {
    let src = r#"
        filter {
            grok { patterns => ["^%{POSINT:n} %{GREEDYDATA:rest}$"] }
            remove_field { fields => ["rest"] }
        }
    "#;
    let parsed = parse(src).unwrap();
    assert_eq!(parsed.filters[0].connections, vec![1]);
    assert_eq!(parsed.filters[1].connections, Vec::<usize>::new());

    let filters = filter_registry();
    let chain = build_filter_chain(&parsed.filters, &filters).unwrap();

    let event = spartan_core::event::Event::with_message("09 foo");
    let out = chain.run(0, vec![event], &|_| {});
    assert_eq!(out[0].get("n").and_then(spartan_core::value::Value::as_str), Some("09"));
    assert!(!out[0].has_field("rest"));
    assert!(!out[0].has_tag("_grokparsefailure"));
}
