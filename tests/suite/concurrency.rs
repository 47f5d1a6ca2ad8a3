//! Many callers sharing one bridge, and several bridges side by side.

use std::sync::Arc;
use std::time::Duration;

use mjml_core::RenderBridge;
use serde_json::json;

use crate::common::{EchoInvoker, echo_html, options_in};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_renders_each_get_their_own_result() {
    let dir = tempfile::tempdir().unwrap();
    let invoker = EchoInvoker::with_delay(Duration::from_millis(5));
    let bridge = Arc::new(
        RenderBridge::start(invoker.clone(), options_in(dir.path(), true, true))
            .await
            .unwrap(),
    );

    let mut tasks = Vec::new();
    for n in 0..32 {
        let bridge = Arc::clone(&bridge);
        tasks.push(tokio::spawn(async move {
            let view = format!("<mjml><mj-body><mj-text>{n}</mj-text></mj-body></mjml>");
            let response = bridge.render(&view).await.unwrap();
            (view, response)
        }));
    }

    for task in tasks {
        let (view, response) = task.await.unwrap();
        assert_eq!(response.html, echo_html(&json!(view)));
        assert!(!response.has_errors());
    }

    // warmup plus one call per task, all against the same script
    let calls = invoker.calls();
    assert_eq!(calls.len(), 33);
    assert!(calls.iter().all(|(path, _)| path == bridge.script_path()));
}

#[tokio::test]
async fn bridges_with_different_defaults_coexist() {
    let dir = tempfile::tempdir().unwrap();
    let plain_invoker = EchoInvoker::new();
    let pretty_invoker = EchoInvoker::new();

    let plain = RenderBridge::start(plain_invoker.clone(), options_in(dir.path(), false, false))
        .await
        .unwrap();
    let pretty = RenderBridge::start(pretty_invoker.clone(), options_in(dir.path(), true, true))
        .await
        .unwrap();

    assert_ne!(plain.script_path(), pretty.script_path());
    assert!(plain.script_path().exists());
    assert!(pretty.script_path().exists());

    plain.render("<mjml></mjml>").await.unwrap();
    pretty.render("<mjml></mjml>").await.unwrap();

    let plain_calls = plain_invoker.calls();
    let plain_options = &plain_calls.last().unwrap().1[1];
    let pretty_calls = pretty_invoker.calls();
    let pretty_options = &pretty_calls.last().unwrap().1[1];
    assert_eq!(
        plain_options,
        &json!({ "keepComments": false, "beautify": false, "minify": false })
    );
    assert_eq!(
        pretty_options,
        &json!({ "keepComments": true, "beautify": true, "minify": false })
    );

    let plain_path = plain.script_path().to_path_buf();
    plain.shutdown().await;
    assert!(plain_invoker.disposed());
    assert!(!plain_path.exists());

    // the other bridge is unaffected
    assert!(!pretty_invoker.disposed());
    assert!(pretty.script_path().exists());
    pretty.render("<mjml></mjml>").await.unwrap();
    pretty.shutdown().await;
}

#[tokio::test]
async fn json_and_markup_inputs_share_one_bridge() {
    let dir = tempfile::tempdir().unwrap();
    let invoker = EchoInvoker::new();
    let bridge = RenderBridge::start(invoker.clone(), options_in(dir.path(), true, true))
        .await
        .unwrap();

    let tree = r#"{"tagName":"mjml","attributes":{},"children":[]}"#;
    let from_json = bridge.render_json(tree).await.unwrap();
    let from_markup = bridge.render("<mjml></mjml>").await.unwrap();

    assert_eq!(
        from_json.html,
        echo_html(&json!({ "tagName": "mjml", "attributes": {}, "children": [] }))
    );
    assert_eq!(from_markup.html, echo_html(&json!("<mjml></mjml>")));
    assert_eq!(invoker.call_count(), 3);

    bridge.shutdown().await;
}
